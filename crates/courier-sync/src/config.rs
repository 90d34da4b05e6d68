//! # Sync Configuration
//!
//! Configuration management for the sync engine.
//!
//! ## Configuration Sources
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                    Configuration Priority                               │
//! │                                                                         │
//! │  1. Environment Variables (highest priority)                           │
//! │     COURIER_DATABASE_PATH=/var/lib/courier/courier.db                  │
//! │     PATHAO_CLIENT_ID=...                                               │
//! │                                                                         │
//! │  2. TOML Config File                                                   │
//! │     ~/.config/courier-sync/courier.toml (Linux)                        │
//! │     ~/Library/Application Support/com.courier.courier-sync/... (macOS) │
//! │                                                                         │
//! │  3. Default Values (lowest priority)                                   │
//! │     database token cache, 30s timeout, batches of 50                   │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Configuration File Format
//! ```toml
//! [database]
//! path = "/var/lib/courier/courier.db"
//!
//! [cache]
//! backend = "database"   # database | redis | memory
//! # redis_url = "redis://127.0.0.1/"
//!
//! [http]
//! timeout_secs = 30
//!
//! [sync]
//! batch_size = 50
//! zone_chunk_size = 10
//!
//! [providers.pathao]
//! base_url = "https://api-hermes.pathao.com"
//! client_id = "..."
//! client_secret = "..."
//! username = "merchant@example.com"
//! password = "..."
//! ```

use courier_core::{ProviderName, DEFAULT_BATCH_SIZE, DEFAULT_ZONE_CHUNK_SIZE};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::PathBuf;
use tracing::{debug, info, warn};

use crate::error::{SyncError, SyncResult};

const CONFIG_FILE_NAME: &str = "courier.toml";
const DATABASE_FILE_NAME: &str = "courier.db";

// =============================================================================
// Cache Backend
// =============================================================================

/// Where provider tokens are cached between runs.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CacheBackend {
    /// `token_cache` table in the local SQLite database.
    #[default]
    Database,

    /// Shared Redis instance.
    Redis,

    /// Process memory; tokens die with the process.
    Memory,
}

impl std::fmt::Display for CacheBackend {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            CacheBackend::Database => write!(f, "database"),
            CacheBackend::Redis => write!(f, "redis"),
            CacheBackend::Memory => write!(f, "memory"),
        }
    }
}

impl std::str::FromStr for CacheBackend {
    type Err = SyncError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "database" | "db" | "sqlite" => Ok(CacheBackend::Database),
            "redis" => Ok(CacheBackend::Redis),
            "memory" | "mem" => Ok(CacheBackend::Memory),
            other => Err(SyncError::InvalidConfig(format!(
                "Unknown cache backend: '{}'. Valid options: database, redis, memory",
                other
            ))),
        }
    }
}

// =============================================================================
// Sections
// =============================================================================

/// `[database]` section.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct DatabaseSettings {
    /// SQLite file. Defaults to the platform data directory.
    #[serde(default)]
    pub path: Option<PathBuf>,
}

/// `[cache]` section.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CacheSettings {
    #[serde(default)]
    pub backend: CacheBackend,

    /// Required when `backend = "redis"`.
    #[serde(default)]
    pub redis_url: Option<String>,
}

/// `[http]` section.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HttpSettings {
    /// Per-request timeout (seconds).
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
}

fn default_timeout_secs() -> u64 {
    30
}

impl Default for HttpSettings {
    fn default() -> Self {
        HttpSettings {
            timeout_secs: default_timeout_secs(),
        }
    }
}

/// `[sync]` section.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SyncSettings {
    /// Records per upsert call.
    #[serde(default = "default_batch_size")]
    pub batch_size: usize,

    /// Zones walked between forced flushes.
    #[serde(default = "default_zone_chunk_size")]
    pub zone_chunk_size: usize,
}

fn default_batch_size() -> usize {
    DEFAULT_BATCH_SIZE
}

fn default_zone_chunk_size() -> usize {
    DEFAULT_ZONE_CHUNK_SIZE
}

impl Default for SyncSettings {
    fn default() -> Self {
        SyncSettings {
            batch_size: default_batch_size(),
            zone_chunk_size: default_zone_chunk_size(),
        }
    }
}

/// `[providers.<slug>]` section: API location and grant credentials.
#[derive(Clone, Default, Serialize, Deserialize)]
pub struct ProviderCredentials {
    #[serde(default)]
    pub base_url: String,
    #[serde(default)]
    pub client_id: String,
    #[serde(default)]
    pub client_secret: String,
    #[serde(default)]
    pub username: String,
    #[serde(default)]
    pub password: String,
}

impl std::fmt::Debug for ProviderCredentials {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ProviderCredentials")
            .field("base_url", &self.base_url)
            .field("client_id", &self.client_id)
            .field("client_secret", &"<redacted>")
            .field("username", &self.username)
            .field("password", &"<redacted>")
            .finish()
    }
}

impl ProviderCredentials {
    /// Checks every field is present and the base URL is http(s).
    pub fn validate(&self, provider: ProviderName) -> SyncResult<()> {
        let fields = [
            ("base_url", &self.base_url),
            ("client_id", &self.client_id),
            ("client_secret", &self.client_secret),
            ("username", &self.username),
            ("password", &self.password),
        ];

        for (field, value) in fields {
            if value.trim().is_empty() {
                return Err(SyncError::MissingCredential {
                    provider: provider.slug().to_string(),
                    field,
                });
            }
        }

        let url = url::Url::parse(&self.base_url)?;
        if url.scheme() != "http" && url.scheme() != "https" {
            return Err(SyncError::InvalidUrl(format!(
                "Base URL must start with http:// or https://, got: {}",
                self.base_url
            )));
        }

        Ok(())
    }
}

// =============================================================================
// Main Configuration
// =============================================================================

/// Complete configuration of the sync tool.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CourierConfig {
    #[serde(default)]
    pub database: DatabaseSettings,

    #[serde(default)]
    pub cache: CacheSettings,

    #[serde(default)]
    pub http: HttpSettings,

    #[serde(default)]
    pub sync: SyncSettings,

    /// Keyed by provider slug (`pathao`, `redx`).
    #[serde(default)]
    pub providers: BTreeMap<String, ProviderCredentials>,
}

impl CourierConfig {
    /// Loads configuration from file, environment, and defaults.
    ///
    /// ## Load Order (later overrides earlier)
    /// 1. Default values
    /// 2. Config file (courier.toml)
    /// 3. Environment variables
    pub fn load(config_path: Option<PathBuf>) -> SyncResult<Self> {
        let explicit = config_path.is_some();
        let mut config = Self::default();

        if let Some(path) = config_path.or_else(Self::default_config_path) {
            if path.exists() {
                info!(?path, "Loading config from file");
                let contents = std::fs::read_to_string(&path)?;
                config = toml::from_str(&contents)?;
            } else if explicit {
                return Err(SyncError::ConfigLoadFailed(format!(
                    "Config file not found: {}",
                    path.display()
                )));
            } else {
                debug!(?path, "Config file not found, using defaults");
            }
        }

        config.apply_env_overrides();
        config.validate()?;

        Ok(config)
    }

    /// Parses a TOML document without consulting the environment.
    pub fn from_toml_str(contents: &str) -> SyncResult<Self> {
        let config: Self = toml::from_str(contents)?;
        config.validate()?;
        Ok(config)
    }

    /// Validates settings that do not depend on the selected provider.
    pub fn validate(&self) -> SyncResult<()> {
        if self.sync.batch_size == 0 {
            return Err(SyncError::InvalidConfig(
                "batch_size must be greater than 0".into(),
            ));
        }

        if self.sync.zone_chunk_size == 0 {
            return Err(SyncError::InvalidConfig(
                "zone_chunk_size must be greater than 0".into(),
            ));
        }

        if self.http.timeout_secs == 0 {
            return Err(SyncError::InvalidConfig(
                "timeout_secs must be greater than 0".into(),
            ));
        }

        if self.cache.backend == CacheBackend::Redis && self.cache.redis_url.is_none() {
            return Err(SyncError::InvalidConfig(
                "redis_url is required when the cache backend is redis".into(),
            ));
        }

        Ok(())
    }

    /// Returns validated credentials for `provider`.
    pub fn credentials_for(&self, provider: ProviderName) -> SyncResult<&ProviderCredentials> {
        let credentials =
            self.providers
                .get(provider.slug())
                .ok_or_else(|| SyncError::MissingCredential {
                    provider: provider.slug().to_string(),
                    field: "base_url",
                })?;

        credentials.validate(provider)?;
        Ok(credentials)
    }

    /// SQLite file to open: configured path, else the platform data directory.
    pub fn database_path(&self) -> PathBuf {
        self.database
            .path
            .clone()
            .or_else(|| {
                Self::project_dirs().map(|dirs| dirs.data_dir().join(DATABASE_FILE_NAME))
            })
            .unwrap_or_else(|| PathBuf::from(DATABASE_FILE_NAME))
    }

    /// Applies environment variable overrides.
    fn apply_env_overrides(&mut self) {
        self.apply_overrides_from(|key| std::env::var(key).ok());
    }

    fn apply_overrides_from(&mut self, lookup: impl Fn(&str) -> Option<String>) {
        if let Some(path) = lookup("COURIER_DATABASE_PATH") {
            debug!(path = %path, "Overriding database path from environment");
            self.database.path = Some(PathBuf::from(path));
        }

        if let Some(backend) = lookup("COURIER_CACHE_BACKEND") {
            match backend.parse() {
                Ok(parsed) => self.cache.backend = parsed,
                Err(_) => warn!(backend = %backend, "Unknown cache backend in environment"),
            }
        }

        if let Some(url) = lookup("COURIER_REDIS_URL") {
            self.cache.redis_url = Some(url);
        }

        if let Some(timeout) = lookup("COURIER_HTTP_TIMEOUT_SECS") {
            match timeout.parse::<u64>() {
                Ok(secs) => self.http.timeout_secs = secs,
                Err(_) => warn!(value = %timeout, "Invalid COURIER_HTTP_TIMEOUT_SECS"),
            }
        }

        if let Some(size) = lookup("COURIER_BATCH_SIZE") {
            match size.parse::<usize>() {
                Ok(n) => self.sync.batch_size = n,
                Err(_) => warn!(value = %size, "Invalid COURIER_BATCH_SIZE"),
            }
        }

        for provider in ProviderName::ALL {
            let prefix = provider.slug().to_uppercase();
            let var = |field: &str| lookup(&format!("{prefix}_{field}"));

            let overrides = [
                var("BASE_URL"),
                var("CLIENT_ID"),
                var("CLIENT_SECRET"),
                var("USERNAME"),
                var("PASSWORD"),
            ];
            if overrides.iter().all(Option::is_none) {
                continue;
            }

            debug!(provider = %provider, "Applying provider credentials from environment");
            let [base_url, client_id, client_secret, username, password] = overrides;
            let entry = self.providers.entry(provider.slug().to_string()).or_default();
            if let Some(v) = base_url {
                entry.base_url = v;
            }
            if let Some(v) = client_id {
                entry.client_id = v;
            }
            if let Some(v) = client_secret {
                entry.client_secret = v;
            }
            if let Some(v) = username {
                entry.username = v;
            }
            if let Some(v) = password {
                entry.password = v;
            }
        }
    }

    fn project_dirs() -> Option<directories::ProjectDirs> {
        directories::ProjectDirs::from("com", "courier", "courier-sync")
    }

    /// Returns the default config file path.
    pub fn default_config_path() -> Option<PathBuf> {
        Self::project_dirs().map(|dirs| dirs.config_dir().join(CONFIG_FILE_NAME))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    const SAMPLE: &str = r#"
        [database]
        path = "/tmp/courier-test.db"

        [cache]
        backend = "memory"

        [sync]
        batch_size = 25

        [providers.pathao]
        base_url = "https://courier-api-sandbox.pathao.com"
        client_id = "7N1aMJQbWm"
        client_secret = "secret"
        username = "test@pathao.com"
        password = "lovePathao"
    "#;

    #[test]
    fn test_defaults() {
        let config = CourierConfig::default();
        assert_eq!(config.sync.batch_size, 50);
        assert_eq!(config.sync.zone_chunk_size, 10);
        assert_eq!(config.http.timeout_secs, 30);
        assert_eq!(config.cache.backend, CacheBackend::Database);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_parse_toml() {
        let config = CourierConfig::from_toml_str(SAMPLE).unwrap();
        assert_eq!(config.cache.backend, CacheBackend::Memory);
        assert_eq!(config.sync.batch_size, 25);
        assert_eq!(config.sync.zone_chunk_size, 10);
        assert_eq!(config.database_path(), PathBuf::from("/tmp/courier-test.db"));

        let creds = config.credentials_for(ProviderName::Pathao).unwrap();
        assert_eq!(creds.client_id, "7N1aMJQbWm");
    }

    #[test]
    fn test_missing_provider_section() {
        let config = CourierConfig::from_toml_str(SAMPLE).unwrap();
        let err = config.credentials_for(ProviderName::Redx).unwrap_err();
        assert!(matches!(err, SyncError::MissingCredential { field: "base_url", .. }));
    }

    #[test]
    fn test_credential_validation() {
        let mut config = CourierConfig::from_toml_str(SAMPLE).unwrap();
        let creds = config.providers.get_mut("pathao").unwrap();

        creds.password = "  ".into();
        let err = creds.validate(ProviderName::Pathao).unwrap_err();
        assert!(matches!(err, SyncError::MissingCredential { field: "password", .. }));

        creds.password = "pw".into();
        creds.base_url = "ftp://pathao.com".into();
        assert!(matches!(
            creds.validate(ProviderName::Pathao).unwrap_err(),
            SyncError::InvalidUrl(_)
        ));

        creds.base_url = "not a url".into();
        assert!(creds.validate(ProviderName::Pathao).is_err());
    }

    #[test]
    fn test_validation_rejects_zero_sizes_and_redis_without_url() {
        let mut config = CourierConfig::default();
        config.sync.batch_size = 0;
        assert!(config.validate().unwrap_err().is_config_error());

        let mut config = CourierConfig::default();
        config.sync.zone_chunk_size = 0;
        assert!(config.validate().is_err());

        let mut config = CourierConfig::default();
        config.cache.backend = CacheBackend::Redis;
        assert!(config.validate().is_err());
        config.cache.redis_url = Some("redis://127.0.0.1/".into());
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_env_overrides() {
        let env: HashMap<&str, &str> = [
            ("COURIER_CACHE_BACKEND", "redis"),
            ("COURIER_REDIS_URL", "redis://cache:6379/"),
            ("COURIER_BATCH_SIZE", "10"),
            ("PATHAO_CLIENT_SECRET", "from-env"),
            ("REDX_BASE_URL", "https://openapi.redx.com.bd"),
        ]
        .into_iter()
        .collect();

        let mut config = CourierConfig::from_toml_str(SAMPLE).unwrap();
        config.apply_overrides_from(|k| env.get(k).map(|v| v.to_string()));

        assert_eq!(config.cache.backend, CacheBackend::Redis);
        assert_eq!(config.cache.redis_url.as_deref(), Some("redis://cache:6379/"));
        assert_eq!(config.sync.batch_size, 10);

        let pathao = &config.providers["pathao"];
        assert_eq!(pathao.client_secret, "from-env");
        assert_eq!(pathao.client_id, "7N1aMJQbWm");

        let redx = &config.providers["redx"];
        assert_eq!(redx.base_url, "https://openapi.redx.com.bd");
        assert!(redx.client_id.is_empty());
    }

    #[test]
    fn test_debug_redacts_secrets() {
        let config = CourierConfig::from_toml_str(SAMPLE).unwrap();
        let debug = format!("{:?}", config.providers["pathao"]);
        assert!(!debug.contains("lovePathao"));
        assert!(debug.contains("<redacted>"));
    }

    #[test]
    fn test_cache_backend_parsing() {
        assert_eq!("Redis".parse::<CacheBackend>().unwrap(), CacheBackend::Redis);
        assert_eq!("sqlite".parse::<CacheBackend>().unwrap(), CacheBackend::Database);
        assert!("disk".parse::<CacheBackend>().is_err());
    }
}
