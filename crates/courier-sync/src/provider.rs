//! # Provider Registry
//!
//! Maps a [`ProviderName`] to the handler describing that provider's API
//! layout. The orchestrator only sees the handler; adding a provider means
//! implementing [`CatalogProvider`] and registering it here.
//!
//! ```text
//! "pathao" ──parse──► ProviderName::Pathao ──registry──► PathaoProvider
//! "redx"   ──parse──► ProviderName::Redx   ──registry──► (none) → UnsupportedProvider
//! "dhl"    ──parse──► UnsupportedProvider
//! ```

use courier_core::ProviderName;
use std::collections::HashMap;
use std::sync::Arc;

use crate::error::{SyncError, SyncResult};

/// API layout of one courier provider.
pub trait CatalogProvider: Send + Sync {
    fn name(&self) -> ProviderName;

    /// Path of the token issuance endpoint (POST).
    fn token_path(&self) -> String;

    fn cities_path(&self) -> String;

    fn zones_path(&self, city_id: i64) -> String;

    fn areas_path(&self, zone_id: i64) -> String;
}

/// Pathao merchant API (`aladdin/api/v1`).
#[derive(Debug, Clone, Copy, Default)]
pub struct PathaoProvider;

impl PathaoProvider {
    const API_PREFIX: &'static str = "/aladdin/api/v1";
}

impl CatalogProvider for PathaoProvider {
    fn name(&self) -> ProviderName {
        ProviderName::Pathao
    }

    fn token_path(&self) -> String {
        format!("{}/issue-token", Self::API_PREFIX)
    }

    fn cities_path(&self) -> String {
        format!("{}/city-list", Self::API_PREFIX)
    }

    fn zones_path(&self, city_id: i64) -> String {
        format!("{}/cities/{}/zone-list", Self::API_PREFIX, city_id)
    }

    fn areas_path(&self, zone_id: i64) -> String {
        format!("{}/zones/{}/area-list", Self::API_PREFIX, zone_id)
    }
}

/// Absolute endpoint URLs of a provider at a configured base URL.
#[derive(Clone)]
pub struct ProviderEndpoints {
    base_url: String,
    provider: Arc<dyn CatalogProvider>,
}

impl ProviderEndpoints {
    /// Validates `base_url` and binds it to `provider`.
    pub fn new(base_url: &str, provider: Arc<dyn CatalogProvider>) -> SyncResult<Self> {
        url::Url::parse(base_url)?;
        Ok(Self {
            base_url: base_url.trim_end_matches('/').to_string(),
            provider,
        })
    }

    pub fn provider(&self) -> ProviderName {
        self.provider.name()
    }

    pub fn token_url(&self) -> String {
        self.join(&self.provider.token_path())
    }

    pub fn cities_url(&self) -> String {
        self.join(&self.provider.cities_path())
    }

    pub fn zones_url(&self, city_id: i64) -> String {
        self.join(&self.provider.zones_path(city_id))
    }

    pub fn areas_url(&self, zone_id: i64) -> String {
        self.join(&self.provider.areas_path(zone_id))
    }

    fn join(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }
}

impl std::fmt::Debug for ProviderEndpoints {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ProviderEndpoints")
            .field("base_url", &self.base_url)
            .field("provider", &self.provider.name())
            .finish()
    }
}

/// Handlers for every provider that can be synced.
#[derive(Clone, Default)]
pub struct ProviderRegistry {
    handlers: HashMap<ProviderName, Arc<dyn CatalogProvider>>,
}

impl ProviderRegistry {
    /// An empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Registry with every built-in handler.
    pub fn with_defaults() -> Self {
        let mut registry = Self::new();
        registry.register(Arc::new(PathaoProvider));
        registry
    }

    pub fn register(&mut self, handler: Arc<dyn CatalogProvider>) {
        self.handlers.insert(handler.name(), handler);
    }

    pub fn get(&self, provider: ProviderName) -> Option<Arc<dyn CatalogProvider>> {
        self.handlers.get(&provider).cloned()
    }

    /// Resolves a user-supplied provider name to its handler.
    ///
    /// ## Errors
    /// [`SyncError::UnsupportedProvider`] carrying the name as given, both for
    /// unknown names and for known providers without a handler.
    pub fn resolve(&self, name: &str) -> SyncResult<Arc<dyn CatalogProvider>> {
        name.parse::<ProviderName>()
            .ok()
            .and_then(|provider| self.get(provider))
            .ok_or_else(|| SyncError::UnsupportedProvider(name.to_string()))
    }
}
