//! # Sync Engine
//!
//! Assembles the pieces of a run from configuration: provider handler,
//! token store backend, HTTP transport, credential manager, orchestrator.
//!
//! ```text
//! CourierConfig + Database
//!        │
//!        ▼
//! SyncEngine::sync("pathao")
//!   1. registry.resolve(name)        ✗ UnsupportedProvider (no network)
//!   2. config.credentials_for(p)     ✗ MissingCredential / InvalidUrl
//!   3. token store per [cache]       database | redis | memory
//!   4. ReqwestTransport(timeout)
//!   5. SyncOrchestrator::run()  ──►  SyncReport
//! ```

use courier_core::SyncReport;
use courier_db::Database;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, info};

use crate::config::{CacheBackend, CourierConfig};
use crate::credentials::CredentialManager;
use crate::error::{SyncError, SyncResult};
use crate::http::{HttpTransport, ReqwestTransport};
use crate::orchestrator::{SyncOptions, SyncOrchestrator};
use crate::provider::{ProviderEndpoints, ProviderRegistry};
use crate::token_store::{DatabaseTokenStore, MemoryTokenStore, RedisTokenStore, TokenStore};

/// Entry point for running syncs against configured providers.
pub struct SyncEngine {
    config: CourierConfig,
    db: Database,
    registry: ProviderRegistry,
    transport: Option<Arc<dyn HttpTransport>>,
}

impl SyncEngine {
    pub fn new(config: CourierConfig, db: Database) -> Self {
        Self {
            config,
            db,
            registry: ProviderRegistry::with_defaults(),
            transport: None,
        }
    }

    /// Replaces the provider registry.
    pub fn with_registry(mut self, registry: ProviderRegistry) -> Self {
        self.registry = registry;
        self
    }

    /// Uses `transport` instead of building a reqwest client.
    pub fn with_transport(mut self, transport: Arc<dyn HttpTransport>) -> Self {
        self.transport = Some(transport);
        self
    }

    /// Syncs the provider called `provider_name`.
    ///
    /// ## Errors
    /// Only for problems detected before the run starts: unsupported
    /// provider, incomplete credentials, unreachable token cache. Failures
    /// during the run are reported through [`SyncReport`].
    pub async fn sync(&self, provider_name: &str) -> SyncResult<SyncReport> {
        let handler = self.registry.resolve(provider_name)?;
        let provider = handler.name();

        let credentials = self.config.credentials_for(provider)?.clone();
        let endpoints = ProviderEndpoints::new(&credentials.base_url, handler)?;

        let store = self.token_store().await?;
        let transport = self.transport()?;

        debug!(
            provider = %provider,
            cache_backend = %self.config.cache.backend,
            timeout_secs = self.config.http.timeout_secs,
            "Sync components assembled"
        );

        let manager = CredentialManager::new(endpoints.clone(), credentials, transport.clone(), store);
        let orchestrator = SyncOrchestrator::new(
            endpoints,
            Arc::new(manager),
            transport,
            Arc::new(self.db.locations()),
            SyncOptions {
                batch_size: self.config.sync.batch_size,
                zone_chunk_size: self.config.sync.zone_chunk_size,
            },
        );

        Ok(orchestrator.run().await)
    }

    async fn token_store(&self) -> SyncResult<Arc<dyn TokenStore>> {
        let store: Arc<dyn TokenStore> = match self.config.cache.backend {
            CacheBackend::Database => {
                let cache = self.db.token_cache();
                let purged = cache.purge_expired(chrono::Utc::now()).await?;
                if purged > 0 {
                    debug!(purged, "Removed expired token cache entries");
                }
                Arc::new(DatabaseTokenStore::new(cache))
            }
            CacheBackend::Redis => {
                let url = self.config.cache.redis_url.as_deref().ok_or_else(|| {
                    SyncError::InvalidConfig("redis_url is required for the redis cache".into())
                })?;
                Arc::new(RedisTokenStore::connect(url).await?)
            }
            CacheBackend::Memory => {
                info!("Using in-memory token cache; tokens will not outlive this process");
                Arc::new(MemoryTokenStore::new())
            }
        };
        Ok(store)
    }

    fn transport(&self) -> SyncResult<Arc<dyn HttpTransport>> {
        if let Some(transport) = &self.transport {
            return Ok(transport.clone());
        }
        let timeout = Duration::from_secs(self.config.http.timeout_secs);
        Ok(Arc::new(ReqwestTransport::with_timeout(timeout)?))
    }
}
