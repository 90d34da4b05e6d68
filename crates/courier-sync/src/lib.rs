//! # courier-sync: Token Lifecycle and Catalog Sync Engine
//!
//! Pulls a courier provider's city → zone → area catalog into the local
//! database, managing the provider's OAuth-style tokens along the way.
//!
//! ## Architecture Overview
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                         Sync Run Architecture                           │
//! │                                                                         │
//! │  ┌──────────────────────────────────────────────────────────────────┐  │
//! │  │                 SyncEngine (engine.rs)                           │  │
//! │  │   provider registry • token store backend • HTTP transport       │  │
//! │  └────────────────────────────┬─────────────────────────────────────┘  │
//! │                               ▼                                         │
//! │  ┌──────────────────────────────────────────────────────────────────┐  │
//! │  │                 SyncOrchestrator (orchestrator.rs)               │  │
//! │  │   walks cities → zones (chunks of 10) → areas, batches of 50     │  │
//! │  └───────┬─────────────────────────┬─────────────────────┬──────────┘  │
//! │          ▼                         ▼                     ▼              │
//! │  ┌────────────────┐     ┌────────────────────┐   ┌──────────────────┐  │
//! │  │CredentialMgr   │     │ CatalogClient      │   │ LocationSink     │  │
//! │  │ cache → refresh│     │ GET lists with     │   │ courier-db       │  │
//! │  │ → password     │     │ bearer token       │   │ upsert per batch │  │
//! │  └───────┬────────┘     └─────────┬──────────┘   └──────────────────┘  │
//! │          ▼                        ▼                                     │
//! │  ┌────────────────┐     ┌────────────────────┐                         │
//! │  │ TokenStore     │     │ HttpTransport      │                         │
//! │  │ db/redis/memory│     │ reqwest            │                         │
//! │  └────────────────┘     └────────────────────┘                         │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Module Organization
//! - [`config`] - TOML + environment configuration
//! - [`error`] - Sync error types
//! - [`http`] - Transport boundary and reqwest implementation
//! - [`token_store`] - Token cache backends
//! - [`provider`] - Provider handlers and registry
//! - [`credentials`] - Access token resolution
//! - [`client`] - Catalog list endpoints
//! - [`orchestrator`] - Hierarchy walk and batching
//! - [`engine`] - Wiring from configuration
//!
//! ## Usage
//!
//! ```rust,ignore
//! use courier_sync::{CourierConfig, SyncEngine};
//! use courier_db::{Database, DbConfig};
//!
//! let config = CourierConfig::load(None)?;
//! let db = Database::new(DbConfig::new(config.database_path())).await?;
//!
//! let report = SyncEngine::new(config, db).sync("pathao").await?;
//! println!("{}", report.message);
//! ```

// =============================================================================
// Module Declarations
// =============================================================================

pub mod client;
pub mod config;
pub mod credentials;
pub mod engine;
pub mod error;
pub mod http;
pub mod orchestrator;
pub mod provider;
pub mod token_store;

// =============================================================================
// Re-exports
// =============================================================================

pub use client::CatalogClient;
pub use config::{CacheBackend, CourierConfig, ProviderCredentials};
pub use credentials::{CredentialManager, TokenGrant};
pub use engine::SyncEngine;
pub use error::{SyncError, SyncResult};
pub use http::{HttpMethod, HttpRequest, HttpResponse, HttpTransport, ReqwestTransport};
pub use orchestrator::{LocationSink, SyncOptions, SyncOrchestrator};
pub use provider::{CatalogProvider, PathaoProvider, ProviderEndpoints, ProviderRegistry};
pub use token_store::{DatabaseTokenStore, MemoryTokenStore, RedisTokenStore, TokenStore};
