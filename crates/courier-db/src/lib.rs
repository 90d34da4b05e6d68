//! # courier-db: Database Layer for Courier Sync
//!
//! SQLite persistence for courier location catalogs and the token cache,
//! built on sqlx.
//!
//! ## Architecture Position
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                        Courier Sync Data Flow                           │
//! │                                                                         │
//! │  SyncOrchestrator (courier-sync)                                       │
//! │       │  flush(batch)                                                   │
//! │       ▼                                                                 │
//! │  ┌─────────────────────────────────────────────────────────────────┐   │
//! │  │                   courier-db (THIS CRATE)                       │   │
//! │  │                                                                 │   │
//! │  │   ┌───────────────┐    ┌────────────────┐    ┌──────────────┐  │   │
//! │  │   │   Database    │    │  Repositories  │    │  Migrations  │  │   │
//! │  │   │   (pool.rs)   │◄───│ LocationRepo   │    │  (embedded)  │  │   │
//! │  │   │  SqlitePool   │    │ TokenCacheRepo │    │ 001, 002     │  │   │
//! │  │   └───────────────┘    └────────────────┘    └──────────────┘  │   │
//! │  └─────────────────────────────────────────────────────────────────┘   │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  SQLite file (courier.db)                                              │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Module Organization
//!
//! - [`pool`] - Connection pool creation and configuration
//! - [`migrations`] - Embedded database migrations
//! - [`error`] - Database error types
//! - [`repository`] - Location and token cache repositories
//!
//! ## Usage
//!
//! ```rust,ignore
//! use courier_db::{Database, DbConfig};
//!
//! let db = Database::new(DbConfig::new("courier.db")).await?;
//! db.locations().upsert_batch(&records).await?;
//! ```

// =============================================================================
// Module Declarations
// =============================================================================

pub mod error;
pub mod migrations;
pub mod pool;
pub mod repository;

// =============================================================================
// Re-exports
// =============================================================================

pub use error::{DbError, DbResult};
pub use pool::{Database, DbConfig};

pub use repository::location::LocationRepository;
pub use repository::token_cache::TokenCacheRepository;
