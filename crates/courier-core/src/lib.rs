//! # courier-core: Pure Types for Courier Sync
//!
//! This crate holds the domain vocabulary shared by the database layer and the
//! sync engine. Nothing in here touches the network, the disk, or a clock
//! other than `Utc::now()` for record timestamps.
//!
//! ## Architecture Position
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                     Courier Sync Architecture                           │
//! │                                                                         │
//! │  ┌─────────────────────────────────────────────────────────────────┐   │
//! │  │                 courier-sync (CLI entry: courier-sync)          │   │
//! │  │   CredentialManager ──► CatalogClient ──► SyncOrchestrator     │   │
//! │  └─────────────────────────────┬───────────────────────────────────┘   │
//! │                                │                                        │
//! │  ┌─────────────────────────────▼───────────────────────────────────┐   │
//! │  │              ★ courier-core (THIS CRATE) ★                      │   │
//! │  │                                                                 │   │
//! │  │   ┌────────────┐  ┌─────────────┐  ┌──────────┐  ┌──────────┐  │   │
//! │  │   │  provider  │  │    types    │  │  batch   │  │  report  │  │   │
//! │  │   │ProviderName│  │City/Zone/   │  │ Batch    │  │SyncReport│  │   │
//! │  │   │            │  │Area/Record  │  │ Buffer   │  │SyncStats │  │   │
//! │  │   └────────────┘  └─────────────┘  └──────────┘  └──────────┘  │   │
//! │  │                                                                 │   │
//! │  │   NO I/O • NO DATABASE • NO NETWORK                             │   │
//! │  └─────────────────────────────────────────────────────────────────┘   │
//! │                                │                                        │
//! │  ┌─────────────────────────────▼───────────────────────────────────┐   │
//! │  │                courier-db (Database Layer)                      │   │
//! │  │         SQLite upserts, migrations, token cache table           │   │
//! │  └─────────────────────────────────────────────────────────────────┘   │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Modules
//!
//! - [`provider`] - Closed set of supported courier providers
//! - [`types`] - Remote payloads and the flattened location record
//! - [`batch`] - Fixed-size batch buffer used by the orchestrator
//! - [`report`] - Run statistics and the user-facing report
//! - [`error`] - Domain error types

// =============================================================================
// Module Declarations
// =============================================================================

pub mod batch;
pub mod error;
pub mod provider;
pub mod report;
pub mod types;

// =============================================================================
// Re-exports for Convenience
// =============================================================================

pub use batch::BatchBuffer;
pub use error::CoreError;
pub use provider::ProviderName;
pub use report::{SyncReport, SyncStats};
pub use types::*;

// =============================================================================
// Crate-Level Constants
// =============================================================================

/// Number of location records written per upsert call.
pub const DEFAULT_BATCH_SIZE: usize = 50;

/// Number of zones processed before the batch buffer is force-flushed.
///
/// Bounds the amount of work held in memory per iteration; it has no
/// influence on what ends up persisted.
pub const DEFAULT_ZONE_CHUNK_SIZE: usize = 10;

/// Seconds shaved off the provider-reported access token lifetime.
pub const ACCESS_TOKEN_EXPIRY_MARGIN_SECS: u64 = 60;

/// Fixed lifetime of a cached refresh token (7 days).
pub const REFRESH_TOKEN_TTL_SECS: u64 = 7 * 24 * 60 * 60;
