//! # Error Types
//!
//! Domain-specific error types for courier-core.
//!
//! ## Error Hierarchy
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                         Error Types                                     │
//! │                                                                         │
//! │  courier-core errors (this file)                                       │
//! │  └── CoreError        - Invalid domain input                           │
//! │                                                                         │
//! │  courier-db errors (separate crate)                                    │
//! │  └── DbError          - Database operation failures                    │
//! │                                                                         │
//! │  courier-sync errors (separate crate)                                  │
//! │  └── SyncError        - Auth, fetch, storage, config failures          │
//! │                                                                         │
//! │  Flow: CoreError → SyncError ← DbError                                 │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use thiserror::Error;

/// Core domain errors.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum CoreError {
    /// Provider name is not part of the closed provider set.
    ///
    /// ## When This Occurs
    /// - CLI invoked with `--provider dhl`
    /// - A stored row carries a provider name that was since removed
    #[error("Unknown courier provider: '{0}'")]
    UnknownProvider(String),

    /// Batch buffer capacity must be positive.
    #[error("Batch size must be greater than 0")]
    InvalidBatchSize,
}
