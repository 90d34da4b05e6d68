//! # Sync Error Types
//!
//! Error types for sync operations.
//!
//! ## Error Hierarchy
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                       Sync Error Categories                             │
//! │                                                                         │
//! │  ┌─────────────────┐  ┌─────────────────┐  ┌─────────────────────────┐ │
//! │  │  Configuration  │  │  Authentication │  │     Remote Catalog      │ │
//! │  │                 │  │                 │  │                         │ │
//! │  │  InvalidConfig  │  │  AuthFailed     │  │  FetchFailed            │ │
//! │  │  MissingCred.   │  │                 │  │  Transport              │ │
//! │  │  InvalidUrl     │  │                 │  │  DeserializationFailed  │ │
//! │  └─────────────────┘  └─────────────────┘  └─────────────────────────┘ │
//! │                                                                         │
//! │  ┌─────────────────┐  ┌─────────────────┐                              │
//! │  │    Storage      │  │    Provider     │                              │
//! │  │                 │  │                 │                              │
//! │  │  Storage        │  │  Unsupported    │                              │
//! │  │  TokenCache     │  │  Provider       │                              │
//! │  └─────────────────┘  └─────────────────┘                              │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Severity During A Run
//! ```text
//! AuthFailed                       → run aborted before any fetch
//! FetchFailed (cities)             → run aborted
//! FetchFailed (zones / areas)      → logged, branch skipped
//! Storage                          → run aborted
//! TokenCache                       → logged, treated as a cache miss
//! ```

use thiserror::Error;

use crate::http::HttpError;

/// Result type alias for sync operations.
pub type SyncResult<T> = Result<T, SyncError>;

/// Sync error type covering all possible sync failures.
#[derive(Debug, Error)]
pub enum SyncError {
    // =========================================================================
    // Configuration Errors
    // =========================================================================
    /// Invalid configuration value.
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    /// A required provider credential is empty or absent.
    #[error("Missing {field} for provider '{provider}'")]
    MissingCredential {
        provider: String,
        field: &'static str,
    },

    /// Base URL does not parse or uses an unsupported scheme.
    #[error("Invalid URL: {0}")]
    InvalidUrl(String),

    /// Failed to read or parse the config file.
    #[error("Failed to load config: {0}")]
    ConfigLoadFailed(String),

    // =========================================================================
    // Provider Errors
    // =========================================================================
    /// No handler is registered under this name.
    #[error("Provider '{0}' is not supported.")]
    UnsupportedProvider(String),

    // =========================================================================
    // Authentication Errors
    // =========================================================================
    /// Every grant exchange failed. Carries the token endpoint's response body.
    #[error("Failed to get {provider} access token: {body}")]
    AuthFailed { provider: String, body: String },

    // =========================================================================
    // Remote Catalog Errors
    // =========================================================================
    /// A catalog request returned a non-2xx status or never completed.
    #[error("Failed to fetch {resource}: {message}")]
    FetchFailed {
        resource: String,
        url: String,
        status: Option<u16>,
        message: String,
    },

    /// HTTP transport failure (DNS, connect, timeout).
    #[error("HTTP transport error: {0}")]
    Transport(String),

    /// Failed to serialize a request body.
    #[error("Serialization failed: {0}")]
    SerializationFailed(String),

    /// Failed to deserialize a response body.
    #[error("Deserialization failed: {0}")]
    DeserializationFailed(String),

    // =========================================================================
    // Storage Errors
    // =========================================================================
    /// Persisting a batch failed.
    #[error("Storage error: {0}")]
    Storage(String),

    /// Token cache backend failure.
    #[error("Token cache error: {0}")]
    TokenCache(String),
}

// =============================================================================
// Error Conversions
// =============================================================================

impl From<courier_db::DbError> for SyncError {
    fn from(err: courier_db::DbError) -> Self {
        SyncError::Storage(err.to_string())
    }
}

impl From<HttpError> for SyncError {
    fn from(err: HttpError) -> Self {
        SyncError::Transport(err.to_string())
    }
}

impl From<serde_json::Error> for SyncError {
    fn from(err: serde_json::Error) -> Self {
        SyncError::DeserializationFailed(err.to_string())
    }
}

impl From<url::ParseError> for SyncError {
    fn from(err: url::ParseError) -> Self {
        SyncError::InvalidUrl(err.to_string())
    }
}

impl From<std::io::Error> for SyncError {
    fn from(err: std::io::Error) -> Self {
        SyncError::ConfigLoadFailed(err.to_string())
    }
}

impl From<toml::de::Error> for SyncError {
    fn from(err: toml::de::Error) -> Self {
        SyncError::ConfigLoadFailed(err.to_string())
    }
}

impl From<redis::RedisError> for SyncError {
    fn from(err: redis::RedisError) -> Self {
        SyncError::TokenCache(err.to_string())
    }
}

impl From<courier_core::CoreError> for SyncError {
    fn from(err: courier_core::CoreError) -> Self {
        match err {
            courier_core::CoreError::UnknownProvider(name) => SyncError::UnsupportedProvider(name),
            other => SyncError::InvalidConfig(other.to_string()),
        }
    }
}

// =============================================================================
// Error Categorization
// =============================================================================

impl SyncError {
    /// Builds a fetch failure for `resource` requested at `url`.
    pub fn fetch(
        resource: impl Into<String>,
        url: impl Into<String>,
        status: Option<u16>,
        message: impl Into<String>,
    ) -> Self {
        SyncError::FetchFailed {
            resource: resource.into(),
            url: url.into(),
            status,
            message: message.into(),
        }
    }

    /// Returns true if this error indicates a configuration problem.
    pub fn is_config_error(&self) -> bool {
        matches!(
            self,
            SyncError::InvalidConfig(_)
                | SyncError::MissingCredential { .. }
                | SyncError::InvalidUrl(_)
                | SyncError::ConfigLoadFailed(_)
                | SyncError::UnsupportedProvider(_)
        )
    }

    /// Returns true if a zone or area walk may skip past this error.
    pub fn is_recoverable_fetch(&self) -> bool {
        matches!(
            self,
            SyncError::FetchFailed { .. } | SyncError::Transport(_)
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_categories() {
        assert!(SyncError::UnsupportedProvider("dhl".into()).is_config_error());
        assert!(SyncError::MissingCredential {
            provider: "pathao".into(),
            field: "client_id"
        }
        .is_config_error());
        assert!(!SyncError::Storage("disk full".into()).is_config_error());

        assert!(SyncError::fetch("zones", "http://x", Some(500), "HTTP 500").is_recoverable_fetch());
        assert!(SyncError::Transport("timeout".into()).is_recoverable_fetch());
        assert!(!SyncError::Storage("disk full".into()).is_recoverable_fetch());
    }

    #[test]
    fn test_messages() {
        let err = SyncError::UnsupportedProvider("dhl".into());
        assert_eq!(err.to_string(), "Provider 'dhl' is not supported.");

        let err = SyncError::AuthFailed {
            provider: "Pathao".into(),
            body: "{\"message\":\"invalid\"}".into(),
        };
        assert_eq!(
            err.to_string(),
            "Failed to get Pathao access token: {\"message\":\"invalid\"}"
        );

        let err = SyncError::fetch("cities", "http://x/city-list", Some(503), "HTTP 503");
        assert_eq!(err.to_string(), "Failed to fetch cities: HTTP 503");
    }

    #[test]
    fn test_unknown_provider_converts_to_unsupported() {
        let err: SyncError = courier_core::CoreError::UnknownProvider("dhl".into()).into();
        assert!(matches!(err, SyncError::UnsupportedProvider(name) if name == "dhl"));
    }
}
