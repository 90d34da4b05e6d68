//! # Courier Providers
//!
//! The closed set of courier providers whose location catalogs can be synced.
//!
//! ## Naming
//! ```text
//! ┌──────────────┬────────────────┬──────────────────────────────────────┐
//! │ Variant      │ Stored name    │ Slug (CLI, cache keys, config)       │
//! ├──────────────┼────────────────┼──────────────────────────────────────┤
//! │ Pathao       │ "Pathao"       │ "pathao"                             │
//! │ Redx         │ "Redx"         │ "redx"                               │
//! └──────────────┴────────────────┴──────────────────────────────────────┘
//! ```
//!
//! A name being listed here does not mean it can be synced: the sync engine
//! keeps its own registry of provider handlers.

use serde::{Deserialize, Serialize};

use crate::error::CoreError;

/// A courier provider.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[cfg_attr(feature = "sqlx", derive(sqlx::Type))]
pub enum ProviderName {
    /// Pathao Courier (Bangladesh).
    Pathao,
    /// RedX (Bangladesh).
    Redx,
}

impl ProviderName {
    /// Every known provider, in declaration order.
    pub const ALL: [ProviderName; 2] = [ProviderName::Pathao, ProviderName::Redx];

    /// The name stored in the `provider_name` column.
    pub const fn as_str(&self) -> &'static str {
        match self {
            ProviderName::Pathao => "Pathao",
            ProviderName::Redx => "Redx",
        }
    }

    /// Lowercase identifier used on the command line, in config sections and
    /// as the token cache key prefix.
    pub const fn slug(&self) -> &'static str {
        match self {
            ProviderName::Pathao => "pathao",
            ProviderName::Redx => "redx",
        }
    }

    /// Cache key of the access token slot, e.g. `pathao_access_token`.
    pub fn access_token_key(&self) -> String {
        format!("{}_access_token", self.slug())
    }

    /// Cache key of the refresh token slot, e.g. `pathao_refresh_token`.
    pub fn refresh_token_key(&self) -> String {
        format!("{}_refresh_token", self.slug())
    }
}

impl std::fmt::Display for ProviderName {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for ProviderName {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let wanted = s.trim();
        ProviderName::ALL
            .into_iter()
            .find(|p| p.slug().eq_ignore_ascii_case(wanted))
            .ok_or_else(|| CoreError::UnknownProvider(wanted.to_string()))
    }
}
