//! # Token Cache Repository
//!
//! Key/value slots with an absolute expiry, used to keep provider access
//! and refresh tokens across process runs.
//!
//! ```text
//! ┌──────────────────────────┬────────────────┬──────────────────────────┐
//! │ cache_key                │ value          │ expires_at (unix secs)   │
//! ├──────────────────────────┼────────────────┼──────────────────────────┤
//! │ pathao_access_token      │ eyJ0eXAiOi...  │ now + expires_in - 60    │
//! │ pathao_refresh_token     │ def50200...    │ now + 7 days             │
//! └──────────────────────────┴────────────────┴──────────────────────────┘
//! ```
//!
//! A slot whose `expires_at` is not in the future reads as absent.

use chrono::{DateTime, Utc};
use sqlx::SqlitePool;
use tracing::debug;

use crate::error::DbResult;

/// Repository for the `token_cache` table.
#[derive(Debug, Clone)]
pub struct TokenCacheRepository {
    pool: SqlitePool,
}

impl TokenCacheRepository {
    /// Creates a new TokenCacheRepository.
    pub fn new(pool: SqlitePool) -> Self {
        TokenCacheRepository { pool }
    }

    /// Returns the value under `key` if it has not expired at `now`.
    pub async fn get(&self, key: &str, now: DateTime<Utc>) -> DbResult<Option<String>> {
        let value: Option<String> = sqlx::query_scalar(
            "SELECT value FROM token_cache WHERE cache_key = ?1 AND expires_at > ?2",
        )
        .bind(key)
        .bind(now.timestamp())
        .fetch_optional(&self.pool)
        .await?;

        Ok(value)
    }

    /// Stores `value` under `key`, replacing any previous slot.
    pub async fn put(&self, key: &str, value: &str, expires_at: DateTime<Utc>) -> DbResult<()> {
        sqlx::query(
            r#"
            INSERT INTO token_cache (cache_key, value, expires_at)
            VALUES (?1, ?2, ?3)
            ON CONFLICT (cache_key) DO UPDATE SET
                value = excluded.value,
                expires_at = excluded.expires_at
            "#,
        )
        .bind(key)
        .bind(value)
        .bind(expires_at.timestamp())
        .execute(&self.pool)
        .await?;

        debug!(key = %key, expires_at = %expires_at, "Token cache slot written");
        Ok(())
    }

    /// Removes a slot. Returns whether one existed.
    pub async fn remove(&self, key: &str) -> DbResult<bool> {
        let result = sqlx::query("DELETE FROM token_cache WHERE cache_key = ?1")
            .bind(key)
            .execute(&self.pool)
            .await?;

        Ok(result.rows_affected() > 0)
    }

    /// Deletes every slot expired at `now`. Returns the number removed.
    pub async fn purge_expired(&self, now: DateTime<Utc>) -> DbResult<u64> {
        let result = sqlx::query("DELETE FROM token_cache WHERE expires_at <= ?1")
            .bind(now.timestamp())
            .execute(&self.pool)
            .await?;

        if result.rows_affected() > 0 {
            debug!(removed = result.rows_affected(), "Purged expired token cache slots");
        }
        Ok(result.rows_affected())
    }
}
