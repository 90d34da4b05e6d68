//! # Token Stores
//!
//! String slots with a per-key TTL holding provider access and refresh
//! tokens between runs.
//!
//! ```text
//! ┌───────────────────────┬──────────────────────────┬────────────────────┐
//! │ Backend               │ Storage                  │ Survives restart   │
//! ├───────────────────────┼──────────────────────────┼────────────────────┤
//! │ DatabaseTokenStore    │ token_cache table        │ yes                │
//! │ RedisTokenStore       │ SET key value EX ttl     │ yes, across hosts  │
//! │ MemoryTokenStore      │ HashMap + Instant        │ no                 │
//! └───────────────────────┴──────────────────────────┴────────────────────┘
//! ```

use async_trait::async_trait;
use chrono::Utc;
use courier_db::TokenCacheRepository;
use redis::aio::ConnectionManager;
use redis::AsyncCommands;
use std::collections::HashMap;
use std::time::Duration;
use tokio::sync::RwLock;
use tokio::time::Instant;
use tracing::{debug, info};

use crate::error::{SyncError, SyncResult};

/// Key/value cache with independent expiry per key.
#[async_trait]
pub trait TokenStore: Send + Sync {
    /// Value under `key`, or `None` if absent or expired.
    async fn get(&self, key: &str) -> SyncResult<Option<String>>;

    /// Stores `value` under `key` for `ttl`.
    async fn put(&self, key: &str, value: &str, ttl: Duration) -> SyncResult<()>;
}

// =============================================================================
// Memory
// =============================================================================

/// In-process store. Expiry follows the tokio clock, so paused-time tests
/// can advance past a TTL.
#[derive(Debug, Default)]
pub struct MemoryTokenStore {
    entries: RwLock<HashMap<String, (String, Instant)>>,
}

impl MemoryTokenStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl TokenStore for MemoryTokenStore {
    async fn get(&self, key: &str) -> SyncResult<Option<String>> {
        let entries = self.entries.read().await;
        Ok(entries
            .get(key)
            .filter(|(_, expires_at)| Instant::now() < *expires_at)
            .map(|(value, _)| value.clone()))
    }

    async fn put(&self, key: &str, value: &str, ttl: Duration) -> SyncResult<()> {
        let expires_at = Instant::now() + ttl;
        self.entries
            .write()
            .await
            .insert(key.to_string(), (value.to_string(), expires_at));
        Ok(())
    }
}

// =============================================================================
// Database
// =============================================================================

/// Store backed by the `token_cache` table of the local database.
#[derive(Debug, Clone)]
pub struct DatabaseTokenStore {
    repo: TokenCacheRepository,
}

impl DatabaseTokenStore {
    pub fn new(repo: TokenCacheRepository) -> Self {
        Self { repo }
    }
}

#[async_trait]
impl TokenStore for DatabaseTokenStore {
    async fn get(&self, key: &str) -> SyncResult<Option<String>> {
        self.repo
            .get(key, Utc::now())
            .await
            .map_err(|e| SyncError::TokenCache(e.to_string()))
    }

    async fn put(&self, key: &str, value: &str, ttl: Duration) -> SyncResult<()> {
        let ttl = chrono::Duration::from_std(ttl)
            .map_err(|e| SyncError::TokenCache(format!("TTL out of range: {e}")))?;

        self.repo
            .put(key, value, Utc::now() + ttl)
            .await
            .map_err(|e| SyncError::TokenCache(e.to_string()))
    }
}

// =============================================================================
// Redis
// =============================================================================

/// Store backed by Redis, shared by every host running the sync.
#[derive(Clone)]
pub struct RedisTokenStore {
    conn: ConnectionManager,
}

impl RedisTokenStore {
    /// Opens a managed connection to `redis_url`.
    pub async fn connect(redis_url: &str) -> SyncResult<Self> {
        let client = redis::Client::open(redis_url)?;
        let conn = client.get_connection_manager().await?;
        info!("Connected to Redis token cache");
        Ok(Self { conn })
    }
}

#[async_trait]
impl TokenStore for RedisTokenStore {
    async fn get(&self, key: &str) -> SyncResult<Option<String>> {
        let mut conn = self.conn.clone();
        let value: Option<String> = conn.get(key).await?;
        Ok(value)
    }

    async fn put(&self, key: &str, value: &str, ttl: Duration) -> SyncResult<()> {
        // EX 0 is rejected by Redis
        let secs = ttl.as_secs().max(1);
        let mut conn = self.conn.clone();
        let _: () = conn.set_ex(key, value, secs).await?;
        debug!(key = %key, ttl_secs = secs, "Token written to Redis");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use courier_db::{Database, DbConfig};

    #[tokio::test(start_paused = true)]
    async fn test_memory_store_expires_entries() {
        let store = MemoryTokenStore::new();
        store.put("pathao_access_token", "abc", Duration::from_secs(60)).await.unwrap();

        assert_eq!(store.get("pathao_access_token").await.unwrap().as_deref(), Some("abc"));

        tokio::time::advance(Duration::from_secs(61)).await;
        assert_eq!(store.get("pathao_access_token").await.unwrap(), None);
    }

    #[tokio::test]
    async fn test_memory_store_keys_are_independent() {
        let store = MemoryTokenStore::new();
        store.put("a", "1", Duration::from_secs(60)).await.unwrap();
        store.put("b", "2", Duration::from_secs(60)).await.unwrap();
        store.put("a", "3", Duration::from_secs(60)).await.unwrap();

        assert_eq!(store.get("a").await.unwrap().as_deref(), Some("3"));
        assert_eq!(store.get("b").await.unwrap().as_deref(), Some("2"));
        assert_eq!(store.get("c").await.unwrap(), None);
    }

    #[tokio::test]
    async fn test_database_store_round_trip() {
        let db = Database::new(DbConfig::in_memory()).await.unwrap();
        let store = DatabaseTokenStore::new(db.token_cache());

        store
            .put("pathao_refresh_token", "r1", Duration::from_secs(7 * 24 * 3600))
            .await
            .unwrap();

        assert_eq!(
            store.get("pathao_refresh_token").await.unwrap().as_deref(),
            Some("r1")
        );
        assert_eq!(store.get("pathao_access_token").await.unwrap(), None);
    }
}
