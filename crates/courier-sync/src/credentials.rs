//! # Credential Manager
//!
//! Obtains a bearer token for a provider's catalog API, preferring the token
//! cache and only talking to the token endpoint when it has to.
//!
//! ## Resolution Order
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                    get_valid_access_token()                             │
//! │                                                                         │
//! │  ┌──────────────────────────┐                                          │
//! │  │ <slug>_access_token hit? │── yes ──► return it (no network)         │
//! │  └────────────┬─────────────┘                                          │
//! │               │ no                                                      │
//! │               ▼                                                         │
//! │  ┌──────────────────────────┐        POST issue-token                  │
//! │  │ <slug>_refresh_token hit?│── yes ─► grant_type = refresh_token      │
//! │  └────────────┬─────────────┘            │ ok → cache + return         │
//! │               │ no                       │ failed → warn, fall through │
//! │               ▼                          ▼                              │
//! │  POST issue-token, grant_type = password                               │
//! │     ok     → cache + return                                            │
//! │     failed → AuthFailed { body }                                       │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Cache Writes
//! After any successful grant:
//! - access token cached for `expires_in - 60` seconds, only when both
//!   `access_token` and a positive `expires_in` are present
//! - refresh token cached for 7 days, only when present
//!
//! The whole sequence runs behind an async mutex so two callers in the same
//! process never race each other to the token endpoint.

use courier_core::{ProviderName, ACCESS_TOKEN_EXPIRY_MARGIN_SECS, REFRESH_TOKEN_TTL_SECS};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::Mutex;
use tracing::{debug, info, warn};

use crate::config::ProviderCredentials;
use crate::error::{SyncError, SyncResult};
use crate::http::{HttpRequest, HttpTransport};
use crate::provider::ProviderEndpoints;
use crate::token_store::TokenStore;

// =============================================================================
// Wire Types
// =============================================================================

/// Body of a token issuance request.
#[derive(Debug, Serialize)]
struct TokenRequest<'a> {
    client_id: &'a str,
    client_secret: &'a str,
    #[serde(flatten)]
    grant: Grant<'a>,
}

#[derive(Debug, Serialize)]
#[serde(tag = "grant_type", rename_all = "snake_case")]
enum Grant<'a> {
    Password {
        username: &'a str,
        password: &'a str,
    },
    RefreshToken {
        refresh_token: &'a str,
    },
}

impl Grant<'_> {
    fn kind(&self) -> &'static str {
        match self {
            Grant::Password { .. } => "password",
            Grant::RefreshToken { .. } => "refresh_token",
        }
    }
}

/// Token endpoint response. Every field is optional on the wire.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct TokenGrant {
    #[serde(default)]
    pub access_token: Option<String>,

    #[serde(default)]
    pub refresh_token: Option<String>,

    /// Lifetime in seconds; some deployments send it as a string.
    #[serde(default)]
    pub expires_in: Option<serde_json::Value>,
}

impl TokenGrant {
    fn access_token(&self) -> Option<&str> {
        self.access_token.as_deref().filter(|t| !t.is_empty())
    }

    fn refresh_token(&self) -> Option<&str> {
        self.refresh_token.as_deref().filter(|t| !t.is_empty())
    }

    fn expires_in_secs(&self) -> Option<u64> {
        let secs = match self.expires_in.as_ref()? {
            serde_json::Value::Number(n) => n.as_u64(),
            serde_json::Value::String(s) => s.trim().parse().ok(),
            _ => None,
        };
        secs.filter(|secs| *secs > 0)
    }

    /// How long the access token may be served from cache.
    ///
    /// `None` when the grant lacks a token or lifetime, or when the lifetime
    /// does not exceed the safety margin.
    pub fn access_ttl(&self) -> Option<Duration> {
        self.access_token()?;
        let secs = self
            .expires_in_secs()?
            .checked_sub(ACCESS_TOKEN_EXPIRY_MARGIN_SECS)
            .filter(|secs| *secs > 0)?;
        Some(Duration::from_secs(secs))
    }
}

// =============================================================================
// Credential Manager
// =============================================================================

/// Token lifecycle for one provider.
pub struct CredentialManager {
    provider: ProviderName,
    endpoints: ProviderEndpoints,
    credentials: ProviderCredentials,
    transport: Arc<dyn HttpTransport>,
    store: Arc<dyn TokenStore>,
    resolve_lock: Mutex<()>,
}

impl CredentialManager {
    pub fn new(
        endpoints: ProviderEndpoints,
        credentials: ProviderCredentials,
        transport: Arc<dyn HttpTransport>,
        store: Arc<dyn TokenStore>,
    ) -> Self {
        Self {
            provider: endpoints.provider(),
            endpoints,
            credentials,
            transport,
            store,
            resolve_lock: Mutex::new(()),
        }
    }

    /// Returns a usable access token.
    ///
    /// ## Errors
    /// [`SyncError::AuthFailed`] when the password grant fails. Refresh grant
    /// failures never surface.
    pub async fn get_valid_access_token(&self) -> SyncResult<String> {
        let _guard = self.resolve_lock.lock().await;

        let access_key = self.provider.access_token_key();
        if let Some(token) = self.cached(&access_key).await {
            debug!(provider = %self.provider, "Using cached access token");
            return Ok(token);
        }

        let refresh_key = self.provider.refresh_token_key();
        if let Some(refresh_token) = self.cached(&refresh_key).await {
            match self.refresh(&refresh_token).await {
                Some(token) => return Ok(token),
                None => debug!(provider = %self.provider, "Falling back to password grant"),
            }
        }

        self.request_new_token().await
    }

    /// Refresh grant. Any failure is logged and yields `None`.
    async fn refresh(&self, refresh_token: &str) -> Option<String> {
        let grant = Grant::RefreshToken { refresh_token };

        match self.exchange(grant).await {
            Ok(token_grant) => {
                self.store_token_data(&token_grant).await;
                let token = token_grant.access_token().map(str::to_string);
                if token.is_some() {
                    info!(provider = %self.provider, "Access token refreshed");
                } else {
                    warn!(provider = %self.provider, "Refresh response carried no access token");
                }
                token
            }
            Err(e) => {
                warn!(provider = %self.provider, error = %e, "Failed to refresh access token");
                None
            }
        }
    }

    /// Password grant.
    async fn request_new_token(&self) -> SyncResult<String> {
        let grant = Grant::Password {
            username: &self.credentials.username,
            password: &self.credentials.password,
        };

        let token_grant = self.exchange(grant).await?;
        self.store_token_data(&token_grant).await;

        let token = token_grant
            .access_token()
            .map(str::to_string)
            .ok_or_else(|| self.auth_failed("token response did not include an access token"))?;

        info!(provider = %self.provider, "Issued new access token");
        Ok(token)
    }

    /// POSTs a grant to the token endpoint.
    async fn exchange(&self, grant: Grant<'_>) -> SyncResult<TokenGrant> {
        let grant_type = grant.kind();
        let body = serde_json::to_vec(&TokenRequest {
            client_id: &self.credentials.client_id,
            client_secret: &self.credentials.client_secret,
            grant,
        })
        .map_err(|e| SyncError::SerializationFailed(e.to_string()))?;

        debug!(provider = %self.provider, grant_type, "Requesting token");

        let request = HttpRequest::post_json(self.endpoints.token_url(), body);
        let response = self
            .transport
            .send(request)
            .await
            .map_err(|e| self.auth_failed(e.to_string()))?;

        if !response.is_success() {
            return Err(self.auth_failed(response.text()));
        }

        response
            .json::<TokenGrant>()
            .map_err(|e| self.auth_failed(format!("malformed token response: {e}")))
    }

    /// Writes the tokens carried by a grant into the cache.
    async fn store_token_data(&self, grant: &TokenGrant) {
        if let (Some(token), Some(ttl)) = (grant.access_token(), grant.access_ttl()) {
            let key = self.provider.access_token_key();
            if let Err(e) = self.store.put(&key, token, ttl).await {
                warn!(key = %key, error = %e, "Failed to cache access token");
            }
        }

        if let Some(refresh_token) = grant.refresh_token() {
            let key = self.provider.refresh_token_key();
            let ttl = Duration::from_secs(REFRESH_TOKEN_TTL_SECS);
            if let Err(e) = self.store.put(&key, refresh_token, ttl).await {
                warn!(key = %key, error = %e, "Failed to cache refresh token");
            }
        }
    }

    /// Cache read; a failing backend counts as a miss.
    async fn cached(&self, key: &str) -> Option<String> {
        match self.store.get(key).await {
            Ok(value) => value.filter(|v| !v.is_empty()),
            Err(e) => {
                warn!(key = %key, error = %e, "Token cache read failed, treating as miss");
                None
            }
        }
    }

    fn auth_failed(&self, body: impl Into<String>) -> SyncError {
        SyncError::AuthFailed {
            provider: self.provider.to_string(),
            body: body.into(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::http::{HttpMethod, HttpResponse, MockTransport};
    use crate::provider::PathaoProvider;
    use crate::token_store::MemoryTokenStore;
    use async_trait::async_trait;
    use serde_json::json;

    const BASE: &str = "https://pathao.test";
    const TOKEN_URL: &str = "https://pathao.test/aladdin/api/v1/issue-token";

    fn credentials() -> ProviderCredentials {
        ProviderCredentials {
            base_url: BASE.into(),
            client_id: "client".into(),
            client_secret: "secret".into(),
            username: "merchant@example.com".into(),
            password: "hunter2".into(),
        }
    }

    fn manager(transport: &MockTransport, store: Arc<dyn TokenStore>) -> CredentialManager {
        let endpoints = ProviderEndpoints::new(BASE, Arc::new(PathaoProvider)).unwrap();
        CredentialManager::new(endpoints, credentials(), Arc::new(transport.clone()), store)
    }

    fn grant_type(request: &HttpRequest) -> String {
        let body: serde_json::Value = serde_json::from_slice(&request.body).unwrap();
        body["grant_type"].as_str().unwrap().to_string()
    }

    #[tokio::test]
    async fn test_cached_access_token_skips_network() {
        let transport = MockTransport::new();
        let store = Arc::new(MemoryTokenStore::new());
        store
            .put("pathao_access_token", "cached", Duration::from_secs(600))
            .await
            .unwrap();

        let token = manager(&transport, store).get_valid_access_token().await.unwrap();

        assert_eq!(token, "cached");
        assert!(transport.requests().is_empty());
    }

    #[tokio::test]
    async fn test_refresh_grant_used_when_access_token_missing() {
        let transport = MockTransport::new();
        transport.push_response(
            HttpMethod::Post,
            TOKEN_URL,
            HttpResponse::json_body(
                200,
                json!({"access_token": "fresh", "refresh_token": "r2", "expires_in": 3600}),
            ),
        );
        let store = Arc::new(MemoryTokenStore::new());
        store
            .put("pathao_refresh_token", "r1", Duration::from_secs(600))
            .await
            .unwrap();

        let token = manager(&transport, store.clone())
            .get_valid_access_token()
            .await
            .unwrap();

        assert_eq!(token, "fresh");
        let requests = transport.requests();
        assert_eq!(requests.len(), 1);
        assert_eq!(grant_type(&requests[0]), "refresh_token");

        let body: serde_json::Value = serde_json::from_slice(&requests[0].body).unwrap();
        assert_eq!(body["refresh_token"], "r1");
        assert_eq!(body["client_id"], "client");
        assert!(body.get("password").is_none());

        assert_eq!(store.get("pathao_access_token").await.unwrap().as_deref(), Some("fresh"));
        assert_eq!(store.get("pathao_refresh_token").await.unwrap().as_deref(), Some("r2"));
    }

    #[tokio::test(start_paused = true)]
    async fn test_expired_access_token_triggers_refresh_grant() {
        let transport = MockTransport::new();
        transport.push_response(
            HttpMethod::Post,
            TOKEN_URL,
            HttpResponse::json_body(
                200,
                json!({"access_token": "renewed", "refresh_token": "r2", "expires_in": 3600}),
            ),
        );
        let store = Arc::new(MemoryTokenStore::new());
        store
            .put("pathao_access_token", "old", Duration::from_secs(30))
            .await
            .unwrap();
        store
            .put("pathao_refresh_token", "r1", Duration::from_secs(600))
            .await
            .unwrap();

        let manager = manager(&transport, store);
        assert_eq!(manager.get_valid_access_token().await.unwrap(), "old");
        assert!(transport.requests().is_empty());

        tokio::time::advance(Duration::from_secs(31)).await;

        assert_eq!(manager.get_valid_access_token().await.unwrap(), "renewed");
        let requests = transport.requests();
        assert_eq!(requests.len(), 1);
        assert_eq!(grant_type(&requests[0]), "refresh_token");
    }

    #[tokio::test]
    async fn test_failed_refresh_falls_back_to_password_grant() {
        let transport = MockTransport::new();
        transport.push_response(
            HttpMethod::Post,
            TOKEN_URL,
            HttpResponse::json_body(401, json!({"message": "refresh token revoked"})),
        );
        transport.push_response(
            HttpMethod::Post,
            TOKEN_URL,
            HttpResponse::json_body(200, json!({"access_token": "new", "expires_in": 3600})),
        );
        let store = Arc::new(MemoryTokenStore::new());
        store
            .put("pathao_refresh_token", "stale", Duration::from_secs(600))
            .await
            .unwrap();

        let token = manager(&transport, store).get_valid_access_token().await.unwrap();

        assert_eq!(token, "new");
        let kinds: Vec<_> = transport.requests().iter().map(grant_type).collect();
        assert_eq!(kinds, vec!["refresh_token", "password"]);
    }

    #[tokio::test]
    async fn test_password_grant_failure_carries_body() {
        let transport = MockTransport::new();
        transport.push_response(
            HttpMethod::Post,
            TOKEN_URL,
            HttpResponse {
                status: 400,
                headers: Vec::new(),
                body: b"invalid_client".to_vec(),
            },
        );

        let err = manager(&transport, Arc::new(MemoryTokenStore::new()))
            .get_valid_access_token()
            .await
            .unwrap_err();

        assert_eq!(err.to_string(), "Failed to get Pathao access token: invalid_client");
        let requests = transport.requests();
        assert_eq!(grant_type(&requests[0]), "password");
        let body: serde_json::Value = serde_json::from_slice(&requests[0].body).unwrap();
        assert_eq!(body["username"], "merchant@example.com");
        assert_eq!(body["password"], "hunter2");
    }

    #[tokio::test]
    async fn test_transport_error_on_password_grant_is_auth_failure() {
        let transport = MockTransport::new();

        let err = manager(&transport, Arc::new(MemoryTokenStore::new()))
            .get_valid_access_token()
            .await
            .unwrap_err();

        assert!(matches!(err, SyncError::AuthFailed { .. }));
    }

    #[tokio::test(start_paused = true)]
    async fn test_access_token_cached_with_margin() {
        let transport = MockTransport::new();
        transport.push_response(
            HttpMethod::Post,
            TOKEN_URL,
            HttpResponse::json_body(
                200,
                json!({"access_token": "a1", "refresh_token": "r1", "expires_in": 120}),
            ),
        );
        let store = Arc::new(MemoryTokenStore::new());
        let manager = manager(&transport, store.clone());

        manager.get_valid_access_token().await.unwrap();

        tokio::time::advance(Duration::from_secs(59)).await;
        assert_eq!(store.get("pathao_access_token").await.unwrap().as_deref(), Some("a1"));

        tokio::time::advance(Duration::from_secs(2)).await;
        assert_eq!(store.get("pathao_access_token").await.unwrap(), None);
        assert_eq!(store.get("pathao_refresh_token").await.unwrap().as_deref(), Some("r1"));
    }

    #[tokio::test]
    async fn test_missing_expires_in_skips_access_cache() {
        let transport = MockTransport::new();
        transport.push_response(
            HttpMethod::Post,
            TOKEN_URL,
            HttpResponse::json_body(200, json!({"access_token": "a1"})),
        );
        let store = Arc::new(MemoryTokenStore::new());

        let token = manager(&transport, store.clone())
            .get_valid_access_token()
            .await
            .unwrap();

        assert_eq!(token, "a1");
        assert_eq!(store.get("pathao_access_token").await.unwrap(), None);
        assert_eq!(store.get("pathao_refresh_token").await.unwrap(), None);
    }

    #[test]
    fn test_access_ttl() {
        let grant = |value: serde_json::Value| -> TokenGrant { serde_json::from_value(value).unwrap() };

        assert_eq!(
            grant(json!({"access_token": "a", "expires_in": 432000})).access_ttl(),
            Some(Duration::from_secs(431940))
        );
        assert_eq!(
            grant(json!({"access_token": "a", "expires_in": "3600"})).access_ttl(),
            Some(Duration::from_secs(3540))
        );
        assert_eq!(grant(json!({"access_token": "a", "expires_in": 60})).access_ttl(), None);
        assert_eq!(grant(json!({"access_token": "", "expires_in": 3600})).access_ttl(), None);
        assert_eq!(grant(json!({"expires_in": 3600})).access_ttl(), None);
    }

    struct BrokenStore;

    #[async_trait]
    impl TokenStore for BrokenStore {
        async fn get(&self, _key: &str) -> SyncResult<Option<String>> {
            Err(SyncError::TokenCache("connection refused".into()))
        }

        async fn put(&self, _key: &str, _value: &str, _ttl: Duration) -> SyncResult<()> {
            Err(SyncError::TokenCache("connection refused".into()))
        }
    }

    #[tokio::test]
    async fn test_broken_cache_does_not_fail_resolution() {
        let transport = MockTransport::new();
        transport.push_response(
            HttpMethod::Post,
            TOKEN_URL,
            HttpResponse::json_body(200, json!({"access_token": "a1", "expires_in": 3600})),
        );

        let token = manager(&transport, Arc::new(BrokenStore))
            .get_valid_access_token()
            .await
            .unwrap();

        assert_eq!(token, "a1");
    }
}
