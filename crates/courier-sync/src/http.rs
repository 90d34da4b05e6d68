//! # HTTP Transport
//!
//! Every request a sync run makes goes through [`HttpTransport`]. Production
//! code uses [`ReqwestTransport`]; unit tests swap in an in-memory mock so
//! the credential and walk logic can be exercised without sockets.
//!
//! ```text
//! CredentialManager ─┐
//!                    ├──► Arc<dyn HttpTransport> ──► ReqwestTransport ──► provider API
//! CatalogClient ─────┘                           └─► MockTransport (tests)
//! ```

use async_trait::async_trait;
use serde::de::DeserializeOwned;
use std::time::Duration;
use thiserror::Error;
use tracing::debug;

/// HTTP methods used against provider APIs.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum HttpMethod {
    Get,
    Post,
}

impl HttpMethod {
    pub fn as_str(self) -> &'static str {
        match self {
            HttpMethod::Get => "GET",
            HttpMethod::Post => "POST",
        }
    }
}

/// HTTP headers represented as key/value pairs.
pub type HttpHeaders = Vec<(String, String)>;

/// An outgoing request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HttpRequest {
    pub method: HttpMethod,
    pub url: String,
    pub headers: HttpHeaders,
    pub body: Vec<u8>,
}

impl HttpRequest {
    /// A GET request carrying `Authorization: Bearer <token>`.
    pub fn get_with_bearer(url: impl Into<String>, token: &str) -> Self {
        HttpRequest {
            method: HttpMethod::Get,
            url: url.into(),
            headers: vec![
                ("Accept".to_string(), "application/json".to_string()),
                ("Authorization".to_string(), format!("Bearer {token}")),
            ],
            body: Vec::new(),
        }
    }

    /// A POST request with a JSON body.
    pub fn post_json(url: impl Into<String>, body: Vec<u8>) -> Self {
        HttpRequest {
            method: HttpMethod::Post,
            url: url.into(),
            headers: vec![
                ("Accept".to_string(), "application/json".to_string()),
                ("Content-Type".to_string(), "application/json".to_string()),
            ],
            body,
        }
    }

    pub fn header(&self, name: &str) -> Option<&str> {
        header_get(&self.headers, name)
    }
}

/// A received response.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HttpResponse {
    pub status: u16,
    pub headers: HttpHeaders,
    pub body: Vec<u8>,
}

impl HttpResponse {
    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }

    /// Body as text, lossily decoded.
    pub fn text(&self) -> String {
        String::from_utf8_lossy(&self.body).into_owned()
    }

    pub fn json<T: DeserializeOwned>(&self) -> Result<T, serde_json::Error> {
        serde_json::from_slice(&self.body)
    }

    pub fn header(&self, name: &str) -> Option<&str> {
        header_get(&self.headers, name)
    }
}

#[derive(Debug, Error)]
pub enum HttpError {
    #[error("{0}")]
    Transport(String),

    #[cfg(test)]
    #[error("no mock response registered for {method} {url}")]
    NoMockResponse { method: String, url: String },
}

/// Transport boundary for all HTTP I/O.
#[async_trait]
pub trait HttpTransport: Send + Sync {
    async fn send(&self, request: HttpRequest) -> Result<HttpResponse, HttpError>;
}

/// First header value matching `name` (case-insensitive).
pub fn header_get<'a>(headers: &'a HttpHeaders, name: &str) -> Option<&'a str> {
    headers
        .iter()
        .find(|(k, _)| k.eq_ignore_ascii_case(name))
        .map(|(_, v)| v.as_str())
}

// =============================================================================
// Reqwest Transport
// =============================================================================

/// Real HTTP transport backed by reqwest.
#[derive(Debug, Clone)]
pub struct ReqwestTransport {
    client: reqwest::Client,
}

impl ReqwestTransport {
    pub fn new(client: reqwest::Client) -> Self {
        Self { client }
    }

    /// Builds a client whose every request is bounded by `timeout`.
    pub fn with_timeout(timeout: Duration) -> Result<Self, HttpError> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .user_agent(concat!("courier-sync/", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(|e| HttpError::Transport(e.to_string()))?;
        Ok(Self { client })
    }
}

#[async_trait]
impl HttpTransport for ReqwestTransport {
    async fn send(&self, request: HttpRequest) -> Result<HttpResponse, HttpError> {
        let method = match request.method {
            HttpMethod::Get => reqwest::Method::GET,
            HttpMethod::Post => reqwest::Method::POST,
        };

        debug!(method = method.as_str(), url = %request.url, "Sending request");

        let mut builder = self.client.request(method, &request.url);
        for (k, v) in request.headers {
            builder = builder.header(&k, &v);
        }

        if !request.body.is_empty() {
            builder = builder.body(request.body);
        }

        let resp = builder
            .send()
            .await
            .map_err(|e| HttpError::Transport(e.to_string()))?;

        let status = resp.status().as_u16();
        let headers: HttpHeaders = resp
            .headers()
            .iter()
            .map(|(name, value)| {
                (
                    name.as_str().to_string(),
                    value.to_str().unwrap_or_default().to_string(),
                )
            })
            .collect();

        let body = resp
            .bytes()
            .await
            .map_err(|e| HttpError::Transport(e.to_string()))?
            .to_vec();

        Ok(HttpResponse {
            status,
            headers,
            body,
        })
    }
}

// =============================================================================
// Test-only Mock Transport
// =============================================================================

#[cfg(test)]
pub use mock::MockTransport;

#[cfg(test)]
mod mock {
    use super::*;
    use std::collections::{HashMap, VecDeque};
    use std::sync::{Arc, Mutex};

    /// In-memory transport: queued responses per method + URL, then an
    /// optional sticky response that answers every further call.
    #[derive(Clone, Default)]
    pub struct MockTransport {
        inner: Arc<Mutex<Inner>>,
    }

    #[derive(Default)]
    struct Inner {
        queued: HashMap<(HttpMethod, String), VecDeque<HttpResponse>>,
        sticky: HashMap<(HttpMethod, String), HttpResponse>,
        requests: Vec<HttpRequest>,
    }

    impl MockTransport {
        pub fn new() -> Self {
            Self::default()
        }

        /// Queues a one-shot response. Queued responses are served FIFO.
        pub fn push_response(&self, method: HttpMethod, url: impl Into<String>, response: HttpResponse) {
            let mut inner = self.inner.lock().expect("mock transport lock poisoned");
            inner
                .queued
                .entry((method, url.into()))
                .or_default()
                .push_back(response);
        }

        /// Registers a response served whenever the queue for the key is empty.
        pub fn set_response(&self, method: HttpMethod, url: impl Into<String>, response: HttpResponse) {
            let mut inner = self.inner.lock().expect("mock transport lock poisoned");
            inner.sticky.insert((method, url.into()), response);
        }

        pub fn requests(&self) -> Vec<HttpRequest> {
            let inner = self.inner.lock().expect("mock transport lock poisoned");
            inner.requests.clone()
        }

        /// Requests sent to `url`, any method.
        pub fn requests_to(&self, url: &str) -> Vec<HttpRequest> {
            self.requests().into_iter().filter(|r| r.url == url).collect()
        }
    }

    #[async_trait]
    impl HttpTransport for MockTransport {
        async fn send(&self, request: HttpRequest) -> Result<HttpResponse, HttpError> {
            let mut inner = self.inner.lock().expect("mock transport lock poisoned");

            let key = (request.method, request.url.clone());
            inner.requests.push(request);

            if let Some(resp) = inner.queued.get_mut(&key).and_then(|q| q.pop_front()) {
                return Ok(resp);
            }
            match inner.sticky.get(&key) {
                Some(resp) => Ok(resp.clone()),
                None => Err(HttpError::NoMockResponse {
                    method: key.0.as_str().to_string(),
                    url: key.1,
                }),
            }
        }
    }

    impl HttpResponse {
        /// JSON response with the given status.
        pub fn json_body(status: u16, value: serde_json::Value) -> Self {
            HttpResponse {
                status,
                headers: vec![("Content-Type".to_string(), "application/json".to_string())],
                body: serde_json::to_vec(&value).expect("json value serializes"),
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_header_get_is_case_insensitive() {
        let request = HttpRequest::get_with_bearer("https://example.com", "abc");
        assert_eq!(request.header("authorization"), Some("Bearer abc"));
        assert_eq!(request.header("ACCEPT"), Some("application/json"));
        assert_eq!(request.header("missing"), None);
    }

    #[test]
    fn test_response_success_range() {
        assert!(HttpResponse::json_body(200, json!({})).is_success());
        assert!(HttpResponse::json_body(204, json!({})).is_success());
        assert!(!HttpResponse::json_body(401, json!({})).is_success());
        assert!(!HttpResponse::json_body(500, json!({})).is_success());
    }

    #[tokio::test]
    async fn test_mock_serves_queue_then_sticky() {
        let transport = MockTransport::new();
        let url = "https://example.com/api";
        transport.push_response(HttpMethod::Get, url, HttpResponse::json_body(500, json!({})));
        transport.set_response(HttpMethod::Get, url, HttpResponse::json_body(200, json!({})));

        let req = HttpRequest::get_with_bearer(url, "t");
        assert_eq!(transport.send(req.clone()).await.unwrap().status, 500);
        assert_eq!(transport.send(req.clone()).await.unwrap().status, 200);
        assert_eq!(transport.send(req).await.unwrap().status, 200);
        assert_eq!(transport.requests_to(url).len(), 3);
    }

    #[tokio::test]
    async fn test_mock_errors_without_response() {
        let transport = MockTransport::new();
        let err = transport
            .send(HttpRequest::get_with_bearer("https://example.com/missing", "t"))
            .await
            .unwrap_err();
        assert!(matches!(err, HttpError::NoMockResponse { .. }));
    }

    #[test]
    fn test_reqwest_transport_builds_with_timeout() {
        assert!(ReqwestTransport::with_timeout(Duration::from_secs(30)).is_ok());
    }
}
