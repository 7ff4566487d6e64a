//! Thin HTTP transport abstraction.
//!
//! Flows never talk to `reqwest` directly; they see a trait that surfaces
//! status code and raw body, so tests can substitute a scripted transport
//! and count the network calls a flow makes.

use async_trait::async_trait;
use reqwest::Client;
use std::time::Duration;
use tracing::debug;

use crate::error::{AttestError, Result};

/// Default timeout for API requests.
const DEFAULT_TIMEOUT: Duration = Duration::from_secs(10);

/// An HTTP response reduced to what the protocol needs.
#[derive(Debug, Clone)]
pub struct HttpResponse {
    pub status: u16,
    pub body: Vec<u8>,
}

/// Trait for issuing the protocol's HTTP requests.
///
/// Implementations must be thread-safe (`Send + Sync`). The transport owns
/// connection lifecycle and timeouts; flows only interpret status + body.
#[async_trait]
pub trait HttpTransport: Send + Sync {
    async fn get(&self, url: &str) -> Result<HttpResponse>;

    async fn post_json(&self, url: &str, body: &serde_json::Value) -> Result<HttpResponse>;
}

/// Production transport backed by a shared `reqwest::Client`.
pub struct ReqwestTransport {
    client: Client,
}

impl ReqwestTransport {
    pub fn new() -> Result<Self> {
        Self::with_timeout(DEFAULT_TIMEOUT)
    }

    pub fn with_timeout(timeout: Duration) -> Result<Self> {
        let client = Client::builder().timeout(timeout).build().map_err(|e| {
            AttestError::BadServerResponse(format!("failed to create HTTP client: {e}"))
        })?;
        Ok(Self { client })
    }

    async fn read(response: reqwest::Response) -> Result<HttpResponse> {
        let status = response.status().as_u16();
        let body = response.bytes().await?.to_vec();
        debug!(status, body_len = body.len(), "received HTTP response");
        Ok(HttpResponse { status, body })
    }
}

#[async_trait]
impl HttpTransport for ReqwestTransport {
    async fn get(&self, url: &str) -> Result<HttpResponse> {
        let response = self.client.get(url).send().await?;
        Self::read(response).await
    }

    async fn post_json(&self, url: &str, body: &serde_json::Value) -> Result<HttpResponse> {
        let response = self.client.post(url).json(body).send().await?;
        Self::read(response).await
    }
}

/// A request observed by [`MockTransport`].
#[derive(Debug, Clone)]
pub struct RecordedRequest {
    pub method: String,
    pub url: String,
    pub body: Option<serde_json::Value>,
}

/// Scripted transport for testing.
/// WARNING: Do not use in production - nothing leaves the process!
///
/// Responses are matched by URL substring in registration order; every
/// request is recorded so tests can assert exactly which calls a flow made.
#[derive(Default)]
pub struct MockTransport {
    routes: std::sync::RwLock<Vec<(String, HttpResponse)>>,
    log: std::sync::Mutex<Vec<RecordedRequest>>,
}

impl MockTransport {
    pub fn new() -> Self {
        Self::default()
    }

    /// Script a response for any URL containing `fragment`.
    pub fn on(&self, fragment: &str, status: u16, body: impl Into<Vec<u8>>) {
        self.routes.write().unwrap().push((
            fragment.to_string(),
            HttpResponse {
                status,
                body: body.into(),
            },
        ));
    }

    pub fn requests(&self) -> Vec<RecordedRequest> {
        self.log.lock().unwrap().clone()
    }

    pub fn request_count(&self) -> usize {
        self.log.lock().unwrap().len()
    }

    fn respond(&self, method: &str, url: &str, body: Option<serde_json::Value>) -> Result<HttpResponse> {
        self.log.lock().unwrap().push(RecordedRequest {
            method: method.to_string(),
            url: url.to_string(),
            body,
        });

        self.routes
            .read()
            .unwrap()
            .iter()
            .find(|(fragment, _)| url.contains(fragment.as_str()))
            .map(|(_, response)| response.clone())
            .ok_or_else(|| AttestError::BadServerResponse(format!("no scripted response for {url}")))
    }
}

#[async_trait]
impl HttpTransport for MockTransport {
    async fn get(&self, url: &str) -> Result<HttpResponse> {
        self.respond("GET", url, None)
    }

    async fn post_json(&self, url: &str, body: &serde_json::Value) -> Result<HttpResponse> {
        self.respond("POST", url, Some(body.clone()))
    }
}
