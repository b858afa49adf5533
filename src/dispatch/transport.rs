//! HTTP transport seam
//!
//! The dispatcher only needs "send this request, give me status and bytes".
//! `ReqwestTransport` does it over the network; `MockTransport` records
//! requests and replays canned responses.

use std::collections::VecDeque;
use std::sync::Mutex;
use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;

use crate::error::{CalendarError, DispatchError, Result};

use super::request::PreparedRequest;

/// Status and full body of an HTTP response
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RawResponse {
    pub status: u16,
    pub body: Vec<u8>,
}

impl RawResponse {
    pub fn new(status: u16, body: impl Into<Vec<u8>>) -> Self {
        Self {
            status,
            body: body.into(),
        }
    }

    pub fn is_error(&self) -> bool {
        self.status >= 400
    }

    pub fn text(&self) -> String {
        String::from_utf8_lossy(&self.body).into_owned()
    }
}

/// Performs one HTTP round trip
#[async_trait]
pub trait HttpTransport: Send + Sync {
    async fn send(&self, request: PreparedRequest) -> std::result::Result<RawResponse, DispatchError>;
}

/// Transport backed by a shared reqwest client
#[derive(Debug, Clone)]
pub struct ReqwestTransport {
    client: Client,
}

impl ReqwestTransport {
    /// Create a transport whose requests time out after `timeout`
    pub fn new(timeout: Duration) -> Result<Self> {
        let client = Client::builder()
            .timeout(timeout)
            .user_agent(concat!(env!("CARGO_PKG_NAME"), "/", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(|e| CalendarError::HttpClient(format!("Failed to create HTTP client: {}", e)))?;
        Ok(Self { client })
    }

    pub fn with_client(client: Client) -> Self {
        Self { client }
    }
}

#[async_trait]
impl HttpTransport for ReqwestTransport {
    async fn send(&self, request: PreparedRequest) -> std::result::Result<RawResponse, DispatchError> {
        let mut builder = self
            .client
            .request(request.method, request.url)
            .headers(request.headers);
        if let Some(body) = request.body {
            builder = builder.body(body);
        }

        let response = builder
            .send()
            .await
            .map_err(|e| DispatchError::RequestFailed(e.to_string()))?;
        let status = response.status().as_u16();
        let body = response
            .bytes()
            .await
            .map_err(|e| DispatchError::ResponseReadFailed(e.to_string()))?;

        Ok(RawResponse {
            status,
            body: body.to_vec(),
        })
    }
}

/// In-memory transport for tests and dry runs
#[derive(Debug, Default)]
pub struct MockTransport {
    requests: Mutex<Vec<PreparedRequest>>,
    responses: Mutex<VecDeque<std::result::Result<RawResponse, DispatchError>>>,
    delay: Option<Duration>,
}

impl MockTransport {
    /// Transport that answers every request with `200 {}`
    pub fn new() -> Self {
        Self::default()
    }

    /// Queue a response; queued responses are used in order
    pub fn with_response(self, status: u16, body: impl Into<Vec<u8>>) -> Self {
        self.push_response(status, body);
        self
    }

    /// Queue a transport failure
    pub fn with_error(self, error: DispatchError) -> Self {
        self.lock_responses().push_back(Err(error));
        self
    }

    /// Sleep before answering, to exercise timeouts and cancellation
    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = Some(delay);
        self
    }

    pub fn push_response(&self, status: u16, body: impl Into<Vec<u8>>) {
        self.lock_responses().push_back(Ok(RawResponse::new(status, body)));
    }

    /// Requests seen so far, oldest first
    pub fn requests(&self) -> Vec<PreparedRequest> {
        match self.requests.lock() {
            Ok(guard) => guard.clone(),
            Err(poisoned) => poisoned.into_inner().clone(),
        }
    }

    pub fn request_count(&self) -> usize {
        self.requests().len()
    }

    fn lock_responses(&self) -> std::sync::MutexGuard<'_, VecDeque<std::result::Result<RawResponse, DispatchError>>> {
        self.responses.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

#[async_trait]
impl HttpTransport for MockTransport {
    async fn send(&self, request: PreparedRequest) -> std::result::Result<RawResponse, DispatchError> {
        self.requests
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .push(request);

        if let Some(delay) = self.delay {
            tokio::time::sleep(delay).await;
        }

        self.lock_responses()
            .pop_front()
            .unwrap_or_else(|| Ok(RawResponse::new(200, b"{}".to_vec())))
    }
}
