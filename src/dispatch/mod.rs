//! Request-dispatch core
//!
//! One `Dispatcher` serves every tool: it validates the argument bag
//! against the descriptor, assembles the request, sends it through the
//! transport, and decodes the response. Each call produces exactly one
//! outbound request, or none if validation fails.

mod args;
mod auth;
mod request;
mod response;
mod transport;

pub use args::ArgumentBag;
pub use auth::AuthContext;
pub use request::{PreparedRequest, build_request};
pub use response::decode_response;
pub use transport::{HttpTransport, MockTransport, RawResponse, ReqwestTransport};

use std::sync::Arc;

use serde::Serialize;
use serde_json::Value;
use tokio_util::sync::CancellationToken;

use crate::error::DispatchError;
use crate::tools::ToolDescriptor;

/// Outcome of one tool invocation, as handed back to the caller
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct InvocationResult {
    pub content: String,
    pub is_error: bool,
}

impl InvocationResult {
    pub fn success(content: impl Into<String>) -> Self {
        Self {
            content: content.into(),
            is_error: false,
        }
    }

    pub fn error(message: impl Into<String>) -> Self {
        Self {
            content: message.into(),
            is_error: true,
        }
    }
}

impl From<Result<String, DispatchError>> for InvocationResult {
    fn from(result: Result<String, DispatchError>) -> Self {
        match result {
            Ok(content) => Self::success(content),
            Err(e) => Self::error(e.to_string()),
        }
    }
}

/// Executes tool descriptors against the API
#[derive(Clone)]
pub struct Dispatcher {
    transport: Arc<dyn HttpTransport>,
    base_url: String,
    auth: AuthContext,
}

impl Dispatcher {
    pub fn new(transport: Arc<dyn HttpTransport>, base_url: impl Into<String>, auth: AuthContext) -> Self {
        Self {
            transport,
            base_url: base_url.into(),
            auth,
        }
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    pub fn auth(&self) -> &AuthContext {
        &self.auth
    }

    /// Build the request without sending it
    pub fn prepare(&self, tool: &ToolDescriptor, args: &Value) -> Result<PreparedRequest, DispatchError> {
        let bag = ArgumentBag::new(args)?;
        build_request(&self.base_url, tool, &bag, &self.auth)
    }

    /// Prepare, send and decode
    pub async fn execute(&self, tool: &ToolDescriptor, args: &Value) -> Result<String, DispatchError> {
        let request = self.prepare(tool, args)?;
        tracing::debug!(tool = %tool.name, method = %tool.method, path = %request.url.path(), "Sending request");

        let response = self.transport.send(request).await?;
        tracing::debug!(tool = %tool.name, status = response.status, bytes = response.body.len(), "Received response");

        decode_response(tool, response)
    }

    /// Run a tool; every failure is folded into the result
    pub async fn invoke(&self, tool: &ToolDescriptor, args: &Value) -> InvocationResult {
        let result = self.execute(tool, args).await;
        log_outcome(tool, &result);
        result.into()
    }

    /// Like `invoke`, but gives up when `cancel` fires
    pub async fn invoke_with_cancel(
        &self,
        tool: &ToolDescriptor,
        args: &Value,
        cancel: &CancellationToken,
    ) -> InvocationResult {
        // An already-cancelled token never reaches the transport.
        let result = tokio::select! {
            biased;
            _ = cancel.cancelled() => Err(DispatchError::RequestFailed("request cancelled".to_string())),
            result = self.execute(tool, args) => result,
        };
        log_outcome(tool, &result);
        result.into()
    }
}

impl std::fmt::Debug for Dispatcher {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Dispatcher")
            .field("base_url", &self.base_url)
            .field("auth", &self.auth)
            .finish()
    }
}

fn log_outcome(tool: &ToolDescriptor, result: &Result<String, DispatchError>) {
    match result {
        Ok(_) => tracing::info!(tool = %tool.name, "Tool call succeeded"),
        Err(e) if e.is_validation() => tracing::info!(tool = %tool.name, error = %e, "Tool call rejected"),
        Err(e) => tracing::warn!(tool = %tool.name, error = %e, "Tool call failed"),
    }
}
