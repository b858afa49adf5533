//! Method routing for MCP requests

use std::sync::Arc;

use serde::Serialize;
use serde_json::Value;
use tokio_util::sync::CancellationToken;

use crate::dispatch::Dispatcher;
use crate::tools::ToolCatalog;

use super::messages::{JsonRpcError, JsonRpcRequest, JsonRpcResponse};
use super::protocol::{
    InitializeResult, McpToolDefinition, ToolsCallParams, ToolsCallResult, ToolsListResult, methods,
};

/// Answers MCP requests against a tool catalog
#[derive(Debug, Clone)]
pub struct McpHandler {
    catalog: Arc<ToolCatalog>,
    dispatcher: Dispatcher,
}

impl McpHandler {
    pub fn new(catalog: Arc<ToolCatalog>, dispatcher: Dispatcher) -> Self {
        Self { catalog, dispatcher }
    }

    pub fn catalog(&self) -> &ToolCatalog {
        &self.catalog
    }

    /// Handle one request. Notifications yield `None`.
    pub async fn handle(&self, request: JsonRpcRequest, cancel: CancellationToken) -> Option<JsonRpcResponse> {
        let id = request.id.clone()?;

        let result = match request.method.as_str() {
            methods::INITIALIZE => to_result(InitializeResult::current()),
            methods::PING => Ok(Value::Object(Default::default())),
            methods::TOOLS_LIST => to_result(self.list_tools()),
            methods::TOOLS_CALL => self.call_tool(request.params, &cancel).await,
            other => {
                tracing::debug!(method = other, "Unknown method");
                Err(JsonRpcError::method_not_found(other))
            }
        };

        Some(match result {
            Ok(value) => JsonRpcResponse::success(id, value),
            Err(error) => JsonRpcResponse::error(id, error),
        })
    }

    pub fn list_tools(&self) -> ToolsListResult {
        ToolsListResult {
            tools: self.catalog.all().map(McpToolDefinition::from).collect(),
        }
    }

    async fn call_tool(&self, params: Value, cancel: &CancellationToken) -> Result<Value, JsonRpcError> {
        let params: ToolsCallParams = serde_json::from_value(params)
            .map_err(|e| JsonRpcError::invalid_params(format!("Invalid tools/call params: {}", e)))?;

        let tool = self
            .catalog
            .get(&params.name)
            .ok_or_else(|| JsonRpcError::invalid_params(format!("Unknown tool: {}", params.name)))?;

        tracing::info!(tool = %tool.name, "tools/call");
        let result = self
            .dispatcher
            .invoke_with_cancel(tool, &params.arguments(), cancel)
            .await;

        to_result(ToolsCallResult::from(result))
    }
}

fn to_result<T: Serialize>(value: T) -> Result<Value, JsonRpcError> {
    serde_json::to_value(value).map_err(|e| JsonRpcError::internal_error(e.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dispatch::{AuthContext, MockTransport};
    use crate::mcp::messages::ErrorCode;
    use serde_json::json;

    fn handler(mock: Arc<MockTransport>) -> McpHandler {
        let catalog = Arc::new(ToolCatalog::builtin().unwrap());
        let dispatcher = Dispatcher::new(mock, "https://www.googleapis.com/calendar/v3", AuthContext::default());
        McpHandler::new(catalog, dispatcher)
    }

    async fn call(handler: &McpHandler, method: &str, params: Value) -> JsonRpcResponse {
        handler
            .handle(JsonRpcRequest::new(1, method, params), CancellationToken::new())
            .await
            .unwrap()
    }

    #[tokio::test]
    async fn test_initialize() {
        let h = handler(Arc::new(MockTransport::new()));
        let resp = call(&h, "initialize", json!({"protocolVersion": "2024-11-05"})).await;
        let result = resp.result.unwrap();
        assert_eq!(result["protocolVersion"], "2024-11-05");
        assert!(result["capabilities"]["tools"].is_object());
    }

    #[tokio::test]
    async fn test_ping() {
        let h = handler(Arc::new(MockTransport::new()));
        let resp = call(&h, "ping", Value::Null).await;
        assert_eq!(resp.result, Some(json!({})));
    }

    #[tokio::test]
    async fn test_tools_list() {
        let h = handler(Arc::new(MockTransport::new()));
        let resp = call(&h, "tools/list", json!({})).await;
        let tools = resp.result.unwrap()["tools"].as_array().unwrap().clone();
        assert_eq!(tools.len(), 37);
        assert_eq!(tools[0]["name"], "post_calendars");
        assert!(tools[0]["inputSchema"]["properties"]["summary"].is_object());
    }

    #[tokio::test]
    async fn test_notification_no_response() {
        let h = handler(Arc::new(MockTransport::new()));
        let resp = h
            .handle(
                JsonRpcRequest::notification("notifications/initialized", Value::Null),
                CancellationToken::new(),
            )
            .await;
        assert!(resp.is_none());
    }

    #[tokio::test]
    async fn test_unknown_method() {
        let h = handler(Arc::new(MockTransport::new()));
        let resp = call(&h, "resources/list", json!({})).await;
        assert_eq!(resp.error.unwrap().code, ErrorCode::METHOD_NOT_FOUND);
    }

    #[tokio::test]
    async fn test_unknown_tool() {
        let mock = Arc::new(MockTransport::new());
        let h = handler(mock.clone());
        let resp = call(&h, "tools/call", json!({"name": "get_nothing", "arguments": {}})).await;
        let error = resp.error.unwrap();
        assert_eq!(error.code, ErrorCode::INVALID_PARAMS);
        assert_eq!(error.message, "Unknown tool: get_nothing");
        assert_eq!(mock.request_count(), 0);
    }

    #[tokio::test]
    async fn test_tools_call_missing_name() {
        let h = handler(Arc::new(MockTransport::new()));
        let resp = call(&h, "tools/call", json!({"arguments": {}})).await;
        assert_eq!(resp.error.unwrap().code, ErrorCode::INVALID_PARAMS);
    }

    #[tokio::test]
    async fn test_tools_call_success() {
        let mock = Arc::new(MockTransport::new().with_response(200, r#"{"id":"primary","summary":"Me"}"#));
        let h = handler(mock.clone());
        let resp = call(&h, "tools/call", json!({"name": "get_calendars_calendarId", "arguments": {"calendarId": "primary"}})).await;

        let result = resp.result.unwrap();
        assert_eq!(result["isError"], false);
        assert_eq!(result["content"][0]["type"], "text");
        assert!(result["content"][0]["text"].as_str().unwrap().contains("\"summary\": \"Me\""));
        assert_eq!(mock.request_count(), 1);
    }

    #[tokio::test]
    async fn test_tools_call_validation_error_is_tool_error() {
        let mock = Arc::new(MockTransport::new());
        let h = handler(mock.clone());
        let resp = call(&h, "tools/call", json!({"name": "get_calendars_calendarId"})).await;

        let result = resp.result.unwrap();
        assert_eq!(result["isError"], true);
        assert_eq!(result["content"][0]["text"], "Missing required path parameter: calendarId");
        assert_eq!(mock.request_count(), 0);
    }
}
