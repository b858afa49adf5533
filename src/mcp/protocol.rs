//! MCP method payloads: initialize, tools/list, tools/call, cancellation

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::dispatch::InvocationResult;
use crate::tools::ToolDescriptor;

pub const PROTOCOL_VERSION: &str = "2024-11-05";
pub const SERVER_NAME: &str = env!("CARGO_PKG_NAME");

pub mod methods {
    pub const INITIALIZE: &str = "initialize";
    pub const PING: &str = "ping";
    pub const TOOLS_LIST: &str = "tools/list";
    pub const TOOLS_CALL: &str = "tools/call";
    pub const INITIALIZED: &str = "notifications/initialized";
    pub const CANCELLED: &str = "notifications/cancelled";
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct InitializeResult {
    pub protocol_version: String,
    pub capabilities: ServerCapabilities,
    pub server_info: ServerInfo,
}

impl InitializeResult {
    pub fn current() -> Self {
        Self {
            protocol_version: PROTOCOL_VERSION.to_string(),
            capabilities: ServerCapabilities {
                tools: ToolCapability { list_changed: false },
            },
            server_info: ServerInfo {
                name: SERVER_NAME.to_string(),
                version: env!("CARGO_PKG_VERSION").to_string(),
            },
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerCapabilities {
    pub tools: ToolCapability,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ToolCapability {
    pub list_changed: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerInfo {
    pub name: String,
    pub version: String,
}

/// A single tool definition in a `tools/list` response.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct McpToolDefinition {
    pub name: String,
    pub description: String,
    #[serde(rename = "inputSchema")]
    pub input_schema: Value,
}

impl From<&ToolDescriptor> for McpToolDefinition {
    fn from(tool: &ToolDescriptor) -> Self {
        Self {
            name: tool.name.clone(),
            description: tool.description.clone(),
            input_schema: tool.input_schema(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ToolsListResult {
    pub tools: Vec<McpToolDefinition>,
}

/// Params of `tools/call`. Missing `arguments` means an empty object.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ToolsCallParams {
    pub name: String,
    #[serde(default)]
    pub arguments: Option<Value>,
}

impl ToolsCallParams {
    pub fn arguments(&self) -> Value {
        match &self.arguments {
            Some(Value::Null) | None => Value::Object(Default::default()),
            Some(args) => args.clone(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum ToolContent {
    Text { text: String },
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ToolsCallResult {
    pub content: Vec<ToolContent>,
    #[serde(default, rename = "isError")]
    pub is_error: bool,
}

impl From<InvocationResult> for ToolsCallResult {
    fn from(result: InvocationResult) -> Self {
        Self {
            content: vec![ToolContent::Text { text: result.content }],
            is_error: result.is_error,
        }
    }
}

/// Params of `notifications/cancelled`.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CancelledParams {
    pub request_id: Value,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reason: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_initialize_result_shape() {
        let value = serde_json::to_value(InitializeResult::current()).unwrap();
        assert_eq!(value["protocolVersion"], "2024-11-05");
        assert_eq!(value["capabilities"]["tools"]["listChanged"], false);
        assert_eq!(value["serverInfo"]["name"], "calendar-mcp");
        assert!(value["serverInfo"]["version"].is_string());
    }

    #[test]
    fn test_tool_definition_from_descriptor() {
        let catalog = crate::tools::ToolCatalog::builtin().unwrap();
        let tool = catalog.get("post_calendars_calendarId_events_eventId_move").unwrap();
        let value = serde_json::to_value(McpToolDefinition::from(tool)).unwrap();

        assert_eq!(value["name"], "post_calendars_calendarId_events_eventId_move");
        assert_eq!(value["description"], tool.description.as_str());
        assert!(value["inputSchema"]["properties"]["destination"].is_object());
        assert_eq!(value["inputSchema"]["required"], json!(["calendarId", "eventId", "destination"]));
    }

    #[test]
    fn test_tools_call_params_missing_arguments() {
        let params: ToolsCallParams = serde_json::from_value(json!({"name": "get_colors"})).unwrap();
        assert_eq!(params.arguments(), json!({}));

        let params: ToolsCallParams =
            serde_json::from_value(json!({"name": "get_colors", "arguments": null})).unwrap();
        assert_eq!(params.arguments(), json!({}));
    }

    #[test]
    fn test_tools_call_params_keeps_non_object() {
        let params: ToolsCallParams =
            serde_json::from_value(json!({"name": "get_colors", "arguments": [1]})).unwrap();
        assert_eq!(params.arguments(), json!([1]));
    }

    #[test]
    fn test_tools_call_result_from_invocation() {
        let result: ToolsCallResult = InvocationResult::error("API error: boom").into();
        let value = serde_json::to_value(&result).unwrap();
        assert_eq!(
            value,
            json!({"content": [{"type": "text", "text": "API error: boom"}], "isError": true})
        );
    }

    #[test]
    fn test_cancelled_params() {
        let params: CancelledParams =
            serde_json::from_value(json!({"requestId": 4, "reason": "user aborted"})).unwrap();
        assert_eq!(params.request_id, json!(4));
        assert_eq!(params.reason.as_deref(), Some("user aborted"));
    }
}
