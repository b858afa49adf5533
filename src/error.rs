//! Error types for calendar-mcp
//!
//! Centralized error handling using thiserror. `CalendarError` covers the
//! crate plumbing (catalog, protocol, I/O); `DispatchError` is the taxonomy
//! of a single tool invocation and never escapes the dispatcher.

use thiserror::Error;

/// All error types that can occur outside of a tool invocation
#[derive(Debug, Error)]
pub enum CalendarError {
    /// Tool catalog failed to load or validate
    #[error("Catalog error: {0}")]
    Catalog(String),

    /// Tool name not present in the catalog
    #[error("Unknown tool: {0}")]
    UnknownTool(String),

    /// MCP framing or protocol error
    #[error("Protocol error: {0}")]
    Protocol(String),

    /// HTTP client could not be constructed
    #[error("HTTP client error: {0}")]
    HttpClient(String),

    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON serialization/deserialization error
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// YAML parsing error
    #[error("YAML error: {0}")]
    Yaml(#[from] serde_yaml::Error),
}

/// Result type alias for calendar-mcp operations
pub type Result<T> = std::result::Result<T, CalendarError>;

/// Failure of one tool invocation.
///
/// Response bodies that do not match the expected schema are not an error:
/// they degrade to a raw-text success result.
#[derive(Debug, Error)]
pub enum DispatchError {
    #[error("Invalid arguments object")]
    InvalidArguments,

    /// A path parameter is absent
    #[error("Missing required path parameter: {0}")]
    MissingParameter(String),

    /// A query parameter flagged `required` is absent
    #[error("Missing required parameter: {0}")]
    MissingQueryParameter(String),

    #[error("Invalid path parameter: {0}")]
    InvalidParameterType(String),

    #[error("Failed to create request: {0}")]
    RequestBuildFailed(String),

    #[error("Request failed: {0}")]
    RequestFailed(String),

    #[error("Failed to read response body: {0}")]
    ResponseReadFailed(String),

    #[error("API error: {body}")]
    ApiError { status: u16, body: String },
}

impl DispatchError {
    /// True when the failure happened before anything was sent
    pub fn is_validation(&self) -> bool {
        matches!(
            self,
            DispatchError::InvalidArguments
                | DispatchError::MissingParameter(_)
                | DispatchError::MissingQueryParameter(_)
                | DispatchError::InvalidParameterType(_)
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_catalog_error() {
        let err = CalendarError::Catalog("duplicate tool name".to_string());
        assert_eq!(err.to_string(), "Catalog error: duplicate tool name");
    }

    #[test]
    fn test_unknown_tool_error() {
        let err = CalendarError::UnknownTool("get_nothing".to_string());
        assert_eq!(err.to_string(), "Unknown tool: get_nothing");
    }

    #[test]
    fn test_io_error_conversion() {
        let io_err = std::io::Error::new(std::io::ErrorKind::NotFound, "file not found");
        let err: CalendarError = io_err.into();
        assert!(matches!(err, CalendarError::Io(_)));
        assert!(err.to_string().contains("file not found"));
    }

    #[test]
    fn test_json_error_conversion() {
        let json_err = serde_json::from_str::<serde_json::Value>("invalid").unwrap_err();
        let err: CalendarError = json_err.into();
        assert!(matches!(err, CalendarError::Json(_)));
    }

    #[test]
    fn test_yaml_error_conversion() {
        let yaml_err = serde_yaml::from_str::<Vec<String>>("a: [").unwrap_err();
        let err: CalendarError = yaml_err.into();
        assert!(matches!(err, CalendarError::Yaml(_)));
    }

    #[test]
    fn test_dispatch_error_messages() {
        assert_eq!(DispatchError::InvalidArguments.to_string(), "Invalid arguments object");
        assert_eq!(
            DispatchError::MissingParameter("calendarId".into()).to_string(),
            "Missing required path parameter: calendarId"
        );
        assert_eq!(
            DispatchError::MissingQueryParameter("text".into()).to_string(),
            "Missing required parameter: text"
        );
        assert_eq!(
            DispatchError::InvalidParameterType("eventId".into()).to_string(),
            "Invalid path parameter: eventId"
        );
        assert_eq!(
            DispatchError::ApiError {
                status: 404,
                body: r#"{"error":"not found"}"#.into()
            }
            .to_string(),
            r#"API error: {"error":"not found"}"#
        );
    }

    #[test]
    fn test_dispatch_error_is_validation() {
        assert!(DispatchError::InvalidArguments.is_validation());
        assert!(DispatchError::MissingParameter("x".into()).is_validation());
        assert!(DispatchError::MissingQueryParameter("x".into()).is_validation());
        assert!(DispatchError::InvalidParameterType("x".into()).is_validation());
        assert!(!DispatchError::RequestFailed("timeout".into()).is_validation());
        assert!(!DispatchError::ApiError { status: 500, body: String::new() }.is_validation());
    }

    #[test]
    fn test_result_type_alias() {
        fn returns_ok() -> Result<i32> {
            Ok(42)
        }

        fn returns_err() -> Result<i32> {
            Err(CalendarError::Protocol("test".to_string()))
        }

        assert!(returns_ok().is_ok());
        assert!(returns_err().is_err());
    }
}
