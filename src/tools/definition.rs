//! Tool descriptors
//!
//! A descriptor is the static definition of one API operation: where it
//! lives, which arguments go in the path and query string, and which
//! resource travels as body and response.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value, json};

use crate::models::Resource;

/// HTTP method of an API operation
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum HttpMethod {
    Get,
    Post,
    Put,
    Patch,
    Delete,
}

impl HttpMethod {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Get => "GET",
            Self::Post => "POST",
            Self::Put => "PUT",
            Self::Patch => "PATCH",
            Self::Delete => "DELETE",
        }
    }

    pub fn to_reqwest(&self) -> reqwest::Method {
        match self {
            Self::Get => reqwest::Method::GET,
            Self::Post => reqwest::Method::POST,
            Self::Put => reqwest::Method::PUT,
            Self::Patch => reqwest::Method::PATCH,
            Self::Delete => reqwest::Method::DELETE,
        }
    }
}

impl std::fmt::Display for HttpMethod {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// JSON type advertised for a parameter or body field
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ParamType {
    String,
    Boolean,
    Number,
    Array,
    Object,
}

impl ParamType {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::String => "string",
            Self::Boolean => "boolean",
            Self::Number => "number",
            Self::Array => "array",
            Self::Object => "object",
        }
    }
}

impl Default for ParamType {
    fn default() -> Self {
        Self::String
    }
}

/// A path placeholder; always required and always a string
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PathParam {
    pub name: String,
    #[serde(default)]
    pub description: String,
}

/// An optional (or, rarely, required) query-string parameter
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct QueryParam {
    pub name: String,
    #[serde(rename = "type", default)]
    pub param_type: ParamType,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub required: bool,
}

impl QueryParam {
    pub fn new(name: impl Into<String>, param_type: ParamType) -> Self {
        Self {
            name: name.into(),
            param_type,
            description: String::new(),
            required: false,
        }
    }

    pub fn required(mut self) -> Self {
        self.required = true;
        self
    }
}

/// One writable field of a body resource, as advertised in input schemas
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BodyField {
    pub name: String,
    #[serde(rename = "type", default)]
    pub field_type: ParamType,
    #[serde(default)]
    pub description: String,
}

/// Static definition of one API operation
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ToolDescriptor {
    /// Tool name (e.g., "get_calendars_calendarId_events_eventId")
    pub name: String,
    /// Human-readable description
    pub description: String,
    pub method: HttpMethod,
    /// Path template relative to the base URL, e.g. `/calendars/{calendarId}`
    pub path: String,
    #[serde(default)]
    pub path_params: Vec<PathParam>,
    /// Query parameters in the order they are appended
    #[serde(default)]
    pub query_params: Vec<QueryParam>,
    #[serde(default)]
    pub body: Option<Resource>,
    #[serde(default)]
    pub response: Option<Resource>,
    /// Schema fields of the body resource, filled in by the catalog
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub body_fields: Vec<BodyField>,
}

impl ToolDescriptor {
    /// Create a new descriptor with no parameters
    pub fn new(
        name: impl Into<String>,
        description: impl Into<String>,
        method: HttpMethod,
        path: impl Into<String>,
    ) -> Self {
        Self {
            name: name.into(),
            description: description.into(),
            method,
            path: path.into(),
            path_params: Vec::new(),
            query_params: Vec::new(),
            body: None,
            response: None,
            body_fields: Vec::new(),
        }
    }

    pub fn with_path_param(mut self, name: impl Into<String>) -> Self {
        self.path_params.push(PathParam {
            name: name.into(),
            description: String::new(),
        });
        self
    }

    pub fn with_query_param(mut self, param: QueryParam) -> Self {
        self.query_params.push(param);
        self
    }

    pub fn with_body(mut self, resource: Resource) -> Self {
        self.body = Some(resource);
        self
    }

    pub fn with_response(mut self, resource: Resource) -> Self {
        self.response = Some(resource);
        self
    }

    /// Placeholder names in the path template, in order of appearance
    pub fn placeholders(&self) -> Vec<&str> {
        let mut names = Vec::new();
        let mut rest = self.path.as_str();
        while let Some(open) = rest.find('{') {
            let after = &rest[open + 1..];
            match after.find('}') {
                Some(close) => {
                    names.push(&after[..close]);
                    rest = &after[close + 1..];
                }
                None => break,
            }
        }
        names
    }

    /// JSON schema for the tool's input arguments.
    ///
    /// Path parameters come first, then query parameters, then body fields.
    /// A name already claimed by an earlier group is not repeated.
    pub fn input_schema(&self) -> Value {
        let mut properties = Map::new();
        let mut required = Vec::new();

        for param in &self.path_params {
            properties.insert(param.name.clone(), property(ParamType::String, &param.description));
            required.push(Value::String(param.name.clone()));
        }

        for param in &self.query_params {
            if properties.contains_key(&param.name) {
                continue;
            }
            properties.insert(param.name.clone(), property(param.param_type, &param.description));
            if param.required {
                required.push(Value::String(param.name.clone()));
            }
        }

        for field in &self.body_fields {
            if !properties.contains_key(&field.name) {
                properties.insert(field.name.clone(), property(field.field_type, &field.description));
            }
        }

        json!({
            "type": "object",
            "properties": properties,
            "required": required
        })
    }
}

fn property(param_type: ParamType, description: &str) -> Value {
    let mut prop = Map::new();
    prop.insert("type".to_string(), Value::String(param_type.as_str().to_string()));
    if param_type == ParamType::Array {
        prop.insert("items".to_string(), json!({}));
    }
    if !description.is_empty() {
        prop.insert("description".to_string(), Value::String(description.to_string()));
    }
    Value::Object(prop)
}
