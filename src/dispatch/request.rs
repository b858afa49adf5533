//! Request assembly: path substitution, query string, auth, body

use reqwest::Url;
use reqwest::header::{ACCEPT, CONTENT_TYPE, HeaderMap, HeaderValue};

use crate::error::DispatchError;
use crate::tools::ToolDescriptor;

use super::args::ArgumentBag;
use super::auth::AuthContext;

const APPLICATION_JSON: &str = "application/json";

/// A fully assembled HTTP request, ready for a transport
#[derive(Debug, Clone)]
pub struct PreparedRequest {
    pub method: reqwest::Method,
    pub url: Url,
    pub headers: HeaderMap,
    pub body: Option<Vec<u8>>,
}

impl PreparedRequest {
    /// Body as UTF-8 text, for logs and assertions
    pub fn body_text(&self) -> Option<String> {
        self.body
            .as_ref()
            .map(|b| String::from_utf8_lossy(b).into_owned())
    }
}

/// Build the request for `tool` from the caller's arguments.
///
/// Validation happens before anything else, so a request that fails here
/// was never sent.
pub fn build_request(
    base_url: &str,
    tool: &ToolDescriptor,
    args: &ArgumentBag<'_>,
    auth: &AuthContext,
) -> Result<PreparedRequest, DispatchError> {
    let mut path_values = Vec::with_capacity(tool.path_params.len());
    for param in &tool.path_params {
        let value = args.require_str(&param.name)?;
        // `Url` drops dot segments, which would retarget the request.
        if value == "." || value == ".." {
            return Err(DispatchError::InvalidParameterType(param.name.clone()));
        }
        path_values.push((param.name.as_str(), value));
    }

    let mut query: Vec<(&str, String)> = Vec::new();
    for param in &tool.query_params {
        let values = args.query_values(&param.name);
        if values.is_empty() && param.required {
            return Err(DispatchError::MissingQueryParameter(param.name.clone()));
        }
        query.extend(values.into_iter().map(|v| (param.name.as_str(), v)));
    }
    for (name, value) in auth.query_pairs() {
        query.push((name, value.to_string()));
    }

    let body = match tool.body {
        Some(resource) => Some(
            resource
                .shape_body(args.as_map())
                .map_err(|e| DispatchError::RequestBuildFailed(format!("invalid {} body: {}", resource, e)))?,
        ),
        None => None,
    };

    let mut url = Url::parse(base_url)
        .map_err(|e| DispatchError::RequestBuildFailed(format!("invalid base URL '{}': {}", base_url, e)))?;
    {
        let mut segments = url
            .path_segments_mut()
            .map_err(|_| DispatchError::RequestBuildFailed(format!("base URL '{}' cannot take a path", base_url)))?;
        segments.pop_if_empty();
        for segment in tool.path.trim_start_matches('/').split('/') {
            let value = segment
                .strip_prefix('{')
                .and_then(|s| s.strip_suffix('}'))
                .and_then(|name| path_values.iter().find(|(n, _)| *n == name))
                .map(|(_, v)| *v)
                .unwrap_or(segment);
            segments.push(value);
        }
    }
    if !query.is_empty() {
        url.query_pairs_mut()
            .extend_pairs(query.iter().map(|(k, v)| (*k, v.as_str())));
    }

    let mut headers = HeaderMap::new();
    headers.insert(ACCEPT, HeaderValue::from_static(APPLICATION_JSON));
    if body.is_some() {
        headers.insert(CONTENT_TYPE, HeaderValue::from_static(APPLICATION_JSON));
    }

    Ok(PreparedRequest {
        method: tool.method.to_reqwest(),
        url,
        headers,
        body,
    })
}
