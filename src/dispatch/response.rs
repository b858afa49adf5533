//! Response decoding
//!
//! Error statuses become `ApiError` with the body verbatim. Success bodies
//! are decoded into the tool's response resource and pretty-printed; a body
//! that does not decode is passed through as-is.

use crate::error::DispatchError;
use crate::tools::ToolDescriptor;

use super::transport::RawResponse;

pub fn decode_response(tool: &ToolDescriptor, response: RawResponse) -> Result<String, DispatchError> {
    if response.is_error() {
        return Err(DispatchError::ApiError {
            status: response.status,
            body: response.text(),
        });
    }

    let Some(resource) = tool.response else {
        return Ok(response.text());
    };

    match resource.reformat(&response.body) {
        Ok(pretty) => Ok(pretty),
        Err(e) => {
            tracing::debug!(tool = %tool.name, resource = %resource, error = %e, "Response did not decode, returning raw body");
            Ok(response.text())
        }
    }
}
