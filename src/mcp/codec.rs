//! Newline-delimited JSON-RPC codec.
//!
//! A malformed line does not poison the stream: it decodes to
//! `Incoming::Invalid` so the server can answer it and keep reading.
//! Only an oversized frame is a hard error.

use bytes::{Buf, BufMut, BytesMut};
use serde_json::Value;
use tokio_util::codec::{Decoder, Encoder};

use super::messages::{JsonRpcError, JsonRpcRequest, JsonRpcResponse};

const DEFAULT_MAX_LENGTH: usize = 16 * 1024 * 1024;

/// One decoded line from the host.
#[derive(Debug, Clone)]
pub enum Incoming {
    Request(JsonRpcRequest),
    /// A line that is not a usable request; `id` is null unless it could be read.
    Invalid { id: Value, error: JsonRpcError },
}

#[derive(Debug, Clone)]
pub struct McpCodec {
    max_length: usize,
}

impl McpCodec {
    /// Create a new codec with default max length (16 MB).
    pub fn new() -> Self {
        Self {
            max_length: DEFAULT_MAX_LENGTH,
        }
    }

    /// Create a new codec with custom max length.
    pub fn with_max_length(max_length: usize) -> Self {
        Self { max_length }
    }

    pub fn max_length(&self) -> usize {
        self.max_length
    }
}

impl Default for McpCodec {
    fn default() -> Self {
        Self::new()
    }
}

impl Decoder for McpCodec {
    type Item = Incoming;
    type Error = std::io::Error;

    fn decode(&mut self, src: &mut BytesMut) -> std::result::Result<Option<Self::Item>, Self::Error> {
        loop {
            let Some(pos) = src.iter().position(|&b| b == b'\n') else {
                if src.len() > self.max_length {
                    return Err(too_large(src.len(), self.max_length));
                }
                return Ok(None);
            };

            if pos > self.max_length {
                return Err(too_large(pos, self.max_length));
            }

            let line = src.split_to(pos);
            src.advance(1);

            let trimmed = line.trim_ascii();
            if trimmed.is_empty() {
                continue;
            }

            if let Some(incoming) = parse_line(trimmed) {
                return Ok(Some(incoming));
            }
        }
    }
}

impl Encoder<JsonRpcResponse> for McpCodec {
    type Error = std::io::Error;

    fn encode(&mut self, item: JsonRpcResponse, dst: &mut BytesMut) -> std::result::Result<(), Self::Error> {
        // Serialize to JSON (compact, no newlines)
        let json = serde_json::to_vec(&item)
            .map_err(|e| std::io::Error::new(std::io::ErrorKind::InvalidData, format!("JSON error: {}", e)))?;

        if json.len() > self.max_length {
            return Err(too_large(json.len(), self.max_length));
        }

        dst.reserve(json.len() + 1);
        dst.put_slice(&json);
        dst.put_u8(b'\n');

        Ok(())
    }
}

/// `None` for lines that need no answer (responses sent by the host).
fn parse_line(line: &[u8]) -> Option<Incoming> {
    let value: Value = match serde_json::from_slice(line) {
        Ok(value) => value,
        Err(e) => {
            return Some(Incoming::Invalid {
                id: Value::Null,
                error: JsonRpcError::parse_error(format!("Parse error: {}", e)),
            });
        }
    };

    let id = value.get("id").cloned().unwrap_or(Value::Null);
    if value.get("method").is_none() && (value.get("result").is_some() || value.get("error").is_some()) {
        return None;
    }

    match serde_json::from_value::<JsonRpcRequest>(value) {
        Ok(request) => Some(Incoming::Request(request)),
        Err(e) => Some(Incoming::Invalid {
            id,
            error: JsonRpcError::invalid_request(format!("Invalid request: {}", e)),
        }),
    }
}

fn too_large(len: usize, max: usize) -> std::io::Error {
    std::io::Error::new(
        std::io::ErrorKind::InvalidData,
        format!("Message too large: {} > {}", len, max),
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mcp::messages::ErrorCode;
    use serde_json::json;

    fn decode_all(input: &str) -> Vec<Incoming> {
        let mut codec = McpCodec::new();
        let mut buf = BytesMut::from(input);
        let mut out = Vec::new();
        while let Some(item) = codec.decode(&mut buf).unwrap() {
            out.push(item);
        }
        out
    }

    #[test]
    fn test_decode_request() {
        let items = decode_all("{\"jsonrpc\":\"2.0\",\"id\":1,\"method\":\"ping\"}\n");
        assert_eq!(items.len(), 1);
        match &items[0] {
            Incoming::Request(req) => assert_eq!(req.method, "ping"),
            other => panic!("unexpected {:?}", other),
        }
    }

    #[test]
    fn test_decode_partial_line() {
        let mut codec = McpCodec::new();
        let mut buf = BytesMut::from("{\"jsonrpc\":\"2.0\",\"id\":1,");
        assert!(codec.decode(&mut buf).unwrap().is_none());

        buf.extend_from_slice(b"\"method\":\"ping\"}\r\n");
        assert!(matches!(codec.decode(&mut buf).unwrap(), Some(Incoming::Request(_))));
        assert!(buf.is_empty());
    }

    #[test]
    fn test_decode_skips_blank_lines() {
        let items = decode_all("\n  \n{\"jsonrpc\":\"2.0\",\"method\":\"notifications/initialized\"}\n");
        assert_eq!(items.len(), 1);
    }

    #[test]
    fn test_decode_malformed_json() {
        let items = decode_all("{not json\n{\"jsonrpc\":\"2.0\",\"id\":2,\"method\":\"ping\"}\n");
        assert_eq!(items.len(), 2);
        match &items[0] {
            Incoming::Invalid { id, error } => {
                assert_eq!(*id, Value::Null);
                assert_eq!(error.code, ErrorCode::PARSE_ERROR);
            }
            other => panic!("unexpected {:?}", other),
        }
        assert!(matches!(items[1], Incoming::Request(_)));
    }

    #[test]
    fn test_decode_missing_method() {
        let items = decode_all("{\"jsonrpc\":\"2.0\",\"id\":5}\n");
        match &items[0] {
            Incoming::Invalid { id, error } => {
                assert_eq!(*id, json!(5));
                assert_eq!(error.code, ErrorCode::INVALID_REQUEST);
            }
            other => panic!("unexpected {:?}", other),
        }
    }

    #[test]
    fn test_decode_ignores_host_responses() {
        let items = decode_all("{\"jsonrpc\":\"2.0\",\"id\":9,\"result\":{}}\n");
        assert!(items.is_empty());
    }

    #[test]
    fn test_decode_too_large() {
        let mut codec = McpCodec::with_max_length(8);
        let mut buf = BytesMut::from("{\"jsonrpc\":\"2.0\"}\n");
        assert!(codec.decode(&mut buf).is_err());
    }

    #[test]
    fn test_encode_response() {
        let mut codec = McpCodec::new();
        let mut buf = BytesMut::new();
        codec
            .encode(JsonRpcResponse::success(json!(1), json!({"ok": true})), &mut buf)
            .unwrap();
        assert_eq!(&buf[..], b"{\"jsonrpc\":\"2.0\",\"id\":1,\"result\":{\"ok\":true}}\n");
    }
}
