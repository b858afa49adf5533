//! MCP server over a byte stream (stdin/stdout in production)
//!
//! Requests are read one frame at a time. `tools/call` runs on its own task
//! so a slow upstream request does not block `ping` or further calls; every
//! other method is answered inline. All responses go through a single writer
//! task, so frames never interleave on the output.

use std::collections::HashMap;
use std::sync::Arc;

use futures::{SinkExt, StreamExt};
use tokio::io::{AsyncRead, AsyncWrite};
use tokio::sync::{Mutex, Semaphore, mpsc};
use tokio::task::JoinSet;
use tokio_util::codec::{FramedRead, FramedWrite};
use tokio_util::sync::CancellationToken;

use crate::error::{CalendarError, Result};

use super::codec::{Incoming, McpCodec};
use super::handler::McpHandler;
use super::messages::{JsonRpcError, JsonRpcRequest, JsonRpcResponse};
use super::protocol::{CancelledParams, methods};

type InFlight = Arc<Mutex<HashMap<String, CancellationToken>>>;

/// Configuration for the MCP server
#[derive(Debug, Clone)]
pub struct McpServerConfig {
    /// Maximum number of tool calls executing at once
    pub max_concurrent_calls: usize,
    /// Maximum size of one input line
    pub max_frame_length: usize,
}

impl Default for McpServerConfig {
    fn default() -> Self {
        Self {
            max_concurrent_calls: 8,
            max_frame_length: McpCodec::new().max_length(),
        }
    }
}

impl McpServerConfig {
    pub fn with_max_concurrent_calls(mut self, max: usize) -> Self {
        self.max_concurrent_calls = max;
        self
    }

    pub fn with_max_frame_length(mut self, max: usize) -> Self {
        self.max_frame_length = max;
        self
    }
}

#[derive(Debug)]
pub struct McpServer {
    handler: Arc<McpHandler>,
    config: McpServerConfig,
}

impl McpServer {
    pub fn new(handler: McpHandler, config: McpServerConfig) -> Self {
        Self {
            handler: Arc::new(handler),
            config,
        }
    }

    pub fn handler(&self) -> &McpHandler {
        &self.handler
    }

    /// Serve until `reader` reaches EOF. In-flight calls are allowed to
    /// finish and their responses are flushed before returning.
    pub async fn run<R, W>(&self, reader: R, writer: W) -> Result<()>
    where
        R: AsyncRead + Unpin,
        W: AsyncWrite + Unpin + Send + 'static,
    {
        let codec = McpCodec::with_max_length(self.config.max_frame_length);
        let mut frames = FramedRead::new(reader, codec.clone());

        let (tx, rx) = mpsc::unbounded_channel::<JsonRpcResponse>();
        let writer_task = tokio::spawn(write_responses(FramedWrite::new(writer, codec), rx));

        let in_flight: InFlight = Arc::new(Mutex::new(HashMap::new()));
        let semaphore = Arc::new(Semaphore::new(self.config.max_concurrent_calls.max(1)));
        let mut calls = JoinSet::new();
        let mut read_error = None;

        tracing::info!("MCP server listening");

        while let Some(frame) = frames.next().await {
            let incoming = match frame {
                Ok(incoming) => incoming,
                Err(e) => {
                    tracing::error!(error = %e, "Failed to read frame");
                    read_error = Some(e);
                    break;
                }
            };

            while calls.try_join_next().is_some() {}

            match incoming {
                Incoming::Invalid { id, error } => {
                    tracing::debug!(code = error.code, "Rejecting invalid message");
                    send(&tx, JsonRpcResponse::error(id, error));
                }
                Incoming::Request(request) if request.is_notification() => {
                    self.handle_notification(&request, &in_flight).await;
                }
                Incoming::Request(request) if request.method == methods::TOOLS_CALL => {
                    let Some(id) = request.id.clone() else { continue };
                    let key = id.to_string();
                    let token = CancellationToken::new();
                    {
                        let mut in_flight = in_flight.lock().await;
                        if in_flight.contains_key(&key) {
                            tracing::warn!(request_id = %key, "Rejecting tools/call with an id already in flight");
                            let error = JsonRpcError::invalid_request(format!("Request id {} is already in flight", key));
                            send(&tx, JsonRpcResponse::error(id, error));
                            continue;
                        }
                        in_flight.insert(key.clone(), token.clone());
                    }

                    let handler = Arc::clone(&self.handler);
                    let semaphore = Arc::clone(&semaphore);
                    let in_flight = Arc::clone(&in_flight);
                    let tx = tx.clone();

                    calls.spawn(async move {
                        // A call cancelled while queued skips the upstream request.
                        let _permit = tokio::select! {
                            permit = semaphore.acquire_owned() => permit.ok(),
                            _ = token.cancelled() => None,
                        };
                        let response = handler.handle(request, token).await;
                        in_flight.lock().await.remove(&key);
                        if let Some(response) = response {
                            send(&tx, response);
                        }
                    });
                }
                Incoming::Request(request) => {
                    if let Some(response) = self.handler.handle(request, CancellationToken::new()).await {
                        send(&tx, response);
                    }
                }
            }
        }

        if let Some(e) = read_error {
            for token in in_flight.lock().await.values() {
                token.cancel();
            }
            calls.shutdown().await;
            drop(tx);
            let _ = writer_task.await;
            return Err(CalendarError::Io(e));
        }

        tracing::info!(pending = calls.len(), "Input closed, draining in-flight calls");
        while calls.join_next().await.is_some() {}
        drop(tx);

        match writer_task.await {
            Ok(result) => result.map_err(CalendarError::Io),
            Err(e) => Err(CalendarError::Protocol(format!("writer task failed: {}", e))),
        }
    }

    async fn handle_notification(&self, request: &JsonRpcRequest, in_flight: &InFlight) {
        match request.method.as_str() {
            methods::CANCELLED => {
                let params: CancelledParams = match serde_json::from_value(request.params.clone()) {
                    Ok(params) => params,
                    Err(e) => {
                        tracing::debug!(error = %e, "Ignoring malformed cancellation");
                        return;
                    }
                };
                let key = params.request_id.to_string();
                match in_flight.lock().await.get(&key) {
                    Some(token) => {
                        tracing::info!(request_id = %key, reason = ?params.reason, "Cancelling tool call");
                        token.cancel();
                    }
                    None => tracing::debug!(request_id = %key, "Cancellation for unknown request"),
                }
            }
            methods::INITIALIZED => tracing::info!("Client initialized"),
            other => tracing::debug!(method = other, "Ignoring notification"),
        }
    }
}

fn send(tx: &mpsc::UnboundedSender<JsonRpcResponse>, response: JsonRpcResponse) {
    if tx.send(response).is_err() {
        tracing::warn!("Output closed, dropping response");
    }
}

async fn write_responses<W>(
    mut sink: FramedWrite<W, McpCodec>,
    mut rx: mpsc::UnboundedReceiver<JsonRpcResponse>,
) -> std::io::Result<()>
where
    W: AsyncWrite + Unpin,
{
    while let Some(response) = rx.recv().await {
        let id = response.id.clone();
        match sink.send(response).await {
            Ok(()) => {}
            // The frame could not be encoded; nothing was written for it.
            Err(e) if e.kind() == std::io::ErrorKind::InvalidData => {
                tracing::warn!(id = %id, error = %e, "Response could not be encoded, sending error instead");
                let error = JsonRpcError::internal_error(format!("Response could not be sent: {}", e));
                match sink.send(JsonRpcResponse::error(id, error)).await {
                    Ok(()) => {}
                    Err(e) if e.kind() == std::io::ErrorKind::InvalidData => {
                        tracing::error!(error = %e, "Error response could not be encoded either, dropping it");
                    }
                    Err(e) => return Err(e),
                }
            }
            Err(e) => return Err(e),
        }
    }
    sink.flush().await
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dispatch::{AuthContext, Dispatcher, MockTransport};
    use crate::tools::ToolCatalog;
    use serde_json::{Value, json};
    use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader};

    fn server(mock: Arc<MockTransport>) -> McpServer {
        let catalog = Arc::new(ToolCatalog::builtin().unwrap());
        let dispatcher = Dispatcher::new(mock, "https://www.googleapis.com/calendar/v3", AuthContext::default());
        McpServer::new(McpHandler::new(catalog, dispatcher), McpServerConfig::default())
    }

    async fn run_script(server: McpServer, input: &str) -> Vec<Value> {
        let (mut client, server_io) = tokio::io::duplex(64 * 1024);
        let (read_half, write_half) = tokio::io::split(server_io);

        let task = tokio::spawn(async move { server.run(read_half, write_half).await });

        client.write_all(input.as_bytes()).await.unwrap();
        client.shutdown().await.unwrap();

        let mut lines = BufReader::new(client).lines();
        let mut out = Vec::new();
        while let Some(line) = lines.next_line().await.unwrap() {
            out.push(serde_json::from_str(&line).unwrap());
        }
        task.await.unwrap().unwrap();
        out
    }

    #[test]
    fn test_config_defaults() {
        let config = McpServerConfig::default();
        assert_eq!(config.max_concurrent_calls, 8);
        assert_eq!(config.max_frame_length, 16 * 1024 * 1024);

        let config = config.with_max_concurrent_calls(2).with_max_frame_length(1024);
        assert_eq!(config.max_concurrent_calls, 2);
        assert_eq!(config.max_frame_length, 1024);
    }

    #[tokio::test]
    async fn test_ping_and_notification() {
        let out = run_script(
            server(Arc::new(MockTransport::new())),
            "{\"jsonrpc\":\"2.0\",\"method\":\"notifications/initialized\"}\n{\"jsonrpc\":\"2.0\",\"id\":1,\"method\":\"ping\"}\n",
        )
        .await;
        assert_eq!(out, vec![json!({"jsonrpc": "2.0", "id": 1, "result": {}})]);
    }

    #[tokio::test]
    async fn test_parse_error_keeps_serving() {
        let out = run_script(
            server(Arc::new(MockTransport::new())),
            "{oops\n{\"jsonrpc\":\"2.0\",\"id\":2,\"method\":\"ping\"}\n",
        )
        .await;
        assert_eq!(out.len(), 2);
        assert_eq!(out[0]["error"]["code"], -32700);
        assert_eq!(out[0]["id"], Value::Null);
        assert_eq!(out[1]["id"], 2);
    }

    #[tokio::test]
    async fn test_tool_call_drained_on_eof() {
        let mock = Arc::new(MockTransport::new().with_response(200, r#"{"kind":"calendar#colors"}"#));
        let out = run_script(
            server(mock.clone()),
            "{\"jsonrpc\":\"2.0\",\"id\":\"c1\",\"method\":\"tools/call\",\"params\":{\"name\":\"get_colors\"}}\n",
        )
        .await;
        assert_eq!(out.len(), 1);
        assert_eq!(out[0]["id"], "c1");
        assert_eq!(out[0]["result"]["isError"], false);
        assert_eq!(mock.request_count(), 1);
    }

    #[tokio::test]
    async fn test_oversized_response_replaced_with_error() {
        let mock = Arc::new(MockTransport::new());
        let server = McpServer::new(
            server(mock).handler().clone(),
            McpServerConfig::default().with_max_frame_length(200),
        );
        let out = run_script(
            server,
            "{\"jsonrpc\":\"2.0\",\"id\":1,\"method\":\"tools/list\"}\n{\"jsonrpc\":\"2.0\",\"id\":2,\"method\":\"ping\"}\n",
        )
        .await;

        assert_eq!(out.len(), 2);
        assert_eq!(out[0]["id"], 1);
        assert_eq!(out[0]["error"]["code"], -32603);
        assert_eq!(out[1], json!({"jsonrpc": "2.0", "id": 2, "result": {}}));
    }

    #[tokio::test]
    async fn test_duplicate_in_flight_id_rejected() {
        let mock = Arc::new(MockTransport::new().with_delay(std::time::Duration::from_millis(100)));
        let out = run_script(
            server(mock.clone()),
            "{\"jsonrpc\":\"2.0\",\"id\":5,\"method\":\"tools/call\",\"params\":{\"name\":\"get_colors\"}}\n\
             {\"jsonrpc\":\"2.0\",\"id\":5,\"method\":\"tools/call\",\"params\":{\"name\":\"get_colors\"}}\n",
        )
        .await;

        assert_eq!(out.len(), 2);
        assert_eq!(out[0]["id"], 5);
        assert_eq!(out[0]["error"]["code"], -32600);
        assert_eq!(out[1]["id"], 5);
        assert_eq!(out[1]["result"]["isError"], false);
        assert_eq!(mock.request_count(), 1);
    }

    #[tokio::test]
    async fn test_oversized_frame_is_fatal() {
        let mock = Arc::new(MockTransport::new());
        let server = McpServer::new(
            server(mock).handler().clone(),
            McpServerConfig::default().with_max_frame_length(16),
        );

        let (mut client, server_io) = tokio::io::duplex(1024);
        let (read_half, write_half) = tokio::io::split(server_io);
        client
            .write_all(b"{\"jsonrpc\":\"2.0\",\"id\":1,\"method\":\"ping\"}\n")
            .await
            .unwrap();
        client.shutdown().await.unwrap();

        let result = server.run(read_half, write_half).await;
        assert!(matches!(result, Err(CalendarError::Io(_))));
    }
}
