//! End-to-end MCP sessions over an in-memory duplex stream

use std::sync::Arc;
use std::time::Duration;

use calendar_mcp::dispatch::{AuthContext, Dispatcher, MockTransport};
use calendar_mcp::mcp::{McpHandler, McpServer, McpServerConfig};
use calendar_mcp::tools::ToolCatalog;
use serde_json::{Value, json};
use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader, DuplexStream, Lines, WriteHalf};
use tokio::task::JoinHandle;

struct Session {
    input: WriteHalf<DuplexStream>,
    output: Lines<BufReader<tokio::io::ReadHalf<DuplexStream>>>,
    server: JoinHandle<calendar_mcp::Result<()>>,
}

impl Session {
    fn start(mock: Arc<MockTransport>, auth: AuthContext) -> Self {
        let catalog = Arc::new(ToolCatalog::builtin().unwrap());
        let dispatcher = Dispatcher::new(mock, "https://www.googleapis.com/calendar/v3", auth);
        let server = McpServer::new(McpHandler::new(catalog, dispatcher), McpServerConfig::default());

        let (client, server_io) = tokio::io::duplex(256 * 1024);
        let (server_read, server_write) = tokio::io::split(server_io);
        let (client_read, client_write) = tokio::io::split(client);

        let server = tokio::spawn(async move { server.run(server_read, server_write).await });

        Self {
            input: client_write,
            output: BufReader::new(client_read).lines(),
            server,
        }
    }

    async fn send(&mut self, message: Value) {
        let mut line = serde_json::to_vec(&message).unwrap();
        line.push(b'\n');
        self.input.write_all(&line).await.unwrap();
    }

    async fn send_raw(&mut self, line: &str) {
        self.input.write_all(line.as_bytes()).await.unwrap();
    }

    async fn recv(&mut self) -> Value {
        let line = tokio::time::timeout(Duration::from_secs(5), self.output.next_line())
            .await
            .expect("timed out waiting for response")
            .unwrap()
            .expect("output closed");
        serde_json::from_str(&line).unwrap()
    }

    async fn finish(mut self) -> Vec<Value> {
        self.input.shutdown().await.unwrap();
        let mut rest = Vec::new();
        while let Some(line) = self.output.next_line().await.unwrap() {
            rest.push(serde_json::from_str(&line).unwrap());
        }
        self.server.await.unwrap().unwrap();
        rest
    }
}

fn request(id: Value, method: &str, params: Value) -> Value {
    json!({"jsonrpc": "2.0", "id": id, "method": method, "params": params})
}

#[tokio::test]
async fn test_initialize_handshake_and_list() {
    let mut session = Session::start(Arc::new(MockTransport::new()), AuthContext::default());

    session
        .send(request(json!(1), "initialize", json!({"protocolVersion": "2024-11-05", "capabilities": {}})))
        .await;
    let init = session.recv().await;
    assert_eq!(init["id"], 1);
    assert_eq!(init["result"]["serverInfo"]["name"], "calendar-mcp");

    session
        .send(json!({"jsonrpc": "2.0", "method": "notifications/initialized"}))
        .await;
    session.send(request(json!(2), "tools/list", json!({}))).await;

    let list = session.recv().await;
    assert_eq!(list["id"], 2);
    let tools = list["result"]["tools"].as_array().unwrap();
    assert_eq!(tools.len(), 37);
    assert_eq!(tools[36]["name"], "get_users_me_settings");

    let quick_add = tools
        .iter()
        .find(|t| t["name"] == "post_calendars_calendarId_events_quickAdd")
        .unwrap();
    assert_eq!(quick_add["inputSchema"]["required"], json!(["calendarId", "text"]));

    assert!(session.finish().await.is_empty());
}

#[tokio::test]
async fn test_tool_call_round_trip() {
    let mock = Arc::new(MockTransport::new().with_response(200, r#"{"kind":"calendar#events","items":[]}"#));
    let mut session = Session::start(mock.clone(), AuthContext::default().with_bearer_token("tok"));

    session
        .send(request(
            json!("call-1"),
            "tools/call",
            json!({"name": "get_calendars_calendarId_events", "arguments": {"calendarId": "primary", "maxResults": 10}}),
        ))
        .await;

    let response = session.recv().await;
    assert_eq!(response["id"], "call-1");
    assert_eq!(response["result"]["isError"], false);
    let text = response["result"]["content"][0]["text"].as_str().unwrap();
    let body: Value = serde_json::from_str(text).unwrap();
    assert_eq!(body["kind"], "calendar#events");

    let sent = mock.requests();
    assert_eq!(sent.len(), 1);
    assert_eq!(
        sent[0].url.as_str(),
        "https://www.googleapis.com/calendar/v3/calendars/primary/events?maxResults=10&oauth_token=tok"
    );

    session.finish().await;
}

#[tokio::test]
async fn test_tool_errors_are_results() {
    let mock = Arc::new(MockTransport::new().with_response(403, r#"{"error":"forbidden"}"#));
    let mut session = Session::start(mock, AuthContext::default());

    session
        .send(request(json!(1), "tools/call", json!({"name": "get_colors", "arguments": {}})))
        .await;
    let response = session.recv().await;
    assert!(response.get("error").is_none());
    assert_eq!(response["result"]["isError"], true);
    assert_eq!(response["result"]["content"][0]["text"], r#"API error: {"error":"forbidden"}"#);

    session.finish().await;
}

#[tokio::test]
async fn test_protocol_errors() {
    let mut session = Session::start(Arc::new(MockTransport::new()), AuthContext::default());

    session.send_raw("this is not json\n").await;
    let parse = session.recv().await;
    assert_eq!(parse["error"]["code"], -32700);
    assert_eq!(parse["id"], Value::Null);

    session.send(request(json!(2), "prompts/list", json!({}))).await;
    let unknown_method = session.recv().await;
    assert_eq!(unknown_method["id"], 2);
    assert_eq!(unknown_method["error"]["code"], -32601);

    session
        .send(request(json!(3), "tools/call", json!({"name": "no_such_tool"})))
        .await;
    let unknown_tool = session.recv().await;
    assert_eq!(unknown_tool["id"], 3);
    assert_eq!(unknown_tool["error"]["code"], -32602);

    assert!(session.finish().await.is_empty());
}

#[tokio::test]
async fn test_slow_call_does_not_block_ping() {
    let mock = Arc::new(MockTransport::new().with_delay(Duration::from_millis(300)));
    let mut session = Session::start(mock, AuthContext::default());

    session
        .send(request(json!(1), "tools/call", json!({"name": "get_colors"})))
        .await;
    session.send(request(json!(2), "ping", json!({}))).await;

    let first = session.recv().await;
    assert_eq!(first["id"], 2);

    let second = session.recv().await;
    assert_eq!(second["id"], 1);
    assert_eq!(second["result"]["isError"], false);

    session.finish().await;
}

#[tokio::test]
async fn test_cancelled_call_still_answers() {
    let mock = Arc::new(MockTransport::new().with_delay(Duration::from_secs(30)));
    let mut session = Session::start(mock, AuthContext::default());

    session
        .send(request(json!(9), "tools/call", json!({"name": "get_colors"})))
        .await;
    session
        .send(json!({
            "jsonrpc": "2.0",
            "method": "notifications/cancelled",
            "params": {"requestId": 9, "reason": "user aborted"}
        }))
        .await;

    let response = session.recv().await;
    assert_eq!(response["id"], 9);
    assert_eq!(response["result"]["isError"], true);
    assert_eq!(response["result"]["content"][0]["text"], "Request failed: request cancelled");

    session.finish().await;
}
