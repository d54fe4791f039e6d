//! MCP (Model Context Protocol) stdio server.
//!
//! Speaks JSON-RPC 2.0 over stdin/stdout, one JSON object per line. A single
//! zero-argument tool, `start_task_loop`, runs one iteration of the
//! interactive task loop and returns a formatted status payload.
//!
//! Routed methods:
//! - `initialize` -- returns server capabilities
//! - `notifications/*` -- acknowledged silently (no response)
//! - `tools/list` -- enumerates the single tool
//! - `tools/call` -- runs one loop iteration

use anyhow::Result;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tokio::io::{AsyncBufRead, AsyncBufReadExt, AsyncWrite, AsyncWriteExt};
use tracing::debug;

use crate::capture::InputCapture;
use crate::task_loop::{IterationResult, TaskLoop};

/// Name of the single exposed tool
pub const TOOL_NAME: &str = "start_task_loop";

// Standard JSON-RPC error codes.
const PARSE_ERROR: i64 = -32700;
const METHOD_NOT_FOUND: i64 = -32601;
const INVALID_PARAMS: i64 = -32602;

/// A JSON-RPC 2.0 request
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct JsonRpcRequest {
    /// Must be `"2.0"`
    pub jsonrpc: String,
    /// The method name
    pub method: String,
    /// Optional parameters
    #[serde(default)]
    pub params: Option<Value>,
    /// Request ID. Absent for notifications.
    #[serde(default)]
    pub id: Option<Value>,
}

/// A JSON-RPC 2.0 response
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct JsonRpcResponse {
    /// Always `"2.0"`
    pub jsonrpc: String,
    /// The result on success
    #[serde(skip_serializing_if = "Option::is_none")]
    pub result: Option<Value>,
    /// The error on failure
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<JsonRpcError>,
    /// Mirrors the request ID
    pub id: Value,
}

/// A JSON-RPC 2.0 error object
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct JsonRpcError {
    pub code: i64,
    pub message: String,
}

impl JsonRpcResponse {
    fn result(id: Value, result: Value) -> Self {
        Self {
            jsonrpc: "2.0".to_string(),
            result: Some(result),
            error: None,
            id,
        }
    }

    fn error(id: Value, code: i64, message: String) -> Self {
        Self {
            jsonrpc: "2.0".to_string(),
            result: None,
            error: Some(JsonRpcError { code, message }),
            id,
        }
    }
}

/// MCP stdio server exposing the interactive task loop as a tool
pub struct McpServer<C: InputCapture> {
    task_loop: TaskLoop<C>,
}

impl<C: InputCapture> McpServer<C> {
    /// Create a new server around the given task loop
    pub fn new(task_loop: TaskLoop<C>) -> Self {
        Self { task_loop }
    }

    /// Run the server loop, reading from `stdin` and writing to `stdout`.
    ///
    /// Exits cleanly when stdin reaches EOF.
    pub async fn run(
        self,
        stdin: impl AsyncBufRead + Unpin,
        mut stdout: impl AsyncWrite + Unpin,
    ) -> Result<()> {
        let mut lines = stdin.lines();

        while let Some(line) = lines.next_line().await? {
            let line = line.trim();
            if line.is_empty() {
                continue;
            }

            let request: JsonRpcRequest = match serde_json::from_str(line) {
                Ok(req) => req,
                Err(_) => {
                    // Malformed JSON gets a parse error with a null id
                    let response = JsonRpcResponse::error(
                        Value::Null,
                        PARSE_ERROR,
                        "Parse error".to_string(),
                    );
                    write_response(&mut stdout, &response).await?;
                    continue;
                }
            };

            // Notifications carry no id and get no response
            let Some(id) = request.id else {
                debug!("notification: {}", request.method);
                continue;
            };

            let response = match request.method.as_str() {
                "initialize" => self.handle_initialize(id),
                "tools/list" => self.handle_tools_list(id),
                "tools/call" => self.handle_tools_call(id, request.params).await,
                other => JsonRpcResponse::error(
                    id,
                    METHOD_NOT_FOUND,
                    format!("Method not found: {other}"),
                ),
            };

            write_response(&mut stdout, &response).await?;
        }

        debug!("stdin closed, stopping server");
        Ok(())
    }

    fn handle_initialize(&self, id: Value) -> JsonRpcResponse {
        JsonRpcResponse::result(
            id,
            serde_json::json!({
                "capabilities": {
                    "tools": {}
                },
                "serverInfo": {
                    "name": "cursor25x",
                    "version": env!("CARGO_PKG_VERSION"),
                }
            }),
        )
    }

    fn handle_tools_list(&self, id: Value) -> JsonRpcResponse {
        JsonRpcResponse::result(
            id,
            serde_json::json!({
                "tools": [{
                    "name": TOOL_NAME,
                    "description": "Start the interactive task loop user prompt",
                    "inputSchema": {
                        "type": "object",
                        "properties": {},
                        "required": [],
                    },
                }]
            }),
        )
    }

    async fn handle_tools_call(&self, id: Value, params: Option<Value>) -> JsonRpcResponse {
        let tool_name = params
            .as_ref()
            .and_then(|p| p.get("name"))
            .and_then(|v| v.as_str());

        match tool_name {
            Some(TOOL_NAME) => {}
            Some(other) => {
                return JsonRpcResponse::error(
                    id,
                    METHOD_NOT_FOUND,
                    format!("Unknown tool: {other}"),
                );
            }
            None => {
                return JsonRpcResponse::error(
                    id,
                    INVALID_PARAMS,
                    "Missing 'name' in tools/call params".to_string(),
                );
            }
        }

        let result = self.task_loop.run_single_iteration().await;
        let (text, is_error) = if result.success {
            (self.format_success(&result), false)
        } else {
            (self.format_failure(&result), true)
        };

        JsonRpcResponse::result(
            id,
            serde_json::json!({
                "content": [{
                    "type": "text",
                    "text": text,
                }],
                "isError": is_error,
            }),
        )
    }

    fn format_success(&self, result: &IterationResult) -> String {
        let mut response = String::from("🚀 **CURSOR25X INTERACTIVE LOOP**\n\n");
        response.push_str(&format!(
            "📁 **Working Directory:** {}\n",
            self.task_loop.working_directory().display()
        ));
        response
            .push_str("✅ **Files Created:** cursor25xinput.cjs, .cursor/rules/cursor25x.mdc\n\n");

        if let Some(ref user_input) = result.user_input {
            let user_input = user_input.trim();
            if user_input.eq_ignore_ascii_case("stop") {
                response.push_str("🛑 **STOPPED:** User requested to stop\n");
            } else {
                response.push_str(&format!("✅ **User Input:** \"{user_input}\"\n"));
                response.push_str(&format!("📝 **Task:** {}\n\n", result.message));
                response.push_str(
                    "🔄 **Next:** Run tool again for continuous loop or type \"stop\" to exit\n",
                );
            }
        }

        response.push_str(
            "\n💡 **Usage:** Type commands like \"create\", \"read\", \"update\", \"delete\", \"help\", or \"stop\"",
        );
        response
    }

    fn format_failure(&self, result: &IterationResult) -> String {
        format!(
            "❌ **ERROR:** {}\n📁 **Working Directory:** {}",
            result.error.as_deref().unwrap_or(&result.message),
            self.task_loop.working_directory().display()
        )
    }
}

/// Write a JSON-RPC response as a single line to the writer
async fn write_response(
    writer: &mut (impl AsyncWrite + Unpin),
    response: &JsonRpcResponse,
) -> Result<()> {
    let mut line = serde_json::to_string(response)?;
    line.push('\n');
    writer.write_all(line.as_bytes()).await?;
    writer.flush().await?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Config;
    use crate::error::{Cursor25xError, Result};
    use async_trait::async_trait;
    use tempfile::TempDir;

    struct MockCapture {
        input: String,
    }

    impl MockCapture {
        fn new(input: &str) -> Self {
            Self {
                input: input.to_string(),
            }
        }
    }

    #[async_trait]
    impl InputCapture for MockCapture {
        async fn capture(&self, _config: &Config) -> Result<String> {
            Ok(self.input.clone())
        }
    }

    struct TimeoutCapture;

    #[async_trait]
    impl InputCapture for TimeoutCapture {
        async fn capture(&self, config: &Config) -> Result<String> {
            Err(Cursor25xError::CaptureTimeout(config.capture_timeout))
        }
    }

    fn make_server<C: InputCapture>(dir: &TempDir, capture: C) -> McpServer<C> {
        let config = Config::new(dir.path().to_path_buf());
        McpServer::new(TaskLoop::new(config, capture))
    }

    /// Run the server over in-memory streams and collect the output lines
    async fn run_server<C: InputCapture>(
        server: McpServer<C>,
        input_lines: &[&str],
    ) -> Vec<String> {
        let mut input = String::new();
        for line in input_lines {
            input.push_str(line);
            input.push('\n');
        }

        let stdin = tokio::io::BufReader::new(std::io::Cursor::new(input.into_bytes()));
        let mut stdout_buf: Vec<u8> = Vec::new();

        server.run(stdin, &mut stdout_buf).await.unwrap();

        let output = String::from_utf8(stdout_buf).unwrap();
        output
            .lines()
            .filter(|l| !l.is_empty())
            .map(|l| l.to_string())
            .collect()
    }

    fn parse_response(line: &str) -> JsonRpcResponse {
        serde_json::from_str(line).expect("failed to parse response JSON")
    }

    #[tokio::test]
    async fn test_initialize_response() {
        let dir = TempDir::new().unwrap();
        let server = make_server(&dir, MockCapture::new("hello"));

        let request = serde_json::json!({
            "jsonrpc": "2.0",
            "method": "initialize",
            "id": 1
        });

        let lines = run_server(server, &[&request.to_string()]).await;
        assert_eq!(lines.len(), 1);

        let resp = parse_response(&lines[0]);
        assert_eq!(resp.jsonrpc, "2.0");
        assert!(resp.error.is_none());

        let result = resp.result.unwrap();
        assert!(result["capabilities"].get("tools").is_some());
        assert_eq!(result["serverInfo"]["name"], "cursor25x");
        assert_eq!(resp.id, serde_json::json!(1));
    }

    #[tokio::test]
    async fn test_tools_list_returns_the_single_tool() {
        let dir = TempDir::new().unwrap();
        let server = make_server(&dir, MockCapture::new("hello"));

        let request = serde_json::json!({
            "jsonrpc": "2.0",
            "method": "tools/list",
            "id": 2
        });

        let lines = run_server(server, &[&request.to_string()]).await;
        let resp = parse_response(&lines[0]);
        assert!(resp.error.is_none());

        let result = resp.result.unwrap();
        let tools = result["tools"].as_array().unwrap();
        assert_eq!(tools.len(), 1);
        assert_eq!(tools[0]["name"], TOOL_NAME);
        assert_eq!(tools[0]["inputSchema"]["type"], "object");
    }

    #[tokio::test]
    async fn test_tools_call_runs_an_iteration() {
        let dir = TempDir::new().unwrap();
        let server = make_server(&dir, MockCapture::new("update the schema"));

        let request = serde_json::json!({
            "jsonrpc": "2.0",
            "method": "tools/call",
            "params": { "name": TOOL_NAME, "arguments": {} },
            "id": 3
        });

        let lines = run_server(server, &[&request.to_string()]).await;
        let resp = parse_response(&lines[0]);
        assert!(resp.error.is_none());

        let result = resp.result.unwrap();
        assert_eq!(result["isError"], false);

        let text = result["content"][0]["text"].as_str().unwrap();
        assert!(text.contains("CURSOR25X INTERACTIVE LOOP"));
        assert!(text.contains("**User Input:** \"update the schema\""));
        assert!(text.contains("Updating task: \"update the schema\""));

        // The iteration also scaffolded the artifacts
        assert!(dir.path().join("cursor25xinput.cjs").exists());
        assert!(dir
            .path()
            .join(".cursor")
            .join("rules")
            .join("cursor25x.mdc")
            .exists());
    }

    #[tokio::test]
    async fn test_tools_call_stop_keyword() {
        let dir = TempDir::new().unwrap();
        let server = make_server(&dir, MockCapture::new("stop"));

        let request = serde_json::json!({
            "jsonrpc": "2.0",
            "method": "tools/call",
            "params": { "name": TOOL_NAME, "arguments": {} },
            "id": 4
        });

        let lines = run_server(server, &[&request.to_string()]).await;
        let resp = parse_response(&lines[0]);
        let result = resp.result.unwrap();

        let text = result["content"][0]["text"].as_str().unwrap();
        assert!(text.contains("**STOPPED:** User requested to stop"));
        assert!(!text.contains("**Next:**"));
    }

    #[tokio::test]
    async fn test_tools_call_failure_payload() {
        let dir = TempDir::new().unwrap();
        let server = make_server(&dir, TimeoutCapture);

        let request = serde_json::json!({
            "jsonrpc": "2.0",
            "method": "tools/call",
            "params": { "name": TOOL_NAME, "arguments": {} },
            "id": 5
        });

        let lines = run_server(server, &[&request.to_string()]).await;
        let resp = parse_response(&lines[0]);
        // Tool failures are reported in the payload, not as JSON-RPC errors
        assert!(resp.error.is_none());

        let result = resp.result.unwrap();
        assert_eq!(result["isError"], true);

        let text = result["content"][0]["text"].as_str().unwrap();
        assert!(text.contains("**ERROR:**"));
        assert!(text.contains("timeout"));
        assert!(text.contains("**Working Directory:**"));
    }

    #[tokio::test]
    async fn test_tools_call_unknown_tool() {
        let dir = TempDir::new().unwrap();
        let server = make_server(&dir, MockCapture::new("hello"));

        let request = serde_json::json!({
            "jsonrpc": "2.0",
            "method": "tools/call",
            "params": { "name": "nonexistent_tool", "arguments": {} },
            "id": 6
        });

        let lines = run_server(server, &[&request.to_string()]).await;
        let resp = parse_response(&lines[0]);
        assert!(resp.result.is_none());
        assert!(resp.error.unwrap().message.contains("Unknown tool"));
    }

    #[tokio::test]
    async fn test_unknown_method_returns_error() {
        let dir = TempDir::new().unwrap();
        let server = make_server(&dir, MockCapture::new("hello"));

        let request = serde_json::json!({
            "jsonrpc": "2.0",
            "method": "resources/list",
            "id": 7
        });

        let lines = run_server(server, &[&request.to_string()]).await;
        let resp = parse_response(&lines[0]);
        let err = resp.error.unwrap();
        assert_eq!(err.code, METHOD_NOT_FOUND);
    }

    #[tokio::test]
    async fn test_notification_gets_no_response() {
        let dir = TempDir::new().unwrap();
        let server = make_server(&dir, MockCapture::new("hello"));

        let notification = serde_json::json!({
            "jsonrpc": "2.0",
            "method": "notifications/initialized"
        });

        let lines = run_server(server, &[&notification.to_string()]).await;
        assert!(lines.is_empty(), "unexpected response: {lines:?}");
    }

    #[tokio::test]
    async fn test_parse_error_has_null_id() {
        let dir = TempDir::new().unwrap();
        let server = make_server(&dir, MockCapture::new("hello"));

        let lines = run_server(server, &["this is not json"]).await;
        let resp = parse_response(&lines[0]);

        let err = resp.error.unwrap();
        assert_eq!(err.code, PARSE_ERROR);
        assert_eq!(resp.id, Value::Null);
    }

    #[tokio::test]
    async fn test_server_exits_cleanly_on_eof() {
        let dir = TempDir::new().unwrap();
        let server = make_server(&dir, MockCapture::new("hello"));

        let stdin = tokio::io::BufReader::new(std::io::Cursor::new(Vec::<u8>::new()));
        let mut stdout_buf: Vec<u8> = Vec::new();

        let result = server.run(stdin, &mut stdout_buf).await;
        assert!(result.is_ok());
        assert!(stdout_buf.is_empty());
    }
}
