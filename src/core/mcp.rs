//! MCP protocol runtime: a line-oriented JSON-RPC loop over a byte
//! stream pair, usually stdin/stdout.
//!
//! The runtime emits one unsolicited handshake line, then answers at most
//! one line per inbound request. The loop is strictly sequential: each
//! message is fully handled, including the outbound HTTP call, before the
//! next line is read.

use anyhow::Result;
use serde_json::{json, Value};
use std::sync::Arc;
use tokio::io::{AsyncBufRead, AsyncBufReadExt, AsyncWrite, AsyncWriteExt, BufReader};

use crate::config::{Catalog, DEFAULT_SERVER_NAME, DEFAULT_SERVER_VERSION};
use crate::core::invoker::Invoker;

pub const PROTOCOL_VERSION: &str = "2024-11-05";

/// Serves the handshake/list/call/ping lifecycle against a read-only
/// catalog. A missing catalog is a valid degraded state: `tools/list`
/// yields an empty list and every call resolves to "Tool not found".
pub struct McpServer {
    catalog: Option<Arc<Catalog>>,
    invoker: Invoker,
}

impl McpServer {
    pub fn new(catalog: Option<Arc<Catalog>>, invoker: Invoker) -> Self {
        Self { catalog, invoker }
    }

    /// Run on stdin/stdout until the input stream is exhausted.
    pub async fn run_stdio(&self) -> Result<()> {
        self.run(BufReader::new(tokio::io::stdin()), tokio::io::stdout())
            .await
    }

    /// Emit the handshake, then answer one line per request until EOF.
    pub async fn run<R, W>(&self, mut input: R, mut output: W) -> Result<()>
    where
        R: AsyncBufRead + Unpin,
        W: AsyncWrite + Unpin,
    {
        send(&mut output, &self.handshake()).await?;

        let mut line = String::new();
        loop {
            line.clear();
            if input.read_line(&mut line).await? == 0 {
                tracing::info!("Input stream closed, MCP loop terminating");
                return Ok(());
            }
            if line.trim().is_empty() {
                continue;
            }

            let reply = match serde_json::from_str::<Value>(&line) {
                Ok(message) => match self.handle(&message).await {
                    Ok(reply) => reply,
                    // Handler faults (missing method, malformed params) are
                    // reported on the stream, never allowed to kill the loop.
                    Err(e) => error_reply(format!("Invalid JSON: {}", e)),
                },
                Err(e) => error_reply(format!("Invalid JSON: {}", e)),
            };
            send(&mut output, &reply).await?;
        }
    }

    async fn handle(&self, message: &Value) -> Result<Value> {
        let method = message
            .get("method")
            .and_then(Value::as_str)
            .ok_or_else(|| anyhow::anyhow!("missing method field"))?;
        let id = message.get("id").cloned().unwrap_or(Value::Null);

        tracing::debug!("Handling MCP method: {}", method);

        Ok(match method {
            "tools/list" => result_reply(id, self.tools_list()),
            "tools/call" => self.tools_call(id, message.get("params")).await?,
            "ping" => result_reply(id, json!({})),
            other => error_reply(format!("Unknown method: {}", other)),
        })
    }

    fn tools_list(&self) -> Value {
        let tools: Vec<Value> = self
            .catalog
            .iter()
            .flat_map(|catalog| catalog.tools.iter())
            .map(|tool| {
                json!({
                    "name": tool.name,
                    "description": tool.description,
                    "inputSchema": tool.input_schema(),
                })
            })
            .collect();

        json!({ "tools": tools })
    }

    async fn tools_call(&self, id: Value, params: Option<&Value>) -> Result<Value> {
        let params = params.ok_or_else(|| anyhow::anyhow!("missing params"))?;
        let name = params
            .get("name")
            .and_then(Value::as_str)
            .ok_or_else(|| anyhow::anyhow!("missing tool name in params"))?;

        let Some(tool) = self.catalog.as_ref().and_then(|c| c.tool(name)) else {
            return Ok(error_reply(format!("Tool not found: {}", name)));
        };

        let args = params
            .get("arguments")
            .and_then(Value::as_object)
            .cloned()
            .unwrap_or_default();

        let result = self.invoker.invoke(tool, &args).await;
        Ok(result_reply(id, serde_json::to_value(result)?))
    }

    fn handshake(&self) -> Value {
        let (name, version) = match self.catalog.as_deref() {
            Some(catalog) => (catalog.server_name(), catalog.server_version()),
            None => (DEFAULT_SERVER_NAME, DEFAULT_SERVER_VERSION),
        };

        json!({
            "jsonrpc": "2.0",
            "id": 1,
            "result": {
                "protocolVersion": PROTOCOL_VERSION,
                "capabilities": { "tools": { "listChanged": true } },
                "serverInfo": { "name": name, "version": version },
            }
        })
    }
}

async fn send<W: AsyncWrite + Unpin>(output: &mut W, message: &Value) -> Result<()> {
    let json = serde_json::to_string(message)?;
    output.write_all(json.as_bytes()).await?;
    output.write_all(b"\n").await?;
    output.flush().await?;
    Ok(())
}

fn result_reply(id: Value, result: Value) -> Value {
    json!({ "jsonrpc": "2.0", "id": id, "result": result })
}

/// Protocol-level errors carry no `id` correlation.
fn error_reply(message: impl Into<String>) -> Value {
    json!({ "jsonrpc": "2.0", "error": { "message": message.into() } })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{ParameterSpec, ServerInfo, ToolConfig};
    use std::collections::BTreeMap;

    fn catalog_with(tools: Vec<ToolConfig>) -> Arc<Catalog> {
        Arc::new(Catalog {
            server: Some(ServerInfo {
                name: "Test Bridge".to_string(),
                description: None,
                version: "0.1.0".to_string(),
            }),
            auth: None,
            tools,
        })
    }

    fn echo_tool() -> ToolConfig {
        let mut parameters = BTreeMap::new();
        parameters.insert(
            "x".to_string(),
            ParameterSpec {
                kind: "string".to_string(),
                description: "the x".to_string(),
                default: None,
                required: true,
            },
        );
        ToolConfig {
            name: "echo".to_string(),
            description: "Echoes".to_string(),
            endpoint: "http://localhost:1/echo".to_string(),
            method: None,
            timeout: None,
            template: None,
            query_params: BTreeMap::new(),
            parameters,
        }
    }

    /// Feed `input` through a server and return the emitted lines,
    /// handshake included.
    async fn run_session(catalog: Option<Arc<Catalog>>, input: &str) -> Vec<Value> {
        let server = McpServer::new(catalog, Invoker::new());
        let mut output = Vec::new();
        server
            .run(BufReader::new(input.as_bytes()), &mut output)
            .await
            .unwrap();

        String::from_utf8(output)
            .unwrap()
            .lines()
            .map(|line| serde_json::from_str(line).unwrap())
            .collect()
    }

    #[tokio::test]
    async fn test_handshake_is_emitted_unprompted() {
        let replies = run_session(None, "").await;
        assert_eq!(replies.len(), 1);

        let handshake = &replies[0];
        assert_eq!(handshake["jsonrpc"], "2.0");
        assert_eq!(handshake["id"], 1);
        assert_eq!(handshake["result"]["protocolVersion"], PROTOCOL_VERSION);
        assert_eq!(
            handshake["result"]["capabilities"]["tools"]["listChanged"],
            true
        );
        assert_eq!(
            handshake["result"]["serverInfo"]["name"],
            DEFAULT_SERVER_NAME
        );
        assert_eq!(
            handshake["result"]["serverInfo"]["version"],
            DEFAULT_SERVER_VERSION
        );
    }

    #[tokio::test]
    async fn test_handshake_uses_catalog_metadata() {
        let replies = run_session(Some(catalog_with(vec![])), "").await;
        assert_eq!(replies[0]["result"]["serverInfo"]["name"], "Test Bridge");
        assert_eq!(replies[0]["result"]["serverInfo"]["version"], "0.1.0");
    }

    #[tokio::test]
    async fn test_tools_list_without_catalog_is_empty() {
        let replies = run_session(None, "{\"method\":\"tools/list\",\"id\":2}\n").await;
        assert_eq!(replies[1]["id"], 2);
        assert_eq!(replies[1]["result"]["tools"], serde_json::json!([]));
    }

    #[tokio::test]
    async fn test_tools_list_reports_input_schema() {
        let catalog = catalog_with(vec![echo_tool()]);
        let replies = run_session(Some(catalog), "{\"method\":\"tools/list\",\"id\":5}\n").await;

        let tools = replies[1]["result"]["tools"].as_array().unwrap();
        assert_eq!(tools.len(), 1);
        assert_eq!(tools[0]["name"], "echo");
        assert_eq!(tools[0]["inputSchema"]["type"], "object");
        assert_eq!(
            tools[0]["inputSchema"]["required"],
            serde_json::json!(["x"])
        );
        assert_eq!(tools[0]["inputSchema"]["properties"]["x"]["type"], "string");
    }

    #[tokio::test]
    async fn test_ping_echoes_id_with_empty_result() {
        let replies = run_session(None, "{\"method\":\"ping\",\"id\":42}\n").await;
        assert_eq!(replies[1]["id"], 42);
        assert_eq!(replies[1]["result"], serde_json::json!({}));
    }

    #[tokio::test]
    async fn test_unknown_method_error_has_no_id() {
        let replies = run_session(None, "{\"method\":\"foo/bar\",\"id\":3}\n").await;
        let reply = replies[1].as_object().unwrap();
        assert_eq!(reply["error"]["message"], "Unknown method: foo/bar");
        assert!(!reply.contains_key("id"));
    }

    #[tokio::test]
    async fn test_tool_not_found() {
        let catalog = catalog_with(vec![echo_tool()]);
        let input =
            "{\"method\":\"tools/call\",\"id\":4,\"params\":{\"name\":\"nope\",\"arguments\":{}}}\n";
        let replies = run_session(Some(catalog), input).await;
        assert_eq!(replies[1]["error"]["message"], "Tool not found: nope");
        assert!(replies[1].get("id").is_none());
    }

    #[tokio::test]
    async fn test_unparseable_line_reports_invalid_json() {
        let replies = run_session(None, "this is not json\n").await;
        let message = replies[1]["error"]["message"].as_str().unwrap();
        assert!(message.starts_with("Invalid JSON:"));
    }

    #[tokio::test]
    async fn test_missing_method_reports_invalid_json() {
        let replies = run_session(None, "{\"id\":9}\n").await;
        let message = replies[1]["error"]["message"].as_str().unwrap();
        assert!(message.starts_with("Invalid JSON:"));
    }

    #[tokio::test]
    async fn test_call_with_missing_params_reports_invalid_json() {
        let replies = run_session(None, "{\"method\":\"tools/call\",\"id\":9}\n").await;
        let message = replies[1]["error"]["message"].as_str().unwrap();
        assert!(message.starts_with("Invalid JSON:"));
    }

    #[tokio::test]
    async fn test_blank_lines_produce_no_output() {
        let replies = run_session(None, "\n   \n\t\n").await;
        assert_eq!(replies.len(), 1); // handshake only
    }

    #[tokio::test]
    async fn test_loop_survives_bad_lines() {
        let input = "garbage\n{\"method\":\"ping\",\"id\":7}\n";
        let replies = run_session(None, input).await;
        assert_eq!(replies.len(), 3);
        assert_eq!(replies[2]["id"], 7);
        assert_eq!(replies[2]["result"], serde_json::json!({}));
    }
}
