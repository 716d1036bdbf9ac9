// MCP server: JSON-RPC 2.0 over newline-delimited stdio

use crate::protocol::{
    CallToolParams, InitializeParams, InitializeResult, JsonRpcError, JsonRpcRequest,
    JsonRpcResponse, ListToolsResult, ServerCapabilities, ServerInfo, ToolsCapability,
    PROTOCOL_VERSION,
};
use crate::tools::ToolRegistry;
use anyhow::{Context, Result};
use futures_util::stream::{FuturesUnordered, StreamExt};
use serde_json::Value;
use tokio::io::{AsyncRead, AsyncWrite, AsyncWriteExt};
use tokio_util::codec::{FramedRead, LinesCodec};
use tracing::{debug, info, warn};

pub struct McpServer {
    registry: ToolRegistry,
    info: ServerInfo,
}

impl McpServer {
    pub fn new(registry: ToolRegistry) -> Self {
        Self {
            registry,
            info: ServerInfo {
                name: env!("CARGO_PKG_NAME").to_string(),
                version: env!("CARGO_PKG_VERSION").to_string(),
            },
        }
    }

    /// Serve on the process's stdin/stdout until stdin closes.
    pub async fn start(&self) -> Result<()> {
        info!(tools = self.registry.len(), "MCP server listening on stdio");
        self.serve(tokio::io::stdin(), tokio::io::stdout()).await
    }

    /// Serve requests read line by line from `reader`, writing one response
    /// line per request to `writer`.
    ///
    /// Requests are handled concurrently, so a slow tool call does not hold
    /// up the ones behind it. Responses are written in completion order and
    /// matched by id.
    pub async fn serve<R, W>(&self, reader: R, mut writer: W) -> Result<()>
    where
        R: AsyncRead + Unpin,
        W: AsyncWrite + Unpin,
    {
        let mut lines = FramedRead::new(reader, LinesCodec::new());
        let mut in_flight = FuturesUnordered::new();
        let mut input_open = true;

        loop {
            tokio::select! {
                line = lines.next(), if input_open => match line {
                    Some(line) => {
                        let line = line.context("Failed to read from input stream")?;
                        if !line.trim().is_empty() {
                            in_flight.push(async move { self.handle_line(&line).await });
                        }
                    }
                    None => {
                        debug!(pending = in_flight.len(), "Input stream closed");
                        input_open = false;
                    }
                },
                Some(response) = in_flight.next(), if !in_flight.is_empty() => {
                    if let Some(response) = response {
                        write_response(&mut writer, &response).await?;
                    }
                }
                else => break,
            }
        }

        info!("Input stream closed, MCP server stopping");
        Ok(())
    }

    /// Handle one raw input line. Returns `None` for notifications.
    pub async fn handle_line(&self, line: &str) -> Option<JsonRpcResponse> {
        let value: Value = match serde_json::from_str(line) {
            Ok(value) => value,
            Err(e) => {
                warn!(error = %e, "Unparseable JSON-RPC message");
                return Some(JsonRpcResponse::error(Value::Null, JsonRpcError::parse_error()));
            }
        };

        let id = value.get("id").cloned().unwrap_or(Value::Null);
        match serde_json::from_value::<JsonRpcRequest>(value) {
            Ok(request) => self.handle_request(request).await,
            Err(_) => Some(JsonRpcResponse::error(id, JsonRpcError::invalid_request())),
        }
    }

    /// Dispatch a parsed request to its method handler.
    pub async fn handle_request(&self, request: JsonRpcRequest) -> Option<JsonRpcResponse> {
        debug!(method = %request.method, "JSON-RPC request");

        if request.is_notification() {
            if request.method != "notifications/initialized" {
                debug!(method = %request.method, "Ignoring notification");
            }
            return None;
        }

        let id = request.id.clone().unwrap_or(Value::Null);
        let outcome = match request.method.as_str() {
            "initialize" => self.initialize(request.params),
            "ping" => Ok(Value::Object(Default::default())),
            "tools/list" => self.list_tools(),
            "tools/call" => self.call_tool(request.params).await,
            other => Err(JsonRpcError::method_not_found(other)),
        };

        Some(match outcome {
            Ok(result) => JsonRpcResponse::success(id, result),
            Err(error) => JsonRpcResponse::error(id, error),
        })
    }

    fn initialize(&self, params: Option<Value>) -> Result<Value, JsonRpcError> {
        let params: InitializeParams = params
            .map(serde_json::from_value)
            .transpose()
            .map_err(|e| JsonRpcError::invalid_params(format!("Invalid initialize params: {}", e)))?
            .ok_or_else(|| JsonRpcError::invalid_params("Missing initialize params"))?;

        info!(
            client = params.client_info.as_ref().map(|c| c.name.as_str()).unwrap_or("unknown"),
            protocol_version = %params.protocol_version,
            "Client initializing"
        );

        to_result(&InitializeResult {
            protocol_version: PROTOCOL_VERSION.to_string(),
            capabilities: ServerCapabilities {
                tools: Some(ToolsCapability {
                    list_changed: false,
                }),
            },
            server_info: self.info.clone(),
        })
    }

    fn list_tools(&self) -> Result<Value, JsonRpcError> {
        to_result(&ListToolsResult {
            tools: self.registry.list_schemas(),
        })
    }

    async fn call_tool(&self, params: Option<Value>) -> Result<Value, JsonRpcError> {
        let params: CallToolParams = params
            .map(serde_json::from_value)
            .transpose()
            .map_err(|e| JsonRpcError::invalid_params(format!("Invalid tools/call params: {}", e)))?
            .ok_or_else(|| JsonRpcError::invalid_params("Missing tools/call params"))?;

        match self.registry.call(&params.name, params.arguments).await {
            Some(result) => to_result(&result),
            None => Err(JsonRpcError::invalid_params(format!(
                "Unknown tool: {}",
                params.name
            ))),
        }
    }
}

async fn write_response<W: AsyncWrite + Unpin>(writer: &mut W, response: &JsonRpcResponse) -> Result<()> {
    let mut payload = serde_json::to_string(response)?;
    payload.push('\n');
    writer
        .write_all(payload.as_bytes())
        .await
        .context("Failed to write response")?;
    writer.flush().await?;
    Ok(())
}

fn to_result<T: serde::Serialize>(value: &T) -> Result<Value, JsonRpcError> {
    serde_json::to_value(value).map_err(|e| JsonRpcError::internal_error(e.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tools::register_all;
    use serde_json::json;
    use tokio::io::AsyncReadExt;
    use wiremock::matchers::{method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};
    use zoho_crm_sdk::ZohoClient;

    fn server_for(api_domain: &str) -> McpServer {
        let client = ZohoClient::builder()
            .api_domain(api_domain)
            .accounts_domain(api_domain)
            .access_token("tok")
            .build()
            .unwrap();
        let mut registry = ToolRegistry::new();
        register_all(&mut registry, &client);
        McpServer::new(registry)
    }

    async fn call(server: &McpServer, request: Value) -> Value {
        let response = server.handle_line(&request.to_string()).await.unwrap();
        serde_json::to_value(response).unwrap()
    }

    #[tokio::test]
    async fn test_initialize() {
        let server = server_for("http://localhost:1");

        let response = call(
            &server,
            json!({
                "jsonrpc": "2.0",
                "id": 1,
                "method": "initialize",
                "params": {
                    "protocolVersion": "2024-11-05",
                    "capabilities": {},
                    "clientInfo": { "name": "test-client", "version": "1.0" }
                }
            }),
        )
        .await;

        assert_eq!(response["id"], 1);
        assert_eq!(response["result"]["protocolVersion"], PROTOCOL_VERSION);
        assert_eq!(response["result"]["serverInfo"]["name"], "zoho-crm-mcp");
        assert_eq!(response["result"]["capabilities"]["tools"]["listChanged"], false);
    }

    #[tokio::test]
    async fn test_notification_gets_no_response() {
        let server = server_for("http://localhost:1");

        let line = json!({ "jsonrpc": "2.0", "method": "notifications/initialized" }).to_string();
        assert!(server.handle_line(&line).await.is_none());
    }

    #[tokio::test]
    async fn test_tools_list() {
        let server = server_for("http://localhost:1");

        let response = call(&server, json!({ "jsonrpc": "2.0", "id": "a", "method": "tools/list" })).await;

        let tools = response["result"]["tools"].as_array().unwrap();
        assert_eq!(tools.len(), 32);
        assert!(tools.iter().all(|t| t["inputSchema"]["type"] == "object"));
    }

    #[tokio::test]
    async fn test_tools_call_success_and_failure() {
        let api = MockServer::start().await;

        Mock::given(method("GET"))
            .and(path("/crm/v7/org"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "org": [{ "id": "1" }] })))
            .mount(&api)
            .await;
        Mock::given(method("GET"))
            .and(path("/crm/v7/users"))
            .respond_with(ResponseTemplate::new(500).set_body_string("boom"))
            .mount(&api)
            .await;

        let server = server_for(&api.uri());

        let ok = call(
            &server,
            json!({
                "jsonrpc": "2.0",
                "id": 2,
                "method": "tools/call",
                "params": { "name": "get_organization", "arguments": {} }
            }),
        )
        .await;
        assert!(ok["result"].get("isError").is_none());
        let text = ok["result"]["content"][0]["text"].as_str().unwrap();
        assert_eq!(serde_json::from_str::<Value>(text).unwrap(), json!({ "org": [{ "id": "1" }] }));

        let failed = call(
            &server,
            json!({
                "jsonrpc": "2.0",
                "id": 3,
                "method": "tools/call",
                "params": { "name": "get_current_user" }
            }),
        )
        .await;
        assert_eq!(failed["result"]["isError"], true);
        assert_eq!(
            failed["result"]["content"][0]["text"],
            "Error: Zoho API error (500): boom"
        );
    }

    #[tokio::test]
    async fn test_unknown_tool_and_method() {
        let server = server_for("http://localhost:1");

        let unknown_tool = call(
            &server,
            json!({
                "jsonrpc": "2.0",
                "id": 4,
                "method": "tools/call",
                "params": { "name": "drop_database", "arguments": {} }
            }),
        )
        .await;
        assert_eq!(unknown_tool["error"]["code"], -32602);

        let unknown_method = call(&server, json!({ "jsonrpc": "2.0", "id": 5, "method": "resources/list" })).await;
        assert_eq!(unknown_method["error"]["code"], -32601);
    }

    #[tokio::test]
    async fn test_parse_error() {
        let server = server_for("http://localhost:1");

        let response = server.handle_line("{not json").await.unwrap();
        assert_eq!(response.error.unwrap().code, -32700);
        assert_eq!(response.id, Value::Null);
    }

    #[tokio::test]
    async fn test_slow_tool_call_does_not_block_later_requests() {
        let api = MockServer::start().await;

        Mock::given(method("GET"))
            .and(path("/crm/v7/org"))
            .respond_with(
                ResponseTemplate::new(200)
                    .set_body_json(json!({ "org": [] }))
                    .set_delay(std::time::Duration::from_millis(300)),
            )
            .expect(1)
            .mount(&api)
            .await;

        let server = server_for(&api.uri());
        let input = format!(
            "{}\n{}\n",
            json!({
                "jsonrpc": "2.0",
                "id": "slow",
                "method": "tools/call",
                "params": { "name": "get_organization" }
            }),
            json!({ "jsonrpc": "2.0", "id": "fast", "method": "ping" }),
        );

        let (mut client_end, server_end) = tokio::io::duplex(64 * 1024);
        server.serve(input.as_bytes(), server_end).await.unwrap();

        let mut output = String::new();
        client_end.read_to_string(&mut output).await.unwrap();
        let ids: Vec<Value> = output
            .lines()
            .map(|l| serde_json::from_str::<Value>(l).unwrap()["id"].clone())
            .collect();

        assert_eq!(ids, vec![json!("fast"), json!("slow")]);
    }

    #[tokio::test]
    async fn test_serve_over_streams() {
        let server = server_for("http://localhost:1");
        let input = format!(
            "{}\n\n{}\n{}\n",
            json!({ "jsonrpc": "2.0", "id": 1, "method": "ping" }),
            json!({ "jsonrpc": "2.0", "method": "notifications/initialized" }),
            json!({ "jsonrpc": "2.0", "id": 2, "method": "ping" }),
        );

        let (mut client_end, server_end) = tokio::io::duplex(64 * 1024);
        server.serve(input.as_bytes(), server_end).await.unwrap();

        let mut output = String::new();
        client_end.read_to_string(&mut output).await.unwrap();
        let responses: Vec<Value> = output
            .lines()
            .map(|l| serde_json::from_str(l).unwrap())
            .collect();

        let mut ids: Vec<i64> = responses.iter().map(|r| r["id"].as_i64().unwrap()).collect();
        ids.sort();
        assert_eq!(ids, vec![1, 2]);
        assert!(responses.iter().all(|r| r["result"] == json!({})));
    }
}
