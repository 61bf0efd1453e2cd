//! MCP server implementation.
//!
//! Handles JSON-RPC 2.0 over stdio according to the MCP protocol specification.
//! Each request runs on its own task; responses are written by a single writer task.

use std::sync::Arc;

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value as JsonValue};
use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader};
use tokio::sync::mpsc;
use tracing::{debug, warn};

use crate::error::{rpc_codes, McpError, Result};
use crate::session::GeoSession;
use crate::tools::ToolRegistry;

/// MCP protocol version we support.
const PROTOCOL_VERSION: &str = "2024-11-05";

/// Server information.
const SERVER_NAME: &str = "geoportal-mcp";
const SERVER_VERSION: &str = env!("CARGO_PKG_VERSION");

/// JSON-RPC 2.0 request.
#[derive(Debug, Deserialize)]
pub struct JsonRpcRequest {
    /// Protocol version, must be "2.0".
    pub jsonrpc: String,
    /// Request id; absent for notifications. An explicit `null` is `Some(Null)`.
    #[serde(default, deserialize_with = "present_id")]
    pub id: Option<JsonValue>,
    /// Method name.
    pub method: String,
    /// Method parameters.
    #[serde(default)]
    pub params: Option<JsonValue>,
}

fn present_id<'de, D>(deserializer: D) -> std::result::Result<Option<JsonValue>, D::Error>
where
    D: serde::Deserializer<'de>,
{
    JsonValue::deserialize(deserializer).map(Some)
}

/// JSON-RPC 2.0 response.
#[derive(Debug, Serialize)]
pub struct JsonRpcResponse {
    /// Protocol version, always "2.0".
    pub jsonrpc: String,
    /// Id of the request this answers.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub id: Option<JsonValue>,
    /// Result on success.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub result: Option<JsonValue>,
    /// Error on failure.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<JsonRpcError>,
}

/// JSON-RPC 2.0 error object.
#[derive(Debug, Serialize)]
pub struct JsonRpcError {
    /// JSON-RPC error code.
    pub code: i32,
    /// Human-readable message.
    pub message: String,
    /// Additional error details.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<JsonValue>,
}

impl JsonRpcResponse {
    /// Create a success response.
    pub fn success(id: Option<JsonValue>, result: JsonValue) -> Self {
        Self {
            jsonrpc: "2.0".to_string(),
            id,
            result: Some(result),
            error: None,
        }
    }

    /// Create an error response.
    pub fn error(id: Option<JsonValue>, code: i32, message: String) -> Self {
        Self {
            jsonrpc: "2.0".to_string(),
            id,
            result: None,
            error: Some(JsonRpcError {
                code,
                message,
                data: None,
            }),
        }
    }

    /// Create an error response from an McpError.
    pub fn from_error(id: Option<JsonValue>, err: McpError) -> Self {
        let mut response = Self::error(id, err.rpc_code(), err.to_string());
        if let Some(error) = response.error.as_mut() {
            error.data = Some(serde_json::json!({ "kind": err.kind() }));
        }
        response
    }
}

/// MCP server.
///
/// Cloning is cheap; clones share the session and registry.
#[derive(Clone)]
pub struct McpServer {
    session: Arc<GeoSession>,
    registry: Arc<ToolRegistry>,
}

impl McpServer {
    /// Create a new MCP server with the given session.
    pub fn new(session: GeoSession) -> Self {
        Self {
            session: Arc::new(session),
            registry: Arc::new(ToolRegistry::new()),
        }
    }

    /// Run the server, reading from stdin and writing to stdout.
    pub async fn run(&self) -> Result<()> {
        let (tx, mut rx) = mpsc::unbounded_channel::<JsonRpcResponse>();

        let writer = tokio::spawn(async move {
            let mut stdout = tokio::io::stdout();
            while let Some(response) = rx.recv().await {
                let response_json = serde_json::to_string(&response)?;
                stdout.write_all(response_json.as_bytes()).await?;
                stdout.write_all(b"\n").await?;
                stdout.flush().await?;
            }
            Ok::<(), McpError>(())
        });

        let mut reader = BufReader::new(tokio::io::stdin());
        let mut line = String::new();

        loop {
            line.clear();
            let bytes_read = reader.read_line(&mut line).await?;

            if bytes_read == 0 {
                // EOF - client disconnected
                break;
            }

            let line = line.trim();
            if line.is_empty() {
                continue;
            }

            let request = match serde_json::from_str::<JsonRpcRequest>(line) {
                Ok(request) => request,
                Err(e) => {
                    let response = JsonRpcResponse::error(
                        None,
                        rpc_codes::PARSE_ERROR,
                        format!("Parse error: {}", e),
                    );
                    if tx.send(response).is_err() {
                        break;
                    }
                    continue;
                }
            };

            let server = self.clone();
            let tx = tx.clone();
            tokio::spawn(async move {
                if let Some(response) = server.handle_request(request).await {
                    if tx.send(response).is_err() {
                        warn!("Response dropped, writer has stopped");
                    }
                }
            });
        }

        // Writer finishes once every in-flight request has sent its response
        drop(tx);
        writer.await?
    }

    /// Handle a single JSON-RPC request.
    ///
    /// Returns `None` for notifications, which get no response.
    pub async fn handle_request(&self, request: JsonRpcRequest) -> Option<JsonRpcResponse> {
        // Validate JSON-RPC version
        if request.jsonrpc != "2.0" {
            return Some(JsonRpcResponse::error(
                request.id,
                rpc_codes::INVALID_REQUEST,
                "Invalid JSON-RPC version".to_string(),
            ));
        }

        if request.id.is_none() {
            debug!(method = %request.method, "Notification received");
            return None;
        }

        // Route to appropriate handler
        let response = match request.method.as_str() {
            "initialize" => self.handle_initialize(request),
            "tools/list" => self.handle_tools_list(request),
            "tools/call" => self.handle_tools_call(request).await,
            "ping" => JsonRpcResponse::success(request.id, serde_json::json!({})),
            _ => JsonRpcResponse::error(
                request.id,
                rpc_codes::METHOD_NOT_FOUND,
                format!("Unknown method: {}", request.method),
            ),
        };
        Some(response)
    }

    /// Handle the initialize request.
    fn handle_initialize(&self, request: JsonRpcRequest) -> JsonRpcResponse {
        JsonRpcResponse::success(
            request.id,
            serde_json::json!({
                "protocolVersion": PROTOCOL_VERSION,
                "capabilities": {
                    "tools": {}
                },
                "serverInfo": {
                    "name": SERVER_NAME,
                    "version": SERVER_VERSION
                }
            }),
        )
    }

    /// Handle the tools/list request.
    fn handle_tools_list(&self, request: JsonRpcRequest) -> JsonRpcResponse {
        let tools: Vec<JsonValue> = self
            .registry
            .tools()
            .iter()
            .map(|t| {
                serde_json::json!({
                    "name": t.name,
                    "description": t.description,
                    "inputSchema": t.input_schema
                })
            })
            .collect();

        JsonRpcResponse::success(request.id, serde_json::json!({ "tools": tools }))
    }

    /// Handle the tools/call request.
    async fn handle_tools_call(&self, request: JsonRpcRequest) -> JsonRpcResponse {
        // Extract name and arguments from params
        let params = match &request.params {
            Some(JsonValue::Object(obj)) => obj,
            _ => {
                return JsonRpcResponse::error(
                    request.id,
                    rpc_codes::INVALID_PARAMS,
                    "Missing params object".to_string(),
                )
            }
        };

        let name = match params.get("name").and_then(|v| v.as_str()) {
            Some(n) => n.to_string(),
            None => {
                return JsonRpcResponse::error(
                    request.id,
                    rpc_codes::INVALID_PARAMS,
                    "Missing 'name' in params".to_string(),
                )
            }
        };

        let arguments = match params.get("arguments") {
            Some(JsonValue::Object(obj)) => obj.clone(),
            Some(JsonValue::Null) | None => Map::new(),
            _ => {
                return JsonRpcResponse::error(
                    request.id,
                    rpc_codes::INVALID_PARAMS,
                    "'arguments' must be an object".to_string(),
                )
            }
        };

        debug!(tool = %name, "Calling tool");

        // Dispatch the tool call
        match self.registry.dispatch(&self.session, &name, arguments).await {
            Ok(result) => {
                // Text results (e.g. XML extracts) are passed through as-is
                let text = match result {
                    JsonValue::String(s) => s,
                    other => serde_json::to_string(&other).unwrap_or_else(|_| "null".to_string()),
                };

                // MCP tool responses are wrapped in content array
                JsonRpcResponse::success(
                    request.id,
                    serde_json::json!({
                        "content": [{
                            "type": "text",
                            "text": text
                        }]
                    }),
                )
            }
            Err(err) => {
                warn!(tool = %name, error = %err, "Tool call failed");
                JsonRpcResponse::from_error(request.id, err)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::GeoportalConfig;

    fn test_server() -> McpServer {
        let session = GeoSession::new(&GeoportalConfig::default()).unwrap();
        McpServer::new(session)
    }

    fn request(value: JsonValue) -> JsonRpcRequest {
        serde_json::from_value(value).unwrap()
    }

    #[test]
    fn test_json_rpc_response_success() {
        let response = JsonRpcResponse::success(Some(JsonValue::Number(1.into())), serde_json::json!({"ok": true}));
        let json = serde_json::to_string(&response).unwrap();
        assert!(json.contains("\"result\""));
        assert!(!json.contains("\"error\""));
    }

    #[test]
    fn test_json_rpc_response_error() {
        let response = JsonRpcResponse::error(Some(JsonValue::Number(1.into())), -32600, "Invalid".to_string());
        let json = serde_json::to_string(&response).unwrap();
        assert!(json.contains("\"error\""));
        assert!(!json.contains("\"result\""));
    }

    #[test]
    fn test_error_response_carries_kind() {
        let response = JsonRpcResponse::from_error(
            Some(JsonValue::Number(7.into())),
            McpError::NotFound("no search results for 'x'".to_string()),
        );
        let json = serde_json::to_value(&response).unwrap();
        assert_eq!(json["error"]["code"], rpc_codes::INVALID_PARAMS);
        assert_eq!(json["error"]["data"]["kind"], "NOT_FOUND");
    }

    #[tokio::test]
    async fn test_initialize() {
        let server = test_server();
        let response = server
            .handle_request(request(serde_json::json!({
                "jsonrpc": "2.0", "id": 1, "method": "initialize", "params": {}
            })))
            .await
            .unwrap();
        let result = response.result.unwrap();
        assert_eq!(result["protocolVersion"], PROTOCOL_VERSION);
        assert_eq!(result["serverInfo"]["name"], SERVER_NAME);
    }

    #[tokio::test]
    async fn test_notification_gets_no_response() {
        let server = test_server();
        let response = server
            .handle_request(request(serde_json::json!({
                "jsonrpc": "2.0", "method": "notifications/initialized"
            })))
            .await;
        assert!(response.is_none());
    }

    #[tokio::test]
    async fn test_null_id_is_answered() {
        let server = test_server();
        let response = server
            .handle_request(request(serde_json::json!({
                "jsonrpc": "2.0", "id": null, "method": "ping"
            })))
            .await
            .unwrap();
        let json = serde_json::to_value(&response).unwrap();
        assert!(json.as_object().unwrap().contains_key("id"));
        assert_eq!(json["id"], JsonValue::Null);
        assert_eq!(json["result"], serde_json::json!({}));
    }

    #[tokio::test]
    async fn test_tools_list() {
        let server = test_server();
        let response = server
            .handle_request(request(serde_json::json!({
                "jsonrpc": "2.0", "id": 2, "method": "tools/list"
            })))
            .await
            .unwrap();
        let tools = response.result.unwrap()["tools"].as_array().unwrap().clone();
        assert!(tools.iter().any(|t| t["name"] == "geo_resolve_address"));
        assert!(tools.iter().all(|t| t["inputSchema"]["type"] == "object"));
    }

    #[tokio::test]
    async fn test_unknown_method_and_version() {
        let server = test_server();
        let response = server
            .handle_request(request(serde_json::json!({
                "jsonrpc": "2.0", "id": 3, "method": "resources/list"
            })))
            .await
            .unwrap();
        assert_eq!(response.error.unwrap().code, rpc_codes::METHOD_NOT_FOUND);

        let response = server
            .handle_request(request(serde_json::json!({
                "jsonrpc": "1.0", "id": 4, "method": "ping"
            })))
            .await
            .unwrap();
        assert_eq!(response.error.unwrap().code, rpc_codes::INVALID_REQUEST);
    }

    #[tokio::test]
    async fn test_tools_call_validates_arguments() {
        let server = test_server();
        let response = server
            .handle_request(request(serde_json::json!({
                "jsonrpc": "2.0", "id": 5, "method": "tools/call",
                "params": { "name": "oereb_extract", "arguments": { "egrid": "not-an-egrid" } }
            })))
            .await
            .unwrap();
        let error = response.error.unwrap();
        assert_eq!(error.code, rpc_codes::INVALID_PARAMS);
        assert_eq!(error.data.unwrap()["kind"], "INVALID_ARG");

        let response = server
            .handle_request(request(serde_json::json!({
                "jsonrpc": "2.0", "id": 6, "method": "tools/call",
                "params": { "name": "geo_unknown" }
            })))
            .await
            .unwrap();
        assert_eq!(response.error.unwrap().code, rpc_codes::METHOD_NOT_FOUND);
    }
}
