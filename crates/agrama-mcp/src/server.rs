//! Request routing: initialize handshake, tool listing, and tool calls
//! mapped onto the primitive engine.

use std::sync::Arc;

use serde_json::{json, Value};
use tracing::{debug, info, warn};

use agrama_core::errors::EngineError;
use agrama_core::time::Deadline;
use agrama_engine::AgramaEngine;

use crate::protocol::types::{JsonRpcError, JsonRpcRequest, JsonRpcResponse, PROTOCOL_VERSION};
use crate::tools;

pub struct McpServer {
    engine: Arc<AgramaEngine>,
    initialized: bool,
    /// Agent identity used when a call carries none.
    default_agent: String,
}

impl McpServer {
    pub fn new(engine: Arc<AgramaEngine>) -> Self {
        Self {
            engine,
            initialized: false,
            default_agent: "anonymous".to_string(),
        }
    }

    /// Handle one request. Notifications return `None`.
    pub fn handle_request(&mut self, request: JsonRpcRequest) -> Option<JsonRpcResponse> {
        debug!(method = %request.method, "handling request");

        if !self.initialized
            && request.method != "initialize"
            && request.method != "notifications/initialized"
        {
            warn!(method = %request.method, "request before initialize");
            return Some(JsonRpcResponse::error(
                request.id,
                JsonRpcError::invalid_request("server not initialized"),
            ));
        }

        let result = match request.method.as_str() {
            "initialize" => self.handle_initialize(request.params.as_ref()),
            "notifications/initialized" => return None,
            "tools/list" => Ok(json!({ "tools": tools::descriptions() })),
            "tools/call" => self.handle_tools_call(request.params.as_ref()),
            "ping" => Ok(json!({})),
            method => Err(JsonRpcError::method_not_found(method)),
        };

        Some(match result {
            Ok(result) => JsonRpcResponse::success(request.id, result),
            Err(error) => JsonRpcResponse::error(request.id, error),
        })
    }

    fn handle_initialize(&mut self, params: Option<&Value>) -> Result<Value, JsonRpcError> {
        let client = params
            .and_then(|p| p.get("clientInfo"))
            .and_then(|c| c.get("name"))
            .and_then(Value::as_str)
            .unwrap_or("unknown");
        info!(client, "initialize");
        self.initialized = true;

        Ok(json!({
            "protocolVersion": PROTOCOL_VERSION,
            "capabilities": { "tools": {} },
            "serverInfo": {
                "name": "agrama",
                "version": agrama_core::constants::VERSION,
            }
        }))
    }

    fn handle_tools_call(&self, params: Option<&Value>) -> Result<Value, JsonRpcError> {
        let params = params.ok_or_else(|| JsonRpcError::invalid_params("params required"))?;
        let name = params
            .get("name")
            .and_then(Value::as_str)
            .ok_or_else(|| JsonRpcError::invalid_params("tool name required"))?;
        let arguments = params.get("arguments").cloned().unwrap_or(json!({}));

        if name == "stats" {
            return Ok(tool_result(&self.engine.stats()));
        }

        // Backpressure: the transport sheds load above the configured
        // in-flight ceiling.
        let max_in_flight = self.engine.config().max_in_flight;
        if max_in_flight > 0 && self.engine.queue_depth() >= max_in_flight {
            let err = EngineError::ResourceExhausted {
                in_flight: self.engine.queue_depth(),
                max: max_in_flight,
            };
            return Err(JsonRpcError::tool_error("engine", &err.to_string()));
        }

        let agent_id = arguments
            .get("agent_id")
            .and_then(Value::as_str)
            .unwrap_or(&self.default_agent)
            .to_string();
        let deadline = arguments
            .get("deadline_ms")
            .and_then(Value::as_u64)
            .map(Deadline::after_millis)
            .unwrap_or_else(Deadline::none);

        match self.engine.invoke(name, &arguments, &agent_id, deadline) {
            Ok(result) => Ok(tool_result(&result)),
            Err(err) => {
                let kind = err.kind();
                if kind == "validation" {
                    Err(JsonRpcError::invalid_params(&err.to_string()))
                } else {
                    Err(JsonRpcError::tool_error(kind, &err.to_string()))
                }
            }
        }
    }
}

/// Wrap a primitive result in the tools/call content envelope.
fn tool_result(value: &Value) -> Value {
    json!({
        "content": [{
            "type": "text",
            "text": value.to_string(),
        }],
        "isError": false,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use agrama_core::config::EngineConfig;

    fn server() -> McpServer {
        McpServer::new(Arc::new(AgramaEngine::new(EngineConfig::standard())))
    }

    fn request(method: &str, params: Value) -> JsonRpcRequest {
        JsonRpcRequest {
            jsonrpc: "2.0".to_string(),
            id: Some(1.into()),
            method: method.to_string(),
            params: Some(params),
        }
    }

    fn initialize(server: &mut McpServer) {
        let response = server
            .handle_request(request("initialize", json!({})))
            .unwrap();
        assert!(response.error.is_none());
    }

    #[test]
    fn initialize_reports_protocol_version() {
        let mut s = server();
        let response = s.handle_request(request("initialize", json!({}))).unwrap();
        let result = response.result.unwrap();
        assert_eq!(result["protocolVersion"], PROTOCOL_VERSION);
        assert_eq!(result["serverInfo"]["name"], "agrama");
    }

    #[test]
    fn requests_before_initialize_are_rejected() {
        let mut s = server();
        let response = s.handle_request(request("tools/list", json!({}))).unwrap();
        assert_eq!(response.error.unwrap().code, -32600);
    }

    #[test]
    fn initialized_notification_has_no_response() {
        let mut s = server();
        initialize(&mut s);
        let notification = JsonRpcRequest {
            jsonrpc: "2.0".to_string(),
            id: None,
            method: "notifications/initialized".to_string(),
            params: None,
        };
        assert!(s.handle_request(notification).is_none());
    }

    #[test]
    fn tools_list_contains_the_primitives() {
        let mut s = server();
        initialize(&mut s);
        let response = s.handle_request(request("tools/list", json!({}))).unwrap();
        let tools = response.result.unwrap()["tools"].clone();
        assert!(tools.as_array().unwrap().len() >= 5);
    }

    #[test]
    fn tools_call_round_trips_store_and_retrieve() {
        let mut s = server();
        initialize(&mut s);

        let response = s
            .handle_request(request(
                "tools/call",
                json!({"name": "store", "arguments": {"key": "doc/a.txt", "value": "hello", "agent_id": "x"}}),
            ))
            .unwrap();
        assert!(response.error.is_none(), "{:?}", response.error);

        let response = s
            .handle_request(request(
                "tools/call",
                json!({"name": "retrieve", "arguments": {"key": "doc/a.txt"}}),
            ))
            .unwrap();
        let text = response.result.unwrap()["content"][0]["text"]
            .as_str()
            .unwrap()
            .to_string();
        let value: Value = serde_json::from_str(&text).unwrap();
        assert_eq!(value["value"], "hello");
    }

    #[test]
    fn unknown_method_is_32601() {
        let mut s = server();
        initialize(&mut s);
        let response = s.handle_request(request("bogus/method", json!({}))).unwrap();
        assert_eq!(response.error.unwrap().code, -32601);
    }

    #[test]
    fn validation_failures_map_to_invalid_params() {
        let mut s = server();
        initialize(&mut s);
        let response = s
            .handle_request(request(
                "tools/call",
                json!({"name": "store", "arguments": {"key": "../evil", "value": "x"}}),
            ))
            .unwrap();
        assert_eq!(response.error.unwrap().code, -32602);
    }

    #[test]
    fn not_found_maps_to_tool_error_with_kind() {
        let mut s = server();
        initialize(&mut s);
        let response = s
            .handle_request(request(
                "tools/call",
                json!({"name": "retrieve", "arguments": {"key": "doc/missing.txt"}}),
            ))
            .unwrap();
        let error = response.error.unwrap();
        assert_eq!(error.code, -32000);
        assert_eq!(error.data.unwrap()["kind"], "not_found");
    }
}
