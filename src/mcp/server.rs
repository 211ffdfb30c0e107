//! The central Model Context Protocol engine
//!
//! Provides the MCP JSON-RPC decoding, method execution routing and capabilities
//! negotiation (`initialize`) shared by the stdio and SSE transports.

use rust_mcp_sdk::schema::{
    CallToolRequest, Implementation, InitializeRequest, InitializeResult, JsonrpcMessage,
    JsonrpcRequest, ListToolsRequest, ListToolsResult, PingRequest, ServerCapabilities,
    ServerCapabilitiesTools,
};
use serde_json::{json, Value};
use tracing::info;

use crate::domain::tools::{handle_tools_call, ToolHost};
use crate::errors::AppError;
use crate::mcp::rpc::{
    app_error_to_json_rpc, is_json_rpc_error, json_rpc_error, json_rpc_result,
    json_rpc_serialized_result, request_id_to_value, INVALID_PARAMS, INVALID_REQUEST,
};

/// Oldest first; the last entry is offered when the client asks for anything else.
pub const SUPPORTED_PROTOCOL_VERSIONS: [&str; 3] = ["2024-11-05", "2025-03-26", "2025-06-18"];
pub const LATEST_PROTOCOL_VERSION: &str = "2025-06-18";

/// True for a JSON-RPC message or a non-empty batch of them.
pub fn is_json_rpc_message(payload: &Value) -> bool {
    match payload {
        Value::Array(batch) => !batch.is_empty() && batch.iter().all(is_single_json_rpc_message),
        message => is_single_json_rpc_message(message),
    }
}

fn is_single_json_rpc_message(message: &Value) -> bool {
    message.is_object() && serde_json::from_value::<JsonrpcMessage>(message.clone()).is_ok()
}

/// Handles one decoded payload, which may be a single message or a batch.
pub async fn handle_json_rpc_payload(host: &dyn ToolHost, payload: Value) -> Option<Value> {
    let batch = match payload {
        Value::Array(batch) => batch,
        message => return handle_json_rpc_value(host, message).await,
    };

    if batch.is_empty() {
        return Some(json_rpc_error(None, INVALID_REQUEST, "Invalid Request"));
    }

    let mut responses = Vec::new();
    for item in batch {
        if let Some(response) = handle_json_rpc_value(host, item).await {
            responses.push(response);
        }
    }

    (!responses.is_empty()).then_some(Value::Array(responses))
}

pub async fn handle_json_rpc_value(host: &dyn ToolHost, payload: Value) -> Option<Value> {
    if !payload.is_object() {
        return Some(json_rpc_error(None, INVALID_REQUEST, "Invalid Request"));
    }

    let request_id = payload.get("id").cloned();
    let parsed: JsonrpcMessage = match serde_json::from_value(payload) {
        Ok(message) => message,
        Err(_) => return Some(json_rpc_error(request_id, INVALID_REQUEST, "Invalid Request")),
    };

    match parsed {
        JsonrpcMessage::Request(request) => {
            if let Err(error_response) = validate_request_shape(&request) {
                return Some(error_response);
            }

            let request_id = request_id_to_value(request.id);
            if request.method.trim().is_empty() {
                return Some(json_rpc_error(
                    Some(request_id),
                    INVALID_REQUEST,
                    "Invalid Request",
                ));
            }

            Some(
                handle_json_rpc_request(
                    host,
                    Some(request_id),
                    request.method,
                    request.params.map(Value::Object),
                )
                .await,
            )
        }
        JsonrpcMessage::Notification(notification) => {
            info!(method = %notification.method, "mcp notification received");
            None
        }
        JsonrpcMessage::ResultResponse(_) | JsonrpcMessage::ErrorResponse(_) => {
            Some(json_rpc_error(request_id, INVALID_REQUEST, "Invalid Request"))
        }
    }
}

pub fn validate_request_shape(request: &JsonrpcRequest) -> Result<(), Value> {
    let payload = serde_json::to_value(request).expect("jsonrpc request serialization");
    let request_id = Some(request_id_to_value(request.id.clone()));

    let valid = match request.method.as_str() {
        "tools/call" => serde_json::from_value::<CallToolRequest>(payload).is_ok(),
        "tools/list" => serde_json::from_value::<ListToolsRequest>(payload).is_ok(),
        "ping" => serde_json::from_value::<PingRequest>(payload).is_ok(),
        "initialize" => serde_json::from_value::<InitializeRequest>(payload).is_ok(),
        _ => true,
    };

    if valid {
        Ok(())
    } else {
        Err(json_rpc_error(request_id, INVALID_PARAMS, "Invalid params"))
    }
}

pub async fn handle_json_rpc_request(
    host: &dyn ToolHost,
    id: Option<Value>,
    method: String,
    params: Option<Value>,
) -> Value {
    let audit_params = summarize_audit_params(params.as_ref());

    let response = match method.as_str() {
        "initialize" => {
            let protocol_version = match negotiate_protocol_version(params.as_ref()) {
                Ok(version) => version,
                Err(err) => return app_error_to_json_rpc(id, err),
            };

            let initialize_result = InitializeResult {
                server_info: Implementation {
                    name: env!("CARGO_PKG_NAME").to_string(),
                    version: env!("CARGO_PKG_VERSION").to_string(),
                    title: None,
                    description: None,
                    icons: vec![],
                    website_url: None,
                },
                capabilities: ServerCapabilities {
                    tools: Some(ServerCapabilitiesTools {
                        list_changed: Some(false),
                    }),
                    resources: None,
                    prompts: None,
                    ..Default::default()
                },
                protocol_version: protocol_version.to_string(),
                instructions: None,
                meta: None,
            };

            json_rpc_serialized_result(id, &initialize_result)
        }
        "ping" => json_rpc_result(id, json!({})),
        "tools/list" => json_rpc_serialized_result(
            id,
            &ListToolsResult {
                meta: None,
                next_cursor: None,
                tools: host.list_tools(),
            },
        ),
        "tools/call" => handle_tools_call(host, id, params).await,
        _ => app_error_to_json_rpc(
            id,
            AppError::not_found("method_not_found", "Method not found"),
        ),
    };

    info!(
        method = %method,
        params = %audit_params,
        outcome = if is_json_rpc_error(&response) { "failure" } else { "success" },
        "mcp action audited"
    );

    response
}

/// Picks the client's version when supported, otherwise the latest one we speak.
pub fn negotiate_protocol_version(params: Option<&Value>) -> Result<&'static str, AppError> {
    let offered_version = params
        .and_then(Value::as_object)
        .and_then(|object| object.get("protocolVersion"))
        .and_then(Value::as_str)
        .map(str::trim)
        .filter(|version| !version.is_empty())
        .ok_or_else(|| {
            AppError::bad_request(
                "invalid_protocol_version",
                "initialize params.protocolVersion is required",
            )
        })?;

    Ok(SUPPORTED_PROTOCOL_VERSIONS
        .into_iter()
        .find(|version| *version == offered_version)
        .unwrap_or(LATEST_PROTOCOL_VERSION))
}

/// Replaces analyzed text with its length so audit lines stay small.
pub fn summarize_audit_params(params: Option<&Value>) -> Value {
    params.map(summarize_audit_value).unwrap_or(Value::Null)
}

pub fn summarize_audit_value(value: &Value) -> Value {
    match value {
        Value::Object(map) => Value::Object(
            map.iter()
                .map(|(key, item)| match item {
                    Value::String(text) if key == "text" => (
                        key.clone(),
                        Value::String(format!("[{} chars]", text.chars().count())),
                    ),
                    _ => (key.clone(), summarize_audit_value(item)),
                })
                .collect(),
        ),
        Value::Array(items) => Value::Array(items.iter().map(summarize_audit_value).collect()),
        _ => value.clone(),
    }
}
