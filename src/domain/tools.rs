//! Tools exposed via Model Context Protocol
//!
//! Provides the `ToolHost` seam the transports call into, and the
//! `info-extractor` implementation backed by the text analyzer.

use async_trait::async_trait;
use rust_mcp_sdk::{
    macros,
    schema::{CallToolRequestParams, CallToolResult, ContentBlock, TextContent, Tool},
};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use tracing::debug;

use crate::domain::analyzer::{analyze, AnalysisRequest};
use crate::errors::ToolError;
use crate::mcp::rpc::{json_rpc_error, json_rpc_serialized_result};

pub const INFO_EXTRACTOR_TOOL_NAME: &str = "info-extractor";

#[macros::mcp_tool(
    name = "info-extractor",
    title = "Information Extractor",
    description = "Extracts key information from any text."
)]
#[derive(Debug, Deserialize, Serialize, macros::JsonSchema)]
pub struct InfoExtractorTool {
    /// The block of text to analyze.
    pub text: String,
}

/// Tool registry as seen by a transport: list what is available, invoke by name.
#[async_trait]
pub trait ToolHost: Send + Sync {
    fn list_tools(&self) -> Vec<Tool>;

    async fn invoke(
        &self,
        name: &str,
        arguments: Option<&Map<String, Value>>,
    ) -> Result<CallToolResult, ToolError>;
}

#[derive(Debug, Clone, Copy, Default)]
pub struct InfoExtractor;

impl InfoExtractor {
    pub fn new() -> Self {
        Self
    }
}

#[async_trait]
impl ToolHost for InfoExtractor {
    fn list_tools(&self) -> Vec<Tool> {
        vec![InfoExtractorTool::tool()]
    }

    async fn invoke(
        &self,
        name: &str,
        arguments: Option<&Map<String, Value>>,
    ) -> Result<CallToolResult, ToolError> {
        if name != INFO_EXTRACTOR_TOOL_NAME {
            return Err(ToolError::UnknownTool {
                name: name.to_string(),
            });
        }

        let request = AnalysisRequest::from_arguments(arguments)?;
        let result = analyze(&request.text);
        debug!(
            characters = result.character_count,
            words = result.word_count,
            sentences = result.sentence_count,
            "text analyzed"
        );

        Ok(text_result(result.report(), false))
    }
}

fn text_result(text: String, is_error: bool) -> CallToolResult {
    CallToolResult {
        content: vec![ContentBlock::from(TextContent::new(text, None, None))],
        is_error: is_error.then_some(true),
        meta: None,
        structured_content: None,
    }
}

pub fn tool_error_result(err: &ToolError) -> CallToolResult {
    text_result(err.to_string(), true)
}

pub async fn handle_tools_call(
    host: &dyn ToolHost,
    id: Option<Value>,
    params: Option<Value>,
) -> Value {
    let Some(raw_params) = params else {
        return json_rpc_error(id, -32602, "Invalid params");
    };

    let tool_call: CallToolRequestParams = match serde_json::from_value(raw_params) {
        Ok(value) => value,
        Err(_) => return json_rpc_error(id, -32602, "Invalid params"),
    };

    let result = match host
        .invoke(&tool_call.name, tool_call.arguments.as_ref())
        .await
    {
        Ok(result) => result,
        Err(err) => {
            debug!(tool = %tool_call.name, error = %err, "tool invocation rejected");
            tool_error_result(&err)
        }
    };

    json_rpc_serialized_result(id, &result)
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    fn first_text(result: &CallToolResult) -> String {
        let value = serde_json::to_value(result).expect("tool result serialization");
        value["content"][0]["text"]
            .as_str()
            .expect("text content")
            .to_string()
    }

    #[test]
    fn lists_single_info_extractor_descriptor() {
        let tools = InfoExtractor::new().list_tools();
        assert_eq!(tools.len(), 1);

        let descriptor = serde_json::to_value(&tools[0]).expect("tool serialization");
        assert_eq!(descriptor["name"], "info-extractor");
        assert_eq!(descriptor["title"], "Information Extractor");
        assert_eq!(
            descriptor["description"],
            "Extracts key information from any text."
        );
        assert_eq!(descriptor["inputSchema"]["type"], "object");
        assert_eq!(descriptor["inputSchema"]["required"], json!(["text"]));
        assert_eq!(
            descriptor["inputSchema"]["properties"]["text"]["type"],
            "string"
        );
    }

    #[test]
    fn descriptor_is_stable_across_calls() {
        let host = InfoExtractor::new();
        let first = serde_json::to_value(host.list_tools()).expect("tool serialization");
        let second = serde_json::to_value(host.list_tools()).expect("tool serialization");
        assert_eq!(first, second);
    }

    #[tokio::test]
    async fn invoke_returns_report_as_text_block() {
        let arguments = json!({ "text": "Hello world. How are you?" });
        let result = InfoExtractor::new()
            .invoke("info-extractor", arguments.as_object())
            .await
            .expect("invocation should succeed");

        assert_eq!(result.is_error, None);
        assert_eq!(result.content.len(), 1);
        assert_eq!(
            first_text(&result),
            "--- Analysis Complete ---\n\
             Character Count: 25\n\
             Word Count: 5\n\
             Sentence Count: 2\n\
             Estimated Reading Time: 0.03 minutes"
        );
    }

    #[tokio::test]
    async fn invoke_accepts_empty_text() {
        let arguments = json!({ "text": "" });
        let result = InfoExtractor::new()
            .invoke("info-extractor", arguments.as_object())
            .await
            .expect("invocation should succeed");

        assert!(first_text(&result).ends_with("Estimated Reading Time: 0.0 minutes"));
    }

    #[tokio::test]
    async fn invoke_rejects_unknown_tool_regardless_of_arguments() {
        let arguments = json!({ "text": "anything" });
        let host = InfoExtractor::new();

        for args in [arguments.as_object(), None] {
            let err = host
                .invoke("unknown-tool", args)
                .await
                .expect_err("unknown tool must fail");
            assert!(matches!(err, ToolError::UnknownTool { ref name } if name == "unknown-tool"));
        }
    }

    #[tokio::test]
    async fn invoke_rejects_missing_text() {
        let arguments = json!({ "content": "hello" });
        let err = InfoExtractor::new()
            .invoke("info-extractor", arguments.as_object())
            .await
            .expect_err("missing text must fail");

        assert_eq!(err, ToolError::MissingArgument { argument: "text" });
    }

    #[tokio::test]
    async fn tools_call_reports_tool_errors_in_result() {
        let response = handle_tools_call(
            &InfoExtractor::new(),
            Some(json!(7)),
            Some(json!({ "name": "unknown-tool", "arguments": { "text": "hi" } })),
        )
        .await;

        assert_eq!(response["id"], 7);
        assert_eq!(response["result"]["isError"], true);
        assert_eq!(
            response["result"]["content"][0]["text"],
            "Unknown tool: unknown-tool"
        );
    }

    #[tokio::test]
    async fn tools_call_without_params_is_invalid() {
        let response = handle_tools_call(&InfoExtractor::new(), Some(json!(8)), None).await;

        assert_eq!(response["error"]["code"], -32602);
    }
}
