//! MCP tool implementations.
//!
//! `sw_*` tools drive the cache manager through its lifecycle and events;
//! `cache_*` tools inspect what it has stored.

pub mod cache;
pub mod worker;

#[cfg(test)]
pub(crate) mod testing;

use rmcp::{
    ErrorData as McpError,
    model::{CallToolResult, Content},
};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use shellcache_core::{Headers, Response};

use crate::error::ToolError;

/// A response rendered for tool output. Bodies are shown as lossy UTF-8.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
pub struct ResponseView {
    pub status: u16,
    pub headers: Headers,
    pub body: String,
    /// Body length in bytes before any lossy decoding.
    pub bytes: usize,
}

impl From<&Response> for ResponseView {
    fn from(response: &Response) -> Self {
        Self {
            status: response.status,
            headers: response.headers.clone(),
            body: response.text(),
            bytes: response.body.len(),
        }
    }
}

/// Render `output` as pretty JSON text content.
pub(crate) fn json_result<T: Serialize>(output: &T) -> Result<CallToolResult, McpError> {
    let json = serde_json::to_string_pretty(output).map_err(ToolError::from)?;
    Ok(CallToolResult::success(vec![Content::text(json)]))
}

/// Pull the JSON text back out of a tool result.
#[cfg(test)]
pub(crate) fn output_json(result: &CallToolResult) -> serde_json::Value {
    let content = serde_json::to_value(&result.content[0]).unwrap();
    let text = content
        .get("text")
        .and_then(|v| v.as_str())
        .expect("Expected text field in content");
    serde_json::from_str(text).unwrap()
}
