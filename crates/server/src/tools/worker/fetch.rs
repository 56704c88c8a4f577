//! sw_fetch tool implementation.
//!
//! Sends one request through the cache manager as if a page had made it.

use rmcp::{ErrorData as McpError, model::CallToolResult};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use shellcache_client::{CacheManager, Route, fetch::resolve};
use shellcache_core::{Error, Headers, InterceptedRequest, RequestMode};

use crate::error::ToolError;
use crate::tools::{ResponseView, json_result};

/// Parameters for the sw_fetch tool.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct SwFetchParams {
    /// Absolute URL, or a path resolved against the site origin.
    pub url: String,

    /// HTTP method (default: GET).
    #[serde(default = "default_method")]
    pub method: String,

    /// Request mode; "navigate" marks a top-level page load.
    #[serde(default)]
    pub mode: RequestMode,

    /// Extra request headers.
    #[serde(default)]
    pub headers: Headers,

    /// Request body, sent as UTF-8.
    #[serde(default)]
    pub body: Option<String>,
}

fn default_method() -> String {
    "GET".into()
}

/// Output from the sw_fetch tool.
#[derive(Debug, Clone, Serialize, JsonSchema)]
pub struct SwFetchOutput {
    pub url: String,
    pub method: String,
    pub route: Route,
    pub response: ResponseView,
}

/// Implementation of the sw_fetch tool.
pub async fn fetch_impl(manager: &CacheManager, params: SwFetchParams) -> Result<CallToolResult, McpError> {
    if params.method.is_empty() || !params.method.bytes().all(|b| b.is_ascii_alphabetic()) {
        return Err(ToolError::InvalidInput(format!("unsupported method: {:?}", params.method)).into());
    }

    let url = resolve(manager.origin(), &params.url).map_err(Error::from)?;

    let mut request = match params.mode {
        RequestMode::Navigate => InterceptedRequest::navigate(url),
        mode => InterceptedRequest::get(url).with_mode(mode),
    }
    .with_method(params.method);

    for (name, value) in params.headers {
        request = request.with_header(&name, value);
    }
    if let Some(body) = params.body {
        request = request.with_body(body.into_bytes());
    }

    let served = manager.fetch(&request).await?;

    let output = SwFetchOutput {
        url: request.url.to_string(),
        method: request.method.clone(),
        route: served.route,
        response: ResponseView::from(&served.response),
    };
    json_result(&output)
}
