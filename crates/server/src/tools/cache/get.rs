//! cache_get tool implementation.
//!
//! Retrieves a stored response by method and URL.

use rmcp::{ErrorData as McpError, model::CallToolResult};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use shellcache_client::{CacheManager, fetch::resolve};
use shellcache_core::{Error, cache::hash::compute_cache_key};

use crate::tools::{ResponseView, json_result};

/// Parameters for the cache_get tool.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct CacheGetParams {
    /// Absolute URL, or a path resolved against the site origin.
    pub url: String,

    /// HTTP method the entry was stored under (default: GET).
    #[serde(default = "default_method")]
    pub method: String,

    /// Look only in this generation instead of all of them.
    #[serde(default)]
    pub generation: Option<String>,
}

fn default_method() -> String {
    "GET".into()
}

/// Output from the cache_get tool.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct CacheGetOutput {
    pub key: String,
    pub method: String,
    pub url: String,
    pub stored_at: String,
    pub response: ResponseView,
}

/// Implementation of the cache_get tool.
pub async fn get_impl(manager: &CacheManager, params: CacheGetParams) -> Result<CallToolResult, McpError> {
    let url = resolve(manager.origin(), &params.url).map_err(Error::from)?;
    let key = compute_cache_key(&params.method, &url);
    let storage = manager.storage();

    let entry = match &params.generation {
        Some(generation) => storage.get(generation, &key).await?,
        None => storage.match_any(&key).await?,
    }
    .ok_or_else(|| Error::CacheMiss(format!("{} {}", params.method.to_uppercase(), url)))?;

    let output = CacheGetOutput {
        response: ResponseView::from(&entry.response),
        key: entry.key,
        method: entry.method,
        url: entry.url,
        stored_at: entry.stored_at,
    };
    json_result(&output)
}
