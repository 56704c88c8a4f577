//! Stored responses.

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use url::Url;

use super::hash::compute_cache_key;
use crate::request::{InterceptedRequest, Response};

/// A response snapshot stored under its request key.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
pub struct CacheEntry {
    pub key: String,
    pub method: String,
    pub url: String,
    pub response: Response,
    pub stored_at: String,
}

impl CacheEntry {
    /// Snapshot `response` for `request`, stamped with the current time.
    pub fn new(request: &InterceptedRequest, response: Response) -> Self {
        Self::for_url(&request.method, &request.url, response)
    }

    pub fn for_url(method: &str, url: &Url, response: Response) -> Self {
        let mut url = url.clone();
        url.set_fragment(None);
        Self {
            key: compute_cache_key(method, &url),
            method: method.to_ascii_uppercase(),
            url: url.to_string(),
            response,
            stored_at: chrono::Utc::now().to_rfc3339(),
        }
    }
}
