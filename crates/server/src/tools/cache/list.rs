//! cache_list tool implementation.
//!
//! Lists every generation with the entries stored in it.

use rmcp::{ErrorData as McpError, model::CallToolResult};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use shellcache_client::CacheManager;

use crate::tools::json_result;

#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct EntrySummary {
    pub key: String,
    pub method: String,
    pub url: String,
    pub status: u16,
    pub stored_at: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct GenerationSummary {
    pub name: String,
    /// Whether this is the current static or dynamic generation.
    pub current: bool,
    pub entries: Vec<EntrySummary>,
}

/// Output from the cache_list tool.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct CacheListOutput {
    pub generations: Vec<GenerationSummary>,
}

/// Implementation of the cache_list tool.
pub async fn list_impl(manager: &CacheManager) -> Result<CallToolResult, McpError> {
    let storage = manager.storage();
    let mut generations = Vec::new();

    for name in storage.generations().await? {
        let entries = storage
            .entries(&name)
            .await?
            .into_iter()
            .map(|e| EntrySummary {
                key: e.key,
                method: e.method,
                url: e.url,
                status: e.response.status,
                stored_at: e.stored_at,
            })
            .collect();

        let current = name == manager.static_cache_name() || name == manager.dynamic_cache_name();
        generations.push(GenerationSummary { name, current, entries });
    }

    json_result(&CacheListOutput { generations })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tools::output_json;
    use crate::tools::testing::{active_fixture, fixture};
    use shellcache_core::CacheStorage;

    #[tokio::test]
    async fn test_list_empty() {
        let f = fixture();
        let output: CacheListOutput = serde_json::from_value(output_json(&list_impl(&f.manager).await.unwrap())).unwrap();
        assert!(output.generations.is_empty());
    }

    #[tokio::test]
    async fn test_list_after_install() {
        let f = active_fixture().await;
        f.storage.open("portfolio-dynamic-v2").await.unwrap();

        let output: CacheListOutput = serde_json::from_value(output_json(&list_impl(&f.manager).await.unwrap())).unwrap();

        assert_eq!(output.generations.len(), 2);
        let shell = &output.generations[0];
        assert_eq!(shell.name, "portfolio-static-v2");
        assert!(shell.current);
        assert_eq!(shell.entries.len(), 3);
        assert_eq!(shell.entries[0].url, "https://portfolio.example/");
        assert_eq!(shell.entries[0].status, 200);
        assert!(output.generations[1].entries.is_empty());
    }
}
