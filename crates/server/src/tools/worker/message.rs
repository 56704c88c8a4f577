//! sw_message tool implementation.

use rmcp::{ErrorData as McpError, model::CallToolResult};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use shellcache_client::{CacheManager, HostEvent, LifecycleState, RecordedHost, VersionReply};
use tokio::sync::oneshot;

use crate::tools::json_result;

/// Parameters for the sw_message tool.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct SwMessageParams {
    /// Message as posted by a page, e.g. `{"type": "GET_VERSION"}`.
    pub message: Value,
}

/// Output from the sw_message tool.
#[derive(Debug, Clone, Serialize, JsonSchema)]
pub struct SwMessageOutput {
    /// False when the message type was not recognized.
    pub handled: bool,
    pub reply: Option<VersionReply>,
    pub state: LifecycleState,
    pub events: Vec<HostEvent>,
}

/// Implementation of the sw_message tool.
pub async fn message_impl(
    manager: &CacheManager, host: &RecordedHost, params: SwMessageParams,
) -> Result<CallToolResult, McpError> {
    let (port, mut reply) = oneshot::channel();

    let handled = manager.post_message(&params.message, Some(port)).await?;

    let output = SwMessageOutput {
        handled,
        reply: reply.try_recv().ok(),
        state: manager.state().await,
        events: host.drain().await,
    };
    json_result(&output)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tools::output_json;
    use crate::tools::testing::fixture;
    use serde_json::json;

    #[tokio::test]
    async fn test_get_version() {
        let f = fixture();

        let params = SwMessageParams { message: json!({"type": "GET_VERSION"}) };
        let output = output_json(&message_impl(&f.manager, &f.host, params).await.unwrap());

        assert_eq!(output["handled"], true);
        assert_eq!(output["reply"]["version"], "portfolio-static-v2");
    }

    #[tokio::test]
    async fn test_skip_waiting_activates() {
        let f = fixture();
        f.manager.install().await.unwrap();

        let params = SwMessageParams { message: json!({"type": "SKIP_WAITING"}) };
        let output = output_json(&message_impl(&f.manager, &f.host, params).await.unwrap());

        assert_eq!(output["state"], "activated");
        assert!(output["reply"].is_null());
        assert_eq!(output["events"][0]["event"], "clients_claimed");
    }

    #[tokio::test]
    async fn test_unknown_message() {
        let f = fixture();

        let params = SwMessageParams { message: json!({"type": "PURGE"}) };
        let output = output_json(&message_impl(&f.manager, &f.host, params).await.unwrap());

        assert_eq!(output["handled"], false);
    }
}
