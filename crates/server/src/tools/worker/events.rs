//! sw_push, sw_notification_click and sw_sync tool implementations.

use rmcp::{ErrorData as McpError, model::CallToolResult};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use shellcache_client::worker::PushPayload;
use shellcache_client::{CacheManager, HostEvent, Notification, RecordedHost, SyncOutcome};

use crate::tools::json_result;

/// Parameters for the sw_push tool.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct SwPushParams {
    /// Raw push body, normally a JSON object with at least a `title`.
    #[serde(default)]
    pub data: Option<String>,
}

#[derive(Debug, Clone, Serialize, JsonSchema)]
pub struct SwPushOutput {
    /// The notification shown, if the payload was usable.
    pub notification: Option<Notification>,
    pub events: Vec<HostEvent>,
}

/// Parameters for the sw_notification_click tool.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct SwNotificationClickParams {
    /// Title of the clicked notification.
    pub title: String,

    /// Data attached to the notification; `url` is the page to open.
    #[serde(default)]
    pub data: Option<Value>,
}

#[derive(Debug, Clone, Serialize, JsonSchema)]
pub struct SwNotificationClickOutput {
    /// The notification as rebuilt from the click.
    pub notification: Notification,
    pub opened: String,
    pub events: Vec<HostEvent>,
}

/// Parameters for the sw_sync tool.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct SwSyncParams {
    /// Sync tag, e.g. "contact-form".
    pub tag: String,
}

#[derive(Debug, Clone, Serialize, JsonSchema)]
pub struct SwSyncOutput {
    pub tag: String,
    pub outcome: SyncOutcome,
}

/// Implementation of the sw_push tool.
pub async fn push_impl(
    manager: &CacheManager, host: &RecordedHost, params: SwPushParams,
) -> Result<CallToolResult, McpError> {
    let notification = manager.push(params.data.as_deref().map(str::as_bytes)).await;

    json_result(&SwPushOutput { notification, events: host.drain().await })
}

/// Implementation of the sw_notification_click tool.
pub async fn click_impl(
    manager: &CacheManager, host: &RecordedHost, params: SwNotificationClickParams,
) -> Result<CallToolResult, McpError> {
    let payload = PushPayload { title: params.title, body: String::new(), icon: None, data: params.data, actions: None };
    let notification = Notification::from_payload(payload, manager.notification_defaults());

    let opened = manager.notification_click(&notification).await;

    json_result(&SwNotificationClickOutput { notification, opened, events: host.drain().await })
}

/// Implementation of the sw_sync tool.
pub async fn sync_impl(manager: &CacheManager, params: SwSyncParams) -> Result<CallToolResult, McpError> {
    let outcome = manager.sync(&params.tag).await;

    json_result(&SwSyncOutput { tag: params.tag, outcome })
}
