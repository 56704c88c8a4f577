//! Push payloads and the notifications built from them.

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Button shown on a notification.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct NotificationAction {
    pub action: String,
    pub title: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub icon: Option<String>,
}

/// Body of a push message as sent by the application server.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct PushPayload {
    pub title: String,
    #[serde(default)]
    pub body: String,
    #[serde(default)]
    pub icon: Option<String>,
    /// Opaque data attached to the notification; `url` is opened on click.
    #[serde(default)]
    pub data: Option<Value>,
    #[serde(default)]
    pub actions: Option<Vec<NotificationAction>>,
}

impl PushPayload {
    /// Parse a raw push body. Absent or malformed payloads yield `None`.
    pub fn parse(data: Option<&[u8]>) -> Option<Self> {
        let bytes = data?;
        match serde_json::from_slice(bytes) {
            Ok(payload) => Some(payload),
            Err(e) => {
                tracing::debug!("ignoring unparseable push payload: {}", e);
                None
            }
        }
    }
}

/// Defaults applied to every notification.
#[derive(Debug, Clone)]
pub struct NotificationDefaults {
    pub icon: String,
    pub badge: String,
    pub vibrate: Vec<u32>,
}

impl Default for NotificationDefaults {
    fn default() -> Self {
        Self {
            icon: "/icons/icon-192x192.png".into(),
            badge: "/icons/badge-72x72.png".into(),
            vibrate: vec![100, 50, 100],
        }
    }
}

/// A notification ready to be displayed by the host.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct Notification {
    pub title: String,
    pub body: String,
    pub icon: String,
    pub badge: String,
    pub vibrate: Vec<u32>,
    pub data: Value,
    pub actions: Vec<NotificationAction>,
}

impl Notification {
    pub fn from_payload(payload: PushPayload, defaults: &NotificationDefaults) -> Self {
        Self {
            title: payload.title,
            body: payload.body,
            icon: payload.icon.unwrap_or_else(|| defaults.icon.clone()),
            badge: defaults.badge.clone(),
            vibrate: defaults.vibrate.clone(),
            data: payload.data.unwrap_or_else(|| Value::Object(Default::default())),
            actions: payload.actions.unwrap_or_default(),
        }
    }

    /// URL to open when the notification is clicked, `/` when none was sent.
    pub fn target_url(&self) -> &str {
        self.data
            .get("url")
            .and_then(Value::as_str)
            .filter(|url| !url.is_empty())
            .unwrap_or("/")
    }
}
