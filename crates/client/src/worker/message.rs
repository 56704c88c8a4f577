//! Control messages posted to the cache manager by client pages.

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use tokio::sync::oneshot;

/// Recognized control messages.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[serde(tag = "type", rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ControlMessage {
    /// Promote a waiting version to active now.
    SkipWaiting,
    /// Ask for the active generation identifier.
    GetVersion,
}

impl ControlMessage {
    /// Parse a posted message. Anything unrecognized is `None`.
    pub fn parse(value: &serde_json::Value) -> Option<Self> {
        serde_json::from_value(value.clone()).ok()
    }
}

/// Reply to [`ControlMessage::GetVersion`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
pub struct VersionReply {
    pub version: String,
}

/// Reply port handed over with a message.
pub type ReplyPort = oneshot::Sender<VersionReply>;
