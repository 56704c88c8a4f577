//! The embedding runtime as seen by the cache manager.

use async_trait::async_trait;
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use tokio::sync::RwLock;

use super::push::Notification;

/// Calls the cache manager makes back into its host.
#[async_trait]
pub trait Host: Send + Sync {
    /// Take control of every open client page without waiting for a reload.
    async fn claim_clients(&self);

    /// Display a system notification.
    async fn show_notification(&self, notification: &Notification);

    async fn close_notification(&self, notification: &Notification);

    /// Focus a client already showing `url`, or open a new one.
    async fn open_window(&self, url: &str);
}

/// One call made into a [`RecordedHost`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
#[serde(tag = "event", rename_all = "snake_case")]
pub enum HostEvent {
    ClientsClaimed,
    NotificationShown { notification: Notification },
    NotificationClosed { title: String },
    WindowOpened { url: String },
}

/// Host that logs every call and keeps it in an ordered event log.
///
/// The stdio server uses it to report side effects back to the caller.
#[derive(Debug, Default)]
pub struct RecordedHost {
    events: RwLock<Vec<HostEvent>>,
}

impl RecordedHost {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn events(&self) -> Vec<HostEvent> {
        self.events.read().await.clone()
    }

    /// Remove and return everything recorded so far.
    pub async fn drain(&self) -> Vec<HostEvent> {
        std::mem::take(&mut *self.events.write().await)
    }

    async fn record(&self, event: HostEvent) {
        self.events.write().await.push(event);
    }
}

#[async_trait]
impl Host for RecordedHost {
    async fn claim_clients(&self) {
        tracing::info!("claiming open clients");
        self.record(HostEvent::ClientsClaimed).await;
    }

    async fn show_notification(&self, notification: &Notification) {
        tracing::info!(title = %notification.title, "showing notification");
        self.record(HostEvent::NotificationShown { notification: notification.clone() })
            .await;
    }

    async fn close_notification(&self, notification: &Notification) {
        self.record(HostEvent::NotificationClosed { title: notification.title.clone() })
            .await;
    }

    async fn open_window(&self, url: &str) {
        tracing::info!(%url, "opening client window");
        self.record(HostEvent::WindowOpened { url: url.to_string() }).await;
    }
}
