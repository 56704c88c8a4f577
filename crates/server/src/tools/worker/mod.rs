//! Tools that drive the cache manager.
//!
//! Every tool that can touch the host also returns the host events it caused,
//! so callers see claims, notifications and opened windows in order.

pub mod events;
pub mod fetch;
pub mod lifecycle;
pub mod message;

pub use events::{SwNotificationClickParams, SwPushParams, SwSyncParams, click_impl, push_impl, sync_impl};
pub use fetch::{SwFetchParams, fetch_impl};
pub use lifecycle::{SwInstallParams, activate_impl, install_impl};
pub use message::{SwMessageParams, message_impl};
