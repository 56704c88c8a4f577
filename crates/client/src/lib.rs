//! Client side of shellcache.
//!
//! This crate provides the network fetch pipeline and the offline cache
//! manager that sits between pages and the network.

pub mod fetch;
pub mod worker;

#[cfg(test)]
mod testing;

pub use fetch::{FetchClient, FetchConfig, Network};

pub use worker::{
    ActivateReport, CacheManager, ControlMessage, Host, HostEvent, InstallReport, LifecycleState, Notification,
    PassthroughReason, RecordedHost, Route, Served, SyncOutcome, VersionReply,
};
