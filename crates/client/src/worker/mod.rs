//! The offline cache manager.
//!
//! Owns the static and dynamic generations, runs the install/activate
//! lifecycle, and decides for every intercepted request whether to serve
//! from storage, from the network, or both.
//!
//! ### Lifecycle
//! - install: fetch the precache list, store it all-or-nothing, skip waiting
//! - activate: delete every generation that is neither current static nor
//!   current dynamic, then claim open clients
//! - resume: after a restart, a complete static generation means the
//!   version is already active
//!
//! ### Routing
//! - non-GET and never-cache requests pass through untouched
//! - everything else is classified and served by exactly one strategy

pub mod host;
pub mod lifecycle;
pub mod message;
pub mod push;
pub mod strategy;
pub mod sync;

use std::collections::HashSet;
use std::sync::Arc;

use futures_util::future::try_join_all;
use schemars::JsonSchema;
use serde::Serialize;
use shellcache_core::cache::hash::compute_cache_key;
use shellcache_core::{
    AppConfig, CacheEntry, CacheRules, CacheStorage, Classification, Error, InterceptedRequest, Response, Strategy,
    classify,
};
use tokio::sync::RwLock;
use url::Url;

use crate::fetch::{Network, resolve};

pub use host::{Host, HostEvent, RecordedHost};
pub use lifecycle::{Lifecycle, LifecycleState};
pub use message::{ControlMessage, ReplyPort, VersionReply};
pub use push::{Notification, NotificationAction, NotificationDefaults, PushPayload};
pub use strategy::StrategyRunner;
pub use sync::{SyncHook, SyncOutcome, SyncRegistry};

/// Why a request was left alone.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, JsonSchema)]
#[serde(rename_all = "snake_case")]
pub enum PassthroughReason {
    NonGet,
    NeverCache,
    /// Not activated, and no earlier caches are left to serve from.
    NotActive,
}

/// Routing decision for one request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, JsonSchema)]
#[serde(tag = "route", rename_all = "snake_case")]
pub enum Route {
    Passthrough { reason: PassthroughReason },
    Handled { classification: Classification, strategy: Strategy },
}

/// A response together with how it was obtained.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Served {
    pub route: Route,
    pub response: Response,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, JsonSchema)]
pub struct InstallReport {
    pub generation: String,
    pub entries: usize,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, JsonSchema)]
pub struct ActivateReport {
    pub deleted: Vec<String>,
    pub kept: Vec<String>,
}

/// Offline cache manager for one deployed version.
pub struct CacheManager {
    static_cache: String,
    dynamic_cache: String,
    origin: Url,
    rules: CacheRules,
    precache: Vec<Url>,
    storage: Arc<dyn CacheStorage>,
    network: Arc<dyn Network>,
    host: Arc<dyn Host>,
    strategies: StrategyRunner,
    lifecycle: RwLock<Lifecycle>,
    notifications: NotificationDefaults,
    sync: SyncRegistry,
}

impl CacheManager {
    /// Build a manager from validated configuration and its collaborators.
    pub fn new(
        config: &AppConfig, storage: Arc<dyn CacheStorage>, network: Arc<dyn Network>, host: Arc<dyn Host>,
    ) -> Result<Self, Error> {
        let origin = config.origin_url().map_err(|e| Error::InvalidInput(e.to_string()))?;
        let rules = config.cache_rules().map_err(|e| Error::InvalidInput(e.to_string()))?;
        let precache = config
            .precache
            .iter()
            .map(|path| resolve(&origin, path).map_err(Error::from))
            .collect::<Result<Vec<_>, _>>()?;
        let shell_url = resolve(&origin, "/")?;

        let static_cache = config.static_cache_name();
        let dynamic_cache = config.dynamic_cache_name();
        let strategies = StrategyRunner::new(
            storage.clone(),
            network.clone(),
            static_cache.clone(),
            dynamic_cache.clone(),
            &shell_url,
        );

        Ok(Self {
            static_cache,
            dynamic_cache,
            origin,
            rules,
            precache,
            storage,
            network,
            host,
            strategies,
            lifecycle: RwLock::new(Lifecycle::default()),
            notifications: NotificationDefaults {
                icon: config.notification_icon.clone(),
                badge: config.notification_badge.clone(),
                ..Default::default()
            },
            sync: SyncRegistry::with_defaults(),
        })
    }

    pub fn static_cache_name(&self) -> &str {
        &self.static_cache
    }

    pub fn dynamic_cache_name(&self) -> &str {
        &self.dynamic_cache
    }

    pub fn origin(&self) -> &Url {
        &self.origin
    }

    pub fn storage(&self) -> &Arc<dyn CacheStorage> {
        &self.storage
    }

    /// Icon, badge and vibrate pattern applied to every notification.
    pub fn notification_defaults(&self) -> &NotificationDefaults {
        &self.notifications
    }

    pub async fn state(&self) -> LifecycleState {
        self.lifecycle.read().await.state()
    }

    /// Pre-populate the static generation.
    ///
    /// All-or-nothing: if any precache resource cannot be fetched with a 2xx
    /// status, nothing is written and the install fails with `SETUP_ERROR`.
    /// The previous version's generations are left untouched either way, and
    /// after a failure they keep serving clients.
    pub async fn install(&self) -> Result<InstallReport, Error> {
        self.lifecycle.write().await.begin_install()?;
        tracing::info!(generation = %self.static_cache, "installing");

        let result = self.populate_static().await;
        let fallback = result.is_err() && self.has_stored_generations().await;

        let mut lifecycle = self.lifecycle.write().await;
        lifecycle.finish_install(result.is_ok())?;

        match result {
            Ok(entries) => {
                lifecycle.skip_waiting();
                tracing::info!(generation = %self.static_cache, entries, "static assets cached");
                Ok(InstallReport { generation: self.static_cache.clone(), entries })
            }
            Err(e) => {
                tracing::error!("failed to cache static assets: {}", e);
                if fallback {
                    lifecycle.adopt_previous();
                }
                Err(e)
            }
        }
    }

    /// Pick up after a restart over existing storage.
    ///
    /// Goes straight to `Activated` when the current static generation already
    /// holds every precache entry. Otherwise any stored generations keep
    /// serving until this version installs. Returns whether it resumed.
    pub async fn resume(&self) -> Result<bool, Error> {
        let generations = self.storage.generations().await?;
        if generations.is_empty() {
            return Ok(false);
        }

        let complete = if generations.contains(&self.static_cache) {
            let stored: HashSet<String> =
                self.storage.entries(&self.static_cache).await?.into_iter().map(|e| e.key).collect();
            self.precache
                .iter()
                .all(|url| stored.contains(&compute_cache_key("GET", url)))
        } else {
            false
        };

        let mut lifecycle = self.lifecycle.write().await;
        if complete {
            lifecycle.resume()?;
            tracing::info!(generation = %self.static_cache, "resumed from stored generation");
            return Ok(true);
        }

        lifecycle.adopt_previous();
        Ok(false)
    }

    async fn has_stored_generations(&self) -> bool {
        match self.storage.generations().await {
            Ok(names) => !names.is_empty(),
            Err(e) => {
                tracing::warn!("failed to list caches: {}", e);
                false
            }
        }
    }

    async fn populate_static(&self) -> Result<usize, Error> {
        let fetches = self.precache.iter().map(|url| async move {
            let request = InterceptedRequest::get(url.clone());
            let response = self
                .network
                .fetch(&request)
                .await
                .map_err(|e| Error::SetupFailed(format!("{}: {}", url, e)))?;
            if !response.is_ok() {
                return Err(Error::SetupFailed(format!("{}: status {}", url, response.status)));
            }
            Ok(CacheEntry::new(&request, response))
        });

        let entries = try_join_all(fetches).await?;

        self.storage
            .put_all(&self.static_cache, &entries)
            .await
            .map_err(|e| Error::SetupFailed(format!("storing precache entries: {}", e)))?;

        Ok(entries.len())
    }

    /// Retire stale generations and take control of open clients.
    ///
    /// Deletion failures are logged; activation still completes.
    pub async fn activate(&self) -> Result<ActivateReport, Error> {
        self.lifecycle.write().await.begin_activate()?;
        tracing::info!("activating");

        let mut report = ActivateReport { deleted: Vec::new(), kept: Vec::new() };

        match self.storage.generations().await {
            Ok(names) => {
                for name in names {
                    if name == self.static_cache || name == self.dynamic_cache {
                        report.kept.push(name);
                        continue;
                    }
                    tracing::info!(generation = %name, "deleting old cache");
                    match self.storage.delete_generation(&name).await {
                        Ok(_) => report.deleted.push(name),
                        Err(e) => tracing::warn!(generation = %name, "failed to delete old cache: {}", e),
                    }
                }
            }
            Err(e) => tracing::warn!("failed to list caches: {}", e),
        }

        self.host.claim_clients().await;
        self.lifecycle.write().await.finish_activate()?;
        tracing::info!("activated");

        Ok(report)
    }

    /// Activate right away if the installed version was told to skip waiting.
    pub async fn activate_if_waiting_skipped(&self) -> Result<Option<ActivateReport>, Error> {
        if !self.lifecycle.read().await.ready_to_activate() {
            return Ok(None);
        }
        self.activate().await.map(Some)
    }

    /// Decide how a request is handled. Pure apart from reading the lifecycle.
    pub async fn route(&self, request: &InterceptedRequest) -> Route {
        if !request.is_get() {
            return Route::Passthrough { reason: PassthroughReason::NonGet };
        }

        let classification = classify(request, &self.rules);
        let Some(strategy) = classification.strategy() else {
            return Route::Passthrough { reason: PassthroughReason::NeverCache };
        };

        if !self.lifecycle.read().await.controls_clients() {
            return Route::Passthrough { reason: PassthroughReason::NotActive };
        }

        Route::Handled { classification, strategy }
    }

    /// Respond to an intercepted request, or `None` to let it through untouched.
    pub async fn intercept(&self, request: &InterceptedRequest) -> Option<Response> {
        match self.route(request).await {
            Route::Handled { strategy, .. } => Some(self.strategies.run(strategy, request).await),
            Route::Passthrough { reason } => {
                tracing::debug!(?reason, "passing through {} {}", request.method, request.url);
                None
            }
        }
    }

    /// Serve a request end to end. Pass-through requests go straight to the
    /// network and their failures are returned as-is.
    pub async fn fetch(&self, request: &InterceptedRequest) -> Result<Served, Error> {
        let route = self.route(request).await;
        let response = match route {
            Route::Handled { strategy, .. } => self.strategies.run(strategy, request).await,
            Route::Passthrough { .. } => self.network.fetch(request).await?,
        };
        Ok(Served { route, response })
    }

    /// Handle a control message posted by a page.
    pub async fn handle_message(&self, message: ControlMessage, reply: Option<ReplyPort>) -> Result<(), Error> {
        match message {
            ControlMessage::SkipWaiting => {
                self.lifecycle.write().await.skip_waiting();
                self.activate_if_waiting_skipped().await?;
            }
            ControlMessage::GetVersion => {
                let version = VersionReply { version: self.static_cache.clone() };
                match reply {
                    Some(port) => {
                        if port.send(version).is_err() {
                            tracing::debug!("version reply port closed");
                        }
                    }
                    None => tracing::debug!("GET_VERSION without a reply port"),
                }
            }
        }
        Ok(())
    }

    /// Parse and handle a raw posted message. Unknown messages are ignored.
    pub async fn post_message(&self, data: &serde_json::Value, reply: Option<ReplyPort>) -> Result<bool, Error> {
        match ControlMessage::parse(data) {
            Some(message) => self.handle_message(message, reply).await.map(|_| true),
            None => {
                tracing::debug!("ignoring unrecognized message");
                Ok(false)
            }
        }
    }

    /// Show a notification for a push message. Absent or unparseable
    /// payloads do nothing.
    pub async fn push(&self, data: Option<&[u8]>) -> Option<Notification> {
        let payload = PushPayload::parse(data)?;
        let notification = Notification::from_payload(payload, &self.notifications);
        self.host.show_notification(&notification).await;
        Some(notification)
    }

    /// Close a clicked notification and open (or focus) its target page.
    /// Returns the absolute URL opened.
    pub async fn notification_click(&self, notification: &Notification) -> String {
        self.host.close_notification(notification).await;

        let target = match resolve(&self.origin, notification.target_url()) {
            Ok(url) => url.to_string(),
            Err(e) => {
                tracing::warn!("bad notification url {}: {}", notification.target_url(), e);
                self.origin.to_string()
            }
        };

        self.host.open_window(&target).await;
        target
    }

    /// Dispatch a background sync event.
    pub async fn sync(&self, tag: &str) -> SyncOutcome {
        self.sync.dispatch(tag).await
    }
}
