//! Background sync hooks.
//!
//! The host fires a sync event with a tag once connectivity returns. Each tag
//! maps to one hook; unknown tags are ignored.

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use shellcache_core::Error;

/// Tag used by the contact form for submissions made while offline.
pub const CONTACT_FORM_TAG: &str = "contact-form";

/// Work run when a sync event with a matching tag fires.
#[async_trait]
pub trait SyncHook: Send + Sync {
    async fn run(&self) -> Result<(), Error>;
}

/// Placeholder for replaying deferred contact-form submissions.
///
/// The submission queue lives with the form flow, outside the cache manager;
/// this hook only marks the point where the replay happens.
#[derive(Debug, Default)]
pub struct ContactFormSync;

#[async_trait]
impl SyncHook for ContactFormSync {
    async fn run(&self) -> Result<(), Error> {
        tracing::info!("syncing contact form submissions");
        Ok(())
    }
}

/// Outcome of dispatching a sync event.
#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize, schemars::JsonSchema)]
#[serde(rename_all = "snake_case")]
pub enum SyncOutcome {
    Completed,
    Failed,
    UnknownTag,
}

/// Tag to hook lookup.
#[derive(Clone, Default)]
pub struct SyncRegistry {
    hooks: HashMap<String, Arc<dyn SyncHook>>,
}

impl SyncRegistry {
    /// Registry with the built-in contact-form hook.
    pub fn with_defaults() -> Self {
        let mut registry = Self::default();
        registry.register(CONTACT_FORM_TAG, Arc::new(ContactFormSync));
        registry
    }

    pub fn register(&mut self, tag: &str, hook: Arc<dyn SyncHook>) {
        self.hooks.insert(tag.to_string(), hook);
    }

    pub fn tags(&self) -> Vec<&str> {
        let mut tags: Vec<&str> = self.hooks.keys().map(String::as_str).collect();
        tags.sort_unstable();
        tags
    }

    /// Run the hook for `tag`. Hook failures are logged, not returned.
    pub async fn dispatch(&self, tag: &str) -> SyncOutcome {
        let Some(hook) = self.hooks.get(tag) else {
            tracing::debug!(%tag, "no sync hook registered");
            return SyncOutcome::UnknownTag;
        };

        match hook.run().await {
            Ok(()) => SyncOutcome::Completed,
            Err(e) => {
                tracing::error!(%tag, "sync hook failed: {}", e);
                SyncOutcome::Failed
            }
        }
    }
}

impl std::fmt::Debug for SyncRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SyncRegistry").field("tags", &self.tags()).finish()
    }
}
