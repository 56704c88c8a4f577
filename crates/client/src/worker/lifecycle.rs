//! Worker lifecycle state machine.
//!
//! ```text
//! Parsed ──install──▶ Installing ──ok──▶ Installed ──activate──▶ Activating ──▶ Activated
//!    ▲                    │
//!    └──── retry ─── Redundant ◀──fail──┘
//! ```
//!
//! A restarted worker whose generations are already complete resumes
//! straight into `Activated`. While this version is not active, caches left
//! by an earlier install keep serving clients.

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use shellcache_core::Error;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "snake_case")]
pub enum LifecycleState {
    Parsed,
    Installing,
    Installed,
    Activating,
    Activated,
    /// A failed install; the previous version stays in charge.
    Redundant,
}

/// Current state plus the skip-waiting signal.
#[derive(Debug, Clone)]
pub struct Lifecycle {
    state: LifecycleState,
    skip_waiting: bool,
    /// Caches from an earlier install are still in charge.
    previous: bool,
}

impl Default for Lifecycle {
    fn default() -> Self {
        Self { state: LifecycleState::Parsed, skip_waiting: false, previous: false }
    }
}

impl Lifecycle {
    pub fn state(&self) -> LifecycleState {
        self.state
    }

    pub fn is_active(&self) -> bool {
        self.state == LifecycleState::Activated
    }

    /// Whether intercepted requests are served from the caches at all.
    pub fn controls_clients(&self) -> bool {
        self.is_active() || self.previous
    }

    /// Keep serving from caches an earlier install left behind.
    pub fn adopt_previous(&mut self) {
        if !self.previous {
            tracing::info!(state = ?self.state, "serving from previous caches");
        }
        self.previous = true;
    }

    pub fn skip_waiting(&mut self) {
        self.skip_waiting = true;
    }

    /// Installed and told not to wait for existing clients to close.
    pub fn ready_to_activate(&self) -> bool {
        self.state == LifecycleState::Installed && self.skip_waiting
    }

    pub fn begin_install(&mut self) -> Result<(), Error> {
        self.transition(&[LifecycleState::Parsed, LifecycleState::Redundant], LifecycleState::Installing)
    }

    pub fn finish_install(&mut self, ok: bool) -> Result<(), Error> {
        let to = if ok { LifecycleState::Installed } else { LifecycleState::Redundant };
        self.transition(&[LifecycleState::Installing], to)
    }

    pub fn begin_activate(&mut self) -> Result<(), Error> {
        self.transition(&[LifecycleState::Installed], LifecycleState::Activating)
    }

    pub fn finish_activate(&mut self) -> Result<(), Error> {
        self.transition(&[LifecycleState::Activating], LifecycleState::Activated)
    }

    /// Pick up where an earlier run of this same version left off.
    pub fn resume(&mut self) -> Result<(), Error> {
        self.transition(&[LifecycleState::Parsed, LifecycleState::Redundant], LifecycleState::Activated)
    }

    fn transition(&mut self, from: &[LifecycleState], to: LifecycleState) -> Result<(), Error> {
        if !from.contains(&self.state) {
            return Err(Error::InvalidState(format!("cannot move from {:?} to {:?}", self.state, to)));
        }
        tracing::info!(from = ?self.state, to = ?to, "lifecycle transition");
        self.state = to;
        Ok(())
    }
}
