//! sw_install and sw_activate tool implementations.

use rmcp::{ErrorData as McpError, model::CallToolResult};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use shellcache_client::{ActivateReport, CacheManager, HostEvent, InstallReport, LifecycleState, RecordedHost};

use crate::tools::json_result;

/// Parameters for the sw_install tool.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct SwInstallParams {
    /// Activate right after a successful install (default: true).
    #[serde(default = "default_true")]
    pub activate: bool,
}

fn default_true() -> bool {
    true
}

/// Output from the sw_install tool.
#[derive(Debug, Clone, Serialize, JsonSchema)]
pub struct SwInstallOutput {
    pub install: InstallReport,
    /// Present when the install went straight on to activation.
    pub activation: Option<ActivateReport>,
    pub state: LifecycleState,
    pub events: Vec<HostEvent>,
}

/// Output from the sw_activate tool.
#[derive(Debug, Clone, Serialize, JsonSchema)]
pub struct SwActivateOutput {
    pub activation: ActivateReport,
    pub state: LifecycleState,
    pub events: Vec<HostEvent>,
}

/// Implementation of the sw_install tool.
pub async fn install_impl(
    manager: &CacheManager, host: &RecordedHost, params: SwInstallParams,
) -> Result<CallToolResult, McpError> {
    let install = manager.install().await?;

    let activation = if params.activate { manager.activate_if_waiting_skipped().await? } else { None };

    let output = SwInstallOutput { install, activation, state: manager.state().await, events: host.drain().await };
    json_result(&output)
}

/// Implementation of the sw_activate tool.
pub async fn activate_impl(manager: &CacheManager, host: &RecordedHost) -> Result<CallToolResult, McpError> {
    let activation = manager.activate().await?;

    let output = SwActivateOutput { activation, state: manager.state().await, events: host.drain().await };
    json_result(&output)
}
