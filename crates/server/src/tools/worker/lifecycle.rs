//! sw_install and sw_activate tool implementations.

use rmcp::{ErrorData as McpError, model::CallToolResult};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use swcache_worker::ServiceWorker;

use crate::tools::json_result;

/// Parameters for the sw_install tool.
#[derive(Debug, Clone, Default, Serialize, Deserialize, JsonSchema)]
pub struct SwInstallParams {}

/// Parameters for the sw_activate tool.
#[derive(Debug, Clone, Default, Serialize, Deserialize, JsonSchema)]
pub struct SwActivateParams {}

/// Run the install step: open the current stores and pre-cache.
pub async fn install_impl(worker: &ServiceWorker, _params: SwInstallParams) -> Result<CallToolResult, McpError> {
    let report = worker.install().await?;
    json_result(&report)
}

/// Run the activate step: prune old stores and claim clients.
pub async fn activate_impl(worker: &ServiceWorker, _params: SwActivateParams) -> Result<CallToolResult, McpError> {
    let report = worker.activate().await?;
    json_result(&report)
}
