//! cache_sweep tool implementation.
//!
//! Runs the retention sweep once, outside its periodic schedule.

use rmcp::{ErrorData as McpError, model::CallToolResult};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use swcache_worker::ServiceWorker;

use crate::tools::json_result;

/// Parameters for the cache_sweep tool.
#[derive(Debug, Clone, Default, Serialize, Deserialize, JsonSchema)]
pub struct CacheSweepParams {}

/// Implementation of the cache_sweep tool.
pub async fn sweep_impl(worker: &ServiceWorker, _params: CacheSweepParams) -> Result<CallToolResult, McpError> {
    let report = worker.sweep().await?;
    json_result(&report)
}
