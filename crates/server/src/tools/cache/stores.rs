//! cache_stores tool implementation.
//!
//! Lists every store with its entry count, flagging the current ones.

use rmcp::{ErrorData as McpError, model::CallToolResult};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use swcache_core::CacheStorage;
use swcache_worker::{ServiceWorker, WorkerState};

use crate::tools::json_result;

/// Parameters for the cache_stores tool.
#[derive(Debug, Clone, Default, Serialize, Deserialize, JsonSchema)]
pub struct CacheStoresParams {}

#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct StoreSummary {
    pub name: String,
    pub entries: usize,
    /// Part of the current version's keep-set.
    pub current: bool,
}

/// Output from the cache_stores tool.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct CacheStoresOutput {
    pub version: String,
    pub state: WorkerState,
    pub stores: Vec<StoreSummary>,
}

/// Implementation of the cache_stores tool.
pub async fn stores_impl(worker: &ServiceWorker, _params: CacheStoresParams) -> Result<CallToolResult, McpError> {
    let storage = worker.storage();
    let mut stores = Vec::new();
    for name in storage.store_names().await? {
        let entries = storage.entry_count(&name).await?;
        let current = worker.names().is_current(&name);
        stores.push(StoreSummary { name, entries, current });
    }

    json_result(&CacheStoresOutput { version: worker.names().worker_version(), state: worker.state(), stores })
}
