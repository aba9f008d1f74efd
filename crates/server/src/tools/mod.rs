//! MCP tool implementations.
//!
//! Worker tools drive the service worker's events (fetch, install,
//! activate, message, push, notification click). Cache tools inspect and
//! maintain the stores directly.

use rmcp::{
    ErrorData as McpError,
    model::{CallToolResult, Content},
};
use serde::Serialize;

use crate::error::ToolError;

pub mod cache;
pub mod worker;

/// Pretty JSON text result, the shape every tool returns.
pub(crate) fn json_result<T: Serialize>(output: &T) -> Result<CallToolResult, McpError> {
    let json = serde_json::to_string_pretty(output).map_err(ToolError::from)?;
    Ok(CallToolResult::success(vec![Content::text(json)]))
}

#[cfg(test)]
pub(crate) mod test_support {
    use std::sync::Arc;
    use std::time::Duration;

    use rmcp::model::CallToolResult;
    use serde::de::DeserializeOwned;
    use swcache_core::{AppConfig, CacheDb};
    use swcache_worker::{FetchConfig, HttpNetwork, ServiceWorker};

    /// Origin on the discard port: every fetch is refused, like being offline.
    pub const OFFLINE_ORIGIN: &str = "http://127.0.0.1:9";

    /// Active worker with nothing to pre-cache and no reachable network.
    pub async fn offline_worker() -> (Arc<ServiceWorker>, Arc<CacheDb>) {
        let config = AppConfig {
            origin: OFFLINE_ORIGIN.into(),
            cache_prefix: "test".into(),
            version: "v1".into(),
            static_assets: vec![],
            ..Default::default()
        };
        let db = Arc::new(CacheDb::open_in_memory().await.unwrap());
        let network = HttpNetwork::new(FetchConfig { timeout: Duration::from_secs(2), ..FetchConfig::default() }).unwrap();
        let worker = ServiceWorker::new(config, db.clone(), Arc::new(network)).unwrap();
        worker.install().await.unwrap();
        worker.activate().await.unwrap();
        (Arc::new(worker), db)
    }

    /// Decode the JSON text of a tool result.
    pub fn output<T: DeserializeOwned>(result: &CallToolResult) -> T {
        let content_val = serde_json::to_value(&result.content[0]).unwrap();
        let text = content_val
            .get("text")
            .and_then(|v| v.as_str())
            .expect("Expected text field in content");
        serde_json::from_str(text).unwrap()
    }
}
