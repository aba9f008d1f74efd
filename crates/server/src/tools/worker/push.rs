//! sw_push and sw_notification_click tool implementations.

use rmcp::{ErrorData as McpError, model::CallToolResult};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use swcache_worker::ServiceWorker;

use crate::tools::json_result;

/// Parameters for the sw_push tool.
#[derive(Debug, Clone, Default, Serialize, Deserialize, JsonSchema)]
pub struct SwPushParams {
    /// Push payload as text: plain text or a JSON object with `title`/`body`.
    pub payload: Option<String>,
}

/// Parameters for the sw_notification_click tool.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct SwNotificationClickParams {
    /// Action identifier of the clicked button ("explore", "close", ...).
    pub action: String,
}

/// Output from the sw_notification_click tool.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct SwNotificationClickOutput {
    pub action: String,
    /// In-app URL to open, absent when nothing opens.
    pub open_url: Option<String>,
}

/// Implementation of the sw_push tool.
pub async fn push_impl(worker: &ServiceWorker, params: SwPushParams) -> Result<CallToolResult, McpError> {
    let notification = worker.on_push(params.payload.as_deref().map(str::as_bytes));
    json_result(&notification)
}

/// Implementation of the sw_notification_click tool.
pub async fn notification_click_impl(
    worker: &ServiceWorker, params: SwNotificationClickParams,
) -> Result<CallToolResult, McpError> {
    let open_url = worker.on_notification_click(&params.action);
    json_result(&SwNotificationClickOutput { action: params.action, open_url })
}
