//! sw_message tool implementation.
//!
//! Posts a control message to the worker, the way a page would over
//! `postMessage` with a reply port.

use rmcp::{ErrorData as McpError, model::CallToolResult};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use swcache_worker::{MessageReply, ServiceWorker};

use crate::tools::json_result;

/// Parameters for the sw_message tool.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct SwMessageParams {
    /// Message object, e.g. {"type": "GET_VERSION"} or {"type": "CACHE_URLS", "urls": [...]}.
    pub message: serde_json::Value,
}

/// Output from the sw_message tool.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct SwMessageOutput {
    /// Reply posted back, absent for messages that get none.
    pub reply: Option<MessageReply>,
}

/// Implementation of the sw_message tool.
pub async fn message_impl(worker: &ServiceWorker, params: SwMessageParams) -> Result<CallToolResult, McpError> {
    let reply = worker.on_message(&params.message).await;
    json_result(&SwMessageOutput { reply })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tools::test_support::{offline_worker, output};
    use serde_json::json;
    use swcache_core::CacheStorage;

    #[tokio::test]
    async fn test_get_version() {
        let (worker, _db) = offline_worker().await;
        let result = message_impl(&worker, SwMessageParams { message: json!({"type": "GET_VERSION"}) }).await.unwrap();
        let out: SwMessageOutput = output(&result);
        assert_eq!(out.reply, Some(MessageReply::Version { version: "test-portfolio-v1".into() }));
    }

    #[tokio::test]
    async fn test_clear_cache() {
        let (worker, db) = offline_worker().await;
        let result = message_impl(&worker, SwMessageParams { message: json!({"type": "CLEAR_CACHE"}) }).await.unwrap();
        let out: SwMessageOutput = output(&result);
        assert_eq!(out.reply, Some(MessageReply::success()));
        assert!(db.store_names().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_cache_urls_offline_fails() {
        let (worker, _db) = offline_worker().await;
        let message = json!({"type": "CACHE_URLS", "urls": ["/blog.html"]});
        let result = message_impl(&worker, SwMessageParams { message }).await.unwrap();
        let out: SwMessageOutput = output(&result);
        assert!(matches!(out.reply, Some(MessageReply::Done { success: false, .. })));
    }

    #[tokio::test]
    async fn test_unknown_message_has_no_reply() {
        let (worker, _db) = offline_worker().await;
        let result = message_impl(&worker, SwMessageParams { message: json!({"type": "NOPE"}) }).await.unwrap();
        let out: SwMessageOutput = output(&result);
        assert_eq!(out.reply, None);
    }
}
