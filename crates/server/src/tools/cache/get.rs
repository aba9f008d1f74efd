//! cache_get tool implementation.
//!
//! Looks up the cached response for a URL without touching the network.

use rmcp::{ErrorData as McpError, model::CallToolResult};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use swcache_core::{CacheRequest, CacheStorage, CachedResponse, Error, StoreRole};
use swcache_worker::ServiceWorker;
use swcache_worker::fetch::resolve;

use crate::error::ToolError;
use crate::tools::json_result;

/// Parameters for the cache_get tool.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct CacheGetParams {
    /// URL of the cached GET request, absolute or relative to the origin.
    pub url: String,

    /// Store to read. Defaults to every current store, static first.
    pub store: Option<String>,
}

/// Output from the cache_get tool.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct CacheGetOutput {
    /// Store the entry was found in.
    pub store: String,
    pub key: String,
    pub response: CachedResponse,
}

/// Implementation of the cache_get tool.
pub async fn get_impl(worker: &ServiceWorker, params: CacheGetParams) -> Result<CallToolResult, McpError> {
    let url = resolve(worker.router().classifier().origin(), &params.url)
        .map_err(|e| Error::InvalidUrl(format!("{}: {e}", params.url)))?;
    let request = CacheRequest::get(url);
    let key = request.cache_key();

    let stores = match params.store {
        Some(store) if store.trim().is_empty() => {
            return Err(ToolError::InvalidInput("store cannot be empty".into()).into());
        }
        Some(store) => vec![store],
        None => worker.names().lookup_order(StoreRole::Static),
    };

    let (store, response) = worker
        .storage()
        .match_first(&stores, &key)
        .await?
        .ok_or_else(|| ToolError::NotCached(request.url.to_string()))?;

    json_result(&CacheGetOutput { store, key, response })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tools::test_support::{offline_worker, output};

    #[tokio::test]
    async fn test_get_impl_missing() {
        let (worker, _db) = offline_worker().await;
        let params = CacheGetParams { url: "/nothing.html".into(), store: None };

        let err = get_impl(&worker, params).await.unwrap_err();
        assert_eq!(err.code.0, -32004);
    }

    #[tokio::test]
    async fn test_get_impl_found() {
        let (worker, db) = offline_worker().await;
        let request = CacheRequest::get(resolve(worker.router().classifier().origin(), "/api/projects").unwrap());
        db.put("test-api-v1", &request, &CachedResponse::new(request.url.as_str(), 200, "[]")).await.unwrap();

        let params = CacheGetParams { url: "/api/projects".into(), store: None };
        let out: CacheGetOutput = output(&get_impl(&worker, params).await.unwrap());
        assert_eq!(out.store, "test-api-v1");
        assert_eq!(out.key, request.cache_key());
        assert_eq!(out.response.body, b"[]");
        assert!(out.response.stored_at.is_some());
    }

    #[tokio::test]
    async fn test_get_impl_named_store() {
        let (worker, db) = offline_worker().await;
        let request = CacheRequest::get(resolve(worker.router().classifier().origin(), "/a.css").unwrap());
        db.put("legacy-static-v0", &request, &CachedResponse::new(request.url.as_str(), 200, "old")).await.unwrap();

        let params = CacheGetParams { url: "/a.css".into(), store: None };
        assert!(get_impl(&worker, params).await.is_err());

        let params = CacheGetParams { url: "/a.css".into(), store: Some("legacy-static-v0".into()) };
        let out: CacheGetOutput = output(&get_impl(&worker, params).await.unwrap());
        assert_eq!(out.store, "legacy-static-v0");

        let params = CacheGetParams { url: "/a.css".into(), store: Some(" ".into()) };
        assert_eq!(get_impl(&worker, params).await.unwrap_err().code.0, -32602);
    }
}
