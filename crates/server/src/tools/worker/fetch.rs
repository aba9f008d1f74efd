//! sw_fetch tool implementation.
//!
//! Delivers one fetch event to the worker. Requests the worker doesn't
//! intercept are fetched straight from the network, as a browser would.

use rmcp::{ErrorData as McpError, model::CallToolResult};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use swcache_core::{CacheRequest, CachedResponse, Destination, Error};
use swcache_worker::fetch::resolve;
use swcache_worker::{Classification, Network, Outcome, Routed, ServiceWorker, Strategy};

use crate::tools::json_result;

/// Parameters for the sw_fetch tool.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct SwFetchParams {
    /// URL to request, absolute or relative to the configured origin.
    pub url: String,

    /// HTTP method (default: GET).
    pub method: Option<String>,

    /// Accept header, e.g. "text/html" for a navigation.
    pub accept: Option<String>,

    /// Request destination (document, image, script, style, font, empty, other).
    pub destination: Option<Destination>,
}

/// Output from the sw_fetch tool.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct SwFetchOutput {
    pub url: String,
    pub status: u16,
    pub content_type: Option<String>,
    /// Body as text when it is valid UTF-8.
    pub body: Option<String>,
    pub body_bytes: usize,
    /// False when the request bypassed the worker.
    pub intercepted: bool,
    pub classification: Option<Classification>,
    pub strategy: Option<Strategy>,
    pub outcome: Option<Outcome>,
    /// A copy of the response was written to a store.
    pub stored: bool,
}

impl SwFetchOutput {
    fn new(response: &CachedResponse) -> Self {
        Self {
            url: response.url.clone(),
            status: response.status,
            content_type: response.content_type().map(String::from),
            body: response.body_text().map(String::from),
            body_bytes: response.body.len(),
            intercepted: false,
            classification: None,
            strategy: None,
            outcome: None,
            stored: false,
        }
    }
}

/// Implementation of the sw_fetch tool.
pub async fn fetch_impl(worker: &ServiceWorker, params: SwFetchParams) -> Result<CallToolResult, McpError> {
    let url = resolve(worker.router().classifier().origin(), &params.url)
        .map_err(|e| Error::InvalidUrl(format!("{}: {e}", params.url)))?;

    let mut request = CacheRequest::get(url).with_destination(params.destination.unwrap_or_default());
    if let Some(method) = params.method {
        request = request.with_method(method);
    }
    if let Some(accept) = params.accept {
        request = request.with_accept(accept);
    }

    let output = match worker.on_fetch(&request).await {
        Routed::Handled(result) => SwFetchOutput {
            intercepted: true,
            classification: Some(result.classification),
            strategy: Some(result.strategy),
            outcome: Some(result.outcome),
            stored: result.stored,
            ..SwFetchOutput::new(&result.response)
        },
        Routed::PassThrough => SwFetchOutput::new(&worker.network().fetch(&request).await?),
    };

    json_result(&output)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tools::test_support::{offline_worker, output};
    use swcache_core::CacheStorage;

    fn params(url: &str) -> SwFetchParams {
        SwFetchParams { url: url.into(), method: None, accept: None, destination: None }
    }

    #[tokio::test]
    async fn test_offline_image_gets_placeholder() {
        let (worker, _db) = offline_worker().await;

        let result = fetch_impl(&worker, params("/assets/logo.png")).await.unwrap();
        let out: SwFetchOutput = output(&result);
        assert!(out.intercepted);
        assert_eq!(out.status, 200);
        assert_eq!(out.content_type.as_deref(), Some("image/svg+xml"));
        assert_eq!(out.outcome, Some(Outcome::Fallback));
        assert_eq!(out.strategy, Some(Strategy::ImageCache));
    }

    #[tokio::test]
    async fn test_offline_api_gets_json_503() {
        let (worker, _db) = offline_worker().await;

        let result = fetch_impl(
            &worker,
            SwFetchParams { accept: Some("application/json".into()), ..params("/api/projects") },
        )
        .await
        .unwrap();
        let out: SwFetchOutput = output(&result);
        assert_eq!(out.status, 503);
        assert_eq!(out.classification, Some(Classification::Api));
        assert!(out.body.unwrap().contains("Offline"));
    }

    #[tokio::test]
    async fn test_cached_page_served_when_offline() {
        let (worker, db) = offline_worker().await;
        let request = CacheRequest::get(resolve(worker.router().classifier().origin(), "/about.html").unwrap());
        db.put(
            "test-dynamic-v1",
            &request,
            &CachedResponse::new(request.url.as_str(), 200, "<h1>about</h1>").with_header("content-type", "text/html"),
        )
        .await
        .unwrap();

        let result = fetch_impl(&worker, params("/about.html")).await.unwrap();
        let out: SwFetchOutput = output(&result);
        assert_eq!(out.outcome, Some(Outcome::CacheHit));
        assert_eq!(out.body.as_deref(), Some("<h1>about</h1>"));
        worker.settle().await;
    }

    #[tokio::test]
    async fn test_pass_through_surfaces_network_error() {
        let (worker, _db) = offline_worker().await;

        let result = fetch_impl(&worker, SwFetchParams { method: Some("POST".into()), ..params("/api/contact") }).await;
        let err = result.unwrap_err();
        assert_eq!(err.code.0, -32006);
    }

    #[tokio::test]
    async fn test_invalid_url() {
        let (worker, _db) = offline_worker().await;
        let err = fetch_impl(&worker, params("ftp://files.example/x")).await.unwrap_err();
        assert_eq!(err.code.0, -32003);
    }
}
