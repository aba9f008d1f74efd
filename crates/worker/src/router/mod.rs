//! Per-request cache policy dispatch.
//!
//! Every intercepted GET is classified once, then handed to one of four
//! strategies:
//!
//! - cache-first: static assets, stored into the static store on a miss
//! - network-first: API/analytics endpoints, cache only when offline
//! - stale-while-revalidate: pages and everything else, refreshed after the
//!   cached copy has been read
//! - image: cache-first plus an unconditional background refresh on hit
//!
//! Network failures never escape. They end in a cached entry or a
//! synthesized offline response. Store failures are logged and treated as
//! misses or skipped writes.

pub mod classify;
pub mod tasks;

use std::sync::Arc;

use serde::{Deserialize, Serialize};
use swcache_core::{AppConfig, CacheRequest, CacheStorage, CachedResponse, Error, StoreNames, StoreRole};
use url::Url;

pub use classify::{Classification, Classifier, Strategy};
pub use tasks::PendingWork;

use crate::fallback;
use crate::fetch::{Network, resolve};

/// How a routed response was produced.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, schemars::JsonSchema)]
#[serde(rename_all = "snake_case")]
pub enum Outcome {
    CacheHit,
    NetworkHit,
    Fallback,
}

#[derive(Debug, Clone)]
pub struct RouteResult {
    pub response: CachedResponse,
    pub classification: Classification,
    pub strategy: Strategy,
    pub outcome: Outcome,
    /// A copy of the network response was written to a store.
    pub stored: bool,
}

#[derive(Debug, Clone)]
pub enum Routed {
    /// Not intercepted; the host fetches it without any cache involvement.
    PassThrough,
    Handled(RouteResult),
}

/// Cache router.
pub struct Router {
    storage: Arc<dyn CacheStorage>,
    network: Arc<dyn Network>,
    classifier: Classifier,
    names: StoreNames,
    offline_page: Url,
    pending: PendingWork,
}

impl Router {
    pub fn new(config: &AppConfig, storage: Arc<dyn CacheStorage>, network: Arc<dyn Network>) -> Result<Self, Error> {
        let classifier = Classifier::new(config)?;
        let offline_page = resolve(classifier.origin(), &config.offline_page)
            .map_err(|e| Error::InvalidUrl(format!("offline_page: {e}")))?;

        Ok(Self {
            storage,
            network,
            classifier,
            names: config.store_names(),
            offline_page,
            pending: PendingWork::new(),
        })
    }

    pub fn classifier(&self) -> &Classifier {
        &self.classifier
    }

    pub fn names(&self) -> &StoreNames {
        &self.names
    }

    /// Background refreshes started by strategies.
    pub fn pending(&self) -> &PendingWork {
        &self.pending
    }

    /// Route one request.
    pub async fn handle(&self, request: &CacheRequest) -> Routed {
        if !self.classifier.intercepts(request) {
            tracing::trace!(url = %request.url, method = %request.method, "pass-through");
            return Routed::PassThrough;
        }

        let classification = self.classifier.classify(request);
        let store = self.names.name(classification.store_role());

        let (response, outcome, stored) = match classification.strategy() {
            Strategy::CacheFirst => self.cache_first(request, classification, &store).await,
            Strategy::NetworkFirst => self.network_first(request, classification, &store).await,
            Strategy::StaleWhileRevalidate => self.stale_while_revalidate(request, classification, &store).await,
            Strategy::ImageCache => self.image(request, classification, &store).await,
        };

        tracing::debug!(
            url = %request.url,
            ?classification,
            ?outcome,
            stored,
            status = response.status,
            "routed request"
        );

        Routed::Handled(RouteResult { response, classification, strategy: classification.strategy(), outcome, stored })
    }

    async fn cache_first(
        &self, request: &CacheRequest, classification: Classification, store: &str,
    ) -> (CachedResponse, Outcome, bool) {
        if let Some(hit) = self.lookup(classification.store_role(), request).await {
            return (hit, Outcome::CacheHit, false);
        }

        match self.network.fetch(request).await {
            Ok(response) => {
                let stored = response.is_ok() && store_quietly(self.storage.as_ref(), store, request, &response).await;
                (response, Outcome::NetworkHit, stored)
            }
            Err(e) => {
                tracing::warn!(url = %request.url, error = %e, "cache-first miss while offline");
                (self.offline_response(request).await, Outcome::Fallback, false)
            }
        }
    }

    async fn network_first(
        &self, request: &CacheRequest, classification: Classification, store: &str,
    ) -> (CachedResponse, Outcome, bool) {
        match self.network.fetch(request).await {
            Ok(response) => {
                let stored = response.is_ok() && store_quietly(self.storage.as_ref(), store, request, &response).await;
                (response, Outcome::NetworkHit, stored)
            }
            Err(e) => {
                tracing::info!(url = %request.url, error = %e, "network failed, trying cache");
                match self.lookup(classification.store_role(), request).await {
                    Some(hit) => (hit, Outcome::CacheHit, false),
                    None => (self.offline_response(request).await, Outcome::Fallback, false),
                }
            }
        }
    }

    async fn stale_while_revalidate(
        &self, request: &CacheRequest, classification: Classification, store: &str,
    ) -> (CachedResponse, Outcome, bool) {
        // The refresh is only started once the cached copy is in hand.
        if let Some(hit) = self.lookup(classification.store_role(), request).await {
            self.refresh_in_background("revalidate", request, store);
            return (hit, Outcome::CacheHit, false);
        }

        match fetch_and_store(Arc::clone(&self.network), Arc::clone(&self.storage), request.clone(), store.to_string())
            .await
        {
            Ok((response, stored)) => (response, Outcome::NetworkHit, stored),
            Err(e) => {
                tracing::warn!(url = %request.url, error = %e, "no cached copy and network failed");
                (self.offline_response(request).await, Outcome::Fallback, false)
            }
        }
    }

    async fn image(
        &self, request: &CacheRequest, classification: Classification, store: &str,
    ) -> (CachedResponse, Outcome, bool) {
        if let Some(hit) = self.lookup(classification.store_role(), request).await {
            self.refresh_in_background("image refresh", request, store);
            return (hit, Outcome::CacheHit, false);
        }

        match self.network.fetch(request).await {
            Ok(response) => {
                let stored = response.is_ok() && store_quietly(self.storage.as_ref(), store, request, &response).await;
                (response, Outcome::NetworkHit, stored)
            }
            Err(e) => {
                tracing::warn!(url = %request.url, error = %e, "image unavailable, serving placeholder");
                (fallback::placeholder_image(request.url.as_str()), Outcome::Fallback, false)
            }
        }
    }

    fn refresh_in_background(&self, label: &'static str, request: &CacheRequest, store: &str) {
        let refresh =
            fetch_and_store(Arc::clone(&self.network), Arc::clone(&self.storage), request.clone(), store.to_string());
        self.pending.wait_until(label, async move { refresh.await.map(|_| ()) });
    }

    /// First cached copy across the current stores, `primary` first.
    async fn lookup(&self, primary: StoreRole, request: &CacheRequest) -> Option<CachedResponse> {
        match self.storage.match_first(&self.names.lookup_order(primary), &request.cache_key()).await {
            Ok(hit) => hit.map(|(_, response)| response),
            Err(e) => {
                tracing::warn!(url = %request.url, error = %e, "cache read failed, treating as miss");
                None
            }
        }
    }

    /// Response for a request that has neither network nor cache.
    pub async fn offline_response(&self, request: &CacheRequest) -> CachedResponse {
        if request.accepts_html() {
            let page = CacheRequest::get(self.offline_page.clone());
            return match self.lookup(StoreRole::Static, &page).await {
                Some(cached) => cached,
                None => fallback::offline_page(request.url.as_str()),
            };
        }

        if self.classifier.is_image(request) {
            return fallback::placeholder_image(request.url.as_str());
        }

        fallback::offline_json(request.url.as_str())
    }
}

/// Fetch and, when the status is ok, write a copy to `store`.
async fn fetch_and_store(
    network: Arc<dyn Network>, storage: Arc<dyn CacheStorage>, request: CacheRequest, store: String,
) -> Result<(CachedResponse, bool), Error> {
    let response = network.fetch(&request).await?;
    let stored = response.is_ok() && store_quietly(storage.as_ref(), &store, &request, &response).await;
    Ok((response, stored))
}

/// Write a copy of `response`; a failed write is logged, never surfaced.
async fn store_quietly(
    storage: &dyn CacheStorage, store: &str, request: &CacheRequest, response: &CachedResponse,
) -> bool {
    match storage.put(store, request, response).await {
        Ok(()) => true,
        Err(e) => {
            tracing::warn!(store, url = %request.url, error = %e, "cache write failed");
            false
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{MockNetwork, config, get};
    use async_trait::async_trait;
    use std::time::Duration;
    use swcache_core::cache::StoredEntry;
    use swcache_core::{CacheDb, Destination};

    /// Store whose reads suspend on a timer, so other tasks run mid-lookup.
    struct SlowReads(Arc<CacheDb>);

    #[async_trait]
    impl CacheStorage for SlowReads {
        async fn open(&self, store: &str) -> Result<(), Error> {
            self.0.open(store).await
        }

        async fn has(&self, store: &str) -> Result<bool, Error> {
            self.0.has(store).await
        }

        async fn store_names(&self) -> Result<Vec<String>, Error> {
            self.0.store_names().await
        }

        async fn delete_store(&self, store: &str) -> Result<bool, Error> {
            self.0.delete_store(store).await
        }

        async fn put(&self, store: &str, request: &CacheRequest, response: &CachedResponse) -> Result<(), Error> {
            self.0.put(store, request, response).await
        }

        async fn get(&self, store: &str, key: &str) -> Result<Option<CachedResponse>, Error> {
            tokio::time::sleep(Duration::from_millis(50)).await;
            self.0.get(store, key).await
        }

        async fn delete_entry(&self, store: &str, key: &str) -> Result<bool, Error> {
            self.0.delete_entry(store, key).await
        }

        async fn entries(&self, store: &str) -> Result<Vec<StoredEntry>, Error> {
            self.0.entries(store).await
        }

        async fn entry_count(&self, store: &str) -> Result<usize, Error> {
            self.0.entry_count(store).await
        }

        async fn clear_all(&self) -> Result<usize, Error> {
            self.0.clear_all().await
        }
    }

    async fn setup() -> (Router, Arc<CacheDb>, Arc<MockNetwork>) {
        let db = Arc::new(CacheDb::open_in_memory().await.unwrap());
        let network = Arc::new(MockNetwork::new());
        let router = Router::new(&config(), db.clone(), network.clone()).unwrap();
        (router, db, network)
    }

    fn handled(routed: Routed) -> RouteResult {
        match routed {
            Routed::Handled(result) => result,
            Routed::PassThrough => panic!("expected request to be intercepted"),
        }
    }

    #[tokio::test]
    async fn test_non_get_passes_through_without_side_effects() {
        let (router, db, network) = setup().await;
        let routed = router.handle(&get("/api/contact").with_method("POST")).await;
        assert!(matches!(routed, Routed::PassThrough));
        assert_eq!(network.calls(), 0);
        assert!(db.store_names().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_page_cached_then_served_offline() {
        let (router, db, network) = setup().await;
        network.serve("/index.html", "text/html", "<h1>home</h1>");
        let request = get("/index.html").with_accept("text/html");

        let first = handled(router.handle(&request).await);
        assert_eq!(first.strategy, Strategy::StaleWhileRevalidate);
        assert_eq!(first.outcome, Outcome::NetworkHit);
        assert!(first.stored);
        assert_eq!(first.response.body, b"<h1>home</h1>");
        assert_eq!(db.entry_count("test-dynamic-v1").await.unwrap(), 1);

        network.set_offline(true);
        let second = handled(router.handle(&request).await);
        assert_eq!(second.outcome, Outcome::CacheHit);
        assert_eq!(second.response.body, b"<h1>home</h1>");

        router.pending().settle().await;
    }

    #[tokio::test]
    async fn test_swr_hit_refreshes_in_background() {
        let (router, db, network) = setup().await;
        network.serve("/about.html", "text/html", "v1");
        let request = get("/about.html");
        handled(router.handle(&request).await);

        network.serve("/about.html", "text/html", "v2");
        let hit = handled(router.handle(&request).await);
        assert_eq!(hit.outcome, Outcome::CacheHit);
        assert_eq!(hit.response.body, b"v1");

        router.pending().settle().await;
        let refreshed = db.get("test-dynamic-v1", &request.cache_key()).await.unwrap().unwrap();
        assert_eq!(refreshed.body, b"v2");
    }

    #[tokio::test]
    async fn test_swr_hit_is_not_overtaken_by_refresh() {
        let db = Arc::new(CacheDb::open_in_memory().await.unwrap());
        let network = Arc::new(MockNetwork::new());
        let router = Router::new(&config(), Arc::new(SlowReads(db.clone())), network.clone()).unwrap();
        let request = get("/work.html");

        network.serve("/work.html", "text/html", "v1");
        handled(router.handle(&request).await);

        network.serve("/work.html", "text/html", "v2");
        let hit = handled(router.handle(&request).await);
        assert_eq!(hit.outcome, Outcome::CacheHit);
        assert_eq!(hit.response.body, b"v1");

        router.pending().settle().await;
        assert_eq!(db.get("test-dynamic-v1", &request.cache_key()).await.unwrap().unwrap().body, b"v2");
    }

    #[tokio::test]
    async fn test_swr_does_not_cache_error_status() {
        let (router, db, network) = setup().await;
        network.serve_status("/missing.html", 404, "text/html", "nope");

        let result = handled(router.handle(&get("/missing.html")).await);
        assert_eq!(result.response.status, 404);
        assert_eq!(result.outcome, Outcome::NetworkHit);
        assert!(!result.stored);
        assert_eq!(db.entry_count("test-dynamic-v1").await.unwrap(), 0);
    }

    #[tokio::test]
    async fn test_swr_offline_without_cache_falls_back_to_offline_page() {
        let (router, _db, network) = setup().await;
        network.set_offline(true);

        let result = handled(router.handle(&get("/projects.html").with_accept("text/html")).await);
        assert_eq!(result.outcome, Outcome::Fallback);
        assert_eq!(result.response.status, 200);
        assert!(result.response.content_type().unwrap().starts_with("text/html"));
    }

    #[tokio::test]
    async fn test_offline_navigation_prefers_cached_offline_page() {
        let (router, db, network) = setup().await;
        let page = get("/offline.html");
        db.put(
            "test-static-v1",
            &page,
            &CachedResponse::new(page.url.as_str(), 200, "custom offline").with_header("content-type", "text/html"),
        )
        .await
        .unwrap();
        network.set_offline(true);

        let result = handled(router.handle(&get("/blog.html").with_accept("text/html")).await);
        assert_eq!(result.outcome, Outcome::Fallback);
        assert_eq!(result.response.body, b"custom offline");
    }

    #[tokio::test]
    async fn test_cache_first_stores_on_miss_and_hits_after() {
        let (router, db, network) = setup().await;
        network.serve("/styles.css", "text/css", "body{}");
        let request = get("/styles.css");

        let first = handled(router.handle(&request).await);
        assert_eq!(first.strategy, Strategy::CacheFirst);
        assert_eq!(first.outcome, Outcome::NetworkHit);
        assert!(first.stored);
        assert_eq!(db.entry_count("test-static-v1").await.unwrap(), 1);

        let second = handled(router.handle(&request).await);
        assert_eq!(second.outcome, Outcome::CacheHit);
        assert_eq!(network.calls_for("/styles.css"), 1);
    }

    #[tokio::test]
    async fn test_cache_first_offline_miss_returns_json_503() {
        let (router, _db, network) = setup().await;
        network.set_offline(true);

        let result = handled(router.handle(&get("/styles.css").with_accept("text/css")).await);
        assert_eq!(result.outcome, Outcome::Fallback);
        assert_eq!(result.response.status, 503);
        assert_eq!(result.response.content_type(), Some("application/json"));
    }

    #[tokio::test]
    async fn test_network_first_stores_before_returning() {
        let (router, db, network) = setup().await;
        network.serve("/api/projects", "application/json", r#"[{"id":1}]"#);
        let request = get("/api/projects").with_accept("application/json");

        let online = handled(router.handle(&request).await);
        assert_eq!(online.strategy, Strategy::NetworkFirst);
        assert!(online.stored);
        assert!(db.get("test-api-v1", &request.cache_key()).await.unwrap().is_some());

        network.set_offline(true);
        let offline = handled(router.handle(&request).await);
        assert_eq!(offline.outcome, Outcome::CacheHit);
        assert_eq!(offline.response.body, online.response.body);
    }

    #[tokio::test]
    async fn test_network_first_prefers_network_over_cache() {
        let (router, _db, network) = setup().await;
        let request = get("/api/stats");
        network.serve("/api/stats", "application/json", r#"{"v":1}"#);
        handled(router.handle(&request).await);

        network.serve("/api/stats", "application/json", r#"{"v":2}"#);
        let result = handled(router.handle(&request).await);
        assert_eq!(result.outcome, Outcome::NetworkHit);
        assert_eq!(result.response.body, br#"{"v":2}"#);
    }

    #[tokio::test]
    async fn test_network_first_offline_without_cache() {
        let (router, _db, network) = setup().await;
        network.set_offline(true);

        let result = handled(router.handle(&get("/api/contact").with_accept("application/json")).await);
        assert_eq!(result.outcome, Outcome::Fallback);
        assert_eq!(result.response.status, 503);
    }

    #[tokio::test]
    async fn test_image_offline_without_cache_returns_placeholder() {
        let (router, _db, network) = setup().await;
        network.set_offline(true);

        let result = handled(router.handle(&get("/assets/logo.png")).await);
        assert_eq!(result.strategy, Strategy::ImageCache);
        assert_eq!(result.outcome, Outcome::Fallback);
        assert_eq!(result.response.status, 200);
        assert_eq!(result.response.content_type(), Some("image/svg+xml"));
    }

    #[tokio::test]
    async fn test_image_hit_triggers_one_silent_refresh() {
        let (router, _db, network) = setup().await;
        network.serve("/assets/photo.jpg", "image/jpeg", "jpeg-bytes");
        let request = get("/assets/photo.jpg").with_destination(Destination::Image);
        handled(router.handle(&request).await);
        assert_eq!(network.calls_for("/assets/photo.jpg"), 1);

        network.set_offline(true);
        let hit = handled(router.handle(&request).await);
        assert_eq!(hit.outcome, Outcome::CacheHit);
        assert_eq!(hit.response.body, b"jpeg-bytes");

        assert_eq!(router.pending().settle().await, 1);
        assert_eq!(network.calls_for("/assets/photo.jpg"), 2);
    }

    #[tokio::test]
    async fn test_image_refresh_overwrites_store() {
        let (router, db, network) = setup().await;
        let request = get("/assets/avatar.webp");
        network.serve("/assets/avatar.webp", "image/webp", "old");
        handled(router.handle(&request).await);

        network.serve("/assets/avatar.webp", "image/webp", "new");
        let hit = handled(router.handle(&request).await);
        assert_eq!(hit.response.body, b"old");

        router.pending().settle().await;
        let stored = db.get("test-images-v1", &request.cache_key()).await.unwrap().unwrap();
        assert_eq!(stored.body, b"new");
    }

    #[tokio::test]
    async fn test_stale_version_stores_are_not_read() {
        let (router, db, network) = setup().await;
        let request = get("/styles.css");
        db.put("test-static-v0", &request, &CachedResponse::new(request.url.as_str(), 200, "old build"))
            .await
            .unwrap();
        network.set_offline(true);

        let result = handled(router.handle(&request).await);
        assert_eq!(result.outcome, Outcome::Fallback);
    }
}
