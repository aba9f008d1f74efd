//! Scripted network used by unit tests.

use std::collections::HashMap;
use std::sync::Mutex;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};

use async_trait::async_trait;
use swcache_core::{AppConfig, CacheRequest, CachedResponse, Error};
use url::Url;

use crate::fetch::Network;

pub const ORIGIN: &str = "https://me.example";

/// Canned responses keyed by absolute URL; unknown URLs answer 404.
#[derive(Default)]
pub struct MockNetwork {
    routes: Mutex<HashMap<String, CachedResponse>>,
    offline: AtomicBool,
    calls: Mutex<Vec<String>>,
    total: AtomicUsize,
}

impl MockNetwork {
    pub fn new() -> Self {
        Self::default()
    }

    /// Serve `body` with status 200 at `path` (relative to [`ORIGIN`] or absolute).
    pub fn serve(&self, path: &str, content_type: &str, body: &str) {
        self.serve_status(path, 200, content_type, body);
    }

    pub fn serve_status(&self, path: &str, status: u16, content_type: &str, body: &str) {
        let url = absolute(path);
        let response = CachedResponse::new(url.as_str(), status, body)
            .with_header("content-type", content_type)
            .with_header("date", chrono::Utc::now().to_rfc2822());
        self.routes.lock().unwrap().insert(url.to_string(), response);
    }

    pub fn set_offline(&self, offline: bool) {
        self.offline.store(offline, Ordering::SeqCst);
    }

    /// Every fetch attempt, including ones made while offline.
    pub fn calls(&self) -> usize {
        self.total.load(Ordering::SeqCst)
    }

    pub fn calls_for(&self, path: &str) -> usize {
        let url = absolute(path).to_string();
        self.calls.lock().unwrap().iter().filter(|u| **u == url).count()
    }
}

#[async_trait]
impl Network for MockNetwork {
    async fn fetch(&self, request: &CacheRequest) -> Result<CachedResponse, Error> {
        self.total.fetch_add(1, Ordering::SeqCst);
        self.calls.lock().unwrap().push(request.url.to_string());

        if self.offline.load(Ordering::SeqCst) {
            return Err(Error::NetworkFailed(format!("{}: offline", request.url)));
        }

        let routes = self.routes.lock().unwrap();
        Ok(routes
            .get(request.url.as_str())
            .cloned()
            .unwrap_or_else(|| CachedResponse::new(request.url.as_str(), 404, "not found")))
    }
}

pub fn absolute(path: &str) -> Url {
    Url::parse(ORIGIN).unwrap().join(path).unwrap()
}

pub fn get(path: &str) -> CacheRequest {
    CacheRequest::get(absolute(path))
}

pub fn config() -> AppConfig {
    AppConfig {
        origin: ORIGIN.into(),
        cache_prefix: "test".into(),
        version: "v1".into(),
        static_assets: vec!["/".into(), "/index.html".into(), "/styles.css".into(), "/offline.html".into()],
        ..Default::default()
    }
}
