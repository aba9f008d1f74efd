//! Request classification.
//!
//! A pure function of URL, `destination` and the declared configuration.
//! Rules are checked in priority order and the first match wins:
//!
//! 1. document (path `/`, `*.html`, destination `document`)
//! 2. image (configured extension or destination `image`)
//! 3. network-first allow-list
//! 4. static asset list
//! 5. everything else

use std::collections::HashSet;

use serde::{Deserialize, Serialize};
use swcache_core::{AppConfig, CacheRequest, Destination, Error, StoreRole};
use url::Url;

use crate::fetch::{parse_origin, resolve};

/// Closed set of request kinds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, schemars::JsonSchema)]
#[serde(rename_all = "snake_case")]
pub enum Classification {
    Document,
    Image,
    Api,
    StaticAsset,
    Generic,
}

/// Caching strategy applied to a classified request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, schemars::JsonSchema)]
#[serde(rename_all = "snake_case")]
pub enum Strategy {
    CacheFirst,
    NetworkFirst,
    StaleWhileRevalidate,
    ImageCache,
}

impl Classification {
    pub fn strategy(self) -> Strategy {
        match self {
            Classification::Document | Classification::Generic => Strategy::StaleWhileRevalidate,
            Classification::Image => Strategy::ImageCache,
            Classification::Api => Strategy::NetworkFirst,
            Classification::StaticAsset => Strategy::CacheFirst,
        }
    }

    /// Store that network responses for this kind are written to.
    pub fn store_role(self) -> StoreRole {
        match self {
            Classification::Document | Classification::Generic => StoreRole::Dynamic,
            Classification::Image => StoreRole::Images,
            Classification::Api => StoreRole::Api,
            Classification::StaticAsset => StoreRole::Static,
        }
    }
}

/// Classifier built once from configuration.
#[derive(Debug, Clone)]
pub struct Classifier {
    origin: Url,
    static_urls: HashSet<String>,
    network_first: Vec<String>,
    image_extensions: Vec<String>,
    cacheable_hosts: Vec<String>,
}

impl Classifier {
    pub fn new(config: &AppConfig) -> Result<Self, Error> {
        let origin = parse_origin(&config.origin).map_err(|e| Error::InvalidUrl(format!("origin: {e}")))?;

        let static_urls = config
            .static_assets
            .iter()
            .map(|asset| {
                resolve(&origin, asset)
                    .map(String::from)
                    .map_err(|e| Error::InvalidUrl(format!("static asset {asset}: {e}")))
            })
            .collect::<Result<HashSet<_>, _>>()?;

        Ok(Self {
            origin,
            static_urls,
            network_first: config.network_first.clone(),
            image_extensions: config.image_extensions.iter().map(|ext| ext.to_lowercase()).collect(),
            cacheable_hosts: config.cacheable_hosts.iter().map(|host| host.to_lowercase()).collect(),
        })
    }

    pub fn origin(&self) -> &Url {
        &self.origin
    }

    /// Whether the worker handles this request at all.
    ///
    /// Non-GET and non-http(s) requests pass through, as do cross-origin
    /// requests to hosts outside `cacheable_hosts` when that list is set.
    pub fn intercepts(&self, request: &CacheRequest) -> bool {
        if !request.is_get() || !matches!(request.url.scheme(), "http" | "https") {
            return false;
        }

        if self.cacheable_hosts.is_empty()
            || self.is_same_origin(&request.url)
            || self.is_static(request)
            || self.is_network_first(request)
        {
            return true;
        }

        let host = request.url.host_str().unwrap_or_default();
        self.cacheable_hosts.iter().any(|pattern| host_matches(pattern, host))
    }

    pub fn classify(&self, request: &CacheRequest) -> Classification {
        if self.is_document(request) {
            Classification::Document
        } else if self.is_image(request) {
            Classification::Image
        } else if self.is_network_first(request) {
            Classification::Api
        } else if self.is_static(request) {
            Classification::StaticAsset
        } else {
            Classification::Generic
        }
    }

    pub fn is_document(&self, request: &CacheRequest) -> bool {
        let path = request.url.path();
        request.destination == Destination::Document || path == "/" || path.to_lowercase().ends_with(".html")
    }

    pub fn is_image(&self, request: &CacheRequest) -> bool {
        if request.destination == Destination::Image {
            return true;
        }
        let path = request.url.path().to_lowercase();
        self.image_extensions.iter().any(|ext| path.ends_with(ext.as_str()))
    }

    pub fn is_network_first(&self, request: &CacheRequest) -> bool {
        self.network_first.iter().any(|pattern| {
            if pattern.starts_with('/') {
                self.is_same_origin(&request.url) && request.url.path().starts_with(pattern.as_str())
            } else {
                request.url.as_str().starts_with(pattern.as_str())
            }
        })
    }

    pub fn is_static(&self, request: &CacheRequest) -> bool {
        self.static_urls.contains(request.url.as_str())
    }

    fn is_same_origin(&self, url: &Url) -> bool {
        url.origin() == self.origin.origin()
    }
}

/// `host` matches `pattern` exactly, or `*.suffix` matches any subdomain of `suffix`.
fn host_matches(pattern: &str, host: &str) -> bool {
    match pattern.strip_prefix("*.") {
        Some(suffix) => host.len() > suffix.len() && host.ends_with(suffix) && host[..host.len() - suffix.len()].ends_with('.'),
        None => pattern == host,
    }
}
