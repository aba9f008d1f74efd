//! Network access for the worker.
//!
//! ### The `Network` seam
//! - Strategies only see `Network::fetch`; an `Err` means the network gave
//!   nothing back (offline, DNS, timeout) and triggers cache or fallback.
//! - Any HTTP status is a successful fetch. Deciding whether a status is
//!   worth caching is the strategy's job.
//!
//! ### HttpNetwork
//! - reqwest client with user agent, timeout, redirect and body-size limits.
//! - Response headers are flattened to lower-case names.

pub mod url;

use async_trait::async_trait;
use reqwest::{Client, header};
use std::collections::BTreeMap;
use std::time::{Duration, Instant};

pub use self::url::{UrlError, parse_origin, resolve};

use swcache_core::{AppConfig, CacheRequest, CachedResponse, Error};

/// The host's fetch capability.
#[async_trait]
pub trait Network: Send + Sync {
    /// Perform the request. `Err` only when no response was received.
    async fn fetch(&self, request: &CacheRequest) -> Result<CachedResponse, Error>;
}

/// Configuration for the HTTP network.
#[derive(Debug, Clone)]
pub struct FetchConfig {
    /// User agent string (default: "sw-cache/0.1")
    pub user_agent: String,

    /// Maximum response body size in bytes (default: 5MB)
    pub max_bytes: usize,

    /// Request timeout (default: 20s)
    pub timeout: Duration,

    /// Maximum number of redirects to follow (default: 5)
    pub max_redirects: usize,
}

impl Default for FetchConfig {
    fn default() -> Self {
        Self {
            user_agent: "sw-cache/0.1".to_string(),
            max_bytes: 5 * 1024 * 1024,
            timeout: Duration::from_millis(20000),
            max_redirects: 5,
        }
    }
}

impl From<&AppConfig> for FetchConfig {
    fn from(config: &AppConfig) -> Self {
        Self {
            user_agent: config.user_agent.clone(),
            max_bytes: config.max_bytes,
            timeout: config.timeout(),
            ..Default::default()
        }
    }
}

/// reqwest-backed network.
pub struct HttpNetwork {
    http: Client,
    config: FetchConfig,
}

impl HttpNetwork {
    /// Create a new HTTP network with the given configuration.
    pub fn new(config: FetchConfig) -> Result<Self, Error> {
        let http = Client::builder()
            .user_agent(&config.user_agent)
            .timeout(config.timeout)
            .redirect(reqwest::redirect::Policy::limited(config.max_redirects))
            .use_rustls_tls()
            .gzip(true)
            .brotli(true)
            .deflate(true)
            .build()
            .map_err(|e| Error::NetworkFailed(format!("failed to build HTTP client: {}", e)))?;

        Ok(Self { http, config })
    }

    /// Get reference to the configuration.
    pub fn config(&self) -> &FetchConfig {
        &self.config
    }
}

#[async_trait]
impl Network for HttpNetwork {
    async fn fetch(&self, request: &CacheRequest) -> Result<CachedResponse, Error> {
        let start = Instant::now();

        let method = reqwest::Method::from_bytes(request.method.to_ascii_uppercase().as_bytes())
            .map_err(|e| Error::InvalidInput(format!("bad method {}: {}", request.method, e)))?;

        let mut builder = self.http.request(method, request.url.as_str());
        if let Some(accept) = &request.accept {
            builder = builder.header(header::ACCEPT, accept);
        }

        let response = builder
            .send()
            .await
            .map_err(|e| Error::NetworkFailed(format!("{}: {}", request.url, e)))?;

        if let Some(len) = response.content_length()
            && exceeds(len, self.config.max_bytes)
        {
            return Err(Error::FetchTooLarge(format!("{} bytes exceeds {}", len, self.config.max_bytes)));
        }

        let status = response.status().as_u16();
        let final_url = response.url().to_string();
        let headers = flatten_headers(response.headers());

        let bytes = response
            .bytes()
            .await
            .map_err(|e| Error::NetworkFailed(format!("failed to read response: {}", e)))?;

        if bytes.len() > self.config.max_bytes {
            return Err(Error::FetchTooLarge(format!(
                "{} bytes exceeds {}",
                bytes.len(),
                self.config.max_bytes
            )));
        }

        tracing::debug!(
            url = %request.url,
            status,
            bytes = bytes.len(),
            fetch_ms = start.elapsed().as_millis() as u64,
            "network fetch"
        );

        Ok(CachedResponse { url: final_url, status, headers, body: bytes.to_vec(), stored_at: None })
    }
}

/// Whether a declared content length is over `max`. Lengths that don't fit
/// in `usize` always are.
fn exceeds(len: u64, max: usize) -> bool {
    usize::try_from(len).ok().is_none_or(|len| len > max)
}

/// Lower-case header names; repeated headers are joined with ", ".
fn flatten_headers(headers: &header::HeaderMap) -> BTreeMap<String, String> {
    let mut flat: BTreeMap<String, String> = BTreeMap::new();
    for (name, value) in headers {
        let Ok(value) = value.to_str() else { continue };
        flat.entry(name.as_str().to_string())
            .and_modify(|existing| {
                existing.push_str(", ");
                existing.push_str(value);
            })
            .or_insert_with(|| value.to_string());
    }
    flat
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fetch_config_default() {
        let config = FetchConfig::default();
        assert_eq!(config.user_agent, "sw-cache/0.1");
        assert_eq!(config.max_bytes, 5 * 1024 * 1024);
        assert_eq!(config.timeout, Duration::from_millis(20000));
        assert_eq!(config.max_redirects, 5);
    }

    #[test]
    fn test_fetch_config_from_app_config() {
        let app = AppConfig { user_agent: "test/1".into(), timeout_ms: 1500, ..Default::default() };
        let config = FetchConfig::from(&app);
        assert_eq!(config.user_agent, "test/1");
        assert_eq!(config.timeout, Duration::from_millis(1500));
    }

    #[test]
    fn test_flatten_headers_joins_repeats() {
        let mut headers = header::HeaderMap::new();
        headers.append(header::CONTENT_TYPE, "text/html".parse().unwrap());
        headers.append(header::VARY, "accept".parse().unwrap());
        headers.append(header::VARY, "origin".parse().unwrap());

        let flat = flatten_headers(&headers);
        assert_eq!(flat.get("content-type").map(String::as_str), Some("text/html"));
        assert_eq!(flat.get("vary").map(String::as_str), Some("accept, origin"));
    }

    #[test]
    fn test_content_length_limit() {
        assert!(!exceeds(1024, 1024));
        assert!(exceeds(1025, 1024));
        assert!(exceeds(u64::MAX, usize::MAX - 1));
    }

    #[tokio::test]
    async fn test_http_network_new() {
        let network = HttpNetwork::new(FetchConfig::default());
        assert!(network.is_ok());
    }
}
