//! Worker configuration with layered loading.
//!
//! Everything the worker used to hold as module-level constants (store
//! names, asset lists, allow-lists, retention) is declared here and passed
//! into the router and lifecycle at construction.
//!
//! Loading precedence (highest wins):
//!
//! 1. Environment variables (SW_CACHE_*)
//! 2. TOML config file (if SW_CACHE_CONFIG_FILE set)
//! 3. Built-in defaults

use std::collections::BTreeMap;
use std::path::PathBuf;
use std::time::Duration;

use figment::{
    Figment,
    providers::{Env, Format, Serialized, Toml},
};
use serde::{Deserialize, Serialize};

use crate::cache::naming::StoreNames;

mod validation;

pub use validation::ConfigError;

/// How install-time bulk pre-caching treats a single failing URL.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PrecachePolicy {
    /// One failure rejects the whole batch and nothing is written.
    #[default]
    AllOrNothing,
    /// Failures are reported per URL; every success is still stored.
    Isolated,
}

/// Worker configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppConfig {
    /// Site origin that relative asset paths resolve against.
    ///
    /// Set via SW_CACHE_ORIGIN.
    #[serde(default = "default_origin")]
    pub origin: String,

    /// Leading component of every store name.
    #[serde(default = "default_cache_prefix")]
    pub cache_prefix: String,

    /// Version suffix embedded in store names; bumping it invalidates all stores.
    ///
    /// Set via SW_CACHE_VERSION.
    #[serde(default = "default_version")]
    pub version: String,

    /// Title used for notifications without one.
    #[serde(default = "default_app_name")]
    pub app_name: String,

    /// Assets pre-cached into the static store at install and served cache-first.
    #[serde(default = "default_static_assets")]
    pub static_assets: Vec<String>,

    /// Images pre-cached into the images store at install.
    #[serde(default)]
    pub critical_images: Vec<String>,

    /// URL prefixes always tried against the network first.
    ///
    /// Patterns starting with `/` are same-origin path prefixes, anything
    /// else is a prefix of the absolute URL.
    #[serde(default = "default_network_first")]
    pub network_first: Vec<String>,

    /// Cross-origin hosts the worker may intercept (`host` or `*.suffix`).
    ///
    /// Empty means every host is eligible.
    #[serde(default)]
    pub cacheable_hosts: Vec<String>,

    /// Path extensions that mark a request as an image.
    #[serde(default = "default_image_extensions")]
    pub image_extensions: Vec<String>,

    /// Pre-cached page served to offline navigations.
    #[serde(default = "default_offline_page")]
    pub offline_page: String,

    #[serde(default)]
    pub precache_policy: PrecachePolicy,

    /// Activate right after a successful install instead of waiting.
    #[serde(default = "default_true")]
    pub skip_waiting: bool,

    /// Entries in the runtime stores older than this are swept.
    #[serde(default = "default_retention_days")]
    pub retention_days: u32,

    /// Seconds between periodic sweeps.
    #[serde(default = "default_sweep_interval_secs")]
    pub sweep_interval_secs: u64,

    /// Notification action name to in-app URL.
    #[serde(default = "default_notification_routes")]
    pub notification_routes: BTreeMap<String, String>,

    /// Path to SQLite cache database.
    ///
    /// Set via SW_CACHE_DB_PATH.
    #[serde(default = "default_db_path")]
    pub db_path: PathBuf,

    /// User-Agent string for network requests.
    #[serde(default = "default_user_agent")]
    pub user_agent: String,

    /// Network request timeout in milliseconds.
    #[serde(default = "default_timeout_ms")]
    pub timeout_ms: u64,

    /// Maximum bytes to fetch per request.
    #[serde(default = "default_max_bytes")]
    pub max_bytes: usize,

    /// Concurrent fetches during install pre-caching.
    #[serde(default = "default_precache_concurrency")]
    pub precache_concurrency: usize,
}

fn default_origin() -> String {
    "http://localhost:8080".into()
}

fn default_cache_prefix() -> String {
    "portfolio".into()
}

fn default_version() -> String {
    "v1.2.0".into()
}

fn default_app_name() -> String {
    "Portfolio".into()
}

fn default_static_assets() -> Vec<String> {
    [
        "/",
        "/index.html",
        "/styles.css",
        "/script.js",
        "/manifest.json",
        "/assets/images/logo.png",
        "/assets/icons/icon-192x192.png",
        "/assets/icons/icon-512x512.png",
        "/offline.html",
    ]
    .into_iter()
    .map(String::from)
    .collect()
}

fn default_network_first() -> Vec<String> {
    [
        "/api/",
        "https://api.",
        "https://analytics.",
        "https://www.google-analytics.com/",
        "https://www.googletagmanager.com/",
    ]
    .into_iter()
    .map(String::from)
    .collect()
}

fn default_image_extensions() -> Vec<String> {
    [".jpg", ".jpeg", ".png", ".gif", ".webp", ".svg", ".ico"]
        .into_iter()
        .map(String::from)
        .collect()
}

fn default_offline_page() -> String {
    "/offline.html".into()
}

fn default_true() -> bool {
    true
}

fn default_retention_days() -> u32 {
    7
}

fn default_sweep_interval_secs() -> u64 {
    24 * 60 * 60
}

fn default_notification_routes() -> BTreeMap<String, String> {
    BTreeMap::from([("explore".to_string(), "/".to_string())])
}

fn default_db_path() -> PathBuf {
    PathBuf::from("./sw-cache.sqlite")
}

fn default_user_agent() -> String {
    "sw-cache/0.1".into()
}

fn default_timeout_ms() -> u64 {
    20_000
}

fn default_max_bytes() -> usize {
    5_242_880 // 5MB
}

fn default_precache_concurrency() -> usize {
    4
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            origin: default_origin(),
            cache_prefix: default_cache_prefix(),
            version: default_version(),
            app_name: default_app_name(),
            static_assets: default_static_assets(),
            critical_images: Vec::new(),
            network_first: default_network_first(),
            cacheable_hosts: Vec::new(),
            image_extensions: default_image_extensions(),
            offline_page: default_offline_page(),
            precache_policy: PrecachePolicy::default(),
            skip_waiting: true,
            retention_days: default_retention_days(),
            sweep_interval_secs: default_sweep_interval_secs(),
            notification_routes: default_notification_routes(),
            db_path: default_db_path(),
            user_agent: default_user_agent(),
            timeout_ms: default_timeout_ms(),
            max_bytes: default_max_bytes(),
            precache_concurrency: default_precache_concurrency(),
        }
    }
}

impl AppConfig {
    /// Timeout as Duration for use with reqwest/tokio.
    pub fn timeout(&self) -> Duration {
        Duration::from_millis(self.timeout_ms)
    }

    /// Interval between periodic sweeps.
    pub fn sweep_interval(&self) -> Duration {
        Duration::from_secs(self.sweep_interval_secs)
    }

    /// Maximum age of an entry in the runtime stores.
    pub fn retention(&self) -> chrono::Duration {
        chrono::Duration::days(i64::from(self.retention_days))
    }

    /// Store names for the configured prefix and version.
    pub fn store_names(&self) -> StoreNames {
        StoreNames::new(&self.cache_prefix, &self.version)
    }

    /// Load configuration from all sources with layered precedence.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if the file or environment cannot be parsed,
    /// or if validation fails after loading.
    pub fn load() -> Result<Self, ConfigError> {
        let mut figment = Figment::from(Serialized::defaults(Self::default()));

        if let Ok(config_path) = std::env::var("SW_CACHE_CONFIG_FILE") {
            figment = figment.merge(Toml::file(&config_path));
        }

        figment = figment.merge(
            Env::prefixed("SW_CACHE_")
                .ignore(&["config_file"])
                .map(|key| key.as_str().to_lowercase().into())
                .split("__"),
        );

        let config: Self = figment.extract().map_err(|e| ConfigError::LoadFailed(e.to_string()))?;

        config.validate()?;

        Ok(config)
    }
}
