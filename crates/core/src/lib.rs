//! Core types and shared functionality for sw-cache.
//!
//! This crate provides:
//! - Named, versioned response stores with a SQLite backend
//! - Request/response snapshots
//! - Unified error types
//! - Configuration structures

pub mod cache;
pub mod config;
pub mod error;
pub mod http;

pub use cache::{CacheDb, CacheStorage, StoreNames, StoreRole};
pub use config::{AppConfig, ConfigError, PrecachePolicy};
pub use error::Error;
pub use http::{CacheRequest, CachedResponse, Destination};
