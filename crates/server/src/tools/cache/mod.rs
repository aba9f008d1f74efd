//! Cache-related MCP tools.
//!
//! This module provides tools for inspecting and maintaining the response stores.

pub mod get;
pub mod stores;
pub mod sweep;

pub use get::{CacheGetParams, get_impl};
pub use stores::{CacheStoresParams, stores_impl};
pub use sweep::{CacheSweepParams, sweep_impl};
