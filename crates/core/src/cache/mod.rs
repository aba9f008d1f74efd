//! SQLite-backed response stores.
//!
//! This module provides named, versioned stores of request/response pairs
//! using SQLite with async access via tokio-rusqlite. It supports:
//!
//! - Store names derived from a role and a version suffix
//! - Request identity keys (method + URL, SHA-256)
//! - Automatic schema migrations
//! - A date-header retention sweep

pub mod connection;
pub mod entries;
pub mod hash;
pub mod migrations;
pub mod naming;
pub mod storage;
pub mod sweep;

pub use crate::Error;

pub use connection::CacheDb;
pub use naming::{StoreNames, StoreRole};
pub use storage::{CacheStorage, StoredEntry};
pub use sweep::{SweepReport, sweep_expired};
