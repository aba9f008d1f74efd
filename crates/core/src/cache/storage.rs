//! The cache store seam.
//!
//! Named stores map request keys to the most recent response snapshot.
//! Writes are atomic per key; nothing spans two stores.

use async_trait::async_trait;

use crate::Error;
use crate::http::{CacheRequest, CachedResponse};

/// One stored request/response pair.
#[derive(Debug, Clone)]
pub struct StoredEntry {
    pub key: String,
    pub method: String,
    pub url: String,
    pub response: CachedResponse,
}

/// Named, versioned key-value stores of responses.
#[async_trait]
pub trait CacheStorage: Send + Sync {
    /// Create the store if it doesn't exist.
    async fn open(&self, store: &str) -> Result<(), Error>;

    async fn has(&self, store: &str) -> Result<bool, Error>;

    /// Names of every existing store, sorted.
    async fn store_names(&self) -> Result<Vec<String>, Error>;

    /// Delete a store and all its entries. Returns false if it didn't exist.
    async fn delete_store(&self, store: &str) -> Result<bool, Error>;

    /// Insert or overwrite the entry for `request`, creating the store lazily.
    ///
    /// `stored_at` is stamped with the current time unless already set.
    async fn put(&self, store: &str, request: &CacheRequest, response: &CachedResponse) -> Result<(), Error>;

    async fn get(&self, store: &str, key: &str) -> Result<Option<CachedResponse>, Error>;

    async fn delete_entry(&self, store: &str, key: &str) -> Result<bool, Error>;

    async fn entries(&self, store: &str) -> Result<Vec<StoredEntry>, Error>;

    async fn entry_count(&self, store: &str) -> Result<usize, Error>;

    /// Delete every store. Returns the number of stores removed.
    async fn clear_all(&self) -> Result<usize, Error>;

    /// First hit for `key` across `stores`, in order.
    async fn match_first(&self, stores: &[String], key: &str) -> Result<Option<(String, CachedResponse)>, Error> {
        for store in stores {
            if let Some(response) = self.get(store, key).await? {
                return Ok(Some((store.clone(), response)));
            }
        }
        Ok(None)
    }
}
