//! Cache Store Module
//!
//! Whole-object blob storage keyed by canonical request identity.

use std::collections::HashMap;

use async_trait::async_trait;
use tokio::sync::RwLock;

use crate::cache::entry::MediaResponse;
use crate::error::StoreError;

/// Result type for blob store operations.
pub type StoreResult<T> = std::result::Result<T, StoreError>;

// == Blob Store ==
/// Durable key/value store for materialized responses.
///
/// `put` is idempotent per key and `delete` of an absent key succeeds.
#[async_trait]
pub trait BlobStore: Send + Sync {
    /// Returns the stored response for `key`, if any.
    async fn lookup(&self, key: &str) -> StoreResult<Option<MediaResponse>>;

    /// Stores `response` under `key`, replacing any previous object.
    async fn put(&self, key: &str, response: &MediaResponse) -> StoreResult<()>;

    /// Removes `key`. Absent keys are not an error.
    async fn delete(&self, key: &str) -> StoreResult<()>;
}

// == Memory Blob Store ==
/// Process-local blob store.
#[derive(Debug, Default)]
pub struct MemoryBlobStore {
    entries: RwLock<HashMap<String, MediaResponse>>,
}

impl MemoryBlobStore {
    // == Constructor ==
    pub fn new() -> Self {
        Self::default()
    }

    // == Length ==
    /// Returns the number of stored objects.
    pub async fn len(&self) -> usize {
        self.entries.read().await.len()
    }

    // == Is Empty ==
    pub async fn is_empty(&self) -> bool {
        self.entries.read().await.is_empty()
    }

    // == Contains ==
    pub async fn contains(&self, key: &str) -> bool {
        self.entries.read().await.contains_key(key)
    }
}

#[async_trait]
impl BlobStore for MemoryBlobStore {
    async fn lookup(&self, key: &str) -> StoreResult<Option<MediaResponse>> {
        Ok(self.entries.read().await.get(key).cloned())
    }

    async fn put(&self, key: &str, response: &MediaResponse) -> StoreResult<()> {
        self.entries
            .write()
            .await
            .insert(key.to_string(), response.clone());
        Ok(())
    }

    async fn delete(&self, key: &str) -> StoreResult<()> {
        self.entries.write().await.remove(key);
        Ok(())
    }
}
