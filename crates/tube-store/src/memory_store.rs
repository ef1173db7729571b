//! In-memory segment storage backend.

use std::collections::HashMap;
use std::sync::RwLock;

use bytes::Bytes;
use tracing::debug;
use tube_types::ObjectKey;

use crate::error::StoreError;
use crate::traits::SegmentStore;

/// In-memory segment store backed by a `RwLock<HashMap>`.
///
/// Used by tests and by nodes configured to run without disk persistence.
#[derive(Default)]
pub struct MemoryStore {
    segments: RwLock<HashMap<String, Bytes>>,
}

impl MemoryStore {
    /// Create an empty in-memory store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of stored segments.
    pub fn len(&self) -> usize {
        self.segments.read().expect("lock poisoned").len()
    }

    /// Whether the store holds no segments.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[async_trait::async_trait]
impl SegmentStore for MemoryStore {
    async fn put(&self, key: &ObjectKey, data: Bytes) -> Result<(), StoreError> {
        debug!(%key, size = data.len(), "storing segment in memory");
        self.segments
            .write()
            .expect("lock poisoned")
            .insert(key.to_string(), data);
        Ok(())
    }

    async fn get(&self, key: &ObjectKey) -> Result<Option<Bytes>, StoreError> {
        let map = self.segments.read().expect("lock poisoned");
        Ok(map.get(&key.to_string()).cloned())
    }

    async fn delete(&self, key: &ObjectKey) -> Result<(), StoreError> {
        self.segments
            .write()
            .expect("lock poisoned")
            .remove(&key.to_string());
        Ok(())
    }

    async fn list(&self) -> Result<Vec<ObjectKey>, StoreError> {
        let map = self.segments.read().expect("lock poisoned");
        // Keys were validated on insert, so parsing cannot fail here.
        Ok(map.keys().filter_map(|k| ObjectKey::parse(k).ok()).collect())
    }
}
