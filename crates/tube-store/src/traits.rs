//! Core trait for segment storage.

use bytes::Bytes;
use tube_types::ObjectKey;

use crate::error::StoreError;

/// Trait for storing and retrieving video segments on a node.
///
/// All implementations must be `Send + Sync` for use across async tasks.
/// Data is passed as [`Bytes`] to keep transfers copy-free on the hot path.
#[async_trait::async_trait]
pub trait SegmentStore: Send + Sync {
    /// Store a segment, overwriting any previous bytes under the same key.
    async fn put(&self, key: &ObjectKey, data: Bytes) -> Result<(), StoreError>;

    /// Retrieve a segment. Returns `None` if not present.
    async fn get(&self, key: &ObjectKey) -> Result<Option<Bytes>, StoreError>;

    /// Delete a segment. Deleting an absent segment succeeds.
    async fn delete(&self, key: &ObjectKey) -> Result<(), StoreError>;

    /// List every stored segment as its composed key.
    async fn list(&self) -> Result<Vec<ObjectKey>, StoreError>;
}
