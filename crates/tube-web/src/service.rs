//! Content service trait and its two implementations.

use std::sync::Arc;

use bytes::Bytes;
use tube_cluster::{ContentRouter, RouterError};
use tube_store::{FileStore, SegmentStore};
use tube_types::ObjectKey;

use crate::error::WebError;

/// Where the front-end reads and writes segment bytes.
///
/// The front-end never knows (or assumes) which node holds a segment.
#[async_trait::async_trait]
pub trait ContentService: Send + Sync {
    /// Store one segment.
    async fn write(&self, video_id: &str, filename: &str, data: Bytes) -> Result<(), WebError>;

    /// Fetch one segment.
    async fn read(&self, video_id: &str, filename: &str) -> Result<Bytes, WebError>;
}

/// Cluster-backed content: every segment routed through the
/// consistent-hash ring.
pub struct RouterContent {
    router: Arc<ContentRouter>,
}

impl RouterContent {
    /// Wrap a router.
    pub fn new(router: Arc<ContentRouter>) -> Self {
        Self { router }
    }
}

#[async_trait::async_trait]
impl ContentService for RouterContent {
    async fn write(&self, video_id: &str, filename: &str, data: Bytes) -> Result<(), WebError> {
        self.router
            .write(video_id, filename, data)
            .await
            .map_err(router_error)
    }

    async fn read(&self, video_id: &str, filename: &str) -> Result<Bytes, WebError> {
        self.router
            .read(video_id, filename)
            .await
            .map_err(router_error)
    }
}

fn router_error(e: RouterError) -> WebError {
    match e {
        RouterError::NotFound { key } => WebError::SegmentNotFound { key },
        RouterError::Key(e) => WebError::MalformedKey(e),
        other => WebError::Content(other.to_string()),
    }
}

/// Single-machine content: segments on the local filesystem, no cluster.
pub struct LocalContent {
    store: FileStore,
}

impl LocalContent {
    /// Wrap a local file store.
    pub fn new(store: FileStore) -> Self {
        Self { store }
    }
}

#[async_trait::async_trait]
impl ContentService for LocalContent {
    async fn write(&self, video_id: &str, filename: &str, data: Bytes) -> Result<(), WebError> {
        let key = ObjectKey::new(video_id, filename)?;
        self.store
            .put(&key, data)
            .await
            .map_err(|e| WebError::Content(e.to_string()))
    }

    async fn read(&self, video_id: &str, filename: &str) -> Result<Bytes, WebError> {
        let key = ObjectKey::new(video_id, filename)?;
        match self.store.get(&key).await {
            Ok(Some(data)) => Ok(data),
            Ok(None) => Err(WebError::SegmentNotFound {
                key: key.to_string(),
            }),
            Err(e) => Err(WebError::Content(e.to_string())),
        }
    }
}
