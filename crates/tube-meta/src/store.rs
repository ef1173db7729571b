//! [`MetaStore`] implementation with fjall (disk) and in-memory backends.

use std::collections::BTreeMap;
use std::path::Path;
use std::sync::RwLock;

use fjall::{Config, Keyspace, PartitionCreateOptions, PartitionHandle};
use tracing::debug;
use tube_types::VideoMetadata;

use crate::MetaError;

type Result<T> = std::result::Result<T, MetaError>;

/// Inner backend: fjall-backed (disk) or pure in-memory.
enum Backend {
    Fjall {
        #[allow(dead_code)]
        keyspace: Keyspace,
        /// video id → postcard-encoded [`VideoMetadata`].
        videos: PartitionHandle,
    },
    Memory(RwLock<BTreeMap<String, Vec<u8>>>),
}

/// Metadata store tracking uploaded videos.
pub struct MetaStore {
    backend: Backend,
}

impl MetaStore {
    /// Open a persistent store at the given path (fjall backend).
    pub fn open(path: impl AsRef<Path>) -> Result<Self> {
        let keyspace = Config::new(path).open()?;
        let videos = keyspace.open_partition("videos", PartitionCreateOptions::default())?;
        Ok(Self {
            backend: Backend::Fjall { keyspace, videos },
        })
    }

    /// Create a pure in-memory store. Zero disk I/O.
    pub fn in_memory() -> Self {
        Self {
            backend: Backend::Memory(RwLock::new(BTreeMap::new())),
        }
    }

    /// Register a new video. Fails with [`MetaError::AlreadyExists`] if
    /// the id is taken.
    pub fn create(&self, video_id: &str, uploaded_at_ms: u64) -> Result<()> {
        let record = VideoMetadata {
            id: video_id.to_string(),
            uploaded_at_ms,
        };
        let value = postcard::to_allocvec(&record)?;

        match &self.backend {
            Backend::Fjall { videos, .. } => {
                if videos.get(video_id)?.is_some() {
                    return Err(MetaError::AlreadyExists {
                        id: video_id.to_string(),
                    });
                }
                videos.insert(video_id, value)?;
            }
            Backend::Memory(map) => {
                let mut map = map.write().expect("lock poisoned");
                if map.contains_key(video_id) {
                    return Err(MetaError::AlreadyExists {
                        id: video_id.to_string(),
                    });
                }
                map.insert(video_id.to_string(), value);
            }
        }
        debug!(video_id, "registered video");
        Ok(())
    }

    /// Look up one video's record.
    pub fn read(&self, video_id: &str) -> Result<VideoMetadata> {
        let raw = match &self.backend {
            Backend::Fjall { videos, .. } => videos.get(video_id)?.map(|slice| slice.to_vec()),
            Backend::Memory(map) => map
                .read()
                .expect("lock poisoned")
                .get(video_id)
                .cloned(),
        };
        match raw {
            Some(bytes) => Ok(postcard::from_bytes(&bytes)?),
            None => Err(MetaError::NotFound {
                id: video_id.to_string(),
            }),
        }
    }

    /// All records, newest upload first.
    pub fn list(&self) -> Result<Vec<VideoMetadata>> {
        let mut records = Vec::new();
        match &self.backend {
            Backend::Fjall { videos, .. } => {
                for entry in videos.iter() {
                    let (_key, value) = entry?;
                    records.push(postcard::from_bytes::<VideoMetadata>(&value)?);
                }
            }
            Backend::Memory(map) => {
                for value in map.read().expect("lock poisoned").values() {
                    records.push(postcard::from_bytes::<VideoMetadata>(value)?);
                }
            }
        }
        records.sort_by(|a, b| {
            b.uploaded_at_ms
                .cmp(&a.uploaded_at_ms)
                .then_with(|| a.id.cmp(&b.id))
        });
        Ok(records)
    }
}
