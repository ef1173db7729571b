//! File-based segment storage backend.
//!
//! Stores one file per segment at `{base_dir}/{videoId}/{filename}`,
//! creating intermediate directories as needed. The filename may contain
//! `/` separators, so a segment can land arbitrarily deep.

use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicU64, Ordering};

use bytes::Bytes;
use tracing::debug;
use tube_types::ObjectKey;

use crate::error::StoreError;
use crate::traits::SegmentStore;

/// Suffix for in-flight writes; listings skip these.
const TMP_SUFFIX: &str = ".tmp";

/// Distinguishes concurrent in-flight writes to the same key.
static TMP_COUNTER: AtomicU64 = AtomicU64::new(0);

/// File-backed segment store rooted at a base directory.
///
/// Writes are atomic: data goes to a temporary file in the target
/// directory first, then is renamed into place, so a crashed node never
/// leaves a half-written segment behind under its final name.
pub struct FileStore {
    base_dir: PathBuf,
}

impl FileStore {
    /// Create a new file store rooted at the given directory.
    ///
    /// The directory is created if it does not exist.
    pub fn new(base_dir: impl AsRef<Path>) -> Result<Self, StoreError> {
        let base_dir = base_dir.as_ref().to_path_buf();
        std::fs::create_dir_all(&base_dir)?;
        Ok(Self { base_dir })
    }

    /// Compute the on-disk path for a key, rejecting filenames whose
    /// components would escape the base directory.
    fn segment_path(&self, key: &ObjectKey) -> Result<PathBuf, StoreError> {
        let mut path = self.base_dir.join(key.video_id());
        for component in key.filename().split('/') {
            if component.is_empty() || component == "." || component == ".." {
                return Err(StoreError::UnsafePath(key.to_string()));
            }
            path.push(component);
        }
        Ok(path)
    }
}

#[async_trait::async_trait]
impl SegmentStore for FileStore {
    async fn put(&self, key: &ObjectKey, data: Bytes) -> Result<(), StoreError> {
        let path = self.segment_path(key)?;
        if let Some(parent) = path.parent() {
            tokio::fs::create_dir_all(parent).await?;
        }

        // Atomic write: temp file in the same directory, then rename.
        let file_name = path
            .file_name()
            .and_then(|n| n.to_str())
            .ok_or_else(|| StoreError::UnsafePath(key.to_string()))?;
        let serial = TMP_COUNTER.fetch_add(1, Ordering::Relaxed);
        let tmp_path = path.with_file_name(format!("{file_name}.{serial}{TMP_SUFFIX}"));
        tokio::fs::write(&tmp_path, &data).await?;
        tokio::fs::rename(&tmp_path, &path).await?;

        debug!(%key, size = data.len(), "stored segment file");
        Ok(())
    }

    async fn get(&self, key: &ObjectKey) -> Result<Option<Bytes>, StoreError> {
        let path = self.segment_path(key)?;
        match tokio::fs::read(&path).await {
            Ok(data) => Ok(Some(Bytes::from(data))),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(StoreError::Io(e)),
        }
    }

    async fn delete(&self, key: &ObjectKey) -> Result<(), StoreError> {
        let path = self.segment_path(key)?;
        match tokio::fs::remove_file(&path).await {
            Ok(()) => {
                debug!(%key, "deleted segment file");
                Ok(())
            }
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(StoreError::Io(e)),
        }
    }

    async fn list(&self) -> Result<Vec<ObjectKey>, StoreError> {
        let mut keys = Vec::new();
        let mut pending = vec![self.base_dir.clone()];

        while let Some(dir) = pending.pop() {
            let mut entries = tokio::fs::read_dir(&dir).await?;
            while let Some(entry) = entries.next_entry().await? {
                let path = entry.path();
                if entry.file_type().await?.is_dir() {
                    pending.push(path);
                    continue;
                }
                let Ok(relative) = path.strip_prefix(&self.base_dir) else {
                    continue;
                };
                let parts: Option<Vec<&str>> = relative
                    .components()
                    .map(|c| c.as_os_str().to_str())
                    .collect();
                let Some(parts) = parts else { continue };
                // A valid segment lives under a videoId directory; files
                // at the root and leftover in-flight writes are skipped.
                if parts.len() < 2 || parts.last().is_some_and(|n| n.ends_with(TMP_SUFFIX)) {
                    continue;
                }
                if let Ok(key) = ObjectKey::new(parts[0], parts[1..].join("/")) {
                    keys.push(key);
                }
            }
        }
        Ok(keys)
    }
}
