//! Shared types for TritonTube.
//!
//! This crate defines the object key ([`ObjectKey`]) that identifies a
//! stored segment across the cluster, and the metadata record
//! ([`VideoMetadata`]) tracked for each uploaded video.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Identifier for one stored segment: `videoId/filename`.
///
/// The composed string is the sole identifier used on the placement ring,
/// in storage RPCs, and in node-local listings. The video id never
/// contains a `/`; the filename is a relative path that may (e.g.
/// `segments/chunk-00001.m4s`). Decomposition splits on the **first** `/`
/// only.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ObjectKey {
    video_id: String,
    filename: String,
}

impl ObjectKey {
    /// Build a key from its parts, validating both.
    pub fn new(video_id: impl Into<String>, filename: impl Into<String>) -> Result<Self, KeyError> {
        let video_id = video_id.into();
        let filename = filename.into();
        if video_id.is_empty() || filename.is_empty() || video_id.contains('/') {
            return Err(KeyError::Malformed {
                key: format!("{video_id}/{filename}"),
            });
        }
        Ok(Self { video_id, filename })
    }

    /// Parse a composed `videoId/filename` key, splitting on the first `/`.
    pub fn parse(key: &str) -> Result<Self, KeyError> {
        match key.split_once('/') {
            Some((video_id, filename)) if !video_id.is_empty() && !filename.is_empty() => {
                Ok(Self {
                    video_id: video_id.to_string(),
                    filename: filename.to_string(),
                })
            }
            _ => Err(KeyError::Malformed {
                key: key.to_string(),
            }),
        }
    }

    /// The video this segment belongs to.
    pub fn video_id(&self) -> &str {
        &self.video_id
    }

    /// The segment's path within the video, forward slashes only.
    pub fn filename(&self) -> &str {
        &self.filename
    }
}

impl fmt::Display for ObjectKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.video_id, self.filename)
    }
}

/// Errors from object key construction or parsing.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum KeyError {
    /// The key does not decompose into a non-empty video id and filename.
    #[error("malformed object key {key:?}, expected \"videoId/filename\"")]
    Malformed {
        /// The offending key.
        key: String,
    },
}

/// Metadata record for one uploaded video.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VideoMetadata {
    /// Video identifier (derived from the uploaded file's stem).
    pub id: String,
    /// Upload time in milliseconds since the Unix epoch (UTC).
    pub uploaded_at_ms: u64,
}
