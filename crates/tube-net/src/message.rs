//! Protocol messages for the TritonTube wire layer.
//!
//! All messages are serialized with postcard and framed with a 4-byte
//! big-endian length prefix.

use std::fmt;

use serde::{Deserialize, Serialize};

// ---------------------------------------------------------------------------
// Storage plane
// ---------------------------------------------------------------------------

/// Requests accepted by every storage node.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum StorageRequest {
    /// Store a segment under its composed key, overwriting any previous
    /// bytes.
    Put {
        /// Composed `videoId/filename` key.
        key: String,
        /// Raw segment bytes.
        data: Vec<u8>,
    },

    /// Fetch a segment by key.
    Get {
        /// Composed `videoId/filename` key.
        key: String,
    },

    /// Delete a segment. Deleting an absent segment succeeds.
    Delete {
        /// Composed `videoId/filename` key.
        key: String,
    },

    /// List every stored segment key.
    List,
}

/// Responses from a storage node.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum StorageResponse {
    /// The segment was stored.
    Stored,

    /// Response to [`StorageRequest::Get`]. `data` is `None` when the
    /// node does not hold the segment.
    Segment {
        /// The segment bytes, if present.
        data: Option<Vec<u8>>,
    },

    /// The segment was deleted (or was already absent).
    Deleted,

    /// Response to [`StorageRequest::List`].
    Keys {
        /// Every stored segment as its composed key.
        keys: Vec<String>,
    },

    /// The request failed.
    Error(StorageWireError),
}

/// Error kinds a storage node reports over the wire.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum StorageErrorKind {
    /// The key does not decompose into non-empty `videoId` and `filename`.
    MalformedKey,
    /// The node failed internally (I/O). Not retried by anyone.
    Internal,
}

/// A structured storage-plane error: kind plus human-readable message.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StorageWireError {
    /// Machine-readable kind.
    pub kind: StorageErrorKind,
    /// Human-readable description.
    pub message: String,
}

impl fmt::Display for StorageWireError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:?}: {}", self.kind, self.message)
    }
}

// ---------------------------------------------------------------------------
// Control plane
// ---------------------------------------------------------------------------

/// Requests accepted by the admin endpoint.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum AdminRequest {
    /// List current cluster members in ring order.
    ListNodes,

    /// Add a storage node and migrate the segments it now owns.
    AddNode {
        /// `host:port` of the joining node.
        address: String,
    },

    /// Remove a storage node, draining its segments first.
    RemoveNode {
        /// `host:port` of the departing node.
        address: String,
    },
}

/// Responses from the admin endpoint.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum AdminResponse {
    /// Current members in ring order.
    Nodes {
        /// Member addresses.
        addresses: Vec<String>,
    },

    /// A membership change completed.
    Migrated {
        /// Number of segments moved during the change.
        file_count: u64,
    },

    /// The operation failed.
    Error(AdminWireError),
}

/// Error kinds the admin endpoint reports over the wire.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum AdminErrorKind {
    /// AddNode was called with no existing members to migrate from.
    EmptyCluster,
    /// The address is already a member.
    DuplicateNode,
    /// The address is not a member.
    UnknownNode,
    /// The migration batch stopped on a per-segment failure.
    MigrationAborted {
        /// Segments successfully moved before the failure.
        migrated: u64,
    },
    /// Anything else.
    Internal,
}

impl fmt::Display for AdminErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::EmptyCluster => write!(f, "EmptyCluster"),
            Self::DuplicateNode => write!(f, "DuplicateNode"),
            Self::UnknownNode => write!(f, "UnknownNode"),
            Self::MigrationAborted { migrated } => {
                write!(f, "MigrationAborted({migrated} migrated)")
            }
            Self::Internal => write!(f, "Internal"),
        }
    }
}

/// A structured control-plane error: kind plus human-readable message.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AdminWireError {
    /// Machine-readable kind.
    pub kind: AdminErrorKind,
    /// Human-readable description.
    pub message: String,
}

impl fmt::Display for AdminWireError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.kind, self.message)
    }
}
