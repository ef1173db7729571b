//! Error types for network operations.

use crate::message::{AdminWireError, StorageWireError};

/// Errors that can occur during wire operations.
#[derive(Debug, thiserror::Error)]
pub enum NetError {
    /// Failed to connect to a remote node.
    #[error("failed to connect to {addr}: {source}")]
    Connect {
        /// The `host:port` being dialled.
        addr: String,
        /// The underlying socket error.
        source: std::io::Error,
    },

    /// An I/O error on an established connection.
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    /// Serialization failed.
    #[error("encode error: {0}")]
    Encode(String),

    /// Deserialization failed.
    #[error("decode error: {0}")]
    Decode(String),

    /// A frame exceeded [`MAX_FRAME_SIZE`](crate::MAX_FRAME_SIZE).
    #[error("frame too large: {0} bytes")]
    FrameTooLarge(usize),

    /// The storage node reported a structured error.
    #[error("storage node error: {0}")]
    Remote(StorageWireError),

    /// The admin endpoint reported a structured error.
    #[error("admin error: {0}")]
    Admin(AdminWireError),

    /// The remote answered with a response of the wrong shape.
    #[error("unexpected response from remote")]
    UnexpectedResponse,

    /// The configured per-call deadline expired; in-flight I/O was
    /// aborted.
    #[error("rpc deadline exceeded")]
    Timeout,
}
