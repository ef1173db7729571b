//! Error types for segment storage operations.

/// Errors that can occur during segment storage operations.
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    /// An I/O error occurred.
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    /// The segment filename would escape the store's base directory.
    #[error("unsafe segment path: {0}")]
    UnsafePath(String),
}
