//! Error types for the metadata store.

/// Errors that can occur during metadata operations.
#[derive(Debug, thiserror::Error)]
pub enum MetaError {
    /// A video with this id was already registered.
    #[error("video already exists: {id}")]
    AlreadyExists {
        /// The duplicate video id.
        id: String,
    },

    /// No video with this id.
    #[error("video not found: {id}")]
    NotFound {
        /// The missing video id.
        id: String,
    },

    /// The underlying store failed.
    #[error("metadata store error: {0}")]
    Store(#[from] fjall::Error),

    /// A stored record failed to (de)serialize.
    #[error("metadata codec error: {0}")]
    Codec(#[from] postcard::Error),
}
