//! Front-end error types and HTTP status mapping.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use tube_meta::MetaError;
use tube_types::KeyError;

/// Errors returned by front-end handlers.
///
/// Malformed keys and missing objects map to 4xx; everything else is a
/// 5xx.
#[derive(Debug, thiserror::Error)]
pub enum WebError {
    /// The upload form had no `file` field.
    #[error("missing file field in upload")]
    MissingFile,

    /// The multipart body could not be read.
    #[error("unable to parse upload form: {0}")]
    BadUpload(String),

    /// The requested video id is not registered.
    #[error("video not found: {id}")]
    VideoNotFound {
        /// The missing video id.
        id: String,
    },

    /// The requested segment is not stored.
    #[error("segment not found: {key}")]
    SegmentNotFound {
        /// Composed key.
        key: String,
    },

    /// The path does not name a valid segment key.
    #[error(transparent)]
    MalformedKey(#[from] KeyError),

    /// A metadata operation failed.
    #[error(transparent)]
    Meta(#[from] MetaError),

    /// The ffmpeg transcode failed.
    #[error("transcode failed: {0}")]
    Transcode(String),

    /// The content service failed.
    #[error("content service error: {0}")]
    Content(String),

    /// Anything else.
    #[error("internal error: {0}")]
    Internal(String),
}

impl WebError {
    fn status_code(&self) -> StatusCode {
        match self {
            Self::MissingFile | Self::BadUpload(_) | Self::MalformedKey(_) => {
                StatusCode::BAD_REQUEST
            }
            Self::VideoNotFound { .. } | Self::SegmentNotFound { .. } => StatusCode::NOT_FOUND,
            Self::Meta(MetaError::AlreadyExists { .. }) => StatusCode::CONFLICT,
            Self::Meta(MetaError::NotFound { .. }) => StatusCode::NOT_FOUND,
            Self::Meta(_) | Self::Transcode(_) | Self::Content(_) | Self::Internal(_) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        }
    }
}

impl IntoResponse for WebError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        if status.is_server_error() {
            tracing::error!(error = %self, "request failed");
        }
        (status, self.to_string()).into_response()
    }
}
