//! TritonTube upload/browse HTTP front-end.
//!
//! An axum server over two collaborators: the metadata store (which
//! videos exist) and a [`ContentService`] (where their segments live).
//!
//! - `GET /` — index page listing uploaded videos, newest first.
//! - `POST /upload` — multipart upload; the video id is the uploaded
//!   file's stem. The source is transcoded to a DASH manifest + segments
//!   and every produced file is written through the content service.
//! - `GET /videos/{id}` — player page for one video.
//! - `GET /content/{videoId}/{*filename}` — raw segment bytes.

mod encode;
mod error;
mod handlers;
mod html;
mod service;

use std::sync::Arc;

use axum::Router;
use axum::extract::DefaultBodyLimit;
use axum::routing::{get, post};
use tube_meta::MetaStore;

pub use error::WebError;
pub use service::{ContentService, LocalContent, RouterContent};

/// Shared application state for all handlers.
#[derive(Clone)]
pub(crate) struct AppState {
    pub meta: Arc<MetaStore>,
    pub content: Arc<dyn ContentService>,
}

/// The TritonTube front-end HTTP server.
pub struct WebServer {
    router: Router,
}

impl WebServer {
    /// Create a server over the given metadata store and content service.
    pub fn new(meta: Arc<MetaStore>, content: Arc<dyn ContentService>) -> Self {
        let state = AppState { meta, content };
        let router = Router::new()
            .route("/", get(handlers::index))
            .route("/upload", post(handlers::upload))
            .route("/videos/{video_id}", get(handlers::video_page))
            .route("/content/{video_id}/{*filename}", get(handlers::content))
            // Source uploads can be large; segments are produced locally.
            .layer(DefaultBodyLimit::max(2 * 1024 * 1024 * 1024))
            .with_state(state);
        Self { router }
    }

    /// Return the inner [`Router`] (useful for in-process tests).
    pub fn into_router(self) -> Router {
        self.router
    }

    /// Serve on the given TCP address.
    pub async fn serve(self, addr: &str) -> Result<(), std::io::Error> {
        let listener = tokio::net::TcpListener::bind(addr).await?;
        tracing::info!(addr, "web server listening");
        axum::serve(listener, self.router).await
    }

    /// Serve with graceful shutdown triggered by the given future.
    pub async fn serve_with_shutdown(
        self,
        addr: &str,
        shutdown: impl std::future::Future<Output = ()> + Send + 'static,
    ) -> Result<(), std::io::Error> {
        let listener = tokio::net::TcpListener::bind(addr).await?;
        tracing::info!(addr, "web server listening");
        axum::serve(listener, self.router)
            .with_graceful_shutdown(shutdown)
            .await
    }
}
