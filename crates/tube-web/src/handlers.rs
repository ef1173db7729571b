//! Front-end request handlers.

use std::path::{Path as FsPath, PathBuf};
use std::time::{SystemTime, UNIX_EPOCH};

use axum::extract::{Multipart, Path, State};
use axum::http::header;
use axum::response::{Html, IntoResponse, Redirect, Response};
use bytes::Bytes;
use tokio::io::AsyncWriteExt;
use tracing::info;

use crate::AppState;
use crate::encode::encode_dash;
use crate::error::WebError;
use crate::html;

// -----------------------------------------------------------------------
// GET / — index
// -----------------------------------------------------------------------

pub(crate) async fn index(State(state): State<AppState>) -> Result<Html<String>, WebError> {
    let videos = state.meta.list()?;
    Ok(Html(html::index_page(&videos)))
}

// -----------------------------------------------------------------------
// POST /upload
// -----------------------------------------------------------------------

/// Accept a multipart upload, transcode it, and store every produced
/// segment through the content service.
///
/// The video id is the uploaded file's stem; a duplicate id is a 409 and
/// a missing `file` field a 400.
pub(crate) async fn upload(
    State(state): State<AppState>,
    mut multipart: Multipart,
) -> Result<Redirect, WebError> {
    let mut field = loop {
        match multipart
            .next_field()
            .await
            .map_err(|e| WebError::BadUpload(e.to_string()))?
        {
            Some(field) if field.name() == Some("file") => break field,
            Some(_) => continue,
            None => return Err(WebError::MissingFile),
        }
    };

    let video_id = field
        .file_name()
        .and_then(|name| FsPath::new(name).file_stem())
        .and_then(|stem| stem.to_str())
        .filter(|stem| !stem.is_empty() && !stem.contains('/'))
        .ok_or(WebError::MissingFile)?
        .to_string();
    info!(%video_id, "upload started");

    // Register the id up front so a duplicate fails before the transcode.
    let now_ms = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap_or_default()
        .as_millis() as u64;
    state.meta.create(&video_id, now_ms)?;

    // Stream the source to disk, then transcode next to it.
    let workdir =
        tempfile::tempdir().map_err(|e| WebError::Internal(format!("temp dir: {e}")))?;
    let source_path = workdir.path().join("source.mp4");
    let mut source = tokio::fs::File::create(&source_path)
        .await
        .map_err(|e| WebError::Internal(format!("temp file: {e}")))?;
    while let Some(chunk) = field
        .chunk()
        .await
        .map_err(|e| WebError::BadUpload(e.to_string()))?
    {
        source
            .write_all(&chunk)
            .await
            .map_err(|e| WebError::Internal(format!("write source: {e}")))?;
    }
    source
        .flush()
        .await
        .map_err(|e| WebError::Internal(format!("flush source: {e}")))?;
    drop(source);

    let dash_dir = workdir.path().join("dash");
    tokio::fs::create_dir_all(&dash_dir)
        .await
        .map_err(|e| WebError::Internal(format!("dash dir: {e}")))?;
    encode_dash(&source_path, &dash_dir).await?;

    // Hand every produced file (manifest + segments) to the content
    // service under its path relative to the transcode directory.
    let mut stored = 0usize;
    for path in collect_files(&dash_dir).await? {
        let relative = path
            .strip_prefix(&dash_dir)
            .map_err(|e| WebError::Internal(format!("relative path: {e}")))?;
        let filename = relative
            .components()
            .map(|c| c.as_os_str().to_str().unwrap_or_default())
            .collect::<Vec<_>>()
            .join("/");
        let data = tokio::fs::read(&path)
            .await
            .map_err(|e| WebError::Internal(format!("read segment: {e}")))?;
        state
            .content
            .write(&video_id, &filename, Bytes::from(data))
            .await?;
        stored += 1;
    }

    info!(%video_id, segments = stored, "upload complete");
    Ok(Redirect::to("/"))
}

/// Collect every regular file under `root`, recursively.
async fn collect_files(root: &FsPath) -> Result<Vec<PathBuf>, WebError> {
    let mut files = Vec::new();
    let mut pending = vec![root.to_path_buf()];
    while let Some(dir) = pending.pop() {
        let mut entries = tokio::fs::read_dir(&dir)
            .await
            .map_err(|e| WebError::Internal(format!("walk transcode dir: {e}")))?;
        while let Some(entry) = entries
            .next_entry()
            .await
            .map_err(|e| WebError::Internal(format!("walk transcode dir: {e}")))?
        {
            let path = entry.path();
            if path.is_dir() {
                pending.push(path);
            } else {
                files.push(path);
            }
        }
    }
    Ok(files)
}

// -----------------------------------------------------------------------
// GET /videos/{video_id}
// -----------------------------------------------------------------------

pub(crate) async fn video_page(
    State(state): State<AppState>,
    Path(video_id): Path<String>,
) -> Result<Html<String>, WebError> {
    let record = state.meta.read(&video_id).map_err(|e| match e {
        tube_meta::MetaError::NotFound { id } => WebError::VideoNotFound { id },
        other => WebError::Meta(other),
    })?;
    Ok(Html(html::video_page(&record.id, record.uploaded_at_ms)))
}

// -----------------------------------------------------------------------
// GET /content/{video_id}/{*filename}
// -----------------------------------------------------------------------

pub(crate) async fn content(
    State(state): State<AppState>,
    Path((video_id, filename)): Path<(String, String)>,
) -> Result<Response, WebError> {
    let data = state.content.read(&video_id, &filename).await?;
    let content_type = content_type_for(&filename);
    Ok(([(header::CONTENT_TYPE, content_type)], data).into_response())
}

fn content_type_for(filename: &str) -> &'static str {
    match filename.rsplit_once('.').map(|(_, ext)| ext) {
        Some("mpd") => "application/dash+xml",
        Some("m4s") | Some("mp4") => "video/mp4",
        _ => "application/octet-stream",
    }
}
