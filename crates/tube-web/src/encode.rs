//! DASH transcoding via an ffmpeg subprocess.

use std::path::Path;

use tokio::process::Command;
use tracing::{debug, info};

use crate::error::WebError;

/// Transcode a source video into an adaptive-bitrate DASH manifest plus
/// media segments under `out_dir`.
///
/// Produces `manifest.mpd`, `init-<rep>.m4s` initialization segments, and
/// `chunk-<rep>-<number>.m4s` media segments of four seconds each.
pub(crate) async fn encode_dash(source: &Path, out_dir: &Path) -> Result<(), WebError> {
    let manifest = out_dir.join("manifest.mpd");
    debug!(source = %source.display(), out = %out_dir.display(), "starting transcode");

    let output = Command::new("ffmpeg")
        .arg("-i")
        .arg(source)
        .args([
            "-c:v", "libx264", "-c:a", "aac",
            "-bf", "1", "-keyint_min", "120", "-g", "120", "-sc_threshold", "0",
            "-b:v", "3000k", "-b:a", "128k",
            "-f", "dash", "-use_timeline", "1", "-use_template", "1",
            "-init_seg_name", "init-$RepresentationID$.m4s",
            "-media_seg_name", "chunk-$RepresentationID$-$Number%05d$.m4s",
            "-seg_duration", "4",
        ])
        .arg(&manifest)
        .output()
        .await
        .map_err(|e| WebError::Transcode(format!("failed to run ffmpeg: {e}")))?;

    if !output.status.success() {
        let stderr = String::from_utf8_lossy(&output.stderr);
        // Keep the tail: ffmpeg prints its banner first, the cause last.
        let tail: String = stderr
            .lines()
            .rev()
            .take(5)
            .collect::<Vec<_>>()
            .into_iter()
            .rev()
            .collect::<Vec<_>>()
            .join("\n");
        return Err(WebError::Transcode(format!(
            "ffmpeg exited with {}: {tail}",
            output.status
        )));
    }

    info!(source = %source.display(), "transcode complete");
    Ok(())
}
