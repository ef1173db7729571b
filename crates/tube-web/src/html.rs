//! Hand-rolled HTML for the index and player pages.

use chrono::{DateTime, Utc};
use tube_types::VideoMetadata;

/// Escape text for inclusion in HTML element content or attributes.
fn escape(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            _ => out.push(c),
        }
    }
    out
}

/// Percent-encode a video id for use in a URL path segment.
fn encode_path_segment(id: &str) -> String {
    const KEEP: &[u8] = b"-_.~";
    let mut out = String::with_capacity(id.len());
    for byte in id.bytes() {
        if byte.is_ascii_alphanumeric() || KEEP.contains(&byte) {
            out.push(byte as char);
        } else {
            out.push_str(&format!("%{byte:02X}"));
        }
    }
    out
}

fn rfc3339(uploaded_at_ms: u64) -> String {
    DateTime::<Utc>::from_timestamp_millis(uploaded_at_ms as i64)
        .unwrap_or_default()
        .to_rfc3339()
}

/// The index page: upload form plus the video list, newest first.
pub(crate) fn index_page(videos: &[VideoMetadata]) -> String {
    let mut items = String::new();
    for video in videos {
        items.push_str(&format!(
            "    <li><a href=\"/videos/{}\">{}</a> <small>({})</small></li>\n",
            encode_path_segment(&video.id),
            escape(&video.id),
            rfc3339(video.uploaded_at_ms),
        ));
    }
    if items.is_empty() {
        items.push_str("    <li>No videos uploaded yet.</li>\n");
    }

    format!(
        "<!DOCTYPE html>\n<html>\n<head><title>TritonTube</title></head>\n<body>\n  \
         <h1>TritonTube</h1>\n  \
         <form action=\"/upload\" method=\"post\" enctype=\"multipart/form-data\">\n    \
         <input type=\"file\" name=\"file\" accept=\"video/mp4\" required>\n    \
         <button type=\"submit\">Upload</button>\n  </form>\n  \
         <h2>Videos</h2>\n  <ul>\n{items}  </ul>\n</body>\n</html>\n"
    )
}

/// The player page for one video, playing its DASH manifest.
pub(crate) fn video_page(video_id: &str, uploaded_at_ms: u64) -> String {
    let manifest = format!(
        "/content/{}/manifest.mpd",
        encode_path_segment(video_id)
    );
    format!(
        "<!DOCTYPE html>\n<html>\n<head>\n  <title>{title} - TritonTube</title>\n  \
         <script src=\"https://cdn.dashjs.org/latest/dash.all.min.js\"></script>\n</head>\n<body>\n  \
         <h1>{title}</h1>\n  <p>Uploaded {uploaded}</p>\n  \
         <video data-dashjs-player autoplay controls \
         src=\"{manifest}\" width=\"720\"></video>\n  \
         <p><a href=\"/\">Back to index</a></p>\n</body>\n</html>\n",
        title = escape(video_id),
        uploaded = rfc3339(uploaded_at_ms),
    )
}
