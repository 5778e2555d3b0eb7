use std::path::Path;
use anyhow::{Result, Context};

pub fn detect_mimetype(path: &Path) -> Result<String> {
    let kind = infer::get_from_path(path)
        .with_context(|| format!("Failed to read {:?} for mimetype detection", path))?;

    match kind {
        Some(k) => Ok(k.mime_type().to_string()),
        None => Ok("application/octet-stream".to_string()),
    }
}

/// True when the file's magic bytes identify a video container.
/// Unreadable files and unknown formats both count as "not a video".
pub fn looks_like_video(path: &Path) -> bool {
    detect_mimetype(path)
        .map(|m| m.starts_with("video/"))
        .unwrap_or(false)
}
