use std::path::Path;

use crate::error::PrepareError;

/// File name of `video` without its directory and without everything from the last `.` on.
///
/// `/videos/clip.v2.mpg` gives `clip.v2`. Names without a `.`, or with nothing
/// before it, are rejected since they would produce colliding frame names.
pub fn frame_prefix(video: &Path) -> Result<String, PrepareError> {
    let invalid = || PrepareError::InvalidName {
        path: video.to_path_buf(),
    };

    let name = video.file_name().and_then(|n| n.to_str()).ok_or_else(invalid)?;
    match name.rsplit_once('.') {
        Some((stem, _)) if !stem.is_empty() => Ok(stem.to_string()),
        _ => Err(invalid()),
    }
}
