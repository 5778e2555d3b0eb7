use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use tempfile::TempPath;
use tracing::{debug, warn};

/// A `<video>.tmp` working directory that is removed recursively when dropped.
///
/// Existing contents are left in place on creation; only the drop clears them.
#[derive(Debug)]
pub struct WorkDir {
    path: PathBuf,
}

impl WorkDir {
    pub fn create_for(video: &Path) -> io::Result<Self> {
        let path = sibling(video, "tmp");
        fs::create_dir_all(&path)?;
        debug!("Created work directory {:?}", path);
        Ok(Self { path })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl Drop for WorkDir {
    fn drop(&mut self) {
        match fs::remove_dir_all(&self.path) {
            Ok(()) => debug!("Removed work directory {:?}", self.path),
            Err(e) if e.kind() == io::ErrorKind::NotFound => {}
            Err(e) => warn!("Failed to remove work directory {:?}: {}", self.path, e),
        }
    }
}

/// Claims `path` for a generated file that must not outlive the run, e.g. the resized test video.
///
/// Whatever is already at `path` is removed first; the returned guard deletes
/// the file again when dropped.
pub fn fresh_scratch(path: PathBuf) -> io::Result<TempPath> {
    match fs::remove_file(&path) {
        Ok(()) => debug!("Removed stale {:?}", path),
        Err(e) if e.kind() == io::ErrorKind::NotFound => {}
        Err(e) => return Err(e),
    }
    Ok(TempPath::from_path(path))
}

/// `<path>.<suffix>`, appended to the full path rather than replacing the extension.
pub fn sibling(path: &Path, suffix: &str) -> PathBuf {
    let mut name = path.as_os_str().to_os_string();
    name.push(".");
    name.push(suffix);
    PathBuf::from(name)
}
