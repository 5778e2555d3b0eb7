use std::fs::File;
use std::io::{self, BufWriter, Write};
use std::path::{Path, PathBuf};
use walkdir::WalkDir;

/// Ordered list of frame image paths for one video, persisted one path per line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Manifest {
    pub path: PathBuf,
    pub frames: Vec<PathBuf>,
}

impl Manifest {
    /// Manifest listing `<dir>/<prefix>_1.bmp` through `<dir>/<prefix>_<count>.bmp`, stored at `<dir>/<prefix>`.
    pub fn numbered(dir: &Path, prefix: &str, count: usize) -> Self {
        Self {
            path: dir.join(prefix),
            frames: (1..=count).map(|i| frame_path(dir, prefix, i)).collect(),
        }
    }

    pub fn write(&self) -> io::Result<()> {
        let mut writer = BufWriter::new(File::create(&self.path)?);
        for frame in &self.frames {
            writeln!(writer, "{}", frame.display())?;
        }
        writer.flush()
    }

    #[cfg(test)]
    pub fn load(path: &Path) -> io::Result<Self> {
        use std::io::{BufRead, BufReader};

        let reader = BufReader::new(File::open(path)?);
        let mut frames = Vec::new();
        for line in reader.lines() {
            let line = line?;
            let line = line.trim();
            if !line.is_empty() {
                frames.push(PathBuf::from(line));
            }
        }
        Ok(Self {
            path: path.to_path_buf(),
            frames,
        })
    }

    pub fn len(&self) -> usize {
        self.frames.len()
    }

    pub fn is_empty(&self) -> bool {
        self.frames.is_empty()
    }
}

pub fn frame_path(dir: &Path, prefix: &str, index: usize) -> PathBuf {
    dir.join(format!("{}_{}.bmp", prefix, index))
}

/// The transcoder output pattern for `prefix`, with ffmpeg's `%d` frame counter.
///
/// ffmpeg expands every `%` in the pattern, so literal ones in `dir` and
/// `prefix` are doubled; only the trailing `%d` stays a directive.
pub fn frame_pattern(dir: &Path, prefix: &str) -> PathBuf {
    let dir = match dir.to_str() {
        Some(d) => PathBuf::from(escape_percent(d)),
        None => dir.to_path_buf(),
    };
    dir.join(format!("{}_%d.bmp", escape_percent(prefix)))
}

fn escape_percent(s: &str) -> String {
    s.replace('%', "%%")
}

/// Frame indices found directly inside `dir` for files named `<prefix>_<N>.bmp`, ascending.
pub fn frame_indices(dir: &Path, prefix: &str) -> io::Result<Vec<usize>> {
    let mut indices = Vec::new();

    for entry in WalkDir::new(dir).min_depth(1).max_depth(1) {
        let entry = entry.map_err(io::Error::from)?;
        if !entry.file_type().is_file() {
            continue;
        }
        if let Some(index) = entry.file_name().to_str().and_then(|n| parse_frame_name(n, prefix)) {
            indices.push(index);
        }
    }

    indices.sort_unstable();
    Ok(indices)
}

fn parse_frame_name(name: &str, prefix: &str) -> Option<usize> {
    let digits = name
        .strip_prefix(prefix)?
        .strip_prefix('_')?
        .strip_suffix(".bmp")?;
    if digits.is_empty() || !digits.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    digits.parse().ok()
}
