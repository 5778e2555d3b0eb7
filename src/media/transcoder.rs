use std::ffi::OsString;
use std::fmt;
use std::path::{Path, PathBuf};
use std::str::FromStr;
use anyhow::{anyhow, Context};
use tracing::{debug, warn};

use crate::error::{EvaluationError, PrepareError};
use crate::media::runner::CommandRunner;

/// Target frame size for the resize step, written `WxH` on the command line.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Dimensions {
    pub width: u32,
    pub height: u32,
}

impl FromStr for Dimensions {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> anyhow::Result<Self> {
        let (w, h) = s
            .trim()
            .split_once(['x', 'X'])
            .ok_or_else(|| anyhow!("Expected dimensions as WxH, got '{}'", s))?;
        let width: u32 = w.parse().with_context(|| format!("Invalid width in '{}'", s))?;
        let height: u32 = h.parse().with_context(|| format!("Invalid height in '{}'", s))?;
        if width == 0 || height == 0 {
            return Err(anyhow!("Dimensions must be non-zero, got '{}'", s));
        }
        Ok(Dimensions { width, height })
    }
}

impl fmt::Display for Dimensions {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}x{}", self.width, self.height)
    }
}

/// An ffmpeg-compatible transcoder binary.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Transcoder {
    path: PathBuf,
}

impl Transcoder {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// `<transcoder> -i <input> -s <WxH> <output>`
    pub fn resize(
        &self,
        runner: &dyn CommandRunner,
        input: &Path,
        size: Dimensions,
        output: &Path,
    ) -> Result<(), EvaluationError> {
        let args: Vec<OsString> = vec![
            "-i".into(),
            input.into(),
            "-s".into(),
            size.to_string().into(),
            output.into(),
        ];

        debug!("Resizing {:?} to {} as {:?}", input, size, output);
        let result = runner
            .run(&self.path, &args)
            .map_err(|source| EvaluationError::Launch {
                program: self.path.clone(),
                source,
            })?;

        if !result.success() {
            return Err(EvaluationError::Resize {
                input: input.to_path_buf(),
                output: output.to_path_buf(),
                status: result.status,
            });
        }
        Ok(())
    }

    /// `<transcoder> -i <input> -f image2 <pattern>`, where `pattern` carries a `%d` frame counter.
    ///
    /// Only a failure to launch is an error. What the transcoder actually wrote is
    /// judged afterwards by counting files, so a non-zero exit is just logged.
    pub fn extract_frames(
        &self,
        runner: &dyn CommandRunner,
        input: &Path,
        pattern: &Path,
    ) -> Result<(), PrepareError> {
        let args: Vec<OsString> = vec![
            "-i".into(),
            input.into(),
            "-f".into(),
            "image2".into(),
            pattern.into(),
        ];

        let result = runner
            .run(&self.path, &args)
            .map_err(|source| PrepareError::Launch {
                program: self.path.clone(),
                source,
            })?;

        if !result.success() {
            warn!(
                "Transcoder exited with status {:?} while extracting frames from {:?}",
                result.status, input
            );
        }
        Ok(())
    }
}
