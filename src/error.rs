use std::io;
use std::path::PathBuf;
use thiserror::Error;

/// Errors raised while turning one video into frames plus a manifest.
#[derive(Debug, Error)]
pub enum PrepareError {
    /// The video file name has no extension to strip, so no frame prefix can be derived.
    #[error("Cannot derive a frame prefix from {path:?}: file name has no extension")]
    InvalidName { path: PathBuf },

    #[error("Failed to launch transcoder {program:?}: {source}")]
    Launch {
        program: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("I/O error on {path:?}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
}

/// Errors raised by the evaluation pipeline. The CLI maps every one of them to the `-1` sentinel.
#[derive(Debug, Error)]
pub enum EvaluationError {
    #[error("Failed to launch {program:?}: {source}")]
    Launch {
        program: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("Resizing {input:?} to {output:?} failed with status {status:?}")]
    Resize {
        input: PathBuf,
        output: PathBuf,
        status: Option<i32>,
    },

    #[error("Failed to prepare {video:?}: {source}")]
    Prepare {
        video: PathBuf,
        #[source]
        source: PrepareError,
    },

    #[error("Scorer exited with status {status:?}")]
    Scorer { status: Option<i32> },

    #[error("Scorer produced no output")]
    EmptyOutput,

    #[error("Could not parse a score from scorer line {line:?}")]
    InvalidScore { line: String },

    #[error("I/O error on {path:?}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
}
