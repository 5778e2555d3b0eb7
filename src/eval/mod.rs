pub mod score;
pub mod workspace;

use std::ffi::OsString;
use std::fs;
use std::path::{Path, PathBuf};
use tempfile::TempPath;
use tracing::{debug, info, warn};

use crate::error::EvaluationError;
use crate::media::runner::CommandRunner;
use crate::media::transcoder::{Dimensions, Transcoder};
use crate::prepare::prepare;
use crate::utils::config::Config;
use self::score::{parse_score, Score};
use self::workspace::{fresh_scratch, sibling, WorkDir};

/// Runs the whole reference-vs-test pipeline:
/// optional resize, frame preparation for both videos, scoring, cleanup.
pub struct Evaluator<'a> {
    config: &'a Config,
    runner: &'a dyn CommandRunner,
    transcoder: Transcoder,
}

impl<'a> Evaluator<'a> {
    pub fn new(config: &'a Config, runner: &'a dyn CommandRunner) -> Self {
        Self {
            config,
            runner,
            transcoder: Transcoder::new(&config.transcoder),
        }
    }

    /// Scores `test` against `reference`.
    ///
    /// Everything created for the run (work directories, the resized test video)
    /// is removed before returning, on success and on every error path. The
    /// resized reference video is kept and reused by later runs.
    pub fn evaluate(&self, reference: &Path, test: &Path) -> Result<Score, EvaluationError> {
        info!("Evaluating {:?} against reference {:?}", test, reference);

        // Declared before the work directories so it is dropped after them.
        let _resized_test: Option<TempPath>;
        let (reference, test) = match self.config.resize {
            Some(size) => {
                let reference = self.cached_resize(reference, size)?;
                let scratch = self.fresh_resize(test, size)?;
                let test = scratch.to_path_buf();
                _resized_test = Some(scratch);
                (reference, test)
            }
            None => {
                _resized_test = None;
                (reference.to_path_buf(), test.to_path_buf())
            }
        };

        let ref_dir = WorkDir::create_for(&reference).map_err(|source| EvaluationError::Io {
            path: sibling(&reference, "tmp"),
            source,
        })?;
        let test_dir = WorkDir::create_for(&test).map_err(|source| EvaluationError::Io {
            path: sibling(&test, "tmp"),
            source,
        })?;

        let ref_manifest = prepare(&reference, ref_dir.path(), &self.transcoder, self.runner)
            .map_err(|source| EvaluationError::Prepare {
                video: reference.clone(),
                source,
            })?;
        let test_manifest = prepare(&test, test_dir.path(), &self.transcoder, self.runner)
            .map_err(|source| EvaluationError::Prepare {
                video: test.clone(),
                source,
            })?;
        debug!(
            "Manifests ready: {} reference frames, {} test frames",
            ref_manifest.len(),
            test_manifest.len()
        );
        for (video, manifest) in [(&reference, &ref_manifest), (&test, &test_manifest)] {
            if manifest.is_empty() {
                warn!("No frames were extracted from {:?}", video);
            }
        }

        let score = self.score(&ref_manifest.path, &test_manifest.path)?;
        info!("Score for {:?}: {}", test, score);
        Ok(score)
    }

    /// Resizes the reference unless `<reference>.<suffix>` already exists.
    fn cached_resize(&self, reference: &Path, size: Dimensions) -> Result<PathBuf, EvaluationError> {
        let resized = sibling(reference, &self.config.resize_suffix);
        if resized.is_file() {
            debug!("Reusing resized reference {:?}", resized);
            return Ok(resized);
        }

        if let Err(e) = self.transcoder.resize(self.runner, reference, size, &resized) {
            // A partial output would otherwise be picked up as a valid cache entry next time.
            if resized.is_file() {
                if let Err(rm) = fs::remove_file(&resized) {
                    warn!("Failed to remove partial resize {:?}: {}", resized, rm);
                }
            }
            return Err(e);
        }
        Ok(resized)
    }

    /// Resizes the test video into a fresh `<test>.<suffix>`, replacing any stale copy.
    fn fresh_resize(&self, test: &Path, size: Dimensions) -> Result<TempPath, EvaluationError> {
        let path = sibling(test, &self.config.resize_suffix);
        let scratch = fresh_scratch(path.clone())
            .map_err(|source| EvaluationError::Io { path, source })?;
        self.transcoder.resize(self.runner, test, size, &scratch)?;
        Ok(scratch)
    }

    fn score(&self, ref_manifest: &Path, test_manifest: &Path) -> Result<Score, EvaluationError> {
        let args: Vec<OsString> = vec![ref_manifest.into(), test_manifest.into()];
        let output = self
            .runner
            .run(&self.config.scorer, &args)
            .map_err(|source| EvaluationError::Launch {
                program: self.config.scorer.clone(),
                source,
            })?;

        if !output.success() {
            return Err(EvaluationError::Scorer {
                status: output.status,
            });
        }
        parse_score(&output.stdout_lines)
    }
}
