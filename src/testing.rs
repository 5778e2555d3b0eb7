//! Test double for [`CommandRunner`] standing in for both the transcoder and the scorer.

use std::cell::RefCell;
use std::collections::HashSet;
use std::ffi::OsString;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use crate::media::runner::{CommandOutput, CommandRunner};

/// Simulates the external tools by argv shape:
/// `-f image2` writes numbered BMP files, `-s` writes the resized output,
/// anything else is treated as the scorer and answers with canned stdout.
pub struct FakeRunner {
    frames: usize,
    transcoder_status: i32,
    scorer_lines: Vec<String>,
    scorer_status: i32,
    missing: HashSet<PathBuf>,
    calls: RefCell<Vec<Vec<String>>>,
}

impl FakeRunner {
    pub fn new() -> Self {
        Self {
            frames: 3,
            transcoder_status: 0,
            scorer_lines: vec!["Score: 0.5000".to_string()],
            scorer_status: 0,
            missing: HashSet::new(),
            calls: RefCell::new(Vec::new()),
        }
    }

    pub fn with_frames(mut self, frames: usize) -> Self {
        self.frames = frames;
        self
    }

    pub fn with_transcoder_status(mut self, status: i32) -> Self {
        self.transcoder_status = status;
        self
    }

    pub fn with_scorer_output(mut self, stdout: &str) -> Self {
        self.scorer_lines = stdout.lines().map(str::to_string).collect();
        self
    }

    pub fn with_scorer_status(mut self, status: i32) -> Self {
        self.scorer_status = status;
        self
    }

    /// Makes launching `program` fail as if the binary did not exist.
    pub fn with_missing(mut self, program: impl Into<PathBuf>) -> Self {
        self.missing.insert(program.into());
        self
    }

    /// Every invocation so far, program first.
    pub fn calls(&self) -> Vec<Vec<String>> {
        self.calls.borrow().clone()
    }

    /// Number of resize invocations that read from `input`.
    pub fn resize_calls_for(&self, input: &Path) -> usize {
        let input = input.to_string_lossy();
        self.calls
            .borrow()
            .iter()
            .filter(|argv| {
                argv.iter().any(|a| a == "-s") && argv.get(2).map(String::as_str) == Some(&*input)
            })
            .count()
    }
}

impl CommandRunner for FakeRunner {
    fn run(&self, program: &Path, args: &[OsString]) -> io::Result<CommandOutput> {
        let mut argv = vec![program.to_string_lossy().to_string()];
        argv.extend(args.iter().map(|a| a.to_string_lossy().to_string()));
        self.calls.borrow_mut().push(argv.clone());

        if self.missing.contains(program) {
            return Err(io::Error::new(io::ErrorKind::NotFound, "no such program"));
        }

        let last = args.last().map(PathBuf::from);

        if argv.iter().any(|a| a == "image2") {
            if let Some(pattern) = last {
                let pattern = pattern.to_string_lossy().to_string();
                // only the trailing counter is a directive, `%%` is a literal percent
                let (head, tail) = pattern.rsplit_once("%d").unwrap_or((pattern.as_str(), ""));
                let (head, tail) = (head.replace("%%", "%"), tail.replace("%%", "%"));
                for i in 1..=self.frames {
                    fs::write(format!("{}{}{}", head, i, tail), b"BM")?;
                }
            }
            return Ok(CommandOutput {
                status: Some(self.transcoder_status),
                stdout_lines: Vec::new(),
            });
        }

        if argv.iter().any(|a| a == "-s") {
            if self.transcoder_status == 0 {
                if let Some(output) = last {
                    fs::write(output, b"resized")?;
                }
            }
            return Ok(CommandOutput {
                status: Some(self.transcoder_status),
                stdout_lines: Vec::new(),
            });
        }

        Ok(CommandOutput {
            status: Some(self.scorer_status),
            stdout_lines: self.scorer_lines.clone(),
        })
    }
}
