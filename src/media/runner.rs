use std::ffi::OsString;
use std::io::{self, Read};
use std::path::Path;
use std::process::{Command, Stdio};
use tracing::debug;

/// What a finished external tool left behind: its exit code and its stdout split into lines.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CommandOutput {
    /// `None` when the process was terminated by a signal.
    pub status: Option<i32>,
    pub stdout_lines: Vec<String>,
}

impl CommandOutput {
    pub fn success(&self) -> bool {
        self.status == Some(0)
    }
}

/// Capability to run an external program to completion.
///
/// The preparer and the evaluator only ever talk to the transcoder and the
/// scorer through this trait, so tests can swap in a fake.
pub trait CommandRunner {
    fn run(&self, program: &Path, args: &[OsString]) -> io::Result<CommandOutput>;
}

/// Runs programs as real child processes, blocking until they exit.
#[derive(Debug, Default, Clone, Copy)]
pub struct SystemRunner;

impl CommandRunner for SystemRunner {
    fn run(&self, program: &Path, args: &[OsString]) -> io::Result<CommandOutput> {
        debug!("Running {:?} {:?}", program, args);

        // stdin is closed so an ffmpeg overwrite prompt reads EOF instead of hanging the run.
        let mut child = Command::new(program)
            .args(args)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::null())
            .spawn()?;

        let mut stdout = child
            .stdout
            .take()
            .ok_or_else(|| io::Error::new(io::ErrorKind::BrokenPipe, "Failed to open stdout"))?;
        let mut buffer = Vec::new();
        stdout.read_to_end(&mut buffer)?;

        let status = child.wait()?;

        let stdout_lines = String::from_utf8_lossy(&buffer)
            .lines()
            .map(str::to_string)
            .collect();

        Ok(CommandOutput {
            status: status.code(),
            stdout_lines,
        })
    }
}
