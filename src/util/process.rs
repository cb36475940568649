//! Subprocess execution utilities.
//!
//! [`ProcessBuilder`] is the concrete spawn primitive. Toolchains never
//! spawn directly; they go through the [`ProcessRunner`] seam so that
//! compiler invocations can be replaced in tests.

use std::ffi::OsStr;
use std::fmt;
use std::io;
use std::path::{Path, PathBuf};
use std::process::{Command, Output, Stdio};

/// Builder for subprocess execution.
#[derive(Debug, Clone)]
pub struct ProcessBuilder {
    program: PathBuf,
    args: Vec<String>,
}

impl ProcessBuilder {
    /// Create a new process builder for the given program.
    pub fn new(program: impl AsRef<Path>) -> Self {
        ProcessBuilder {
            program: program.as_ref().to_path_buf(),
            args: Vec::new(),
        }
    }

    /// Add multiple arguments.
    pub fn args<I, S>(mut self, args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<OsStr>,
    {
        self.args.extend(
            args.into_iter()
                .map(|s| s.as_ref().to_string_lossy().into_owned()),
        );
        self
    }

    fn build_command(&self) -> Command {
        let mut cmd = Command::new(&self.program);
        cmd.args(&self.args);
        cmd
    }

    /// Execute the command, capturing stdout and stderr, and wait for it.
    ///
    /// There is no timeout: a hung child blocks the caller.
    pub fn exec(&self) -> io::Result<Output> {
        let mut cmd = self.build_command();
        cmd.stdin(Stdio::null());
        cmd.stdout(Stdio::piped());
        cmd.stderr(Stdio::piped());

        cmd.spawn()?.wait_with_output()
    }

    /// Display the command for error messages.
    pub fn display_command(&self) -> String {
        let mut parts = vec![self.program.display().to_string()];
        parts.extend(self.args.iter().cloned());
        parts.join(" ")
    }
}

/// Captured result of a finished process.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProcessOutput {
    /// Exit code. Processes killed by a signal report `-1`.
    pub status: i32,
    pub stdout: String,
    pub stderr: String,
}

impl ProcessOutput {
    /// Whether the process exited with status zero.
    pub fn success(&self) -> bool {
        self.status == 0
    }
}

impl From<Output> for ProcessOutput {
    fn from(output: Output) -> Self {
        ProcessOutput {
            status: output.status.code().unwrap_or(-1),
            stdout: String::from_utf8_lossy(&output.stdout).into_owned(),
            stderr: String::from_utf8_lossy(&output.stderr).into_owned(),
        }
    }
}

/// Runs a command line and reports its exit status and captured output.
///
/// Only failure to *start* the process is an `Err`; a non-zero exit is a
/// normal [`ProcessOutput`] for the caller to interpret.
pub trait ProcessRunner: fmt::Debug + Send + Sync {
    /// Run `program` with `args` and wait for it to exit.
    fn run(&self, program: &Path, args: &[String]) -> io::Result<ProcessOutput>;
}

/// [`ProcessRunner`] that spawns real processes.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemRunner;

impl ProcessRunner for SystemRunner {
    fn run(&self, program: &Path, args: &[String]) -> io::Result<ProcessOutput> {
        let pb = ProcessBuilder::new(program).args(args);
        tracing::trace!("exec: {}", pb.display_command());
        pb.exec().map(ProcessOutput::from)
    }
}

/// Join a command line into a single display string.
pub fn display_command_line(argv: &[String]) -> String {
    argv.join(" ")
}

/// Find an executable in PATH.
pub fn find_executable(name: &str) -> Option<PathBuf> {
    which::which(name).ok()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[cfg(unix)]
    #[test]
    fn test_system_runner_captures_output() {
        let out = SystemRunner
            .run(
                Path::new("sh"),
                &["-c".to_string(), "echo hello; echo oops >&2; exit 3".to_string()],
            )
            .unwrap();

        assert_eq!(out.status, 3);
        assert!(!out.success());
        assert_eq!(out.stdout.trim(), "hello");
        assert_eq!(out.stderr.trim(), "oops");
    }

    #[test]
    fn test_system_runner_missing_program() {
        let result = SystemRunner.run(
            Path::new("/nonexistent/definitely-not-a-compiler"),
            &[],
        );
        assert!(result.is_err());
    }

    #[test]
    fn test_display_command() {
        let pb = ProcessBuilder::new("gcc").args(["-Wall", "-o", "output", "input.c"]);

        assert_eq!(pb.display_command(), "gcc -Wall -o output input.c");
    }
}
