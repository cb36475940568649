//! Test utilities and mocks for jitchain unit tests.
//!
//! [`MockRunner`] stands in for real compiler processes: tests register
//! expected command lines with canned output and inspect the recorded
//! calls afterwards.
//!
//! # Example
//!
//! ```rust,ignore
//! use jitchain::test_support::{CommandPattern, MockProcessOutput, MockRunner};
//!
//! let runner = Arc::new(MockRunner::new().expect(
//!     CommandPattern::ArgsContain("--version".into()),
//!     MockProcessOutput::success("gcc (GCC) 9.4.0"),
//! ));
//! let tc = toolchain.with_runner(runner.clone());
//! ```

pub mod fixtures;

use std::io;
use std::path::Path;
use std::sync::Mutex;

use crate::util::process::{ProcessOutput, ProcessRunner};

/// Mock process output for testing command execution.
#[derive(Debug, Clone, Default)]
pub struct MockProcessOutput {
    /// Exit status code (0 = success).
    pub status: i32,
    /// Standard output.
    pub stdout: String,
    /// Standard error.
    pub stderr: String,
}

impl MockProcessOutput {
    /// Create a successful output with the given stdout.
    pub fn success(stdout: impl Into<String>) -> Self {
        MockProcessOutput {
            status: 0,
            stdout: stdout.into(),
            stderr: String::new(),
        }
    }

    /// Create a failure output with the given stderr and status code.
    pub fn failure(status: i32, stderr: impl Into<String>) -> Self {
        MockProcessOutput {
            status,
            stdout: String::new(),
            stderr: stderr.into(),
        }
    }

    /// Replace stderr.
    pub fn with_stderr(mut self, stderr: impl Into<String>) -> Self {
        self.stderr = stderr.into();
        self
    }
}

impl From<MockProcessOutput> for ProcessOutput {
    fn from(mock: MockProcessOutput) -> Self {
        ProcessOutput {
            status: mock.status,
            stdout: mock.stdout,
            stderr: mock.stderr,
        }
    }
}

/// Pattern for matching command lines in [`MockRunner`].
#[derive(Debug, Clone)]
pub enum CommandPattern {
    /// Exact match on the space-joined command line.
    Exact(String),
    /// Command line starts with prefix.
    StartsWith(String),
    /// Command line contains substring.
    Contains(String),
    /// Some argument equals this exactly.
    ArgsContain(String),
    /// Match using a regex pattern.
    Regex(String),
    /// Match any command.
    Any,
}

impl CommandPattern {
    /// Check if this pattern matches `argv` (program first).
    pub fn matches(&self, argv: &[String]) -> bool {
        let cmd = argv.join(" ");
        match self {
            CommandPattern::Exact(s) => &cmd == s,
            CommandPattern::StartsWith(s) => cmd.starts_with(s.as_str()),
            CommandPattern::Contains(s) => cmd.contains(s.as_str()),
            CommandPattern::ArgsContain(s) => argv.iter().skip(1).any(|a| a == s),
            CommandPattern::Regex(pattern) => regex::Regex::new(pattern)
                .map(|re| re.is_match(&cmd))
                .unwrap_or(false),
            CommandPattern::Any => true,
        }
    }
}

/// Expectation for a command execution.
#[derive(Debug, Clone)]
struct CommandExpectation {
    pattern: CommandPattern,
    output: MockProcessOutput,
    /// Number of times this expectation can be used (None = unlimited).
    times: Option<usize>,
    used: usize,
}

impl CommandExpectation {
    fn available(&self) -> bool {
        match self.times {
            Some(n) => self.used < n,
            None => true,
        }
    }
}

#[derive(Debug, Default)]
struct MockState {
    expectations: Vec<CommandExpectation>,
    calls: Vec<Vec<String>>,
}

/// Mock [`ProcessRunner`].
///
/// Expectations are tried in registration order. A command that matches
/// none fails to spawn with `NotFound`, like a missing executable.
#[derive(Debug, Default)]
pub struct MockRunner {
    state: Mutex<MockState>,
}

impl MockRunner {
    /// Create a runner with no expectations.
    pub fn new() -> Self {
        MockRunner::default()
    }

    /// Answer commands matching `pattern` with `output`, any number of times.
    pub fn expect(self, pattern: CommandPattern, output: MockProcessOutput) -> Self {
        self.push(pattern, output, None)
    }

    /// Answer commands matching `pattern` with `output` at most `times` times.
    pub fn expect_times(
        self,
        pattern: CommandPattern,
        output: MockProcessOutput,
        times: usize,
    ) -> Self {
        self.push(pattern, output, Some(times))
    }

    /// Every command line run so far, program first.
    pub fn calls(&self) -> Vec<Vec<String>> {
        self.lock().calls.clone()
    }

    fn push(
        self,
        pattern: CommandPattern,
        output: MockProcessOutput,
        times: Option<usize>,
    ) -> Self {
        self.lock().expectations.push(CommandExpectation {
            pattern,
            output,
            times,
            used: 0,
        });
        self
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, MockState> {
        self.state.lock().unwrap_or_else(|e| e.into_inner())
    }
}

impl ProcessRunner for MockRunner {
    fn run(&self, program: &Path, args: &[String]) -> io::Result<ProcessOutput> {
        let mut argv = vec![program.display().to_string()];
        argv.extend(args.iter().cloned());

        let mut state = self.lock();
        state.calls.push(argv.clone());

        for exp in state.expectations.iter_mut() {
            if exp.available() && exp.pattern.matches(&argv) {
                exp.used += 1;
                return Ok(exp.output.clone().into());
            }
        }

        Err(io::Error::new(
            io::ErrorKind::NotFound,
            format!("unexpected command: {}", argv.join(" ")),
        ))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn argv(parts: &[&str]) -> Vec<String> {
        parts.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn test_patterns() {
        let cmd = argv(&["gcc", "-c", "a.c", "-o", "a.o"]);
        assert!(CommandPattern::Exact("gcc -c a.c -o a.o".into()).matches(&cmd));
        assert!(CommandPattern::StartsWith("gcc -c".into()).matches(&cmd));
        assert!(CommandPattern::Contains("a.c -o".into()).matches(&cmd));
        assert!(CommandPattern::ArgsContain("-c".into()).matches(&cmd));
        assert!(!CommandPattern::ArgsContain("gcc".into()).matches(&cmd));
        assert!(CommandPattern::Regex(r"^gcc .* -o \S+\.o$".into()).matches(&cmd));
    }

    #[test]
    fn test_runner_records_and_limits() {
        let runner = MockRunner::new().expect_times(
            CommandPattern::Any,
            MockProcessOutput::success("ok"),
            1,
        );

        let out = runner.run(Path::new("cc"), &argv(&["--version"])).unwrap();
        assert_eq!(out.stdout, "ok");
        assert!(runner.run(Path::new("cc"), &argv(&["--version"])).is_err());
        assert_eq!(runner.calls().len(), 2);
        assert_eq!(runner.calls()[0], argv(&["cc", "--version"]));
    }
}
