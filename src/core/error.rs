//! Toolchain error types and diagnostics.

use std::io;
use std::path::PathBuf;

use miette::Diagnostic as MietteDiagnostic;
use thiserror::Error;

use crate::util::diagnostic::{suggestions, Diagnostic};

/// Result type for toolchain operations.
pub type Result<T, E = ToolchainError> = std::result::Result<T, E>;

/// Error raised while guessing, querying or driving a toolchain.
#[derive(Debug, Error, MietteDiagnostic)]
pub enum ToolchainError {
    /// No toolchain configuration could be derived from the environment.
    #[error("could not guess toolchain: {message}")]
    #[diagnostic(code(jitchain::guess))]
    Guess { message: String },

    /// `<compiler> --version` exited with a non-zero status.
    #[error("version query failed for `{}`", compiler.display())]
    #[diagnostic(code(jitchain::version_query))]
    VersionQuery { compiler: PathBuf, stderr: String },

    /// The dependency-listing invocation failed.
    #[error("getting dependencies failed: {command}")]
    #[diagnostic(code(jitchain::dependencies))]
    DependencyExtraction { command: String, stderr: String },

    /// A compile or link invocation failed.
    ///
    /// `from_stderr` is set when the exit status was zero but the NVCC
    /// stderr check flagged the invocation.
    #[error("module compilation failed: {command}")]
    #[diagnostic(code(jitchain::compile))]
    Compile {
        command: String,
        status: i32,
        stderr: String,
        from_stderr: bool,
    },

    /// The compiler process could not be started at all.
    #[error("failed to spawn `{}`", program.display())]
    #[diagnostic(code(jitchain::spawn))]
    Spawn {
        program: PathBuf,
        #[source]
        source: io::Error,
    },

    /// The host build metadata was missing or incomplete.
    #[error("unusable build metadata: {message}")]
    #[diagnostic(code(jitchain::metadata))]
    Metadata { message: String },
}

impl ToolchainError {
    pub(crate) fn guess(message: impl Into<String>) -> Self {
        ToolchainError::Guess {
            message: message.into(),
        }
    }

    pub(crate) fn metadata(message: impl Into<String>) -> Self {
        ToolchainError::Metadata {
            message: message.into(),
        }
    }

    /// The command line of the failed invocation, when there was one.
    pub fn command(&self) -> Option<&str> {
        match self {
            ToolchainError::DependencyExtraction { command, .. }
            | ToolchainError::Compile { command, .. } => Some(command),
            _ => None,
        }
    }

    /// Convert to a user-friendly diagnostic.
    pub fn to_diagnostic(&self) -> Diagnostic {
        match self {
            ToolchainError::Guess { message } => {
                let diag = Diagnostic::error(format!("could not guess toolchain: {}", message));
                if message.contains("unknown compiler") {
                    diag.with_help(suggestions::UNKNOWN_COMPILER)
                } else {
                    diag.with_help(suggestions::METADATA)
                        .with_help(suggestions::MISSING_COMPILER)
                }
            }

            ToolchainError::VersionQuery { compiler, stderr } => Diagnostic::error(format!(
                "version query failed for `{}`",
                compiler.display()
            ))
            .with_output(stderr)
            .with_help(suggestions::MISSING_COMPILER),

            ToolchainError::DependencyExtraction { command, stderr } => {
                Diagnostic::error("getting dependencies failed")
                    .with_command(command.as_str())
                    .with_output(stderr)
                    .with_help(suggestions::BUILD_FAILED)
            }

            ToolchainError::Compile {
                command,
                status,
                stderr,
                from_stderr,
            } => {
                let diag = Diagnostic::error("module compilation failed")
                    .with_command(command.as_str())
                    .with_output(stderr)
                    .with_note(format!("exit status: {}", status))
                    .with_help(suggestions::BUILD_FAILED);
                if *from_stderr {
                    diag.with_help(suggestions::NVCC_STDERR)
                } else {
                    diag
                }
            }

            ToolchainError::Spawn { program, source } => {
                Diagnostic::error(format!("failed to spawn `{}`", program.display()))
                    .with_note(source.to_string())
                    .with_help(suggestions::MISSING_COMPILER)
            }

            ToolchainError::Metadata { message } => {
                Diagnostic::error(format!("unusable build metadata: {}", message))
                    .with_help(suggestions::METADATA)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_compile_error_mentions_command() {
        let err = ToolchainError::Compile {
            command: "nvcc -c k.cu -o k.o".to_string(),
            status: 0,
            stderr: "k.cu(3): error: identifier \"x\" is undefined".to_string(),
            from_stderr: true,
        };

        assert_eq!(err.command(), Some("nvcc -c k.cu -o k.o"));
        assert!(err.to_string().contains("nvcc -c k.cu -o k.o"));

        let output = err.to_diagnostic().format(false);
        assert!(output.contains("command: nvcc -c k.cu -o k.o"));
        assert!(output.contains("identifier \"x\" is undefined"));
        assert!(output.contains("nvcc may exit with status 0"));
    }

    #[test]
    fn test_unknown_compiler_suggestion() {
        let output = ToolchainError::guess("unknown compiler")
            .to_diagnostic()
            .format(false);
        assert!(output.contains("could not guess toolchain: unknown compiler"));
        assert!(output.contains("generic toolchain"));
    }

    #[test]
    fn test_version_query_without_stderr() {
        let err = ToolchainError::VersionQuery {
            compiler: PathBuf::from("/usr/bin/gcc"),
            stderr: "   ".to_string(),
        };
        let diag = err.to_diagnostic();
        assert!(diag.output.is_none());
        assert!(err.to_string().contains("/usr/bin/gcc"));
    }
}
