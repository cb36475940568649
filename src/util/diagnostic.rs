//! Human-facing rendering of toolchain failures.
//!
//! A compiler failure is only actionable with the exact command line and
//! what the compiler printed, so both get their own block:
//!
//! ```text
//! error: module compilation failed
//!   command: gcc -fPIC -c mod.c -o mod.o
//!   compiler output:
//!     | mod.c:1: error: expected ';'
//!   exit status: 1
//!
//! help: Re-run the command above by hand to see the full compiler output
//! ```

use std::fmt;

/// Help texts shared by several errors.
pub mod suggestions {
    pub const METADATA: &str =
        "Point JITCHAIN_BUILD_METADATA (or --metadata) at the runtime's build makefile";

    pub const UNKNOWN_COMPILER: &str = "Only GNU compilers are detected from build metadata; \
        set `cc` in .jitchain/config.toml to use the generic toolchain";

    pub const MISSING_COMPILER: &str = "Check that the compiler is installed and on PATH";

    pub const BUILD_FAILED: &str =
        "Re-run the command above by hand to see the full compiler output";

    pub const NVCC_STDERR: &str = "nvcc may exit with status 0 on failure; \
        the word `error` in its output is treated as a failure";
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Severity {
    Error,
    Warning,
}

impl Severity {
    fn label(self, color: bool) -> &'static str {
        match (self, color) {
            (Severity::Error, true) => "\x1b[1;31merror\x1b[0m",
            (Severity::Warning, true) => "\x1b[1;33mwarning\x1b[0m",
            (Severity::Error, false) => "error",
            (Severity::Warning, false) => "warning",
        }
    }
}

/// A rendered-on-demand error or warning.
#[derive(Debug, Clone)]
pub struct Diagnostic {
    pub severity: Severity,
    pub message: String,
    /// Command line of the failed invocation
    pub command: Option<String>,
    /// Captured compiler output, shown verbatim
    pub output: Option<String>,
    /// Short `key: value` style facts
    pub notes: Vec<String>,
    pub help: Vec<String>,
}

impl Diagnostic {
    pub fn error(message: impl Into<String>) -> Self {
        Diagnostic::new(Severity::Error, message)
    }

    pub fn warning(message: impl Into<String>) -> Self {
        Diagnostic::new(Severity::Warning, message)
    }

    fn new(severity: Severity, message: impl Into<String>) -> Self {
        Diagnostic {
            severity,
            message: message.into(),
            command: None,
            output: None,
            notes: Vec::new(),
            help: Vec::new(),
        }
    }

    pub fn with_command(mut self, command: impl Into<String>) -> Self {
        self.command = Some(command.into());
        self
    }

    /// Attach compiler output; blank output is dropped.
    pub fn with_output(mut self, output: &str) -> Self {
        let output = output.trim_end();
        if !output.trim().is_empty() {
            self.output = Some(output.to_string());
        }
        self
    }

    pub fn with_note(mut self, note: impl Into<String>) -> Self {
        self.notes.push(note.into());
        self
    }

    pub fn with_help(mut self, help: impl Into<String>) -> Self {
        self.help.push(help.into());
        self
    }

    /// Render for a terminal.
    pub fn format(&self, color: bool) -> String {
        let mut out = format!("{}: {}\n", self.severity.label(color), self.message);

        if let Some(ref command) = self.command {
            out.push_str(&format!("  command: {}\n", command));
        }
        if let Some(ref output) = self.output {
            out.push_str("  compiler output:\n");
            for line in output.lines() {
                out.push_str(&format!("    | {}\n", line));
            }
        }
        for note in &self.notes {
            out.push_str(&format!("  {}\n", note));
        }

        if !self.help.is_empty() {
            out.push('\n');
            let prefix = if color { "\x1b[1;32mhelp\x1b[0m" } else { "help" };
            for help in &self.help {
                out.push_str(&format!("{}: {}\n", prefix, help));
            }
        }

        out
    }
}

impl fmt::Display for Diagnostic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.format(false))
    }
}

/// Print a diagnostic to stderr.
pub fn emit(diagnostic: &Diagnostic, color: bool) {
    eprint!("{}", diagnostic.format(color));
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_compile_failure_layout() {
        let diag = Diagnostic::error("module compilation failed")
            .with_command("gcc -c a.c -o a.o")
            .with_output("a.c:1: error: expected ';'\n1 error generated.\n")
            .with_note("exit status: 1")
            .with_help(suggestions::BUILD_FAILED);

        assert_eq!(
            diag.format(false),
            "error: module compilation failed\n\
             \x20 command: gcc -c a.c -o a.o\n\
             \x20 compiler output:\n\
             \x20   | a.c:1: error: expected ';'\n\
             \x20   | 1 error generated.\n\
             \x20 exit status: 1\n\
             \n\
             help: Re-run the command above by hand to see the full compiler output\n"
        );
    }

    #[test]
    fn test_blank_output_is_dropped() {
        let diag = Diagnostic::warning("weak ABI identity").with_output("  \n");
        assert!(diag.output.is_none());
        assert_eq!(diag.to_string(), "warning: weak ABI identity\n");
    }

    #[test]
    fn test_color_only_touches_labels() {
        let diag = Diagnostic::error("boom").with_help("try again");
        let colored = diag.format(true);
        assert!(colored.contains("\x1b[1;31merror\x1b[0m: boom"));
        assert!(colored.contains("\x1b[1;32mhelp\x1b[0m: try again"));
    }
}
