//! Shared utilities

pub mod config;
pub mod diagnostic;
pub mod hash;
pub mod makefile;
pub mod memo;
pub mod process;

pub use config::ProjectConfig;
pub use diagnostic::Diagnostic;
pub use memo::Memo;
pub use process::{ProcessOutput, ProcessRunner, SystemRunner};
