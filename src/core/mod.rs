//! Core data structures for jitchain.
//!
//! This module contains the foundational values shared by every compiler
//! family:
//! - The immutable toolchain configuration record
//! - ABI identities used as artifact cache keys
//! - Permissive compiler version tuples
//! - The host runtime description and the error taxonomy

pub mod abi;
pub mod config;
pub mod error;
pub mod runtime;
pub mod version;

pub use abi::{AbiIdentity, AbiStrength};
pub use config::{ConfigOverrides, ToolchainConfig};
pub use error::{Result, ToolchainError};
pub use runtime::HostRuntime;
pub use version::VersionTuple;
