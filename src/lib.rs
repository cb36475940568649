//! jitchain - native compiler toolchains for runtime-generated extensions
//!
//! This crate configures, fingerprints and drives GCC, NVCC and generic
//! platform compilers on behalf of code generators that compile and load
//! native code at runtime. It guesses a working toolchain from the host
//! runtime's build metadata, derives variants without mutating shared
//! state, and computes the ABI identity an artifact cache keys on.

pub mod builder;
pub mod core;
pub mod util;

/// Test utilities and mocks for jitchain unit tests.
///
/// This module is only available when compiling with `--cfg test` or
/// running tests. It provides a mock process runner and toolchain
/// fixtures.
#[cfg(test)]
pub mod test_support;

pub use builder::{
    guess_generic_toolchain, guess_nvcc_toolchain, guess_toolchain, CommandMode, CompilerFamily,
    HeaderDependencies, OptLevel, OptimizationRequest, Toolchain, ToolchainGuesser,
};
pub use core::{AbiIdentity, AbiStrength, HostRuntime, ToolchainConfig, ToolchainError};
