//! Compiler toolchains and the build operations they drive.

pub mod deps;
pub mod toolchain;

pub use deps::HeaderDependencies;
pub use toolchain::{
    guess_generic_toolchain, guess_nvcc_toolchain, guess_toolchain, CommandMode, CompilerFamily,
    OptLevel, OptimizationRequest, Toolchain, ToolchainGuesser,
};
