//! Command implementations

pub mod abi;
pub mod build;
pub mod completions;
pub mod deps;
pub mod link;
pub mod show;

use anyhow::Result;

use jitchain::builder::toolchain::{GuessEnvironment, Toolchain, ToolchainGuesser};

use crate::cli::GlobalOpts;

/// Guesser for the environment described by the global options.
pub fn guesser(global: &GlobalOpts) -> ToolchainGuesser {
    let mut env = GuessEnvironment::detect();
    if let Some(ref path) = global.metadata {
        env.runtime.build_metadata_path = Some(path.clone());
    }
    if let Some(ref version) = global.runtime_version {
        env.runtime.version = version.clone();
    }
    ToolchainGuesser::new(env)
}

/// Guess the host toolchain, or the CUDA one when `cuda` is set.
pub fn toolchain(global: &GlobalOpts, cuda: bool) -> Result<Toolchain> {
    let guesser = guesser(global);
    let toolchain = if cuda {
        guesser.guess_nvcc_toolchain()?
    } else {
        guesser.guess_toolchain()?
    };
    Ok(toolchain)
}
