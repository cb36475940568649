//! `jitchain abi` command
//!
//! Prints the ABI identity an artifact cache would key on.

use anyhow::Result;

use jitchain::core::AbiStrength;
use jitchain::util::diagnostic::{self, Diagnostic};

use crate::cli::{AbiArgs, GlobalOpts};

pub fn execute(args: AbiArgs, global: &GlobalOpts) -> Result<()> {
    let mut toolchain = super::toolchain(global, args.cuda)?;
    if let Some(level) = args.opt {
        toolchain = toolchain.with_optimization_level(level)?;
    }

    let identity = toolchain.abi_identity()?;

    println!("Fingerprint: {}", identity.fingerprint());
    println!("Strength:    {}", identity.strength().as_str());
    println!("Runtime:     {}", identity.runtime_version);
    if let Some(ref version) = identity.compiler_version {
        println!("Compiler:    {}", version.lines().next().unwrap_or("").trim());
    }
    if let Some(ref argv) = identity.command_line {
        println!("Command:     {}", argv.join(" "));
    }

    if identity.strength() == AbiStrength::Weak {
        diagnostic::emit(
            &Diagnostic::warning("weak ABI identity")
                .with_note("only the runtime version is fingerprinted")
                .with_help("Clear cached extensions by hand after changing compiler flags"),
            global.color,
        );
    }

    Ok(())
}
