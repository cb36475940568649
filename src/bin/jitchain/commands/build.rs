//! `jitchain build` command

use anyhow::Result;

use jitchain::builder::OptimizationRequest;

use crate::cli::{BuildArgs, GlobalOpts};

pub fn execute(args: BuildArgs, global: &GlobalOpts) -> Result<()> {
    let mut toolchain = super::toolchain(global, args.cuda)?;

    if let Some(level) = args.opt {
        toolchain = toolchain
            .with_optimization_level(OptimizationRequest::new(level).with_debug(args.debug))?;
    } else if args.debug {
        toolchain = toolchain.with_debugging();
    }

    if args.object {
        toolchain.build_object(&args.output, &args.files)?;
    } else {
        toolchain.build_extension(&args.output, &args.files)?;
    }

    tracing::info!("built {}", args.output.display());
    Ok(())
}
