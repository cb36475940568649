//! `jitchain link` command

use anyhow::Result;

use crate::cli::{GlobalOpts, LinkArgs};

pub fn execute(args: LinkArgs, global: &GlobalOpts) -> Result<()> {
    let toolchain = super::toolchain(global, args.cuda)?;
    toolchain.link_extension(&args.output, &args.objects)?;

    tracing::info!("linked {}", args.output.display());
    Ok(())
}
