//! `jitchain deps` command

use anyhow::Result;

use jitchain::builder::HeaderDependencies;

use crate::cli::{DepsArgs, GlobalOpts};

pub fn execute(args: DepsArgs, global: &GlobalOpts) -> Result<()> {
    let toolchain = super::toolchain(global, args.cuda)?;

    match toolchain.dependencies(&args.files)? {
        HeaderDependencies::Known(headers) => {
            for header in headers {
                println!("{}", header.display());
            }
        }
        HeaderDependencies::Unknown => {
            println!(
                "unknown (the {} toolchain cannot list header dependencies)",
                toolchain.family()
            );
        }
    }

    Ok(())
}
