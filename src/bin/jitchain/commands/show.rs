//! `jitchain show` command

use std::path::PathBuf;

use anyhow::Result;
use serde::Serialize;

use jitchain::builder::toolchain::{CompilerFamily, Toolchain};
use jitchain::core::ToolchainConfig;
use jitchain::util::process::find_executable;

use crate::cli::{GlobalOpts, ShowArgs};

#[derive(Serialize)]
struct ToolchainView<'a> {
    family: &'a CompilerFamily,
    resolved_cc: Option<PathBuf>,
    runtime_version: &'a str,
    so_ext: &'a str,
    o_ext: &'a str,
    config: &'a ToolchainConfig,
}

pub fn execute(args: ShowArgs, global: &GlobalOpts) -> Result<()> {
    let toolchain = super::toolchain(global, args.cuda)?;
    let cfg = toolchain.config();
    let resolved_cc = resolve(&cfg.cc);

    if args.json {
        let view = ToolchainView {
            family: toolchain.family(),
            resolved_cc,
            runtime_version: toolchain.runtime_version(),
            so_ext: toolchain.so_ext(),
            o_ext: toolchain.o_ext(),
            config: cfg,
        };
        println!("{}", serde_json::to_string_pretty(&view)?);
        return Ok(());
    }

    print_toolchain(&toolchain, resolved_cc);
    Ok(())
}

fn resolve(cc: &std::path::Path) -> Option<PathBuf> {
    if cc.components().count() > 1 {
        return cc.exists().then(|| cc.to_path_buf());
    }
    cc.to_str().and_then(find_executable)
}

fn print_toolchain(toolchain: &Toolchain, resolved_cc: Option<PathBuf>) {
    let cfg = toolchain.config();

    println!("Toolchain: {}", toolchain.family());
    println!();
    match resolved_cc {
        Some(path) if path != cfg.cc => {
            println!("  CC:       {} ({})", cfg.cc.display(), path.display())
        }
        Some(_) => println!("  CC:       {}", cfg.cc.display()),
        None => println!("  CC:       {} (not found)", cfg.cc.display()),
    }
    if let CompilerFamily::Generic(compiler) = toolchain.family() {
        println!("  Dialect:  {:?}", compiler.dialect);
    }
    print_list("CFLAGS", &cfg.cflags);
    print_list("LDFLAGS", &cfg.ldflags);
    print_list("Defines", &cfg.defines);
    print_list("Undefs", &cfg.undefines);
    print_list("Includes", &display_paths(&cfg.include_dirs));
    print_list("Libdirs", &display_paths(&cfg.library_dirs));
    print_list("Libs", &cfg.libraries);
    println!("  SO ext:   {}", toolchain.so_ext());
    println!("  O ext:    {}", toolchain.o_ext());
    println!();
    println!("Runtime:    {}", toolchain.runtime_version());
}

fn print_list(label: &str, items: &[String]) {
    if items.is_empty() {
        println!("  {:<9} (none)", format!("{}:", label));
    } else {
        println!("  {:<9} {}", format!("{}:", label), items.join(" "));
    }
}

fn display_paths(paths: &[PathBuf]) -> Vec<String> {
    paths.iter().map(|p| p.display().to_string()).collect()
}
