//! jitchain CLI - guess, fingerprint and drive native compiler toolchains

use anyhow::Result;
use clap::Parser;
use tracing_subscriber::EnvFilter;

use jitchain::core::ToolchainError;
use jitchain::util::diagnostic;

mod cli;
mod commands;

use cli::{Cli, Commands};

fn main() {
    let cli = Cli::parse();
    let color = !cli.no_color;

    if let Err(e) = run(cli) {
        match e.downcast_ref::<ToolchainError>() {
            Some(err) => diagnostic::emit(&err.to_diagnostic(), color),
            None => eprintln!("error: {:#}", e),
        }
        std::process::exit(1);
    }
}

fn run(cli: Cli) -> Result<()> {
    // Set up logging
    let filter = if cli.verbose {
        EnvFilter::new("jitchain=debug")
    } else {
        EnvFilter::new("jitchain=info")
    };

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .without_time()
        .with_ansi(!cli.no_color)
        .with_writer(std::io::stderr)
        .init();

    let global = cli.global_opts();

    match cli.command {
        Commands::Show(args) => commands::show::execute(args, &global),
        Commands::Abi(args) => commands::abi::execute(args, &global),
        Commands::Deps(args) => commands::deps::execute(args, &global),
        Commands::Build(args) => commands::build::execute(args, &global),
        Commands::Link(args) => commands::link::execute(args, &global),
        Commands::Completions(args) => commands::completions::execute(args),
    }
}
