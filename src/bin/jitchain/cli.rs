//! CLI definitions using clap.

use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};
use clap_complete::Shell;

use jitchain::builder::OptLevel;

/// jitchain - guess, fingerprint and drive native compiler toolchains
#[derive(Parser)]
#[command(name = "jitchain")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Enable verbose output
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Disable colored output
    #[arg(long, global = true)]
    pub no_color: bool,

    /// Build metadata makefile of the host runtime
    #[arg(long, global = true, env = "JITCHAIN_BUILD_METADATA", value_name = "PATH")]
    pub metadata: Option<PathBuf>,

    /// Host runtime version recorded in ABI identities
    #[arg(long, global = true, value_name = "VERSION")]
    pub runtime_version: Option<String>,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Show the guessed toolchain
    Show(ShowArgs),

    /// Print the ABI identity and its fingerprint
    Abi(AbiArgs),

    /// List the headers source files depend on
    Deps(DepsArgs),

    /// Build an object file or a shared extension
    Build(BuildArgs),

    /// Link object files into a shared extension
    Link(LinkArgs),

    /// Generate shell completions
    Completions(CompletionsArgs),
}

#[derive(Args)]
pub struct ShowArgs {
    /// Show the CUDA toolchain instead of the host toolchain
    #[arg(long)]
    pub cuda: bool,

    /// Print as JSON
    #[arg(long)]
    pub json: bool,
}

#[derive(Args)]
pub struct AbiArgs {
    /// Use the CUDA toolchain
    #[arg(long)]
    pub cuda: bool,

    /// Optimization level applied before computing the identity
    #[arg(long, value_name = "LEVEL")]
    pub opt: Option<OptLevel>,
}

#[derive(Args)]
pub struct DepsArgs {
    /// Source files
    #[arg(required = true)]
    pub files: Vec<PathBuf>,

    /// Use the CUDA toolchain
    #[arg(long)]
    pub cuda: bool,
}

#[derive(Args)]
pub struct BuildArgs {
    /// Source files
    #[arg(required = true)]
    pub files: Vec<PathBuf>,

    /// Output file
    #[arg(short, long)]
    pub output: PathBuf,

    /// Build an object file instead of a shared extension
    #[arg(long)]
    pub object: bool,

    /// Optimization level (a number, or `debug`)
    #[arg(long, value_name = "LEVEL")]
    pub opt: Option<OptLevel>,

    /// Also emit debug information
    #[arg(short, long)]
    pub debug: bool,

    /// Use the CUDA toolchain
    #[arg(long)]
    pub cuda: bool,
}

#[derive(Args)]
pub struct LinkArgs {
    /// Object files
    #[arg(required = true)]
    pub objects: Vec<PathBuf>,

    /// Output file
    #[arg(short, long)]
    pub output: PathBuf,

    /// Use the CUDA toolchain
    #[arg(long)]
    pub cuda: bool,
}

#[derive(Args)]
pub struct CompletionsArgs {
    /// Shell to generate completions for
    #[arg(value_enum)]
    pub shell: Shell,
}

/// Options every command that guesses a toolchain needs.
#[derive(Debug, Clone)]
pub struct GlobalOpts {
    pub metadata: Option<PathBuf>,
    pub runtime_version: Option<String>,
    pub color: bool,
}

impl Cli {
    pub fn global_opts(&self) -> GlobalOpts {
        GlobalOpts {
            metadata: self.metadata.clone(),
            runtime_version: self.runtime_version.clone(),
            color: !self.no_color,
        }
    }
}
