//! Compiler toolchains.
//!
//! A [`Toolchain`] pairs an immutable [`ToolchainConfig`] with the compiler
//! family that interprets it. Three families exist:
//!
//! - GCC-like compilers driven directly from build metadata
//! - NVCC, which shares the GCC command-line shape but reports some
//!   failures only on stderr
//! - A generic platform compiler found by probing
//!
//! Toolchains are obtained from the guesser in [`detect`] or built by hand,
//! derived with the `with_*` methods (which never modify the receiver),
//! fingerprinted with [`Toolchain::abi_identity`] and finally asked to
//! build.

use std::collections::BTreeMap;
use std::fmt;
use std::path::Path;
use std::str::FromStr;
use std::sync::Arc;

use serde::Serialize;

use crate::builder::deps::{parse_make_dependencies, HeaderDependencies};
use crate::core::abi::AbiIdentity;
use crate::core::config::{ConfigOverrides, ToolchainConfig, DEBUG_FLAG};
use crate::core::error::{Result, ToolchainError};
use crate::core::version::VersionTuple;
use crate::util::process::{display_command_line, ProcessOutput, ProcessRunner, SystemRunner};

pub mod detect;
pub mod gcc;
pub mod generic;
pub mod nvcc;

pub use detect::{
    global_guesser, guess_generic_toolchain, guess_nvcc_toolchain, guess_toolchain,
    GuessEnvironment, HostSettings, ToolchainGuesser,
};
pub use generic::{Dialect, GenericCompiler};

/// Default shared object extension for GCC and NVCC.
const DEFAULT_SO_EXT: &str = ".so";

/// Default object extension for GCC and NVCC.
const DEFAULT_O_EXT: &str = ".o";

/// Whether a command line compiles to objects or links.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CommandMode {
    /// Compile only (`-c`)
    Object,
    /// Link, with the link flags and library arguments
    Link,
}

/// Compiler family of a toolchain.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "family", rename_all = "kebab-case")]
pub enum CompilerFamily {
    /// gcc and compatible drivers
    GccLike,
    /// CUDA's nvcc
    Nvcc,
    /// Probed platform compiler
    Generic(GenericCompiler),
}

impl CompilerFamily {
    pub fn name(&self) -> &'static str {
        match self {
            CompilerFamily::GccLike => "gcc",
            CompilerFamily::Nvcc => "nvcc",
            CompilerFamily::Generic(_) => "generic",
        }
    }
}

impl fmt::Display for CompilerFamily {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.name())
    }
}

/// Optimization level, on the scale of gcc's `-O`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum OptLevel {
    /// Debug build: debug information, no optimization flags
    Debug,
    /// `-O<n>`; levels above 3 are passed through unchanged
    Level(u8),
}

impl FromStr for OptLevel {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        if s.eq_ignore_ascii_case("debug") {
            return Ok(OptLevel::Debug);
        }
        s.parse::<u8>()
            .map(OptLevel::Level)
            .map_err(|_| {
                format!("invalid optimization level `{}` (expected a number or `debug`)", s)
            })
    }
}

impl fmt::Display for OptLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            OptLevel::Debug => write!(f, "debug"),
            OptLevel::Level(n) => write!(f, "{}", n),
        }
    }
}

/// Request for [`Toolchain::with_optimization_level`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OptimizationRequest {
    pub level: OptLevel,
    /// Also emit debug information at a numeric level
    pub debug: bool,
    /// Family-specific settings; unknown keys are ignored
    pub extra: BTreeMap<String, String>,
}

impl OptimizationRequest {
    pub fn new(level: OptLevel) -> Self {
        OptimizationRequest {
            level,
            debug: false,
            extra: BTreeMap::new(),
        }
    }

    pub fn with_debug(mut self, debug: bool) -> Self {
        self.debug = debug;
        self
    }

    pub fn with_extra(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.extra.insert(key.into(), value.into());
        self
    }
}

impl From<OptLevel> for OptimizationRequest {
    fn from(level: OptLevel) -> Self {
        OptimizationRequest::new(level)
    }
}

/// A configured compiler toolchain.
///
/// Cloning is cheap apart from the configuration itself; clones share the
/// process runner.
#[derive(Debug, Clone)]
pub struct Toolchain {
    family: CompilerFamily,
    config: ToolchainConfig,
    runtime_version: String,
    runner: Arc<dyn ProcessRunner>,
}

impl Toolchain {
    /// Create a toolchain of `family` for a host runtime reporting
    /// `runtime_version`.
    pub fn new(
        family: CompilerFamily,
        config: ToolchainConfig,
        runtime_version: impl Into<String>,
    ) -> Self {
        Toolchain {
            family,
            config,
            runtime_version: runtime_version.into(),
            runner: Arc::new(SystemRunner),
        }
    }

    pub fn gcc(config: ToolchainConfig, runtime_version: impl Into<String>) -> Self {
        Toolchain::new(CompilerFamily::GccLike, config, runtime_version)
    }

    pub fn nvcc(config: ToolchainConfig, runtime_version: impl Into<String>) -> Self {
        Toolchain::new(CompilerFamily::Nvcc, config, runtime_version)
    }

    pub fn generic(
        compiler: GenericCompiler,
        config: ToolchainConfig,
        runtime_version: impl Into<String>,
    ) -> Self {
        Toolchain::new(CompilerFamily::Generic(compiler), config, runtime_version)
    }

    /// Use `runner` to start compiler processes.
    #[must_use]
    pub fn with_runner(mut self, runner: Arc<dyn ProcessRunner>) -> Self {
        self.runner = runner;
        self
    }

    pub fn family(&self) -> &CompilerFamily {
        &self.family
    }

    pub fn config(&self) -> &ToolchainConfig {
        &self.config
    }

    pub fn runtime_version(&self) -> &str {
        &self.runtime_version
    }

    /// Shared object extension, falling back to the family default.
    pub fn so_ext(&self) -> &str {
        match (&self.config.so_ext, &self.family) {
            (Some(ext), _) => ext,
            (None, CompilerFamily::Generic(compiler)) => &compiler.so_ext,
            (None, _) => DEFAULT_SO_EXT,
        }
    }

    /// Object file extension, falling back to the family default.
    pub fn o_ext(&self) -> &str {
        match (&self.config.o_ext, &self.family) {
            (Some(ext), _) => ext,
            (None, CompilerFamily::Generic(compiler)) => &compiler.o_ext,
            (None, _) => DEFAULT_O_EXT,
        }
    }

    /// The command line for `files` in `mode`, without an output argument.
    pub fn command_line(&self, files: &[String], mode: CommandMode) -> Vec<String> {
        match &self.family {
            CompilerFamily::GccLike | CompilerFamily::Nvcc => {
                gcc::command_line(&self.config, files, mode)
            }
            CompilerFamily::Generic(compiler) => compiler.command_line(&self.config, files, mode),
        }
    }

    /// Raw `--version` output of the compiler.
    pub fn version(&self) -> Result<String> {
        let argv = vec![self.config.cc_token(), "--version".to_string()];
        let output = self.run(&argv)?;
        if !output.success() {
            return Err(ToolchainError::VersionQuery {
                compiler: self.config.cc.clone(),
                stderr: output.stderr,
            });
        }
        Ok(output.stdout)
    }

    /// Numeric compiler version.
    ///
    /// The generic family has no portable version probe and reports an
    /// empty tuple without starting a process.
    pub fn version_tuple(&self) -> Result<VersionTuple> {
        match &self.family {
            CompilerFamily::GccLike => Ok(gcc::parse_version_tuple(&self.version()?)),
            CompilerFamily::Nvcc => Ok(nvcc::parse_version_tuple(&self.version()?)),
            CompilerFamily::Generic(_) => Ok(VersionTuple::default()),
        }
    }

    /// Identity of everything that affects the binaries this toolchain
    /// produces.
    ///
    /// GCC and NVCC identities are strong: they include the compiler
    /// version and the object-mode command line, so any flag change
    /// produces a different identity. Generic identities are weak and
    /// only capture the runtime version; a cache keyed by them must not
    /// assume flag changes invalidate its entries.
    pub fn abi_identity(&self) -> Result<AbiIdentity> {
        match &self.family {
            CompilerFamily::GccLike | CompilerFamily::Nvcc => {
                let version = self.version()?;
                let argv = self.command_line(&[], CommandMode::Object);
                Ok(AbiIdentity::base(version, self.runtime_version.as_str())
                    .with_command_line(argv))
            }
            CompilerFamily::Generic(_) => {
                tracing::debug!(
                    "generic toolchain has a weak ABI identity; flag changes do not alter it"
                );
                Ok(AbiIdentity::runtime_only(self.runtime_version.as_str()))
            }
        }
    }

    /// Headers `sources` depend on.
    pub fn dependencies<P: AsRef<Path>>(&self, sources: &[P]) -> Result<HeaderDependencies> {
        if let CompilerFamily::Generic(_) = self.family {
            tracing::debug!("generic toolchain cannot list header dependencies");
            return Ok(HeaderDependencies::Unknown);
        }

        let argv = gcc::dependency_command(&self.config, &path_args(sources));
        let output = self.run(&argv)?;
        if !output.success() {
            return Err(ToolchainError::DependencyExtraction {
                command: display_command_line(&argv),
                stderr: output.stderr,
            });
        }
        Ok(HeaderDependencies::Known(parse_make_dependencies(&output.stdout)))
    }

    /// Compile `sources` into the object file `output`.
    ///
    /// The generic family compiles each source separately; with a single
    /// source the object is written to `output`, otherwise next to each
    /// source.
    pub fn build_object<P: AsRef<Path>>(&self, output: &Path, sources: &[P]) -> Result<()> {
        match &self.family {
            CompilerFamily::GccLike | CompilerFamily::Nvcc => {
                let mut argv = self.command_line(&path_args(sources), CommandMode::Object);
                push_output(&mut argv, output);
                self.check_build(&argv)
            }
            CompilerFamily::Generic(compiler) => {
                self.compile_generic(compiler, Some(output), sources)?;
                Ok(())
            }
        }
    }

    /// Compile and link `sources` into the shared library `output`.
    pub fn build_extension<P: AsRef<Path>>(&self, output: &Path, sources: &[P]) -> Result<()> {
        match &self.family {
            CompilerFamily::GccLike | CompilerFamily::Nvcc => {
                let mut argv = self.command_line(&path_args(sources), CommandMode::Link);
                push_output(&mut argv, output);
                self.check_build(&argv)
            }
            CompilerFamily::Generic(compiler) => {
                let objects = self.compile_generic(compiler, None, sources)?;
                self.link_generic(compiler, output, &objects)
            }
        }
    }

    /// Link `objects` into the shared library `output`.
    pub fn link_extension<P: AsRef<Path>>(&self, output: &Path, objects: &[P]) -> Result<()> {
        match &self.family {
            CompilerFamily::GccLike | CompilerFamily::Nvcc => {
                let mut argv = self.command_line(&path_args(objects), CommandMode::Link);
                push_output(&mut argv, output);
                self.check_build(&argv)
            }
            CompilerFamily::Generic(compiler) => {
                self.link_generic(compiler, output, &path_args(objects))
            }
        }
    }

    /// Return a toolchain with `feature`'s library bundle registered.
    #[must_use]
    pub fn with_library<I, L, S>(
        &self,
        feature: &str,
        include_dirs: I,
        library_dirs: L,
        libraries: impl IntoIterator<Item = S>,
    ) -> Self
    where
        I: IntoIterator,
        I::Item: Into<std::path::PathBuf>,
        L: IntoIterator,
        L::Item: Into<std::path::PathBuf>,
        S: Into<String>,
    {
        self.with_config(
            self.config
                .with_library(feature, include_dirs, library_dirs, libraries),
        )
    }

    /// Return a toolchain that emits debug information.
    #[must_use]
    pub fn with_debugging(&self) -> Self {
        match &self.family {
            CompilerFamily::Generic(compiler) if compiler.dialect == Dialect::Msvc => {
                let flags = [self.debug_flag().to_string()];
                let prefixes = compiler.optimization_prefixes();
                self.with_config(self.config.with_cflags_replaced(prefixes, &flags))
            }
            _ => self.with_config(self.config.with_debugging()),
        }
    }

    /// Return a toolchain with the supplied configuration fields replaced.
    #[must_use]
    pub fn with_overrides(&self, overrides: ConfigOverrides) -> Self {
        self.with_config(self.config.with_overrides(overrides))
    }

    /// Return a toolchain whose optimization flags are replaced by those
    /// for `request`.
    ///
    /// For GCC, numeric levels of 2 and above also tune for the native
    /// CPU when the compiler is 4.3 or newer, which needs a version query.
    pub fn with_optimization_level(&self, request: impl Into<OptimizationRequest>) -> Result<Self> {
        let request = request.into();
        for (key, value) in &request.extra {
            tracing::debug!("ignoring unknown optimization setting `{}={}`", key, value);
        }

        let (prefixes, mut flags): (&[&str], Vec<String>) = match &self.family {
            CompilerFamily::GccLike => (
                &gcc::OPTIMIZATION_PREFIXES,
                gcc::optimization_flags(request.level, || self.version_tuple())?,
            ),
            CompilerFamily::Nvcc => (
                &gcc::OPTIMIZATION_PREFIXES,
                gcc::optimization_flags(request.level, || {
                    Ok::<_, ToolchainError>(VersionTuple::default())
                })?,
            ),
            CompilerFamily::Generic(compiler) => (
                compiler.optimization_prefixes(),
                compiler.optimization_flags(request.level),
            ),
        };

        if request.debug && request.level != OptLevel::Debug {
            flags.push(self.debug_flag().to_string());
        }

        tracing::debug!("optimization level {}: {}", request.level, flags.join(" "));
        Ok(self.with_config(self.config.with_cflags_replaced(prefixes, &flags)))
    }

    fn debug_flag(&self) -> &'static str {
        match &self.family {
            CompilerFamily::Generic(GenericCompiler {
                dialect: Dialect::Msvc,
                ..
            }) => "/Zi",
            _ => DEBUG_FLAG,
        }
    }

    fn with_config(&self, config: ToolchainConfig) -> Self {
        Toolchain {
            family: self.family.clone(),
            config,
            runtime_version: self.runtime_version.clone(),
            runner: Arc::clone(&self.runner),
        }
    }

    /// Start `argv` and wait for it.
    fn run(&self, argv: &[String]) -> Result<ProcessOutput> {
        let Some((program, args)) = argv.split_first() else {
            return Err(ToolchainError::Spawn {
                program: Default::default(),
                source: std::io::Error::new(std::io::ErrorKind::InvalidInput, "empty command line"),
            });
        };
        tracing::debug!("running: {}", display_command_line(argv));
        self.runner
            .run(Path::new(program), args)
            .map_err(|source| ToolchainError::Spawn {
                program: program.into(),
                source,
            })
    }

    /// Run a compile or link command and turn a failure into a
    /// [`ToolchainError::Compile`].
    fn check_build(&self, argv: &[String]) -> Result<()> {
        let output = self.run(argv)?;

        let stderr_failure = match self.family {
            CompilerFamily::Nvcc => {
                if !output.stdout.is_empty() {
                    tracing::debug!("nvcc stdout:\n{}", output.stdout);
                }
                if !output.stderr.is_empty() {
                    tracing::debug!("nvcc stderr:\n{}", output.stderr);
                }
                nvcc::stderr_reports_error(&output.stderr)
            }
            _ => false,
        };

        if output.success() && !stderr_failure {
            return Ok(());
        }

        Err(ToolchainError::Compile {
            command: display_command_line(argv),
            status: output.status,
            from_stderr: output.success(),
            stderr: output.stderr,
        })
    }

    /// Compile each source on its own; returns the object paths.
    fn compile_generic<P: AsRef<Path>>(
        &self,
        compiler: &GenericCompiler,
        output: Option<&Path>,
        sources: &[P],
    ) -> Result<Vec<String>> {
        let single = sources.len() == 1;
        let mut objects = Vec::with_capacity(sources.len());

        for source in sources {
            let source = source.as_ref();
            let object = match output {
                Some(out) if single => out.to_path_buf(),
                _ => compiler.object_path(source, self.o_ext()),
            };
            let object = object.display().to_string();
            let source = source.display().to_string();
            let argv = compiler.compile_command(&self.config, &source, &object);
            self.check_build(&argv)?;
            objects.push(object);
        }

        Ok(objects)
    }

    fn link_generic(
        &self,
        compiler: &GenericCompiler,
        output: &Path,
        objects: &[String],
    ) -> Result<()> {
        let output = output.display().to_string();
        let argv = compiler.link_command(&self.config, objects, Some(&output));
        self.check_build(&argv)
    }
}

fn path_args<P: AsRef<Path>>(paths: &[P]) -> Vec<String> {
    paths
        .iter()
        .map(|p| p.as_ref().display().to_string())
        .collect()
}

fn push_output(argv: &mut Vec<String>, output: &Path) {
    argv.push("-o".to_string());
    argv.push(output.display().to_string());
}
