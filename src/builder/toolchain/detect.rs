//! Toolchain guessing.
//!
//! The guesser derives a working toolchain from the host environment:
//!
//! 1. The host runtime's build metadata (a makefile recording the compiler
//!    and flags the runtime itself was built with)
//! 2. If that is missing or incomplete, the generic platform compiler plus
//!    the project configuration
//!
//! Every result is memoized per guesser. [`ToolchainGuesser::reset`] clears
//! the memo so the environment is probed again.

use std::collections::BTreeMap;
use std::path::PathBuf;
use std::sync::{Arc, LazyLock};

use crate::core::config::ToolchainConfig;
use crate::core::error::{Result, ToolchainError};
use crate::core::runtime::HostRuntime;
use crate::util::config::{load_config_for, ProjectConfig};
use crate::util::makefile::parse_makefile;
use crate::util::memo::Memo;
use crate::util::process::{display_command_line, ProcessRunner, SystemRunner};

use super::generic::GenericCompiler;
use super::nvcc::{BLOCKS_UNDEFINE, HOST_COMPILER_PASSTHROUGH};
use super::Toolchain;

/// Banner marker identifying GNU compilers.
const GNU_MARKER: &str = "Free Software Foundation";

/// Flag GNU C++ compilers warn about when it appears in CFLAGS.
const STRICT_PROTOTYPES: &str = "-Wstrict-prototypes";

/// Default CUDA compiler driver.
const DEFAULT_NVCC: &str = "nvcc";

/// Default object suffix when the metadata names no module objects.
const DEFAULT_OBJECT_SUFFIX: &str = ".o";

/// Everything the guesser looks at.
#[derive(Debug, Clone, PartialEq)]
pub struct GuessEnvironment {
    pub runtime: HostRuntime,
    pub project: ProjectConfig,
}

impl GuessEnvironment {
    pub fn new(runtime: HostRuntime, project: ProjectConfig) -> Self {
        GuessEnvironment { runtime, project }
    }

    /// The running process, with configuration for the current directory.
    pub fn detect() -> Self {
        let cwd = std::env::current_dir().unwrap_or_default();
        GuessEnvironment {
            runtime: HostRuntime::current(),
            project: load_config_for(&cwd),
        }
    }
}

/// Host compiler settings, before a compiler family is chosen.
#[derive(Debug, Clone, PartialEq)]
pub struct HostSettings {
    pub config: ToolchainConfig,
    /// The probed compiler, when settings came from the build system
    pub generic: Option<GenericCompiler>,
    /// Pointer width recorded in the build metadata, in bits
    pub runtime_pointer_width: Option<u32>,
}

impl HostSettings {
    /// Extract settings from parsed build metadata.
    ///
    /// `CXX`, `LIBDIR`, an include directory and a shared object extension
    /// are required; every other key defaults to empty.
    pub fn from_metadata(vars: &BTreeMap<String, String>) -> Result<Self> {
        let words = |key: &str| -> Vec<String> {
            vars.get(key)
                .map(|v| v.split_whitespace().map(str::to_string).collect())
                .unwrap_or_default()
        };

        let mut cc_cmdline = words("CXX");
        if cc_cmdline.is_empty() {
            return Err(ToolchainError::metadata("`CXX` is missing or empty"));
        }
        cc_cmdline.extend(words("CFLAGS"));
        cc_cmdline.extend(words("CFLAGSFORSHARED"));

        let cc = cc_cmdline.remove(0);
        let mut cflags = Vec::new();
        let mut defines = Vec::new();
        let mut undefines = Vec::new();
        for flag in cc_cmdline {
            if let Some(define) = flag.strip_prefix("-D") {
                defines.push(define.to_string());
            } else if let Some(undefine) = flag.strip_prefix("-U") {
                undefines.push(undefine.to_string());
            } else {
                cflags.push(flag);
            }
        }

        // The first LDSHARED word is the linker driver itself.
        let mut ldflags: Vec<String> = words("LDSHARED").into_iter().skip(1).collect();
        ldflags.extend(words("LINKFORSHARED"));

        let mut libraries = Vec::new();
        for token in words("LIBS") {
            match token.strip_prefix("-l") {
                Some(lib) => libraries.push(lib.to_string()),
                None => ldflags.push(token),
            }
        }

        // INCLUDEPY is the runtime's own header dir; INCLUDEDIR is only the prefix one.
        let include_dir = first_present(vars, &["INCLUDEPY", "INCLUDEDIR"]).ok_or_else(|| {
            ToolchainError::metadata("no include directory (`INCLUDEPY` or `INCLUDEDIR`)")
        })?;
        let library_dir = first_present(vars, &["LIBDIR"])
            .ok_or_else(|| ToolchainError::metadata("`LIBDIR` is missing"))?;
        let so_ext = first_present(vars, &["SO", "EXT_SUFFIX", "SHLIB_SUFFIX"]).ok_or_else(|| {
            ToolchainError::metadata(
                "no shared object extension (`SO`, `EXT_SUFFIX` or `SHLIB_SUFFIX`)",
            )
        })?;

        let o_ext = words("MODOBJS")
            .first()
            .and_then(|obj| obj.split('.').nth(1).map(|ext| format!(".{}", ext)))
            .unwrap_or_else(|| DEFAULT_OBJECT_SUFFIX.to_string());

        let runtime_pointer_width = vars
            .get("SIZEOF_VOID_P")
            .and_then(|v| v.trim().parse::<u32>().ok())
            .and_then(|bytes| bytes.checked_mul(8));

        let config = ToolchainConfig::new(cc)
            .cflags(cflags)
            .ldflags(ldflags)
            .defines(defines)
            .undefines(undefines)
            .include_dirs([include_dir])
            .library_dirs([library_dir])
            .libraries(libraries)
            .so_ext(so_ext)
            .o_ext(o_ext);

        Ok(HostSettings {
            config,
            generic: None,
            runtime_pointer_width,
        })
    }

    /// Settings for the generic compiler, from the host runtime's
    /// directories and the project configuration.
    pub fn from_build_system(env: &GuessEnvironment) -> Result<Self> {
        let settings = &env.project.toolchain;
        let compiler = GenericCompiler::probe(settings).map_err(ToolchainError::guess)?;

        let include_dirs = env.runtime.include_dirs.iter().chain(&settings.include_dirs).cloned();
        let library_dirs = env.runtime.library_dirs.iter().chain(&settings.library_dirs).cloned();

        let config = ToolchainConfig::new(compiler.path.clone())
            .cflags(settings.cxxflags.iter().cloned())
            .ldflags(settings.ldflags.iter().cloned())
            .include_dirs(include_dirs)
            .library_dirs(library_dirs)
            .so_ext(compiler.so_ext.clone())
            .o_ext(compiler.o_ext.clone());

        Ok(HostSettings {
            config,
            generic: Some(compiler),
            runtime_pointer_width: None,
        })
    }
}

fn first_present(vars: &BTreeMap<String, String>, keys: &[&str]) -> Option<String> {
    keys.iter()
        .filter_map(|k| vars.get(*k))
        .map(|v| v.trim())
        .find(|v| !v.is_empty())
        .map(str::to_string)
}

/// Memoized toolchain guesser.
#[derive(Debug)]
pub struct ToolchainGuesser {
    env: GuessEnvironment,
    runner: Arc<dyn ProcessRunner>,
    /// Failures are cached as well: a broken metadata file stays broken.
    metadata: Memo<std::result::Result<HostSettings, String>>,
    build_system: Memo<HostSettings>,
    toolchain: Memo<Toolchain>,
    generic: Memo<Toolchain>,
    nvcc: Memo<Toolchain>,
}

impl ToolchainGuesser {
    pub fn new(env: GuessEnvironment) -> Self {
        ToolchainGuesser {
            env,
            runner: Arc::new(SystemRunner),
            metadata: Memo::new(),
            build_system: Memo::new(),
            toolchain: Memo::new(),
            generic: Memo::new(),
            nvcc: Memo::new(),
        }
    }

    /// Start compiler processes with `runner`, for the guess itself and
    /// for every toolchain it returns.
    pub fn with_runner(mut self, runner: Arc<dyn ProcessRunner>) -> Self {
        self.runner = runner;
        self
    }

    pub fn env(&self) -> &GuessEnvironment {
        &self.env
    }

    /// Whether any part of the environment has been probed since creation
    /// or the last [`ToolchainGuesser::reset`].
    pub fn is_probed(&self) -> bool {
        self.metadata.is_probed() || self.build_system.is_probed()
    }

    /// Forget every memoized result.
    pub fn reset(&self) {
        self.metadata.reset();
        self.build_system.reset();
        self.toolchain.reset();
        self.generic.reset();
        self.nvcc.reset();
        tracing::debug!("toolchain guesses reset");
    }

    /// Host settings read from the build metadata.
    pub fn host_settings_from_metadata(&self) -> std::result::Result<HostSettings, String> {
        self.metadata
            .get_or_init(|| self.read_metadata().map_err(|e| e.to_string()))
    }

    /// Host settings for the generic compiler.
    pub fn host_settings_from_build_system(&self) -> Result<HostSettings> {
        self.build_system
            .get_or_try_init(|| HostSettings::from_build_system(&self.env))
    }

    /// Guess the host toolchain.
    ///
    /// Uses the build metadata when it is usable and the generic compiler
    /// otherwise. A metadata compiler that is not GNU is an error, not a
    /// reason to fall back.
    pub fn guess_toolchain(&self) -> Result<Toolchain> {
        self.toolchain.get_or_try_init(|| self.probe_toolchain())
    }

    /// Guess the generic platform toolchain.
    pub fn guess_generic_toolchain(&self) -> Result<Toolchain> {
        self.generic.get_or_try_init(|| {
            let host = self.host_settings_from_build_system()?;
            let compiler = host
                .generic
                .ok_or_else(|| ToolchainError::guess("no platform compiler"))?;
            tracing::info!(
                "using generic toolchain: {} ({:?})",
                compiler.path.display(),
                compiler.dialect
            );
            Ok(Toolchain::generic(compiler, host.config, self.env.runtime.version.as_str())
                .with_runner(Arc::clone(&self.runner)))
        })
    }

    /// Guess a CUDA toolchain layered on the host settings.
    pub fn guess_nvcc_toolchain(&self) -> Result<Toolchain> {
        self.nvcc.get_or_try_init(|| {
            let host = match self.host_settings_from_metadata() {
                Ok(host) => host,
                Err(reason) => {
                    tracing::debug!("nvcc host settings from build system ({})", reason);
                    self.host_settings_from_build_system()?
                }
            };

            let nvcc = self
                .env
                .project
                .toolchain
                .nvcc
                .clone()
                .unwrap_or_else(|| PathBuf::from(DEFAULT_NVCC));

            let host_cflags = &host.config.cflags;
            let cflags = if host_cflags.is_empty() {
                Vec::new()
            } else {
                vec![HOST_COMPILER_PASSTHROUGH.to_string(), host_cflags.join(",")]
            };

            let mut undefines = host.config.undefines.clone();
            undefines.push(BLOCKS_UNDEFINE.to_string());

            let mut config = ToolchainConfig::new(nvcc)
                .cflags(cflags)
                .defines(host.config.defines.iter().cloned())
                .undefines(undefines)
                .include_dirs(host.config.include_dirs.iter().cloned())
                .library_dirs(host.config.library_dirs.iter().cloned())
                .libraries(host.config.libraries.iter().cloned());
            config.so_ext = host.config.so_ext.clone();
            config.o_ext = host.config.o_ext.clone();

            tracing::info!("using nvcc toolchain: {}", config.cc.display());
            Ok(Toolchain::nvcc(config, self.env.runtime.version.as_str())
                .with_runner(Arc::clone(&self.runner)))
        })
    }

    fn read_metadata(&self) -> Result<HostSettings> {
        let path = self.env.runtime.build_metadata_path.as_ref().ok_or_else(|| {
            ToolchainError::metadata("no build metadata path configured")
        })?;
        tracing::debug!("reading build metadata from {}", path.display());
        let vars = parse_makefile(path).map_err(|e| ToolchainError::metadata(format!("{:#}", e)))?;
        HostSettings::from_metadata(&vars)
    }

    fn probe_toolchain(&self) -> Result<Toolchain> {
        let mut host = match self.host_settings_from_metadata() {
            Ok(host) => host,
            Err(reason) => {
                if self.env.runtime.build_metadata_path.is_some() {
                    tracing::warn!("{}; falling back to the generic toolchain", reason);
                } else {
                    tracing::debug!("{}; using the generic toolchain", reason);
                }
                return self.guess_generic_toolchain();
            }
        };

        let argv = vec![host.config.cc_token(), "--version".to_string()];
        tracing::debug!("running: {}", display_command_line(&argv));
        let output = self
            .runner
            .run(&host.config.cc, &argv[1..])
            .map_err(|source| ToolchainError::Spawn {
                program: host.config.cc.clone(),
                source,
            })?;
        if !output.success() {
            return Err(ToolchainError::guess(format!(
                "compiler version query failed: {}",
                output.stderr.trim()
            )));
        }
        let banner = output.stdout;

        if !banner.contains(GNU_MARKER) {
            return Err(ToolchainError::guess("unknown compiler"));
        }

        host.config.cflags.retain(|f| f != STRICT_PROTOTYPES);

        let mut runtime = self.env.runtime.clone();
        if let Some(width) = host.runtime_pointer_width {
            runtime.runtime_pointer_width = width;
        }
        if banner.contains("darwin") && runtime.is_narrow_process() {
            tracing::debug!("32-bit process on a wider runtime; adding -arch i386");
            host.config.cflags.extend(["-arch".to_string(), "i386".to_string()]);
        }

        tracing::info!("using gcc toolchain: {}", host.config.cc.display());
        Ok(Toolchain::gcc(host.config, self.env.runtime.version.as_str())
            .with_runner(Arc::clone(&self.runner)))
    }
}

static GLOBAL: LazyLock<ToolchainGuesser> =
    LazyLock::new(|| ToolchainGuesser::new(GuessEnvironment::detect()));

/// The process-wide guesser, created from the running environment on
/// first use.
pub fn global_guesser() -> &'static ToolchainGuesser {
    &GLOBAL
}

/// Guess the host toolchain with the process-wide guesser.
pub fn guess_toolchain() -> Result<Toolchain> {
    GLOBAL.guess_toolchain()
}

/// Guess the generic toolchain with the process-wide guesser.
pub fn guess_generic_toolchain() -> Result<Toolchain> {
    GLOBAL.guess_generic_toolchain()
}

/// Guess a CUDA toolchain with the process-wide guesser.
pub fn guess_nvcc_toolchain() -> Result<Toolchain> {
    GLOBAL.guess_nvcc_toolchain()
}
