//! The generic platform compiler.
//!
//! Used where no build metadata describes the runtime's compiler. The
//! compiler is found through configuration, `CC`, or the `cc` crate's
//! platform detection, and driven in either GNU or MSVC dialect.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::core::config::ToolchainConfig;
use crate::util::config::ToolchainSettings;

use super::{CommandMode, OptLevel};

/// Command-line dialect of a generic compiler.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Dialect {
    /// gcc, clang and anything else accepting `-c`/`-o`/`-shared`
    Gnu,
    /// cl.exe and clang-cl
    Msvc,
}

/// Handle on a probed platform compiler.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GenericCompiler {
    /// Compiler executable
    pub path: PathBuf,
    /// Argument style
    pub dialect: Dialect,
    /// Default shared library extension
    pub so_ext: String,
    /// Default object extension
    pub o_ext: String,
}

impl GenericCompiler {
    /// Describe the compiler at `path`, inferring its dialect from the
    /// executable name.
    pub fn new(path: impl Into<PathBuf>) -> Self {
        let path = path.into();
        let dialect = dialect_from_path(&path);
        GenericCompiler::with_dialect(path, dialect)
    }

    /// Describe the compiler at `path` with an explicit dialect.
    pub fn with_dialect(path: impl Into<PathBuf>, dialect: Dialect) -> Self {
        let (so_ext, o_ext) = match dialect {
            Dialect::Msvc => (".dll", ".obj"),
            Dialect::Gnu if cfg!(target_os = "windows") => (".dll", ".o"),
            Dialect::Gnu if cfg!(target_os = "macos") => (".dylib", ".o"),
            Dialect::Gnu => (".so", ".o"),
        };
        GenericCompiler {
            path: path.into(),
            dialect,
            so_ext: so_ext.to_string(),
            o_ext: o_ext.to_string(),
        }
    }

    /// Find the platform compiler.
    ///
    /// Order: `cc` from the project configuration, the `CC` environment
    /// variable, then the `cc` crate's detection for the host target.
    pub fn probe(settings: &ToolchainSettings) -> Result<Self, String> {
        if let Some(ref cc) = settings.cc {
            tracing::debug!("generic compiler from config: {}", cc.display());
            return Ok(GenericCompiler::new(cc.clone()));
        }

        if let Some(cc) = std::env::var_os("CC").filter(|v| !v.is_empty()) {
            let cc = PathBuf::from(cc);
            tracing::debug!("generic compiler from CC: {}", cc.display());
            return Ok(GenericCompiler::new(cc));
        }

        let triple = host_triple();
        let tool = cc::Build::new()
            .cargo_metadata(false)
            .cargo_warnings(false)
            .target(&triple)
            .host(&triple)
            .opt_level(0)
            .debug(false)
            .try_get_compiler()
            .map_err(|e| format!("no platform compiler for {}: {}", triple, e))?;

        let dialect = if tool.is_like_msvc() {
            Dialect::Msvc
        } else {
            Dialect::Gnu
        };
        tracing::debug!(
            "generic compiler from platform detection: {} ({:?})",
            tool.path().display(),
            dialect
        );
        Ok(GenericCompiler::with_dialect(tool.path(), dialect))
    }

    /// Representative command line for `files` in `mode`, without an
    /// output argument.
    pub(crate) fn command_line(
        &self,
        config: &ToolchainConfig,
        files: &[String],
        mode: CommandMode,
    ) -> Vec<String> {
        match mode {
            CommandMode::Object => {
                let mut argv = self.compile_prefix(config);
                argv.extend(files.iter().cloned());
                argv.extend(config.cflags.iter().cloned());
                argv
            }
            CommandMode::Link => self.link_command(config, files, None),
        }
    }

    /// Compile one source into `object`.
    pub(crate) fn compile_command(
        &self,
        config: &ToolchainConfig,
        source: &str,
        object: &str,
    ) -> Vec<String> {
        let mut argv = self.compile_prefix(config);
        argv.push(source.to_string());
        match self.dialect {
            Dialect::Gnu => {
                argv.push("-o".to_string());
                argv.push(object.to_string());
            }
            Dialect::Msvc => argv.push(format!("/Fo{}", object)),
        }
        // Extra flags go last so they can override the defaults.
        argv.extend(config.cflags.iter().cloned());
        argv
    }

    /// Link `objects` into a shared library at `output`.
    pub(crate) fn link_command(
        &self,
        config: &ToolchainConfig,
        objects: &[String],
        output: Option<&str>,
    ) -> Vec<String> {
        let mut argv = vec![config.cc_token()];
        match self.dialect {
            Dialect::Gnu => {
                argv.push("-shared".to_string());
                argv.extend(objects.iter().cloned());
                argv.extend(config.library_args());
                if let Some(output) = output {
                    argv.push("-o".to_string());
                    argv.push(output.to_string());
                }
            }
            Dialect::Msvc => {
                argv.push("/nologo".to_string());
                argv.push("/LD".to_string());
                argv.extend(objects.iter().cloned());
                if let Some(output) = output {
                    argv.push(format!("/Fe{}", output));
                }
                argv.push("/link".to_string());
                argv.extend(
                    config
                        .library_dirs
                        .iter()
                        .map(|d| format!("/LIBPATH:{}", d.display())),
                );
                argv.extend(config.libraries.iter().map(|l| format!("{}.lib", l)));
            }
        }
        argv.extend(config.ldflags.iter().cloned());
        argv
    }

    /// Flags for `level` in this compiler's dialect. There is no version
    /// probe, so native tuning is never added.
    pub(crate) fn optimization_flags(&self, level: OptLevel) -> Vec<String> {
        match (self.dialect, level) {
            (Dialect::Gnu, OptLevel::Debug) => vec!["-g".to_string()],
            (Dialect::Gnu, OptLevel::Level(n)) => vec![format!("-O{}", n), "-DNDEBUG".to_string()],
            (Dialect::Msvc, OptLevel::Debug) => vec!["/Od".to_string(), "/Zi".to_string()],
            (Dialect::Msvc, OptLevel::Level(0)) => vec!["/Od".to_string(), "/DNDEBUG".to_string()],
            (Dialect::Msvc, OptLevel::Level(1)) => vec!["/O1".to_string(), "/DNDEBUG".to_string()],
            (Dialect::Msvc, OptLevel::Level(_)) => vec!["/O2".to_string(), "/DNDEBUG".to_string()],
        }
    }

    /// Flag prefixes replaced by [`GenericCompiler::optimization_flags`].
    pub(crate) fn optimization_prefixes(&self) -> &'static [&'static str] {
        match self.dialect {
            Dialect::Gnu => &super::gcc::OPTIMIZATION_PREFIXES,
            Dialect::Msvc => &["/O", "/Z", "/DNDEBUG", "-O", "-DNDEBUG"],
        }
    }

    /// Object file path for `source`: same directory, object extension.
    pub(crate) fn object_path(&self, source: &Path, o_ext: &str) -> PathBuf {
        source.with_extension(o_ext.trim_start_matches('.'))
    }

    fn compile_prefix(&self, config: &ToolchainConfig) -> Vec<String> {
        let mut argv = vec![config.cc_token()];
        match self.dialect {
            Dialect::Gnu => {
                if !cfg!(target_os = "windows") {
                    argv.push("-fPIC".to_string());
                }
                argv.extend(config.preprocessor_args());
                argv.push("-c".to_string());
            }
            Dialect::Msvc => {
                argv.push("/nologo".to_string());
                argv.push("/c".to_string());
                argv.extend(config.defines.iter().map(|d| format!("/D{}", d)));
                argv.extend(config.undefines.iter().map(|u| format!("/U{}", u)));
                argv.extend(config.include_dirs.iter().map(|i| format!("/I{}", i.display())));
            }
        }
        argv
    }
}

fn dialect_from_path(path: &Path) -> Dialect {
    let stem = path
        .file_stem()
        .and_then(|s| s.to_str())
        .unwrap_or("")
        .to_lowercase();
    if stem == "cl" || stem == "clang-cl" {
        Dialect::Msvc
    } else {
        Dialect::Gnu
    }
}

/// Target triple of the running host, in the form the `cc` crate expects.
pub fn host_triple() -> String {
    let arch = std::env::consts::ARCH;
    match std::env::consts::OS {
        "linux" => format!("{}-unknown-linux-gnu", arch),
        "macos" => format!("{}-apple-darwin", arch),
        "windows" => format!("{}-pc-windows-msvc", arch),
        os => format!("{}-unknown-{}", arch, os),
    }
}
