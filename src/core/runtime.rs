//! Description of the host runtime that loads the compiled extensions.

use std::path::PathBuf;

use serde::{Deserialize, Serialize};

/// Environment variable naming the runtime's build metadata makefile.
pub const BUILD_METADATA_ENV: &str = "JITCHAIN_BUILD_METADATA";

/// Environment variable listing extra runtime include directories.
pub const INCLUDE_DIRS_ENV: &str = "JITCHAIN_INCLUDE_DIRS";

/// Environment variable listing extra runtime library directories.
pub const LIBRARY_DIRS_ENV: &str = "JITCHAIN_LIBRARY_DIRS";

/// The host runtime extensions are built for.
///
/// `version` is consumed opaquely as part of every ABI identity.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HostRuntime {
    /// Opaque runtime version string
    pub version: String,
    /// Pointer width of the running process, in bits
    pub process_pointer_width: u32,
    /// Pointer width the runtime itself was built for, in bits
    pub runtime_pointer_width: u32,
    /// Makefile-style build metadata describing how the runtime was built
    pub build_metadata_path: Option<PathBuf>,
    /// Headers every extension compiles against
    pub include_dirs: Vec<PathBuf>,
    /// Libraries every extension may link against
    pub library_dirs: Vec<PathBuf>,
}

impl HostRuntime {
    /// Describe a runtime with the given version and the current process's
    /// pointer width, and nothing else.
    pub fn new(version: impl Into<String>) -> Self {
        HostRuntime {
            version: version.into(),
            process_pointer_width: usize::BITS,
            runtime_pointer_width: usize::BITS,
            build_metadata_path: None,
            include_dirs: Vec::new(),
            library_dirs: Vec::new(),
        }
    }

    /// Describe the running process.
    ///
    /// The version string combines this crate's version with the host
    /// architecture and OS; paths come from the `JITCHAIN_*` variables.
    pub fn current() -> Self {
        let version = format!(
            "{} {} ({}-{}, {}-bit)",
            env!("CARGO_PKG_NAME"),
            env!("CARGO_PKG_VERSION"),
            std::env::consts::ARCH,
            std::env::consts::OS,
            usize::BITS
        );

        let mut runtime = HostRuntime::new(version);
        runtime.build_metadata_path = std::env::var_os(BUILD_METADATA_ENV).map(PathBuf::from);
        runtime.include_dirs = split_path_var(INCLUDE_DIRS_ENV);
        runtime.library_dirs = split_path_var(LIBRARY_DIRS_ENV);
        runtime
    }

    /// Use `path` as the build metadata makefile.
    pub fn with_build_metadata(mut self, path: impl Into<PathBuf>) -> Self {
        self.build_metadata_path = Some(path.into());
        self
    }

    /// Whether the process runs narrower than the runtime was built
    /// (e.g. a 32-bit slice of a universal binary).
    pub fn is_narrow_process(&self) -> bool {
        self.process_pointer_width == 32 && self.runtime_pointer_width > self.process_pointer_width
    }
}

fn split_path_var(name: &str) -> Vec<PathBuf> {
    std::env::var_os(name)
        .map(|value| {
            std::env::split_paths(&value)
                .filter(|p| !p.as_os_str().is_empty())
                .collect()
        })
        .unwrap_or_default()
}
