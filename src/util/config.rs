//! Configuration file support for jitchain.
//!
//! Two locations are consulted:
//! - Global: `~/.jitchain/config.toml` - User-wide defaults
//! - Project: `.jitchain/config.toml` - Project-specific overrides
//!
//! Project config takes precedence over global config. This is the
//! auxiliary configuration the generic-compiler guess path reads its extra
//! compile and link flags from.

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

/// jitchain project configuration.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ProjectConfig {
    /// Toolchain settings
    pub toolchain: ToolchainSettings,
}

/// Toolchain settings consulted while guessing a toolchain.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "kebab-case")]
pub struct ToolchainSettings {
    /// Compiler used by the generic toolchain (e.g., /usr/bin/clang)
    pub cc: Option<PathBuf>,

    /// CUDA compiler driver (defaults to `nvcc` on PATH)
    pub nvcc: Option<PathBuf>,

    /// Extra compile flags for the generic toolchain
    pub cxxflags: Vec<String>,

    /// Extra link flags for the generic toolchain
    pub ldflags: Vec<String>,

    /// Additional include directories
    pub include_dirs: Vec<PathBuf>,

    /// Additional library directories
    pub library_dirs: Vec<PathBuf>,
}

impl ProjectConfig {
    /// Load configuration from a file.
    pub fn load(path: &Path) -> Result<Self> {
        let contents = std::fs::read_to_string(path)
            .with_context(|| format!("failed to read config file: {}", path.display()))?;

        toml::from_str(&contents)
            .with_context(|| format!("failed to parse config file: {}", path.display()))
    }

    /// Load configuration with fallback to defaults if the file doesn't exist
    /// or can't be parsed.
    pub fn load_or_default(path: &Path) -> Self {
        if path.exists() {
            Self::load(path).unwrap_or_else(|e| {
                tracing::warn!("Failed to load config from {}: {:#}", path.display(), e);
                Self::default()
            })
        } else {
            Self::default()
        }
    }

    /// Merge another config into this one (other takes precedence).
    pub fn merge(&mut self, other: ProjectConfig) {
        let tc = other.toolchain;
        if tc.cc.is_some() {
            self.toolchain.cc = tc.cc;
        }
        if tc.nvcc.is_some() {
            self.toolchain.nvcc = tc.nvcc;
        }
        if !tc.cxxflags.is_empty() {
            self.toolchain.cxxflags = tc.cxxflags;
        }
        if !tc.ldflags.is_empty() {
            self.toolchain.ldflags = tc.ldflags;
        }
        if !tc.include_dirs.is_empty() {
            self.toolchain.include_dirs = tc.include_dirs;
        }
        if !tc.library_dirs.is_empty() {
            self.toolchain.library_dirs = tc.library_dirs;
        }
    }
}

/// Load merged configuration from global and project locations.
///
/// Order of precedence (highest to lowest):
/// 1. Project config (.jitchain/config.toml)
/// 2. Global config (~/.jitchain/config.toml)
/// 3. Defaults
pub fn load_config(global_path: Option<&Path>, project_path: &Path) -> ProjectConfig {
    let mut config = ProjectConfig::default();

    if let Some(global) = global_path {
        if global.exists() {
            config.merge(ProjectConfig::load_or_default(global));
        }
    }

    if project_path.exists() {
        config.merge(ProjectConfig::load_or_default(project_path));
    }

    config
}

/// Load the configuration that applies to `project_root`.
pub fn load_config_for(project_root: &Path) -> ProjectConfig {
    let global = global_config_path();
    load_config(global.as_deref(), &project_config_path(project_root))
}

/// Get the global jitchain config directory (~/.jitchain).
pub fn global_config_dir() -> Option<PathBuf> {
    directories::BaseDirs::new().map(|b| b.home_dir().join(".jitchain"))
}

/// Get the global config path (~/.jitchain/config.toml).
pub fn global_config_path() -> Option<PathBuf> {
    global_config_dir().map(|dir| dir.join("config.toml"))
}

/// Get the project config path (.jitchain/config.toml).
pub fn project_config_path(project_root: &Path) -> PathBuf {
    project_root.join(".jitchain").join("config.toml")
}
