//! The toolchain configuration record.
//!
//! A [`ToolchainConfig`] is an immutable value. Every operation that
//! changes a setting returns a new record and leaves the receiver as it
//! was, so a configuration handed to one build can never be altered by
//! another.

use std::collections::BTreeSet;
use std::path::PathBuf;

use serde::{Deserialize, Serialize};

/// Prefix shared by all optimization-level flags.
pub const OPTIMIZATION_PREFIX: &str = "-O";

/// Flag enabling debug information.
pub const DEBUG_FLAG: &str = "-g";

/// Compiler settings shared by every compiler family.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ToolchainConfig {
    /// Compiler executable
    pub cc: PathBuf,
    /// Compile flags, in order
    pub cflags: Vec<String>,
    /// Link flags, in order
    pub ldflags: Vec<String>,
    /// Preprocessor defines (`NAME` or `NAME=VALUE`)
    pub defines: Vec<String>,
    /// Preprocessor undefines
    pub undefines: Vec<String>,
    /// Include search path; never holds duplicates
    pub include_dirs: Vec<PathBuf>,
    /// Library search path; never holds duplicates
    pub library_dirs: Vec<PathBuf>,
    /// Libraries to link, highest priority first
    pub libraries: Vec<String>,
    /// Shared object extension, including the dot; `None` means the
    /// compiler family's default
    pub so_ext: Option<String>,
    /// Object file extension, including the dot; `None` means the
    /// compiler family's default
    pub o_ext: Option<String>,
    /// Features already registered through [`ToolchainConfig::with_library`]
    pub features: BTreeSet<String>,
}

/// Field overrides for [`ToolchainConfig::with_overrides`].
///
/// Unset fields keep the receiver's value.
#[derive(Debug, Clone, Default)]
pub struct ConfigOverrides {
    pub cc: Option<PathBuf>,
    pub cflags: Option<Vec<String>>,
    pub ldflags: Option<Vec<String>>,
    pub defines: Option<Vec<String>>,
    pub undefines: Option<Vec<String>>,
    pub include_dirs: Option<Vec<PathBuf>>,
    pub library_dirs: Option<Vec<PathBuf>>,
    pub libraries: Option<Vec<String>>,
    pub so_ext: Option<String>,
    pub o_ext: Option<String>,
}

impl ToolchainConfig {
    /// Create a configuration for `cc` with empty flag lists and
    /// family-default extensions.
    pub fn new(cc: impl Into<PathBuf>) -> Self {
        ToolchainConfig {
            cc: cc.into(),
            cflags: Vec::new(),
            ldflags: Vec::new(),
            defines: Vec::new(),
            undefines: Vec::new(),
            include_dirs: Vec::new(),
            library_dirs: Vec::new(),
            libraries: Vec::new(),
            so_ext: None,
            o_ext: None,
            features: BTreeSet::new(),
        }
    }

    /// Set the compile flags.
    pub fn cflags(mut self, flags: impl IntoIterator<Item = impl Into<String>>) -> Self {
        self.cflags = flags.into_iter().map(Into::into).collect();
        self
    }

    /// Set the link flags.
    pub fn ldflags(mut self, flags: impl IntoIterator<Item = impl Into<String>>) -> Self {
        self.ldflags = flags.into_iter().map(Into::into).collect();
        self
    }

    /// Set the preprocessor defines.
    pub fn defines(mut self, defines: impl IntoIterator<Item = impl Into<String>>) -> Self {
        self.defines = defines.into_iter().map(Into::into).collect();
        self
    }

    /// Set the preprocessor undefines.
    pub fn undefines(mut self, undefines: impl IntoIterator<Item = impl Into<String>>) -> Self {
        self.undefines = undefines.into_iter().map(Into::into).collect();
        self
    }

    /// Set the include search path, dropping repeated entries.
    pub fn include_dirs(mut self, dirs: impl IntoIterator<Item = impl Into<PathBuf>>) -> Self {
        self.include_dirs = Vec::new();
        append_unique(&mut self.include_dirs, dirs);
        self
    }

    /// Set the library search path, dropping repeated entries.
    pub fn library_dirs(mut self, dirs: impl IntoIterator<Item = impl Into<PathBuf>>) -> Self {
        self.library_dirs = Vec::new();
        append_unique(&mut self.library_dirs, dirs);
        self
    }

    /// Set the libraries to link.
    pub fn libraries(mut self, libs: impl IntoIterator<Item = impl Into<String>>) -> Self {
        self.libraries = libs.into_iter().map(Into::into).collect();
        self
    }

    /// Set the shared object extension.
    pub fn so_ext(mut self, ext: impl Into<String>) -> Self {
        self.so_ext = Some(ext.into());
        self
    }

    /// Set the object file extension.
    pub fn o_ext(mut self, ext: impl Into<String>) -> Self {
        self.o_ext = Some(ext.into());
        self
    }

    /// Whether `feature` has already been registered.
    pub fn has_feature(&self, feature: &str) -> bool {
        self.features.contains(feature)
    }

    /// Return a copy with the library bundle `feature` registered.
    ///
    /// Registering a feature a second time returns an unchanged copy.
    /// Otherwise unseen include and library directories are appended in
    /// first-seen order and `libraries` are placed *before* the existing
    /// libraries, so the newest dependency is searched first.
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
        I::Item: Into<PathBuf>,
        L: IntoIterator,
        L::Item: Into<PathBuf>,
        S: Into<String>,
    {
        let mut next = self.clone();
        if next.features.contains(feature) {
            tracing::trace!("feature `{}` already registered", feature);
            return next;
        }

        next.features.insert(feature.to_string());
        append_unique(&mut next.include_dirs, include_dirs);
        append_unique(&mut next.library_dirs, library_dirs);

        let mut libs: Vec<String> = libraries.into_iter().map(Into::into).collect();
        libs.extend(next.libraries);
        next.libraries = libs;

        tracing::debug!("registered feature `{}`", feature);
        next
    }

    /// Return a copy with optimization flags removed and `-g` appended.
    #[must_use]
    pub fn with_debugging(&self) -> Self {
        let mut next = self.clone();
        next.cflags.retain(|f| !f.starts_with(OPTIMIZATION_PREFIX));
        next.cflags.push(DEBUG_FLAG.to_string());
        next
    }

    /// Return a copy with every flag starting with one of `prefixes`
    /// removed and `additions` appended.
    #[must_use]
    pub fn with_cflags_replaced(&self, prefixes: &[&str], additions: &[String]) -> Self {
        let mut next = self.clone();
        next.cflags
            .retain(|f| !prefixes.iter().any(|p| f.starts_with(p)));
        next.cflags.extend(additions.iter().cloned());
        next
    }

    /// Return a copy with the supplied fields replaced.
    #[must_use]
    pub fn with_overrides(&self, overrides: ConfigOverrides) -> Self {
        let mut next = self.clone();
        if let Some(cc) = overrides.cc {
            next.cc = cc;
        }
        if let Some(cflags) = overrides.cflags {
            next.cflags = cflags;
        }
        if let Some(ldflags) = overrides.ldflags {
            next.ldflags = ldflags;
        }
        if let Some(defines) = overrides.defines {
            next.defines = defines;
        }
        if let Some(undefines) = overrides.undefines {
            next.undefines = undefines;
        }
        if let Some(dirs) = overrides.include_dirs {
            next.include_dirs.clear();
            append_unique(&mut next.include_dirs, dirs);
        }
        if let Some(dirs) = overrides.library_dirs {
            next.library_dirs.clear();
            append_unique(&mut next.library_dirs, dirs);
        }
        if let Some(libraries) = overrides.libraries {
            next.libraries = libraries;
        }
        if overrides.so_ext.is_some() {
            next.so_ext = overrides.so_ext;
        }
        if overrides.o_ext.is_some() {
            next.o_ext = overrides.o_ext;
        }
        next
    }

    /// Preprocessor arguments: `-D`, `-U` and `-I` tokens in that order.
    pub fn preprocessor_args(&self) -> Vec<String> {
        let mut args = Vec::new();
        args.extend(self.defines.iter().map(|d| format!("-D{}", d)));
        args.extend(self.undefines.iter().map(|u| format!("-U{}", u)));
        args.extend(self.include_dirs.iter().map(|i| format!("-I{}", i.display())));
        args
    }

    /// Library arguments: `-L` tokens followed by `-l` tokens.
    pub fn library_args(&self) -> Vec<String> {
        let mut args = Vec::new();
        args.extend(self.library_dirs.iter().map(|l| format!("-L{}", l.display())));
        args.extend(self.libraries.iter().map(|l| format!("-l{}", l)));
        args
    }

    /// The compiler as a command-line token.
    pub fn cc_token(&self) -> String {
        self.cc.display().to_string()
    }
}

fn append_unique<T>(dirs: &mut Vec<PathBuf>, new: impl IntoIterator<Item = T>)
where
    T: Into<PathBuf>,
{
    for dir in new {
        let dir = dir.into();
        if !dirs.contains(&dir) {
            dirs.push(dir);
        }
    }
}
