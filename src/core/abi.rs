//! ABI identity computation.
//!
//! The external artifact cache keys compiled extensions by an
//! [`AbiIdentity`]. Two toolchains that would compile a source identically
//! produce equal identities; any difference in compiler version, runtime
//! version or (for GCC and NVCC) the exact command line produces a
//! different one.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::util::hash::Fingerprint;

/// How much of the build an identity captures.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AbiStrength {
    /// Compiler version, runtime version and the full command line.
    Strong,
    /// Runtime version only. Changing compiler flags does not change a
    /// weak identity, so a cache keyed by it may hand back stale builds.
    Weak,
}

impl AbiStrength {
    pub fn as_str(&self) -> &'static str {
        match self {
            AbiStrength::Strong => "strong",
            AbiStrength::Weak => "weak",
        }
    }
}

/// Complete ABI identity of a toolchain.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct AbiIdentity {
    /// Raw `--version` output of the compiler, when it can be queried
    pub compiler_version: Option<String>,
    /// Host runtime version string
    pub runtime_version: String,
    /// Object-mode command line without input files
    pub command_line: Option<Vec<String>>,
}

impl AbiIdentity {
    /// Identity made of the compiler and runtime versions only.
    pub fn base(compiler_version: impl Into<String>, runtime_version: impl Into<String>) -> Self {
        AbiIdentity {
            compiler_version: Some(compiler_version.into()),
            runtime_version: runtime_version.into(),
            command_line: None,
        }
    }

    /// Identity made of the runtime version only.
    pub fn runtime_only(runtime_version: impl Into<String>) -> Self {
        AbiIdentity {
            compiler_version: None,
            runtime_version: runtime_version.into(),
            command_line: None,
        }
    }

    /// Extend the identity with the exact command line.
    pub fn with_command_line(mut self, argv: Vec<String>) -> Self {
        self.command_line = Some(argv);
        self
    }

    pub fn strength(&self) -> AbiStrength {
        if self.compiler_version.is_some() && self.command_line.is_some() {
            AbiStrength::Strong
        } else {
            AbiStrength::Weak
        }
    }

    /// Compute the fingerprint (cache key).
    ///
    /// Stable across processes and platforms: it depends only on the
    /// identity's contents, in order.
    pub fn fingerprint(&self) -> String {
        let mut fp = Fingerprint::new();

        fp.optional("compiler", self.compiler_version.as_deref())
            .field("runtime", &self.runtime_version);

        match &self.command_line {
            Some(argv) => fp.list("argv", argv.iter().map(String::as_str)),
            None => fp.optional("argv", None),
        };

        fp.finish_short()
    }
}

impl fmt::Display for AbiIdentity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} ({})", self.fingerprint(), self.strength().as_str())
    }
}
