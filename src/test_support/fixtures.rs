//! Test fixtures: compiler banners, build metadata and ready-made toolchains.

use std::path::{Path, PathBuf};

use crate::builder::toolchain::detect::GuessEnvironment;
use crate::builder::toolchain::generic::{Dialect, GenericCompiler};
use crate::builder::toolchain::Toolchain;
use crate::core::config::ToolchainConfig;
use crate::core::runtime::HostRuntime;
use crate::util::config::{ProjectConfig, ToolchainSettings};

/// Runtime version used by every fixture toolchain.
pub const RUNTIME_VERSION: &str = "testrt 3.11.4 (x86_64-linux, 64-bit)";

pub const GCC_BANNER: &str = "gcc (GCC) 9.4.0\n\
Copyright (C) 2019 Free Software Foundation, Inc.\n\
This is free software; see the source for copying conditions.\n";

pub const DARWIN_GCC_BANNER: &str =
    "i686-apple-darwin10-gcc-4.2.1 (GCC) 4.2.1 (Apple Inc. build 5666) (dot 3)\n\
Copyright (C) 2007 Free Software Foundation, Inc.\n";

pub const CLANG_BANNER: &str = "clang version 17.0.6\n\
Target: x86_64-pc-linux-gnu\n\
Thread model: posix\n";

/// Build metadata as a runtime installed under `/opt/rt` would record it.
pub const METADATA: &str = "\
# Generated by configure
prefix = /opt/rt
CXX = g++ -pthread
CFLAGS = -O2 -Wall -Wstrict-prototypes -DNDEBUG -U_FORTIFY_SOURCE
CFLAGSFORSHARED = -fPIC
LDSHARED = gcc -pthread -shared
LINKFORSHARED = -Xlinker \\
\t-export-dynamic
LIBS = -ldl -lm
INCLUDEDIR = $(prefix)/include
LIBDIR = ${prefix}/lib
SO = .rt-3.so
MODOBJS = Modules/main.o Modules/gc.o
SIZEOF_VOID_P = 8
";

/// Write `contents` to `dir/Makefile` and return the path.
pub fn write_metadata(dir: &Path, contents: &str) -> PathBuf {
    let path = dir.join("Makefile");
    std::fs::write(&path, contents).expect("write metadata fixture");
    path
}

/// A guess environment with an optional metadata file and project settings.
pub fn guess_env(metadata: Option<&Path>, settings: ToolchainSettings) -> GuessEnvironment {
    let mut runtime = HostRuntime::new(RUNTIME_VERSION);
    runtime.process_pointer_width = 64;
    runtime.runtime_pointer_width = 64;
    if let Some(path) = metadata {
        runtime = runtime.with_build_metadata(path);
    }
    GuessEnvironment::new(runtime, ProjectConfig { toolchain: settings })
}

pub fn gcc_toolchain(config: ToolchainConfig) -> Toolchain {
    Toolchain::gcc(config, RUNTIME_VERSION)
}

pub fn nvcc_toolchain(config: ToolchainConfig) -> Toolchain {
    Toolchain::nvcc(config, RUNTIME_VERSION)
}

/// A GNU-dialect generic toolchain.
pub fn generic_toolchain(config: ToolchainConfig) -> Toolchain {
    let compiler = GenericCompiler::with_dialect(config.cc.clone(), Dialect::Gnu);
    Toolchain::generic(compiler, config, RUNTIME_VERSION)
}
