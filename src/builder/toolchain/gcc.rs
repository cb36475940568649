//! GCC-family command lines, version parsing and optimization flags.
//!
//! NVCC accepts the same command-line shape, so its strategy reuses
//! [`command_line`] and [`dependency_command`].

use crate::core::config::{ToolchainConfig, DEBUG_FLAG};
use crate::core::version::VersionTuple;

use super::{CommandMode, OptLevel};

/// Flags removed before new optimization flags are applied.
pub(crate) const OPTIMIZATION_PREFIXES: [&str; 5] = ["-O", "-g", "-march", "-mtune", "-DNDEBUG"];

/// Define that disables assertions.
pub(crate) const NO_ASSERTIONS: &str = "-DNDEBUG";

/// Native tuning flags added at `-O2` and above on GCC 4.3+.
pub(crate) const NATIVE_ARCH_FLAGS: [&str; 2] = ["-march=native", "-mtune=native"];

/// Build the canonical GCC-style command line.
///
/// `[cc] [cflags] [mode flags] [-D..] [-U..] [-I..] [files..] [-L..] [-l..]`,
/// where object mode uses `-c` and link mode uses the link flags plus the
/// trailing library arguments.
pub(crate) fn command_line(
    config: &ToolchainConfig,
    files: &[String],
    mode: CommandMode,
) -> Vec<String> {
    let mut argv = vec![config.cc_token()];
    argv.extend(config.cflags.iter().cloned());

    match mode {
        CommandMode::Object => argv.push("-c".to_string()),
        CommandMode::Link => argv.extend(config.ldflags.iter().cloned()),
    }

    argv.extend(config.preprocessor_args());
    argv.extend(files.iter().cloned());

    if mode == CommandMode::Link {
        argv.extend(config.library_args());
    }

    argv
}

/// `[cc] -M [-D..] [-U..] [-I..] [sources..]`
pub(crate) fn dependency_command(config: &ToolchainConfig, sources: &[String]) -> Vec<String> {
    let mut argv = vec![config.cc_token(), "-M".to_string()];
    argv.extend(config.preprocessor_args());
    argv.extend(sources.iter().cloned());
    argv
}

/// GCC prints its version as the third word of the first banner line,
/// e.g. `gcc (GCC) 13.2.1 20230801`.
pub(crate) fn parse_version_tuple(banner: &str) -> VersionTuple {
    banner
        .split('\n')
        .next()
        .and_then(|line| line.split_whitespace().nth(2))
        .map(VersionTuple::parse_dotted)
        .unwrap_or_default()
}

/// Flags appended for `level`.
///
/// `version` is only consulted for numeric levels of 2 and above, so a
/// debug or low-level request never queries the compiler.
pub(crate) fn optimization_flags<E>(
    level: OptLevel,
    version: impl FnOnce() -> Result<VersionTuple, E>,
) -> Result<Vec<String>, E> {
    let flags = match level {
        OptLevel::Debug => vec![DEBUG_FLAG.to_string()],
        OptLevel::Level(n) => {
            let mut flags = vec![format!("-O{}", n), NO_ASSERTIONS.to_string()];
            if n >= 2 && version()?.at_least(4, 3) {
                flags.extend(NATIVE_ARCH_FLAGS.iter().map(|f| f.to_string()));
            }
            flags
        }
    };
    Ok(flags)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::convert::Infallible;

    fn config() -> ToolchainConfig {
        ToolchainConfig::new("gcc")
            .cflags(["-fPIC", "-Wall"])
            .ldflags(["-shared"])
            .defines(["NDEBUG"])
            .undefines(["__BLOCKS__"])
            .include_dirs(["/inc"])
            .library_dirs(["/lib1", "/lib2"])
            .libraries(["y", "x"])
    }

    fn files(names: &[&str]) -> Vec<String> {
        names.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn test_object_mode_order() {
        let argv = command_line(&config(), &files(&["a.c", "b.c"]), CommandMode::Object);
        assert_eq!(
            argv,
            vec!["gcc", "-fPIC", "-Wall", "-c", "-DNDEBUG", "-U__BLOCKS__", "-I/inc", "a.c", "b.c"]
        );
        assert!(!argv.iter().any(|a| a.starts_with("-L") || a.starts_with("-l")));
    }

    #[test]
    fn test_link_mode_order() {
        let argv = command_line(&config(), &files(&["a.o"]), CommandMode::Link);
        assert_eq!(
            argv,
            vec![
                "gcc", "-fPIC", "-Wall", "-shared", "-DNDEBUG", "-U__BLOCKS__", "-I/inc", "a.o",
                "-L/lib1", "-L/lib2", "-ly", "-lx",
            ]
        );
    }

    #[test]
    fn test_library_tokens_follow_all_inputs() {
        let argv = command_line(&config(), &files(&["a.o", "b.o", "c.o"]), CommandMode::Link);
        let last_input = argv.iter().rposition(|a| a.ends_with(".o")).unwrap();
        let first_lib = argv.iter().position(|a| a.starts_with("-L")).unwrap();
        assert!(first_lib > last_input);
    }

    #[test]
    fn test_dependency_command() {
        let argv = dependency_command(&config(), &files(&["a.c"]));
        assert_eq!(argv, vec!["gcc", "-M", "-DNDEBUG", "-U__BLOCKS__", "-I/inc", "a.c"]);
    }

    #[test]
    fn test_parse_gcc_banner() {
        let banner =
            "gcc (GCC) 13.2.1 20230801\nCopyright (C) 2023 Free Software Foundation, Inc.\n";
        assert_eq!(parse_version_tuple(banner), VersionTuple::from([13, 2, 1]));

        let ubuntu = "gcc (Ubuntu 11.4.0-1ubuntu1~22.04) 11.4.0\n";
        assert_eq!(parse_version_tuple(ubuntu), VersionTuple::from([11, 4]));

        assert!(parse_version_tuple("gcc\n").is_empty());
    }

    #[test]
    fn test_debug_level_skips_version_query() {
        let flags = optimization_flags(OptLevel::Debug, || -> Result<VersionTuple, &str> {
            Err("must not be called")
        })
        .unwrap();
        assert_eq!(flags, vec!["-g"]);
    }

    #[test]
    fn test_level_three_on_modern_gcc() {
        let version = || Ok::<_, Infallible>(VersionTuple::from([13, 2]));
        let flags = optimization_flags(OptLevel::Level(3), version).unwrap();
        assert_eq!(flags, vec!["-O3", "-DNDEBUG", "-march=native", "-mtune=native"]);
    }

    #[test]
    fn test_level_three_on_old_gcc() {
        let version = || Ok::<_, Infallible>(VersionTuple::from([4, 2]));
        let flags = optimization_flags(OptLevel::Level(3), version).unwrap();
        assert_eq!(flags, vec!["-O3", "-DNDEBUG"]);
    }

    #[test]
    fn test_level_one_never_tunes() {
        let flags = optimization_flags(OptLevel::Level(1), || -> Result<VersionTuple, &str> {
            Err("must not be called")
        })
        .unwrap();
        assert_eq!(flags, vec!["-O1", "-DNDEBUG"]);
    }
}
