//! NVCC-specific behaviour.

use crate::core::version::VersionTuple;

/// Undefine NVCC always needs: some platform headers use block syntax
/// behind `__BLOCKS__`, which the CUDA front end rejects.
pub const BLOCKS_UNDEFINE: &str = "__BLOCKS__";

/// Flag that forwards the following comma-separated list to the host compiler.
pub const HOST_COMPILER_PASSTHROUGH: &str = "-Xcompiler";

/// Whether a finished NVCC invocation failed according to its stderr.
///
/// nvcc can exit with status 0 after reporting an error, so any
/// occurrence of the exact, case-sensitive substring `error` in the raw
/// stderr counts as a failure.
pub fn stderr_reports_error(stderr: &str) -> bool {
    stderr.contains("error")
}

/// Parse the release line of `nvcc --version`.
///
/// The fourth line reads `Cuda compilation tools, release 12.2, V12.2.140`;
/// the fifth and sixth words are split on dots and parsed as one sequence.
pub(crate) fn parse_version_tuple(banner: &str) -> VersionTuple {
    let Some(line) = banner.split('\n').nth(3) else {
        return VersionTuple::default();
    };
    let words: Vec<&str> = line.split_whitespace().collect();

    let components = words
        .iter()
        .skip(4)
        .take(2)
        .flat_map(|word| word.split('.'));
    VersionTuple::from_components(components)
}
