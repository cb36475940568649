//! Reader for makefile-style build metadata.
//!
//! Handles `NAME = value` assignments, `#` comments, backslash line
//! continuations and `$(NAME)` / `${NAME}` references. Undefined
//! references expand to the empty string and `$$` is a literal `$`.

use std::collections::BTreeMap;
use std::path::Path;
use std::sync::LazyLock;

use anyhow::{Context, Result};
use regex::Regex;

static ASSIGNMENT: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^([A-Za-z_][A-Za-z0-9_]*)\s*[:+?]?=\s*(.*)$").expect("valid assignment regex")
});

static REFERENCE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"\$\(([A-Za-z_][A-Za-z0-9_]*)\)|\$\{([A-Za-z_][A-Za-z0-9_]*)\}")
        .expect("valid reference regex")
});

/// Nested references deeper than this are left unexpanded.
const MAX_EXPANSION_DEPTH: usize = 32;

/// Placeholder for `$$` while references are being expanded.
const ESCAPED_DOLLAR: &str = "\u{0}DOLLAR\u{0}";

/// Join physical lines ending in a backslash with the line that follows.
///
/// The backslash itself is dropped; a trailing backslash on the final
/// line is kept as a line of its own content.
pub fn join_continued_lines<'a>(lines: impl IntoIterator<Item = &'a str>) -> Vec<String> {
    let mut joined = Vec::new();
    let mut pending: Option<String> = None;

    for line in lines {
        let line = line.strip_suffix('\r').unwrap_or(line);
        let mut current = pending.take().unwrap_or_default();
        match line.strip_suffix('\\') {
            Some(head) => {
                current.push_str(head);
                pending = Some(current);
            }
            None => {
                current.push_str(line);
                joined.push(current);
            }
        }
    }

    if let Some(rest) = pending {
        joined.push(rest);
    }

    joined
}

/// Parse makefile text into fully expanded variables.
pub fn parse_makefile_str(contents: &str) -> BTreeMap<String, String> {
    let mut raw = BTreeMap::new();

    for line in join_continued_lines(contents.lines()) {
        // recipe lines
        if line.starts_with('\t') {
            continue;
        }
        let trimmed = line.trim();
        if trimmed.is_empty() || trimmed.starts_with('#') {
            continue;
        }
        if let Some(caps) = ASSIGNMENT.captures(trimmed) {
            let value = caps[2].trim().replace("$$", ESCAPED_DOLLAR);
            raw.insert(caps[1].to_string(), value);
        }
    }

    raw.iter()
        .map(|(name, value)| {
            let expanded = expand(value, &raw, 0).replace(ESCAPED_DOLLAR, "$");
            (name.clone(), expanded)
        })
        .collect()
}

/// Read and parse a makefile from disk.
pub fn parse_makefile(path: &Path) -> Result<BTreeMap<String, String>> {
    let contents = std::fs::read_to_string(path)
        .with_context(|| format!("failed to read build metadata: {}", path.display()))?;
    Ok(parse_makefile_str(&contents))
}

fn expand(value: &str, vars: &BTreeMap<String, String>, depth: usize) -> String {
    if depth >= MAX_EXPANSION_DEPTH || !value.contains('$') {
        return value.to_string();
    }

    REFERENCE
        .replace_all(value, |caps: &regex::Captures<'_>| {
            let name = caps
                .get(1)
                .or_else(|| caps.get(2))
                .map(|m| m.as_str())
                .unwrap_or_default();
            vars.get(name)
                .map(|v| expand(v, vars, depth + 1))
                .unwrap_or_default()
        })
        .into_owned()
}
