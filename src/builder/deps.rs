//! Header dependency listing.
//!
//! Parses the make-style rules a compiler prints in `-M` mode into a flat
//! set of header paths. There is no dependency graph: the set is all the
//! caller gets.

use std::collections::BTreeSet;
use std::path::PathBuf;

use serde::Serialize;

use crate::util::makefile::join_continued_lines;

/// Outcome of a dependency query.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", content = "headers", rename_all = "lowercase")]
pub enum HeaderDependencies {
    /// The compiler reported exactly these headers.
    Known(BTreeSet<PathBuf>),
    /// The toolchain cannot list dependencies. This is *not* the same as
    /// having none: callers must assume any header may matter.
    Unknown,
}

impl HeaderDependencies {
    pub fn is_known(&self) -> bool {
        matches!(self, HeaderDependencies::Known(_))
    }

    /// The header set, if the toolchain could determine it.
    pub fn headers(&self) -> Option<&BTreeSet<PathBuf>> {
        match self {
            HeaderDependencies::Known(headers) => Some(headers),
            HeaderDependencies::Unknown => None,
        }
    }
}

/// Parse make-style dependency output.
///
/// Continued lines are joined first. On each logical line the first two
/// tokens (the target and the token after it) are dropped; every
/// remaining token is a dependency.
pub fn parse_make_dependencies(output: &str) -> BTreeSet<PathBuf> {
    join_continued_lines(output.split('\n'))
        .iter()
        .flat_map(|line| {
            line.split_whitespace()
                .skip(2)
                .map(PathBuf::from)
                .collect::<Vec<_>>()
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn set(items: &[&str]) -> BTreeSet<PathBuf> {
        items.iter().map(PathBuf::from).collect()
    }

    #[test]
    fn test_continuation_line() {
        assert_eq!(
            parse_make_dependencies("a.o: a.c \\\n  b.h c.h\n"),
            set(&["b.h", "c.h"])
        );
    }

    #[test]
    fn test_multiple_rules_are_unioned() {
        let output = "a.o: a.c common.h \\\n  a.h\nb.o: b.c common.h b.h\n";
        assert_eq!(
            parse_make_dependencies(output),
            set(&["common.h", "a.h", "b.h"])
        );
    }

    #[test]
    fn test_crlf_and_empty_output() {
        assert_eq!(
            parse_make_dependencies("k.o: k.cu \\\r\n /usr/include/stdio.h\r\n"),
            set(&["/usr/include/stdio.h"])
        );
        assert!(parse_make_dependencies("").is_empty());
        assert!(parse_make_dependencies("a.o: a.c\n").is_empty());
    }

    #[test]
    fn test_unknown_is_not_empty() {
        let unknown = HeaderDependencies::Unknown;
        let none = HeaderDependencies::Known(BTreeSet::new());

        assert_ne!(unknown, none);
        assert!(!unknown.is_known());
        assert!(unknown.headers().is_none());
        assert_eq!(none.headers().map(BTreeSet::len), Some(0));
    }
}
