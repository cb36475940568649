//! Permissive compiler version tuples.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Numeric version components, compared lexicographically.
///
/// Parsing stops at the first non-numeric component, so `4.3.2-ubuntu`
/// yields `(4, 3)` and a banner without a version yields `()`. A shorter
/// tuple sorts before any of its extensions: `(4,) < (4, 3)`.
#[derive(Debug, Clone, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct VersionTuple(pub Vec<u32>);

impl VersionTuple {
    /// Collect integers from `components` until the first one that isn't one.
    pub fn from_components<'a>(components: impl IntoIterator<Item = &'a str>) -> Self {
        VersionTuple(
            components
                .into_iter()
                .map_while(|c| c.parse::<u32>().ok())
                .collect(),
        )
    }

    /// Split a dotted version token and parse it permissively.
    pub fn parse_dotted(token: &str) -> Self {
        Self::from_components(token.split('.'))
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn components(&self) -> &[u32] {
        &self.0
    }

    /// Whether this version is at least `major.minor`.
    pub fn at_least(&self, major: u32, minor: u32) -> bool {
        self.0.as_slice() >= [major, minor].as_slice()
    }
}

impl<const N: usize> From<[u32; N]> for VersionTuple {
    fn from(parts: [u32; N]) -> Self {
        VersionTuple(parts.to_vec())
    }
}

impl fmt::Display for VersionTuple {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let parts: Vec<String> = self.0.iter().map(|n| n.to_string()).collect();
        write!(f, "{}", parts.join("."))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_plain() {
        assert_eq!(VersionTuple::parse_dotted("4.3.2"), VersionTuple::from([4, 3, 2]));
    }

    #[test]
    fn test_parse_stops_at_suffix() {
        assert_eq!(
            VersionTuple::parse_dotted("11.4.0-1ubuntu1~22.04)"),
            VersionTuple::from([11, 4])
        );
        assert!(VersionTuple::parse_dotted("(GCC)").is_empty());
    }

    #[test]
    fn test_ordering() {
        assert!(VersionTuple::from([4, 3]) >= VersionTuple::from([4, 3]));
        assert!(VersionTuple::from([4]) < VersionTuple::from([4, 3]));
        assert!(VersionTuple::from([4, 2, 9]) < VersionTuple::from([4, 3]));
        assert!(VersionTuple::from([12]).at_least(4, 3));
        assert!(!VersionTuple::from([4]).at_least(4, 3));
        assert!(!VersionTuple::default().at_least(4, 3));
    }

    #[test]
    fn test_display() {
        assert_eq!(VersionTuple::from([12, 2]).to_string(), "12.2");
    }
}
