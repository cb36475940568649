//! Stable hashing of labelled fields.
//!
//! Fingerprints must not depend on the process, platform or Rust version,
//! so this hashes with SHA-256 over an explicit byte framing rather than
//! going through `std::hash::Hash`.

use sha2::{Digest, Sha256};

/// Length of [`Fingerprint::finish_short`] in hex characters.
pub const SHORT_LEN: usize = 16;

/// Incremental SHA-256 over named fields.
///
/// Every field is written as its label, a tag byte and length-prefixed
/// values, so no two different field sequences share an encoding.
#[derive(Debug, Clone, Default)]
pub struct Fingerprint {
    hasher: Sha256,
}

impl Fingerprint {
    pub fn new() -> Self {
        Fingerprint::default()
    }

    /// A field holding one string.
    pub fn field(&mut self, label: &str, value: &str) -> &mut Self {
        self.label(label, b's');
        self.bytes(value.as_bytes());
        self
    }

    /// A field that may be absent; absent and empty hash differently.
    pub fn optional(&mut self, label: &str, value: Option<&str>) -> &mut Self {
        match value {
            Some(v) => self.field(label, v),
            None => {
                self.label(label, b'-');
                self
            }
        }
    }

    /// A field holding an ordered list of strings.
    pub fn list<'a>(&mut self, label: &str, items: impl IntoIterator<Item = &'a str>) -> &mut Self {
        let items: Vec<&str> = items.into_iter().collect();
        self.label(label, b'l');
        self.hasher.update((items.len() as u64).to_le_bytes());
        for item in items {
            self.bytes(item.as_bytes());
        }
        self
    }

    /// Full hex digest.
    pub fn finish(self) -> String {
        hex::encode(self.hasher.finalize())
    }

    /// First [`SHORT_LEN`] hex characters of the digest.
    pub fn finish_short(self) -> String {
        let mut digest = self.finish();
        digest.truncate(SHORT_LEN);
        digest
    }

    fn label(&mut self, label: &str, tag: u8) {
        self.bytes(label.as_bytes());
        self.hasher.update([tag]);
    }

    fn bytes(&mut self, data: &[u8]) {
        self.hasher.update((data.len() as u64).to_le_bytes());
        self.hasher.update(data);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn short(build: impl FnOnce(&mut Fingerprint)) -> String {
        let mut fp = Fingerprint::new();
        build(&mut fp);
        fp.finish_short()
    }

    #[test]
    fn test_deterministic() {
        let a = short(|fp| {
            fp.field("cc", "gcc").list("argv", ["-O2", "-c"]);
        });
        let b = short(|fp| {
            fp.field("cc", "gcc").list("argv", ["-O2", "-c"]);
        });
        assert_eq!(a, b);
        assert_eq!(a.len(), SHORT_LEN);
    }

    #[test]
    fn test_list_boundaries() {
        let a = short(|fp| {
            fp.list("argv", ["ab", "c"]);
        });
        let b = short(|fp| {
            fp.list("argv", ["a", "bc"]);
        });
        assert_ne!(a, b);
    }

    #[test]
    fn test_labels_are_hashed() {
        let a = short(|fp| {
            fp.field("compiler", "x");
        });
        let b = short(|fp| {
            fp.field("runtime", "x");
        });
        assert_ne!(a, b);
    }

    #[test]
    fn test_absent_differs_from_empty() {
        let absent = short(|fp| {
            fp.optional("version", None);
        });
        let empty = short(|fp| {
            fp.optional("version", Some(""));
        });
        assert_ne!(absent, empty);
    }

    #[test]
    fn test_known_digest() {
        let fp = Fingerprint::new();
        assert_eq!(
            fp.finish(),
            "e3b0c44298fc1c149afbf4c8996fb92427ae41e4649b934ca495991b7852b855"
        );
    }
}
