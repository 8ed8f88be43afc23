//! # Fingerprints
//!
//! A fingerprint is a short content hash of the serialized document, used to
//! tell whether the document changed while an agent was working on it. It is
//! an equality oracle only: two trees with the same markdown always share a
//! fingerprint.

use cowrite_parser::{serialize, Document as Tree};
use crc32fast::Hasher;
use serde::{Deserialize, Serialize};
use std::fmt;

#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Fingerprint(String);

impl Fingerprint {
    /// Hash already-serialized markdown
    pub fn of_markdown(markdown: &str) -> Self {
        let mut hasher = Hasher::new();
        hasher.update(markdown.as_bytes());
        Self(format!("{:x}-{:08x}", markdown.chars().count(), hasher.finalize()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Compare against a fingerprint echoed back by a collaborator
    pub fn matches(&self, echoed: &str) -> bool {
        self.0 == echoed.trim()
    }
}

impl fmt::Display for Fingerprint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

pub fn fingerprint(tree: &Tree) -> Fingerprint {
    Fingerprint::of_markdown(&serialize(tree))
}

#[cfg(test)]
mod tests {
    use super::*;
    use cowrite_parser::parse;

    #[test]
    fn test_fingerprint_is_deterministic() {
        let tree = parse("## Overview\n\nHello.\n");
        assert_eq!(fingerprint(&tree), fingerprint(&tree));
        assert_eq!(fingerprint(&tree), fingerprint(&parse("## Overview\n\nHello.")));
    }

    #[test]
    fn test_fingerprint_changes_with_content() {
        let a = parse("## Overview\n\nHello.\n");
        let b = parse("## Overview\n\nHello!\n");
        let c = parse("### Overview\n\nHello.\n");
        assert_ne!(fingerprint(&a), fingerprint(&b));
        assert_ne!(fingerprint(&a), fingerprint(&c));
    }

    #[test]
    fn test_fingerprint_format() {
        let fp = Fingerprint::of_markdown("abc");
        let (count, crc) = fp.as_str().split_once('-').unwrap();
        assert_eq!(count, "3");
        assert_eq!(crc.len(), 8);
        assert!(fp.matches(" 3-352441c2 "));
    }
}
