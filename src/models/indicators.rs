// file: src/models/indicators.rs
// description: indicator-of-compromise sets and hash algorithm classification
// reference: stix ioc standards

use crate::models::EntitySet;
use serde::{Deserialize, Serialize};

/// File hash algorithm, classified purely by hex-string length. Downstream
/// consumers rely on this exact mapping when building graph observables, so
/// it must never be re-derived elsewhere.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum HashAlgorithm {
    Md5,
    Sha1,
    Sha256,
}

impl HashAlgorithm {
    /// Classify a candidate hash string. Anything that is not a hex string of
    /// length 32, 40 or 64 is not a hash at all and yields None.
    pub fn classify(value: &str) -> Option<HashAlgorithm> {
        if !value.chars().all(|c| c.is_ascii_hexdigit()) {
            return None;
        }

        match value.len() {
            32 => Some(HashAlgorithm::Md5),
            40 => Some(HashAlgorithm::Sha1),
            64 => Some(HashAlgorithm::Sha256),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            HashAlgorithm::Md5 => "MD5",
            HashAlgorithm::Sha1 => "SHA-1",
            HashAlgorithm::Sha256 => "SHA-256",
        }
    }
}

/// Indicator sets keyed by kind. Hash values keep the casing they were found
/// with; comparison is case-insensitive through EntitySet either way.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct IndicatorSet {
    pub ipv4: EntitySet,
    pub domain: EntitySet,
    pub hash: EntitySet,
    pub email: EntitySet,
}

impl IndicatorSet {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn extend_from(&mut self, other: &IndicatorSet) {
        self.ipv4.extend_from(&other.ipv4);
        self.domain.extend_from(&other.domain);
        self.hash.extend_from(&other.hash);
        self.email.extend_from(&other.email);
    }

    pub fn total(&self) -> usize {
        self.ipv4.len() + self.domain.len() + self.hash.len() + self.email.len()
    }

    pub fn is_empty(&self) -> bool {
        self.total() == 0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_hash_classification_by_length() {
        assert_eq!(
            HashAlgorithm::classify("d41d8cd98f00b204e9800998ecf8427e"),
            Some(HashAlgorithm::Md5)
        );
        assert_eq!(
            HashAlgorithm::classify("da39a3ee5e6b4b0d3255bfef95601890afd80709"),
            Some(HashAlgorithm::Sha1)
        );
        assert_eq!(
            HashAlgorithm::classify(
                "e3b0c44298fc1c149afbf4c8996fb92427ae41e4649b934ca495991b7852b855"
            ),
            Some(HashAlgorithm::Sha256)
        );
    }

    #[test]
    fn test_other_lengths_excluded() {
        // 33 hex chars is not any known digest
        assert_eq!(
            HashAlgorithm::classify("d41d8cd98f00b204e9800998ecf8427e0"),
            None
        );
        assert_eq!(HashAlgorithm::classify("abcd"), None);
        assert_eq!(HashAlgorithm::classify(""), None);
    }

    #[test]
    fn test_non_hex_rejected() {
        assert_eq!(
            HashAlgorithm::classify("z41d8cd98f00b204e9800998ecf8427e"),
            None
        );
    }

    #[test]
    fn test_classification_case_independent() {
        let lower = HashAlgorithm::classify("d41d8cd98f00b204e9800998ecf8427e");
        let upper = HashAlgorithm::classify("D41D8CD98F00B204E9800998ECF8427E");
        assert_eq!(lower, upper);
    }

    #[test]
    fn test_indicator_totals() {
        let mut indicators = IndicatorSet::new();
        indicators.ipv4.insert("45.10.20.30");
        indicators.domain.insert("evil-c2.example.com");
        assert_eq!(indicators.total(), 2);
        assert!(!indicators.is_empty());
    }
}
