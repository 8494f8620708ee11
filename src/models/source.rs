// file: src/models/source.rs
// description: normalized input text with source provenance and content hashing
// reference: internal data structures

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SourceInfo {
    /// Identifier of where the text came from: a file name, channel id, url.
    pub id: String,
    pub url: Option<String>,
}

impl SourceInfo {
    pub fn new(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            url: None,
        }
    }

    pub fn with_url(mut self, url: impl Into<String>) -> Self {
        self.url = Some(url.into());
        self
    }
}

/// Whitespace-collapsed input text. Immutable once produced; every later
/// stage reads from it and none may mutate it.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NormalizedText {
    pub text: String,
    pub source: SourceInfo,
    pub content_hash: String,
    pub received_at: DateTime<Utc>,
}

impl NormalizedText {
    /// Collapse all runs of whitespace to single spaces and trim the ends.
    pub fn new(raw: &str, source: SourceInfo) -> Self {
        let text = raw.split_whitespace().collect::<Vec<_>>().join(" ");
        let content_hash = Self::compute_hash(&text);

        Self {
            text,
            source,
            content_hash,
            received_at: Utc::now(),
        }
    }

    fn compute_hash(content: &str) -> String {
        let mut hasher = Sha256::new();
        hasher.update(content.as_bytes());
        format!("{:x}", hasher.finalize())
    }

    pub fn len(&self) -> usize {
        self.text.len()
    }

    pub fn is_empty(&self) -> bool {
        self.text.is_empty()
    }
}
