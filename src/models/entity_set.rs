// file: src/models/entity_set.rs
// description: case-normalized string set with first-seen casing and sorted iteration
// reference: internal data structures

use serde::de::{SeqAccess, Visitor};
use serde::ser::SerializeSeq;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::collections::BTreeMap;
use std::fmt;

/// Deduplicated entity names. Membership is decided on the lower-cased,
/// trimmed value while the stored value keeps the casing it was first seen
/// with. Iteration order is the lexicographic order of the normalized key,
/// so serialized output is deterministic.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct EntitySet {
    entries: BTreeMap<String, String>,
}

impl EntitySet {
    pub fn new() -> Self {
        Self::default()
    }

    fn normalize(value: &str) -> String {
        value.trim().to_lowercase()
    }

    /// Insert a value, returning true if it was not already present.
    /// Empty and whitespace-only values are rejected.
    pub fn insert(&mut self, value: impl AsRef<str>) -> bool {
        let raw = value.as_ref().trim();
        if raw.is_empty() {
            return false;
        }

        let key = Self::normalize(raw);
        if self.entries.contains_key(&key) {
            return false;
        }

        self.entries.insert(key, raw.to_string());
        true
    }

    pub fn contains(&self, value: &str) -> bool {
        self.entries.contains_key(&Self::normalize(value))
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Union the other set into this one. Existing entries win, so first-seen
    /// casing is preserved across merges.
    pub fn extend_from(&mut self, other: &EntitySet) {
        for (key, value) in &other.entries {
            self.entries
                .entry(key.clone())
                .or_insert_with(|| value.clone());
        }
    }

    /// Stored values, sorted by normalized key.
    pub fn iter(&self) -> impl Iterator<Item = &str> {
        self.entries.values().map(String::as_str)
    }

    pub fn to_vec(&self) -> Vec<String> {
        self.entries.values().cloned().collect()
    }
}

impl<S: AsRef<str>> FromIterator<S> for EntitySet {
    fn from_iter<I: IntoIterator<Item = S>>(iter: I) -> Self {
        let mut set = EntitySet::new();
        for value in iter {
            set.insert(value);
        }
        set
    }
}

impl Serialize for EntitySet {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        let mut seq = serializer.serialize_seq(Some(self.entries.len()))?;
        for value in self.entries.values() {
            seq.serialize_element(value)?;
        }
        seq.end()
    }
}

impl<'de> Deserialize<'de> for EntitySet {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> std::result::Result<Self, D::Error> {
        struct SetVisitor;

        impl<'de> Visitor<'de> for SetVisitor {
            type Value = EntitySet;

            fn expecting(&self, formatter: &mut fmt::Formatter) -> fmt::Result {
                formatter.write_str("a sequence of strings")
            }

            fn visit_seq<A: SeqAccess<'de>>(
                self,
                mut seq: A,
            ) -> std::result::Result<Self::Value, A::Error> {
                let mut set = EntitySet::new();
                while let Some(value) = seq.next_element::<String>()? {
                    set.insert(value);
                }
                Ok(set)
            }
        }

        deserializer.deserialize_seq(SetVisitor)
    }
}
