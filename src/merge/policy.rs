// file: src/merge/policy.rs
// description: named conflict-resolution policies for scalar report fields
// reference: merge semantics for multi-pass extraction

use crate::models::ThreatLevel;

/// Scans candidates in input order and keeps the first value that is not a
/// placeholder. Later "Unknown" results never overwrite an earlier real one.
pub struct FirstKnownWins;

const PLACEHOLDERS: [&str; 2] = ["unknown", "n/a"];

impl FirstKnownWins {
    pub fn resolve<'a>(candidates: impl IntoIterator<Item = &'a str>) -> Option<String> {
        candidates
            .into_iter()
            .map(str::trim)
            .find(|c| !c.is_empty() && !PLACEHOLDERS.contains(&c.to_lowercase().as_str()))
            .map(str::to_string)
    }
}

/// Severity escalation: the canonical level is the maximum rank seen.
/// Inputs that failed label parsing are simply absent from the iterator, so
/// unrecognized levels contribute nothing.
pub struct MaxSeverity;

impl MaxSeverity {
    pub fn resolve(levels: impl IntoIterator<Item = ThreatLevel>) -> ThreatLevel {
        levels
            .into_iter()
            .max()
            .unwrap_or(ThreatLevel::Unknown)
    }
}

/// Keeps the first N non-empty partial summaries, space-joined in input
/// order. A deliberately lossy simplification, not a semantic merge.
pub struct JoinFirstN {
    limit: usize,
}

impl JoinFirstN {
    pub fn new(limit: usize) -> Self {
        Self { limit }
    }

    pub fn resolve<'a>(&self, summaries: impl IntoIterator<Item = &'a str>) -> String {
        summaries
            .into_iter()
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .take(self.limit)
            .collect::<Vec<_>>()
            .join(" ")
    }
}
