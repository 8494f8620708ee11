// file: src/models/report.rs
// description: partial per-pass extraction results and the merged canonical report
// reference: threat intelligence report structure

use crate::models::{EntitySet, IndicatorSet, SourceInfo, ThreatLevel};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Output of a single extraction pass: one chunk through the semantic layer,
/// or the whole-text pattern pass. Built once, never mutated afterwards;
/// the merge engine consumes these by value.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PartialReport {
    pub threat_actor: EntitySet,
    pub malware: EntitySet,
    pub tools: EntitySet,
    pub attack_patterns: EntitySet,
    pub vulnerabilities: EntitySet,
    pub targeted_countries: EntitySet,
    pub indicators: IndicatorSet,
    pub summary: Option<String>,
    pub threat_level: Option<ThreatLevel>,
}

impl PartialReport {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_empty(&self) -> bool {
        self.threat_actor.is_empty()
            && self.malware.is_empty()
            && self.tools.is_empty()
            && self.attack_patterns.is_empty()
            && self.vulnerabilities.is_empty()
            && self.targeted_countries.is_empty()
            && self.indicators.is_empty()
            && self.summary.is_none()
            && self.threat_level.is_none()
    }

    pub fn entity_count(&self) -> usize {
        self.threat_actor.len()
            + self.malware.len()
            + self.tools.len()
            + self.attack_patterns.len()
            + self.vulnerabilities.len()
            + self.targeted_countries.len()
            + self.indicators.total()
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReportMetadata {
    pub source: String,
    pub source_url: Option<String>,
    pub extraction_date: DateTime<Utc>,
}

impl ReportMetadata {
    pub fn new(source: &SourceInfo) -> Self {
        Self {
            source: source.id.clone(),
            source_url: source.url.clone(),
            extraction_date: Utc::now(),
        }
    }
}

/// The canonical, deduplicated extraction result for one document. The only
/// artifact that crosses the pipeline boundary; set fields serialize as
/// sorted lists.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CtiReport {
    pub metadata: ReportMetadata,
    pub summary: String,
    pub threat_actor: EntitySet,
    /// Single best-known actor, resolved by the first-known-wins policy.
    pub primary_actor: Option<String>,
    pub malware: EntitySet,
    pub tools: EntitySet,
    pub attack_patterns: EntitySet,
    pub vulnerabilities: EntitySet,
    pub indicators: IndicatorSet,
    pub targeted_countries: EntitySet,
    pub threat_level: ThreatLevel,
}

impl CtiReport {
    pub fn entity_count(&self) -> usize {
        self.threat_actor.len()
            + self.malware.len()
            + self.tools.len()
            + self.attack_patterns.len()
            + self.vulnerabilities.len()
            + self.targeted_countries.len()
            + self.indicators.total()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_partial_report_empty() {
        let partial = PartialReport::new();
        assert!(partial.is_empty());
        assert_eq!(partial.entity_count(), 0);
    }

    #[test]
    fn test_partial_report_counts() {
        let mut partial = PartialReport::new();
        partial.malware.insert("Warlock");
        partial.indicators.ipv4.insert("45.10.20.30");
        assert!(!partial.is_empty());
        assert_eq!(partial.entity_count(), 2);
    }

    #[test]
    fn test_threat_level_alone_makes_partial_nonempty() {
        let partial = PartialReport {
            threat_level: Some(ThreatLevel::Low),
            ..PartialReport::new()
        };
        assert!(!partial.is_empty());
        assert_eq!(partial.entity_count(), 0);
    }
}
