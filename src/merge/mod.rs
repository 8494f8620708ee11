// file: src/merge/mod.rs
// description: folds partial extraction results into one canonical report
// reference: set-union aggregation with explicit scalar policies

pub mod policy;

pub use policy::{FirstKnownWins, JoinFirstN, MaxSeverity};

use crate::models::{CtiReport, PartialReport, ReportMetadata, SourceInfo, ThreatLevel};

/// Merge engine. Set-valued fields take the union of their inputs, which is
/// associative, commutative and idempotent; scalar fields go through the
/// named policies. Inputs are expected in pass order (pattern pass first,
/// then chunks left to right) since FirstKnownWins and the summary join are
/// order-sensitive.
pub struct MergeEngine {
    summary_policy: JoinFirstN,
}

impl MergeEngine {
    pub fn new(summary_limit: usize) -> Self {
        Self {
            summary_policy: JoinFirstN::new(summary_limit),
        }
    }

    pub fn merge(&self, partials: &[PartialReport], source: &SourceInfo) -> CtiReport {
        let mut merged = PartialReport::new();
        for partial in partials {
            merged.threat_actor.extend_from(&partial.threat_actor);
            merged.malware.extend_from(&partial.malware);
            merged.tools.extend_from(&partial.tools);
            merged.attack_patterns.extend_from(&partial.attack_patterns);
            merged.vulnerabilities.extend_from(&partial.vulnerabilities);
            merged
                .targeted_countries
                .extend_from(&partial.targeted_countries);
            merged.indicators.extend_from(&partial.indicators);
        }

        let primary_actor = FirstKnownWins::resolve(
            partials.iter().flat_map(|p| p.threat_actor.iter()),
        );

        let threat_level: ThreatLevel =
            MaxSeverity::resolve(partials.iter().filter_map(|p| p.threat_level));

        let summary = self
            .summary_policy
            .resolve(partials.iter().filter_map(|p| p.summary.as_deref()));

        CtiReport {
            metadata: ReportMetadata::new(source),
            summary,
            threat_actor: merged.threat_actor,
            primary_actor,
            malware: merged.malware,
            tools: merged.tools,
            attack_patterns: merged.attack_patterns,
            vulnerabilities: merged.vulnerabilities,
            indicators: merged.indicators,
            targeted_countries: merged.targeted_countries,
            threat_level,
        }
    }
}

impl Default for MergeEngine {
    fn default() -> Self {
        Self::new(2)
    }
}
