// file: src/models/threat_level.rs
// description: threat severity levels with a fixed escalation order
// reference: threat intelligence severity conventions

use serde::{Deserialize, Serialize};
use std::fmt;

/// Severity of a reported threat. The variant order is the escalation order
/// used by the merge engine: Unknown < Low < Medium < High < Critical.
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize,
)]
pub enum ThreatLevel {
    #[default]
    Unknown,
    Low,
    Medium,
    High,
    Critical,
}

impl ThreatLevel {
    /// Parse a level label as reported by the semantic layer. Unrecognized
    /// labels yield None so the merge can ignore them instead of defaulting
    /// them to a rank. "Severe" is an accepted alias for High.
    pub fn from_label(label: &str) -> Option<ThreatLevel> {
        match label.trim().to_lowercase().as_str() {
            "unknown" => Some(ThreatLevel::Unknown),
            "low" => Some(ThreatLevel::Low),
            "medium" => Some(ThreatLevel::Medium),
            "high" | "severe" => Some(ThreatLevel::High),
            "critical" => Some(ThreatLevel::Critical),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            ThreatLevel::Unknown => "Unknown",
            ThreatLevel::Low => "Low",
            ThreatLevel::Medium => "Medium",
            ThreatLevel::High => "High",
            ThreatLevel::Critical => "Critical",
        }
    }
}

impl fmt::Display for ThreatLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_escalation_order() {
        assert!(ThreatLevel::Unknown < ThreatLevel::Low);
        assert!(ThreatLevel::Low < ThreatLevel::Medium);
        assert!(ThreatLevel::Medium < ThreatLevel::High);
        assert!(ThreatLevel::High < ThreatLevel::Critical);
    }

    #[test]
    fn test_label_parsing() {
        assert_eq!(ThreatLevel::from_label("Critical"), Some(ThreatLevel::Critical));
        assert_eq!(ThreatLevel::from_label("  low "), Some(ThreatLevel::Low));
        assert_eq!(ThreatLevel::from_label("SEVERE"), Some(ThreatLevel::High));
    }

    #[test]
    fn test_unrecognized_label_ignored() {
        assert_eq!(ThreatLevel::from_label("apocalyptic"), None);
        assert_eq!(ThreatLevel::from_label(""), None);
    }

    #[test]
    fn test_default_is_unknown() {
        assert_eq!(ThreatLevel::default(), ThreatLevel::Unknown);
    }
}
