// file: src/models/mod.rs
// description: data model exports
// reference: internal data structures

pub mod entity_set;
pub mod indicators;
pub mod report;
pub mod source;
pub mod threat_level;

pub use entity_set::EntitySet;
pub use indicators::{HashAlgorithm, IndicatorSet};
pub use report::{CtiReport, PartialReport, ReportMetadata};
pub use source::{NormalizedText, SourceInfo};
pub use threat_level::ThreatLevel;
