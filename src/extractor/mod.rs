// file: src/extractor/mod.rs
// description: hybrid extraction layers
// reference: deterministic pattern layer plus per-chunk semantic layer

pub mod pattern;
pub mod patterns;
pub mod semantic;

pub use pattern::PatternExtractor;
pub use semantic::SemanticExtractor;
