// file: src/pipeline/mod.rs
// description: document pipeline stages and run bookkeeping

pub mod engine;
pub mod progress;
pub mod stats;

pub use engine::{ExtractionPipeline, ProcessOutcome};
pub use progress::ProgressTracker;
pub use stats::{BatchStats, ExtractionStats};
