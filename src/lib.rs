// file: src/lib.rs
// description: library entry point and public api exports
// reference: rust library patterns
#![doc = include_str!(concat!(env!("CARGO_MANIFEST_DIR"), "/readme.md"))]

pub mod chunker;
pub mod config;
pub mod error;
pub mod exporter;
pub mod extractor;
pub mod filter;
pub mod llm;
pub mod merge;
pub mod models;
pub mod pipeline;
pub mod retrieval;
pub mod utils;

pub use chunker::{Chunk, Chunker};
pub use config::{
    ChunkingConfig, Config, ExtractionConfig, GateConfig, LlmConfig, RetrievalConfig,
};
pub use error::{PipelineError, Result};
pub use exporter::{ExportManifest, JsonExporter};
pub use extractor::{PatternExtractor, SemanticExtractor};
pub use filter::{RelevanceGate, Verdict};
pub use llm::{ChatCapability, ChatRequest, OllamaClient};
pub use merge::MergeEngine;
pub use models::{
    CtiReport, EntitySet, HashAlgorithm, IndicatorSet, NormalizedText, PartialReport,
    SourceInfo, ThreatLevel,
};
pub use pipeline::{BatchStats, ExtractionPipeline, ExtractionStats, ProcessOutcome, ProgressTracker};
pub use retrieval::{EmbeddingClient, RelatedIncident, ReportStore, StoredReportMeta};
