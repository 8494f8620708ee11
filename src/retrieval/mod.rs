// file: src/retrieval/mod.rs
// description: similarity retrieval over previously processed reports

pub mod embeddings;
pub mod store;

pub use embeddings::EmbeddingClient;
pub use store::{EMBEDDING_DIM, RelatedIncident, ReportStore, StoredReportMeta};
