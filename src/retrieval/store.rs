// file: src/retrieval/store.rs
// description: persistent LanceDB report store for similarity retrieval
// reference: https://docs.rs/lancedb

use crate::config::RetrievalConfig;
use crate::error::{PipelineError, Result};
use crate::retrieval::embeddings::EmbeddingClient;
use arrow_array::{
    FixedSizeListArray, Float32Array, RecordBatch, RecordBatchIterator, StringArray, UInt64Array,
};
use arrow_schema::{DataType, Field, Schema};
use futures::StreamExt;
use lance_arrow::FixedSizeListArrayExt;
use lancedb::query::{ExecutableQuery, QueryBase};
use lancedb::{Connection, Table, connect};
use std::sync::Arc;
use std::time::{SystemTime, UNIX_EPOCH};
use tracing::{debug, info, warn};
use uuid::Uuid;

pub const EMBEDDING_DIM: usize = 768;

/// Metadata stored alongside a report's text.
#[derive(Debug, Clone)]
pub struct StoredReportMeta {
    pub title: String,
    pub source_url: Option<String>,
}

/// A prior report retrieved by vector similarity.
#[derive(Debug, Clone)]
pub struct RelatedIncident {
    pub id: String,
    pub title: String,
    pub content: String,
    pub score: f32,
    pub distance: Option<f32>,
}

/// Append-only, id-keyed store of previously processed reports. Writes are
/// serialized by LanceDB itself; multiple pipeline instances may share one
/// store.
pub struct ReportStore {
    connection: Connection,
    config: RetrievalConfig,
    embedder: Option<Arc<EmbeddingClient>>,
}

impl ReportStore {
    pub async fn connect(config: RetrievalConfig) -> Result<Self> {
        info!("Connecting to report store at {}", config.uri);

        let connection = connect(&config.uri)
            .execute()
            .await
            .map_err(|e| PipelineError::Store(format!("Failed to connect to LanceDB: {}", e)))?;

        let embedder = config.embedding_api_key.as_ref().map(|key| {
            Arc::new(EmbeddingClient::new(
                key.clone(),
                config.embedding_model.clone(),
            ))
        });

        if embedder.is_none() {
            warn!("Report store initialized without API key - using fallback embeddings");
        }

        Ok(Self {
            connection,
            config,
            embedder,
        })
    }

    fn reports_schema() -> Arc<Schema> {
        Arc::new(Schema::new(vec![
            Field::new("id", DataType::Utf8, false),
            Field::new("title", DataType::Utf8, false),
            Field::new("content", DataType::Utf8, false),
            Field::new("source_url", DataType::Utf8, true),
            Field::new("added_at", DataType::UInt64, false),
            Field::new(
                "embedding",
                DataType::FixedSizeList(
                    Arc::new(Field::new("item", DataType::Float32, true)),
                    EMBEDDING_DIM as i32,
                ),
                false,
            ),
        ]))
    }

    async fn table_exists(&self) -> Result<bool> {
        let table_names = self
            .connection
            .table_names()
            .execute()
            .await
            .map_err(|e| PipelineError::Store(format!("Failed to list tables: {}", e)))?;

        Ok(table_names.iter().any(|name| name == &self.config.table_name))
    }

    async fn get_table(&self) -> Result<Table> {
        self.connection
            .open_table(&self.config.table_name)
            .execute()
            .await
            .map_err(|e| {
                PipelineError::Store(format!(
                    "Failed to open table {}: {}",
                    self.config.table_name, e
                ))
            })
    }

    async fn embed(&self, text: &str) -> Vec<f32> {
        match &self.embedder {
            Some(client) => client.embed_with_fallback(text, EMBEDDING_DIM).await,
            None => EmbeddingClient::generate_fallback_embedding(text, EMBEDDING_DIM),
        }
    }

    /// Add a report. Append-only: ids are fresh uuids, nothing is updated
    /// in place.
    pub async fn add_report(&self, text: &str, meta: &StoredReportMeta) -> Result<String> {
        let id = Uuid::new_v4().to_string();
        let embedding = self.embed(text).await;
        let added_at = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map(|d| d.as_secs())
            .unwrap_or(0);

        let schema = Self::reports_schema();
        let batch = Self::create_record_batch(schema.clone(), &id, text, meta, added_at, embedding)?;

        if !self.table_exists().await? {
            self.connection
                .create_table(
                    &self.config.table_name,
                    RecordBatchIterator::new(vec![Ok(batch)], schema),
                )
                .execute()
                .await
                .map_err(|e| PipelineError::Store(format!("Failed to create table: {}", e)))?;
            info!("Created report table: {}", self.config.table_name);
        } else {
            let table = self.get_table().await?;
            table
                .add(RecordBatchIterator::new(vec![Ok(batch)], schema))
                .execute()
                .await
                .map_err(|e| PipelineError::Store(format!("Failed to insert report: {}", e)))?;
        }

        debug!("Stored report {} ({})", meta.title, id);
        Ok(id)
    }

    /// Top-k nearest prior reports by vector distance. An empty store
    /// returns an empty list, not an error.
    pub async fn search(&self, text: &str, k: usize) -> Result<Vec<RelatedIncident>> {
        if !self.table_exists().await? {
            debug!("Report table does not exist yet, returning no matches");
            return Ok(Vec::new());
        }

        let embedding = self.embed(text).await;
        let table = self.get_table().await?;

        let query = table
            .vector_search(embedding)
            .map_err(|e| PipelineError::Store(format!("Failed to create vector search: {}", e)))?
            .limit(k);

        let mut results_stream = query
            .execute()
            .await
            .map_err(|e| PipelineError::Store(format!("Vector search failed: {}", e)))?;

        let mut incidents = Vec::new();

        while let Some(batch_result) = results_stream.next().await {
            let batch = batch_result
                .map_err(|e| PipelineError::Store(format!("Failed to read result batch: {}", e)))?;

            let ids = string_column(&batch, "id")?;
            let titles = string_column(&batch, "title")?;
            let contents = string_column(&batch, "content")?;

            let distances = batch
                .column_by_name("_distance")
                .and_then(|col| col.as_any().downcast_ref::<Float32Array>());

            for i in 0..batch.num_rows() {
                let (score, distance) = if let Some(dist_array) = distances {
                    let dist = dist_array.value(i);
                    (1.0 / (1.0 + dist), Some(dist))
                } else {
                    (1.0, None)
                };

                incidents.push(RelatedIncident {
                    id: ids.value(i).to_string(),
                    title: titles.value(i).to_string(),
                    content: contents.value(i).to_string(),
                    score,
                    distance,
                });
            }
        }

        debug!("Similarity search returned {} matches", incidents.len());
        Ok(incidents)
    }

    pub async fn count(&self) -> Result<u64> {
        if !self.table_exists().await? {
            return Ok(0);
        }

        let table = self.get_table().await?;
        let count = table
            .count_rows(None)
            .await
            .map_err(|e| PipelineError::Store(format!("Failed to count rows: {}", e)))?;

        Ok(count as u64)
    }

    pub async fn reset(&self) -> Result<()> {
        if self.table_exists().await? {
            self.connection
                .drop_table(&self.config.table_name)
                .await
                .map_err(|e| {
                    PipelineError::Store(format!(
                        "Failed to drop table {}: {}",
                        self.config.table_name, e
                    ))
                })?;
            info!("Dropped report table: {}", self.config.table_name);
        }
        Ok(())
    }

    fn create_record_batch(
        schema: Arc<Schema>,
        id: &str,
        text: &str,
        meta: &StoredReportMeta,
        added_at: u64,
        embedding: Vec<f32>,
    ) -> Result<RecordBatch> {
        let ids: StringArray = [Some(id.to_string())].into_iter().collect();
        let titles: StringArray = [Some(meta.title.clone())].into_iter().collect();
        let contents: StringArray = [Some(text.to_string())].into_iter().collect();
        let source_urls: StringArray = [meta.source_url.clone()].into_iter().collect();
        let added_ats: UInt64Array = [Some(added_at)].into_iter().collect();

        let embedding_values: Float32Array = embedding.iter().copied().collect();
        let embedding_list =
            FixedSizeListArray::try_new_from_values(embedding_values, EMBEDDING_DIM as i32)
                .map_err(|e| {
                    PipelineError::Store(format!("Failed to create embedding array: {}", e))
                })?;

        RecordBatch::try_new(
            schema,
            vec![
                Arc::new(ids),
                Arc::new(titles),
                Arc::new(contents),
                Arc::new(source_urls),
                Arc::new(added_ats),
                Arc::new(embedding_list),
            ],
        )
        .map_err(|e| PipelineError::Store(format!("Failed to create record batch: {}", e)))
    }
}

fn string_column<'a>(batch: &'a RecordBatch, name: &str) -> Result<&'a StringArray> {
    batch
        .column_by_name(name)
        .ok_or_else(|| PipelineError::Store(format!("Missing '{}' column", name)))?
        .as_any()
        .downcast_ref::<StringArray>()
        .ok_or_else(|| PipelineError::Store(format!("Invalid '{}' column type", name)))
}
