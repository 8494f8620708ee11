// file: src/pipeline/stats.rs
// description: per-document and per-run extraction counters

/// Counters for one document going through the pipeline.
#[derive(Debug, Clone, Default)]
pub struct ExtractionStats {
    pub chunks_total: usize,
    pub chunks_failed: usize,
    pub entities_extracted: usize,
    pub related_matches: usize,
    /// The relevance gate classified the document as spam; no extraction ran.
    pub gated_out: bool,
    pub duration_ms: u64,
}

impl ExtractionStats {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn chunks_succeeded(&self) -> usize {
        self.chunks_total.saturating_sub(self.chunks_failed)
    }

    pub fn chunk_success_rate(&self) -> f64 {
        if self.chunks_total == 0 {
            return 0.0;
        }
        (self.chunks_succeeded() as f64 / self.chunks_total as f64) * 100.0
    }
}

/// Aggregate counters for a batch run over many documents.
#[derive(Debug, Clone, Default)]
pub struct BatchStats {
    pub documents_processed: usize,
    pub documents_skipped: usize,
    pub documents_failed: usize,
    pub entities_extracted: usize,
    pub total_bytes_processed: u64,
    pub duration_secs: u64,
}

impl BatchStats {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn documents_per_second(&self) -> f64 {
        if self.duration_secs == 0 {
            return 0.0;
        }
        self.documents_processed as f64 / self.duration_secs as f64
    }

    pub fn success_rate(&self) -> f64 {
        let total = self.documents_processed + self.documents_failed;
        if total == 0 {
            return 0.0;
        }
        (self.documents_processed as f64 / total as f64) * 100.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_chunk_success_rate() {
        let stats = ExtractionStats {
            chunks_total: 10,
            chunks_failed: 2,
            ..ExtractionStats::new()
        };
        assert_eq!(stats.chunks_succeeded(), 8);
        assert!((stats.chunk_success_rate() - 80.0).abs() < f64::EPSILON);
    }

    #[test]
    fn test_empty_stats_rates_are_zero() {
        let stats = ExtractionStats::new();
        assert_eq!(stats.chunk_success_rate(), 0.0);

        let batch = BatchStats::new();
        assert_eq!(batch.documents_per_second(), 0.0);
        assert_eq!(batch.success_rate(), 0.0);
    }

    #[test]
    fn test_batch_success_rate() {
        let mut batch = BatchStats::new();
        batch.documents_processed = 9;
        batch.documents_failed = 1;
        assert!((batch.success_rate() - 90.0).abs() < f64::EPSILON);
    }
}
