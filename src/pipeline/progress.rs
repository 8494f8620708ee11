// file: src/pipeline/progress.rs
// description: progress bars and counters for batch document processing
// reference: uses indicatif for progress bars

use crate::pipeline::stats::BatchStats;
use indicatif::{MultiProgress, ProgressBar, ProgressStyle};
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, AtomicUsize, Ordering};
use std::time::Instant;

pub struct ProgressTracker {
    main_bar: ProgressBar,
    detail_bar: ProgressBar,
    documents_processed: Arc<AtomicUsize>,
    documents_skipped: Arc<AtomicUsize>,
    documents_failed: Arc<AtomicUsize>,
    entities_extracted: Arc<AtomicUsize>,
    bytes_processed: Arc<AtomicU64>,
    start_time: Instant,
}

impl ProgressTracker {
    pub fn new(total_documents: usize) -> Self {
        Self::with_color(total_documents, true)
    }

    pub fn with_color(total_documents: usize, colored: bool) -> Self {
        let multi_progress = MultiProgress::new();

        let main_bar = create_progress_bar(&multi_progress, total_documents as u64, colored);
        let detail_bar = create_detail_bar(&multi_progress);

        Self {
            main_bar,
            detail_bar,
            documents_processed: Arc::new(AtomicUsize::new(0)),
            documents_skipped: Arc::new(AtomicUsize::new(0)),
            documents_failed: Arc::new(AtomicUsize::new(0)),
            entities_extracted: Arc::new(AtomicUsize::new(0)),
            bytes_processed: Arc::new(AtomicU64::new(0)),
            start_time: Instant::now(),
        }
    }

    pub fn inc_processed(&self) {
        self.documents_processed.fetch_add(1, Ordering::SeqCst);
        self.main_bar.inc(1);
        self.update_detail_bar();
    }

    pub fn inc_skipped(&self) {
        self.documents_skipped.fetch_add(1, Ordering::SeqCst);
        self.main_bar.inc(1);
        self.update_detail_bar();
    }

    pub fn inc_failed(&self) {
        self.documents_failed.fetch_add(1, Ordering::SeqCst);
        self.main_bar.inc(1);
        self.update_detail_bar();
    }

    pub fn add_entities(&self, count: usize) {
        self.entities_extracted.fetch_add(count, Ordering::SeqCst);
    }

    pub fn add_bytes_processed(&self, bytes: u64) {
        self.bytes_processed.fetch_add(bytes, Ordering::SeqCst);
    }

    pub fn set_message(&self, message: String) {
        self.detail_bar.set_message(message);
    }

    pub fn finish(&self) {
        self.main_bar.finish_with_message("Processing complete");
        self.detail_bar.finish_and_clear();
    }

    pub fn get_stats(&self) -> BatchStats {
        BatchStats {
            documents_processed: self.documents_processed.load(Ordering::SeqCst),
            documents_skipped: self.documents_skipped.load(Ordering::SeqCst),
            documents_failed: self.documents_failed.load(Ordering::SeqCst),
            entities_extracted: self.entities_extracted.load(Ordering::SeqCst),
            total_bytes_processed: self.bytes_processed.load(Ordering::SeqCst),
            duration_secs: self.start_time.elapsed().as_secs(),
        }
    }

    fn update_detail_bar(&self) {
        let entities = self.entities_extracted.load(Ordering::SeqCst);
        let skipped = self.documents_skipped.load(Ordering::SeqCst);
        let failed = self.documents_failed.load(Ordering::SeqCst);

        let message = format!(
            "Entities: {} | Spam: {} | Failed: {}",
            entities, skipped, failed
        );

        self.detail_bar.set_message(message);
    }
}

impl Drop for ProgressTracker {
    fn drop(&mut self) {
        self.finish();
    }
}

fn create_progress_bar(multi_progress: &MultiProgress, total: u64, colored: bool) -> ProgressBar {
    let bar = multi_progress.add(ProgressBar::new(total));
    if colored {
        bar.set_style(
            ProgressStyle::default_bar()
                .template(
                    "{spinner:.green} [{elapsed_precise}] [{bar:40.cyan/blue}] {pos}/{len} ({eta}) {msg}",
                )
                .expect("Failed to create progress bar template")
                .progress_chars("█▓▒░"),
        );
    } else {
        bar.set_style(
            ProgressStyle::default_bar()
                .template("{spinner} [{elapsed_precise}] [{bar:40}] {pos}/{len} ({eta}) {msg}")
                .expect("Failed to create progress bar template")
                .progress_chars("=>-"),
        );
    }
    bar
}

fn create_detail_bar(multi_progress: &MultiProgress) -> ProgressBar {
    let bar = multi_progress.add(ProgressBar::new(0));
    let style = ProgressStyle::default_bar()
        .template("{msg}")
        .expect("Failed to create detail bar template");
    bar.set_style(style);
    bar
}
