// file: src/pipeline/engine.rs
// description: end-to-end document pipeline from gate to merged report
// reference: hybrid regex + LLM extraction over overlapping chunks

use crate::chunker::Chunker;
use crate::config::Config;
use crate::error::{PipelineError, Result};
use crate::extractor::{PatternExtractor, SemanticExtractor};
use crate::filter::{RelevanceGate, Verdict};
use crate::llm::ChatCapability;
use crate::merge::MergeEngine;
use crate::models::{CtiReport, NormalizedText, PartialReport, SourceInfo};
use crate::pipeline::stats::ExtractionStats;
use crate::retrieval::{ReportStore, StoredReportMeta};
use futures::stream::{self, StreamExt};
use std::sync::Arc;
use std::time::{Duration, Instant};
use tracing::{debug, info, warn};

/// Result of pushing one document through the pipeline. `report` is None
/// exactly when the relevance gate dropped the document.
#[derive(Debug)]
pub struct ProcessOutcome {
    pub report: Option<CtiReport>,
    pub stats: ExtractionStats,
}

/// The full extraction pipeline for one backend. Stages run in a fixed
/// order: relevance gate, retrieval augmentation, document summary pass,
/// pattern pass, chunked semantic passes, merge. Every stage after the gate
/// degrades on failure instead of aborting the document.
pub struct ExtractionPipeline<C> {
    config: Config,
    chat: C,
    chunker: Chunker,
    pattern: PatternExtractor,
    merge: MergeEngine,
    store: Option<Arc<ReportStore>>,
}

impl<C: ChatCapability> ExtractionPipeline<C> {
    pub fn new(config: Config, chat: C) -> Result<Self> {
        config.validate()?;
        let chunker = Chunker::new(config.chunking)?;
        let pattern = PatternExtractor::new(&config.extraction);
        let merge = MergeEngine::new(config.extraction.summary_merge_limit);

        Ok(Self {
            config,
            chat,
            chunker,
            pattern,
            merge,
            store: None,
        })
    }

    /// Attach a report store for retrieval augmentation and ingestion. The
    /// pipeline works without one; retrieval is simply skipped.
    pub fn with_store(mut self, store: Arc<ReportStore>) -> Self {
        self.store = Some(store);
        self
    }

    pub async fn process(&self, input: &NormalizedText) -> Result<ProcessOutcome> {
        let started = Instant::now();
        let mut stats = ExtractionStats::new();

        if self.config.gate.enabled && !self.gate_passes(&input.text).await {
            stats.gated_out = true;
            stats.duration_ms = started.elapsed().as_millis() as u64;
            info!("Document {} dropped by relevance gate", input.source.id);
            return Ok(ProcessOutcome {
                report: None,
                stats,
            });
        }

        let text = self.augment(&input.text, &mut stats).await;

        let semantic = SemanticExtractor::new(&self.chat, self.config.llm.temperature);

        let summary_partial = if self.config.extraction.generate_summary {
            self.summarize_intro(&semantic, &text).await
        } else {
            None
        };

        let pattern_partial = self.pattern.extract(&text);

        let chunk_partials = self.extract_chunks(&semantic, &text, &mut stats).await;

        // Pass order matters for the scalar policies: the deterministic
        // pattern pass first, then the dedicated summary, then chunks left
        // to right.
        let mut partials = Vec::with_capacity(chunk_partials.len() + 2);
        partials.push(pattern_partial);
        if let Some(summary) = summary_partial {
            partials.push(PartialReport {
                summary: Some(summary),
                ..PartialReport::new()
            });
        }
        partials.extend(chunk_partials);

        let report = self.merge.merge(&partials, &input.source);
        stats.entities_extracted = report.entity_count();
        stats.duration_ms = started.elapsed().as_millis() as u64;

        info!(
            "Extracted {} entities from {} in {} chunks ({} failed)",
            stats.entities_extracted,
            input.source.id,
            stats.chunks_total,
            stats.chunks_failed
        );

        Ok(ProcessOutcome {
            report: Some(report),
            stats,
        })
    }

    /// Store a document so later runs can retrieve it as related context.
    pub async fn ingest(&self, text: &str, source: &SourceInfo) -> Result<String> {
        let store = self
            .store
            .as_ref()
            .ok_or_else(|| PipelineError::Store("no report store attached".to_string()))?;

        let meta = StoredReportMeta {
            title: source.id.clone(),
            source_url: source.url.clone(),
        };
        store.add_report(text, &meta).await
    }

    /// A gate backend failure is not a verdict. Dropping a real threat
    /// report on an outage would be a silent miss, so errors pass the
    /// document through.
    async fn gate_passes(&self, text: &str) -> bool {
        let gate = RelevanceGate::new(&self.chat, &self.config.gate);
        match gate.classify(text).await {
            Ok(Verdict::Threat) => true,
            Ok(Verdict::Spam) => false,
            Err(e) => {
                warn!("Relevance gate unavailable, processing anyway: {}", e);
                true
            }
        }
    }

    /// Append the best related prior report as extra context. Retrieval
    /// failures degrade to no context.
    async fn augment(&self, text: &str, stats: &mut ExtractionStats) -> String {
        if !self.config.retrieval.enabled {
            return text.to_string();
        }
        let Some(store) = self.store.as_ref() else {
            return text.to_string();
        };

        match store.search(text, self.config.retrieval.top_k).await {
            Ok(matches) if !matches.is_empty() => {
                stats.related_matches = matches.len();
                let best = &matches[0];
                let snippet: String = best
                    .content
                    .chars()
                    .take(self.config.retrieval.snippet_chars)
                    .collect();
                debug!(
                    "Augmenting with related incident {:?} (score {:.3})",
                    best.title, best.score
                );
                format!("{}\nRelated Incident ({}): {}", text, best.title, snippet)
            }
            Ok(_) => text.to_string(),
            Err(e) => {
                warn!("Retrieval failed, continuing without context: {}", e);
                text.to_string()
            }
        }
    }

    /// Whole-document summary over the leading window of text. Optional; a
    /// backend failure just leaves the chunk summaries to cover it.
    async fn summarize_intro(
        &self,
        semantic: &SemanticExtractor<'_, C>,
        text: &str,
    ) -> Option<String> {
        let mut end = text.len().min(self.config.chunking.size);
        while !text.is_char_boundary(end) {
            end -= 1;
        }
        let intro = &text[..end];
        if intro.is_empty() {
            return None;
        }

        match semantic.summarize(intro).await {
            Ok(summary) if !summary.is_empty() => Some(summary),
            Ok(_) => None,
            Err(e) => {
                warn!("Document summary pass failed: {}", e);
                None
            }
        }
    }

    /// Run the semantic extractor over every chunk with bounded parallelism
    /// and a whole-document deadline. Chunks that fail or miss the deadline
    /// are dropped; the merge input is re-sorted into chunk order since
    /// completion order is nondeterministic.
    async fn extract_chunks(
        &self,
        semantic: &SemanticExtractor<'_, C>,
        text: &str,
        stats: &mut ExtractionStats,
    ) -> Vec<PartialReport> {
        let chunks: Vec<_> = self.chunker.chunks(text).collect();
        stats.chunks_total = chunks.len();
        if chunks.is_empty() {
            return Vec::new();
        }

        let jobs = chunks.iter().map(|chunk| async move {
            (chunk.index, semantic.extract(chunk.text).await)
        });
        let mut results = stream::iter(jobs).buffer_unordered(self.config.llm.parallel_requests);

        let deadline = tokio::time::sleep(Duration::from_secs(
            self.config.llm.document_timeout_secs,
        ));
        tokio::pin!(deadline);

        let mut collected: Vec<(usize, PartialReport)> = Vec::new();
        loop {
            tokio::select! {
                next = results.next() => match next {
                    Some((index, Ok(partial))) => collected.push((index, partial)),
                    Some((index, Err(e))) => {
                        stats.chunks_failed += 1;
                        warn!("Chunk {} failed: {}", index, e);
                    }
                    None => break,
                },
                _ = &mut deadline => {
                    warn!(
                        "Document deadline reached, merging {} of {} chunks",
                        collected.len(),
                        chunks.len()
                    );
                    stats.chunks_failed = chunks.len() - collected.len();
                    break;
                }
            }
        }

        collected.sort_by_key(|(index, _)| *index);
        collected.into_iter().map(|(_, partial)| partial).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::PipelineError;
    use crate::llm::ChatRequest;
    use crate::models::ThreatLevel;
    use pretty_assertions::assert_eq;

    /// Scripted backend: the gate model gets a verdict, json-mode requests
    /// get the entity reply, everything else gets the summary text.
    struct ScriptedChat {
        verdict: &'static str,
        entities: &'static str,
        summary: &'static str,
    }

    impl ChatCapability for ScriptedChat {
        fn chat(
            &self,
            request: ChatRequest<'_>,
        ) -> impl Future<Output = Result<String>> + Send {
            let reply = if request.model.is_some() {
                self.verdict
            } else if request.json_mode {
                self.entities
            } else {
                self.summary
            };
            async move { Ok(reply.to_string()) }
        }
    }

    struct FailingChat;

    impl ChatCapability for FailingChat {
        fn chat(
            &self,
            _request: ChatRequest<'_>,
        ) -> impl Future<Output = Result<String>> + Send {
            async { Err(PipelineError::Capability("backend offline".to_string())) }
        }
    }

    fn test_config() -> Config {
        let mut config = Config::default_config();
        config.retrieval.enabled = false;
        config.chunking.size = 200;
        config.chunking.overlap = 20;
        config
    }

    const WARLOCK_TEXT: &str = "Gold Salem deployed Warlock ransomware against \
        targets in Germany. Lateral movement used PsExec over SMB to \
        45.10.20.30, with payloads staged on evil-domain.biz and tracked as \
        CVE-2024-12345. Internal host 192.168.1.1 was the pivot. Sample hash \
        d41d8cd98f00b204e9800998ecf8427e was recovered.";

    fn warlock_entities() -> &'static str {
        r#"{
            "threat_actor": ["Gold Salem"],
            "malware": ["Warlock"],
            "tools": ["PsExec"],
            "attack_patterns": ["T1021 - Remote Services"],
            "targeted_countries": ["Germany"],
            "summary": "Warlock deployed against German targets.",
            "threat_level": "High"
        }"#
    }

    #[tokio::test]
    async fn test_full_document_flow() {
        let chat = ScriptedChat {
            verdict: "THREAT",
            entities: warlock_entities(),
            summary: "Gold Salem ran a Warlock campaign against Germany.",
        };
        let pipeline = ExtractionPipeline::new(test_config(), chat).unwrap();

        let input = NormalizedText::new(WARLOCK_TEXT, SourceInfo::new("report-1"));
        let outcome = pipeline.process(&input).await.unwrap();
        let report = outcome.report.unwrap();

        // semantic layer
        assert_eq!(report.threat_actor.to_vec(), vec!["Gold Salem"]);
        assert_eq!(report.primary_actor.as_deref(), Some("Gold Salem"));
        assert_eq!(report.malware.to_vec(), vec!["Warlock"]);
        assert_eq!(report.threat_level, ThreatLevel::High);

        // pattern layer: public IP kept, private pivot excluded
        assert!(report.indicators.ipv4.contains("45.10.20.30"));
        assert!(!report.indicators.ipv4.contains("192.168.1.1"));
        assert!(report.indicators.domain.contains("evil-domain.biz"));
        assert!(report.indicators.hash.contains("d41d8cd98f00b204e9800998ecf8427e"));
        assert!(report.vulnerabilities.contains("CVE-2024-12345"));

        // the dedicated summary pass comes first in the join
        assert!(report.summary.starts_with("Gold Salem ran a Warlock campaign"));

        assert!(!outcome.stats.gated_out);
        assert_eq!(outcome.stats.chunks_failed, 0);
        assert!(outcome.stats.chunks_total >= 1);
        assert_eq!(outcome.stats.entities_extracted, report.entity_count());
    }

    #[tokio::test]
    async fn test_spam_is_gated_out() {
        let chat = ScriptedChat {
            verdict: "SPAM",
            entities: warlock_entities(),
            summary: "irrelevant",
        };
        let pipeline = ExtractionPipeline::new(test_config(), chat).unwrap();

        let input = NormalizedText::new("Buy cheap watches now!!!", SourceInfo::new("msg-7"));
        let outcome = pipeline.process(&input).await.unwrap();

        assert!(outcome.report.is_none());
        assert!(outcome.stats.gated_out);
        assert_eq!(outcome.stats.chunks_total, 0);
    }

    #[tokio::test]
    async fn test_gate_disabled_processes_everything() {
        let chat = ScriptedChat {
            verdict: "SPAM",
            entities: warlock_entities(),
            summary: "summary",
        };
        let mut config = test_config();
        config.gate.enabled = false;
        let pipeline = ExtractionPipeline::new(config, chat).unwrap();

        let input = NormalizedText::new(WARLOCK_TEXT, SourceInfo::new("report-2"));
        let outcome = pipeline.process(&input).await.unwrap();
        assert!(outcome.report.is_some());
    }

    #[tokio::test]
    async fn test_backend_outage_still_yields_pattern_results() {
        // Gate errors pass the document through; every semantic chunk fails
        // but the deterministic layer still produces indicators.
        let pipeline = ExtractionPipeline::new(test_config(), FailingChat).unwrap();

        let input = NormalizedText::new(WARLOCK_TEXT, SourceInfo::new("report-3"));
        let outcome = pipeline.process(&input).await.unwrap();
        let report = outcome.report.unwrap();

        assert!(report.indicators.ipv4.contains("45.10.20.30"));
        assert!(report.vulnerabilities.contains("CVE-2024-12345"));
        assert!(report.threat_actor.is_empty());
        assert_eq!(report.threat_level, ThreatLevel::Unknown);
        assert_eq!(outcome.stats.chunks_failed, outcome.stats.chunks_total);
    }

    #[tokio::test]
    async fn test_empty_document_yields_empty_report() {
        let chat = ScriptedChat {
            verdict: "THREAT",
            entities: warlock_entities(),
            summary: "ignored",
        };
        let mut config = test_config();
        config.gate.enabled = false;
        let pipeline = ExtractionPipeline::new(config, chat).unwrap();

        let input = NormalizedText::new("   \n\t  ", SourceInfo::new("empty"));
        let outcome = pipeline.process(&input).await.unwrap();
        let report = outcome.report.unwrap();

        assert_eq!(report.entity_count(), 0);
        assert_eq!(outcome.stats.chunks_total, 0);
    }

    #[tokio::test]
    async fn test_deadline_merges_completed_chunks() {
        use std::sync::atomic::{AtomicUsize, Ordering};

        // First chunk answers immediately, every later chunk stalls well
        // past the document deadline.
        struct StallAfterFirst {
            calls: AtomicUsize,
        }

        impl ChatCapability for StallAfterFirst {
            fn chat(
                &self,
                request: ChatRequest<'_>,
            ) -> impl Future<Output = Result<String>> + Send {
                let call = if request.json_mode {
                    self.calls.fetch_add(1, Ordering::SeqCst)
                } else {
                    0
                };
                let json_mode = request.json_mode;
                async move {
                    if json_mode && call > 0 {
                        tokio::time::sleep(Duration::from_secs(60)).await;
                    }
                    Ok(r#"{"malware": ["Warlock"]}"#.to_string())
                }
            }
        }

        let mut config = test_config();
        config.gate.enabled = false;
        config.extraction.generate_summary = false;
        config.chunking.size = 150;
        config.chunking.overlap = 10;
        config.llm.parallel_requests = 1;
        config.llm.document_timeout_secs = 1;

        let chat = StallAfterFirst {
            calls: AtomicUsize::new(0),
        };
        let pipeline = ExtractionPipeline::new(config, chat).unwrap();

        let text = format!("{} {}", WARLOCK_TEXT, "padding ".repeat(20));
        let input = NormalizedText::new(&text, SourceInfo::new("slow-report"));
        let outcome = pipeline.process(&input).await.unwrap();
        let report = outcome.report.unwrap();

        // the completed chunk's entities survive the merge
        assert_eq!(report.malware.to_vec(), vec!["Warlock"]);
        // the pattern pass is unaffected by the deadline
        assert!(report.indicators.ipv4.contains("45.10.20.30"));

        assert!(outcome.stats.chunks_total >= 2);
        assert_eq!(
            outcome.stats.chunks_failed,
            outcome.stats.chunks_total - 1
        );
    }

    #[tokio::test]
    async fn test_broken_store_degrades_to_no_context() {
        let chat = ScriptedChat {
            verdict: "THREAT",
            entities: warlock_entities(),
            summary: "Gold Salem ran a Warlock campaign against Germany.",
        };

        let mut config = test_config();
        config.retrieval.enabled = true;

        let dir = tempfile::TempDir::new().unwrap();
        config.retrieval.uri = dir.path().join("lancedb").display().to_string();

        let store = crate::retrieval::ReportStore::connect(config.retrieval.clone())
            .await
            .unwrap();
        // Yank the storage out from under the connection; any search against
        // it now fails rather than returning matches.
        drop(dir);

        let pipeline = ExtractionPipeline::new(config, chat)
            .unwrap()
            .with_store(std::sync::Arc::new(store));

        let input = NormalizedText::new(WARLOCK_TEXT, SourceInfo::new("report-4"));
        let outcome = pipeline.process(&input).await.unwrap();
        let report = outcome.report.unwrap();

        // extraction completed without augmentation context
        assert_eq!(outcome.stats.related_matches, 0);
        assert_eq!(report.malware.to_vec(), vec!["Warlock"]);
        assert!(report.indicators.ipv4.contains("45.10.20.30"));
    }

    #[test]
    fn test_invalid_config_rejected_at_construction() {
        let mut config = test_config();
        config.chunking.overlap = config.chunking.size;
        let chat = ScriptedChat {
            verdict: "THREAT",
            entities: "{}",
            summary: "",
        };
        assert!(matches!(
            ExtractionPipeline::new(config, chat),
            Err(PipelineError::Config(_))
        ));
    }
}
