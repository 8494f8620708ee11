// file: src/extractor/semantic.rs
// description: per-chunk LLM entity extraction with defensive JSON parsing
// reference: structured generation over overlapping text windows

use crate::error::{PipelineError, Result};
use crate::llm::{ChatCapability, ChatRequest};
use crate::models::{EntitySet, PartialReport, ThreatLevel};
use serde_json::Value;
use tracing::{debug, warn};

/// Semantic layer of the hybrid extractor. Covers only what the pattern
/// layer cannot: actor, malware, tool, country and technique names plus the
/// per-chunk summary and severity estimate. The instruction explicitly tells
/// the model to leave IPs, hashes and domains alone so lower-quality model
/// detections never compete with the deterministic layer.
pub struct SemanticExtractor<'a, C> {
    chat: &'a C,
    temperature: f32,
}

const SUMMARY_TEMPERATURE: f32 = 0.3;

impl<'a, C: ChatCapability> SemanticExtractor<'a, C> {
    pub fn new(chat: &'a C, temperature: f32) -> Self {
        Self { chat, temperature }
    }

    fn system_instruction() -> String {
        let schema = serde_json::json!({
            "threat_actor": ["Name"],
            "malware": ["Name"],
            "tools": ["Name"],
            "attack_patterns": ["TXXXX - Technique Name"],
            "targeted_countries": ["Name"],
            "summary": "one sentence about this fragment",
            "threat_level": "Low | Medium | High | Critical"
        });

        format!(
            "You are a Cyber Threat Intelligence Expert. Extract semantic entities.\n\
             \n\
             FOCUS ON:\n\
             1. Threat Actors (Groups)\n\
             2. Malware Families\n\
             3. Tools (Software used for attack)\n\
             4. MITRE ATT&CK Techniques (Look for descriptions of behaviors like \
             'Lateral Movement via SMB', 'Phishing', 'DLL Sideloading'). \
             Try to output them as \"TXXXX - Name\" if possible, or just the Technique Name.\n\
             5. Targeted Countries\n\
             \n\
             IGNORE IPs, Hashes, Domains (already extracted).\n\
             If a list is empty, return [].\n\
             \n\
             Response format: JSON matching this schema: {}",
            schema
        )
    }

    /// Extract entities from one chunk. Any shape deviation in the reply is
    /// an Extraction error the caller recovers from by skipping the chunk;
    /// no retry is made, so total chunk count bounds total backend calls.
    pub async fn extract(&self, chunk: &str) -> Result<PartialReport> {
        let system = Self::system_instruction();
        let reply = self
            .chat
            .chat(
                ChatRequest::new(&system, chunk)
                    .json()
                    .with_temperature(self.temperature),
            )
            .await?;

        let report = parse_reply(&reply)?;
        debug!(
            "Semantic extraction found {} entities in {} chars",
            report.entity_count(),
            chunk.len()
        );
        Ok(report)
    }

    /// Whole-document summary pass over the leading slice of the text.
    pub async fn summarize(&self, intro: &str) -> Result<String> {
        let system = "You are a Senior Threat Intelligence Analyst. \
                      Read the beginning of this threat report and write a concise SUMMARY (3-4 sentences). \
                      Include: Who is the attacker? What did they do? Who did they target? \
                      Do not use markdown. Just plain text.";

        let reply = self
            .chat
            .chat(ChatRequest::new(system, intro).with_temperature(SUMMARY_TEMPERATURE))
            .await?;

        Ok(reply.trim().to_string())
    }
}

/// Parse a semantic-layer reply against the expected schema. Tolerant of
/// markdown fences and field shape drift; anything unparseable is an
/// Extraction error.
fn parse_reply(reply: &str) -> Result<PartialReport> {
    let cleaned = reply
        .trim()
        .trim_start_matches("```json")
        .trim_start_matches("```")
        .trim_end_matches("```")
        .trim();

    let value: Value = serde_json::from_str(cleaned).map_err(|e| {
        PipelineError::Extraction(format!("semantic reply is not valid JSON: {}", e))
    })?;

    let object = value.as_object().ok_or_else(|| {
        PipelineError::Extraction("semantic reply is not a JSON object".to_string())
    })?;

    let mut report = PartialReport::new();
    collect_strings(object.get("threat_actor"), &mut report.threat_actor);
    collect_strings(object.get("malware"), &mut report.malware);
    collect_strings(object.get("tools"), &mut report.tools);
    collect_strings(object.get("attack_patterns"), &mut report.attack_patterns);
    collect_strings(
        object.get("targeted_countries"),
        &mut report.targeted_countries,
    );

    if let Some(Value::String(summary)) = object.get("summary") {
        let summary = summary.trim();
        if !summary.is_empty() {
            report.summary = Some(summary.to_string());
        }
    }

    if let Some(Value::String(label)) = object.get("threat_level") {
        match ThreatLevel::from_label(label) {
            Some(level) => report.threat_level = Some(level),
            None => warn!("Ignoring unrecognized threat level label: {:?}", label),
        }
    }

    Ok(report)
}

/// Pull string entries out of a field that may be a list, a bare string or
/// missing entirely. Non-string list entries are skipped, not errors; models
/// routinely mix shapes across chunks.
fn collect_strings(value: Option<&Value>, target: &mut EntitySet) {
    match value {
        Some(Value::Array(items)) => {
            for item in items {
                if let Value::String(s) = item {
                    target.insert(s);
                }
            }
        }
        Some(Value::String(s)) => {
            target.insert(s);
        }
        _ => {}
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn parse(reply: &str) -> Result<PartialReport> {
        parse_reply(reply)
    }

    #[test]
    fn test_parse_well_formed_reply() {
        let reply = r#"{
            "threat_actor": ["Gold Salem"],
            "malware": ["Warlock"],
            "tools": ["PsExec", "Mimikatz"],
            "attack_patterns": ["T1021 - Remote Services"],
            "targeted_countries": ["Germany"],
            "summary": "Warlock deployment via SMB.",
            "threat_level": "High"
        }"#;

        let report = parse(reply).unwrap();
        assert_eq!(report.threat_actor.to_vec(), vec!["Gold Salem"]);
        assert_eq!(report.malware.to_vec(), vec!["Warlock"]);
        assert_eq!(report.tools.len(), 2);
        assert_eq!(report.threat_level, Some(ThreatLevel::High));
        assert_eq!(report.summary.as_deref(), Some("Warlock deployment via SMB."));
    }

    #[test]
    fn test_parse_tolerates_missing_and_scalar_fields() {
        let reply = r#"{"threat_actor": "Lapsus$", "malware": []}"#;
        let report = parse(reply).unwrap();
        assert_eq!(report.threat_actor.to_vec(), vec!["Lapsus$"]);
        assert!(report.malware.is_empty());
        assert!(report.summary.is_none());
    }

    #[test]
    fn test_parse_skips_non_string_entries() {
        let reply = r#"{"tools": ["PsExec", 42, null, {"name": "x"}]}"#;
        let report = parse(reply).unwrap();
        assert_eq!(report.tools.to_vec(), vec!["PsExec"]);
    }

    #[test]
    fn test_parse_strips_markdown_fences() {
        let reply = "```json\n{\"malware\": [\"Mirai\"]}\n```";
        let report = parse(reply).unwrap();
        assert_eq!(report.malware.to_vec(), vec!["Mirai"]);
    }

    #[test]
    fn test_unrecognized_threat_level_ignored() {
        let reply = r#"{"threat_level": "apocalyptic"}"#;
        let report = parse(reply).unwrap();
        assert_eq!(report.threat_level, None);
    }

    #[test]
    fn test_garbage_reply_is_extraction_error() {
        let err = parse("I could not find anything, sorry!").unwrap_err();
        assert!(matches!(err, PipelineError::Extraction(_)));
        assert!(err.is_recoverable());
    }

    #[test]
    fn test_non_object_reply_is_extraction_error() {
        let err = parse(r#"["just", "a", "list"]"#).unwrap_err();
        assert!(matches!(err, PipelineError::Extraction(_)));
    }

    #[test]
    fn test_instruction_names_fields_and_exclusions() {
        let system =
            SemanticExtractor::<'_, crate::llm::OllamaClient>::system_instruction();
        assert!(system.contains("threat_actor"));
        assert!(system.contains("targeted_countries"));
        assert!(system.contains("IGNORE IPs, Hashes, Domains"));
        assert!(system.contains("JSON"));
    }
}
