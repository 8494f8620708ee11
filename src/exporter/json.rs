// file: src/exporter/json.rs
// description: json export of merged reports

use crate::error::{PipelineError, Result};
use crate::models::CtiReport;
use chrono::Utc;
use serde::Serialize;
use std::fs;
use std::path::PathBuf;
use tracing::info;

#[derive(Debug, Clone)]
pub struct JsonExporter {
    output_dir: PathBuf,
    pretty: bool,
}

#[derive(Debug, Serialize)]
pub struct ExportManifest {
    pub exported_at: String,
    pub total_reports: usize,
    pub files: Vec<String>,
}

impl JsonExporter {
    pub fn new(output_dir: impl Into<PathBuf>, pretty: bool) -> Result<Self> {
        let output_dir = output_dir.into();
        fs::create_dir_all(&output_dir)?;
        Ok(Self { output_dir, pretty })
    }

    /// Write one merged report. The file name is derived from the source id;
    /// anything path-hostile is flattened to underscores.
    pub fn write_report(&self, report: &CtiReport) -> Result<PathBuf> {
        let file_name = format!("{}.json", sanitize_stem(&report.metadata.source));
        let path = self.output_dir.join(file_name);

        let body = if self.pretty {
            serde_json::to_string_pretty(report)
        } else {
            serde_json::to_string(report)
        }
        .map_err(PipelineError::Serialization)?;

        fs::write(&path, body)?;
        info!("Wrote report to {}", path.display());
        Ok(path)
    }

    pub fn write_manifest(&self, files: &[PathBuf]) -> Result<PathBuf> {
        let manifest = ExportManifest {
            exported_at: Utc::now().to_rfc3339(),
            total_reports: files.len(),
            files: files
                .iter()
                .map(|p| p.display().to_string())
                .collect(),
        };

        let path = self.output_dir.join("manifest.json");
        let body = serde_json::to_string_pretty(&manifest).map_err(PipelineError::Serialization)?;
        fs::write(&path, body)?;

        info!("Export complete: {} reports", manifest.total_reports);
        Ok(path)
    }
}

fn sanitize_stem(source: &str) -> String {
    let stem = source
        .rsplit(['/', '\\'])
        .next()
        .unwrap_or(source)
        .trim_end_matches(".txt")
        .trim_end_matches(".md");

    let cleaned: String = stem
        .chars()
        .map(|c| if c.is_alphanumeric() || c == '-' || c == '_' { c } else { '_' })
        .collect();

    if cleaned.is_empty() {
        "report".to_string()
    } else {
        cleaned
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::merge::MergeEngine;
    use crate::models::SourceInfo;
    use tempfile::tempdir;

    fn sample_report(source: &str) -> CtiReport {
        MergeEngine::default().merge(&[], &SourceInfo::new(source))
    }

    #[test]
    fn test_exporter_creation() {
        let dir = tempdir().unwrap();
        let exporter = JsonExporter::new(dir.path(), true);
        assert!(exporter.is_ok());
    }

    #[test]
    fn test_write_report_and_manifest() {
        let dir = tempdir().unwrap();
        let exporter = JsonExporter::new(dir.path(), true).unwrap();

        let path = exporter.write_report(&sample_report("intel/apt-41.txt")).unwrap();
        assert!(path.exists());
        assert_eq!(path.file_name().unwrap(), "apt-41.json");

        let body = std::fs::read_to_string(&path).unwrap();
        assert!(body.contains("\"threat_level\""));

        let manifest = exporter.write_manifest(&[path]).unwrap();
        let manifest_body = std::fs::read_to_string(manifest).unwrap();
        assert!(manifest_body.contains("\"total_reports\": 1"));
    }

    #[test]
    fn test_hostile_source_names_sanitized() {
        assert_eq!(sanitize_stem("../../etc/passwd"), "passwd");
        assert_eq!(sanitize_stem("a b?.txt"), "a_b_");
        assert_eq!(sanitize_stem(""), "report");
    }
}
