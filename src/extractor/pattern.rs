// file: src/extractor/pattern.rs
// description: deterministic IoC, CVE and MITRE id extraction over whole text
// reference: threat intelligence ioc standards

use crate::config::ExtractionConfig;
use crate::extractor::patterns::{CVE, DOMAIN, EMAIL, IPV4, MD5_HASH, MITRE_ID, SHA1_HASH, SHA256_HASH};
use crate::models::{HashAlgorithm, PartialReport};
use std::collections::HashSet;

/// Regex layer of the hybrid extractor. Pure and total: runs once over the
/// whole text, never fails, pathological input just yields empty sets.
pub struct PatternExtractor {
    ignore_extensions: Vec<String>,
    ignore_domains: HashSet<String>,
}

const MIN_DOMAIN_LEN: usize = 4;

impl PatternExtractor {
    pub fn new(config: &ExtractionConfig) -> Self {
        Self {
            ignore_extensions: config
                .ignore_extensions
                .iter()
                .map(|e| e.to_lowercase())
                .collect(),
            ignore_domains: config
                .ignore_domains
                .iter()
                .map(|d| d.to_lowercase())
                .collect(),
        }
    }

    pub fn extract(&self, text: &str) -> PartialReport {
        let mut report = PartialReport::new();

        for m in IPV4.find_iter(text).filter_map(|m| m.ok()) {
            report.indicators.ipv4.insert(m.as_str().to_lowercase());
        }

        // Hash casing is preserved as found; EntitySet comparison is
        // case-insensitive anyway and classification is length-based.
        for pattern in [&*MD5_HASH, &*SHA1_HASH, &*SHA256_HASH] {
            for m in pattern.find_iter(text) {
                if HashAlgorithm::classify(m.as_str()).is_some() {
                    report.indicators.hash.insert(m.as_str());
                }
            }
        }

        for m in CVE.find_iter(text) {
            report.vulnerabilities.insert(m.as_str());
        }

        for m in MITRE_ID.find_iter(text) {
            report.attack_patterns.insert(m.as_str());
        }

        for m in DOMAIN.find_iter(text) {
            let domain = m.as_str().to_lowercase();
            if self.is_ignored_domain(&domain) {
                continue;
            }
            report.indicators.domain.insert(domain);
        }

        for m in EMAIL.find_iter(text) {
            report.indicators.email.insert(m.as_str().to_lowercase());
        }

        report
    }

    fn is_ignored_domain(&self, domain: &str) -> bool {
        if domain.len() < MIN_DOMAIN_LEN {
            return true;
        }
        if self.ignore_domains.contains(domain) {
            return true;
        }
        self.ignore_extensions
            .iter()
            .any(|ext| domain.ends_with(ext))
    }
}
