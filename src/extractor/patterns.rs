// file: src/extractor/patterns.rs
// description: compiled regex patterns for deterministic CTI extraction
// reference: https://docs.rs/regex, https://docs.rs/fancy-regex

use lazy_static::lazy_static;
use regex::Regex;

lazy_static! {
    // Public IPv4 only. The negative lookahead rejects RFC1918 ranges and
    // loopback inside the pattern itself, which the plain regex crate cannot
    // express, hence fancy-regex for this one pattern.
    pub static ref IPV4: fancy_regex::Regex = fancy_regex::Regex::new(
        r"\b(?!127\.|10\.|192\.168\.|172\.(?:1[6-9]|2[0-9]|3[0-1])\.)(?:25[0-5]|2[0-4][0-9]|[01]?[0-9][0-9]?)\.(?:25[0-5]|2[0-4][0-9]|[01]?[0-9][0-9]?)\.(?:25[0-5]|2[0-4][0-9]|[01]?[0-9][0-9]?)\.(?:25[0-5]|2[0-4][0-9]|[01]?[0-9][0-9]?)\b"
    ).expect("IPV4 regex is valid");

    pub static ref DOMAIN: Regex = Regex::new(
        r"\b(?:[a-zA-Z0-9](?:[a-zA-Z0-9-]{0,61}[a-zA-Z0-9])?\.)+[a-zA-Z]{2,}\b"
    ).expect("DOMAIN regex is valid");

    pub static ref EMAIL: Regex = Regex::new(
        r"\b[A-Za-z0-9._%+-]+@[A-Za-z0-9.-]+\.[A-Z|a-z]{2,}\b"
    ).expect("EMAIL regex is valid");

    // File hashes, classified by length downstream (32/40/64)
    pub static ref MD5_HASH: Regex = Regex::new(
        r"\b[a-fA-F0-9]{32}\b"
    ).expect("MD5_HASH regex is valid");

    pub static ref SHA1_HASH: Regex = Regex::new(
        r"\b[a-fA-F0-9]{40}\b"
    ).expect("SHA1_HASH regex is valid");

    pub static ref SHA256_HASH: Regex = Regex::new(
        r"\b[a-fA-F0-9]{64}\b"
    ).expect("SHA256_HASH regex is valid");

    // CVE identifiers: 4-digit year, 4-to-7-digit sequence number
    pub static ref CVE: Regex = Regex::new(
        r"CVE-\d{4}-\d{4,7}"
    ).expect("CVE regex is valid");

    // MITRE ATT&CK technique id with optional sub-technique suffix
    pub static ref MITRE_ID: Regex = Regex::new(
        r"\bT\d{4}(?:\.\d{3})?\b"
    ).expect("MITRE_ID regex is valid");
}
