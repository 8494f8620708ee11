// file: src/exporter/mod.rs
// description: report export targets

pub mod json;

pub use json::{ExportManifest, JsonExporter};
