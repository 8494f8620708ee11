// file: src/utils/mod.rs
// description: shared utilities

pub mod logging;
