// src/config/mod.rs
//! File-based configuration: oracle credentials/provider (JSON) and pipeline tuning (TOML).

pub mod oracle;
pub mod pipeline;

pub use oracle::OracleConfig;
pub use pipeline::{PipelineConfig, ScanSettings};
