// src/config/pipeline.rs
//! Pipeline tuning loaded from TOML (`config/pipeline.toml` or $PIPELINE_CONFIG_PATH).

use anyhow::Context;
use serde::Deserialize;
use std::{env, fs, path::Path, path::PathBuf, time::Duration};

pub const DEFAULT_PIPELINE_CONFIG_PATH: &str = "config/pipeline.toml";
pub const ENV_PIPELINE_CONFIG_PATH: &str = "PIPELINE_CONFIG_PATH";

#[derive(Debug, Clone, Default, Deserialize)]
pub struct PipelineConfig {
    #[serde(default)]
    pub scan: ScanSettings,
}

/// Cosmetic scan animation parameters.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct ScanSettings {
    pub tick_interval_ms: u64,
    pub min_increment: u8,
    pub max_increment: u8,
    /// Ticks never push progress past this; only a real response reaches 100.
    pub progress_cap: u8,
    pub log_tail_len: usize,
    pub completion_grace_ms: u64,
    /// Fixed seed for reproducible ticks; OS entropy when absent.
    pub seed: Option<u64>,
}

impl Default for ScanSettings {
    fn default() -> Self {
        Self {
            tick_interval_ms: 250,
            min_increment: 2,
            max_increment: 6,
            progress_cap: 95,
            log_tail_len: 8,
            completion_grace_ms: 800,
            seed: None,
        }
    }
}

impl ScanSettings {
    /// Clamp values into a usable range.
    pub fn sanitized(mut self) -> Self {
        let d = Self::default();
        if self.tick_interval_ms == 0 {
            self.tick_interval_ms = d.tick_interval_ms;
        }
        if self.progress_cap >= 100 {
            self.progress_cap = 99;
        }
        if self.max_increment == 0 {
            self.max_increment = 1;
        }
        if self.min_increment > self.max_increment {
            std::mem::swap(&mut self.min_increment, &mut self.max_increment);
        }
        if self.log_tail_len == 0 {
            self.log_tail_len = d.log_tail_len;
        }
        self
    }

    pub fn tick_interval(&self) -> Duration {
        Duration::from_millis(self.tick_interval_ms)
    }

    pub fn completion_grace(&self) -> Duration {
        Duration::from_millis(self.completion_grace_ms)
    }
}

impl PipelineConfig {
    pub fn from_toml_str(s: &str) -> anyhow::Result<Self> {
        let mut cfg: PipelineConfig = toml::from_str(s)?;
        cfg.scan = cfg.scan.sanitized();
        Ok(cfg)
    }

    pub fn load_from_file<P: AsRef<Path>>(path: P) -> anyhow::Result<Self> {
        let path = path.as_ref();
        let content = fs::read_to_string(path)
            .with_context(|| format!("reading pipeline config from {}", path.display()))?;
        Self::from_toml_str(&content)
            .with_context(|| format!("parsing pipeline config {}", path.display()))
    }

    /// $PIPELINE_CONFIG_PATH, else `config/pipeline.toml`, else built-in defaults.
    pub fn load_default() -> anyhow::Result<Self> {
        if let Ok(p) = env::var(ENV_PIPELINE_CONFIG_PATH) {
            return Self::load_from_file(PathBuf::from(p));
        }
        let p = PathBuf::from(DEFAULT_PIPELINE_CONFIG_PATH);
        if p.exists() {
            return Self::load_from_file(p);
        }
        Ok(Self::default())
    }
}
