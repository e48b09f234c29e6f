// src/config/oracle.rs
use anyhow::Context;
use serde::{Deserialize, Serialize};
use std::{env, fs, path::Path, path::PathBuf};

pub const DEFAULT_ORACLE_CONFIG_PATH: &str = "config/oracle.json";
pub const ENV_ORACLE_CONFIG_PATH: &str = "ORACLE_CONFIG_PATH";

fn default_provider() -> String {
    "gemini".to_string()
}
fn default_model() -> String {
    "gemini-2.5-flash".to_string()
}
fn default_endpoint() -> String {
    "https://generativelanguage.googleapis.com/v1beta".to_string()
}
fn default_timeout_secs() -> u64 {
    90
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OracleConfig {
    pub enabled: bool,
    /// "gemini" (case-insensitive)
    #[serde(default = "default_provider")]
    pub provider: String,
    #[serde(default = "default_model")]
    pub model: String,
    /// "ENV" means: read from GEMINI_API_KEY, then API_KEY
    #[serde(default)]
    pub api_key: String,
    #[serde(default = "default_endpoint")]
    pub endpoint: String,
    /// Whole-request timeout. Search-grounded generations are slow.
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
}

impl Default for OracleConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            provider: default_provider(),
            model: default_model(),
            api_key: String::new(),
            endpoint: default_endpoint(),
            timeout_secs: default_timeout_secs(),
        }
    }
}

impl OracleConfig {
    pub fn load_from_file<P: AsRef<Path>>(path: P) -> anyhow::Result<Self> {
        let path = path.as_ref();
        let data = fs::read_to_string(path)
            .with_context(|| format!("reading oracle config from {}", path.display()))?;
        let mut cfg: OracleConfig = serde_json::from_str(&data)
            .with_context(|| format!("parsing oracle config {}", path.display()))?;

        cfg.provider = cfg.provider.trim().to_lowercase();

        if cfg.api_key.trim().eq_ignore_ascii_case("env") {
            cfg.api_key = match cfg.provider.as_str() {
                "gemini" => env::var("GEMINI_API_KEY")
                    .or_else(|_| env::var("API_KEY"))
                    .map_err(|_| anyhow::anyhow!("Missing GEMINI_API_KEY / API_KEY env var"))?,
                other => anyhow::bail!("Unsupported provider in config: {other}"),
            };
        }

        if cfg.timeout_secs == 0 {
            cfg.timeout_secs = default_timeout_secs();
        }
        if cfg.model.trim().is_empty() {
            cfg.model = default_model();
        }

        Ok(cfg)
    }

    /// $ORACLE_CONFIG_PATH, else `config/oracle.json`. A missing default file
    /// yields a disabled config; a broken one is an error.
    pub fn load_default() -> anyhow::Result<Self> {
        if let Ok(p) = env::var(ENV_ORACLE_CONFIG_PATH) {
            return Self::load_from_file(PathBuf::from(p));
        }
        let p = PathBuf::from(DEFAULT_ORACLE_CONFIG_PATH);
        if p.exists() {
            return Self::load_from_file(p);
        }
        Ok(Self::default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[serial_test::serial]
    #[test]
    fn env_key_is_resolved_and_provider_normalized() {
        let dir = tempfile::tempdir().unwrap();
        let p = dir.path().join("oracle.json");
        fs::write(
            &p,
            r#"{"enabled": true, "provider": " Gemini ", "api_key": "ENV", "timeout_secs": 0}"#,
        )
        .unwrap();

        env::set_var("GEMINI_API_KEY", "k-123");
        let cfg = OracleConfig::load_from_file(&p).unwrap();
        env::remove_var("GEMINI_API_KEY");

        assert_eq!(cfg.provider, "gemini");
        assert_eq!(cfg.api_key, "k-123");
        assert_eq!(cfg.model, "gemini-2.5-flash");
        assert_eq!(cfg.timeout_secs, 90);
    }

    #[serial_test::serial]
    #[test]
    fn env_key_missing_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let p = dir.path().join("oracle.json");
        fs::write(&p, r#"{"enabled": true, "api_key": "env"}"#).unwrap();
        env::remove_var("GEMINI_API_KEY");
        env::remove_var("API_KEY");
        assert!(OracleConfig::load_from_file(&p).is_err());
    }
}
