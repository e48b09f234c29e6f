//! Report Oracle Client: provider abstraction over the external generative-search function.
//!
//! The client sends a built [`OracleQuery`] and hands the raw text back untouched.
//! It never retries and never interprets the text; that is the normalizer's job.

use std::sync::Arc;
use std::time::{Duration, Instant};

use async_trait::async_trait;
use metrics::histogram;
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::config::OracleConfig;
use crate::error::PipelineError;
use crate::query::{OracleQuery, OutputLanguage};

// ------------------------------------------------------------
// Public surface
// ------------------------------------------------------------

#[async_trait]
pub trait ReportOracle: Send + Sync {
    /// One opaque call: query in, raw text out.
    async fn generate(&self, query: &OracleQuery) -> Result<String, PipelineError>;
    /// Provider name for diagnostics.
    fn name(&self) -> &'static str;
}

pub type DynOracle = Arc<dyn ReportOracle>;

/// Factory: build an oracle according to config and environment variables.
///
/// * `AI_TEST_MODE=mock` returns a deterministic mock that reports "nothing found".
/// * `AI_TEST_MODE=error` returns a mock that always fails as unavailable.
/// * Else if `config.enabled == false`, returns a disabled oracle.
/// * Else builds the real provider.
pub fn build_oracle_from_config(config: &OracleConfig) -> anyhow::Result<DynOracle> {
    match std::env::var("AI_TEST_MODE").as_deref() {
        Ok("mock") => {
            return Ok(Arc::new(MockOracle::not_found(
                &OutputLanguage::PERSIAN,
                "1970-01-01",
            )))
        }
        Ok("error") => {
            return Ok(Arc::new(MockOracle::new(MockReply::Unavailable(
                "mock provider error".into(),
            ))))
        }
        _ => {}
    }

    if !config.enabled {
        return Ok(Arc::new(DisabledOracle));
    }

    match config.provider.as_str() {
        "gemini" => Ok(Arc::new(GeminiOracle::new(config)?)),
        other => {
            warn!(provider = other, "unsupported oracle provider; oracle disabled");
            Ok(Arc::new(DisabledOracle))
        }
    }
}

// ------------------------------------------------------------
// Gemini (generateContent with the google_search tool)
// ------------------------------------------------------------

pub struct GeminiOracle {
    http: reqwest::Client,
    api_key: String,
    model: String,
    endpoint: String,
}

impl GeminiOracle {
    pub fn new(cfg: &OracleConfig) -> anyhow::Result<Self> {
        let http = reqwest::Client::builder()
            .user_agent("media-narrative-monitor/0.1")
            .connect_timeout(Duration::from_secs(5))
            .timeout(Duration::from_secs(cfg.timeout_secs))
            .build()?;
        Ok(Self {
            http,
            api_key: cfg.api_key.clone(),
            model: cfg.model.clone(),
            endpoint: cfg.endpoint.trim_end_matches('/').to_string(),
        })
    }
}

#[async_trait]
impl ReportOracle for GeminiOracle {
    async fn generate(&self, query: &OracleQuery) -> Result<String, PipelineError> {
        if self.api_key.is_empty() {
            return Err(PipelineError::OracleUnavailable("missing API key".into()));
        }

        #[derive(Serialize)]
        struct Part<'a> {
            text: &'a str,
        }
        #[derive(Serialize)]
        struct Content<'a> {
            #[serde(skip_serializing_if = "Option::is_none")]
            role: Option<&'a str>,
            parts: Vec<Part<'a>>,
        }
        #[derive(Serialize)]
        struct GoogleSearch {}
        #[derive(Serialize)]
        struct Tool {
            google_search: GoogleSearch,
        }
        #[derive(Serialize)]
        #[serde(rename_all = "camelCase")]
        struct Req<'a> {
            contents: Vec<Content<'a>>,
            system_instruction: Content<'a>,
            #[serde(skip_serializing_if = "Vec::is_empty")]
            tools: Vec<Tool>,
        }
        #[derive(Deserialize)]
        struct Resp {
            #[serde(default)]
            candidates: Vec<Candidate>,
        }
        #[derive(Deserialize)]
        struct Candidate {
            #[serde(default)]
            content: Option<CandidateContent>,
        }
        #[derive(Deserialize)]
        struct CandidateContent {
            #[serde(default)]
            parts: Vec<RespPart>,
        }
        #[derive(Deserialize)]
        struct RespPart {
            #[serde(default)]
            text: Option<String>,
        }

        let req = Req {
            contents: vec![Content {
                role: Some("user"),
                parts: vec![Part {
                    text: &query.prompt,
                }],
            }],
            system_instruction: Content {
                role: None,
                parts: vec![Part {
                    text: &query.system_instruction,
                }],
            },
            tools: if query.search_enabled {
                vec![Tool {
                    google_search: GoogleSearch {},
                }]
            } else {
                Vec::new()
            },
        };

        let url = format!("{}/models/{}:generateContent", self.endpoint, self.model);
        let started = Instant::now();
        let resp = self
            .http
            .post(url)
            .header("x-goog-api-key", &self.api_key)
            .json(&req)
            .send()
            .await
            .map_err(|e| PipelineError::OracleUnavailable(format!("request failed: {e}")))?;
        histogram!("oracle_call_ms").record(started.elapsed().as_millis() as f64);

        let status = resp.status();
        if !status.is_success() {
            return Err(PipelineError::OracleUnavailable(format!(
                "backend returned HTTP {status}"
            )));
        }

        let body: Resp = resp
            .json()
            .await
            .map_err(|e| PipelineError::OracleUnavailable(format!("undecodable body: {e}")))?;

        let text: String = body
            .candidates
            .into_iter()
            .next()
            .and_then(|c| c.content)
            .map(|c| c.parts.into_iter().filter_map(|p| p.text).collect())
            .unwrap_or_default();

        if text.trim().is_empty() {
            return Err(PipelineError::OracleEmptyResponse);
        }
        debug!(
            target: "oracle",
            query = %query.fingerprint(),
            bytes = text.len(),
            "oracle replied"
        );
        Ok(text)
    }

    fn name(&self) -> &'static str {
        "gemini"
    }
}

// ------------------------------------------------------------
// Disabled + mock providers
// ------------------------------------------------------------

/// Always unavailable; used when the oracle is disabled in config.
pub struct DisabledOracle;

#[async_trait]
impl ReportOracle for DisabledOracle {
    async fn generate(&self, _query: &OracleQuery) -> Result<String, PipelineError> {
        Err(PipelineError::OracleUnavailable("oracle disabled".into()))
    }
    fn name(&self) -> &'static str {
        "disabled"
    }
}

#[derive(Debug, Clone)]
pub enum MockReply {
    Text(String),
    Empty,
    Unavailable(String),
}

/// Fixed-reply oracle for tests and local runs.
#[derive(Debug, Clone)]
pub struct MockOracle {
    reply: MockReply,
    delay: Duration,
}

impl MockOracle {
    pub fn new(reply: MockReply) -> Self {
        Self {
            reply,
            delay: Duration::ZERO,
        }
    }

    pub fn text(text: impl Into<String>) -> Self {
        Self::new(MockReply::Text(text.into()))
    }

    /// A well-formed "nothing matched" report in the given language.
    pub fn not_found(language: &OutputLanguage, date: &str) -> Self {
        let body = serde_json::json!({
            "date": date,
            "dominantNarrative": language.not_found,
            "summary": language.not_found,
            "totalMonitored": 0,
            "activeSources": 0,
            "sentimentBreakdown": [],
            "sourceDistribution": [],
            "detailedFlows": [],
            "topItems": []
        });
        Self::text(body.to_string())
    }

    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = delay;
        self
    }
}

#[async_trait]
impl ReportOracle for MockOracle {
    async fn generate(&self, _query: &OracleQuery) -> Result<String, PipelineError> {
        if !self.delay.is_zero() {
            tokio::time::sleep(self.delay).await;
        }
        match &self.reply {
            MockReply::Text(t) if t.trim().is_empty() => Err(PipelineError::OracleEmptyResponse),
            MockReply::Text(t) => Ok(t.clone()),
            MockReply::Empty => Err(PipelineError::OracleEmptyResponse),
            MockReply::Unavailable(e) => Err(PipelineError::OracleUnavailable(e.clone())),
        }
    }
    fn name(&self) -> &'static str {
        "mock"
    }
}
