// src/lib.rs
// Public library surface for the binaries and integration tests.

pub mod api;
pub mod config;
pub mod error;
pub mod metrics;
pub mod pipeline;
pub mod selection;
pub mod sources;

// Report pipeline: query → oracle → normalize → canonical report
pub mod normalize;
pub mod oracle;
pub mod progress;
pub mod query;
pub mod report;

// ---- Re-exports for stable public API ----
pub use crate::api::router;
pub use crate::error::{ErrorKind, PipelineError, QueryError};
pub use crate::pipeline::{PipelineStatus, ReportPipeline};
pub use crate::report::NarrativeReport;

use std::sync::Arc;

use axum::Router;
use tracing::warn;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use crate::config::{OracleConfig, PipelineConfig};
use crate::oracle::{build_oracle_from_config, DisabledOracle, DynOracle};

/// Install the global tracing subscriber. Compact text by default,
/// JSON lines when `LOG_FORMAT=json`. Safe to call more than once.
pub fn init_tracing() {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("media_narrative_monitor=info,warn"));

    let json = std::env::var("LOG_FORMAT")
        .map(|v| v.eq_ignore_ascii_case("json"))
        .unwrap_or(false);

    let registry = tracing_subscriber::registry().with(filter);
    let _ = if json {
        registry.with(fmt::layer().json()).try_init()
    } else {
        registry.with(fmt::layer().compact()).try_init()
    };
}

/// Oracle from `config/oracle.json` (or $ORACLE_CONFIG_PATH). A broken config
/// is logged and degrades to a disabled oracle rather than refusing to start.
pub fn oracle_from_env() -> DynOracle {
    let cfg = OracleConfig::load_default().unwrap_or_else(|e| {
        warn!(error = ?e, "oracle config unusable; oracle disabled");
        OracleConfig::default()
    });
    build_oracle_from_config(&cfg).unwrap_or_else(|e| {
        warn!(error = ?e, "oracle client build failed; oracle disabled");
        Arc::new(DisabledOracle)
    })
}

/// Build the application router from on-disk configuration.
pub async fn app() -> anyhow::Result<Router> {
    let pipeline_cfg = PipelineConfig::load_default()?;
    let pipeline = ReportPipeline::from_config(oracle_from_env(), &pipeline_cfg);
    Ok(api::create_router(api::AppState {
        pipeline: Arc::new(pipeline),
    }))
}
