//! Media Narrative Monitor: binary entrypoint.
//! Boots the Axum HTTP server with the report pipeline and Prometheus metrics.

use media_narrative_monitor::{init_tracing, metrics::Metrics};
use shuttle_axum::ShuttleAxum;
use tracing::{info, warn};

#[shuttle_runtime::main]
async fn axum() -> ShuttleAxum {
    // Load .env in local/dev; no-op in prod environments.
    let _ = dotenvy::dotenv();

    init_tracing();

    let router = media_narrative_monitor::app().await?;

    let router = match Metrics::init() {
        Ok(m) => router.merge(m.router()),
        Err(e) => {
            warn!(error = ?e, "metrics recorder not installed; /metrics disabled");
            router
        }
    };

    info!("media narrative monitor ready");
    Ok(router.into())
}
