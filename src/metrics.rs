use axum::{routing::get, Router};
use metrics::{describe_counter, describe_histogram};
use metrics_exporter_prometheus::{PrometheusBuilder, PrometheusHandle};

pub struct Metrics {
    pub handle: PrometheusHandle,
}

impl Metrics {
    /// Install the Prometheus recorder and describe the pipeline series.
    pub fn init() -> anyhow::Result<Self> {
        // Use default buckets to avoid API differences across crate versions.
        let handle = PrometheusBuilder::new().install_recorder()?;
        describe();
        Ok(Self { handle })
    }

    /// Returns a router exposing `/metrics` with the Prometheus exposition format.
    pub fn router(&self) -> Router {
        let handle = self.handle.clone();
        Router::new().route(
            "/metrics",
            get(move || {
                let h = handle.clone();
                async move { h.render() }
            }),
        )
    }
}

fn describe() {
    describe_counter!("report_requests_total", "Report requests submitted.");
    describe_counter!("report_ready_total", "Reports committed as ready.");
    describe_counter!("report_failed_total", "Report requests that failed, by kind.");
    describe_counter!(
        "report_stale_discarded_total",
        "Responses discarded because a newer request superseded them."
    );
    describe_counter!(
        "report_links_cleared_total",
        "Item links cleared for not being direct http(s) links."
    );
    describe_counter!(
        "report_fields_repaired_total",
        "Report fields completed with zero values by the repair stage."
    );
    describe_histogram!("oracle_call_ms", "Generative-search call latency in milliseconds.");
}
