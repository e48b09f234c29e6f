//! One-shot probe: build a query, call the configured oracle once, print the canonical report.
//!
//! Usage: `report_probe [YYYY-MM-DD] [topic...]` (date defaults to today, UTC).
//! Uses every registered source. `AI_TEST_MODE=mock` runs without network access.

use anyhow::Context;
use media_narrative_monitor::{
    init_tracing, normalize, oracle::ReportOracle, oracle_from_env, query::QueryBuilder,
    selection::Selection,
};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let _ = dotenvy::dotenv();
    init_tracing();

    let mut args = std::env::args().skip(1);
    let date = args
        .next()
        .unwrap_or_else(|| chrono::Utc::now().date_naive().format("%Y-%m-%d").to_string());
    let topic: Vec<String> = args.collect();
    let topic = topic.join(" ");

    let sources = Selection::all().ordered();
    let query = QueryBuilder::default()
        .build(Some(topic.as_str()), &date, &sources)
        .context("building oracle query")?;

    let oracle = oracle_from_env();
    tracing::info!(oracle = oracle.name(), query = %query.fingerprint(), "probing oracle");

    let raw = oracle.generate(&query).await.context("oracle call")?;
    let out = normalize::normalize_detailed(&raw).context("normalizing oracle response")?;

    eprintln!(
        "repaired fields: {}, links cleared: {}, empty result: {}",
        out.repairs.len(),
        out.links_cleared,
        out.report.is_empty_result()
    );
    println!("{}", serde_json::to_string_pretty(&out.report)?);
    Ok(())
}
