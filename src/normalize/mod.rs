// src/normalize/mod.rs
//! Response Normalizer/Validator: untrusted oracle text → canonical [`NarrativeReport`].
//!
//! Three independent stages:
//! 1) `extract`: strip fences, slice `{..}`, parse. Hard failure, no partial report.
//! 2) `repair`: structural completion of missing/mistyped fields with zero values.
//! 3) `links`: clear every item URL that is not a direct http(s) link.
//!
//! An oracle that found nothing yields a valid report with empty `topItems`;
//! only stage 1 ever produces an error.

pub mod extract;
pub mod links;
pub mod repair;

use metrics::counter;
use tracing::{debug, warn};

use crate::error::PipelineError;
use crate::report::NarrativeReport;

pub use repair::RepairLog;

/// Canonical report plus what had to be fixed on the way.
#[derive(Debug, Clone)]
pub struct Normalized {
    pub report: NarrativeReport,
    pub repairs: RepairLog,
    pub links_cleared: usize,
}

pub fn normalize(raw: &str) -> Result<NarrativeReport, PipelineError> {
    normalize_detailed(raw).map(|n| n.report)
}

pub fn normalize_detailed(raw: &str) -> Result<Normalized, PipelineError> {
    let doc = extract::extract_document(raw).inspect_err(|e| {
        warn!(target: "normalize", error = %e, bytes = raw.len(), "oracle response rejected");
    })?;

    let (mut report, repairs) = repair::complete_report(&doc);
    let links_cleared = links::verify_links(&mut report);

    if !repairs.is_empty() {
        counter!("report_fields_repaired_total").increment(repairs.len() as u64);
        debug!(
            target: "normalize",
            repaired = repairs.len(),
            first = ?repairs.entries.iter().take(5).collect::<Vec<_>>(),
            "structural gaps repaired"
        );
    }
    if links_cleared > 0 {
        counter!("report_links_cleared_total").increment(links_cleared as u64);
        debug!(target: "normalize", links_cleared, "non-direct links cleared");
    }

    Ok(Normalized {
        report,
        repairs,
        links_cleared,
    })
}
