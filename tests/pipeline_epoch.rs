// tests/pipeline_epoch.rs
//
// Request lifecycle with a controllable oracle:
// - a superseded request never becomes visible, however late it resolves
// - "nothing found" ends in Ready, not Failed
// - while the call is outstanding the scan animates over the selected sources only

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use media_narrative_monitor::config::ScanSettings;
use media_narrative_monitor::oracle::{DynOracle, MockOracle, ReportOracle};
use media_narrative_monitor::progress::{scan_log_line, ScanPhase};
use media_narrative_monitor::query::{OracleQuery, OutputLanguage, QueryBuilder};
use media_narrative_monitor::{PipelineError, PipelineStatus, ReportPipeline};
use tokio::sync::Notify;

/// Replies to topic "alpha" only after `release` is notified; everything else
/// gets an immediate "beta" report.
struct GatedOracle {
    release: Arc<Notify>,
}

fn report_json(narrative: &str) -> String {
    serde_json::json!({
        "date": "2024-05-01",
        "dominantNarrative": narrative,
        "summary": narrative,
        "totalMonitored": 1,
        "activeSources": 1,
        "sentimentBreakdown": [],
        "sourceDistribution": [],
        "detailedFlows": [],
        "topItems": [{
            "id": narrative, "title": narrative, "source": "ایسنا (ISNA)",
            "type": "News", "sentiment": "neutral", "views": 1, "shares": 0,
            "publishTime": "10:00", "url": "https://www.isna.ir/"
        }]
    })
    .to_string()
}

#[async_trait]
impl ReportOracle for GatedOracle {
    async fn generate(&self, query: &OracleQuery) -> Result<String, PipelineError> {
        if query.prompt.contains("Topic Filter: alpha") {
            self.release.notified().await;
            return Ok(report_json("alpha"));
        }
        Ok(report_json("beta"))
    }
    fn name(&self) -> &'static str {
        "gated"
    }
}

fn settings() -> ScanSettings {
    ScanSettings {
        completion_grace_ms: 0,
        seed: Some(9),
        ..ScanSettings::default()
    }
}

async fn settle(p: &ReportPipeline) -> PipelineStatus {
    for _ in 0..500 {
        let (_, st) = p.status();
        if !matches!(st, PipelineStatus::Scanning { .. }) {
            return st;
        }
        tokio::time::sleep(Duration::from_millis(10)).await;
    }
    p.status().1
}

fn narrative(st: &PipelineStatus) -> &str {
    match st {
        PipelineStatus::Ready { report } => &report.dominant_narrative,
        other => panic!("expected a ready report, got {other:?}"),
    }
}

#[tokio::test(start_paused = true)]
async fn superseded_request_never_becomes_visible() {
    let release = Arc::new(Notify::new());
    let oracle: DynOracle = Arc::new(GatedOracle {
        release: Arc::clone(&release),
    });
    let p = ReportPipeline::new(oracle, QueryBuilder::default(), settings());

    let a = p.submit(Some("alpha"), "2024-05-01").expect("submit A");
    let b = p.submit(Some("beta"), "2024-05-01").expect("submit B");
    assert!(b > a);

    let st = settle(&p).await;
    assert_eq!(narrative(&st), "beta");

    // A resolves long after B was committed; it must be dropped.
    release.notify_one();
    tokio::time::sleep(Duration::from_secs(5)).await;

    let (epoch, st) = p.status();
    assert_eq!(epoch, b);
    assert_eq!(narrative(&st), "beta");
    assert_eq!(p.scan_phase(), ScanPhase::Done);
}

#[tokio::test(start_paused = true)]
async fn cancelled_request_resolving_late_leaves_idle() {
    let release = Arc::new(Notify::new());
    let oracle: DynOracle = Arc::new(GatedOracle {
        release: Arc::clone(&release),
    });
    let p = ReportPipeline::new(oracle, QueryBuilder::default(), settings());

    p.submit(Some("alpha"), "2024-05-01").expect("submit");
    tokio::time::sleep(Duration::from_secs(1)).await;
    p.cancel();

    release.notify_one();
    tokio::time::sleep(Duration::from_secs(5)).await;
    assert_eq!(p.status().1, PipelineStatus::Idle);
}

#[tokio::test(start_paused = true)]
async fn scan_animates_over_selected_sources_while_waiting() {
    let release = Arc::new(Notify::new());
    let oracle: DynOracle = Arc::new(GatedOracle {
        release: Arc::clone(&release),
    });
    let p = ReportPipeline::new(oracle, QueryBuilder::default(), settings());

    let picked = ["عصر ایران (Asriran)", "صدای آمریکا (VOA Farsi)"];
    p.update_selection(|s| s.replace(picked));
    p.submit(Some("alpha"), "2024-05-01").expect("submit");

    tokio::time::sleep(Duration::from_secs(3)).await;
    match p.status().1 {
        PipelineStatus::Scanning { progress, log_tail } => {
            assert!(progress > 0 && progress < 100, "progress {progress}");
            assert!(!log_tail.is_empty());
            let allowed: Vec<String> = picked.iter().map(|s| scan_log_line(s)).collect();
            assert!(log_tail.iter().all(|l| allowed.contains(l)), "{log_tail:?}");
        }
        other => panic!("expected scanning, got {other:?}"),
    }

    release.notify_one();
    let st = settle(&p).await;
    assert_eq!(narrative(&st), "alpha");
}

#[tokio::test(start_paused = true)]
async fn nothing_found_is_ready_not_failed() {
    let lang = &OutputLanguage::PERSIAN;
    let oracle: DynOracle = Arc::new(MockOracle::not_found(lang, "2024-05-01"));
    let p = ReportPipeline::new(oracle, QueryBuilder::default(), settings());

    p.submit(Some("موضوعی که وجود ندارد"), "2024-05-01")
        .expect("submit");
    match settle(&p).await {
        PipelineStatus::Ready { report } => {
            assert!(report.is_empty_result());
            assert_eq!(report.dominant_narrative, lang.not_found);
        }
        other => panic!("expected ready, got {other:?}"),
    }
}

#[tokio::test(start_paused = true)]
async fn selection_changes_do_not_trigger_requests() {
    let oracle: DynOracle = Arc::new(MockOracle::text(report_json("beta")));
    let p = ReportPipeline::new(oracle, QueryBuilder::default(), settings());

    p.update_selection(|s| s.deselect_all());
    p.update_selection(|s| s.select_all());
    tokio::time::sleep(Duration::from_secs(1)).await;

    assert_eq!(p.epoch(), 0);
    assert_eq!(p.status().1, PipelineStatus::Idle);
}

#[tokio::test(start_paused = true)]
async fn malformed_response_fails_with_kind() {
    let oracle: DynOracle = Arc::new(MockOracle::text("no json here, sorry"));
    let p = ReportPipeline::new(oracle, QueryBuilder::default(), settings());

    p.submit(None, "2024-05-01").expect("submit");
    match settle(&p).await {
        PipelineStatus::Failed { kind, .. } => {
            assert_eq!(kind, media_narrative_monitor::ErrorKind::MalformedOracleResponse)
        }
        other => panic!("expected failure, got {other:?}"),
    }
}
