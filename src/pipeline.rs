// src/pipeline.rs
//! Request lifecycle: one report in flight at a time, guarded by an epoch.
//!
//! `submit` builds the query, bumps the epoch, tears down the previous scan
//! ticker and spawns two tasks: the cosmetic ticker and the oracle call. A
//! result is committed only if its epoch is still current; anything older is
//! discarded. The selection is read at submit time and never mutated here.

use std::sync::{Arc, Mutex, RwLock};
use std::time::Duration;

use metrics::counter;
use rand::rngs::StdRng;
use rand::SeedableRng;
use serde::Serialize;
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;
use tracing::{debug, info, warn};

use crate::config::{PipelineConfig, ScanSettings};
use crate::error::{ErrorKind, PipelineError, QueryError};
use crate::normalize;
use crate::oracle::{DynOracle, ReportOracle};
use crate::progress::{ScanPhase, ScanSimulator};
use crate::query::{OracleQuery, QueryBuilder};
use crate::report::NarrativeReport;
use crate::selection::Selection;

/// Discrete status exposed to consumers.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "state", rename_all = "camelCase")]
pub enum PipelineStatus {
    Idle,
    Scanning {
        progress: u8,
        #[serde(rename = "logTail")]
        log_tail: Vec<String>,
    },
    Ready {
        report: NarrativeReport,
    },
    Failed {
        kind: ErrorKind,
        /// Operator-facing retry prompt, identical for every kind.
        message: String,
        detail: String,
    },
}

/// Oracle call + normalization, without any lifecycle bookkeeping.
pub async fn fetch_report(
    oracle: &dyn ReportOracle,
    query: &OracleQuery,
) -> Result<NarrativeReport, PipelineError> {
    let raw = oracle.generate(query).await?;
    normalize::normalize(&raw)
}

enum Stage {
    Idle,
    Scanning,
    Ready(NarrativeReport),
    Failed(PipelineError),
}

struct Shared {
    epoch: u64,
    stage: Stage,
    sim: ScanSimulator<StdRng>,
    ticker: Option<JoinHandle<()>>,
}

impl Shared {
    fn stop_ticker(&mut self) {
        if let Some(t) = self.ticker.take() {
            t.abort();
        }
    }
}

pub struct ReportPipeline {
    oracle: DynOracle,
    builder: QueryBuilder,
    settings: ScanSettings,
    selection: RwLock<Selection>,
    shared: Arc<Mutex<Shared>>,
}

impl ReportPipeline {
    pub fn new(oracle: DynOracle, builder: QueryBuilder, settings: ScanSettings) -> Self {
        let settings = settings.sanitized();
        let rng = match settings.seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_os_rng(),
        };
        let shared = Shared {
            epoch: 0,
            stage: Stage::Idle,
            sim: ScanSimulator::new(settings.clone(), rng),
            ticker: None,
        };
        Self {
            oracle,
            builder,
            settings,
            selection: RwLock::new(Selection::all()),
            shared: Arc::new(Mutex::new(shared)),
        }
    }

    pub fn from_config(oracle: DynOracle, cfg: &PipelineConfig) -> Self {
        Self::new(oracle, QueryBuilder::default(), cfg.scan.clone())
    }

    /* -------- Selection (session state) -------- */

    pub fn selection(&self) -> Selection {
        self.selection.read().expect("selection lock poisoned").clone()
    }

    /// Mutate the session selection. Never triggers a fetch.
    pub fn update_selection<T>(&self, f: impl FnOnce(&mut Selection) -> T) -> T {
        let mut guard = self.selection.write().expect("selection lock poisoned");
        f(&mut guard)
    }

    /* -------- Requests -------- */

    /// Start a new report cycle. Supersedes any request still in flight.
    /// Returns the epoch of the new request; an invalid date fails before anything starts.
    pub fn submit(&self, topic: Option<&str>, date: &str) -> Result<u64, QueryError> {
        let sources = self.selection().ordered();
        let query = self.builder.build(topic, date, &sources)?;
        let source_count = sources.len();

        let epoch = {
            let mut g = self.shared.lock().expect("pipeline mutex poisoned");
            g.epoch += 1;
            let epoch = g.epoch;
            g.stop_ticker();
            g.sim.start(sources);
            g.stage = Stage::Scanning;
            g.ticker = Some(spawn_ticker(
                Arc::clone(&self.shared),
                epoch,
                self.settings.tick_interval(),
            ));
            epoch
        };

        counter!("report_requests_total").increment(1);
        info!(
            target: "pipeline",
            epoch,
            query = %query.fingerprint(),
            sources = source_count,
            oracle = self.oracle.name(),
            "report requested"
        );

        tokio::spawn(run_request(
            Arc::clone(&self.shared),
            Arc::clone(&self.oracle),
            query,
            epoch,
            self.settings.completion_grace(),
        ));
        Ok(epoch)
    }

    /// Invalidate whatever is in flight and go back to idle.
    pub fn cancel(&self) {
        let mut g = self.shared.lock().expect("pipeline mutex poisoned");
        g.epoch += 1;
        g.stop_ticker();
        g.sim.reset();
        g.stage = Stage::Idle;
    }

    /// Current epoch and status snapshot.
    pub fn status(&self) -> (u64, PipelineStatus) {
        let g = self.shared.lock().expect("pipeline mutex poisoned");
        let status = match &g.stage {
            Stage::Idle => PipelineStatus::Idle,
            Stage::Scanning => PipelineStatus::Scanning {
                progress: g.sim.progress(),
                log_tail: g.sim.log_tail(),
            },
            Stage::Ready(report) => PipelineStatus::Ready {
                report: report.clone(),
            },
            Stage::Failed(e) => PipelineStatus::Failed {
                kind: e.kind(),
                message: self.builder.language().failure_message.to_string(),
                detail: e.to_string(),
            },
        };
        (g.epoch, status)
    }

    pub fn scan_phase(&self) -> ScanPhase {
        self.shared
            .lock()
            .expect("pipeline mutex poisoned")
            .sim
            .phase()
    }

    pub fn epoch(&self) -> u64 {
        self.shared.lock().expect("pipeline mutex poisoned").epoch
    }

    pub fn builder(&self) -> &QueryBuilder {
        &self.builder
    }
}

impl Drop for ReportPipeline {
    fn drop(&mut self) {
        if let Ok(mut g) = self.shared.lock() {
            g.epoch += 1;
            g.stop_ticker();
        }
    }
}

fn spawn_ticker(shared: Arc<Mutex<Shared>>, epoch: u64, every: Duration) -> JoinHandle<()> {
    tokio::spawn(async move {
        let mut ticker = tokio::time::interval(every);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
        // First tick of `interval` fires immediately.
        ticker.tick().await;
        loop {
            ticker.tick().await;
            let mut g = shared.lock().expect("pipeline mutex poisoned");
            if g.epoch != epoch || g.sim.phase() != ScanPhase::Running {
                break;
            }
            g.sim.tick();
        }
    })
}

async fn run_request(
    shared: Arc<Mutex<Shared>>,
    oracle: DynOracle,
    query: OracleQuery,
    epoch: u64,
    grace: Duration,
) {
    let outcome = fetch_report(oracle.as_ref(), &query).await;

    match outcome {
        Ok(report) => {
            {
                let mut g = shared.lock().expect("pipeline mutex poisoned");
                if g.epoch != epoch {
                    discard_stale(epoch, g.epoch);
                    return;
                }
                g.stop_ticker();
                g.sim.complete();
            }

            if !grace.is_zero() {
                tokio::time::sleep(grace).await;
            }

            let mut g = shared.lock().expect("pipeline mutex poisoned");
            if g.epoch != epoch {
                discard_stale(epoch, g.epoch);
                return;
            }
            g.sim.finish();
            counter!("report_ready_total").increment(1);
            info!(
                target: "pipeline",
                epoch,
                items = report.top_items.len(),
                empty = report.is_empty_result(),
                "report ready"
            );
            g.stage = Stage::Ready(report);
        }
        Err(e) => {
            let mut g = shared.lock().expect("pipeline mutex poisoned");
            if g.epoch != epoch {
                discard_stale(epoch, g.epoch);
                return;
            }
            g.stop_ticker();
            g.sim.fail();
            counter!("report_failed_total", "kind" => e.kind().as_str()).increment(1);
            warn!(target: "pipeline", epoch, error = %e, "report failed");
            g.stage = Stage::Failed(e);
        }
    }
}

fn discard_stale(epoch: u64, current: u64) {
    counter!("report_stale_discarded_total").increment(1);
    debug!(target: "pipeline", epoch, current, "stale response discarded");
}
