//! # Scan Progress Simulator
//!
//! Cosmetic state machine shown while the oracle call is outstanding:
//! `Idle → Running → Completing → Done`, or `Running → Failed`.
//!
//! It is not coupled to real retrieval progress. Ticks add a bounded random
//! increment (capped below 100) and a flavor log line naming a random selected
//! source; those lines carry no factual weight. Only a real response pushes
//! progress to 100. Randomness is injected so ticks are reproducible in tests.

use std::collections::VecDeque;

use rand::Rng;
use serde::Serialize;

use crate::config::ScanSettings;

pub const TERMINAL_LOG_LINES: [&str; 2] = [
    "Data aggregation complete.",
    "Generating analytics report...",
];

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ScanPhase {
    Idle,
    Running,
    Completing,
    Done,
    Failed,
}

pub fn scan_log_line(source: &str) -> String {
    format!("Connecting to source: {source}... [OK]")
}

#[derive(Debug)]
pub struct ScanSimulator<R: Rng> {
    phase: ScanPhase,
    progress: u8,
    log: VecDeque<String>,
    sources: Vec<String>,
    settings: ScanSettings,
    rng: R,
}

impl<R: Rng> ScanSimulator<R> {
    pub fn new(settings: ScanSettings, rng: R) -> Self {
        Self {
            phase: ScanPhase::Idle,
            progress: 0,
            log: VecDeque::new(),
            sources: Vec::new(),
            settings: settings.sanitized(),
            rng,
        }
    }

    /// Begin a fresh cycle for `sources`. Any previous cycle is discarded.
    pub fn start(&mut self, sources: Vec<String>) {
        self.phase = ScanPhase::Running;
        self.progress = 0;
        self.log.clear();
        self.sources = sources;
    }

    /// Advance one tick. No-op unless running. Returns whether anything changed.
    pub fn tick(&mut self) -> bool {
        if self.phase != ScanPhase::Running {
            return false;
        }
        let step = self
            .rng
            .random_range(self.settings.min_increment..=self.settings.max_increment);
        self.progress = self
            .progress
            .saturating_add(step)
            .min(self.settings.progress_cap);

        if !self.sources.is_empty() {
            let idx = self.rng.random_range(0..self.sources.len());
            let line = scan_log_line(&self.sources[idx]);
            self.push_log(line);
        }
        true
    }

    /// The real response arrived: force 100 and append the terminal lines.
    pub fn complete(&mut self) -> bool {
        if self.phase != ScanPhase::Running {
            return false;
        }
        self.phase = ScanPhase::Completing;
        self.progress = 100;
        for line in TERMINAL_LOG_LINES {
            self.push_log(line.to_string());
        }
        true
    }

    /// Grace delay elapsed; the report view takes over.
    pub fn finish(&mut self) -> bool {
        if self.phase != ScanPhase::Completing {
            return false;
        }
        self.phase = ScanPhase::Done;
        true
    }

    /// Oracle failure: stop ticking, skip `Completing`.
    pub fn fail(&mut self) -> bool {
        if !matches!(self.phase, ScanPhase::Running | ScanPhase::Completing) {
            return false;
        }
        self.phase = ScanPhase::Failed;
        true
    }

    pub fn reset(&mut self) {
        self.phase = ScanPhase::Idle;
        self.progress = 0;
        self.log.clear();
        self.sources.clear();
    }

    pub fn phase(&self) -> ScanPhase {
        self.phase
    }

    pub fn progress(&self) -> u8 {
        self.progress
    }

    pub fn log_tail(&self) -> Vec<String> {
        self.log.iter().cloned().collect()
    }

    pub fn settings(&self) -> &ScanSettings {
        &self.settings
    }

    fn push_log(&mut self, line: String) {
        self.log.push_back(line);
        while self.log.len() > self.settings.log_tail_len {
            self.log.pop_front();
        }
    }
}
