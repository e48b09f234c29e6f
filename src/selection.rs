// src/selection.rs
//! Selection Model: the operator-controlled subset of the registry that scopes a request.
//!
//! Lives only as long as the session. Mutations never trigger a fetch; a new
//! report has to be requested explicitly. An empty selection is a legitimate
//! zero-source request and is never widened to "all sources".

use std::collections::BTreeSet;

use serde::Serialize;
use tracing::warn;

use crate::sources::{self, SourceCategory};

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Selection {
    members: BTreeSet<String>,
}

/// Outcome of [`Selection::replace`]: names outside the registry are dropped.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize)]
pub struct ReplaceOutcome {
    pub accepted: usize,
    pub rejected: Vec<String>,
}

impl Selection {
    /// Empty selection.
    pub fn empty() -> Self {
        Self::default()
    }

    /// Every registered outlet (the session default).
    pub fn all() -> Self {
        Self {
            members: sources::all_sources().map(str::to_string).collect(),
        }
    }

    /// Flip membership of `source`. Returns whether it is selected afterwards.
    /// Names outside the registry are ignored.
    pub fn toggle(&mut self, source: &str) -> bool {
        if !sources::is_registered(source) {
            warn!(target: "selection", source, "toggle ignored: not in registry");
            return false;
        }
        if self.members.remove(source) {
            false
        } else {
            self.members.insert(source.to_string());
            true
        }
    }

    pub fn select_all(&mut self) {
        *self = Self::all();
    }

    pub fn deselect_all(&mut self) {
        self.members.clear();
    }

    /// Replace the whole selection. Unknown names are reported back, never kept.
    pub fn replace<I, S>(&mut self, next: I) -> ReplaceOutcome
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let mut members = BTreeSet::new();
        let mut rejected = Vec::new();
        for s in next {
            let s = s.into();
            if sources::is_registered(&s) {
                members.insert(s);
            } else {
                rejected.push(s);
            }
        }
        if !rejected.is_empty() {
            warn!(target: "selection", rejected = rejected.len(), "replace dropped unknown sources");
        }
        self.members = members;
        ReplaceOutcome {
            accepted: self.members.len(),
            rejected,
        }
    }

    pub fn contains(&self, source: &str) -> bool {
        self.members.contains(source)
    }

    pub fn len(&self) -> usize {
        self.members.len()
    }

    pub fn is_empty(&self) -> bool {
        self.members.is_empty()
    }

    /// Members in catalog order, so the same set always renders the same way.
    pub fn ordered(&self) -> Vec<String> {
        let mut out: Vec<&String> = self.members.iter().collect();
        out.sort_by_key(|s| sources::catalog_index(s).unwrap_or(usize::MAX));
        out.into_iter().cloned().collect()
    }

    /// Selected count per category (for the picker header).
    pub fn count_in(&self, category: SourceCategory) -> usize {
        category
            .sources()
            .iter()
            .filter(|s| self.members.contains(**s))
            .count()
    }
}
