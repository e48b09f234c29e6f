// src/report.rs
//! Canonical narrative report: the only structure consumers ever read.
//!
//! Field names follow the wire contract demanded from the oracle (camelCase).
//! A report is built once per request by the normalizer and replaced wholesale
//! by the next one; nothing here merges reports.

use reqwest::Url;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NarrativeReport {
    pub date: String,
    pub dominant_narrative: String,
    pub summary: String,
    pub total_monitored: u64,
    pub active_sources: u64,
    pub sentiment_breakdown: Vec<TrendDatum>,
    pub source_distribution: Vec<TrendDatum>,
    pub detailed_flows: Vec<CategorizedFlow>,
    pub top_items: Vec<NewsItem>,
}

impl NarrativeReport {
    /// The oracle ran fine and found nothing. This is a successful report, not an error.
    pub fn is_empty_result(&self) -> bool {
        self.top_items.is_empty()
    }

    /// Items that carry a verified direct link.
    pub fn verified_items(&self) -> impl Iterator<Item = &NewsItem> {
        self.top_items.iter().filter(|i| i.url.is_some())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum ItemKind {
    #[default]
    News,
    Twitter,
    Instagram,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Sentiment {
    Positive,
    Negative,
    #[default]
    Neutral,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewsItem {
    pub id: String,
    pub title: String,
    pub source: String,
    #[serde(rename = "type")]
    pub kind: ItemKind,
    pub sentiment: Sentiment,
    pub views: u64,
    pub shares: u64,
    /// "HH:MM" as reported; not reinterpreted.
    pub publish_time: String,
    /// Present only when the link passed direct-link verification.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,
}

/// Where the "read more" action of a feed entry points.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ActionLink {
    pub url: String,
    /// `true` when the item had no verified link and we route to a search instead.
    pub is_search: bool,
}

const SEARCH_FALLBACK_BASE: &str = "https://www.google.com/search";

impl NewsItem {
    pub fn is_verified(&self) -> bool {
        self.url.is_some()
    }

    /// Direct link when verified, otherwise a search by title and source.
    pub fn action_link(&self) -> ActionLink {
        if let Some(url) = &self.url {
            return ActionLink {
                url: url.clone(),
                is_search: false,
            };
        }
        let q = format!("{} {}", self.title, self.source);
        let url = Url::parse_with_params(SEARCH_FALLBACK_BASE, &[("q", q.as_str())])
            .map(|u| u.to_string())
            .unwrap_or_else(|_| SEARCH_FALLBACK_BASE.to_string());
        ActionLink {
            url,
            is_search: true,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CategorizedFlow {
    pub category: String,
    /// Symbolic icon key as returned by the oracle; see [`FlowIcon::from_key`].
    pub icon: String,
    pub summary: String,
    pub key_headlines: Vec<String>,
}

impl CategorizedFlow {
    pub fn icon_kind(&self) -> FlowIcon {
        FlowIcon::from_key(&self.icon)
    }
}

/// Known category icons. Unknown keys fall back to `Layers`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum FlowIcon {
    Vote,
    Coins,
    Users,
    Trophy,
    Music,
    Globe,
    Layers,
}

impl FlowIcon {
    pub fn from_key(key: &str) -> Self {
        match key.trim() {
            "Vote" => FlowIcon::Vote,
            "Coins" => FlowIcon::Coins,
            "Users" => FlowIcon::Users,
            "Trophy" => FlowIcon::Trophy,
            "Music" => FlowIcon::Music,
            "Globe" => FlowIcon::Globe,
            _ => FlowIcon::Layers,
        }
    }
}

/// One slice of a breakdown chart (sentiment mix or source-type mix).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TrendDatum {
    pub name: String,
    pub value: f64,
    /// Display hint, e.g. "#10b981".
    pub color: String,
}
