// src/normalize/links.rs
//! Direct-link verification for news items.
//!
//! A link is kept only if it is a well-formed http(s) URL with a host and carries
//! no indirection-service marker. Everything else is cleared, never repaired.

use reqwest::Url;

use crate::report::NarrativeReport;

/// Substrings that identify redirect/indirection services instead of the article itself.
pub const INDIRECTION_MARKERS: &[&str] = &[
    "grounding-api-redirect",
    "vertexaisearch.cloud.google.com",
    "google.com/url?",
];

/// Returns the candidate (whitespace-trimmed) if it qualifies as a direct link.
pub fn direct_link(candidate: &str) -> Option<&str> {
    let c = candidate.trim();
    if c.is_empty() {
        return None;
    }
    let lower = c.to_ascii_lowercase();
    if !(lower.starts_with("http://") || lower.starts_with("https://")) {
        return None;
    }
    if INDIRECTION_MARKERS.iter().any(|m| lower.contains(m)) {
        return None;
    }
    let parsed = Url::parse(c).ok()?;
    if !matches!(parsed.scheme(), "http" | "https") || parsed.host_str().is_none() {
        return None;
    }
    Some(c)
}

pub fn is_direct_link(candidate: &str) -> bool {
    direct_link(candidate).is_some()
}

/// Clear every item link that is not direct. Returns how many were cleared.
pub fn verify_links(report: &mut NarrativeReport) -> usize {
    let mut cleared = 0usize;
    for item in &mut report.top_items {
        let Some(url) = item.url.take() else {
            continue;
        };
        match direct_link(&url) {
            Some(ok) => item.url = Some(ok.to_string()),
            None => cleared += 1,
        }
    }
    cleared
}
