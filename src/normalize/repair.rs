// src/normalize/repair.rs
//! Repair stage: structural completion of a parsed report object.
//!
//! Runs only after parsing succeeded. Absent or mistyped fields become their
//! type's zero value (empty text, 0, empty list); nothing is invented. Every
//! repair is recorded so callers can log and count contract violations.

use std::collections::HashSet;

use serde_json::{Map, Value};

use crate::report::{
    CategorizedFlow, ItemKind, NarrativeReport, NewsItem, Sentiment, TrendDatum,
};

/// Paths of the fields that had to be repaired, e.g. `topItems[1].views: negative`.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RepairLog {
    pub entries: Vec<String>,
}

impl RepairLog {
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    fn note(&mut self, path: &str, key: &str, what: &str) {
        self.entries.push(format!("{path}{key}: {what}"));
    }
}

/// Build the canonical report from a parsed object, defaulting whatever is missing.
pub fn complete_report(doc: &Map<String, Value>) -> (NarrativeReport, RepairLog) {
    let mut log = RepairLog::default();
    let root = "";

    let sentiment_breakdown = list(doc, "sentimentBreakdown", root, &mut log)
        .iter()
        .enumerate()
        .filter_map(|(i, v)| {
            let path = format!("sentimentBreakdown[{i}].");
            object(v, &path, &mut log).map(|o| trend(o, &path, &mut log))
        })
        .collect();
    let source_distribution = list(doc, "sourceDistribution", root, &mut log)
        .iter()
        .enumerate()
        .filter_map(|(i, v)| {
            let path = format!("sourceDistribution[{i}].");
            object(v, &path, &mut log).map(|o| trend(o, &path, &mut log))
        })
        .collect();
    let detailed_flows = list(doc, "detailedFlows", root, &mut log)
        .iter()
        .enumerate()
        .filter_map(|(i, v)| {
            let path = format!("detailedFlows[{i}].");
            object(v, &path, &mut log).map(|o| flow(o, &path, &mut log))
        })
        .collect();
    let mut top_items: Vec<NewsItem> = list(doc, "topItems", root, &mut log)
        .iter()
        .enumerate()
        .filter_map(|(i, v)| {
            let path = format!("topItems[{i}].");
            object(v, &path, &mut log).map(|o| news_item(o, &path, &mut log))
        })
        .collect();
    assign_fallback_ids(&mut top_items);

    let report = NarrativeReport {
        date: text(doc, "date", root, &mut log),
        dominant_narrative: text(doc, "dominantNarrative", root, &mut log),
        summary: text(doc, "summary", root, &mut log),
        total_monitored: count(doc, "totalMonitored", root, &mut log),
        active_sources: count(doc, "activeSources", root, &mut log),
        sentiment_breakdown,
        source_distribution,
        detailed_flows,
        top_items,
    };
    (report, log)
}

fn trend(o: &Map<String, Value>, path: &str, log: &mut RepairLog) -> TrendDatum {
    TrendDatum {
        name: text(o, "name", path, log),
        value: share(o, "value", path, log),
        color: text(o, "color", path, log),
    }
}

fn flow(o: &Map<String, Value>, path: &str, log: &mut RepairLog) -> CategorizedFlow {
    let key_headlines = list(o, "keyHeadlines", path, log)
        .iter()
        .filter_map(|h| match h {
            Value::String(s) => Some(s.clone()),
            _ => {
                log.note(path, "keyHeadlines", "non-text headline dropped");
                None
            }
        })
        .collect();
    CategorizedFlow {
        category: text(o, "category", path, log),
        icon: text(o, "icon", path, log),
        summary: text(o, "summary", path, log),
        key_headlines,
    }
}

/// Give id-less items a positional `item-N`, skipping any id already in use.
/// Duplicate ids sent by the oracle are left as they are.
fn assign_fallback_ids(items: &mut [NewsItem]) {
    let mut taken: HashSet<String> = items
        .iter()
        .filter(|it| !it.id.trim().is_empty())
        .map(|it| it.id.clone())
        .collect();
    for (i, item) in items.iter_mut().enumerate() {
        if !item.id.trim().is_empty() {
            continue;
        }
        let mut n = i + 1;
        while taken.contains(&format!("item-{n}")) {
            n += 1;
        }
        item.id = format!("item-{n}");
        taken.insert(item.id.clone());
    }
}

fn news_item(o: &Map<String, Value>, path: &str, log: &mut RepairLog) -> NewsItem {
    let id = text(o, "id", path, log);

    let kind = match o.get("type") {
        Some(Value::String(s)) => parse_kind(s).unwrap_or_else(|| {
            log.note(path, "type", "unknown value");
            ItemKind::default()
        }),
        _ => {
            log.note(path, "type", "missing");
            ItemKind::default()
        }
    };

    let sentiment = match o.get("sentiment") {
        Some(Value::String(s)) => parse_sentiment(s).unwrap_or_else(|| {
            log.note(path, "sentiment", "unknown value");
            Sentiment::default()
        }),
        _ => {
            log.note(path, "sentiment", "missing");
            Sentiment::default()
        }
    };

    let url = match o.get("url") {
        None | Some(Value::Null) => None,
        Some(Value::String(s)) => Some(s.clone()),
        Some(_) => {
            log.note(path, "url", "wrong type");
            None
        }
    };

    NewsItem {
        id,
        title: text(o, "title", path, log),
        source: text(o, "source", path, log),
        kind,
        sentiment,
        views: count(o, "views", path, log),
        shares: count(o, "shares", path, log),
        publish_time: text(o, "publishTime", path, log),
        url,
    }
}

fn parse_kind(s: &str) -> Option<ItemKind> {
    match s.trim().to_ascii_lowercase().as_str() {
        "news" => Some(ItemKind::News),
        "twitter" | "x" => Some(ItemKind::Twitter),
        "instagram" => Some(ItemKind::Instagram),
        _ => None,
    }
}

fn parse_sentiment(s: &str) -> Option<Sentiment> {
    match s.trim().to_ascii_lowercase().as_str() {
        "positive" => Some(Sentiment::Positive),
        "negative" => Some(Sentiment::Negative),
        "neutral" => Some(Sentiment::Neutral),
        _ => None,
    }
}

/* ----------------------------
Field readers
---------------------------- */

fn object<'a>(v: &'a Value, path: &str, log: &mut RepairLog) -> Option<&'a Map<String, Value>> {
    match v {
        Value::Object(o) => Some(o),
        _ => {
            log.note(path, "", "non-object entry dropped");
            None
        }
    }
}

fn list<'a>(o: &'a Map<String, Value>, key: &str, path: &str, log: &mut RepairLog) -> &'a [Value] {
    match o.get(key) {
        Some(Value::Array(a)) => a.as_slice(),
        None | Some(Value::Null) => {
            log.note(path, key, "missing");
            &[]
        }
        Some(_) => {
            log.note(path, key, "wrong type");
            &[]
        }
    }
}

fn text(o: &Map<String, Value>, key: &str, path: &str, log: &mut RepairLog) -> String {
    match o.get(key) {
        Some(Value::String(s)) => s.clone(),
        None | Some(Value::Null) => {
            log.note(path, key, "missing");
            String::new()
        }
        Some(_) => {
            log.note(path, key, "wrong type");
            String::new()
        }
    }
}

/// Non-negative integer. Quoted digits are accepted; negatives clamp to 0.
fn count(o: &Map<String, Value>, key: &str, path: &str, log: &mut RepairLog) -> u64 {
    match o.get(key) {
        Some(Value::Number(n)) => {
            if let Some(u) = n.as_u64() {
                return u;
            }
            match n.as_f64() {
                Some(f) if f.is_finite() && f >= 0.0 => f.round() as u64,
                _ => {
                    log.note(path, key, "negative");
                    0
                }
            }
        }
        Some(Value::String(s)) => match s.trim().parse::<u64>() {
            Ok(u) => u,
            Err(_) => {
                log.note(path, key, "not a number");
                0
            }
        },
        None | Some(Value::Null) => {
            log.note(path, key, "missing");
            0
        }
        Some(_) => {
            log.note(path, key, "wrong type");
            0
        }
    }
}

/// Non-negative share value. No requirement that shares sum to 100.
fn share(o: &Map<String, Value>, key: &str, path: &str, log: &mut RepairLog) -> f64 {
    let raw = match o.get(key) {
        Some(Value::Number(n)) => n.as_f64(),
        Some(Value::String(s)) => s.trim().trim_end_matches('%').trim().parse::<f64>().ok(),
        None | Some(Value::Null) => {
            log.note(path, key, "missing");
            return 0.0;
        }
        Some(_) => None,
    };
    match raw {
        Some(f) if f.is_finite() && f >= 0.0 => f,
        Some(f) if f.is_finite() => {
            log.note(path, key, "negative");
            0.0
        }
        _ => {
            log.note(path, key, "not a number");
            0.0
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn doc(v: Value) -> Map<String, Value> {
        match v {
            Value::Object(m) => m,
            _ => panic!("test doc must be an object"),
        }
    }

    #[test]
    fn empty_object_completes_to_zero_values() {
        let (r, log) = complete_report(&Map::new());
        assert_eq!(r.date, "");
        assert_eq!(r.total_monitored, 0);
        assert!(r.top_items.is_empty());
        assert!(r.detailed_flows.is_empty());
        // 9 top-level fields, all missing.
        assert_eq!(log.len(), 9);
    }

    #[test]
    fn negative_and_quoted_numbers() {
        let (r, log) = complete_report(&doc(json!({
            "totalMonitored": "12",
            "activeSources": -3,
            "sentimentBreakdown": [
                { "name": "مثبت", "value": -5, "color": "#10b981" },
                { "name": "منفی", "value": "40%", "color": "#ef4444" }
            ]
        })));
        assert_eq!(r.total_monitored, 12);
        assert_eq!(r.active_sources, 0);
        assert_eq!(r.sentiment_breakdown[0].value, 0.0);
        assert_eq!(r.sentiment_breakdown[1].value, 40.0);
        assert!(log.entries.iter().any(|e| e == "activeSources: negative"));
        assert!(log
            .entries
            .iter()
            .any(|e| e == "sentimentBreakdown[0].value: negative"));
    }

    #[test]
    fn inconsistent_shares_are_tolerated() {
        let (r, _) = complete_report(&doc(json!({
            "sourceDistribution": [
                { "name": "a", "value": 80, "color": "#000" },
                { "name": "b", "value": 70, "color": "#111" }
            ]
        })));
        let total: f64 = r.source_distribution.iter().map(|d| d.value).sum();
        assert_eq!(total, 150.0);
    }

    #[test]
    fn item_fields_default_without_fabrication() {
        let (r, log) = complete_report(&doc(json!({
            "topItems": [
                { "title": "تیتر", "source": "ایرنا (IRNA)", "type": "Telegram", "sentiment": "angry" },
                "garbage",
                { "id": "x9", "title": "t", "source": "s", "type": "twitter", "sentiment": "NEGATIVE",
                  "views": 5, "shares": 1, "publishTime": "10:15", "url": 42 }
            ]
        })));
        assert_eq!(r.top_items.len(), 2);
        let a = &r.top_items[0];
        assert_eq!(a.id, "item-1");
        assert_eq!(a.kind, ItemKind::News);
        assert_eq!(a.sentiment, Sentiment::Neutral);
        assert_eq!(a.url, None);
        assert_eq!(a.publish_time, "");
        let b = &r.top_items[1];
        assert_eq!(b.kind, ItemKind::Twitter);
        assert_eq!(b.sentiment, Sentiment::Negative);
        assert_eq!(b.url, None);
        assert!(log.entries.iter().any(|e| e == "topItems[1].: non-object entry dropped"));
        assert!(log.entries.iter().any(|e| e == "topItems[2].url: wrong type"));
    }

    #[test]
    fn fallback_ids_skip_ids_already_sent() {
        let (r, _) = complete_report(&doc(json!({
            "topItems": [
                { "id": "item-2", "title": "a" },
                { "title": "b" },
                { "title": "c" },
                { "id": "   ", "title": "d" }
            ]
        })));
        let ids: Vec<&str> = r.top_items.iter().map(|i| i.id.as_str()).collect();
        assert_eq!(ids, ["item-2", "item-3", "item-4", "item-5"]);
        let uniq: HashSet<&str> = ids.iter().copied().collect();
        assert_eq!(uniq.len(), ids.len());
    }

    #[test]
    fn non_text_headlines_are_dropped() {
        let (r, _) = complete_report(&doc(json!({
            "detailedFlows": [
                { "category": "اقتصاد", "icon": "Coins", "summary": "s", "keyHeadlines": ["a", 3, null, "b"] }
            ]
        })));
        assert_eq!(r.detailed_flows[0].key_headlines, vec!["a", "b"]);
    }
}
