// src/query.rs
//! Query Builder: (topic, date, sources) → the request sent to the generative-search oracle.
//!
//! Pure and deterministic. The only failure is a malformed date; there is no
//! fallback to "today" here. The output language is a constant handed in at
//! construction, not a per-request parameter.

use chrono::NaiveDate;
use serde::Serialize;
use serde_json::json;
use sha2::{Digest, Sha256};

use crate::error::QueryError;

/// Fixed target language for every textual field the oracle produces.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OutputLanguage {
    /// Name as written into the directives.
    pub name: &'static str,
    /// Canonical "nothing matched" narrative.
    pub not_found: &'static str,
    /// Phrase meaning "no topic filter" in this language.
    pub general_topic: &'static str,
    /// positive, neutral, negative
    pub sentiment_labels: [&'static str; 3],
    /// news agencies, Twitter, Instagram
    pub source_type_labels: [&'static str; 3],
    /// Shown to the operator for every failure kind.
    pub failure_message: &'static str,
}

impl OutputLanguage {
    pub const PERSIAN: OutputLanguage = OutputLanguage {
        name: "PERSIAN (Farsi)",
        not_found: "موردی یافت نشد",
        general_topic: "اخبار مهم",
        sentiment_labels: ["مثبت", "خنثی", "منفی"],
        source_type_labels: ["خبرگزاری‌ها", "توییتر", "اینستاگرام"],
        failure_message: "خطا در ارتباط با موتور هوش مصنوعی. لطفاً دوباره تلاش کنید.",
    };
}

/// Sentinel accepted (case-insensitively) as "no topic filter".
pub const GENERAL_TOPIC_SENTINEL: &str = "general";

const SENTIMENT_COLORS: [&str; 3] = ["#10b981", "#64748b", "#ef4444"];
const SOURCE_TYPE_COLORS: [&str; 3] = ["#3b82f6", "#0ea5e9", "#ec4899"];
const ICON_KEYS: &str = "Vote | Coins | Users | Trophy | Music | Globe | Layers";

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TopicScope {
    /// Top general headlines.
    General,
    /// Strict topical filter.
    Specific(String),
}

impl TopicScope {
    pub fn from_input(topic: Option<&str>, language: &OutputLanguage) -> Self {
        match topic.map(str::trim) {
            None | Some("") => TopicScope::General,
            Some(t) if t.eq_ignore_ascii_case(GENERAL_TOPIC_SENTINEL) => TopicScope::General,
            Some(t) if t == language.general_topic => TopicScope::General,
            Some(t) => TopicScope::Specific(t.to_string()),
        }
    }
}

/// A validated report request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReportRequest {
    pub topic: TopicScope,
    pub date: NaiveDate,
    /// Exactly as selected; may be empty.
    pub sources: Vec<String>,
}

impl ReportRequest {
    pub fn new(
        topic: Option<&str>,
        date: &str,
        sources: &[String],
        language: &OutputLanguage,
    ) -> Result<Self, QueryError> {
        Ok(Self {
            topic: TopicScope::from_input(topic, language),
            date: parse_date(date)?,
            sources: sources.to_vec(),
        })
    }
}

/// Strict `YYYY-MM-DD` parsing.
pub fn parse_date(raw: &str) -> Result<NaiveDate, QueryError> {
    NaiveDate::parse_from_str(raw.trim(), "%Y-%m-%d")
        .map_err(|_| QueryError::InvalidDate(raw.to_string()))
}

/// What the oracle client sends: prompt, directives and the search-tool switch.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct OracleQuery {
    pub prompt: String,
    pub system_instruction: String,
    pub search_enabled: bool,
}

impl OracleQuery {
    /// Short stable id for logs; raw prompt text is never logged.
    pub fn fingerprint(&self) -> String {
        let mut hasher = Sha256::new();
        hasher.update(self.system_instruction.as_bytes());
        hasher.update([0u8]);
        hasher.update(self.prompt.as_bytes());
        let digest = hasher.finalize();
        let mut out = String::with_capacity(12);
        for b in digest.iter().take(6) {
            use std::fmt::Write as _;
            let _ = write!(&mut out, "{:02x}", b);
        }
        out
    }
}

#[derive(Debug, Clone)]
pub struct QueryBuilder {
    language: &'static OutputLanguage,
}

impl Default for QueryBuilder {
    fn default() -> Self {
        Self::new(&OutputLanguage::PERSIAN)
    }
}

impl QueryBuilder {
    pub fn new(language: &'static OutputLanguage) -> Self {
        Self { language }
    }

    pub fn language(&self) -> &'static OutputLanguage {
        self.language
    }

    /// Validate the inputs and build the query. Fails only on a malformed date.
    pub fn build(
        &self,
        topic: Option<&str>,
        date: &str,
        sources: &[String],
    ) -> Result<OracleQuery, QueryError> {
        let request = ReportRequest::new(topic, date, sources, self.language)?;
        Ok(self.build_request(&request))
    }

    /// Build from an already validated request. Infallible.
    pub fn build_request(&self, req: &ReportRequest) -> OracleQuery {
        let iso = req.date.format("%Y-%m-%d").to_string();
        let sources_context = if req.sources.is_empty() {
            "(none selected)".to_string()
        } else {
            req.sources.join(", ")
        };

        OracleQuery {
            prompt: self.prompt(req, &iso, &sources_context),
            system_instruction: self.directives(req, &iso, &sources_context),
            search_enabled: true,
        }
    }

    fn topic_directive(&self, topic: &TopicScope, iso: &str) -> String {
        match topic {
            TopicScope::General => format!(
                "SEARCH INTENT: Find the most important headlines and trending stories from the listed sources on {iso}."
            ),
            TopicScope::Specific(t) => format!(
                "SEARCH INTENT: Search ONLY for news about \"{t}\" from the listed sources on {iso}.\n\
                 - If an item is not related to \"{t}\", exclude it entirely.\n\
                 - If ZERO verified items about \"{t}\" exist in these sources, return the not-found report. Do not pad it with unrelated news."
            ),
        }
    }

    fn directives(&self, req: &ReportRequest, iso: &str, sources_context: &str) -> String {
        let lang = self.language;
        format!(
            "You are a strict, evidence-only news aggregator.\n\
             \n\
             CORE DIRECTIVE: ZERO TOLERANCE FOR FABRICATION.\n\
             \n\
             1. VERIFICATION IS MANDATORY: Report only items you actually retrieved with the search tool. Every item must be traceable to a search result.\n\
             2. URL REQUIREMENT: Every entry in 'topItems' must carry the direct article URL taken from the search result. If you cannot find a URL for a claim, that claim does not exist: drop it.\n\
             3. NOT FOUND: If nothing qualifies, set 'topItems' to [], 'totalMonitored' to 0 and 'dominantNarrative' to \"{not_found}\". Never invent headlines, numbers or sources to fill the report. An empty report is better than a fake one.\n\
             4. {topic}\n\
             5. DATE ACCURACY: Only items published on {iso}.\n\
             6. SOURCE RESTRICTION: Cite only these sources: {sources_context}.\n\
             7. LANGUAGE: Every text value must be written in {language}.\n\
             \n\
             Output format: a single JSON object. No markdown, no commentary.",
            not_found = lang.not_found,
            topic = self.topic_directive(&req.topic, iso),
            language = lang.name,
        )
    }

    fn prompt(&self, req: &ReportRequest, iso: &str, sources_context: &str) -> String {
        let topic_line = match &req.topic {
            TopicScope::General => "General Top News".to_string(),
            TopicScope::Specific(t) => t.clone(),
        };
        // Pretty printing a json! value is infallible.
        let schema = serde_json::to_string_pretty(&self.schema(iso, req.sources.len()))
            .unwrap_or_default();
        format!(
            "Perform the search now.\n\
             Date: {iso}\n\
             Sources Context: {sources_context}\n\
             Topic Filter: {topic_line}\n\
             \n\
             Task: return one JSON object with EXACTLY this structure.\n\
             - If no news matches, set 'topItems' to [] and 'dominantNarrative' to \"{not_found}\".\n\
             - Do not make up headlines or statistics to fill the JSON.\n\
             - All text values MUST be in {language}.\n\
             \n\
             {schema}",
            not_found = self.language.not_found,
            language = self.language.name,
        )
    }

    /// The wire contract: the canonical report shape with placeholder values.
    fn schema(&self, iso: &str, active_sources: usize) -> serde_json::Value {
        let lang = self.language;
        let trend = |labels: &[&str; 3], colors: &[&str; 3]| -> Vec<serde_json::Value> {
            labels
                .iter()
                .zip(colors.iter())
                .map(|(name, color)| json!({ "name": name, "value": 0, "color": color }))
                .collect()
        };
        json!({
            "date": iso,
            "dominantNarrative": format!("<headline of the dominant news flow, or \"{}\">", lang.not_found),
            "summary": "<precise analytical summary, or an explanation that nothing matched>",
            "totalMonitored": 0,
            "activeSources": active_sources,
            "sentimentBreakdown": trend(&lang.sentiment_labels, &SENTIMENT_COLORS),
            "sourceDistribution": trend(&lang.source_type_labels, &SOURCE_TYPE_COLORS),
            "detailedFlows": [{
                "category": "<topical category>",
                "icon": ICON_KEYS,
                "summary": "<short summary of the flow>",
                "keyHeadlines": ["<real headline>"]
            }],
            "topItems": [{
                "id": "<unique id>",
                "title": "<exact headline as published>",
                "source": "<exact source name from the list>",
                "type": "News | Twitter | Instagram",
                "sentiment": "positive | negative | neutral",
                "views": 0,
                "shares": 0,
                "publishTime": "HH:MM",
                "url": "<direct article URL from the search result>"
            }]
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn topic_scope_sentinels() {
        let fa = &OutputLanguage::PERSIAN;
        assert_eq!(TopicScope::from_input(None, fa), TopicScope::General);
        assert_eq!(TopicScope::from_input(Some("   "), fa), TopicScope::General);
        assert_eq!(TopicScope::from_input(Some("General"), fa), TopicScope::General);
        assert_eq!(TopicScope::from_input(Some("اخبار مهم"), fa), TopicScope::General);
        assert_eq!(
            TopicScope::from_input(Some(" بورس "), fa),
            TopicScope::Specific("بورس".into())
        );
    }

    #[test]
    fn invalid_dates_are_rejected() {
        for bad in ["", "2024-02-30", "2024/01/05", "tomorrow", "2024-13-01"] {
            assert!(
                matches!(parse_date(bad), Err(QueryError::InvalidDate(_))),
                "{bad} should be rejected"
            );
        }
        assert!(parse_date("2024-02-29").is_ok());
    }

    #[test]
    fn fingerprint_is_short_hex_and_stable() {
        let q = QueryBuilder::default()
            .build(None, "2024-05-01", &["ایرنا (IRNA)".to_string()])
            .unwrap();
        let a = q.fingerprint();
        assert_eq!(a.len(), 12);
        assert!(a.chars().all(|c| c.is_ascii_hexdigit()));
        assert_eq!(a, q.clone().fingerprint());
    }

    #[test]
    fn schema_lists_every_report_field() {
        let b = QueryBuilder::default();
        let v = b.schema("2024-05-01", 3);
        for key in [
            "date",
            "dominantNarrative",
            "summary",
            "totalMonitored",
            "activeSources",
            "sentimentBreakdown",
            "sourceDistribution",
            "detailedFlows",
            "topItems",
        ] {
            assert!(v.get(key).is_some(), "schema missing {key}");
        }
        assert_eq!(v["activeSources"], 3);
        let item = &v["topItems"][0];
        for key in [
            "id", "title", "source", "type", "sentiment", "views", "shares", "publishTime", "url",
        ] {
            assert!(item.get(key).is_some(), "item schema missing {key}");
        }
    }
}
