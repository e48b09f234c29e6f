// tests/query_builder.rs
//
// Query construction is pure: same inputs, same bytes. The directives must
// carry the topic, the date, the selected sources and the output language.

use media_narrative_monitor::query::{OutputLanguage, QueryBuilder};
use media_narrative_monitor::selection::Selection;
use media_narrative_monitor::QueryError;

fn sources(names: &[&str]) -> Vec<String> {
    names.iter().map(|s| s.to_string()).collect()
}

#[test]
fn identical_inputs_give_identical_queries() {
    let b = QueryBuilder::default();
    let src = Selection::all().ordered();

    let a = b.build(Some("انتخابات"), "2024-05-01", &src).expect("valid");
    let c = b.build(Some("انتخابات"), "2024-05-01", &src).expect("valid");

    assert_eq!(a, c);
    assert_eq!(a.fingerprint(), c.fingerprint());
    assert!(a.search_enabled, "search tool must always be enabled");
}

#[test]
fn directives_name_topic_date_sources_and_language() {
    let b = QueryBuilder::default();
    let src = sources(&["ایسنا (ISNA)", "بی‌بی‌سی فارسی (BBC Persian)"]);
    let q = b.build(Some("بورس"), "2024-03-20", &src).expect("valid");

    let dir = &q.system_instruction;
    assert!(dir.contains("\"بورس\""), "topic missing: {dir}");
    assert!(dir.contains("2024-03-20"));
    assert!(dir.contains("ایسنا (ISNA), بی‌بی‌سی فارسی (BBC Persian)"));
    assert!(dir.contains(OutputLanguage::PERSIAN.name));
    assert!(dir.contains(OutputLanguage::PERSIAN.not_found));

    // The prompt carries the same context plus the report skeleton.
    assert!(q.prompt.contains("Topic Filter: بورس"));
    assert!(q.prompt.contains("\"topItems\""));
    assert!(q.prompt.contains("\"activeSources\": 2"));
}

#[test]
fn general_sentinels_select_headline_mode() {
    let b = QueryBuilder::default();
    let src = sources(&["ایرنا (IRNA)"]);

    let none = b.build(None, "2024-05-01", &src).expect("valid");
    let en = b.build(Some("General"), "2024-05-01", &src).expect("valid");
    let fa = b
        .build(Some(OutputLanguage::PERSIAN.general_topic), "2024-05-01", &src)
        .expect("valid");

    assert_eq!(none, en);
    assert_eq!(none, fa);
    assert!(none.prompt.contains("Topic Filter: General Top News"));
    assert!(none.system_instruction.contains("most important headlines"));
}

#[test]
fn empty_selection_is_sent_as_is() {
    let b = QueryBuilder::default();
    let q = b
        .build(None, "2024-05-01", &Selection::empty().ordered())
        .expect("empty selection still builds");

    assert!(q.system_instruction.contains("(none selected)"));
    assert!(q.prompt.contains("\"activeSources\": 0"));
}

#[test]
fn malformed_dates_are_rejected() {
    let b = QueryBuilder::default();
    let src = sources(&["ایسنا (ISNA)"]);

    for bad in ["", "yesterday", "2024/05/01", "2024-13-01", "2024-02-30"] {
        match b.build(None, bad, &src) {
            Err(QueryError::InvalidDate(raw)) => assert_eq!(raw, bad),
            other => panic!("{bad:?} should be rejected, got {other:?}"),
        }
    }
}

#[test]
fn different_dates_change_the_fingerprint() {
    let b = QueryBuilder::default();
    let src = sources(&["ایسنا (ISNA)"]);
    let a = b.build(None, "2024-05-01", &src).expect("valid");
    let c = b.build(None, "2024-05-02", &src).expect("valid");
    assert_ne!(a.fingerprint(), c.fingerprint());
}
