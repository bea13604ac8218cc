use std::time::Duration;
use unfurl::{
    Document, Element, ErrorKind, Loader, Outcome, RunState,
    testing::{ManualCondition, RecordingReporter, StageLog},
};

mod common;
use common::{COMPONENT_2, FIXTURE, document, recording_table};

#[tokio::test]
async fn test_in_viewport_loads_visible_element_during_run() {
    let doc = document(
        r#"<div data-ds-component="lazy" data-ds-condition="inViewport"></div>"#,
    );
    let lazy = doc
        .root()
        .query_first(|n| n.attribute("data-ds-component").is_some())
        .unwrap();
    lazy.set_visible(true);

    let log = StageLog::new();
    let loader = Loader::builder(doc)
        .resolver(common::table_with([("lazy", log.module())]))
        .reporter(RecordingReporter::new())
        .build()
        .unwrap();

    let summary = loader.run().await.unwrap();
    assert_eq!(summary.loaded(), 1);
    assert_eq!(log.entries(), ["lazy:ready", "lazy:events"]);
}

#[tokio::test]
async fn test_in_viewport_defers_until_shown() {
    let doc = document(
        r#"<div data-ds-component="lazy" data-ds-condition="inViewport"></div>"#,
    );
    let lazy = doc
        .root()
        .query_first(|n| n.attribute("data-ds-component").is_some())
        .unwrap();

    let log = StageLog::new();
    let loader = Loader::builder(doc)
        .resolver(common::table_with([("lazy", log.module())]))
        .reporter(RecordingReporter::new())
        .build()
        .unwrap();

    let summary = loader.run().await.unwrap();
    assert_eq!(summary.loaded(), 0);
    assert_eq!(lazy.pending_observers(), 1);

    lazy.set_visible(true);
    assert_eq!(loader.components().len(), 1);

    let deferred = loader.drive_deferred().await.unwrap();
    assert_eq!(deferred.loaded(), 1);
    assert_eq!(log.entries(), ["lazy:ready", "lazy:events"]);
    assert_eq!(loader.state(), RunState::Settled(Outcome::Success));
}

#[tokio::test]
async fn test_fired_condition_after_settle_is_driven() {
    let log = StageLog::new();
    let manual = ManualCondition::new();
    let loader = Loader::builder(document(FIXTURE))
        .resolver(recording_table(&log))
        .condition("test", manual.clone())
        .reporter(RecordingReporter::new())
        .build()
        .unwrap();

    loader.run().await.unwrap();
    assert_eq!(manual.pending(), 1);
    assert!(log.entries_for(COMPONENT_2).is_empty());

    assert_eq!(manual.fire(), 1);
    assert_eq!(manual.fire(), 1);
    assert_eq!(manual.pending(), 0);

    let deferred = loader.drive_deferred().await.unwrap();
    assert_eq!(deferred.loaded(), 1);
    assert_eq!(loader.components().len(), 5);
    assert_eq!(
        log.entries_for(COMPONENT_2),
        [
            format!("{COMPONENT_2}:ready"),
            format!("{COMPONENT_2}:events")
        ]
    );
}

#[tokio::test]
async fn test_released_condition_ends_deferred_drive() {
    let manual = ManualCondition::new();
    let reporter = RecordingReporter::new();
    let loader = Loader::builder(document(FIXTURE))
        .resolver(recording_table(&StageLog::new()))
        .condition("test", manual.clone())
        .reporter(reporter.clone())
        .build()
        .unwrap();

    loader.run().await.unwrap();
    manual.release();

    let deferred = loader.drive_deferred().await.unwrap();
    assert_eq!(deferred.loaded(), 0);
    assert_eq!(loader.components().len(), 4);
    assert_eq!(reporter.count(ErrorKind::ConditionNotDefined), 0);
    assert!(!loader.has_deferred());
}

#[tokio::test]
async fn test_nothing_parked_resolves_at_once() {
    let loader = Loader::builder(document(FIXTURE))
        .resolver(recording_table(&StageLog::new()))
        .reporter(RecordingReporter::new())
        .build()
        .unwrap();

    let deferred = loader.drive_deferred().await.unwrap();
    assert_eq!(deferred.loaded(), 0);
    assert_eq!(loader.state(), RunState::Idle);
}

const TWO_GATED: &str = r#"
<div data-ds-component="a" data-ds-condition="test"></div>
<div data-ds-component="b" data-ds-condition="test"></div>
"#;

fn marked(doc: &Document, path: &str) -> Element {
    doc.root()
        .query_first(|n| n.attribute("data-ds-component") == Some(path))
        .unwrap()
}

#[tokio::test]
async fn test_unfired_gate_does_not_hold_back_fired_one() {
    let doc = document(TWO_GATED);
    let log = StageLog::new();
    let manual = ManualCondition::new();
    let loader = Loader::builder(doc.clone())
        .resolver(common::table_with([("a", log.module()), ("b", log.module())]))
        .condition("test", manual.clone())
        .reporter(RecordingReporter::new())
        .build()
        .unwrap();

    assert_eq!(loader.run().await.unwrap().loaded(), 0);
    assert_eq!(manual.fire_for(&marked(&doc, "a")), 1);

    let deferred = tokio::time::timeout(Duration::from_millis(200), loader.drive_deferred())
        .await
        .expect("drive_deferred settles while `b` is still gated")
        .unwrap();
    assert_eq!(deferred.loaded(), 1);
    assert_eq!(log.entries(), ["a:ready", "a:events"]);
    assert!(loader.has_deferred());

    assert_eq!(manual.fire_for(&marked(&doc, "b")), 1);
    let deferred = loader.drive_deferred().await.unwrap();
    assert_eq!(deferred.loaded(), 1);
    assert_eq!(log.entries_for("b"), ["b:ready", "b:events"]);
    assert_eq!(manual.pending(), 0);
}

#[tokio::test]
async fn test_repeated_runs_drop_closed_request_streams() {
    let manual = ManualCondition::new();
    let loader = Loader::builder(document(FIXTURE))
        .resolver(recording_table(&StageLog::new()))
        .condition("test", manual.clone())
        .reporter(RecordingReporter::new())
        .build()
        .unwrap();

    loader.run().await.unwrap();
    assert!(loader.has_deferred());

    manual.release();
    for _ in 0..3 {
        assert_eq!(loader.run().await.unwrap().loaded(), 0);
    }
    assert!(!loader.has_deferred());
}
