use serde_json::json;
use std::{
    sync::{Arc, Mutex},
    time::Duration,
};
use unfurl::{
    Behavior, BoxError, ComponentContext, ComponentDescriptor, Loader, Module, Stage,
    StageFuture, Value,
    testing::{ModuleTable, RecordingBehavior, RecordingReporter, StageLog},
};

mod common;
use common::document;

/// Records when each stage starts and finishes; `a` settles late.
struct Delayed {
    events: Arc<Mutex<Vec<String>>>,
}

impl Behavior for Delayed {
    fn chain(&self) -> Vec<Stage> {
        vec![Stage::custom("a"), Stage::custom("b")]
    }

    fn custom<'a>(
        &'a self,
        name: &str,
        _cx: &'a ComponentContext,
        input: Value,
    ) -> Option<StageFuture<'a>> {
        let name = name.to_owned();
        Some(Box::pin(async move {
            self.events.lock().unwrap().push(format!("{name} start {input}"));
            if name == "a" {
                tokio::time::sleep(Duration::from_millis(30)).await;
            }
            self.events.lock().unwrap().push(format!("{name} end"));
            Ok::<_, BoxError>(json!(format!("from {name}")))
        }))
    }
}

#[tokio::test]
async fn test_stage_waits_for_previous_and_receives_its_value() {
    let events = Arc::new(Mutex::new(Vec::new()));
    let shared = events.clone();
    let loader = Loader::builder(document(r#"<div data-ds-component="delayed"></div>"#))
        .resolver(ModuleTable::new().with(
            "delayed",
            Module::from_fn(move |_: &ComponentDescriptor| Delayed {
                events: shared.clone(),
            }),
        ))
        .reporter(RecordingReporter::new())
        .build()
        .unwrap();

    let summary = loader.run().await.unwrap();
    assert_eq!(
        *events.lock().unwrap(),
        ["a start null", "a end", r#"b start "from a""#, "b end"]
    );
    let outcome = summary.instances()[0].outcome().unwrap().unwrap();
    assert_eq!(outcome, json!("from b"));
}

#[tokio::test]
async fn test_options_merge_defaults_with_metadata() {
    let log = StageLog::new();
    let doc = document(
        r#"<div data-ds-component="opts" data-ds-options='{"foo":"bar"}'></div>"#,
    );
    let loader = Loader::builder(doc)
        .resolver(ModuleTable::new().with(
            "opts",
            RecordingBehavior::module_with_defaults(log, json!({"test": true, "foo": "default"})),
        ))
        .reporter(RecordingReporter::new())
        .build()
        .unwrap();

    let summary = loader.run().await.unwrap();
    let options = summary.instances()[0].options().clone();
    assert_eq!(Value::Object(options), json!({"test": true, "foo": "bar"}));
}

#[tokio::test]
async fn test_multiple_behaviors_share_one_descriptor() {
    let log = StageLog::new();
    let loader = Loader::builder(document(
        r#"<div data-ds-component="first" data-ds-components="second, first"></div>"#,
    ))
    .resolver(
        ModuleTable::new()
            .with("first", Module::from_fn({
                let log = log.clone();
                move |_: &ComponentDescriptor| RecordingBehavior::new(log.clone(), "first")
            }))
            .with("second", Module::from_fn({
                let log = log.clone();
                move |_: &ComponentDescriptor| RecordingBehavior::new(log.clone(), "second")
            })),
    )
    .reporter(RecordingReporter::new())
    .build()
    .unwrap();

    let summary = loader.run().await.unwrap();
    let descriptor = &loader.components()[0];
    assert_eq!(descriptor.behavior_paths(), ["first", "second"]);
    assert_eq!(descriptor.instances().len(), 2);
    assert!(Arc::ptr_eq(
        &descriptor.instance().unwrap(),
        &descriptor.instances()[1]
    ));
    assert_eq!(summary.instances().len(), 2);
    assert_eq!(log.entries_for("first").len(), 2);
    assert_eq!(log.entries_for("second").len(), 2);
}

/// Injects a marked child while being constructed.
struct Injector;

impl Behavior for Injector {}

#[tokio::test]
async fn test_markup_added_during_construction_is_loaded() {
    let log = StageLog::new();
    let loader = Loader::builder(document(r#"<div data-ds-component="injector"></div>"#))
        .resolver(
            ModuleTable::new()
                .with(
                    "injector",
                    Module::from_fn(|d: &ComponentDescriptor| {
                        d.element()
                            .append_child("div", [("data-ds-component", "injected")]);
                        Injector
                    }),
                )
                .with("injected", log.module()),
        )
        .reporter(RecordingReporter::new())
        .build()
        .unwrap();

    let summary = loader.run().await.unwrap();
    assert_eq!(summary.loaded(), 2);
    assert_eq!(log.entries(), ["injected:ready", "injected:events"]);

    let parent = &loader.components()[0];
    let child = &loader.components()[1];
    assert!(Arc::ptr_eq(&child.parent().unwrap(), parent));
    assert_eq!(parent.children().len(), 1);
}
