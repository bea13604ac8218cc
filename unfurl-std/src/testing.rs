//! Testing utilities for Unfurl.
//!
//! Doubles for the seams a [`Loader`](crate::loader::Loader) is wired with,
//! so hosts can test their behaviors and markup without a real resolver.
//!
//! # Features
//!
//! - [`ModuleTable`]: A resolver answering synchronously from a table
//! - [`RecordingReporter`]: A reporter that keeps every report
//! - [`StageLog`] / [`RecordingBehavior`]: A behavior that logs each stage it runs
//! - [`FailingBehavior`]: A behavior whose chain fails at a chosen stage
//! - [`PanickingBehavior`]: A behavior whose chain panics at a chosen stage
//! - [`ManualCondition`]: A condition the test fires by hand

use futures::future;
use serde_json::{Value, json};
use std::{
    collections::HashMap,
    sync::{
        Arc, Mutex, MutexGuard, PoisonError,
        atomic::{AtomicUsize, Ordering},
    },
};
use unfurl_core::{
    Behavior, BoxError, ComponentContext, ComponentDescriptor, Condition, Element, ErrorKind,
    LoadHandle, Module, ModuleNotFound, ModuleResolver, Options, Report, Reporter, ResolveFuture,
    Stage, StageFuture,
};

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}

// ============================================================================
// Module Table
// ============================================================================

/// A resolver backed by a fixed table of modules.
///
/// Unknown paths fail with [`ModuleNotFound`]. Every call is counted, so
/// tests can check how often resolution was attempted.
///
/// # Example
///
/// ```rust,ignore
/// let table = ModuleTable::new()
///     .with("carousel", Module::of::<Carousel>())
///     .with("tabs", Module::of::<Tabs>());
/// ```
#[derive(Clone, Default)]
pub struct ModuleTable {
    modules: HashMap<String, Module>,
    calls: Arc<AtomicUsize>,
}

impl ModuleTable {
    /// An empty table.
    pub fn new() -> Self {
        Self::default()
    }

    /// Register `module` under `path`.
    pub fn with(mut self, path: impl Into<String>, module: Module) -> Self {
        self.modules.insert(path.into(), module);
        self
    }

    /// Number of `resolve` calls so far, across clones.
    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

impl ModuleResolver for ModuleTable {
    fn resolve(&self, path: &str) -> ResolveFuture {
        self.calls.fetch_add(1, Ordering::SeqCst);
        let found = self
            .modules
            .get(path)
            .cloned()
            .ok_or_else(|| BoxError::from(ModuleNotFound(path.to_owned())));
        Box::pin(future::ready(found))
    }
}

// ============================================================================
// Recording Reporter
// ============================================================================

/// A reporter that records every report it receives.
///
/// Clones share the record.
#[derive(Clone, Default)]
pub struct RecordingReporter {
    reports: Arc<Mutex<Vec<Report>>>,
}

impl RecordingReporter {
    /// Create a new, empty recorder.
    pub fn new() -> Self {
        Self::default()
    }

    /// Get a clone of the recorded reports.
    pub fn reports(&self) -> Vec<Report> {
        lock(&self.reports).clone()
    }

    /// Number of recorded reports of `kind`.
    pub fn count(&self, kind: ErrorKind) -> usize {
        lock(&self.reports).iter().filter(|r| r.kind == kind).count()
    }

    /// Whether nothing was reported.
    pub fn is_empty(&self) -> bool {
        lock(&self.reports).is_empty()
    }

    /// Clear all recorded reports.
    pub fn clear(&self) {
        lock(&self.reports).clear();
    }
}

impl Reporter for RecordingReporter {
    fn report(&self, report: Report) {
        lock(&self.reports).push(report);
    }
}

// ============================================================================
// Stage Log / Recording Behavior
// ============================================================================

/// A shared log of `"<component>:<stage>"` entries and the value each stage received.
#[derive(Clone, Default)]
pub struct StageLog {
    entries: Arc<Mutex<Vec<(String, Value)>>>,
}

impl StageLog {
    /// Create a new, empty log.
    pub fn new() -> Self {
        Self::default()
    }

    /// Append an entry.
    pub fn record(&self, entry: impl Into<String>, input: Value) {
        lock(&self.entries).push((entry.into(), input));
    }

    /// The entries, in the order the stages ran.
    pub fn entries(&self) -> Vec<String> {
        lock(&self.entries).iter().map(|(e, _)| e.clone()).collect()
    }

    /// The input each stage received, in the order the stages ran.
    pub fn inputs(&self) -> Vec<Value> {
        lock(&self.entries).iter().map(|(_, v)| v.clone()).collect()
    }

    /// Entries recorded for `component`.
    pub fn entries_for(&self, component: &str) -> Vec<String> {
        let prefix = format!("{component}:");
        self.entries()
            .into_iter()
            .filter(|e| e.starts_with(&prefix))
            .collect()
    }

    /// A module constructing [`RecordingBehavior`]s that write to this log.
    pub fn module(&self) -> Module {
        RecordingBehavior::module(self.clone())
    }
}

/// A behavior that logs every stage of its chain and settles each with
/// the stage's log entry as a string.
pub struct RecordingBehavior {
    log: StageLog,
    name: String,
    defaults: Options,
    chain: Vec<Stage>,
}

impl RecordingBehavior {
    /// A behavior named `name` running the default chain.
    pub fn new(log: StageLog, name: impl Into<String>) -> Self {
        Self {
            log,
            name: name.into(),
            defaults: Options::new(),
            chain: Stage::DEFAULT_CHAIN.to_vec(),
        }
    }

    /// Replace the chain.
    pub fn with_chain(mut self, chain: Vec<Stage>) -> Self {
        self.chain = chain;
        self
    }

    /// Replace the default options. Non-object values are ignored.
    pub fn with_defaults(mut self, defaults: Value) -> Self {
        if let Value::Object(defaults) = defaults {
            self.defaults = defaults;
        }
        self
    }

    /// A module naming each behavior after its descriptor.
    pub fn module(log: StageLog) -> Module {
        Module::from_fn(move |d: &ComponentDescriptor| RecordingBehavior::new(log.clone(), d.label()))
    }

    /// Like [`module`](Self::module), with default options.
    pub fn module_with_defaults(log: StageLog, defaults: Value) -> Module {
        Module::from_fn(move |d: &ComponentDescriptor| {
            RecordingBehavior::new(log.clone(), d.label()).with_defaults(defaults.clone())
        })
    }
}

impl Behavior for RecordingBehavior {
    fn defaults(&self) -> Options {
        self.defaults.clone()
    }

    fn chain(&self) -> Vec<Stage> {
        self.chain.clone()
    }

    fn stage<'a>(
        &'a self,
        stage: &Stage,
        _cx: &'a ComponentContext,
        input: Value,
    ) -> Option<StageFuture<'a>> {
        let entry = format!("{}:{}", self.name, stage);
        self.log.record(entry.clone(), input);
        Some(Box::pin(future::ready(Ok::<_, BoxError>(Value::String(entry)))))
    }
}

// ============================================================================
// Failing Behavior
// ============================================================================

/// A behavior whose chain rejects at a chosen stage.
///
/// Stages before it settle like [`RecordingBehavior`]'s; stages after it
/// never run.
pub struct FailingBehavior {
    log: StageLog,
    name: String,
    fail_at: Stage,
}

impl FailingBehavior {
    /// A behavior named `name` failing at `fail_at`.
    pub fn new(log: StageLog, name: impl Into<String>, fail_at: Stage) -> Self {
        Self {
            log,
            name: name.into(),
            fail_at,
        }
    }

    /// A module naming each behavior after its descriptor.
    pub fn module(log: StageLog, fail_at: Stage) -> Module {
        Module::from_fn(move |d: &ComponentDescriptor| {
            FailingBehavior::new(log.clone(), d.label(), fail_at.clone())
        })
    }
}

impl Behavior for FailingBehavior {
    fn stage<'a>(
        &'a self,
        stage: &Stage,
        _cx: &'a ComponentContext,
        input: Value,
    ) -> Option<StageFuture<'a>> {
        let entry = format!("{}:{}", self.name, stage);
        self.log.record(entry.clone(), input);
        let result = if *stage == self.fail_at {
            Err(BoxError::from(format!("{entry} failed")))
        } else {
            Ok(json!(entry))
        };
        Some(Box::pin(future::ready(result)))
    }
}

/// A behavior that panics while a chosen stage is being awaited.
pub struct PanickingBehavior {
    log: StageLog,
    name: String,
    panic_at: Stage,
}

impl PanickingBehavior {
    /// A module naming each behavior after its descriptor.
    pub fn module(log: StageLog, panic_at: Stage) -> Module {
        Module::from_fn(move |d: &ComponentDescriptor| PanickingBehavior {
            log: log.clone(),
            name: d.label(),
            panic_at: panic_at.clone(),
        })
    }
}

impl Behavior for PanickingBehavior {
    fn stage<'a>(
        &'a self,
        stage: &Stage,
        _cx: &'a ComponentContext,
        input: Value,
    ) -> Option<StageFuture<'a>> {
        let entry = format!("{}:{}", self.name, stage);
        self.log.record(entry.clone(), input);
        let panics = *stage == self.panic_at;
        Some(Box::pin(async move {
            if panics {
                panic!("{entry} panicked");
            }
            Ok::<_, BoxError>(json!(entry))
        }))
    }
}

// ============================================================================
// Manual Condition
// ============================================================================

/// A condition that keeps every load handle it is given until the test
/// fires or releases them.
#[derive(Clone, Default)]
pub struct ManualCondition {
    handles: Arc<Mutex<Vec<(Element, LoadHandle)>>>,
}

impl ManualCondition {
    /// Create a new condition with no installed handles.
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of installations.
    pub fn installed(&self) -> usize {
        lock(&self.handles).len()
    }

    /// Number of handles not fired yet.
    pub fn pending(&self) -> usize {
        lock(&self.handles)
            .iter()
            .filter(|(_, h)| !h.is_loaded())
            .count()
    }

    /// Fire every handle; returns how many are held.
    pub fn fire(&self) -> usize {
        let handles: Vec<LoadHandle> = lock(&self.handles).iter().map(|(_, h)| h.clone()).collect();
        for handle in &handles {
            handle.load();
        }
        handles.len()
    }

    /// Fire the handles installed for `element`; returns how many fired.
    pub fn fire_for(&self, element: &Element) -> usize {
        let handles: Vec<LoadHandle> = lock(&self.handles)
            .iter()
            .filter(|(e, _)| e == element)
            .map(|(_, h)| h.clone())
            .collect();
        for handle in &handles {
            handle.load();
        }
        handles.len()
    }

    /// Drop every held handle without firing it.
    pub fn release(&self) {
        lock(&self.handles).clear();
    }
}

impl Condition for ManualCondition {
    fn install(&self, load: LoadHandle, element: &Element) -> Result<(), BoxError> {
        lock(&self.handles).push((element.clone(), load));
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_module_table_counts_calls() {
        let table = ModuleTable::new().with("a", StageLog::new().module());
        assert!(table.resolve("a").await.is_ok());
        let err = table.resolve("b").await.unwrap_err();
        assert_eq!(err.to_string(), "no module registered under `b`");
        assert_eq!(table.clone().calls(), 2);
    }

    #[test]
    fn test_recording_reporter_shares_record() {
        let reporter = RecordingReporter::new();
        let clone = reporter.clone();
        clone.report(Report::new(ErrorKind::ConditionNotDefined));
        assert_eq!(reporter.count(ErrorKind::ConditionNotDefined), 1);
        reporter.clear();
        assert!(clone.is_empty());
    }
}
