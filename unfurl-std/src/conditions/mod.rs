//! # Condition Sets and Gating
//!
//! A [`ConditionSet`] maps names to [`Condition`]s. The loader merges the
//! host's set over [`ConditionSet::builtin`]; on a name clash the host wins.
//!
//! [`dispatch`] is the narrow boundary around a single condition: a missing
//! name, an error or a panic is reported and confined to that one component.

mod in_viewport;

pub use in_viewport::{IN_VIEWPORT, in_viewport};

use std::{
    any::Any,
    collections::HashMap,
    fmt,
    panic::{AssertUnwindSafe, catch_unwind},
    sync::Arc,
};
use unfurl_core::{
    Condition, ConditionError, ComponentDescriptor, Element, ErrorKind, LoadHandle, Report,
    Reporter,
};

/// Named load conditions.
#[derive(Clone, Default)]
pub struct ConditionSet {
    conditions: HashMap<String, Arc<dyn Condition>>,
}

impl ConditionSet {
    /// An empty set.
    pub fn new() -> Self {
        Self::default()
    }

    /// The conditions every loader knows: `inViewport`.
    pub fn builtin() -> Self {
        let mut set = Self::new();
        set.insert(IN_VIEWPORT, in_viewport);
        set
    }

    /// Add or replace a condition.
    pub fn insert(&mut self, name: impl Into<String>, condition: impl Condition) -> &mut Self {
        self.conditions.insert(name.into(), Arc::new(condition));
        self
    }

    /// Overlay `other`; its entries replace same-named ones.
    pub fn merge(mut self, other: ConditionSet) -> Self {
        self.conditions.extend(other.conditions);
        self
    }

    /// Look up a condition.
    pub fn get(&self, name: &str) -> Option<&Arc<dyn Condition>> {
        self.conditions.get(name)
    }

    /// Whether `name` is defined.
    pub fn contains(&self, name: &str) -> bool {
        self.conditions.contains_key(name)
    }

    /// Defined names, sorted.
    pub fn names(&self) -> Vec<&str> {
        let mut names: Vec<&str> = self.conditions.keys().map(String::as_str).collect();
        names.sort_unstable();
        names
    }

    /// Number of defined conditions.
    pub fn len(&self) -> usize {
        self.conditions.len()
    }

    /// Whether no condition is defined.
    pub fn is_empty(&self) -> bool {
        self.conditions.is_empty()
    }
}

impl fmt::Debug for ConditionSet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_set().entries(self.names()).finish()
    }
}

/// Install `condition` for `element`, guarding `load` so it runs at most once.
///
/// Panics inside the predicate are caught and returned as
/// [`ConditionError::Panicked`].
pub fn gate(
    condition: &dyn Condition,
    name: &str,
    load: impl FnOnce() + Send + 'static,
    element: &Element,
) -> Result<LoadHandle, ConditionError> {
    let handle = LoadHandle::new(load);
    let installed = catch_unwind(AssertUnwindSafe(|| {
        condition.install(handle.clone(), element)
    }));
    match installed {
        Ok(Ok(())) => Ok(handle),
        Ok(Err(source)) => Err(ConditionError::Failed {
            name: name.to_owned(),
            source,
        }),
        Err(payload) => Err(ConditionError::Panicked {
            name: name.to_owned(),
            message: panic_message(payload.as_ref()),
        }),
    }
}

pub(crate) fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(message) = payload.downcast_ref::<&str>() {
        (*message).to_owned()
    } else if let Some(message) = payload.downcast_ref::<String>() {
        message.clone()
    } else {
        "non-string panic payload".to_owned()
    }
}

/// What happened when a component's condition was dispatched.
#[derive(Debug)]
pub enum GateOutcome {
    /// The predicate was installed; the load fires when it says so.
    Installed(LoadHandle),
    /// The condition name is not in the set; the component is never loaded.
    NotDefined,
    /// The predicate failed or panicked; the component is never loaded.
    Failed,
}

/// Look up `name` in `conditions` and gate `load` behind it.
///
/// Failures are reported with the descriptor attached and never propagate.
pub fn dispatch(
    conditions: &ConditionSet,
    name: &str,
    load: impl FnOnce() + Send + 'static,
    descriptor: &ComponentDescriptor,
    reporter: &dyn Reporter,
) -> GateOutcome {
    let Some(condition) = conditions.get(name) else {
        reporter.report(
            Report::new(ErrorKind::ConditionNotDefined)
                .with_component(descriptor)
                .with_cause(ConditionError::NotDefined(name.to_owned())),
        );
        return GateOutcome::NotDefined;
    };
    match gate(condition.as_ref(), name, load, descriptor.element()) {
        Ok(handle) => {
            tracing::debug!(component = %descriptor, condition = name, "condition installed");
            GateOutcome::Installed(handle)
        }
        Err(err) => {
            reporter.report(
                Report::new(ErrorKind::ConditionExecutionFailed)
                    .with_component(descriptor)
                    .with_cause(&err),
            );
            GateOutcome::Failed
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{ManualCondition, RecordingReporter};
    use std::sync::atomic::{AtomicUsize, Ordering};
    use unfurl_core::{BoxError, Document, Metadata, condition_fn};

    fn descriptor() -> Arc<ComponentDescriptor> {
        let doc = Document::new();
        let el = doc.root().append_child("div", [("data-ds-component", "x")]);
        ComponentDescriptor::discover(el, Metadata::new(), None, "done")
    }

    fn counting() -> (Arc<AtomicUsize>, impl FnOnce() + Send + 'static) {
        let count = Arc::new(AtomicUsize::new(0));
        let inner = count.clone();
        (count, move || {
            inner.fetch_add(1, Ordering::SeqCst);
        })
    }

    #[test]
    fn test_host_wins_on_merge() {
        let host_called = Arc::new(AtomicUsize::new(0));
        let inner = host_called.clone();
        let mut host = ConditionSet::new();
        host.insert(
            IN_VIEWPORT,
            condition_fn(move |load, _| {
                inner.fetch_add(1, Ordering::SeqCst);
                load.load();
                Ok(())
            }),
        );
        let set = ConditionSet::builtin().merge(host);
        assert_eq!(set.names(), [IN_VIEWPORT]);

        let (count, load) = counting();
        let d = descriptor();
        let outcome = dispatch(&set, IN_VIEWPORT, load, &d, &RecordingReporter::new());
        assert!(matches!(outcome, GateOutcome::Installed(_)));
        assert_eq!(host_called.load(Ordering::SeqCst), 1);
        assert_eq!(count.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn test_undefined_is_reported() {
        let reporter = RecordingReporter::new();
        let (count, load) = counting();
        let d = descriptor();
        let outcome = dispatch(&ConditionSet::new(), "nope", load, &d, &reporter);
        assert!(matches!(outcome, GateOutcome::NotDefined));
        assert_eq!(reporter.count(ErrorKind::ConditionNotDefined), 1);
        assert_eq!(count.load(Ordering::SeqCst), 0);
    }

    #[test]
    fn test_error_and_panic_are_contained() {
        let mut set = ConditionSet::new();
        set.insert(
            "throws",
            condition_fn(|_, _| Err(BoxError::from("no"))),
        );
        set.insert("panics", condition_fn(|_, _| panic!("exploded")));

        let reporter = RecordingReporter::new();
        let d = descriptor();
        let (count, load) = counting();
        assert!(matches!(dispatch(&set, "throws", load, &d, &reporter), GateOutcome::Failed));
        let (_, load) = counting();
        assert!(matches!(dispatch(&set, "panics", load, &d, &reporter), GateOutcome::Failed));

        assert_eq!(reporter.count(ErrorKind::ConditionExecutionFailed), 2);
        assert!(reporter.reports()[1].cause.as_deref().unwrap().contains("exploded"));
        assert_eq!(count.load(Ordering::SeqCst), 0);
    }

    #[test]
    fn test_gate_fires_once() {
        let manual = ManualCondition::new();
        let mut set = ConditionSet::new();
        set.insert("manual", manual.clone());

        let (count, load) = counting();
        let d = descriptor();
        dispatch(&set, "manual", load, &d, &RecordingReporter::new());
        assert_eq!(count.load(Ordering::SeqCst), 0);
        assert_eq!(manual.fire(), 1);
        assert_eq!(manual.fire(), 1);
        assert_eq!(count.load(Ordering::SeqCst), 1);
    }
}
