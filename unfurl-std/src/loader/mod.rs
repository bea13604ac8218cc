//! # The Loader
//!
//! [`Loader`] drives a whole enhancement pass over a document:
//!
//! 1. **Scanning**: the [`TreeWalker`] is drained synchronously. Every
//!    descriptor is either loaded at once or gated behind its condition.
//! 2. **Awaiting loads**: each load resolves all behavior paths of its
//!    descriptor concurrently, then constructs the behaviors in path order
//!    and sweeps the element's subtree for markup the constructors added.
//!    Each constructed instance's build chain starts right away.
//! 3. **Awaiting builds**: no load is pending; the remaining build chains
//!    are awaited.
//! 4. **Settled**: the run succeeds only if nothing failed.
//!
//! ```rust,ignore
//! let loader = Loader::builder(document)
//!     .resolver(ModuleTable::new().with("carousel", Module::of::<Carousel>()))
//!     .build()?;
//!
//! let summary = loader.run().await?;
//! ```
//!
//! Failures never escape a single component: they are reported through the
//! loader's [`Reporter`] and collected into the run's [`RunError`].

mod run;

pub use run::{Run, RunSummary};

use crate::{
    chain::instantiate,
    conditions::{ConditionSet, GateOutcome, dispatch},
    config::{LoaderConfig, ScanRules},
    reporter::TracingReporter,
    walker::TreeWalker,
};
use futures::{FutureExt, StreamExt, TryFutureExt, channel::mpsc, future, stream};
use run::{LoadFuture, LoadOutcome};
use std::{
    fmt,
    sync::{Arc, Mutex, MutexGuard, PoisonError},
};
use unfurl_core::{
    BoxError, ComponentDescriptor, Condition, ConfigError, Document, Element, ErrorKind,
    ModuleResolver, Report, Reporter, ResolveError, RunError, UnfurlError,
};

/// Whether a settled run succeeded.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Outcome {
    /// Every load and every build chain succeeded.
    Success,
    /// At least one resolution or build chain failed.
    Failure,
}

/// Where the most recent run is.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum RunState {
    /// No run has started.
    #[default]
    Idle,
    /// The tree is being walked.
    Scanning,
    /// Waiting for queued loads to resolve and construct.
    AwaitingLoads,
    /// Waiting for build chains.
    AwaitingBuilds,
    /// Done.
    Settled(Outcome),
}

/// Discovers, loads and builds the components of one document.
///
/// Cloning is cheap; clones share state.
#[derive(Clone)]
pub struct Loader {
    inner: Arc<LoaderInner>,
}

struct LoaderInner {
    rules: ScanRules,
    scan_root: Element,
    conditions: ConditionSet,
    resolver: Arc<dyn ModuleResolver>,
    reporter: Arc<dyn Reporter>,
    components: Mutex<Vec<Arc<ComponentDescriptor>>>,
    discovered: Mutex<Vec<Arc<ComponentDescriptor>>>,
    state: Mutex<RunState>,
    parked: Mutex<Parked>,
}

/// Request streams of settled runs whose load handles may still fire.
#[derive(Default)]
struct Parked {
    streams: Vec<mpsc::UnboundedReceiver<LoadFuture>>,
    queued: Vec<LoadFuture>,
}

impl Parked {
    /// Keep `streams`, taking whatever they already hold and dropping every
    /// stream whose senders are all gone.
    fn park(&mut self, streams: impl IntoIterator<Item = mpsc::UnboundedReceiver<LoadFuture>>) {
        let Parked { streams: kept, queued } = self;
        kept.extend(streams);
        kept.retain_mut(|stream| loop {
            match stream.next().now_or_never() {
                Some(Some(load)) => queued.push(load),
                Some(None) => break false,
                None => break true,
            }
        });
    }

    fn is_empty(&self) -> bool {
        self.streams.is_empty() && self.queued.is_empty()
    }
}

impl Loader {
    /// Start configuring a loader for `document`.
    pub fn builder(document: Document) -> LoaderBuilder {
        LoaderBuilder::new(document)
    }

    /// Scan the tree and start every unconditional load.
    ///
    /// Scanning happens before this returns: every discovered element is
    /// already marked processed and every condition is installed. Awaiting
    /// the returned [`Run`] drives the loads and build chains.
    pub fn run(&self) -> Run {
        self.inner.transition(RunState::Scanning);
        let (requests, incoming) = mpsc::unbounded();
        self.inner
            .scan(self.inner.scan_root.clone(), None, &requests);
        self.inner.transition(RunState::AwaitingLoads);
        Run::new(self.clone(), incoming)
    }

    /// Process loads fired by conditions after their run settled.
    ///
    /// Takes every load fired so far, and any fired while draining, and
    /// resolves once those loads and their build chains have settled. Handles
    /// that have not fired stay parked for a later call. With nothing
    /// outstanding it resolves immediately.
    pub async fn drive_deferred(&self) -> Result<RunSummary, RunError> {
        let Parked {
            mut streams,
            queued,
        } = std::mem::take(&mut *lock(&self.inner.parked));
        if streams.is_empty() && queued.is_empty() {
            return Ok(RunSummary::default());
        }
        self.inner.transition(RunState::AwaitingLoads);
        let tally = {
            let mut requests = stream::select_all(streams.iter_mut());
            run::drain(&self.inner, queued, &mut requests).await
        };
        lock(&self.inner.parked).park(streams);
        self.inner.finish(tally)
    }

    /// Whether any run still has load handles that may fire.
    pub fn has_deferred(&self) -> bool {
        !lock(&self.inner.parked).is_empty()
    }

    /// Every descriptor whose load has been requested.
    pub fn components(&self) -> Vec<Arc<ComponentDescriptor>> {
        lock(&self.inner.components).clone()
    }

    /// Every descriptor discovered, loaded or not.
    pub fn discovered(&self) -> Vec<Arc<ComponentDescriptor>> {
        lock(&self.inner.discovered).clone()
    }

    /// State of the most recent run.
    pub fn state(&self) -> RunState {
        *lock(&self.inner.state)
    }

    /// The active condition set.
    pub fn conditions(&self) -> &ConditionSet {
        &self.inner.conditions
    }

    /// The compiled discovery rules.
    pub fn rules(&self) -> &ScanRules {
        &self.inner.rules
    }
}

impl fmt::Debug for Loader {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Loader")
            .field("rules", &self.inner.rules)
            .field("conditions", &self.inner.conditions)
            .field("state", &self.state())
            .finish_non_exhaustive()
    }
}

impl LoaderInner {
    fn transition(&self, next: RunState) {
        *lock(&self.state) = next;
        tracing::debug!(state = ?next, "run state");
    }

    fn scan(
        self: &Arc<Self>,
        root: Element,
        parent: Option<Arc<ComponentDescriptor>>,
        requests: &mpsc::UnboundedSender<LoadFuture>,
    ) {
        for descriptor in TreeWalker::new(root, parent, &self.rules, self.reporter.as_ref()) {
            lock(&self.discovered).push(descriptor.clone());
            match descriptor.condition() {
                Some(name) => self.defer(name, &descriptor, requests),
                None => enqueue(requests, self.load_component(&descriptor, requests)),
            }
        }
    }

    fn defer(
        self: &Arc<Self>,
        name: &str,
        descriptor: &Arc<ComponentDescriptor>,
        requests: &mpsc::UnboundedSender<LoadFuture>,
    ) {
        let loader = Arc::downgrade(self);
        let target = Arc::downgrade(descriptor);
        let requests = requests.clone();
        let load = move || {
            let (Some(inner), Some(target)) = (loader.upgrade(), target.upgrade()) else {
                return;
            };
            tracing::debug!(component = %target, "condition fired");
            enqueue(&requests, inner.load_component(&target, &requests));
        };
        match dispatch(&self.conditions, name, load, descriptor, self.reporter.as_ref()) {
            GateOutcome::Installed(_) => {}
            GateOutcome::NotDefined | GateOutcome::Failed => {
                tracing::debug!(component = %descriptor, condition = name, "load skipped");
            }
        }
    }

    fn load_component(
        self: &Arc<Self>,
        descriptor: &Arc<ComponentDescriptor>,
        requests: &mpsc::UnboundedSender<LoadFuture>,
    ) -> LoadFuture {
        lock(&self.components).push(descriptor.clone());
        if let Some(parent) = descriptor.parent() {
            parent.link_child(descriptor.clone());
        }
        tracing::debug!(component = %descriptor, "load requested");

        let resolving: Vec<_> = descriptor
            .behavior_paths()
            .iter()
            .map(|path| {
                let path = path.clone();
                self.resolver
                    .resolve(&path)
                    .map_err(move |e: BoxError| ResolveError::new(path, e))
                    .boxed()
            })
            .collect();

        let loader = Arc::downgrade(self);
        let reporter = self.reporter.clone();
        let requests = requests.clone();
        let descriptor = descriptor.clone();
        async move {
            let modules = match future::try_join_all(resolving).await {
                Ok(modules) => modules,
                Err(err) => {
                    reporter.report(
                        Report::new(ErrorKind::LoaderDynamicImportFailed)
                            .with_component(&descriptor)
                            .with_cause(&err),
                    );
                    return LoadOutcome::Failed(err);
                }
            };
            let mut instances = Vec::with_capacity(modules.len());
            let mut failures = Vec::new();
            for module in &modules {
                match instantiate(module, &descriptor, reporter.clone()) {
                    Ok(instance) => {
                        descriptor.set_instance(instance.clone());
                        instances.push(instance);
                    }
                    Err(err) => failures.push(err),
                }
            }
            tracing::debug!(component = %descriptor, instances = instances.len(), "constructed");

            if let Some(inner) = loader.upgrade() {
                inner.scan(descriptor.element().clone(), Some(descriptor.clone()), &requests);
            }
            LoadOutcome::Constructed {
                instances,
                failures,
            }
        }
        .boxed()
    }

    fn finish(&self, tally: run::Tally) -> Result<RunSummary, RunError> {
        let error = RunError {
            resolution: tally.resolution,
            build: tally.build,
        };

        if !error.build.is_empty() {
            self.reporter
                .report(Report::new(ErrorKind::LoaderComponentInitFailed).with_cause(&error));
        }
        if error.is_empty() {
            self.transition(RunState::Settled(Outcome::Success));
            Ok(RunSummary::new(tally.loaded, tally.instances))
        } else {
            self.transition(RunState::Settled(Outcome::Failure));
            Err(error)
        }
    }
}

fn enqueue(requests: &mpsc::UnboundedSender<LoadFuture>, load: LoadFuture) {
    if requests.unbounded_send(load).is_err() {
        tracing::debug!("load requested after its run stopped listening");
    }
}

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}

/// Configures a [`Loader`].
pub struct LoaderBuilder {
    document: Document,
    config: LoaderConfig,
    scan_root: Option<Element>,
    conditions: ConditionSet,
    resolver: Option<Arc<dyn ModuleResolver>>,
    reporter: Option<Arc<dyn Reporter>>,
}

impl LoaderBuilder {
    fn new(document: Document) -> Self {
        Self {
            document,
            config: LoaderConfig::default(),
            scan_root: None,
            conditions: ConditionSet::new(),
            resolver: None,
            reporter: None,
        }
    }

    /// Replace the configuration.
    pub fn config(mut self, config: LoaderConfig) -> Self {
        self.config = config;
        self
    }

    /// Scan below `root` instead of the document body.
    pub fn scan_root(mut self, root: Element) -> Self {
        self.scan_root = Some(root);
        self
    }

    /// Add a host condition. Host conditions replace built-ins of the same name.
    pub fn condition(mut self, name: impl Into<String>, condition: impl Condition) -> Self {
        self.conditions.insert(name, condition);
        self
    }

    /// Add a set of host conditions.
    pub fn conditions(mut self, conditions: ConditionSet) -> Self {
        self.conditions = self.conditions.merge(conditions);
        self
    }

    /// Set the module resolver. Required.
    pub fn resolver(mut self, resolver: impl ModuleResolver) -> Self {
        self.resolver = Some(Arc::new(resolver));
        self
    }

    /// Set the reporter. Defaults to a [`TracingReporter`].
    pub fn reporter(mut self, reporter: impl Reporter) -> Self {
        self.reporter = Some(Arc::new(reporter));
        self
    }

    /// Validate the configuration and build the loader.
    pub fn build(self) -> Result<Loader, UnfurlError> {
        let rules = self.config.rules()?;
        let resolver = self.resolver.ok_or(ConfigError::MissingResolver)?;
        let reporter: Arc<dyn Reporter> = match self.reporter {
            Some(reporter) => reporter,
            None if self.config.simple_logs => Arc::new(TracingReporter::simple()),
            None => Arc::new(TracingReporter::new()),
        };
        let scan_root = self
            .scan_root
            .or_else(|| self.document.body())
            .unwrap_or_else(|| self.document.root());
        let conditions = ConditionSet::builtin().merge(self.conditions);

        Ok(Loader {
            inner: Arc::new(LoaderInner {
                rules,
                scan_root,
                conditions,
                resolver,
                reporter,
                components: Mutex::new(Vec::new()),
                discovered: Mutex::new(Vec::new()),
                state: Mutex::new(RunState::Idle),
                parked: Mutex::new(Parked::default()),
            }),
        })
    }
}
