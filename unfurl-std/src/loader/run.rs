//! Awaiting a run: draining load requests, driving build chains and
//! aggregating outcomes.

use super::{Loader, LoaderInner, RunState, lock};
use futures::{
    FutureExt, Stream, StreamExt,
    channel::mpsc,
    future::{self, BoxFuture, Either},
    stream::FuturesUnordered,
};
use std::{future::IntoFuture, sync::Arc};
use unfurl_core::{BuildError, BuildOutcome, ComponentInstance, ResolveError, RunError};

/// One pending load: resolution, construction and the sweep that follows.
pub(super) type LoadFuture = BoxFuture<'static, LoadOutcome>;

pub(super) enum LoadOutcome {
    Constructed {
        instances: Vec<Arc<ComponentInstance>>,
        failures: Vec<BuildError>,
    },
    Failed(ResolveError),
}

/// A load or a build chain that settled.
enum Progress {
    Loaded(LoadOutcome),
    Built(BuildOutcome),
}

type InFlight = FuturesUnordered<BoxFuture<'static, Progress>>;

#[derive(Default)]
pub(super) struct Tally {
    pub(super) loaded: usize,
    pub(super) instances: Vec<Arc<ComponentInstance>>,
    pub(super) resolution: Vec<ResolveError>,
    pub(super) build: Vec<BuildError>,
    loads: usize,
}

impl Tally {
    fn start(&mut self, in_flight: &InFlight, load: LoadFuture) {
        self.loads += 1;
        in_flight.push(load.map(Progress::Loaded).boxed());
    }

    fn record(&mut self, in_flight: &InFlight, progress: Progress) {
        match progress {
            Progress::Loaded(outcome) => {
                self.loads -= 1;
                self.loaded += 1;
                match outcome {
                    LoadOutcome::Constructed {
                        instances,
                        failures,
                    } => {
                        for instance in &instances {
                            in_flight.push(instance.completion().map(Progress::Built).boxed());
                        }
                        self.instances.extend(instances);
                        self.build.extend(failures);
                    }
                    LoadOutcome::Failed(err) => self.resolution.push(err),
                }
            }
            Progress::Built(outcome) => {
                if let Err(err) = outcome {
                    self.build.push(err);
                }
            }
        }
    }

    fn phase(&self) -> RunState {
        if self.loads > 0 {
            RunState::AwaitingLoads
        } else {
            RunState::AwaitingBuilds
        }
    }
}

/// Drive `queued` and every request taken from `requests` until nothing is
/// in flight.
///
/// A build chain starts as soon as its load has constructed it, so a load
/// that never settles holds back only its own component. Requests already
/// queued on the stream are always taken; draining stops once no load or
/// chain is pending, even if senders are still alive.
pub(super) async fn drain<S>(
    inner: &LoaderInner,
    queued: Vec<LoadFuture>,
    requests: &mut S,
) -> Tally
where
    S: Stream<Item = LoadFuture> + Unpin,
{
    let mut in_flight = InFlight::new();
    let mut tally = Tally::default();
    let mut closed = false;
    let mut phase = RunState::AwaitingLoads;

    for load in queued {
        tally.start(&in_flight, load);
    }

    loop {
        while !closed {
            match requests.next().now_or_never() {
                Some(Some(load)) => tally.start(&in_flight, load),
                Some(None) => closed = true,
                None => break,
            }
        }

        if in_flight.is_empty() {
            break;
        }
        if tally.phase() != phase {
            phase = tally.phase();
            inner.transition(phase);
        }

        if closed {
            if let Some(progress) = in_flight.next().await {
                tally.record(&in_flight, progress);
            }
            continue;
        }

        let step = match future::select(in_flight.next(), requests.next()).await {
            Either::Left((progress, _)) => Either::Left(progress),
            Either::Right((request, _)) => Either::Right(request),
        };
        match step {
            Either::Left(Some(progress)) => tally.record(&in_flight, progress),
            Either::Left(None) => {}
            Either::Right(Some(load)) => tally.start(&in_flight, load),
            Either::Right(None) => closed = true,
        }
    }
    tally
}

/// What a successful run produced.
#[derive(Debug, Default)]
pub struct RunSummary {
    loaded: usize,
    instances: Vec<Arc<ComponentInstance>>,
}

impl RunSummary {
    pub(super) fn new(loaded: usize, instances: Vec<Arc<ComponentInstance>>) -> Self {
        Self { loaded, instances }
    }

    /// Number of loads that settled.
    pub fn loaded(&self) -> usize {
        self.loaded
    }

    /// Every instance built, in the order their loads settled.
    pub fn instances(&self) -> &[Arc<ComponentInstance>] {
        &self.instances
    }
}

/// A scanned run, waiting to be driven.
///
/// Await it to drive every load and build chain to completion. Condition
/// handles fired after the run settles are picked up by
/// [`Loader::drive_deferred`].
#[must_use = "loads and build chains only progress while the run is awaited"]
pub struct Run {
    loader: Loader,
    requests: mpsc::UnboundedReceiver<LoadFuture>,
}

impl Run {
    pub(super) fn new(loader: Loader, requests: mpsc::UnboundedReceiver<LoadFuture>) -> Self {
        Self { loader, requests }
    }

    /// The loader this run belongs to.
    pub fn loader(&self) -> &Loader {
        &self.loader
    }
}

impl IntoFuture for Run {
    type Output = Result<RunSummary, RunError>;
    type IntoFuture = BoxFuture<'static, Self::Output>;

    fn into_future(self) -> Self::IntoFuture {
        let Run {
            loader,
            mut requests,
        } = self;
        async move {
            let tally = drain(&loader.inner, Vec::new(), &mut requests).await;
            lock(&loader.inner.parked).park([requests]);
            loader.inner.finish(tally)
        }
        .boxed()
    }
}
