//! # Build Chains
//!
//! Running a behavior's stages in order, threading each stage's value into
//! the next, and turning the chain into a shareable completion.

use crate::conditions::panic_message;
use futures::FutureExt;
use serde_json::Value;
use std::{
    panic::{AssertUnwindSafe, catch_unwind},
    sync::Arc,
};
use tracing::Instrument;
use unfurl_core::{
    Behavior, BuildError, ComponentContext, ComponentDescriptor, ComponentInstance, ErrorKind,
    Module, Report, Reporter, merge_options,
};

/// A constructed behavior and the context its stages run in.
pub struct BuildChain {
    behavior: Arc<dyn Behavior>,
    context: Arc<ComponentContext>,
}

impl BuildChain {
    /// Pair `behavior` with its context.
    pub fn new(behavior: Arc<dyn Behavior>, context: Arc<ComponentContext>) -> Self {
        Self { behavior, context }
    }

    /// The context stages see.
    pub fn context(&self) -> &Arc<ComponentContext> {
        &self.context
    }

    /// Run every stage of the context's chain.
    ///
    /// The first stage receives `Value::Null`. A stage the behavior does not
    /// define is skipped and the value passes through. The first failing or
    /// panicking stage ends the chain; later stages never run.
    pub async fn run(&self) -> Result<Value, BuildError> {
        let mut last = Value::Null;
        for stage in self.context.chain() {
            let started = catch_unwind(AssertUnwindSafe(|| {
                self.behavior.stage(stage, &self.context, last.clone())
            }));
            let pending = match started {
                Ok(Some(pending)) => pending,
                Ok(None) => {
                    tracing::trace!(%stage, "stage not defined, skipped");
                    continue;
                }
                Err(payload) => {
                    return Err(BuildError::StagePanicked {
                        stage: stage.clone(),
                        message: panic_message(payload.as_ref()),
                    });
                }
            };
            last = match AssertUnwindSafe(pending).catch_unwind().await {
                Ok(Ok(value)) => value,
                Ok(Err(e)) => {
                    return Err(BuildError::StageFailed {
                        stage: stage.clone(),
                        source: Arc::from(e),
                    });
                }
                Err(payload) => {
                    return Err(BuildError::StagePanicked {
                        stage: stage.clone(),
                        message: panic_message(payload.as_ref()),
                    });
                }
            };
            tracing::trace!(%stage, "stage settled");
        }
        Ok(last)
    }
}

/// Construct `module` against `descriptor` and wrap its build chain.
///
/// The behavior's defaults are merged with the element's `options`
/// metadata. The returned instance's completion drives the chain when first
/// polled; a failed chain is reported once as
/// [`ErrorKind::ComponentInitFailed`]. A constructor that panics is reported
/// the same way and yields no instance.
pub fn instantiate(
    module: &Module,
    descriptor: &Arc<ComponentDescriptor>,
    reporter: Arc<dyn Reporter>,
) -> Result<Arc<ComponentInstance>, BuildError> {
    let label = descriptor.label();
    let constructed = catch_unwind(AssertUnwindSafe(|| {
        let behavior: Arc<dyn Behavior> = Arc::from(module.construct(descriptor));
        let options = merge_options(behavior.defaults(), descriptor.options());
        let context = Arc::new(ComponentContext::new(descriptor, options, behavior.chain()));
        BuildChain::new(behavior, context)
    }));
    let chain = match constructed {
        Ok(chain) => chain,
        Err(payload) => {
            let err = BuildError::ConstructPanicked {
                message: panic_message(payload.as_ref()),
            };
            reporter.report(
                Report::new(ErrorKind::ComponentInitFailed)
                    .with_label(label)
                    .with_cause(&err),
            );
            return Err(err);
        }
    };
    let context = chain.context().clone();

    let span = tracing::info_span!("build_chain", component = %label);
    let completion = async move {
        let outcome = chain.run().await;
        if let Err(err) = &outcome {
            reporter.report(
                Report::new(ErrorKind::ComponentInitFailed)
                    .with_label(label)
                    .with_cause(err),
            );
        }
        outcome
    }
    .instrument(span)
    .boxed()
    .shared();

    Ok(Arc::new(ComponentInstance::new(context, completion)))
}
