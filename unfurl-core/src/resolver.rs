//! # Module Resolution
//!
//! Behavior modules are looked up by path through a [`ModuleResolver`]. The
//! loader resolves every path of a descriptor concurrently, then constructs
//! the resolved behaviors in path order.
//!
//! The resolver is the host's seam: it may fetch, compile or simply look a
//! path up in a table. Test doubles usually answer synchronously.

use crate::{behavior::Behavior, descriptor::ComponentDescriptor, error::BoxError};
use futures::future::BoxFuture;
use std::{fmt, future::Future, sync::Arc};

/// Constructs a behavior for a descriptor.
pub type BehaviorFactory =
    Arc<dyn Fn(&ComponentDescriptor) -> Box<dyn Behavior> + Send + Sync + 'static>;

/// The pending result of resolving one module path.
pub type ResolveFuture = BoxFuture<'static, Result<Module, BoxError>>;

/// A resolved behavior module.
#[derive(Clone)]
pub struct Module {
    constructor: BehaviorFactory,
}

impl Module {
    /// A module from a factory returning boxed behaviors.
    pub fn new<F>(constructor: F) -> Self
    where
        F: Fn(&ComponentDescriptor) -> Box<dyn Behavior> + Send + Sync + 'static,
    {
        Self {
            constructor: Arc::new(constructor),
        }
    }

    /// A module from a factory returning a concrete behavior.
    pub fn from_fn<F, B>(constructor: F) -> Self
    where
        F: Fn(&ComponentDescriptor) -> B + Send + Sync + 'static,
        B: Behavior,
    {
        Self::new(move |descriptor| Box::new(constructor(descriptor)))
    }

    /// A module constructing `B::default()`.
    pub fn of<B: Behavior + Default>() -> Self {
        Self::new(|_| Box::new(B::default()))
    }

    /// Construct the behavior for `descriptor`.
    pub fn construct(&self, descriptor: &ComponentDescriptor) -> Box<dyn Behavior> {
        (self.constructor)(descriptor)
    }
}

impl fmt::Debug for Module {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Module").finish_non_exhaustive()
    }
}

/// Resolves a module path to a behavior module.
#[diagnostic::on_unimplemented(
    message = "`{Self}` is not a `ModuleResolver`",
    label = "missing `ModuleResolver` implementation",
    note = "Resolvers map a module path to a `Module`; closures `Fn(&str) -> impl Future` also work."
)]
pub trait ModuleResolver: Send + Sync + 'static {
    /// Start resolving `path`.
    fn resolve(&self, path: &str) -> ResolveFuture;
}

impl<F, Fut> ModuleResolver for F
where
    F: Fn(&str) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = Result<Module, BoxError>> + Send + 'static,
{
    fn resolve(&self, path: &str) -> ResolveFuture {
        Box::pin((self)(path))
    }
}
