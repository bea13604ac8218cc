//! Constructed components: the context a behavior runs in and the instance
//! that tracks its build chain.

use crate::{
    behavior::{Options, Stage},
    descriptor::ComponentDescriptor,
    error::BuildError,
    markup::Element,
};
use futures::future::{BoxFuture, Shared};
use serde_json::Value;
use std::{
    fmt,
    sync::{Arc, Weak},
};

/// The outcome of a build chain: the final stage's value, or the failure.
pub type BuildOutcome = Result<Value, BuildError>;

/// A single-resolution future over a build chain.
///
/// Clones observe the same chain; once settled every clone yields the same outcome.
pub type Completion = Shared<BoxFuture<'static, BuildOutcome>>;

/// Everything a behavior's stages can see about the component they build.
///
/// Options are merged once at construction and never change afterwards.
pub struct ComponentContext {
    element: Element,
    descriptor: Weak<ComponentDescriptor>,
    options: Options,
    chain: Vec<Stage>,
}

impl ComponentContext {
    /// Create the context for `descriptor`.
    pub fn new(descriptor: &Arc<ComponentDescriptor>, options: Options, chain: Vec<Stage>) -> Self {
        Self {
            element: descriptor.element().clone(),
            descriptor: Arc::downgrade(descriptor),
            options,
            chain,
        }
    }

    /// The element being enhanced.
    pub fn element(&self) -> &Element {
        &self.element
    }

    /// The owning descriptor, while it is alive.
    pub fn descriptor(&self) -> Option<Arc<ComponentDescriptor>> {
        self.descriptor.upgrade()
    }

    /// Merged options.
    pub fn options(&self) -> &Options {
        &self.options
    }

    /// One merged option.
    pub fn option(&self, key: &str) -> Option<&Value> {
        self.options.get(key)
    }

    /// The stages this component runs, in order.
    pub fn chain(&self) -> &[Stage] {
        &self.chain
    }
}

impl fmt::Debug for ComponentContext {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ComponentContext")
            .field("element", &self.element)
            .field("options", &self.options)
            .field("chain", &self.chain)
            .finish()
    }
}

/// Shallow-merge `overrides` over `defaults`; keys in `overrides` win.
pub fn merge_options(mut defaults: Options, overrides: Option<&Options>) -> Options {
    if let Some(overrides) = overrides {
        for (key, value) in overrides {
            defaults.insert(key.clone(), value.clone());
        }
    }
    defaults
}

/// One constructed behavior and the completion of its build chain.
pub struct ComponentInstance {
    context: Arc<ComponentContext>,
    completion: Completion,
}

impl ComponentInstance {
    /// Pair a context with the completion of its build chain.
    pub fn new(context: Arc<ComponentContext>, completion: Completion) -> Self {
        Self {
            context,
            completion,
        }
    }

    /// The component's context.
    pub fn context(&self) -> &ComponentContext {
        &self.context
    }

    /// Merged options.
    pub fn options(&self) -> &Options {
        self.context.options()
    }

    /// A handle on the build chain's completion. Awaiting it drives the chain.
    pub fn completion(&self) -> Completion {
        self.completion.clone()
    }

    /// The settled outcome, or `None` while the chain is still pending.
    pub fn outcome(&self) -> Option<BuildOutcome> {
        self.completion.peek().cloned()
    }

    /// Whether the chain has settled.
    pub fn is_settled(&self) -> bool {
        self.completion.peek().is_some()
    }
}

impl fmt::Debug for ComponentInstance {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ComponentInstance")
            .field("context", &self.context)
            .field("settled", &self.is_settled())
            .finish()
    }
}
