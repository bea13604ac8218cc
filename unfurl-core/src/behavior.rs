//! # Behaviors and the Build Chain Vocabulary
//!
//! A [`Behavior`] is the executable unit bound to a discovered element. After
//! construction its build chain runs: an ordered list of [`Stage`]s, each
//! dispatched to an optional hook on the behavior. The value a stage settles
//! with becomes the sole input of the next stage.
//!
//! Every hook defaults to "not defined" (`None`). An undefined stage is
//! skipped and the threaded value passes through untouched, so a behavior
//! only implements the stages it cares about.
//!
//! ```rust,ignore
//! struct Carousel;
//!
//! impl Behavior for Carousel {
//!     fn ready<'a>(&'a self, cx: &'a ComponentContext, _input: Value) -> Option<StageFuture<'a>> {
//!         Some(Box::pin(async move {
//!             cx.element().add_class("carousel--ready");
//!             Ok(json!({ "slides": 3 }))
//!         }))
//!     }
//! }
//! ```

use crate::{component::ComponentContext, error::BoxError};
use futures::future::BoxFuture;
use serde_json::Value;
use std::{borrow::Cow, fmt};

/// Options handed to a behavior: its defaults overlaid with the element's `options` metadata.
pub type Options = serde_json::Map<String, Value>;

/// The pending result of one stage.
pub type StageFuture<'a> = BoxFuture<'a, Result<Value, BoxError>>;

/// A named step of the build chain.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Stage {
    /// Initial setup.
    Ready,
    /// Event wiring.
    Events,
    /// A stage name defined by the behavior itself.
    Custom(Cow<'static, str>),
}

impl Stage {
    /// The chain every behavior runs unless it overrides [`Behavior::chain`].
    pub const DEFAULT_CHAIN: [Stage; 2] = [Stage::Ready, Stage::Events];

    /// A behavior-defined stage.
    pub fn custom(name: impl Into<Cow<'static, str>>) -> Self {
        Stage::Custom(name.into())
    }

    /// The stage name.
    pub fn name(&self) -> &str {
        match self {
            Stage::Ready => "ready",
            Stage::Events => "events",
            Stage::Custom(name) => name,
        }
    }
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl From<&str> for Stage {
    fn from(name: &str) -> Self {
        match name {
            "ready" => Stage::Ready,
            "events" => Stage::Events,
            other => Stage::Custom(Cow::Owned(other.to_owned())),
        }
    }
}

/// Wrap an already-known value as a settled stage result.
pub fn settled(value: Value) -> Option<StageFuture<'static>> {
    Some(Box::pin(futures::future::ready(Ok::<_, BoxError>(value))))
}

/// The capability interface every behavior implements.
///
/// # Stage dispatch
///
/// The build chain calls [`stage`](Self::stage) for each entry of
/// [`chain`](Self::chain); the default implementation routes the well-known
/// stages to [`ready`](Self::ready) and [`events`](Self::events) and anything
/// else to [`custom`](Self::custom). Returning `None` means "this stage is
/// not defined here".
#[diagnostic::on_unimplemented(
    message = "`{Self}` is not a `Behavior`",
    label = "missing `Behavior` implementation",
    note = "Behaviors must be `Send + Sync + 'static`; every hook has a default."
)]
pub trait Behavior: Send + Sync + 'static {
    /// Default options, overridden key-by-key by the element's `options` metadata.
    fn defaults(&self) -> Options {
        Options::new()
    }

    /// The ordered stages of this behavior's build chain.
    fn chain(&self) -> Vec<Stage> {
        Stage::DEFAULT_CHAIN.to_vec()
    }

    /// The `ready` stage.
    fn ready<'a>(&'a self, cx: &'a ComponentContext, input: Value) -> Option<StageFuture<'a>> {
        let _ = (cx, input);
        None
    }

    /// The `events` stage.
    fn events<'a>(&'a self, cx: &'a ComponentContext, input: Value) -> Option<StageFuture<'a>> {
        let _ = (cx, input);
        None
    }

    /// Any stage not known to the chain driver, looked up by name.
    fn custom<'a>(
        &'a self,
        name: &str,
        cx: &'a ComponentContext,
        input: Value,
    ) -> Option<StageFuture<'a>> {
        let _ = (name, cx, input);
        None
    }

    /// Dispatch one stage.
    fn stage<'a>(
        &'a self,
        stage: &Stage,
        cx: &'a ComponentContext,
        input: Value,
    ) -> Option<StageFuture<'a>> {
        match stage {
            Stage::Ready => self.ready(cx, input),
            Stage::Events => self.events(cx, input),
            Stage::Custom(name) => self.custom(name, cx, input),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_chain() {
        assert_eq!(Stage::DEFAULT_CHAIN.to_vec(), vec![Stage::Ready, Stage::Events]);
    }

    #[test]
    fn test_stage_names_round_trip() {
        assert_eq!(Stage::from("ready"), Stage::Ready);
        assert_eq!(Stage::from("layout"), Stage::custom("layout"));
        assert_eq!(Stage::custom("layout").to_string(), "layout");
    }
}
