//! # unfurl-core
//!
//! Core data model and traits for the Unfurl progressive-enhancement loader.
//!
//! This crate has minimal dependencies and is meant to be imported by
//! behavior libraries and host integrations that don't need the loader
//! engine in `unfurl-std`.
//!
//! # Layers
//!
//! ## Markup ([`Document`], [`Element`])
//!
//! The shared element tree. Discovery reads it, enhancement mutates it, and
//! the processed marker written onto each discovered element is both the
//! walker's progress signal and the visible "enhanced" flag.
//!
//! ## Description ([`ComponentDescriptor`])
//!
//! One record per discovered element: metadata, behavior paths, parent and
//! children. The only constructor marks the element processed.
//!
//! ## Behavior ([`Behavior`], [`Stage`])
//!
//! The executable unit bound to a descriptor. Its build chain is a list of
//! optional, statically dispatched stage hooks.
//!
//! ## Seams ([`ModuleResolver`], [`Condition`], [`Reporter`])
//!
//! What the host plugs in: how module paths become behaviors, when deferred
//! components load, and where failures are reported.
//!
//! # Error Types
//!
//! - [`UnfurlError`] - Top-level error type
//! - [`BuildError`] - Build chain failures
//! - [`ResolveError`] - Module resolution failures
//! - [`RunError`] - Aggregate run failures

#![deny(clippy::wildcard_imports)]
#![warn(missing_docs)]

mod behavior;
mod component;
mod condition;
mod descriptor;
mod error;
mod markup;
mod once;
mod report;
mod resolver;

// Re-exports
pub use behavior::{Behavior, Options, Stage, StageFuture, settled};
pub use component::{
    BuildOutcome, Completion, ComponentContext, ComponentInstance, merge_options,
};
pub use condition::{Condition, condition_fn};
pub use descriptor::{
    BEHAVIOR_KEYS, CONDITION_KEY, ComponentDescriptor, Metadata, OPTIONS_KEY,
};
pub use error::{
    BoxError, BuildError, ConditionError, ConfigError, ModuleNotFound, ResolveError, RunError,
    SharedError, UnfurlError,
};
pub use markup::{Document, Element, NodeId, NodeView, ROOT_TAG};
pub use once::{AtMostOnce, LoadHandle};
pub use report::{ERROR_PAGE, ErrorKind, Report, Reporter};
pub use resolver::{BehaviorFactory, Module, ModuleResolver, ResolveFuture};
pub use serde_json::Value;
