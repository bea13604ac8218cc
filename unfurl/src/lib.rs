//! # unfurl - Progressive Enhancement for Markup Trees
//!
//! `unfurl` scans a document for elements carrying component markers,
//! resolves each to one or more behavior modules, optionally defers loading
//! until a runtime condition holds, and runs every constructed behavior
//! through an ordered asynchronous build chain.
//!
//! ## Quick Start
//!
//! ```rust,ignore
//! use unfurl::prelude::*;
//!
//! #[derive(Default)]
//! struct Tabs;
//!
//! impl Behavior for Tabs {
//!     fn ready<'a>(&'a self, cx: &'a ComponentContext, _input: Value) -> Option<StageFuture<'a>> {
//!         cx.element().add_class("tabs--ready");
//!         settled(Value::Null)
//!     }
//! }
//!
//! let document = parse_html(r#"<div data-ds-component="tabs"></div>"#)?;
//! let loader = Loader::builder(document)
//!     .resolver(ModuleTable::new().with("tabs", Module::of::<Tabs>()))
//!     .build()?;
//!
//! // Scanning is synchronous; awaiting drives loads and build chains.
//! loader.run().await?;
//! ```

#![deny(clippy::wildcard_imports)]
#![warn(missing_docs)]

pub use unfurl_core::{
    // Behavior
    Behavior,
    BehaviorFactory,
    // Error types
    BoxError,
    BuildError,
    BuildOutcome,
    Completion,
    ComponentContext,
    // Descriptor
    ComponentDescriptor,
    ComponentInstance,
    // Conditions
    Condition,
    ConditionError,
    ConfigError,
    // Markup
    Document,
    Element,
    // Reporting
    ErrorKind,
    LoadHandle,
    Metadata,
    // Resolution
    Module,
    ModuleNotFound,
    ModuleResolver,
    NodeView,
    Options,
    Report,
    Reporter,
    ResolveError,
    ResolveFuture,
    RunError,
    Stage,
    StageFuture,
    UnfurlError,
    Value,
    condition_fn,
    settled,
};

// Orchestration
pub use unfurl_std::loader::{Loader, LoaderBuilder, Outcome, Run, RunState, RunSummary};

// Configuration
pub use unfurl_std::config::{LoaderConfig, ScanRules};

// Ambient
pub use unfurl_std::{attributes::data, html::parse_html, reporter::TracingReporter};

/// Load conditions.
pub mod conditions {
    pub use unfurl_std::conditions::{
        ConditionSet, GateOutcome, IN_VIEWPORT, dispatch, gate, in_viewport,
    };
}

/// Discovery building blocks.
pub mod discovery {
    pub use unfurl_std::{
        selector::MarkerSelector,
        walker::TreeWalker,
    };
}

/// Build chain building blocks.
pub mod chain {
    pub use unfurl_std::chain::{BuildChain, instantiate};
}

/// Modules collected at link time.
#[cfg(feature = "inventory")]
pub mod collected {
    pub use unfurl_std::collected::{CollectedModule, CollectedResolver};
    pub use ::inventory;
}

/// Testing utilities.
pub mod testing {
    #![allow(clippy::wildcard_imports)]
    pub use unfurl_std::testing::*;
}

/// Prelude module - common imports for Unfurl.
///
/// # Usage
///
/// ```rust,ignore
/// use unfurl::prelude::*;
/// ```
pub mod prelude {
    pub use crate::{
        // Core traits
        Behavior,
        // Errors
        BoxError,
        ComponentContext,
        Condition,
        Document,
        Element,
        // Orchestration
        Loader,
        LoaderConfig,
        Module,
        ModuleResolver,
        Reporter,
        ResolveFuture,
        StageFuture,
        UnfurlError,
        Value,
        parse_html,
        settled,
        testing::ModuleTable,
    };
}
