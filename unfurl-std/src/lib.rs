//! # unfurl-std
//!
//! Standard implementations for the Unfurl progressive-enhancement loader.
//!
//! This crate provides:
//! - **Discovery**: [`TreeWalker`](walker::TreeWalker), [`MarkerSelector`](selector::MarkerSelector),
//!   and the [`data`](attributes::data) attribute reader
//! - **Building**: [`BuildChain`](chain::BuildChain) and [`instantiate`](chain::instantiate)
//! - **Conditions**: [`ConditionSet`](conditions::ConditionSet) and the built-in `inViewport`
//! - **Orchestration**: [`Loader`](loader::Loader) and its [`Run`](loader::Run)
//! - **Ambient pieces**: [`LoaderConfig`](config::LoaderConfig),
//!   [`TracingReporter`](reporter::TracingReporter), [`parse_html`](html::parse_html)
//! - **Collected modules** (feature `inventory`): `CollectedResolver`

#![deny(clippy::wildcard_imports)]
#![warn(missing_docs)]

// Re-export core traits
pub use unfurl_core;

// Modules
pub mod attributes;
pub mod chain;
#[cfg(feature = "inventory")]
pub mod collected;
pub mod conditions;
pub mod config;
pub mod html;
pub mod loader;
pub mod reporter;
pub mod selector;
pub mod testing;
pub mod walker;

#[cfg(feature = "inventory")]
pub use inventory;
