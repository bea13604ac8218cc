//! # Load Conditions
//!
//! A condition defers loading a component until something happens at
//! runtime. It receives a [`LoadHandle`] and the element, and may call the
//! handle now, later (from an observer or timer) or never. The handle guards
//! the load, so calling it more than once is harmless.
//!
//! Conditions run synchronously when installed. Returning an error (or
//! panicking) means the component is not loaded in this run.

use crate::{error::BoxError, markup::Element, once::LoadHandle};

/// A named predicate gating when a discovered component loads.
#[diagnostic::on_unimplemented(
    message = "`{Self}` is not a `Condition`",
    label = "missing `Condition` implementation",
    note = "Conditions implement `install`, or are closures `Fn(LoadHandle, &Element) -> Result<(), BoxError>`."
)]
pub trait Condition: Send + Sync + 'static {
    /// Arrange for `load` to be called once the condition holds.
    fn install(&self, load: LoadHandle, element: &Element) -> Result<(), BoxError>;
}

impl<F> Condition for F
where
    F: Fn(LoadHandle, &Element) -> Result<(), BoxError> + Send + Sync + 'static,
{
    fn install(&self, load: LoadHandle, element: &Element) -> Result<(), BoxError> {
        (self)(load, element)
    }
}

/// Pin a closure to the [`Condition`] signature so its argument types are inferred.
pub fn condition_fn<F>(f: F) -> F
where
    F: Fn(LoadHandle, &Element) -> Result<(), BoxError> + Send + Sync + 'static,
{
    f
}
