//! The built-in `inViewport` condition.

use unfurl_core::{BoxError, Element, LoadHandle};

/// Name under which [`in_viewport`] is registered.
pub const IN_VIEWPORT: &str = "inViewport";

/// Load once the element becomes visible.
///
/// Fires immediately for an element that is already visible. The observer
/// is dropped after it fires, so the load is triggered at most once.
pub fn in_viewport(load: LoadHandle, element: &Element) -> Result<(), BoxError> {
    element.observe_visibility(move || load.load());
    Ok(())
}
