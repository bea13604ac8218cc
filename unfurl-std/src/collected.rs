//! Behavior modules registered at link time through `inventory`.
//!
//! ```rust,ignore
//! fn carousel(_: &ComponentDescriptor) -> Box<dyn Behavior> {
//!     Box::new(Carousel::default())
//! }
//!
//! inventory::submit! { CollectedModule::new("carousel", carousel) }
//!
//! let loader = Loader::builder(document).resolver(CollectedResolver).build()?;
//! ```

use futures::future;
use unfurl_core::{
    Behavior, BoxError, ComponentDescriptor, Module, ModuleNotFound, ModuleResolver, ResolveFuture,
};

/// A behavior constructor submitted under a module path.
pub struct CollectedModule {
    /// Path the module resolves under.
    pub path: &'static str,
    /// Builds the behavior for a descriptor.
    pub constructor: fn(&ComponentDescriptor) -> Box<dyn Behavior>,
}

impl CollectedModule {
    /// Create a new collected module entry.
    pub const fn new(
        path: &'static str,
        constructor: fn(&ComponentDescriptor) -> Box<dyn Behavior>,
    ) -> Self {
        Self { path, constructor }
    }
}

inventory::collect!(CollectedModule);

/// Resolves paths against every submitted [`CollectedModule`].
///
/// When a path is submitted more than once, the first entry found wins.
#[derive(Debug, Clone, Copy, Default)]
pub struct CollectedResolver;

impl CollectedResolver {
    /// Every submitted path, sorted.
    pub fn paths() -> Vec<&'static str> {
        let mut paths: Vec<&'static str> = inventory::iter::<CollectedModule>
            .into_iter()
            .map(|entry| entry.path)
            .collect();
        paths.sort_unstable();
        paths
    }

    /// The module submitted under `path`.
    pub fn find(path: &str) -> Option<Module> {
        inventory::iter::<CollectedModule>
            .into_iter()
            .find(|entry| entry.path == path)
            .map(|entry| Module::new(entry.constructor))
    }
}

impl ModuleResolver for CollectedResolver {
    fn resolve(&self, path: &str) -> ResolveFuture {
        let found =
            Self::find(path).ok_or_else(|| BoxError::from(ModuleNotFound(path.to_owned())));
        Box::pin(future::ready(found))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct Inert;

    impl Behavior for Inert {}

    fn inert(_: &ComponentDescriptor) -> Box<dyn Behavior> {
        Box::new(Inert)
    }

    inventory::submit! { CollectedModule::new("collected-inert", inert) }

    #[tokio::test]
    async fn test_resolves_submitted_paths() {
        assert!(CollectedResolver::paths().contains(&"collected-inert"));
        assert!(CollectedResolver.resolve("collected-inert").await.is_ok());
        assert!(CollectedResolver.resolve("collected-missing").await.is_err());
    }
}
