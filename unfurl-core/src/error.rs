//! Error types for Unfurl.
//!
//! - [`UnfurlError`] - Top-level error type
//! - [`BuildError`] - A build-chain stage rejected
//! - [`ResolveError`] - A behavior module could not be resolved
//! - [`ModuleNotFound`] - A resolver has nothing under a path
//! - [`ConditionError`] - A load condition was missing, failed or panicked
//! - [`RunError`] - Aggregate failure of a whole run
//! - [`ConfigError`] - Invalid loader configuration

use crate::behavior::Stage;
use std::sync::Arc;
use thiserror::Error;

/// A boxed error type for dynamic error handling.
pub type BoxError = Box<dyn std::error::Error + Send + Sync + 'static>;

/// A reference-counted error, for outcomes that are observed more than once.
pub type SharedError = Arc<dyn std::error::Error + Send + Sync + 'static>;

/// Top-level error type for all Unfurl operations.
#[derive(Error, Debug)]
pub enum UnfurlError {
    /// A build chain failed.
    #[error("build error: {0}")]
    Build(#[from] BuildError),

    /// A module could not be resolved.
    #[error("resolve error: {0}")]
    Resolve(#[from] ResolveError),

    /// A condition could not be installed.
    #[error("condition error: {0}")]
    Condition(#[from] ConditionError),

    /// A run settled with failures.
    #[error("run error: {0}")]
    Run(#[from] RunError),

    /// The loader was misconfigured.
    #[error("config error: {0}")]
    Config(#[from] ConfigError),

    /// A custom error occurred.
    #[error(transparent)]
    Custom(BoxError),
}

/// A component's behavior could not be constructed or built.
#[derive(Error, Debug, Clone)]
pub enum BuildError {
    /// The named stage returned an error; later stages did not run.
    #[error("stage `{stage}` failed: {source}")]
    StageFailed {
        /// The stage that failed.
        stage: Stage,
        /// The stage's error.
        source: SharedError,
    },

    /// The named stage panicked; later stages did not run.
    #[error("stage `{stage}` panicked: {message}")]
    StagePanicked {
        /// The stage that panicked.
        stage: Stage,
        /// The panic payload, when it was a string.
        message: String,
    },

    /// The module's constructor panicked; no stage ran.
    #[error("constructing the behavior panicked: {message}")]
    ConstructPanicked {
        /// The panic payload, when it was a string.
        message: String,
    },
}

impl BuildError {
    /// The stage that failed, if the chain got that far.
    pub fn stage(&self) -> Option<&Stage> {
        match self {
            BuildError::StageFailed { stage, .. } | BuildError::StagePanicked { stage, .. } => {
                Some(stage)
            }
            BuildError::ConstructPanicked { .. } => None,
        }
    }
}

/// A behavior module path could not be resolved.
#[derive(Error, Debug, Clone)]
#[error("failed to resolve module `{path}`: {source}")]
pub struct ResolveError {
    /// The module path that failed.
    pub path: String,
    /// The resolver's error.
    pub source: SharedError,
}

impl ResolveError {
    /// Create a resolve error for `path`.
    pub fn new(path: impl Into<String>, source: BoxError) -> Self {
        Self {
            path: path.into(),
            source: Arc::from(source),
        }
    }
}

/// No module is registered under the requested path.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("no module registered under `{0}`")]
pub struct ModuleNotFound(pub String);

/// Errors raised while installing a load condition.
#[derive(Error, Debug)]
pub enum ConditionError {
    /// No condition with this name exists in the active set.
    #[error("condition `{0}` is not defined")]
    NotDefined(String),

    /// The predicate returned an error.
    #[error("condition `{name}` failed: {source}")]
    Failed {
        /// Name of the condition.
        name: String,
        /// The predicate's error.
        source: BoxError,
    },

    /// The predicate panicked.
    #[error("condition `{name}` panicked: {message}")]
    Panicked {
        /// Name of the condition.
        name: String,
        /// The panic payload, when it was a string.
        message: String,
    },
}

/// A run settled, but at least one load or build failed.
#[derive(Error, Debug, Clone, Default)]
#[error(
    "run settled with {} resolution failure(s) and {} build failure(s)",
    .resolution.len(),
    .build.len()
)]
pub struct RunError {
    /// Modules that could not be resolved.
    pub resolution: Vec<ResolveError>,
    /// Build chains that rejected.
    pub build: Vec<BuildError>,
}

impl RunError {
    /// Whether nothing failed.
    pub fn is_empty(&self) -> bool {
        self.resolution.is_empty() && self.build.is_empty()
    }
}

/// Errors in loader configuration.
#[derive(Error, Debug)]
pub enum ConfigError {
    /// A marker selector could not be parsed.
    #[error("invalid marker selector: {0:?}")]
    InvalidSelector(String),

    /// No marker selectors were configured.
    #[error("at least one marker selector is required")]
    NoSelectors,

    /// The processed marker is empty or contains whitespace.
    #[error("invalid processed marker: {0:?}")]
    InvalidMarker(String),

    /// No module resolver was supplied.
    #[error("a module resolver is required")]
    MissingResolver,

    /// The configuration source could not be parsed.
    #[error("failed to parse configuration: {0}")]
    Parse(#[source] BoxError),
}
