//! # Error Reporting
//!
//! Failures inside a run are caught at the narrowest boundary and turned
//! into [`Report`]s handed to a [`Reporter`]. The taxonomy is closed: every
//! report carries an [`ErrorKind`] whose code, message and help link are
//! fixed here; callers only add context.

use crate::descriptor::ComponentDescriptor;
use std::fmt;

/// Base URL of the error explanations; the lowercase code is appended as fragment.
pub const ERROR_PAGE: &str = "https://github.com/denkstrap/denkstrap/wiki/Error-Codes#";

/// The closed set of reportable failures.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    /// A behavior module could not be resolved.
    LoaderDynamicImportFailed,
    /// At least one build chain of a run failed.
    LoaderComponentInitFailed,
    /// A component's build chain rejected.
    ComponentInitFailed,
    /// A component names a condition that is not defined.
    ConditionNotDefined,
    /// A condition predicate failed while being installed.
    ConditionExecutionFailed,
    /// Metadata was requested for a missing element.
    DataHelperElementNotDefined,
}

impl ErrorKind {
    /// Every kind, in declaration order.
    pub const ALL: [ErrorKind; 6] = [
        ErrorKind::LoaderDynamicImportFailed,
        ErrorKind::LoaderComponentInitFailed,
        ErrorKind::ComponentInitFailed,
        ErrorKind::ConditionNotDefined,
        ErrorKind::ConditionExecutionFailed,
        ErrorKind::DataHelperElementNotDefined,
    ];

    /// Stable code string.
    pub const fn code(self) -> &'static str {
        match self {
            ErrorKind::LoaderDynamicImportFailed => "LoaderDynamicImportFailed",
            ErrorKind::LoaderComponentInitFailed => "LoaderComponentInitFailed",
            ErrorKind::ComponentInitFailed => "ComponentInitFailed",
            ErrorKind::ConditionNotDefined => "ConditionNotDefined",
            ErrorKind::ConditionExecutionFailed => "ConditionExecutionFailed",
            ErrorKind::DataHelperElementNotDefined => "DataHelperElementNotDefined",
        }
    }

    /// Fixed human-readable message.
    pub const fn message(self) -> &'static str {
        match self {
            ErrorKind::LoaderDynamicImportFailed => "Dynamic component import failed",
            ErrorKind::LoaderComponentInitFailed => "Component initialization failed",
            ErrorKind::ComponentInitFailed => "Error initializing component",
            ErrorKind::ConditionNotDefined => "Condition is not defined",
            ErrorKind::ConditionExecutionFailed => "Error executing condition",
            ErrorKind::DataHelperElementNotDefined => "Element not defined",
        }
    }

    /// Link to the explanation of this kind.
    pub fn help_url(self) -> String {
        format!("{ERROR_PAGE}{}", self.code().to_lowercase())
    }
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}] {}", self.code(), self.message())
    }
}

/// One reported failure with its context.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Report {
    /// What went wrong.
    pub kind: ErrorKind,
    /// Label of the component involved.
    pub component: Option<String>,
    /// The underlying error, rendered.
    pub cause: Option<String>,
}

impl Report {
    /// A report with no context.
    pub fn new(kind: ErrorKind) -> Self {
        Self {
            kind,
            component: None,
            cause: None,
        }
    }

    /// Attach the component involved.
    pub fn with_component(self, descriptor: &ComponentDescriptor) -> Self {
        self.with_label(descriptor.label())
    }

    /// Attach a component label captured earlier.
    pub fn with_label(mut self, label: impl Into<String>) -> Self {
        self.component = Some(label.into());
        self
    }

    /// Attach the underlying error.
    pub fn with_cause(mut self, cause: impl fmt::Display) -> Self {
        self.cause = Some(cause.to_string());
        self
    }
}

impl fmt::Display for Report {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.kind)?;
        if let Some(component) = &self.component {
            write!(f, " (component: {component})")?;
        }
        if let Some(cause) = &self.cause {
            write!(f, ": {cause}")?;
        }
        Ok(())
    }
}

/// Sink for failure reports.
pub trait Reporter: Send + Sync + 'static {
    /// Record one report.
    fn report(&self, report: Report);
}

impl<F> Reporter for F
where
    F: Fn(Report) + Send + Sync + 'static,
{
    fn report(&self, report: Report) {
        (self)(report)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_help_url_uses_lowercase_code() {
        assert_eq!(
            ErrorKind::ConditionNotDefined.help_url(),
            "https://github.com/denkstrap/denkstrap/wiki/Error-Codes#conditionnotdefined"
        );
    }

    #[test]
    fn test_report_display() {
        let report = Report::new(ErrorKind::ComponentInitFailed).with_cause("boom");
        assert_eq!(
            report.to_string(),
            "[ComponentInitFailed] Error initializing component: boom"
        );
    }

    #[test]
    fn test_codes_are_unique() {
        let mut codes: Vec<_> = ErrorKind::ALL.iter().map(|k| k.code()).collect();
        codes.sort_unstable();
        codes.dedup();
        assert_eq!(codes.len(), ErrorKind::ALL.len());
    }
}
