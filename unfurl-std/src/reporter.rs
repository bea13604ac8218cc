//! Default reporter: forwards reports to `tracing`.

use unfurl_core::{Report, Reporter};

/// Emits every report as a `tracing` error event.
///
/// In simple mode only `[code] message` is logged; otherwise the component,
/// the cause and the help link are attached as fields.
#[derive(Debug, Clone, Copy, Default)]
pub struct TracingReporter {
    simple_logs: bool,
}

impl TracingReporter {
    /// A reporter with full context.
    pub fn new() -> Self {
        Self::default()
    }

    /// A reporter logging only code and message.
    pub fn simple() -> Self {
        Self { simple_logs: true }
    }

    /// Whether only code and message are logged.
    pub fn is_simple(&self) -> bool {
        self.simple_logs
    }
}

impl Reporter for TracingReporter {
    fn report(&self, report: Report) {
        if self.simple_logs {
            tracing::error!("{}", report.kind);
            return;
        }
        tracing::error!(
            code = report.kind.code(),
            component = report.component.as_deref().unwrap_or("-"),
            cause = report.cause.as_deref().unwrap_or("-"),
            help = %report.kind.help_url(),
            message = report.kind.message(),
        );
    }
}
