//! Error-reporting sink.
//!
//! Handler failures, timeouts and suppressed interaction races end up here.
//! [`LogSink`] only logs; the Discord-backed sink lives in `outbound`.

use std::fmt;

use async_trait::async_trait;
use tracing::{debug, error, warn};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReportSeverity {
    /// A handler failed after readiness
    Failure,
    /// A handler produced no visible reply before the deadline
    Timeout,
    /// A known-benign race, kept out of the main alerting path
    Suppressed,
}

impl fmt::Display for ReportSeverity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Failure => "failure",
            Self::Timeout => "timeout",
            Self::Suppressed => "suppressed",
        })
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Report {
    pub severity: ReportSeverity,
    /// Where it happened, e.g. `command stats`
    pub context: String,
    pub message: String,
}

impl Report {
    pub fn new(severity: ReportSeverity, context: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            severity,
            context: context.into(),
            message: message.into(),
        }
    }

    pub fn failure(context: impl Into<String>, message: impl Into<String>) -> Self {
        Self::new(ReportSeverity::Failure, context, message)
    }

    pub fn timeout(context: impl Into<String>, message: impl Into<String>) -> Self {
        Self::new(ReportSeverity::Timeout, context, message)
    }

    pub fn suppressed(context: impl Into<String>, message: impl Into<String>) -> Self {
        Self::new(ReportSeverity::Suppressed, context, message)
    }

    /// Text posted to a report channel
    pub fn render(&self) -> String {
        match self.severity {
            ReportSeverity::Suppressed => format!(
                "A suppressed error has occurred at {}:\n>>> {}",
                self.context, self.message
            ),
            _ => format!("A [{}] has occurred at {}.\n\n> {}", self.severity, self.context, self.message),
        }
    }
}

/// Destination for reports. Implementations must not fail; delivery problems
/// are logged.
#[async_trait]
pub trait ErrorSink: Send + Sync + 'static {
    async fn report(&self, report: Report);
}

/// Logs every report through `tracing`.
#[derive(Debug, Clone, Copy, Default)]
pub struct LogSink;

impl LogSink {
    pub fn log(report: &Report) {
        match report.severity {
            ReportSeverity::Failure => {
                error!(context = %report.context, "{}", report.message);
            }
            ReportSeverity::Timeout => {
                warn!(context = %report.context, "{}", report.message);
            }
            ReportSeverity::Suppressed => {
                debug!(context = %report.context, "suppressed: {}", report.message);
            }
        }
    }
}

#[async_trait]
impl ErrorSink for LogSink {
    async fn report(&self, report: Report) {
        Self::log(&report);
    }
}
