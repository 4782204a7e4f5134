//! # Failure Sink
//!
//! Errors raised by a unit's lifecycle callback never reach the owner. The
//! host wraps each one in a [`FailureReport`] and hands it to a
//! [`FailureSink`], the only side channel of the crate.
//!
//! ## Sink selection
//!
//! A host uses, in order:
//! 1. the sink passed to [`HostBuilder::sink`](crate::HostBuilder::sink)
//! 2. the process sink set once with [`init_process_sink`]
//! 3. [`TracingSink`], which logs at `error` level
//!
//! ```rust
//! use behavior_host::failure::{MemorySink, process_sink};
//! use std::sync::Arc;
//!
//! let sink = Arc::new(MemorySink::new());
//! assert!(sink.is_empty());
//! let _fallback = process_sink();
//! ```

use crate::{LifecycleError, LifecycleEvent, LifecycleResult, UnitKind};
use chrono::{DateTime, Utc};
use parking_lot::Mutex;
use std::backtrace::Backtrace;
use std::sync::{Arc, OnceLock};

static PROCESS_SINK: OnceLock<Arc<dyn FailureSink>> = OnceLock::new();

/// One isolated failure of one unit during one lifecycle event
#[derive(Debug)]
pub struct FailureReport {
    /// Kind of the unit that failed
    pub unit: UnitKind,
    /// Event being delivered when it failed
    pub event: LifecycleEvent,
    /// Label of the host the unit is installed in
    pub host: String,
    /// The error returned by the callback
    pub error: anyhow::Error,
    /// When the host caught it
    pub occurred_at: DateTime<Utc>,
}

impl FailureReport {
    pub fn new(
        unit: UnitKind,
        event: LifecycleEvent,
        host: impl Into<String>,
        error: anyhow::Error,
    ) -> Self {
        Self {
            unit,
            event,
            host: host.into(),
            error,
            occurred_at: Utc::now(),
        }
    }

    /// Human-readable one-line summary
    pub fn description(&self) -> String {
        format!(
            "unit '{}' failed during {} on host '{}': {}",
            self.unit, self.event, self.host, self.error
        )
    }

    /// Stack context captured with the error (empty unless backtraces are enabled)
    pub fn backtrace(&self) -> &Backtrace {
        self.error.backtrace()
    }
}

/// Receiver for isolated unit failures
pub trait FailureSink: Send + Sync {
    fn report(&self, report: FailureReport);
}

/// Default sink: one `tracing` error event per report
#[derive(Debug, Clone, Copy, Default)]
pub struct TracingSink;

impl FailureSink for TracingSink {
    fn report(&self, report: FailureReport) {
        tracing::error!(
            unit = %report.unit,
            event = %report.event,
            host = %report.host,
            occurred_at = %report.occurred_at.to_rfc3339(),
            error = ?report.error,
            "{}",
            report.description()
        );
    }
}

/// Sink that keeps every report in memory
#[derive(Debug, Default)]
pub struct MemorySink {
    reports: Mutex<Vec<FailureReport>>,
}

impl MemorySink {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.reports.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.reports.lock().is_empty()
    }

    /// Unit kind and event of each report, in arrival order
    pub fn summary(&self) -> Vec<(UnitKind, LifecycleEvent)> {
        self.reports
            .lock()
            .iter()
            .map(|report| (report.unit.clone(), report.event))
            .collect()
    }

    /// Drain all stored reports
    pub fn take(&self) -> Vec<FailureReport> {
        std::mem::take(&mut *self.reports.lock())
    }
}

impl FailureSink for MemorySink {
    fn report(&self, report: FailureReport) {
        self.reports.lock().push(report);
    }
}

/// Set the process-wide sink. Only the first call succeeds.
pub fn init_process_sink(sink: Arc<dyn FailureSink>) -> LifecycleResult<()> {
    PROCESS_SINK
        .set(sink)
        .map_err(|_| LifecycleError::SinkAlreadyInitialized)
}

/// The process-wide sink, or [`TracingSink`] when none was set
pub fn process_sink() -> Arc<dyn FailureSink> {
    PROCESS_SINK
        .get()
        .cloned()
        .unwrap_or_else(|| Arc::new(TracingSink))
}
