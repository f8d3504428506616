//! Per-attempt metrics.
//!
//! Every attempt emits one [`AttemptRecord`] to the call's [`MetricsSink`].
//! Attempts that reach the finalize phase are recorded by the retry stage;
//! attempts that fail while building the request or are cancelled while
//! sending are recorded by the stack with no status. A failing sink is
//! logged and otherwise ignored.

use std::collections::BTreeMap;
use std::time::Duration;

/// What happened on one attempt.
#[derive(Debug, Clone, PartialEq)]
pub struct AttemptRecord {
    /// Operation name.
    pub operation: String,
    /// 1-based attempt number.
    pub attempt: u32,
    /// HTTP status of the response, or the classified status of a failure.
    pub status: Option<u16>,
    /// Time from the start of the attempt until it was recorded.
    pub latency: Duration,
    /// Whether the attempt produced a successful response.
    pub succeeded: bool,
    /// Whether another attempt follows.
    pub will_retry: bool,
    /// Caller-supplied tags of the call.
    pub request_tags: BTreeMap<String, String>,
}

impl AttemptRecord {
    /// Number of retries that preceded this attempt.
    #[must_use]
    pub fn retry_count(&self) -> u32 {
        self.attempt.saturating_sub(1)
    }
}

/// Error returned by a metrics sink.
#[derive(Debug, thiserror::Error)]
pub enum MetricsError {
    /// The sink could not accept the record.
    #[error("metrics sink unavailable: {0}")]
    Unavailable(String),
}

/// Receiver of per-attempt records.
pub trait MetricsSink: Send + Sync {
    /// Record one attempt.
    ///
    /// # Errors
    ///
    /// Returns [`MetricsError`] if the record could not be stored. Callers
    /// ignore the error.
    fn record(&self, record: &AttemptRecord) -> Result<(), MetricsError>;
}

/// A sink that turns every record into a `tracing` event.
#[derive(Debug, Clone, Copy, Default)]
pub struct TracingMetricsSink;

impl MetricsSink for TracingMetricsSink {
    fn record(&self, record: &AttemptRecord) -> Result<(), MetricsError> {
        tracing::info!(
            operation = %record.operation,
            attempt = record.attempt,
            retry_count = record.retry_count(),
            status = record.status,
            latency_ms = u64::try_from(record.latency.as_millis()).unwrap_or(u64::MAX),
            succeeded = record.succeeded,
            will_retry = record.will_retry,
            tags = ?record.request_tags,
            "operation attempt"
        );
        Ok(())
    }
}
