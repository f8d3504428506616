//! Per-call state threaded through every stage.

use std::collections::BTreeMap;
use std::sync::Arc;
use std::time::Duration;

use ruststack_auth::CredentialsProvider;
use tokio::time::Instant;
use tokio_util::sync::CancellationToken;
use tracing::warn;

use crate::metrics::{AttemptRecord, MetricsSink};

/// Whether the body stage wrote a body on the current attempt, and how long
/// it was. Reset at the start of every attempt.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct BodyContext {
    written: bool,
    length: usize,
}

impl BodyContext {
    /// Record a written body.
    pub fn record(&mut self, length: usize) {
        self.written = true;
        self.length = length;
    }

    /// Forget the previous attempt's body.
    pub fn reset(&mut self) {
        *self = Self::default();
    }

    /// Whether a body stage ran and wrote something, possibly zero bytes.
    #[must_use]
    pub fn is_written(&self) -> bool {
        self.written
    }

    /// Body length in bytes; zero when nothing was written.
    #[must_use]
    pub fn len(&self) -> usize {
        self.length
    }

    /// Whether the request goes out with a zero-length body.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.length == 0
    }
}

/// State owned by one in-flight call.
///
/// Holds the collaborators the stages need (credentials, metrics,
/// cancellation) and the counters that change from attempt to attempt.
pub struct InvocationContext {
    operation: String,
    attempt: u32,
    request_tags: BTreeMap<String, String>,
    metrics: Option<Arc<dyn MetricsSink>>,
    credentials: Arc<dyn CredentialsProvider>,
    cancellation: CancellationToken,
    attempt_started: Instant,
    /// Body written on the current attempt.
    pub body: BodyContext,
}

impl std::fmt::Debug for InvocationContext {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("InvocationContext")
            .field("operation", &self.operation)
            .field("attempt", &self.attempt)
            .field("request_tags", &self.request_tags)
            .field("metrics", &self.metrics.as_ref().map(|_| "..."))
            .field("cancelled", &self.cancellation.is_cancelled())
            .field("body", &self.body)
            .finish_non_exhaustive()
    }
}

impl InvocationContext {
    /// Create the context for one call of `operation`.
    pub fn new(operation: impl Into<String>, credentials: Arc<dyn CredentialsProvider>) -> Self {
        Self {
            operation: operation.into(),
            attempt: 0,
            request_tags: BTreeMap::new(),
            metrics: None,
            credentials,
            cancellation: CancellationToken::new(),
            attempt_started: Instant::now(),
            body: BodyContext::default(),
        }
    }

    /// Send per-attempt records to `sink`.
    #[must_use]
    pub fn with_metrics(mut self, sink: Arc<dyn MetricsSink>) -> Self {
        self.metrics = Some(sink);
        self
    }

    /// Add a tag copied into every metrics record.
    #[must_use]
    pub fn with_request_tag(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.request_tags.insert(key.into(), value.into());
        self
    }

    /// Add several tags.
    #[must_use]
    pub fn with_request_tags(mut self, tags: impl IntoIterator<Item = (String, String)>) -> Self {
        self.request_tags.extend(tags);
        self
    }

    /// Observe `token` for cancellation.
    #[must_use]
    pub fn with_cancellation(mut self, token: CancellationToken) -> Self {
        self.cancellation = token;
        self
    }

    /// Operation name.
    #[must_use]
    pub fn operation(&self) -> &str {
        &self.operation
    }

    /// Current 1-based attempt; zero before the first attempt starts.
    #[must_use]
    pub fn attempt(&self) -> u32 {
        self.attempt
    }

    /// Caller-supplied tags.
    #[must_use]
    pub fn request_tags(&self) -> &BTreeMap<String, String> {
        &self.request_tags
    }

    /// Metrics sink, if one was configured.
    #[must_use]
    pub fn metrics(&self) -> Option<&Arc<dyn MetricsSink>> {
        self.metrics.as_ref()
    }

    /// Credentials provider used by the signing stage.
    #[must_use]
    pub fn credentials(&self) -> &dyn CredentialsProvider {
        self.credentials.as_ref()
    }

    /// Cancellation token for this call.
    #[must_use]
    pub fn cancellation(&self) -> &CancellationToken {
        &self.cancellation
    }

    /// Start the next attempt: bump the counter, clear the body record and
    /// restart the latency clock.
    pub fn begin_attempt(&mut self) {
        self.attempt += 1;
        self.body.reset();
        self.attempt_started = Instant::now();
    }

    /// Time since the current attempt started.
    #[must_use]
    pub fn attempt_elapsed(&self) -> Duration {
        self.attempt_started.elapsed()
    }

    /// Report the current attempt to the metrics sink, if there is one.
    pub fn record_attempt(&self, status: Option<u16>, succeeded: bool, will_retry: bool) {
        let Some(sink) = &self.metrics else {
            return;
        };
        let record = AttemptRecord {
            operation: self.operation.clone(),
            attempt: self.attempt,
            status,
            latency: self.attempt_elapsed(),
            succeeded,
            will_retry,
            request_tags: self.request_tags.clone(),
        };
        if let Err(e) = sink.record(&record) {
            warn!(operation = %self.operation, error = %e, "metrics sink rejected attempt record");
        }
    }
}
