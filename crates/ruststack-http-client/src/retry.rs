//! Retry policy: attempt budget, backoff delays, and failure classification.

use std::error::Error;
use std::sync::Arc;
use std::time::Duration;

use typed_builder::TypedBuilder;

use crate::error::TransportError;

/// Uniform random jitter added to each backoff delay.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct JitterBounds {
    /// Smallest jitter added.
    pub min: Duration,
    /// Largest jitter added.
    pub max: Duration,
}

impl JitterBounds {
    /// No jitter.
    pub const NONE: Self = Self {
        min: Duration::ZERO,
        max: Duration::ZERO,
    };

    /// Draw a jitter value in `[min, max]`.
    #[must_use]
    pub fn sample(&self) -> Duration {
        if self.max <= self.min {
            return self.min;
        }
        self.min + (self.max - self.min).mul_f64(rand::random::<f64>())
    }
}

impl Default for JitterBounds {
    fn default() -> Self {
        Self {
            min: Duration::ZERO,
            max: Duration::from_millis(100),
        }
    }
}

/// Retry settings for one operation stack.
///
/// # Examples
///
/// ```
/// use std::time::Duration;
/// use ruststack_http_client::retry::{JitterBounds, RetryConfiguration};
///
/// let config = RetryConfiguration::builder()
///     .max_attempts(3)
///     .base_delay(Duration::from_millis(10))
///     .jitter(JitterBounds::NONE)
///     .build();
/// assert_eq!(config.delay_for(1), Duration::from_millis(10));
/// assert_eq!(config.delay_for(3), Duration::from_millis(40));
/// ```
#[derive(Debug, Clone, PartialEq, TypedBuilder)]
pub struct RetryConfiguration {
    /// Total attempts per call, including the first.
    #[builder(default = 5)]
    pub max_attempts: u32,
    /// Delay after the first failed attempt.
    #[builder(default = Duration::from_millis(100))]
    pub base_delay: Duration,
    /// Growth factor applied per further attempt.
    #[builder(default = 2.0)]
    pub backoff_multiplier: f64,
    /// Cap on the exponential part of a delay.
    #[builder(default = Duration::from_secs(20))]
    pub max_delay: Duration,
    /// Jitter added on top of the capped delay.
    #[builder(default)]
    pub jitter: JitterBounds,
}

impl Default for RetryConfiguration {
    fn default() -> Self {
        Self::builder().build()
    }
}

impl RetryConfiguration {
    /// A configuration that never retries.
    #[must_use]
    pub fn no_retries() -> Self {
        Self::builder().max_attempts(1).build()
    }

    /// Whether another attempt is allowed after `attempt` (1-based).
    #[must_use]
    pub fn has_attempts_left(&self, attempt: u32) -> bool {
        attempt < self.max_attempts
    }

    /// Backoff after failed attempt `attempt`, without jitter:
    /// `base_delay * backoff_multiplier^(attempt - 1)`, capped at `max_delay`.
    #[must_use]
    pub fn backoff_for(&self, attempt: u32) -> Duration {
        let exponent = i32::try_from(attempt.saturating_sub(1)).unwrap_or(i32::MAX);
        let secs = self.base_delay.as_secs_f64() * self.backoff_multiplier.powi(exponent);
        if !secs.is_finite() || secs >= self.max_delay.as_secs_f64() {
            return self.max_delay;
        }
        Duration::from_secs_f64(secs.max(0.0))
    }

    /// Backoff after failed attempt `attempt`, with jitter.
    #[must_use]
    pub fn delay_for(&self, attempt: u32) -> Duration {
        self.backoff_for(attempt) + self.jitter.sample()
    }
}

/// Classification of a failure.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ErrorStatus {
    /// Whether another attempt may succeed.
    pub is_retriable: bool,
    /// The HTTP status the failure is reported as.
    pub status_code: u16,
}

impl ErrorStatus {
    /// `(true, 500)`.
    pub const RETRIABLE: Self = Self {
        is_retriable: true,
        status_code: 500,
    };

    /// `(false, 400)`.
    pub const FATAL: Self = Self {
        is_retriable: false,
        status_code: 400,
    };
}

/// Classifies failures that carry no HTTP status of their own.
pub type ErrorStatusFn = Arc<dyn Fn(&(dyn Error + 'static)) -> ErrorStatus + Send + Sync>;

/// Default classification.
///
/// A [`TransportError`] is `(true, 500)` when the transport flags it
/// retriable and `(false, 400)` otherwise. Anything else is `(true, 500)`.
#[must_use]
pub fn default_error_status(error: &(dyn Error + 'static)) -> ErrorStatus {
    match error.downcast_ref::<TransportError>() {
        Some(transport) if !transport.retriable => ErrorStatus::FATAL,
        _ => ErrorStatus::RETRIABLE,
    }
}

/// [`default_error_status`] as an [`ErrorStatusFn`].
#[must_use]
pub fn default_error_status_fn() -> ErrorStatusFn {
    Arc::new(default_error_status)
}
