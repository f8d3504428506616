//! Finalize-phase stages: typed error decoding, generic client errors, retry.
//!
//! They run in that order. The typed-error stage claims error responses whose
//! code is one of the operation's declared errors; the client-error stage
//! classifies whatever is left by status; the retry stage decides whether to
//! go again and records the attempt.

use std::marker::PhantomData;

use bytes::Bytes;
use serde::Deserialize;
use tracing::{debug, warn};

use crate::context::InvocationContext;
use crate::error::{HttpClientError, ServiceError};
use crate::retry::{ErrorStatusFn, RetryConfiguration};
use crate::stage::{AttemptOutcome, Disposition, FinalizeStage, Stage};

/// Error codes treated as throttling, and so retriable, whatever their status.
const THROTTLING_CODES: &[&str] = &[
    "Throttling",
    "ThrottlingException",
    "ThrottledException",
    "RequestThrottledException",
    "TooManyRequestsException",
    "ProvisionedThroughputExceededException",
    "TransactionInProgressException",
    "RequestLimitExceeded",
    "BandwidthLimitExceeded",
    "RequestThrottled",
    "SlowDown",
    "PriorRequestNotComplete",
    "EC2ThrottledException",
];

/// Error code and message read from a failed response.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ErrorDetails {
    /// AWS error code, without namespace.
    pub code: Option<String>,
    /// Error message.
    pub message: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
struct ErrorBody {
    #[serde(rename = "__type")]
    type_name: Option<String>,
    #[serde(alias = "Code")]
    code: Option<String>,
    #[serde(alias = "Message", alias = "errorMessage")]
    message: Option<String>,
}

impl ErrorDetails {
    /// Read the error code from the `x-amzn-errortype` header or the body's
    /// `__type`/`code`/`Code` field, and the message from `message`/`Message`.
    ///
    /// Bodies over `max_bytes` or that are not JSON contribute nothing.
    #[must_use]
    pub fn from_response(response: &http::Response<Bytes>, max_bytes: usize) -> Self {
        let body: ErrorBody = if response.body().len() <= max_bytes {
            serde_json::from_slice(response.body()).unwrap_or_default()
        } else {
            ErrorBody::default()
        };

        let header_code = response
            .headers()
            .get("x-amzn-errortype")
            .and_then(|value| value.to_str().ok())
            .map(str::to_owned);

        let code = header_code
            .or(body.type_name)
            .or(body.code)
            .map(|raw| sanitize_code(&raw))
            .filter(|code| !code.is_empty());

        Self {
            code,
            message: body.message,
        }
    }
}

/// Strip a `namespace#` prefix and a `:uri` suffix from an error code.
fn sanitize_code(raw: &str) -> String {
    let code = raw.rsplit_once('#').map_or(raw, |(_, code)| code);
    let code = code.split_once(':').map_or(code, |(code, _)| code);
    code.trim().to_owned()
}

/// Whether a generic error with this status and code may be retried:
/// 5xx, 408, 429 and throttling codes are; other 4xx are not.
#[must_use]
pub fn is_retriable_status(status: u16, code: Option<&str>) -> bool {
    if code.is_some_and(|code| THROTTLING_CODES.contains(&code)) {
        return true;
    }
    matches!(status, 408 | 429 | 500..=599)
}

/// Decodes one of the operation's declared errors from a failed response.
pub struct JsonTypedErrorStage<E> {
    declared: Vec<String>,
    max_bytes: usize,
    _error: PhantomData<fn() -> E>,
}

impl<E> std::fmt::Debug for JsonTypedErrorStage<E> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("JsonTypedErrorStage")
            .field("declared", &self.declared)
            .field("max_bytes", &self.max_bytes)
            .finish()
    }
}

impl<E> JsonTypedErrorStage<E> {
    /// Stage name.
    pub const NAME: &'static str = "JsonTypedError";

    /// Create the stage for the error codes an operation declares.
    #[must_use]
    pub fn new(declared: Vec<String>, max_bytes: usize) -> Self {
        Self {
            declared,
            max_bytes,
            _error: PhantomData,
        }
    }
}

impl<E> Stage for JsonTypedErrorStage<E> {
    fn name(&self) -> &str {
        Self::NAME
    }
}

impl<E: ServiceError> FinalizeStage<E> for JsonTypedErrorStage<E> {
    fn apply(&self, outcome: &mut AttemptOutcome<E>, ctx: &mut InvocationContext) {
        let Some(response) = outcome.failed_response() else {
            return;
        };
        let details = ErrorDetails::from_response(response, self.max_bytes);
        let Some(code) = details.code else {
            return;
        };
        if !self.declared.iter().any(|declared| *declared == code) {
            return;
        }
        if let Some(error) = E::from_code(&code, details.message) {
            debug!(
                operation = ctx.operation(),
                attempt = ctx.attempt(),
                code = %code,
                "decoded typed error"
            );
            outcome.result = Err(HttpClientError::Service(error));
        }
    }
}

/// Turns any remaining non-2xx response into [`HttpClientError::Client`].
#[derive(Debug, Clone, Copy)]
pub struct ClientErrorStage {
    max_bytes: usize,
}

impl ClientErrorStage {
    /// Stage name.
    pub const NAME: &'static str = "ClientError";

    /// Create the stage.
    #[must_use]
    pub fn new(max_bytes: usize) -> Self {
        Self { max_bytes }
    }
}

impl Stage for ClientErrorStage {
    fn name(&self) -> &str {
        Self::NAME
    }
}

impl<E> FinalizeStage<E> for ClientErrorStage {
    fn apply(&self, outcome: &mut AttemptOutcome<E>, _ctx: &mut InvocationContext) {
        let Some(response) = outcome.failed_response() else {
            return;
        };
        let status = response.status();
        let details = ErrorDetails::from_response(response, self.max_bytes);
        let retriable = is_retriable_status(status.as_u16(), details.code.as_deref());
        let message = details.message.unwrap_or_else(|| {
            status
                .canonical_reason()
                .unwrap_or("unknown error")
                .to_owned()
        });

        outcome.result = Err(HttpClientError::Client {
            status: status.as_u16(),
            code: details.code,
            message,
            retriable,
        });
    }
}

/// Decides whether to retry and records the attempt. Must be the last
/// finalize stage.
pub struct RetryStage {
    config: RetryConfiguration,
    error_status: ErrorStatusFn,
}

impl std::fmt::Debug for RetryStage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RetryStage")
            .field("config", &self.config)
            .finish_non_exhaustive()
    }
}

impl RetryStage {
    /// Stage name.
    pub const NAME: &'static str = "Retry";

    /// Create the stage.
    #[must_use]
    pub fn new(config: RetryConfiguration, error_status: ErrorStatusFn) -> Self {
        Self {
            config,
            error_status,
        }
    }
}

impl Stage for RetryStage {
    fn name(&self) -> &str {
        Self::NAME
    }
}

impl<E: ServiceError> FinalizeStage<E> for RetryStage {
    fn apply(&self, outcome: &mut AttemptOutcome<E>, ctx: &mut InvocationContext) {
        let attempt = ctx.attempt();

        let (retriable, status) = match &outcome.result {
            Ok(_) => (false, outcome.status),
            Err(HttpClientError::Service(error)) => (error.is_retriable(), outcome.status),
            Err(HttpClientError::Client {
                status, retriable, ..
            }) => (*retriable, Some(*status)),
            Err(HttpClientError::Transport(error)) => {
                let classified = (self.error_status)(error);
                (classified.is_retriable, Some(classified.status_code))
            }
            Err(other) => {
                let classified = (self.error_status)(other);
                (classified.is_retriable, Some(classified.status_code))
            }
        };

        let will_retry = retriable && self.config.has_attempts_left(attempt);
        if will_retry {
            let delay = self.config.delay_for(attempt);
            warn!(
                operation = ctx.operation(),
                attempt,
                status,
                delay_ms = u64::try_from(delay.as_millis()).unwrap_or(u64::MAX),
                error = %outcome.result.as_ref().err().map(ToString::to_string).unwrap_or_default(),
                "attempt failed, retrying"
            );
            outcome.disposition = Disposition::RetryAfter(delay);
        } else {
            if retriable {
                warn!(
                    operation = ctx.operation(),
                    attempt,
                    max_attempts = self.config.max_attempts,
                    "retries exhausted"
                );
            }
            outcome.disposition = Disposition::Complete;
        }

        ctx.record_attempt(status, outcome.result.is_ok(), will_retry);
    }
}
