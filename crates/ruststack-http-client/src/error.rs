//! Error types for the operation pipeline.
//!
//! [`HttpClientError`] is what a call through an
//! [`OperationMiddlewareStack`](crate::stack::OperationMiddlewareStack) fails
//! with. It is generic over the service's typed error `E`, which implements
//! [`ServiceError`] so the typed-error stage can decode it from a response.

use ruststack_auth::AuthError;

/// A failure reported by the HTTP transport.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("{message}")]
pub struct TransportError {
    /// Human-readable description.
    pub message: String,
    /// Whether the transport considers the failure transient.
    pub retriable: bool,
}

impl TransportError {
    /// A transient failure, e.g. a refused connection or a dropped body.
    #[must_use]
    pub fn retriable(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            retriable: true,
        }
    }

    /// A failure that will not go away by resending the same request.
    #[must_use]
    pub fn fatal(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            retriable: false,
        }
    }
}

/// Errors produced while encoding inputs or decoding outputs.
#[derive(Debug, thiserror::Error)]
pub enum CodecError {
    /// A path placeholder had no matching input field.
    #[error("path placeholder {{{0}}} has no value")]
    UnresolvedPlaceholder(String),

    /// A value cannot be represented in the target location.
    #[error("unsupported shape for {location}: {detail}")]
    UnsupportedShape {
        /// Where the value was going (path, query, header).
        location: &'static str,
        /// What was wrong with it.
        detail: String,
    },

    /// A map key did not serialize to a scalar.
    #[error("map keys must be scalar values")]
    InvalidMapKey,

    /// A header value contains characters not allowed in HTTP headers.
    #[error("invalid value for header {0}")]
    InvalidHeader(String),

    /// JSON encoding or decoding failed.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// A response body exceeded the configured size cap.
    #[error("body of {size} bytes exceeds the {max} byte limit")]
    BodyTooLarge {
        /// Actual body size.
        size: usize,
        /// Configured maximum.
        max: usize,
    },

    /// Free-form error raised by a `Serialize` implementation.
    #[error("{0}")]
    Message(String),
}

impl serde::ser::Error for CodecError {
    fn custom<T: std::fmt::Display>(msg: T) -> Self {
        Self::Message(msg.to_string())
    }
}

/// Errors from modifying a [`Phase`](crate::phase::Phase).
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum StackError {
    /// A relative position named a stage that is not in the phase.
    #[error("no stage named {0:?} in this phase")]
    StageNotFound(String),
}

/// Why a request stage failed. Always fatal for the call.
#[derive(Debug, thiserror::Error)]
pub enum StageError {
    /// The input could not be encoded.
    #[error(transparent)]
    Codec(#[from] CodecError),
    /// Credentials were unavailable or signing failed.
    #[error(transparent)]
    Signing(#[from] AuthError),
}

impl<E> From<StageError> for HttpClientError<E> {
    fn from(err: StageError) -> Self {
        match err {
            StageError::Codec(err) => Self::Validation(err.to_string()),
            StageError::Signing(err) => Self::Signing(err),
        }
    }
}

/// A service's declared error type.
///
/// The typed-error stage calls [`ServiceError::from_code`] with the error code
/// found in a failed response; returning `None` hands the response to the
/// generic client-error classification.
pub trait ServiceError: std::error::Error + Send + Sync + Sized + 'static {
    /// Build the typed error for an AWS error code, or `None` if the code is
    /// not one this service declares.
    fn from_code(code: &str, message: Option<String>) -> Option<Self>;

    /// Whether this error may succeed on a later attempt.
    fn is_retriable(&self) -> bool {
        false
    }
}

/// The error a pipeline call fails with.
#[derive(Debug, thiserror::Error)]
pub enum HttpClientError<E> {
    /// The input could not be encoded into a request.
    #[error("invalid input: {0}")]
    Validation(String),

    /// Signing failed, usually because of missing or expired credentials.
    #[error("signing failed: {0}")]
    Signing(#[from] AuthError),

    /// The transport could not deliver the request or read the response.
    #[error("transport error: {0}")]
    Transport(#[from] TransportError),

    /// The service returned one of its declared errors.
    #[error("{0}")]
    Service(E),

    /// The service returned an error that is not a declared one.
    #[error("HTTP {status} ({}): {message}", .code.as_deref().unwrap_or("unknown"))]
    Client {
        /// HTTP status code.
        status: u16,
        /// AWS error code, when one could be read from the response.
        code: Option<String>,
        /// Error message from the response, or the status reason.
        message: String,
        /// Whether the status classification allows another attempt.
        retriable: bool,
    },

    /// A successful response could not be decoded into the output type.
    #[error("failed to decode response: {0}")]
    Deserialization(String),

    /// The call was cancelled before it completed.
    #[error("call cancelled")]
    Cancelled,
}

impl<E> From<CodecError> for HttpClientError<E> {
    fn from(err: CodecError) -> Self {
        Self::Validation(err.to_string())
    }
}

impl<E> HttpClientError<E> {
    /// HTTP status associated with the error, if any.
    #[must_use]
    pub fn status(&self) -> Option<u16> {
        match self {
            Self::Client { status, .. } => Some(*status),
            _ => None,
        }
    }

    /// Whether this is a cancellation.
    #[must_use]
    pub fn is_cancelled(&self) -> bool {
        matches!(self, Self::Cancelled)
    }
}
