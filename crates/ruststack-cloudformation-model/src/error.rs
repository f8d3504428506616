//! CloudFormation error types.
//!
//! CloudFormation reports errors as JSON with a `__type` field (or an
//! `x-amzn-errortype` header) naming the error shape. The query-compatible
//! codes some endpoints still send (`ChangeSetNotFound`,
//! `InvalidChangeSetStatus`, ...) are accepted as aliases.

use std::fmt;

use ruststack_http_client::{HttpClientError, ServiceError};

/// Error codes declared by the CloudFormation API.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[non_exhaustive]
pub enum CloudFormationErrorCode {
    /// Resource with the name requested already exists.
    AlreadyExistsException,
    /// An error occurred during a CloudFormation registry operation.
    CFNRegistryException,
    /// The specified change set name or ID doesn't exist.
    ChangeSetNotFoundException,
    /// The resource was created, but modified afterwards.
    CreatedButModifiedException,
    /// The template contains resources with capabilities that weren't specified.
    InsufficientCapabilitiesException,
    /// The change set can't be used in its current state.
    InvalidChangeSetStatusException,
    /// The specified operation isn't valid.
    InvalidOperationException,
    /// Error reserved for use by the CloudFormation CLI.
    InvalidStateTransitionException,
    /// The quota for the resource has already been reached.
    LimitExceededException,
    /// The specified name is already in use.
    NameAlreadyExistsException,
    /// The specified operation ID already exists.
    OperationIdAlreadyExistsException,
    /// Another operation is currently in progress for this stack set.
    OperationInProgressException,
    /// The specified ID refers to an operation that doesn't exist.
    OperationNotFoundException,
    /// Error reserved for use by the CloudFormation CLI.
    OperationStatusCheckFailedException,
    /// The specified stack instance doesn't exist.
    StackInstanceNotFoundException,
    /// The specified stack ARN doesn't exist or stack doesn't exist.
    StackNotFoundException,
    /// The stack set can't be deleted because it still contains stack instances.
    StackSetNotEmptyException,
    /// The specified stack set doesn't exist.
    StackSetNotFoundException,
    /// Another operation has been performed on this stack set since the
    /// specified operation was performed.
    StaleRequestException,
    /// A client request token already exists.
    TokenAlreadyExistsException,
    /// The specified extension configuration can't be found.
    TypeConfigurationNotFoundException,
    /// The specified extension doesn't exist in the CloudFormation registry.
    TypeNotFoundException,
}

impl CloudFormationErrorCode {
    /// Every declared code.
    pub const ALL: [Self; 22] = [
        Self::AlreadyExistsException,
        Self::CFNRegistryException,
        Self::ChangeSetNotFoundException,
        Self::CreatedButModifiedException,
        Self::InsufficientCapabilitiesException,
        Self::InvalidChangeSetStatusException,
        Self::InvalidOperationException,
        Self::InvalidStateTransitionException,
        Self::LimitExceededException,
        Self::NameAlreadyExistsException,
        Self::OperationIdAlreadyExistsException,
        Self::OperationInProgressException,
        Self::OperationNotFoundException,
        Self::OperationStatusCheckFailedException,
        Self::StackInstanceNotFoundException,
        Self::StackNotFoundException,
        Self::StackSetNotEmptyException,
        Self::StackSetNotFoundException,
        Self::StaleRequestException,
        Self::TokenAlreadyExistsException,
        Self::TypeConfigurationNotFoundException,
        Self::TypeNotFoundException,
    ];

    /// Returns the error shape name, as sent in `__type`.
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::AlreadyExistsException => "AlreadyExistsException",
            Self::CFNRegistryException => "CFNRegistryException",
            Self::ChangeSetNotFoundException => "ChangeSetNotFoundException",
            Self::CreatedButModifiedException => "CreatedButModifiedException",
            Self::InsufficientCapabilitiesException => "InsufficientCapabilitiesException",
            Self::InvalidChangeSetStatusException => "InvalidChangeSetStatusException",
            Self::InvalidOperationException => "InvalidOperationException",
            Self::InvalidStateTransitionException => "InvalidStateTransitionException",
            Self::LimitExceededException => "LimitExceededException",
            Self::NameAlreadyExistsException => "NameAlreadyExistsException",
            Self::OperationIdAlreadyExistsException => "OperationIdAlreadyExistsException",
            Self::OperationInProgressException => "OperationInProgressException",
            Self::OperationNotFoundException => "OperationNotFoundException",
            Self::OperationStatusCheckFailedException => "OperationStatusCheckFailedException",
            Self::StackInstanceNotFoundException => "StackInstanceNotFoundException",
            Self::StackNotFoundException => "StackNotFoundException",
            Self::StackSetNotEmptyException => "StackSetNotEmptyException",
            Self::StackSetNotFoundException => "StackSetNotFoundException",
            Self::StaleRequestException => "StaleRequestException",
            Self::TokenAlreadyExistsException => "TokenAlreadyExistsException",
            Self::TypeConfigurationNotFoundException => "TypeConfigurationNotFoundException",
            Self::TypeNotFoundException => "TypeNotFoundException",
        }
    }

    /// Returns the query-protocol code when it differs from the shape name.
    #[must_use]
    pub fn query_code(&self) -> Option<&'static str> {
        match self {
            Self::ChangeSetNotFoundException => Some("ChangeSetNotFound"),
            Self::InvalidChangeSetStatusException => Some("InvalidChangeSetStatus"),
            Self::InvalidStateTransitionException => Some("InvalidStateTransition"),
            Self::OperationStatusCheckFailedException => Some("ConditionalCheckFailed"),
            Self::StackInstanceNotFoundException => Some("StackInstanceNotFound"),
            Self::StackNotFoundException => Some("StackNotFound"),
            Self::StackSetNotEmptyException => Some("StackSetNotEmpty"),
            Self::StackSetNotFoundException => Some("StackSetNotFound"),
            Self::CFNRegistryException
            | Self::TypeConfigurationNotFoundException
            | Self::TypeNotFoundException
            | Self::AlreadyExistsException
            | Self::CreatedButModifiedException
            | Self::InsufficientCapabilitiesException
            | Self::InvalidOperationException
            | Self::LimitExceededException
            | Self::NameAlreadyExistsException
            | Self::OperationIdAlreadyExistsException
            | Self::OperationInProgressException
            | Self::OperationNotFoundException
            | Self::StaleRequestException
            | Self::TokenAlreadyExistsException => None,
        }
    }

    /// Parse a shape name or query-protocol code.
    #[must_use]
    pub fn from_code(code: &str) -> Option<Self> {
        Self::ALL
            .into_iter()
            .find(|candidate| candidate.as_str() == code || candidate.query_code() == Some(code))
    }

    /// All strings a response may use for this code.
    pub fn wire_codes(&self) -> impl Iterator<Item = &'static str> {
        std::iter::once(self.as_str()).chain(self.query_code())
    }

    /// Whether a call failing with this code may succeed when resent.
    ///
    /// Only the conflicts that clear on their own are retried. These are
    /// stack set errors; no operation this crate models declares them, so
    /// they surface typed only through a stack configured to declare them.
    #[must_use]
    pub fn is_retriable(&self) -> bool {
        matches!(
            self,
            Self::OperationInProgressException | Self::StaleRequestException
        )
    }
}

impl fmt::Display for CloudFormationErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Error returned by every CloudFormation client call.
///
/// Either one of the operation's declared errors or a generic failure from
/// the request pipeline.
#[derive(Debug, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum CloudFormationError {
    /// A declared service error.
    Declared {
        /// Error code.
        code: CloudFormationErrorCode,
        /// Message sent by the service.
        message: Option<String>,
    },
    /// The input could not be encoded into a request.
    Validation(String),
    /// Credentials were missing, expired or unusable for signing.
    Credentials(String),
    /// The transport failed to deliver the request or read the response.
    Transport {
        /// Transport message.
        message: String,
        /// Whether the transport flagged the failure as transient.
        retriable: bool,
    },
    /// A non-2xx response that is not a declared error of the operation.
    Client {
        /// HTTP status.
        status: u16,
        /// AWS error code, if the response carried one.
        code: Option<String>,
        /// Error message.
        message: String,
        /// Retriability by status classification.
        retriable: bool,
    },
    /// The response body or headers could not be decoded.
    Deserialization(String),
    /// The call was cancelled.
    Cancelled,
}

impl CloudFormationError {
    /// A declared error with a message.
    #[must_use]
    pub fn declared(code: CloudFormationErrorCode, message: impl Into<String>) -> Self {
        Self::Declared {
            code,
            message: Some(message.into()),
        }
    }

    /// The AWS error code, when known.
    #[must_use]
    pub fn code(&self) -> Option<&str> {
        match self {
            Self::Declared { code, .. } => Some(code.as_str()),
            Self::Client { code, .. } => code.as_deref(),
            _ => None,
        }
    }

    /// The declared code, if this is a declared error.
    #[must_use]
    pub fn declared_code(&self) -> Option<CloudFormationErrorCode> {
        match self {
            Self::Declared { code, .. } => Some(*code),
            _ => None,
        }
    }

    /// Whether the failure was classified as transient.
    #[must_use]
    pub fn is_retriable(&self) -> bool {
        match self {
            Self::Declared { code, .. } => code.is_retriable(),
            Self::Transport { retriable, .. } | Self::Client { retriable, .. } => *retriable,
            Self::Validation(_)
            | Self::Credentials(_)
            | Self::Deserialization(_)
            | Self::Cancelled => false,
        }
    }
}

impl fmt::Display for CloudFormationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Declared {
                code,
                message: Some(message),
            } => write!(f, "CloudFormationError({code}): {message}"),
            Self::Declared {
                code,
                message: None,
            } => write!(f, "CloudFormationError({code})"),
            Self::Validation(message) => write!(f, "invalid input: {message}"),
            Self::Credentials(message) => write!(f, "credentials error: {message}"),
            Self::Transport { message, .. } => write!(f, "transport error: {message}"),
            Self::Client {
                status,
                code: Some(code),
                message,
                ..
            } => write!(f, "client error ({status} {code}): {message}"),
            Self::Client {
                status, message, ..
            } => write!(f, "client error ({status}): {message}"),
            Self::Deserialization(message) => write!(f, "failed to decode response: {message}"),
            Self::Cancelled => f.write_str("call cancelled"),
        }
    }
}

impl std::error::Error for CloudFormationError {}

impl ServiceError for CloudFormationError {
    fn from_code(code: &str, message: Option<String>) -> Option<Self> {
        CloudFormationErrorCode::from_code(code).map(|code| Self::Declared { code, message })
    }

    fn is_retriable(&self) -> bool {
        CloudFormationError::is_retriable(self)
    }
}

impl From<HttpClientError<CloudFormationError>> for CloudFormationError {
    fn from(err: HttpClientError<CloudFormationError>) -> Self {
        match err {
            HttpClientError::Service(err) => err,
            HttpClientError::Validation(message) => Self::Validation(message),
            HttpClientError::Signing(err) => Self::Credentials(err.to_string()),
            HttpClientError::Transport(err) => Self::Transport {
                message: err.message,
                retriable: err.retriable,
            },
            HttpClientError::Client {
                status,
                code,
                message,
                retriable,
            } => Self::Client {
                status,
                code,
                message,
                retriable,
            },
            HttpClientError::Deserialization(message) => Self::Deserialization(message),
            HttpClientError::Cancelled => Self::Cancelled,
        }
    }
}

/// Create a declared [`CloudFormationError`] from an error code.
///
/// # Examples
///
/// ```
/// use ruststack_cloudformation_model::cloudformation_error;
/// use ruststack_cloudformation_model::error::CloudFormationErrorCode;
///
/// let err = cloudformation_error!(LimitExceededException);
/// assert_eq!(err.declared_code(), Some(CloudFormationErrorCode::LimitExceededException));
///
/// let err = cloudformation_error!(AlreadyExistsException, "Stack [web] already exists");
/// assert_eq!(err.code(), Some("AlreadyExistsException"));
/// ```
#[macro_export]
macro_rules! cloudformation_error {
    ($code:ident) => {
        $crate::error::CloudFormationError::Declared {
            code: $crate::error::CloudFormationErrorCode::$code,
            message: None,
        }
    };
    ($code:ident, $msg:expr) => {
        $crate::error::CloudFormationError::declared(
            $crate::error::CloudFormationErrorCode::$code,
            $msg,
        )
    };
}
