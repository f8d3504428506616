//! Error types for the RustStack core.

/// Core error type for RustStack infrastructure.
#[derive(Debug, thiserror::Error)]
pub enum RustStackError {
    /// Unsupported endpoint protocol.
    #[error("invalid endpoint protocol: {0} (expected `http` or `https`)")]
    InvalidProtocol(String),

    /// Configuration error.
    #[error("configuration error: {0}")]
    Config(String),

    /// Internal error with context.
    #[error(transparent)]
    Internal(#[from] anyhow::Error),
}

/// Convenience result type for RustStack operations.
pub type RustStackResult<T> = Result<T, RustStackError>;
