//! Error types for request signing and verification.
//!
//! Every failure is represented by [`AuthError`]. Signing failures are fatal
//! for the call that hit them; credential refresh is the provider's concern.

/// Errors that can occur while signing or verifying a SigV4 request.
#[derive(Debug, thiserror::Error)]
pub enum AuthError {
    /// No credentials are available from the provider.
    #[error("No credentials available: {0}")]
    MissingCredentials(String),

    /// The credentials have passed their expiration time.
    #[error("Credentials for {0} have expired")]
    ExpiredCredentials(String),

    /// The `Authorization` header is missing from the request.
    #[error("Missing Authorization header")]
    MissingAuthHeader,

    /// The `Authorization` header could not be parsed.
    #[error("Invalid Authorization header format")]
    InvalidAuthHeader,

    /// The signing algorithm is not supported (only AWS4-HMAC-SHA256 is supported).
    #[error("Unsupported algorithm: {0}")]
    UnsupportedAlgorithm(String),

    /// A header that must be signed is missing or not valid visible ASCII.
    #[error("Missing required header: {0}")]
    MissingHeader(String),

    /// The `Credential` component does not match the expected format
    /// (`AKID/date/region/service/aws4_request`).
    #[error("Invalid credential format")]
    InvalidCredential,

    /// The access key ID in the request does not match the known credentials.
    #[error("Access key not found: {0}")]
    AccessKeyNotFound(String),

    /// The computed signature does not match the provided signature.
    #[error("Signature does not match")]
    SignatureDoesNotMatch,
}
