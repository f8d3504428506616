//! Credentials and credentials providers.
//!
//! This module defines [`Credentials`], the [`CredentialsProvider`] trait that
//! supplies them to the signer, and two providers: [`StaticCredentialsProvider`]
//! for fixed keys and [`EnvironmentCredentialsProvider`] for the standard
//! `AWS_*` environment variables.

use chrono::{DateTime, Utc};

use crate::error::AuthError;

/// AWS credentials used to sign a request.
#[derive(Clone, PartialEq, Eq)]
pub struct Credentials {
    /// The AWS access key ID.
    pub access_key_id: String,
    /// The AWS secret access key.
    pub secret_access_key: String,
    /// Optional session token for temporary credentials.
    pub session_token: Option<String>,
    /// When temporary credentials stop being valid.
    pub expiration: Option<DateTime<Utc>>,
}

impl Credentials {
    /// Create long-term credentials without a session token.
    #[must_use]
    pub fn new(access_key_id: impl Into<String>, secret_access_key: impl Into<String>) -> Self {
        Self {
            access_key_id: access_key_id.into(),
            secret_access_key: secret_access_key.into(),
            session_token: None,
            expiration: None,
        }
    }

    /// Attach a session token.
    #[must_use]
    pub fn with_session_token(mut self, token: impl Into<String>) -> Self {
        self.session_token = Some(token.into());
        self
    }

    /// Attach an expiration time.
    #[must_use]
    pub fn with_expiration(mut self, expiration: DateTime<Utc>) -> Self {
        self.expiration = Some(expiration);
        self
    }

    /// Whether the credentials are expired at `now`.
    #[must_use]
    pub fn is_expired_at(&self, now: DateTime<Utc>) -> bool {
        self.expiration.is_some_and(|exp| exp <= now)
    }
}

impl std::fmt::Debug for Credentials {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Credentials")
            .field("access_key_id", &self.access_key_id)
            .field("secret_access_key", &"[REDACTED]")
            .field(
                "session_token",
                &self.session_token.as_ref().map(|_| "[REDACTED]"),
            )
            .field("expiration", &self.expiration)
            .finish()
    }
}

/// Trait for supplying the credentials a request is signed with.
///
/// Implementations may cache, refresh, or fetch credentials from any source;
/// the signer only asks for the current value.
pub trait CredentialsProvider: Send + Sync {
    /// Return the current credentials.
    ///
    /// # Errors
    ///
    /// Returns [`AuthError::MissingCredentials`] if no credentials can be
    /// produced.
    fn credentials(&self) -> Result<Credentials, AuthError>;
}

/// A provider that always returns the same credentials.
///
/// # Examples
///
/// ```
/// use ruststack_auth::credentials::{CredentialsProvider, StaticCredentialsProvider};
///
/// let provider = StaticCredentialsProvider::new("AKID", "secret");
/// assert_eq!(provider.credentials().unwrap().secret_access_key, "secret");
/// ```
#[derive(Debug, Clone)]
pub struct StaticCredentialsProvider {
    credentials: Credentials,
}

impl StaticCredentialsProvider {
    /// Create a provider for long-term keys.
    pub fn new(access_key_id: impl Into<String>, secret_access_key: impl Into<String>) -> Self {
        Self {
            credentials: Credentials::new(access_key_id, secret_access_key),
        }
    }

    /// Create a provider from fully specified credentials.
    #[must_use]
    pub fn from_credentials(credentials: Credentials) -> Self {
        Self { credentials }
    }
}

impl CredentialsProvider for StaticCredentialsProvider {
    fn credentials(&self) -> Result<Credentials, AuthError> {
        Ok(self.credentials.clone())
    }
}

/// A provider reading `AWS_ACCESS_KEY_ID`, `AWS_SECRET_ACCESS_KEY` and the
/// optional `AWS_SESSION_TOKEN` on every call.
#[derive(Debug, Clone, Copy, Default)]
pub struct EnvironmentCredentialsProvider;

impl CredentialsProvider for EnvironmentCredentialsProvider {
    fn credentials(&self) -> Result<Credentials, AuthError> {
        let access_key = std::env::var("AWS_ACCESS_KEY_ID")
            .map_err(|_| AuthError::MissingCredentials("AWS_ACCESS_KEY_ID is not set".to_owned()))?;
        let secret_key = std::env::var("AWS_SECRET_ACCESS_KEY").map_err(|_| {
            AuthError::MissingCredentials("AWS_SECRET_ACCESS_KEY is not set".to_owned())
        })?;

        let mut credentials = Credentials::new(access_key, secret_key);
        if let Ok(token) = std::env::var("AWS_SESSION_TOKEN") {
            if !token.is_empty() {
                credentials.session_token = Some(token);
            }
        }
        Ok(credentials)
    }
}

#[cfg(test)]
mod tests {
    use chrono::Duration;

    use super::*;

    #[test]
    fn test_should_return_static_credentials() {
        let provider = StaticCredentialsProvider::new("AKID", "secret");

        let credentials = provider.credentials().unwrap();
        assert_eq!(credentials.access_key_id, "AKID");
        assert_eq!(credentials.secret_access_key, "secret");
        assert!(credentials.session_token.is_none());
    }

    #[test]
    fn test_should_redact_secrets_in_debug_output() {
        let credentials = Credentials::new("AKID", "super-secret").with_session_token("token");
        let debug = format!("{credentials:?}");
        assert!(debug.contains("AKID"));
        assert!(!debug.contains("super-secret"));
        assert!(!debug.contains("token\""));
    }

    #[test]
    fn test_should_detect_expired_credentials() {
        let now = Utc::now();
        let expired =
            Credentials::new("AKID", "secret").with_expiration(now - Duration::minutes(1));
        let valid = Credentials::new("AKID", "secret").with_expiration(now + Duration::minutes(5));

        assert!(expired.is_expired_at(now));
        assert!(!valid.is_expired_at(now));
        assert!(!Credentials::new("AKID", "secret").is_expired_at(now));
    }
}
