//! AWS Signature Version 4 signing and verification.
//!
//! Signing an outgoing request:
//!
//! 1. Build the canonical request from method, path, query, the chosen signed
//!    headers and the payload hash.
//! 2. Build the string to sign from the timestamp, credential scope and the
//!    canonical request hash.
//! 3. Derive the signing key from the secret key and the scope components.
//! 4. Produce the hex signature and the `Authorization` header value.
//!
//! [`verify_sigv4`] runs the same steps from a received request and compares
//! the result in constant time. Test servers use it to check what the client
//! signs.

use chrono::{DateTime, Utc};
use hmac::{Hmac, KeyInit, Mac};
use sha2::{Digest, Sha256};
use subtle::ConstantTimeEq;
use tracing::debug;

use crate::canonical::{CanonicalRequest, UriEncoding};
use crate::credentials::{Credentials, CredentialsProvider};
use crate::error::AuthError;

/// The only algorithm supported by this implementation.
pub const SUPPORTED_ALGORITHM: &str = "AWS4-HMAC-SHA256";

/// `strftime` format of the `x-amz-date` header.
const AMZ_DATE_FORMAT: &str = "%Y%m%dT%H%M%SZ";

/// `strftime` format of the credential scope date.
const SCOPE_DATE_FORMAT: &str = "%Y%m%d";

type HmacSha256 = Hmac<Sha256>;

/// Inputs to [`sign_request`] other than the request itself.
#[derive(Debug, Clone, Copy)]
pub struct SigningParams<'a> {
    /// Credentials the request is signed with.
    pub credentials: &'a Credentials,
    /// AWS region of the credential scope.
    pub region: &'a str,
    /// Service name of the credential scope, e.g. `cloudformation`.
    pub service: &'a str,
    /// Signing time. Must match the `x-amz-date` header already on the request.
    pub timestamp: DateTime<Utc>,
    /// How the path enters the canonical request.
    pub uri_encoding: UriEncoding,
}

/// The result of signing a request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SigningOutput {
    /// Value for the `Authorization` header.
    pub authorization: String,
    /// Hex-encoded signature.
    pub signature: String,
    /// Semicolon-separated signed header list.
    pub signed_headers: String,
    /// Timestamp in `x-amz-date` format.
    pub amz_date: String,
}

/// The result of a successful SigV4 verification.
#[derive(Debug, Clone)]
pub struct VerifiedSignature {
    /// The access key ID that signed the request.
    pub access_key_id: String,
    /// The AWS region from the credential scope.
    pub region: String,
    /// The AWS service from the credential scope.
    pub service: String,
    /// The headers that were included in the signature.
    pub signed_headers: Vec<String>,
}

/// Parsed components of an AWS SigV4 `Authorization` header.
///
/// ```text
/// AWS4-HMAC-SHA256 Credential=AKID/20130524/us-east-1/cloudformation/aws4_request,
///   SignedHeaders=host;x-amz-date;x-amz-target,
///   Signature=<hex-signature>
/// ```
#[derive(Debug, Clone)]
pub struct ParsedAuth {
    /// The access key ID.
    pub access_key_id: String,
    /// The date component of the credential scope (YYYYMMDD).
    pub date: String,
    /// The AWS region from the credential scope.
    pub region: String,
    /// The AWS service from the credential scope.
    pub service: String,
    /// The signed header names (lowercase).
    pub signed_headers: Vec<String>,
    /// The hex-encoded signature.
    pub signature: String,
}

/// Format a timestamp as an `x-amz-date` header value.
///
/// # Examples
///
/// ```
/// use chrono::{TimeZone, Utc};
/// use ruststack_auth::sigv4::format_amz_date;
///
/// let ts = Utc.with_ymd_and_hms(2013, 5, 24, 0, 0, 0).unwrap();
/// assert_eq!(format_amz_date(ts), "20130524T000000Z");
/// ```
#[must_use]
pub fn format_amz_date(timestamp: DateTime<Utc>) -> String {
    timestamp.format(AMZ_DATE_FORMAT).to_string()
}

/// Sign a request.
///
/// `headers` must already carry every name in `signed_headers`, including
/// `host` and `x-amz-date`. The caller adds the returned `authorization` value
/// to the request; nothing is mutated here.
///
/// # Errors
///
/// Returns [`AuthError::ExpiredCredentials`] if the credentials expired before
/// `params.timestamp`, or [`AuthError::MissingHeader`] if a signed header is
/// absent.
pub fn sign_request(
    method: &http::Method,
    uri: &http::Uri,
    headers: &http::HeaderMap,
    signed_headers: &[&str],
    payload: &[u8],
    params: &SigningParams<'_>,
) -> Result<SigningOutput, AuthError> {
    let credentials = params.credentials;
    if credentials.is_expired_at(params.timestamp) {
        return Err(AuthError::ExpiredCredentials(
            credentials.access_key_id.clone(),
        ));
    }

    let amz_date = format_amz_date(params.timestamp);
    let scope_date = params.timestamp.format(SCOPE_DATE_FORMAT).to_string();

    let canonical = CanonicalRequest::new(
        method.as_str(),
        uri.path(),
        params.uri_encoding,
        uri.query().unwrap_or(""),
        headers,
        signed_headers,
        &hash_payload(payload),
    )?;
    debug!(canonical_request = %canonical, "built canonical request");

    let credential_scope = format!(
        "{scope_date}/{}/{}/aws4_request",
        params.region, params.service
    );
    let string_to_sign = build_string_to_sign(&amz_date, &credential_scope, &canonical.hash());

    let signing_key = derive_signing_key(
        &credentials.secret_access_key,
        &scope_date,
        params.region,
        params.service,
    );
    let signature = compute_signature(&signing_key, &string_to_sign);
    let signed_headers = canonical.signed_headers().to_owned();

    let authorization = format!(
        "{SUPPORTED_ALGORITHM} Credential={}/{credential_scope}, \
         SignedHeaders={signed_headers}, Signature={signature}",
        credentials.access_key_id
    );

    Ok(SigningOutput {
        authorization,
        signature,
        signed_headers,
        amz_date,
    })
}

/// Parse an AWS SigV4 `Authorization` header value into its components.
///
/// # Errors
///
/// Returns [`AuthError::InvalidAuthHeader`] if the header format is invalid,
/// [`AuthError::UnsupportedAlgorithm`] if the algorithm is not
/// `AWS4-HMAC-SHA256`, or [`AuthError::InvalidCredential`] for a malformed scope.
pub fn parse_authorization_header(header: &str) -> Result<ParsedAuth, AuthError> {
    let (algorithm, fields) = header.split_once(' ').ok_or(AuthError::InvalidAuthHeader)?;
    if algorithm != SUPPORTED_ALGORITHM {
        return Err(AuthError::UnsupportedAlgorithm(algorithm.to_owned()));
    }

    let field = |name: &str| {
        fields
            .split(',')
            .filter_map(|kv| kv.trim().split_once('='))
            .find_map(|(key, value)| (key == name).then_some(value))
            .ok_or(AuthError::InvalidAuthHeader)
    };
    let credential = field("Credential")?;
    let signed_headers = field("SignedHeaders")?;
    let signature = field("Signature")?;

    let [access_key_id, date, region, service, terminator] = credential
        .splitn(5, '/')
        .collect::<Vec<_>>()[..]
    else {
        return Err(AuthError::InvalidCredential);
    };
    if terminator != "aws4_request" {
        return Err(AuthError::InvalidCredential);
    }

    Ok(ParsedAuth {
        access_key_id: access_key_id.to_owned(),
        date: date.to_owned(),
        region: region.to_owned(),
        service: service.to_owned(),
        signed_headers: signed_headers.split(';').map(ToOwned::to_owned).collect(),
        signature: signature.to_owned(),
    })
}

/// Build the SigV4 string to sign.
///
/// ```text
/// AWS4-HMAC-SHA256\n
/// <ISO8601 timestamp>\n
/// <credential_scope>\n
/// <hex(SHA256(canonical_request))>
/// ```
#[must_use]
pub fn build_string_to_sign(
    timestamp: &str,
    credential_scope: &str,
    canonical_request_hash: &str,
) -> String {
    format!("{SUPPORTED_ALGORITHM}\n{timestamp}\n{credential_scope}\n{canonical_request_hash}")
}

/// Derive the SigV4 signing key using the HMAC-SHA256 chain.
///
/// ```text
/// DateKey              = HMAC-SHA256("AWS4" + secret_key, date)
/// DateRegionKey        = HMAC-SHA256(DateKey, region)
/// DateRegionServiceKey = HMAC-SHA256(DateRegionKey, service)
/// SigningKey           = HMAC-SHA256(DateRegionServiceKey, "aws4_request")
/// ```
#[must_use]
pub fn derive_signing_key(secret_key: &str, date: &str, region: &str, service: &str) -> Vec<u8> {
    let date_key = hmac_sha256(format!("AWS4{secret_key}").as_bytes(), date.as_bytes());
    let date_region_key = hmac_sha256(&date_key, region.as_bytes());
    let date_region_service_key = hmac_sha256(&date_region_key, service.as_bytes());
    hmac_sha256(&date_region_service_key, b"aws4_request")
}

/// Hex-encoded HMAC-SHA256 of `data` under `signing_key`.
#[must_use]
pub fn compute_signature(signing_key: &[u8], data: &str) -> String {
    hex::encode(hmac_sha256(signing_key, data.as_bytes()))
}

/// Verify a SigV4-signed request against the provider's credentials.
///
/// # Errors
///
/// Returns an [`AuthError`] if the `Authorization` header is missing or
/// malformed, the access key differs from the provider's, a signed header is
/// missing, or the signature does not match.
pub fn verify_sigv4(
    parts: &http::request::Parts,
    body_hash: &str,
    provider: &dyn CredentialsProvider,
) -> Result<VerifiedSignature, AuthError> {
    let auth_header = parts
        .headers
        .get(http::header::AUTHORIZATION)
        .ok_or(AuthError::MissingAuthHeader)?
        .to_str()
        .map_err(|_| AuthError::InvalidAuthHeader)?;

    let parsed = parse_authorization_header(auth_header)?;

    let credentials = provider.credentials()?;
    if credentials.access_key_id != parsed.access_key_id {
        return Err(AuthError::AccessKeyNotFound(parsed.access_key_id));
    }

    let timestamp = parts
        .headers
        .get("x-amz-date")
        .and_then(|v| v.to_str().ok())
        .ok_or_else(|| AuthError::MissingHeader("x-amz-date".to_owned()))?;

    let signed_refs: Vec<&str> = parsed.signed_headers.iter().map(String::as_str).collect();
    let canonical = CanonicalRequest::new(
        parts.method.as_str(),
        parts.uri.path(),
        UriEncoding::for_service(&parsed.service),
        parts.uri.query().unwrap_or(""),
        &parts.headers,
        &signed_refs,
        body_hash,
    )?;

    let credential_scope = format!(
        "{}/{}/{}/aws4_request",
        parsed.date, parsed.region, parsed.service
    );
    let string_to_sign = build_string_to_sign(timestamp, &credential_scope, &canonical.hash());
    let signing_key = derive_signing_key(
        &credentials.secret_access_key,
        &parsed.date,
        &parsed.region,
        &parsed.service,
    );
    let expected = compute_signature(&signing_key, &string_to_sign);

    if parsed.signature.as_bytes().ct_eq(expected.as_bytes()).into() {
        debug!(access_key_id = %parsed.access_key_id, "signature verification succeeded");
        Ok(VerifiedSignature {
            access_key_id: parsed.access_key_id,
            region: parsed.region,
            service: parsed.service,
            signed_headers: parsed.signed_headers,
        })
    } else {
        debug!(expected = %expected, provided = %parsed.signature, "signature mismatch");
        Err(AuthError::SignatureDoesNotMatch)
    }
}

fn hmac_sha256(key: &[u8], data: &[u8]) -> Vec<u8> {
    let mut mac = HmacSha256::new_from_slice(key).expect("HMAC can accept keys of any length");
    mac.update(data);
    mac.finalize().into_bytes().to_vec()
}

/// Hex-encoded SHA-256 of a payload.
///
/// # Examples
///
/// ```
/// use ruststack_auth::sigv4::hash_payload;
///
/// assert_eq!(
///     hash_payload(b""),
///     "e3b0c44298fc1c149afbf4c8996fb92427ae41e4649b934ca495991b7852b855"
/// );
/// ```
#[must_use]
pub fn hash_payload(payload: &[u8]) -> String {
    hex::encode(Sha256::digest(payload))
}
