//! Canonical request construction for AWS Signature Version 4.
//!
//! A canonical request has the form:
//!
//! ```text
//! HTTPRequestMethod\n
//! CanonicalURI\n
//! CanonicalQueryString\n
//! CanonicalHeaders\n\n
//! SignedHeaders\n
//! HashedPayload
//! ```
//!
//! The signer and the verifier both go through [`CanonicalRequest`], so a
//! request signed here verifies against the same normalization rules.

use std::collections::BTreeMap;

use http::HeaderMap;
use percent_encoding::{AsciiSet, NON_ALPHANUMERIC, percent_decode_str, utf8_percent_encode};
use sha2::{Digest, Sha256};

use crate::error::AuthError;

/// Characters left unencoded in a canonical path segment: `A-Z a-z 0-9 - _ . ~`.
const URI_ENCODE_SET: &AsciiSet = &NON_ALPHANUMERIC
    .remove(b'-')
    .remove(b'_')
    .remove(b'.')
    .remove(b'~');

/// Headers never included when every header is signed.
const UNSIGNABLE_HEADERS: &[&str] = &[
    "authorization",
    "user-agent",
    "x-amzn-trace-id",
    "expect",
    "connection",
];

/// Header names always signed when present, in addition to `host`.
const MINIMAL_SIGNED_HEADERS: &[&str] = &[
    "host",
    "x-amz-date",
    "x-amz-security-token",
    "x-amz-target",
];

/// The normalized form of a request that is hashed into the string to sign.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CanonicalRequest {
    method: String,
    uri: String,
    query: String,
    headers: String,
    signed_headers: String,
    payload_hash: String,
}

impl CanonicalRequest {
    /// Build the canonical request for a header map.
    ///
    /// # Errors
    ///
    /// Returns [`AuthError::MissingHeader`] if a signed header is absent or
    /// its value is not visible ASCII.
    pub fn new(
        method: &str,
        path: &str,
        uri_encoding: UriEncoding,
        query: &str,
        headers: &HeaderMap,
        signed_headers: &[&str],
        payload_hash: &str,
    ) -> Result<Self, AuthError> {
        Ok(Self {
            method: method.to_owned(),
            uri: canonical_uri(path, uri_encoding),
            query: canonical_query_string(query),
            headers: canonical_headers(headers, signed_headers)?,
            signed_headers: signed_headers_string(signed_headers),
            payload_hash: payload_hash.to_owned(),
        })
    }

    /// The semicolon-separated list of signed header names.
    #[must_use]
    pub fn signed_headers(&self) -> &str {
        &self.signed_headers
    }

    /// Hex-encoded SHA-256 of the canonical request text.
    #[must_use]
    pub fn hash(&self) -> String {
        hex::encode(Sha256::digest(self.to_string().as_bytes()))
    }
}

impl std::fmt::Display for CanonicalRequest {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "{}\n{}\n{}\n{}\n\n{}\n{}",
            self.method, self.uri, self.query, self.headers, self.signed_headers, self.payload_hash
        )
    }
}

/// Choose which headers of an outgoing request are signed.
///
/// With `sign_all` every header except the unsignable ones (`authorization`,
/// `user-agent`, hop-by-hop headers) is signed. Otherwise only `host`,
/// `x-amz-date`, and the session-token and target headers when present.
/// The result is lowercase, sorted, and deduplicated.
///
/// # Examples
///
/// ```
/// use http::HeaderMap;
/// use ruststack_auth::canonical::select_signed_headers;
///
/// let mut headers = HeaderMap::new();
/// headers.insert("host", "cloudformation.us-east-1.amazonaws.com".parse().unwrap());
/// headers.insert("x-amz-date", "20240101T000000Z".parse().unwrap());
/// headers.insert("content-type", "application/x-amz-json-1.0".parse().unwrap());
///
/// assert_eq!(select_signed_headers(&headers, false), vec!["host", "x-amz-date"]);
/// assert_eq!(
///     select_signed_headers(&headers, true),
///     vec!["content-type", "host", "x-amz-date"]
/// );
/// ```
#[must_use]
pub fn select_signed_headers(headers: &HeaderMap, sign_all: bool) -> Vec<String> {
    let mut names: Vec<String> = headers
        .keys()
        .map(|name| name.as_str().to_owned())
        .filter(|name| {
            if sign_all {
                !UNSIGNABLE_HEADERS.contains(&name.as_str())
            } else {
                MINIMAL_SIGNED_HEADERS.contains(&name.as_str())
            }
        })
        .collect();
    names.sort_unstable();
    names.dedup();
    names
}

/// How path segments are encoded into the canonical URI.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum UriEncoding {
    /// Each segment is URI-encoded once more on top of its wire encoding.
    /// Every service except S3 signs this way.
    #[default]
    Double,
    /// Each segment is normalized to a single encoding, as S3 expects.
    Single,
}

impl UriEncoding {
    /// The encoding `service` expects.
    ///
    /// ```
    /// use ruststack_auth::canonical::UriEncoding;
    ///
    /// assert_eq!(UriEncoding::for_service("s3"), UriEncoding::Single);
    /// assert_eq!(UriEncoding::for_service("cloudformation"), UriEncoding::Double);
    /// ```
    #[must_use]
    pub fn for_service(service: &str) -> Self {
        if service == "s3" {
            Self::Single
        } else {
            Self::Double
        }
    }
}

/// Canonical URI: each path segment decoded then re-encoded, slashes kept.
/// With [`UriEncoding::Double`] the re-encoded segment is encoded again.
///
/// # Examples
///
/// ```
/// use ruststack_auth::canonical::{UriEncoding, canonical_uri};
///
/// assert_eq!(canonical_uri("", UriEncoding::Double), "/");
/// assert_eq!(canonical_uri("/stacks/my stack", UriEncoding::Single), "/stacks/my%20stack");
/// assert_eq!(
///     canonical_uri("/stacks/my%20stack", UriEncoding::Double),
///     "/stacks/my%2520stack"
/// );
/// ```
#[must_use]
pub fn canonical_uri(path: &str, encoding: UriEncoding) -> String {
    if path.is_empty() || path == "/" {
        return "/".to_owned();
    }

    path.split('/')
        .map(|segment| {
            let decoded = percent_decode_str(segment).decode_utf8_lossy();
            let single = utf8_percent_encode(&decoded, URI_ENCODE_SET).to_string();
            match encoding {
                UriEncoding::Single => single,
                UriEncoding::Double => utf8_percent_encode(&single, URI_ENCODE_SET).to_string(),
            }
        })
        .collect::<Vec<_>>()
        .join("/")
}

/// Canonical query string: `key=value` pairs sorted by key, then value.
///
/// Values are used exactly as they appear on the wire.
#[must_use]
pub fn canonical_query_string(query: &str) -> String {
    let mut params: Vec<(&str, &str)> = query
        .split('&')
        .filter(|s| !s.is_empty())
        .map(|param| param.split_once('=').unwrap_or((param, "")))
        .collect();
    params.sort_unstable();

    params
        .iter()
        .map(|(k, v)| format!("{k}={v}"))
        .collect::<Vec<_>>()
        .join("&")
}

/// Canonical headers for the signed header names, one `name:value` per line.
///
/// Repeated headers are joined with commas; values are trimmed and runs of
/// whitespace collapsed to one space. No trailing newline.
///
/// # Errors
///
/// Returns [`AuthError::MissingHeader`] if a signed header is absent or is not
/// visible ASCII.
pub fn canonical_headers(
    headers: &HeaderMap,
    signed_headers: &[&str],
) -> Result<String, AuthError> {
    let mut lines: BTreeMap<String, String> = BTreeMap::new();

    for &name in signed_headers {
        let lower = name.to_ascii_lowercase();
        let mut values = headers.get_all(lower.as_str()).iter().peekable();
        if values.peek().is_none() {
            return Err(AuthError::MissingHeader(lower));
        }

        let mut joined = Vec::new();
        for value in values {
            let value = value
                .to_str()
                .map_err(|_| AuthError::MissingHeader(lower.clone()))?;
            joined.push(collapse_whitespace(value.trim()));
        }
        lines.insert(lower, joined.join(","));
    }

    Ok(lines
        .iter()
        .map(|(name, value)| format!("{name}:{value}"))
        .collect::<Vec<_>>()
        .join("\n"))
}

/// Sorted, semicolon-separated, lowercase signed header list.
#[must_use]
pub fn signed_headers_string(signed_headers: &[&str]) -> String {
    let mut sorted: Vec<String> = signed_headers
        .iter()
        .map(|name| name.to_ascii_lowercase())
        .collect();
    sorted.sort_unstable();
    sorted.dedup();
    sorted.join(";")
}

fn collapse_whitespace(s: &str) -> String {
    let mut result = String::with_capacity(s.len());
    let mut prev_was_space = false;
    for ch in s.chars() {
        if ch.is_whitespace() {
            if !prev_was_space {
                result.push(' ');
            }
            prev_was_space = true;
        } else {
            result.push(ch);
            prev_was_space = false;
        }
    }
    result
}
