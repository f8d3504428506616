//! JSON request and response bodies.
//!
//! Timestamps go through chrono's serde support, so `DateTime<Utc>` fields
//! are written and read as RFC 3339 strings.

use bytes::Bytes;
use serde::Serialize;
use serde::de::DeserializeOwned;

use crate::error::CodecError;

/// Default cap on response bodies read for output or error decoding.
pub const DEFAULT_MAX_BYTES: usize = 1_000_000;

/// Serialize a request body.
///
/// # Errors
///
/// Returns [`CodecError::Json`] if the value cannot be serialized.
pub fn encode_body<T: Serialize + ?Sized>(body: &T) -> Result<Bytes, CodecError> {
    Ok(Bytes::from(serde_json::to_vec(body)?))
}

/// Deserialize a response body. An empty body decodes to `None`.
///
/// # Errors
///
/// Returns [`CodecError::BodyTooLarge`] if the body exceeds `max_bytes`, or
/// [`CodecError::Json`] if it does not parse as `T`.
pub fn decode_body<T: DeserializeOwned>(
    body: &[u8],
    max_bytes: usize,
) -> Result<Option<T>, CodecError> {
    if body.len() > max_bytes {
        return Err(CodecError::BodyTooLarge {
            size: body.len(),
            max: max_bytes,
        });
    }
    if body.iter().all(u8::is_ascii_whitespace) {
        return Ok(None);
    }
    Ok(Some(serde_json::from_slice(body)?))
}

#[cfg(test)]
mod tests {
    use chrono::{DateTime, TimeZone, Utc};
    use serde::Deserialize;

    use super::*;

    #[derive(Debug, PartialEq, Serialize, Deserialize)]
    #[serde(rename_all = "PascalCase")]
    struct Event {
        stack_name: String,
        timestamp: DateTime<Utc>,
        #[serde(skip_serializing_if = "Option::is_none")]
        reason: Option<String>,
    }

    #[test]
    fn test_should_write_timestamps_as_rfc3339() {
        let event = Event {
            stack_name: "web".to_owned(),
            timestamp: Utc.with_ymd_and_hms(2024, 1, 2, 3, 4, 5).unwrap(),
            reason: None,
        };
        let body = encode_body(&event).unwrap();
        assert_eq!(
            std::str::from_utf8(&body).unwrap(),
            r#"{"StackName":"web","Timestamp":"2024-01-02T03:04:05Z"}"#
        );

        let decoded: Event = decode_body(&body, DEFAULT_MAX_BYTES).unwrap().unwrap();
        assert_eq!(decoded, event);
    }

    #[test]
    fn test_should_decode_empty_body_as_none() {
        let decoded: Option<Event> = decode_body(b"", DEFAULT_MAX_BYTES).unwrap();
        assert!(decoded.is_none());
    }

    #[test]
    fn test_should_reject_oversized_body() {
        let result: Result<Option<serde_json::Value>, _> = decode_body(b"{\"a\":1}", 4);
        assert!(matches!(
            result,
            Err(CodecError::BodyTooLarge { size: 7, max: 4 })
        ));
    }
}
