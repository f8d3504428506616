//! Header-bound fields.
//!
//! On the way out, each field of the header shape becomes one header named
//! after the field. Nested names are concatenated with no separator, so a map
//! field `x-amz-meta-` with entry `owner` becomes `x-amz-meta-owner`.
//!
//! On the way in, the response headers become a JSON object keyed by
//! lowercase header name and are deserialized into the output's header type.

use http::HeaderMap;
use serde::de::DeserializeOwned;

use crate::error::CodecError;
use crate::shape::Shape;

/// Turn a header shape into `(name, value)` pairs.
///
/// `Null` fields are omitted and list values are joined with `,`.
///
/// # Errors
///
/// Returns [`CodecError::UnsupportedShape`] for a top-level scalar or list,
/// or for lists containing non-scalar members.
pub fn encode_headers(input: &Shape) -> Result<Vec<(String, String)>, CodecError> {
    let mut headers = Vec::new();
    match input {
        Shape::Null => {}
        Shape::Structure(fields) | Shape::Map(fields) => {
            for (name, value) in fields {
                collect(name, value, &mut headers)?;
            }
        }
        Shape::Scalar(_) | Shape::List(_) => {
            return Err(CodecError::UnsupportedShape {
                location: "headers",
                detail: "header input must be a structure or map".to_owned(),
            });
        }
    }
    Ok(headers)
}

fn collect(name: &str, value: &Shape, out: &mut Vec<(String, String)>) -> Result<(), CodecError> {
    match value {
        Shape::Null => {}
        Shape::Scalar(value) => out.push((name.to_owned(), value.clone())),
        Shape::List(items) => {
            let values = items
                .iter()
                .filter(|item| **item != Shape::Null)
                .map(|item| {
                    item.as_scalar().ok_or_else(|| CodecError::UnsupportedShape {
                        location: "headers",
                        detail: format!("list header {name} has a non-scalar member"),
                    })
                })
                .collect::<Result<Vec<_>, _>>()?;
            if !values.is_empty() {
                out.push((name.to_owned(), values.join(",")));
            }
        }
        Shape::Structure(fields) | Shape::Map(fields) => {
            for (child, value) in fields {
                collect(&format!("{name}{child}"), value, out)?;
            }
        }
    }
    Ok(())
}

/// Deserialize response headers into `H`.
///
/// Header names are lowercase; repeated headers are joined with `,`. Values
/// that are not visible ASCII are skipped.
///
/// # Errors
///
/// Returns [`CodecError::Json`] if the headers do not fit `H`.
pub fn decode_headers<H: DeserializeOwned>(headers: &HeaderMap) -> Result<H, CodecError> {
    let mut object = serde_json::Map::new();
    for name in headers.keys() {
        let values: Vec<&str> = headers
            .get_all(name)
            .iter()
            .filter_map(|value| value.to_str().ok())
            .collect();
        if !values.is_empty() {
            object.insert(
                name.as_str().to_owned(),
                serde_json::Value::String(values.join(",")),
            );
        }
    }
    Ok(serde_json::from_value(serde_json::Value::Object(object))?)
}
