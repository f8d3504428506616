//! Query parameter flattening.
//!
//! Nested structures become `Parent.Child`, list members `Name.N` (1-based),
//! and maps follow an explicit [`MapEncodingStrategy`]. Output is sorted by
//! name then value so the same input always yields the same query string.

use percent_encoding::{AsciiSet, NON_ALPHANUMERIC, utf8_percent_encode};

use crate::error::CodecError;
use crate::shape::Shape;

/// AWS unreserved characters: `A-Z a-z 0-9 - _ . ~`.
const QUERY_ENCODE_SET: &AsciiSet = &NON_ALPHANUMERIC
    .remove(b'-')
    .remove(b'_')
    .remove(b'.')
    .remove(b'~');

/// How map-typed fields are written to the query string.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum MapEncodingStrategy {
    /// One parameter per entry: `Map.key=value`.
    #[default]
    SingleQueryEntry,
    /// Two parameters per entry:
    /// `Map.N.<key_tag>=key&Map.N.<value_tag>=value`.
    SeparateQueryEntriesWith {
        /// Member name holding the entry key.
        key_tag: String,
        /// Member name holding the entry value.
        value_tag: String,
    },
}

impl MapEncodingStrategy {
    /// The `key`/`value` tagged form used by most AWS query services.
    #[must_use]
    pub fn key_value_entries() -> Self {
        Self::SeparateQueryEntriesWith {
            key_tag: "key".to_owned(),
            value_tag: "value".to_owned(),
        }
    }
}

/// Flatten a query shape into sorted, unencoded name/value pairs.
///
/// # Errors
///
/// Returns [`CodecError::UnsupportedShape`] if the top-level value is a bare
/// scalar or list, which has no parameter name.
pub fn encode_query(
    input: &Shape,
    strategy: &MapEncodingStrategy,
) -> Result<Vec<(String, String)>, CodecError> {
    let mut params = Vec::new();
    match input {
        Shape::Null => {}
        Shape::Structure(_) | Shape::Map(_) => flatten("", input, strategy, &mut params),
        Shape::Scalar(_) | Shape::List(_) => {
            return Err(CodecError::UnsupportedShape {
                location: "query",
                detail: "top-level query input must be a structure or map".to_owned(),
            });
        }
    }

    params.sort();
    Ok(params)
}

/// Percent-encode and join parameters into a query string.
///
/// # Examples
///
/// ```
/// use ruststack_http_client::codec::to_query_string;
///
/// let params = vec![("Name".to_owned(), "a b".to_owned())];
/// assert_eq!(to_query_string(&params), "Name=a%20b");
/// ```
#[must_use]
pub fn to_query_string(params: &[(String, String)]) -> String {
    params
        .iter()
        .map(|(name, value)| {
            format!(
                "{}={}",
                utf8_percent_encode(name, QUERY_ENCODE_SET),
                utf8_percent_encode(value, QUERY_ENCODE_SET)
            )
        })
        .collect::<Vec<_>>()
        .join("&")
}

fn flatten(
    prefix: &str,
    shape: &Shape,
    strategy: &MapEncodingStrategy,
    out: &mut Vec<(String, String)>,
) {
    match shape {
        Shape::Null => {}
        Shape::Scalar(value) => out.push((prefix.to_owned(), value.clone())),
        Shape::List(items) => {
            for (index, item) in items.iter().enumerate() {
                flatten(&format!("{prefix}.{}", index + 1), item, strategy, out);
            }
        }
        Shape::Structure(fields) => {
            for (name, value) in fields {
                flatten(&child(prefix, name), value, strategy, out);
            }
        }
        Shape::Map(entries) => match strategy {
            MapEncodingStrategy::SingleQueryEntry => {
                for (key, value) in entries {
                    flatten(&child(prefix, key), value, strategy, out);
                }
            }
            MapEncodingStrategy::SeparateQueryEntriesWith { key_tag, value_tag } => {
                for (index, (key, value)) in entries.iter().enumerate() {
                    let entry = child(prefix, &(index + 1).to_string());
                    out.push((format!("{entry}.{key_tag}"), key.clone()));
                    flatten(&format!("{entry}.{value_tag}"), value, strategy, out);
                }
            }
        },
    }
}

fn child(prefix: &str, name: &str) -> String {
    if prefix.is_empty() {
        name.to_owned()
    } else {
        format!("{prefix}.{name}")
    }
}

#[cfg(test)]
mod tests {
    use std::collections::BTreeMap;

    use serde::Serialize;

    use super::*;
    use crate::shape::to_shape;

    #[derive(Serialize)]
    #[serde(rename_all = "PascalCase")]
    struct Filter {
        name: String,
        values: Vec<String>,
    }

    #[derive(Serialize)]
    #[serde(rename_all = "PascalCase")]
    struct ListInput {
        next_token: Option<String>,
        max_results: u32,
        filter: Filter,
        tags: BTreeMap<String, String>,
    }

    fn sample() -> ListInput {
        ListInput {
            next_token: None,
            max_results: 10,
            filter: Filter {
                name: "status".to_owned(),
                values: vec!["CREATE_COMPLETE".to_owned(), "UPDATE_COMPLETE".to_owned()],
            },
            tags: BTreeMap::from([("env".to_owned(), "prod".to_owned())]),
        }
    }

    fn pairs(params: &[(String, String)]) -> Vec<(&str, &str)> {
        params.iter().map(|(k, v)| (k.as_str(), v.as_str())).collect()
    }

    #[test]
    fn test_should_flatten_structures_and_lists() {
        let shape = to_shape(&sample()).unwrap();
        let params = encode_query(&shape, &MapEncodingStrategy::SingleQueryEntry).unwrap();
        assert_eq!(
            pairs(&params),
            vec![
                ("Filter.Name", "status"),
                ("Filter.Values.1", "CREATE_COMPLETE"),
                ("Filter.Values.2", "UPDATE_COMPLETE"),
                ("MaxResults", "10"),
                ("Tags.env", "prod"),
            ]
        );
    }

    #[test]
    fn test_should_encode_maps_as_separate_entries() {
        let shape = to_shape(&sample()).unwrap();
        let params = encode_query(&shape, &MapEncodingStrategy::key_value_entries()).unwrap();
        let params = pairs(&params);
        assert!(params.contains(&("Tags.1.key", "env")));
        assert!(params.contains(&("Tags.1.value", "prod")));
        assert!(!params.iter().any(|(k, _)| *k == "Tags.env"));
    }

    #[test]
    fn test_should_reject_scalar_query_input() {
        let result = encode_query(
            &Shape::Scalar("x".to_owned()),
            &MapEncodingStrategy::SingleQueryEntry,
        );
        assert!(matches!(result, Err(CodecError::UnsupportedShape { .. })));
    }

    #[test]
    fn test_should_percent_encode_reserved_characters() {
        let params = vec![
            ("Marker".to_owned(), "a/b+c=d".to_owned()),
            ("Tags.k~1".to_owned(), "v".to_owned()),
        ];
        assert_eq!(to_query_string(&params), "Marker=a%2Fb%2Bc%3Dd&Tags.k~1=v");
    }
}
