//! URL path template substitution.

use percent_encoding::{AsciiSet, NON_ALPHANUMERIC, utf8_percent_encode};

use crate::error::CodecError;
use crate::shape::Shape;

/// Characters left as-is in a `{Name}` label.
const LABEL_ENCODE_SET: &AsciiSet = &NON_ALPHANUMERIC
    .remove(b'-')
    .remove(b'_')
    .remove(b'.')
    .remove(b'~');

/// A greedy `{Name+}` label additionally keeps its slashes.
const GREEDY_LABEL_ENCODE_SET: &AsciiSet = &LABEL_ENCODE_SET.remove(b'/');

/// Substitute the placeholders of `template` with fields of `input`.
///
/// `{Name}` takes the scalar field `Name`, fully percent-encoded. `{Name+}`
/// keeps `/` so the value can span segments.
///
/// # Errors
///
/// Returns [`CodecError::UnresolvedPlaceholder`] if a placeholder has no
/// non-empty scalar field, or the template has an unclosed `{`.
///
/// # Examples
///
/// ```
/// use ruststack_http_client::codec::encode_path;
/// use ruststack_http_client::shape::Shape;
///
/// let input = Shape::Structure(vec![
///     ("StackName".to_owned(), Shape::Scalar("my stack".to_owned())),
///     ("Key".to_owned(), Shape::Scalar("a/b".to_owned())),
/// ]);
/// assert_eq!(
///     encode_path("/stacks/{StackName}/objects/{Key+}", &input).unwrap(),
///     "/stacks/my%20stack/objects/a/b"
/// );
/// ```
pub fn encode_path(template: &str, input: &Shape) -> Result<String, CodecError> {
    let mut path = String::with_capacity(template.len());
    let mut rest = template;

    while let Some(open) = rest.find('{') {
        path.push_str(&rest[..open]);
        let after = &rest[open + 1..];
        let close = after
            .find('}')
            .ok_or_else(|| CodecError::UnresolvedPlaceholder(after.to_owned()))?;

        let label = &after[..close];
        let (name, encode_set) = match label.strip_suffix('+') {
            Some(name) => (name, GREEDY_LABEL_ENCODE_SET),
            None => (label, LABEL_ENCODE_SET),
        };

        let value = input
            .field(name)
            .and_then(Shape::as_scalar)
            .filter(|value| !value.is_empty())
            .ok_or_else(|| CodecError::UnresolvedPlaceholder(name.to_owned()))?;
        path.extend(utf8_percent_encode(value, encode_set));

        rest = &after[close + 1..];
    }

    path.push_str(rest);
    Ok(path)
}

/// Append a postfix segment to a path, with exactly one `/` between them.
#[must_use]
pub fn join_postfix(path: &str, postfix: Option<&str>) -> String {
    match postfix {
        Some(postfix) if !postfix.is_empty() => format!(
            "{}/{}",
            path.trim_end_matches('/'),
            postfix.trim_start_matches('/')
        ),
        _ => path.to_owned(),
    }
}
