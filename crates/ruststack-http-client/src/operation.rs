//! How typed inputs and outputs map onto HTTP.
//!
//! An input says which part of itself goes to each request location; an
//! output says how to assemble itself from a decoded body and decoded
//! headers. Service model crates implement both for every operation shape.

use serde::de::{DeserializeOwned, IgnoredAny};
use serde::{Deserialize, Serialize};

/// A typed operation input.
///
/// Each `*_encodable` accessor returns the part of the input bound to that
/// location, or `None` when the operation sends nothing there.
pub trait HttpRequestInput: Send + Sync {
    /// Fields substituted into the path template.
    type Path: Serialize;
    /// Fields flattened into the query string.
    type Query: Serialize;
    /// The JSON body.
    type Body: Serialize;
    /// Fields sent as headers.
    type Headers: Serialize;

    /// Path-bound fields.
    fn path_encodable(&self) -> Option<&Self::Path> {
        None
    }

    /// Query-bound fields.
    fn query_encodable(&self) -> Option<&Self::Query> {
        None
    }

    /// Body-bound fields.
    fn body_encodable(&self) -> Option<&Self::Body> {
        None
    }

    /// Header-bound fields.
    fn headers_encodable(&self) -> Option<&Self::Headers> {
        None
    }

    /// Extra path segment appended after the template.
    fn path_postfix(&self) -> Option<&str> {
        None
    }
}

/// A typed operation output.
pub trait HttpResponseOutput: Sized {
    /// Shape of the JSON body.
    type Body: DeserializeOwned;
    /// Shape of the header-bound fields.
    type Headers: DeserializeOwned;

    /// Merge the decoded body (absent for an empty body) and headers.
    fn compose(body: Option<Self::Body>, headers: Self::Headers) -> Self;
}

/// Header shape for outputs that read nothing from headers.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct NoHeaders {}

impl HttpRequestInput for () {
    type Path = ();
    type Query = ();
    type Body = ();
    type Headers = ();
}

impl HttpResponseOutput for () {
    type Body = IgnoredAny;
    type Headers = NoHeaders;

    fn compose(_body: Option<IgnoredAny>, _headers: NoHeaders) -> Self {}
}
