//! Encoders for each request location and decoders for responses.
//!
//! - [`path`]: `{Name}` / `{Name+}` template substitution
//! - [`query`]: flattened `Parent.Child` / `List.N` query parameters
//! - [`headers`]: field-per-header encoding and header-to-struct decoding
//! - [`json`]: JSON bodies with a size cap on decode

pub mod headers;
pub mod json;
pub mod path;
pub mod query;

pub use headers::{decode_headers, encode_headers};
pub use json::{DEFAULT_MAX_BYTES, decode_body, encode_body};
pub use path::{encode_path, join_postfix};
pub use query::{MapEncodingStrategy, encode_query, to_query_string};
