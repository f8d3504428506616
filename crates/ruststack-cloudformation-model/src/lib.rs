//! CloudFormation model types for RustStack.
//!
//! Hand-written request, response and error types for the CloudFormation
//! `awsJson1_0` protocol, plus an [`shapes::OperationShape`] marker per
//! operation that binds each input to its output. The types implement the
//! `ruststack-http-client` input and output traits, so any of them can be
//! sent through an operation middleware stack.
// "CloudFormation" appears in virtually every doc comment in this crate.
#![allow(clippy::doc_markdown)]
#![allow(clippy::too_many_lines)]
#![allow(clippy::struct_excessive_bools)]
#![allow(clippy::module_name_repetitions)]
#![allow(missing_docs)]

pub mod error;
pub mod input;
pub mod operations;
pub mod output;
pub mod shapes;
pub mod types;

pub use error::{CloudFormationError, CloudFormationErrorCode};
pub use operations::CloudFormationOperation;
pub use output::ResponseHeaders;
pub use shapes::OperationShape;
