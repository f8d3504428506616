//! Core types and configuration for the RustStack CloudFormation client.
//!
//! This crate provides the foundational building blocks shared by the
//! middleware pipeline, the signing crate, and the generated service client:
//! region and endpoint protocol types, and environment-driven client
//! configuration.

mod config;
mod error;
mod types;

pub use config::ClientConfig;
pub use error::{RustStackError, RustStackResult};
pub use types::{AwsRegion, EndpointProtocol};
