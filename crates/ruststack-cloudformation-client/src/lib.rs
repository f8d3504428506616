//! CloudFormation clients for RustStack.
//!
//! [`CloudFormationClient`] exposes every CloudFormation operation three ways:
//! asynchronously, blocking on a runtime handle, and as a spawned task that
//! reports to a completion callback. Two implementations are provided:
//!
//! - [`AwsCloudFormationClient`] sends signed `awsJson1_0` requests through
//!   the operation middleware pipeline of `ruststack-http-client`.
//! - [`MockCloudFormationClient`] answers in-process, with per-operation
//!   overrides and `Output::default()` otherwise.
// "CloudFormation" appears in virtually every doc comment in this crate.
#![allow(clippy::doc_markdown)]

pub mod aws;
pub mod client;
pub mod mock;

pub use aws::{AwsCloudFormationClient, CloudFormationStack};
pub use client::{CloudFormationClient, CloudFormationResult};
pub use mock::MockCloudFormationClient;
