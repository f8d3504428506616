//! Operation middleware pipeline for RustStack AWS service clients.
//!
//! Every operation call runs through an [`OperationMiddlewareStack`]: three
//! ordered phases of stages that turn a typed input into a signed HTTP
//! request, send it over an [`HttpTransport`], and turn the response back into
//! a typed output or a classified [`HttpClientError`].
//!
//! # Phases
//!
//! - **serialize**: encode input fields into the path, query, headers and body
//! - **build**: endpoint, content headers and the SigV4 signature
//! - **finalize**: typed error decoding, generic error classification, retry
//!
//! Stages are named, and callers can intercept their own stages at any
//! position of any phase with [`Phase::intercept`].
//!
//! # Usage
//!
//! ```rust,no_run
//! use std::sync::Arc;
//!
//! use ruststack_auth::StaticCredentialsProvider;
//! use ruststack_http_client::{
//!     HttpClientError, HyperTransport, InvocationContext, ServiceError, StandardStackConfig,
//!     standard_stack,
//! };
//!
//! #[derive(Debug, thiserror::Error)]
//! #[error("service error")]
//! struct NoErrors;
//!
//! impl ServiceError for NoErrors {
//!     fn from_code(_code: &str, _message: Option<String>) -> Option<Self> {
//!         None
//!     }
//! }
//!
//! # async fn run() -> Result<(), HttpClientError<NoErrors>> {
//! let config = StandardStackConfig::builder()
//!     .endpoint_host("localhost")
//!     .endpoint_port(4566)
//!     .region("us-east-1")
//!     .service("cloudformation")
//!     .build();
//! let stack = standard_stack::<(), (), NoErrors>(&config);
//! let mut ctx = InvocationContext::new(
//!     "Ping",
//!     Arc::new(StaticCredentialsProvider::new("test", "test")),
//! );
//! stack.execute(&(), &HyperTransport::new(), &mut ctx).await?;
//! # Ok(())
//! # }
//! ```

pub mod codec;
pub mod context;
pub mod error;
pub mod metrics;
pub mod operation;
pub mod phase;
pub mod request;
pub mod retry;
pub mod shape;
pub mod stack;
pub mod stage;
pub mod stages;
pub mod standard;
pub mod transport;

#[cfg(test)]
mod testing;

pub use context::{BodyContext, InvocationContext};
pub use error::{CodecError, HttpClientError, ServiceError, StackError, StageError, TransportError};
pub use metrics::{AttemptRecord, MetricsError, MetricsSink, TracingMetricsSink};
pub use operation::{HttpRequestInput, HttpResponseOutput, NoHeaders};
pub use phase::{Phase, Position};
pub use request::HttpRequestBuilder;
pub use retry::{ErrorStatus, ErrorStatusFn, JitterBounds, RetryConfiguration};
pub use stack::OperationMiddlewareStack;
pub use stage::{AttemptOutcome, Disposition, FinalizeStage, RequestStage, Stage};
pub use standard::{StandardStackConfig, standard_stack};
pub use transport::{HttpTransport, HyperTransport, TransportFuture};
