//! Stage traits.
//!
//! Request stages run in the serialize and build phases and edit the request
//! under construction. Finalize stages run after the transport returns and
//! edit the attempt's outcome. All stage logic is synchronous.

use std::time::Duration;

use bytes::Bytes;

use crate::context::InvocationContext;
use crate::error::{HttpClientError, StageError};
use crate::request::HttpRequestBuilder;

/// Anything that can sit in a [`Phase`](crate::phase::Phase).
pub trait Stage: Send + Sync {
    /// Name used for relative positioning and logging.
    fn name(&self) -> &str;
}

/// A stage of the serialize or build phase.
pub trait RequestStage<I>: Stage {
    /// Apply the stage to the request for `input`.
    ///
    /// # Errors
    ///
    /// Any error fails the call immediately; later stages and the finalize
    /// phase do not run.
    fn apply(
        &self,
        input: &I,
        request: &mut HttpRequestBuilder,
        ctx: &mut InvocationContext,
    ) -> Result<(), StageError>;
}

/// What the stack does once the finalize phase is over.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Disposition {
    /// Return the outcome to the caller.
    Complete,
    /// Wait, then start another attempt.
    RetryAfter(Duration),
}

/// The result of one attempt as seen by the finalize phase.
#[derive(Debug)]
pub struct AttemptOutcome<E> {
    /// The raw response, or the error it has been classified as so far.
    pub result: Result<http::Response<Bytes>, HttpClientError<E>>,
    /// HTTP status of the response, when there was one.
    pub status: Option<u16>,
    /// Set by the retry stage.
    pub disposition: Disposition,
}

impl<E> AttemptOutcome<E> {
    /// Wrap what the transport returned.
    #[must_use]
    pub fn new(result: Result<http::Response<Bytes>, HttpClientError<E>>) -> Self {
        let status = result
            .as_ref()
            .ok()
            .map(|response| response.status().as_u16());
        Self {
            result,
            status,
            disposition: Disposition::Complete,
        }
    }

    /// The response, if it is still unclassified and not a success.
    #[must_use]
    pub fn failed_response(&self) -> Option<&http::Response<Bytes>> {
        self.result
            .as_ref()
            .ok()
            .filter(|response| !response.status().is_success())
    }
}

/// A stage of the finalize phase.
pub trait FinalizeStage<E>: Stage {
    /// Inspect and possibly rewrite the attempt outcome.
    fn apply(&self, outcome: &mut AttemptOutcome<E>, ctx: &mut InvocationContext);
}
