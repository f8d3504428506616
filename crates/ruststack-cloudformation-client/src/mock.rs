//! In-memory client for tests.
//!
//! Every operation returns `Output::default()` unless an override is
//! registered for it. Overrides are keyed by operation, so registering a
//! second one for the same operation replaces the first.

use std::any::Any;
use std::future::Future;
use std::sync::Arc;

use dashmap::DashMap;
use ruststack_cloudformation_model::operations::CloudFormationOperation;
use ruststack_cloudformation_model::shapes::OperationShape;
use tracing::debug;

use crate::client::{CloudFormationClient, CloudFormationResult};

type HandlerResult<S> = CloudFormationResult<<S as OperationShape>::Output>;
type Handler<S> = dyn Fn(<S as OperationShape>::Input) -> HandlerResult<S> + Send + Sync;

struct Override<S: OperationShape> {
    handler: Box<Handler<S>>,
}

/// A [`CloudFormationClient`] that never leaves the process.
#[derive(Default)]
pub struct MockCloudFormationClient {
    overrides: DashMap<CloudFormationOperation, Arc<dyn Any + Send + Sync>>,
    invocations: DashMap<CloudFormationOperation, usize>,
}

impl std::fmt::Debug for MockCloudFormationClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let mut overridden: Vec<_> = self.overrides.iter().map(|entry| *entry.key()).collect();
        overridden.sort();
        f.debug_struct("MockCloudFormationClient")
            .field("overrides", &overridden)
            .finish_non_exhaustive()
    }
}

impl MockCloudFormationClient {
    /// A mock with no overrides.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Answer operation `S` with `handler` instead of the default output.
    #[must_use]
    pub fn with_override<S, F>(self, handler: F) -> Self
    where
        S: OperationShape,
        F: Fn(S::Input) -> CloudFormationResult<S::Output> + Send + Sync + 'static,
    {
        self.set_override::<S, F>(handler);
        self
    }

    /// Register `handler` for operation `S`, replacing any earlier one.
    pub fn set_override<S, F>(&self, handler: F)
    where
        S: OperationShape,
        F: Fn(S::Input) -> CloudFormationResult<S::Output> + Send + Sync + 'static,
    {
        let entry: Arc<dyn Any + Send + Sync> = Arc::new(Override::<S> {
            handler: Box::new(handler),
        });
        self.overrides.insert(S::OPERATION, entry);
    }

    /// Remove the override of `operation`, if any.
    pub fn clear_override(&self, operation: CloudFormationOperation) {
        self.overrides.remove(&operation);
    }

    /// How many times `operation` has been invoked.
    #[must_use]
    pub fn invocations(&self, operation: CloudFormationOperation) -> usize {
        self.invocations.get(&operation).map_or(0, |count| *count)
    }

    fn handle<S: OperationShape>(&self, input: S::Input) -> CloudFormationResult<S::Output> {
        *self.invocations.entry(S::OPERATION).or_insert(0) += 1;

        let entry = self
            .overrides
            .get(&S::OPERATION)
            .map(|entry| Arc::clone(entry.value()));
        match entry.as_deref().and_then(|any| any.downcast_ref::<Override<S>>()) {
            Some(found) => {
                debug!(operation = %S::OPERATION, "answering from override");
                (found.handler)(input)
            }
            None => Ok(S::Output::default()),
        }
    }
}

impl CloudFormationClient for MockCloudFormationClient {
    fn execute<S: OperationShape>(
        &self,
        input: S::Input,
    ) -> impl Future<Output = CloudFormationResult<S::Output>> + Send {
        let result = self.handle::<S>(input);
        async move { result }
    }
}
