//! CloudFormation client over the operation middleware pipeline.
//!
//! Each operation gets the standard `awsJson1_0` stack: `POST /` with the
//! JSON input as body, `x-amz-target: CloudFormation_20100515.<Operation>`,
//! SigV4 signing for the `cloudformation` service, the operation's declared
//! errors decoded as [`CloudFormationError::Declared`], and retries per the
//! client's [`RetryConfiguration`].
//!
//! Stacks are built on first use and cached per operation.

use std::any::Any;
use std::collections::BTreeMap;
use std::future::Future;
use std::sync::Arc;

use dashmap::DashMap;
use ruststack_auth::{CredentialsProvider, EnvironmentCredentialsProvider};
use ruststack_cloudformation_model::error::CloudFormationError;
use ruststack_cloudformation_model::operations::{CloudFormationOperation, SERVICE_NAME};
use ruststack_cloudformation_model::shapes::OperationShape;
use ruststack_core::{ClientConfig, EndpointProtocol, RustStackResult};
use ruststack_http_client::{
    HttpTransport, HyperTransport, InvocationContext, MetricsSink, OperationMiddlewareStack,
    RetryConfiguration, StackError, StandardStackConfig, standard_stack,
};
use tokio_util::sync::CancellationToken;
use tracing::debug;

use crate::client::{CloudFormationClient, CloudFormationResult};

/// The middleware stack of operation `S`.
pub type CloudFormationStack<S> = OperationMiddlewareStack<
    <S as OperationShape>::Input,
    <S as OperationShape>::Output,
    CloudFormationError,
>;

/// A [`CloudFormationClient`] that sends signed requests through an
/// [`HttpTransport`].
#[derive(Clone)]
pub struct AwsCloudFormationClient {
    endpoint_host: String,
    endpoint_port: u16,
    protocol: EndpointProtocol,
    region: String,
    retry: RetryConfiguration,
    credentials: Arc<dyn CredentialsProvider>,
    transport: Arc<dyn HttpTransport>,
    metrics: Option<Arc<dyn MetricsSink>>,
    request_tags: BTreeMap<String, String>,
    stacks: Arc<DashMap<CloudFormationOperation, Arc<dyn Any + Send + Sync>>>,
}

impl std::fmt::Debug for AwsCloudFormationClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AwsCloudFormationClient")
            .field("endpoint_host", &self.endpoint_host)
            .field("endpoint_port", &self.endpoint_port)
            .field("protocol", &self.protocol)
            .field("region", &self.region)
            .field("retry", &self.retry)
            .field("request_tags", &self.request_tags)
            .finish_non_exhaustive()
    }
}

impl AwsCloudFormationClient {
    /// Create a client for the endpoint and retry policy in `config`.
    pub fn new(
        config: &ClientConfig,
        credentials: Arc<dyn CredentialsProvider>,
        transport: Arc<dyn HttpTransport>,
    ) -> Self {
        let retry = RetryConfiguration::builder()
            .max_attempts(config.max_attempts)
            .base_delay(config.base_delay())
            .max_delay(config.max_delay())
            .build();

        Self {
            endpoint_host: config.host_for(SERVICE_NAME),
            endpoint_port: config.port(),
            protocol: config.protocol,
            region: config.region.as_str().to_owned(),
            retry,
            credentials,
            transport,
            metrics: None,
            request_tags: BTreeMap::new(),
            stacks: Arc::new(DashMap::new()),
        }
    }

    /// Create a client from environment configuration and credentials, over
    /// a [`HyperTransport`].
    ///
    /// # Errors
    ///
    /// Returns an error if the environment configuration is invalid.
    pub fn from_env() -> RustStackResult<Self> {
        let config = ClientConfig::from_env()?;
        Ok(Self::new(
            &config,
            Arc::new(EnvironmentCredentialsProvider),
            Arc::new(HyperTransport::new()),
        ))
    }

    /// Replace the retry policy. Stacks built so far are discarded.
    #[must_use]
    pub fn with_retry(mut self, retry: RetryConfiguration) -> Self {
        self.retry = retry;
        self.stacks = Arc::new(DashMap::new());
        self
    }

    /// Send per-attempt records of every call to `sink`.
    #[must_use]
    pub fn with_metrics(mut self, sink: Arc<dyn MetricsSink>) -> Self {
        self.metrics = Some(sink);
        self
    }

    /// Tag every call's metrics records with `key=value`.
    #[must_use]
    pub fn with_request_tag(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.request_tags.insert(key.into(), value.into());
        self
    }

    /// The standard stack settings for `operation`.
    #[must_use]
    pub fn stack_config(&self, operation: CloudFormationOperation) -> StandardStackConfig {
        StandardStackConfig::builder()
            .endpoint_host(self.endpoint_host.clone())
            .endpoint_port(self.endpoint_port)
            .protocol(self.protocol)
            .retry(self.retry.clone())
            .region(self.region.clone())
            .service(SERVICE_NAME)
            .target(operation.target())
            .declared_errors(operation.declared_error_codes())
            .build()
    }

    /// The stack operation `S` runs through, built on first use.
    #[must_use]
    pub fn stack<S: OperationShape>(&self) -> Arc<CloudFormationStack<S>> {
        let cached = self
            .stacks
            .get(&S::OPERATION)
            .and_then(|entry| Arc::clone(entry.value()).downcast::<CloudFormationStack<S>>().ok());
        if let Some(stack) = cached {
            return stack;
        }

        let stack = Arc::new(standard_stack::<S::Input, S::Output, CloudFormationError>(
            &self.stack_config(S::OPERATION),
        ));
        debug!(operation = %S::OPERATION, "built operation stack");
        self.stacks.insert(S::OPERATION, stack.clone());
        stack
    }

    /// Rebuild the stack of operation `S` from the standard one, letting
    /// `configure` intercept extra stages. Later calls of `S` use the result.
    ///
    /// # Errors
    ///
    /// Returns the error of `configure`; the cached stack is left unchanged.
    pub fn customize<S, F>(&self, configure: F) -> Result<(), StackError>
    where
        S: OperationShape,
        F: FnOnce(&mut CloudFormationStack<S>) -> Result<(), StackError>,
    {
        let mut stack = standard_stack::<S::Input, S::Output, CloudFormationError>(
            &self.stack_config(S::OPERATION),
        );
        configure(&mut stack)?;
        self.stacks.insert(S::OPERATION, Arc::new(stack));
        Ok(())
    }

    /// Run operation `S`, ending early with [`CloudFormationError::Cancelled`]
    /// once `token` is cancelled.
    pub async fn execute_cancellable<S: OperationShape>(
        &self,
        input: S::Input,
        token: CancellationToken,
    ) -> CloudFormationResult<S::Output> {
        let stack = self.stack::<S>();
        let mut ctx = self.context(S::OPERATION).with_cancellation(token);

        stack
            .execute(&input, self.transport.as_ref(), &mut ctx)
            .await
            .map_err(CloudFormationError::from)
    }

    fn context(&self, operation: CloudFormationOperation) -> InvocationContext {
        let ctx = InvocationContext::new(operation.as_str(), Arc::clone(&self.credentials))
            .with_request_tags(self.request_tags.clone());
        match &self.metrics {
            Some(sink) => ctx.with_metrics(Arc::clone(sink)),
            None => ctx,
        }
    }
}

impl CloudFormationClient for AwsCloudFormationClient {
    fn execute<S: OperationShape>(
        &self,
        input: S::Input,
    ) -> impl Future<Output = CloudFormationResult<S::Output>> + Send {
        self.execute_cancellable::<S>(input, CancellationToken::new())
    }
}
