//! The standard stack for AWS JSON protocol operations.

use std::sync::Arc;

use http::Method;
use ruststack_core::EndpointProtocol;
use typed_builder::TypedBuilder;

use crate::codec::{DEFAULT_MAX_BYTES, MapEncodingStrategy};
use crate::error::ServiceError;
use crate::operation::{HttpRequestInput, HttpResponseOutput};
use crate::retry::{ErrorStatusFn, RetryConfiguration, default_error_status_fn};
use crate::stack::OperationMiddlewareStack;
use crate::stages::{
    AdditionalHeadersStage, ClientErrorStage, ContentLengthStage, ContentTypeStage, HostStage,
    JsonBodyStage, JsonTypedErrorStage, PortStage, ProtocolStage, QueryItemsStage, RetryStage,
    SigV4SigningStage, UrlPathStage,
};

/// Everything the standard stack needs to know about one operation and its
/// endpoint.
#[derive(Clone, TypedBuilder)]
pub struct StandardStackConfig {
    /// Endpoint host name.
    #[builder(setter(into))]
    pub endpoint_host: String,
    /// Endpoint port.
    pub endpoint_port: u16,
    /// Endpoint scheme.
    #[builder(default)]
    pub protocol: EndpointProtocol,
    /// `content-type` of request bodies.
    #[builder(default = "application/x-amz-json-1.0".to_owned(), setter(into))]
    pub content_type: String,
    /// Leave out `content-type` and `content-length` when the body is empty.
    #[builder(default = true)]
    pub omit_content_headers_for_empty_body: bool,
    /// Path template, e.g. `/` or `/stacks/{StackName}`.
    #[builder(default = "/".to_owned(), setter(into))]
    pub http_path: String,
    /// HTTP method.
    #[builder(default = Method::POST)]
    pub method: Method,
    /// Retry settings.
    #[builder(default)]
    pub retry: RetryConfiguration,
    /// How query-bound maps are flattened.
    #[builder(default)]
    pub map_encoding: MapEncodingStrategy,
    /// Sign every header rather than the minimal set.
    #[builder(default)]
    pub sign_all_headers: bool,
    /// Cap on decoded response bodies.
    #[builder(default = DEFAULT_MAX_BYTES)]
    pub max_bytes: usize,
    /// Signing region.
    #[builder(setter(into))]
    pub region: String,
    /// Signing service name.
    #[builder(setter(into))]
    pub service: String,
    /// `x-amz-target` value, for protocols that route on it.
    #[builder(default, setter(strip_option))]
    pub target: Option<String>,
    /// Classifies errors the other finalize stages leave unclassified.
    #[builder(default = default_error_status_fn())]
    pub error_status: ErrorStatusFn,
    /// Error codes the operation declares.
    #[builder(default)]
    pub declared_errors: Vec<String>,
}

impl std::fmt::Debug for StandardStackConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("StandardStackConfig")
            .field("endpoint_host", &self.endpoint_host)
            .field("endpoint_port", &self.endpoint_port)
            .field("protocol", &self.protocol)
            .field("content_type", &self.content_type)
            .field("http_path", &self.http_path)
            .field("method", &self.method)
            .field("retry", &self.retry)
            .field("region", &self.region)
            .field("service", &self.service)
            .field("target", &self.target)
            .field("declared_errors", &self.declared_errors)
            .finish_non_exhaustive()
    }
}

/// Build the standard stack:
///
/// | phase | stages |
/// |---|---|
/// | serialize | `UrlPath`, `QueryItems`, `AdditionalHeaders`, `JsonBody` |
/// | build | `Host`, `Protocol`, `Port`, `ContentType`, `ContentLength`, `SigV4` |
/// | finalize | `JsonTypedError`, `ClientError`, `Retry` |
///
/// Callers may intercept further stages into any phase afterwards.
#[must_use]
pub fn standard_stack<I, O, E>(config: &StandardStackConfig) -> OperationMiddlewareStack<I, O, E>
where
    I: HttpRequestInput + 'static,
    O: HttpResponseOutput,
    E: ServiceError,
{
    let mut stack = OperationMiddlewareStack::new(config.method.clone(), config.max_bytes);

    stack
        .serialize_input
        .append(Arc::new(UrlPathStage::new(config.http_path.clone())));
    stack
        .serialize_input
        .append(Arc::new(QueryItemsStage::new(config.map_encoding.clone())));
    stack.serialize_input.append(Arc::new(AdditionalHeadersStage));
    stack.serialize_input.append(Arc::new(JsonBodyStage));

    let omit = config.omit_content_headers_for_empty_body;
    stack
        .build
        .append(Arc::new(HostStage::new(config.endpoint_host.clone())));
    stack.build.append(Arc::new(ProtocolStage::new(config.protocol)));
    stack.build.append(Arc::new(PortStage::new(config.endpoint_port)));
    stack.build.append(Arc::new(ContentTypeStage::new(
        config.content_type.clone(),
        omit,
    )));
    stack.build.append(Arc::new(ContentLengthStage::new(omit)));
    stack.build.append(Arc::new(
        SigV4SigningStage::new(config.region.clone(), config.service.clone())
            .with_target(config.target.clone())
            .with_sign_all_headers(config.sign_all_headers),
    ));

    stack.finalize.append(Arc::new(JsonTypedErrorStage::<E>::new(
        config.declared_errors.clone(),
        config.max_bytes,
    )));
    stack
        .finalize
        .append(Arc::new(ClientErrorStage::new(config.max_bytes)));
    stack.finalize.append(Arc::new(RetryStage::new(
        config.retry.clone(),
        Arc::clone(&config.error_status),
    )));

    stack
}
