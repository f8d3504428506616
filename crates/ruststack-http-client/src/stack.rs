//! The operation middleware stack.
//!
//! One stack describes how every call of one operation runs:
//!
//! ```text
//! loop {
//!     serialize_input stages  -> fresh HttpRequestBuilder
//!     build stages            -> host, port, content headers, signature
//!     transport.send          (suspends; observes cancellation)
//!     finalize stages         -> typed error, client error, retry decision
//!     RetryAfter(d) => sleep d (suspends; observes cancellation), go again
//!     Complete      => deserialize the response or return the error
//! }
//! ```
//!
//! The stack is immutable once built and may be shared across concurrent
//! calls. Everything that changes during a call lives in the caller's
//! [`InvocationContext`].

use std::marker::PhantomData;
use std::sync::Arc;

use bytes::Bytes;
use http::Method;
use tokio::runtime::Handle;
use tokio::task::JoinHandle;
use tracing::debug;

use crate::codec::{decode_body, decode_headers};
use crate::context::InvocationContext;
use crate::error::{HttpClientError, ServiceError};
use crate::operation::HttpResponseOutput;
use crate::phase::Phase;
use crate::request::HttpRequestBuilder;
use crate::stage::{AttemptOutcome, Disposition, FinalizeStage, RequestStage};
use crate::stages::finalize::is_retriable_status;
use crate::transport::HttpTransport;

/// Ordered phases of stages for one operation, plus output decoding.
pub struct OperationMiddlewareStack<I, O, E> {
    /// Stages that encode the input into the request.
    pub serialize_input: Phase<dyn RequestStage<I>>,
    /// Stages that complete and sign the request.
    pub build: Phase<dyn RequestStage<I>>,
    /// Stages that classify the attempt outcome and decide on retries.
    pub finalize: Phase<dyn FinalizeStage<E>>,
    method: Method,
    max_bytes: usize,
    _output: PhantomData<fn() -> O>,
}

impl<I, O, E> std::fmt::Debug for OperationMiddlewareStack<I, O, E> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("OperationMiddlewareStack")
            .field("method", &self.method)
            .field("serialize_input", &self.serialize_input)
            .field("build", &self.build)
            .field("finalize", &self.finalize)
            .field("max_bytes", &self.max_bytes)
            .finish()
    }
}

impl<I, O, E> OperationMiddlewareStack<I, O, E> {
    /// An empty stack for `method`, decoding bodies of up to `max_bytes`.
    #[must_use]
    pub fn new(method: Method, max_bytes: usize) -> Self {
        Self {
            serialize_input: Phase::new(),
            build: Phase::new(),
            finalize: Phase::new(),
            method,
            max_bytes,
            _output: PhantomData,
        }
    }

    /// HTTP method of every request.
    #[must_use]
    pub fn method(&self) -> &Method {
        &self.method
    }

    /// Cap on decoded response bodies.
    #[must_use]
    pub fn max_bytes(&self) -> usize {
        self.max_bytes
    }
}

impl<I, O, E> OperationMiddlewareStack<I, O, E>
where
    O: HttpResponseOutput,
    E: ServiceError,
{
    /// Run one call.
    ///
    /// Suspends only while the transport is sending and while backing off
    /// between attempts. Cancelling the context's token at either point ends
    /// the call with [`HttpClientError::Cancelled`] and runs no further
    /// stages. Dropping the future cancels it too.
    ///
    /// # Errors
    ///
    /// Returns the last attempt's classified error.
    pub async fn execute(
        &self,
        input: &I,
        transport: &dyn HttpTransport,
        ctx: &mut InvocationContext,
    ) -> Result<O, HttpClientError<E>> {
        let token = ctx.cancellation().clone();

        loop {
            if token.is_cancelled() {
                return Err(HttpClientError::Cancelled);
            }
            ctx.begin_attempt();
            let request = match self.build_request(input, ctx) {
                Ok(request) => request,
                Err(e) => {
                    ctx.record_attempt(None, false, false);
                    return Err(e);
                }
            };
            debug!(
                operation = ctx.operation(),
                attempt = ctx.attempt(),
                uri = %request.uri(),
                "sending request"
            );

            let result = tokio::select! {
                biased;
                () = token.cancelled() => {
                    debug!(operation = ctx.operation(), "cancelled while sending");
                    ctx.record_attempt(None, false, false);
                    return Err(HttpClientError::Cancelled);
                }
                result = transport.send(request) => result.map_err(HttpClientError::Transport),
            };

            let mut outcome = AttemptOutcome::new(result);
            for stage in self.finalize.iter() {
                stage.apply(&mut outcome, ctx);
            }

            let disposition = outcome.disposition;
            match disposition {
                Disposition::Complete => return self.deserialize(outcome.result?),
                Disposition::RetryAfter(delay) => {
                    drop(outcome);
                    tokio::select! {
                        biased;
                        () = token.cancelled() => {
                            debug!(operation = ctx.operation(), "cancelled during backoff");
                            return Err(HttpClientError::Cancelled);
                        }
                        () = tokio::time::sleep(delay) => {}
                    }
                }
            }
        }
    }

    /// Run one call to completion on `handle`, blocking the current thread.
    ///
    /// # Errors
    ///
    /// See [`OperationMiddlewareStack::execute`].
    ///
    /// # Panics
    ///
    /// Panics if called from within an asynchronous execution context.
    pub fn execute_blocking(
        &self,
        input: &I,
        transport: &dyn HttpTransport,
        ctx: &mut InvocationContext,
        handle: &Handle,
    ) -> Result<O, HttpClientError<E>> {
        handle.block_on(self.execute(input, transport, ctx))
    }

    /// Run one call on `handle` and hand the result to `completion`.
    ///
    /// `completion` is called exactly once, with either the output or the
    /// error, unless the task itself is aborted.
    pub fn execute_with_callback<F>(
        self: Arc<Self>,
        input: I,
        transport: Arc<dyn HttpTransport>,
        mut ctx: InvocationContext,
        handle: &Handle,
        completion: F,
    ) -> JoinHandle<()>
    where
        I: Send + Sync + 'static,
        O: Send + 'static,
        F: FnOnce(Result<O, HttpClientError<E>>) + Send + 'static,
    {
        handle.spawn(async move {
            let result = self.execute(&input, transport.as_ref(), &mut ctx).await;
            completion(result);
        })
    }

    fn build_request(
        &self,
        input: &I,
        ctx: &mut InvocationContext,
    ) -> Result<http::Request<Bytes>, HttpClientError<E>> {
        let mut request = HttpRequestBuilder::new(self.method.clone());

        for stage in self.serialize_input.iter().chain(self.build.iter()) {
            if let Err(e) = stage.apply(input, &mut request, ctx) {
                debug!(
                    operation = ctx.operation(),
                    stage = stage.name(),
                    error = %e,
                    "request stage failed"
                );
                return Err(e.into());
            }
        }

        Ok(request.build()?)
    }

    fn deserialize(&self, response: http::Response<Bytes>) -> Result<O, HttpClientError<E>> {
        let (parts, body) = response.into_parts();
        if !parts.status.is_success() {
            let status = parts.status.as_u16();
            return Err(HttpClientError::Client {
                status,
                code: None,
                message: parts
                    .status
                    .canonical_reason()
                    .unwrap_or("unknown error")
                    .to_owned(),
                retriable: is_retriable_status(status, None),
            });
        }

        let body = decode_body::<O::Body>(&body, self.max_bytes)
            .map_err(|e| HttpClientError::Deserialization(e.to_string()))?;
        let headers = decode_headers::<O::Headers>(&parts.headers)
            .map_err(|e| HttpClientError::Deserialization(e.to_string()))?;
        Ok(O::compose(body, headers))
    }
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicU32, Ordering};
    use std::time::Duration;

    use ruststack_core::EndpointProtocol;
    use tokio_util::sync::CancellationToken;

    use super::*;
    use crate::codec::DEFAULT_MAX_BYTES;
    use crate::error::{CodecError, StageError, TransportError};
    use crate::metrics::{AttemptRecord, MetricsError, MetricsSink};
    use crate::phase::Position;
    use crate::retry::{ErrorStatus, ErrorStatusFn, JitterBounds, RetryConfiguration};
    use crate::stage::Stage;
    use crate::stages::{
        ClientErrorStage, ContentLengthStage, ContentTypeStage, HostStage, JsonBodyStage,
        JsonTypedErrorStage, PortStage, ProtocolStage, RetryStage, UrlPathStage,
    };
    use crate::testing::{
        PingInput, PingOutput, RecordingSink, ScriptedTransport, TestServiceError, json_response,
        test_context,
    };

    type PingStack = OperationMiddlewareStack<PingInput, PingOutput, TestServiceError>;

    fn retry_config(max_attempts: u32) -> RetryConfiguration {
        RetryConfiguration::builder()
            .max_attempts(max_attempts)
            .base_delay(Duration::from_millis(5))
            .jitter(JitterBounds::NONE)
            .build()
    }

    fn ping_stack(retry: RetryConfiguration, error_status: ErrorStatusFn) -> PingStack {
        let mut stack = PingStack::new(Method::POST, DEFAULT_MAX_BYTES);
        stack.serialize_input.append(Arc::new(UrlPathStage::new("/ping/{Name}")));
        stack.serialize_input.append(Arc::new(JsonBodyStage));
        stack.build.append(Arc::new(HostStage::new("localhost")));
        stack.build.append(Arc::new(ProtocolStage::new(EndpointProtocol::Http)));
        stack.build.append(Arc::new(PortStage::new(8080)));
        stack
            .build
            .append(Arc::new(ContentTypeStage::new("application/x-amz-json-1.0", true)));
        stack.build.append(Arc::new(ContentLengthStage::new(true)));
        stack.finalize.append(Arc::new(JsonTypedErrorStage::<TestServiceError>::new(
            vec!["BoomException".to_owned(), "BusyException".to_owned()],
            DEFAULT_MAX_BYTES,
        )));
        stack.finalize.append(Arc::new(ClientErrorStage::new(DEFAULT_MAX_BYTES)));
        stack
            .finalize
            .append(Arc::new(RetryStage::new(retry, error_status)));
        stack
    }

    fn default_stack() -> PingStack {
        ping_stack(retry_config(3), crate::retry::default_error_status_fn())
    }

    fn input() -> PingInput {
        PingInput {
            name: "web".to_owned(),
        }
    }

    #[tokio::test]
    async fn test_should_deserialize_body_and_header_fields() {
        let transport = ScriptedTransport::new(|_| {
            Ok(json_response(200, &[("x-amzn-requestid", "req-1")], r#"{"Message":"pong"}"#))
        });
        let mut ctx = test_context();

        let output = default_stack()
            .execute(&input(), &transport, &mut ctx)
            .await
            .unwrap();

        assert_eq!(output.message, "pong");
        assert_eq!(output.request_id.as_deref(), Some("req-1"));

        let requests = transport.requests();
        assert_eq!(requests[0].method, Method::POST);
        assert_eq!(requests[0].uri.to_string(), "http://localhost:8080/ping/web");
        assert_eq!(requests[0].headers["content-length"], "14");
        assert_eq!(
            requests[0].headers["content-type"],
            "application/x-amz-json-1.0"
        );
        assert_eq!(&requests[0].body[..], br#"{"Name":"web"}"#);
    }

    #[tokio::test(start_paused = true)]
    async fn test_should_make_exactly_max_attempts_when_classified_retriable() {
        let transport = ScriptedTransport::new(|_| Err(TransportError::fatal("unreachable")));
        let stack = ping_stack(retry_config(4), Arc::new(|_| ErrorStatus::RETRIABLE));
        let mut ctx = test_context();

        let result = stack.execute(&input(), &transport, &mut ctx).await;

        assert!(matches!(result, Err(HttpClientError::Transport(_))));
        assert_eq!(transport.calls(), 4);
        assert_eq!(ctx.attempt(), 4);
    }

    #[tokio::test(start_paused = true)]
    async fn test_should_stop_after_one_attempt_when_classified_fatal() {
        let transport = ScriptedTransport::new(|_| Err(TransportError::retriable("reset")));
        let stack = ping_stack(retry_config(4), Arc::new(|_| ErrorStatus::FATAL));
        let mut ctx = test_context();

        let result = stack.execute(&input(), &transport, &mut ctx).await;

        assert!(matches!(result, Err(HttpClientError::Transport(_))));
        assert_eq!(transport.calls(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_should_retry_server_errors_then_succeed() {
        let transport = ScriptedTransport::new(|attempt| {
            if attempt < 3 {
                Ok(json_response(503, &[], ""))
            } else {
                Ok(json_response(200, &[], r#"{"Message":"ok"}"#))
            }
        });
        let sink = Arc::new(RecordingSink::default());
        let mut ctx = test_context()
            .with_metrics(sink.clone())
            .with_request_tag("suite", "stack");

        let output = default_stack()
            .execute(&input(), &transport, &mut ctx)
            .await
            .unwrap();

        assert_eq!(output.message, "ok");
        assert_eq!(transport.calls(), 3);

        let records = sink.records();
        assert_eq!(records.len(), 3);
        assert_eq!(
            records.iter().map(|r| r.will_retry).collect::<Vec<_>>(),
            vec![true, true, false]
        );
        assert_eq!(records[0].status, Some(503));
        assert_eq!(records[2].retry_count(), 2);
        assert_eq!(records[2].request_tags["suite"], "stack");
    }

    #[tokio::test(start_paused = true)]
    async fn test_should_prefer_typed_error_over_status_classification() {
        let transport = ScriptedTransport::new(|_| {
            Ok(json_response(
                503,
                &[],
                r#"{"__type":"test#BoomException","message":"bad input"}"#,
            ))
        });
        let mut ctx = test_context();

        let result = default_stack().execute(&input(), &transport, &mut ctx).await;

        assert!(matches!(
            result,
            Err(HttpClientError::Service(TestServiceError::Boom(ref msg))) if msg == "bad input"
        ));
        assert_eq!(transport.calls(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_should_retry_whitelisted_typed_error() {
        let transport = ScriptedTransport::new(|_| {
            Ok(json_response(400, &[], r#"{"__type":"BusyException"}"#))
        });
        let mut ctx = test_context();

        let result = default_stack().execute(&input(), &transport, &mut ctx).await;

        assert!(matches!(
            result,
            Err(HttpClientError::Service(TestServiceError::Busy))
        ));
        assert_eq!(transport.calls(), 3);
    }

    #[tokio::test]
    async fn test_should_not_retry_undeclared_client_error() {
        let transport = ScriptedTransport::new(|_| {
            Ok(json_response(400, &[], r#"{"__type":"ValidationError","message":"nope"}"#))
        });
        let mut ctx = test_context();

        let result = default_stack().execute(&input(), &transport, &mut ctx).await;

        match result {
            Err(HttpClientError::Client {
                status,
                code,
                message,
                retriable,
            }) => {
                assert_eq!(status, 400);
                assert_eq!(code.as_deref(), Some("ValidationError"));
                assert_eq!(message, "nope");
                assert!(!retriable);
            }
            other => panic!("unexpected result: {other:?}"),
        }
        assert_eq!(transport.calls(), 1);
    }

    struct FailingBuildStage;

    impl Stage for FailingBuildStage {
        fn name(&self) -> &str {
            "FailingBuild"
        }
    }

    impl RequestStage<PingInput> for FailingBuildStage {
        fn apply(
            &self,
            _input: &PingInput,
            _request: &mut HttpRequestBuilder,
            _ctx: &mut InvocationContext,
        ) -> Result<(), StageError> {
            Err(CodecError::Message("cannot build".to_owned()).into())
        }
    }

    #[derive(Default)]
    struct CountingFinalizeStage(AtomicU32);

    impl Stage for CountingFinalizeStage {
        fn name(&self) -> &str {
            "Counting"
        }
    }

    impl FinalizeStage<TestServiceError> for CountingFinalizeStage {
        fn apply(
            &self,
            _outcome: &mut AttemptOutcome<TestServiceError>,
            _ctx: &mut InvocationContext,
        ) {
            self.0.fetch_add(1, Ordering::SeqCst);
        }
    }

    #[tokio::test]
    async fn test_should_skip_finalize_when_build_stage_fails() {
        let transport = ScriptedTransport::new(|_| Ok(json_response(200, &[], "{}")));
        let counter = Arc::new(CountingFinalizeStage::default());
        let mut stack = default_stack();
        stack
            .build
            .intercept(
                Position::Before(ContentTypeStage::NAME.to_owned()),
                Arc::new(FailingBuildStage),
            )
            .unwrap();
        stack
            .finalize
            .intercept(Position::First, counter.clone())
            .unwrap();
        let mut ctx = test_context();

        let result = stack.execute(&input(), &transport, &mut ctx).await;

        assert!(matches!(result, Err(HttpClientError::Validation(_))));
        assert_eq!(transport.calls(), 0);
        assert_eq!(counter.0.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_should_fail_validation_for_unresolved_path_placeholder() {
        let transport = ScriptedTransport::new(|_| Ok(json_response(200, &[], "{}")));
        let mut ctx = test_context();

        let result = default_stack()
            .execute(&PingInput::default(), &transport, &mut ctx)
            .await;

        assert!(matches!(result, Err(HttpClientError::Validation(msg)) if msg.contains("{Name}")));
        assert_eq!(transport.calls(), 0);
    }

    #[tokio::test]
    async fn test_should_run_duplicate_stages_twice() {
        let transport = ScriptedTransport::new(|_| Ok(json_response(200, &[], "{}")));
        let counter = Arc::new(CountingFinalizeStage::default());
        let mut stack = default_stack();
        stack.finalize.intercept(Position::First, counter.clone()).unwrap();
        stack.finalize.intercept(Position::First, counter.clone()).unwrap();
        let mut ctx = test_context();

        stack.execute(&input(), &transport, &mut ctx).await.unwrap();

        assert_eq!(counter.0.load(Ordering::SeqCst), 2);
    }

    #[tokio::test(start_paused = true)]
    async fn test_should_cancel_during_backoff_without_further_attempts() {
        let transport = Arc::new(ScriptedTransport::new(|_| {
            Err(TransportError::retriable("connection reset"))
        }));
        let stack = Arc::new(ping_stack(
            RetryConfiguration::builder()
                .max_attempts(5)
                .base_delay(Duration::from_secs(60))
                .jitter(JitterBounds::NONE)
                .build(),
            crate::retry::default_error_status_fn(),
        ));
        let token = CancellationToken::new();
        let mut ctx = test_context().with_cancellation(token.clone());

        let task = {
            let transport = Arc::clone(&transport);
            tokio::spawn(async move {
                stack
                    .execute(&input(), transport.as_ref(), &mut ctx)
                    .await
            })
        };

        tokio::time::sleep(Duration::from_secs(1)).await;
        assert_eq!(transport.calls(), 1);
        token.cancel();

        let result = task.await.unwrap();
        assert!(matches!(result, Err(HttpClientError::Cancelled)));
        assert_eq!(transport.calls(), 1);
    }

    #[tokio::test]
    async fn test_should_not_send_when_already_cancelled() {
        let transport = ScriptedTransport::new(|_| Ok(json_response(200, &[], "{}")));
        let token = CancellationToken::new();
        token.cancel();
        let mut ctx = test_context().with_cancellation(token);

        let result = default_stack().execute(&input(), &transport, &mut ctx).await;

        assert!(matches!(result, Err(HttpClientError::Cancelled)));
        assert_eq!(transport.calls(), 0);
    }

    #[tokio::test]
    async fn test_should_invoke_completion_exactly_once() {
        let transport: Arc<dyn HttpTransport> = Arc::new(ScriptedTransport::new(|_| {
            Ok(json_response(200, &[], r#"{"Message":"async"}"#))
        }));
        let calls = Arc::new(AtomicU32::new(0));
        let (tx, rx) = tokio::sync::oneshot::channel();

        let handle = {
            let calls = Arc::clone(&calls);
            Arc::new(default_stack()).execute_with_callback(
                input(),
                transport,
                test_context(),
                &Handle::current(),
                move |result| {
                    calls.fetch_add(1, Ordering::SeqCst);
                    let _ = tx.send(result);
                },
            )
        };

        handle.await.unwrap();
        let result = rx.await.unwrap();
        assert_eq!(result.unwrap().message, "async");
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn test_should_execute_blocking_on_runtime_handle() {
        let runtime = tokio::runtime::Runtime::new().unwrap();
        let transport = ScriptedTransport::new(|_| {
            Ok(json_response(200, &[], r#"{"Message":"blocking"}"#))
        });
        let mut ctx = test_context();

        let output = default_stack()
            .execute_blocking(&input(), &transport, &mut ctx, runtime.handle())
            .unwrap();

        assert_eq!(output.message, "blocking");
    }

    struct BrokenSink;

    impl MetricsSink for BrokenSink {
        fn record(&self, _record: &AttemptRecord) -> Result<(), MetricsError> {
            Err(MetricsError::Unavailable("offline".to_owned()))
        }
    }

    #[tokio::test]
    async fn test_should_ignore_metrics_sink_failures() {
        let transport = ScriptedTransport::new(|_| Ok(json_response(200, &[], "{}")));
        let mut ctx = test_context().with_metrics(Arc::new(BrokenSink));

        let result = default_stack().execute(&input(), &transport, &mut ctx).await;

        assert!(result.is_ok());
    }

    #[tokio::test]
    async fn test_should_record_attempt_that_fails_to_build() {
        let transport = ScriptedTransport::new(|_| Ok(json_response(200, &[], "{}")));
        let sink = Arc::new(RecordingSink::default());
        let mut stack = default_stack();
        stack
            .build
            .intercept(Position::Last, Arc::new(FailingBuildStage))
            .unwrap();
        let mut ctx = test_context().with_metrics(sink.clone());

        let result = stack.execute(&input(), &transport, &mut ctx).await;

        assert!(matches!(result, Err(HttpClientError::Validation(_))));
        let records = sink.records();
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].attempt, 1);
        assert_eq!(records[0].status, None);
        assert!(!records[0].succeeded);
        assert!(!records[0].will_retry);
    }

    struct HangingTransport;

    impl HttpTransport for HangingTransport {
        fn send(&self, _request: http::Request<Bytes>) -> crate::transport::TransportFuture<'_> {
            Box::pin(std::future::pending())
        }
    }

    #[tokio::test(start_paused = true)]
    async fn test_should_record_attempt_cancelled_while_sending() {
        let sink = Arc::new(RecordingSink::default());
        let token = CancellationToken::new();
        let mut ctx = test_context()
            .with_metrics(sink.clone())
            .with_cancellation(token.clone());
        let stack = default_stack();

        let canceller = tokio::spawn(async move {
            tokio::time::sleep(Duration::from_millis(50)).await;
            token.cancel();
        });
        let result = stack.execute(&input(), &HangingTransport, &mut ctx).await;
        canceller.await.unwrap();

        assert!(matches!(result, Err(HttpClientError::Cancelled)));
        let records = sink.records();
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].status, None);
        assert!(!records[0].will_retry);
    }
}
