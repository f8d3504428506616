//! Shared fixtures for the pipeline tests.

use std::sync::Arc;
use std::sync::atomic::{AtomicU32, Ordering};

use bytes::Bytes;
use parking_lot::Mutex;
use ruststack_auth::StaticCredentialsProvider;
use serde::{Deserialize, Serialize};

use crate::context::InvocationContext;
use crate::error::{ServiceError, TransportError};
use crate::metrics::{AttemptRecord, MetricsError, MetricsSink};
use crate::operation::{HttpRequestInput, HttpResponseOutput};
use crate::transport::{HttpTransport, TransportFuture};

type Responder = Box<dyn Fn(u32) -> Result<http::Response<Bytes>, TransportError> + Send + Sync>;

/// Answers each attempt from a closure over the 1-based call number and
/// keeps every request it was handed.
pub(crate) struct ScriptedTransport {
    calls: AtomicU32,
    requests: Mutex<Vec<CapturedRequest>>,
    responder: Responder,
}

/// What the transport was asked to send.
#[derive(Debug, Clone)]
pub(crate) struct CapturedRequest {
    pub(crate) method: http::Method,
    pub(crate) uri: http::Uri,
    pub(crate) headers: http::HeaderMap,
    pub(crate) body: Bytes,
}

impl ScriptedTransport {
    pub(crate) fn new(
        responder: impl Fn(u32) -> Result<http::Response<Bytes>, TransportError>
        + Send
        + Sync
        + 'static,
    ) -> Self {
        Self {
            calls: AtomicU32::new(0),
            requests: Mutex::new(Vec::new()),
            responder: Box::new(responder),
        }
    }

    pub(crate) fn calls(&self) -> u32 {
        self.calls.load(Ordering::SeqCst)
    }

    pub(crate) fn requests(&self) -> Vec<CapturedRequest> {
        self.requests.lock().clone()
    }
}

impl HttpTransport for ScriptedTransport {
    fn send(&self, request: http::Request<Bytes>) -> TransportFuture<'_> {
        let attempt = self.calls.fetch_add(1, Ordering::SeqCst) + 1;
        let (parts, body) = request.into_parts();
        self.requests.lock().push(CapturedRequest {
            method: parts.method,
            uri: parts.uri,
            headers: parts.headers,
            body,
        });
        let result = (self.responder)(attempt);
        Box::pin(async move { result })
    }
}

pub(crate) fn json_response(
    status: u16,
    headers: &[(&'static str, &'static str)],
    body: &str,
) -> http::Response<Bytes> {
    let mut builder = http::Response::builder().status(status);
    for (name, value) in headers {
        builder = builder.header(*name, *value);
    }
    builder.body(Bytes::from(body.to_owned())).unwrap()
}

pub(crate) fn test_context() -> InvocationContext {
    InvocationContext::new(
        "Ping",
        Arc::new(StaticCredentialsProvider::new("AKIDEXAMPLE", "secret")),
    )
}

#[derive(Debug, Default)]
pub(crate) struct RecordingSink(Mutex<Vec<AttemptRecord>>);

impl RecordingSink {
    pub(crate) fn records(&self) -> Vec<AttemptRecord> {
        self.0.lock().clone()
    }
}

impl MetricsSink for RecordingSink {
    fn record(&self, record: &AttemptRecord) -> Result<(), MetricsError> {
        self.0.lock().push(record.clone());
        Ok(())
    }
}

#[derive(Debug, PartialEq, Eq, thiserror::Error)]
pub(crate) enum TestServiceError {
    #[error("boom: {0}")]
    Boom(String),
    #[error("busy")]
    Busy,
}

impl ServiceError for TestServiceError {
    fn from_code(code: &str, message: Option<String>) -> Option<Self> {
        match code {
            "BoomException" => Some(Self::Boom(message.unwrap_or_default())),
            "BusyException" => Some(Self::Busy),
            _ => None,
        }
    }

    fn is_retriable(&self) -> bool {
        matches!(self, Self::Busy)
    }
}

#[derive(Debug, Clone, Default, Serialize)]
#[serde(rename_all = "PascalCase")]
pub(crate) struct PingInput {
    pub(crate) name: String,
}

impl HttpRequestInput for PingInput {
    type Path = Self;
    type Query = ();
    type Body = Self;
    type Headers = ();

    fn path_encodable(&self) -> Option<&Self> {
        Some(self)
    }

    fn body_encodable(&self) -> Option<&Self> {
        Some(self)
    }
}

#[derive(Debug, Default, Deserialize, PartialEq)]
#[serde(rename_all = "PascalCase")]
pub(crate) struct PingOutput {
    #[serde(default)]
    pub(crate) message: String,
    #[serde(skip)]
    pub(crate) request_id: Option<String>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct PingHeaders {
    #[serde(rename = "x-amzn-requestid")]
    request_id: Option<String>,
}

impl HttpResponseOutput for PingOutput {
    type Body = PingOutput;
    type Headers = PingHeaders;

    fn compose(body: Option<PingOutput>, headers: PingHeaders) -> Self {
        let mut output = body.unwrap_or_default();
        output.request_id = headers.request_id;
        output
    }
}
