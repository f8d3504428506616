//! End-to-end tests for the RustStack CloudFormation client.
//!
//! Each test starts a [`FakeCloudFormation`] server on a random local port.
//! The server checks the SigV4 signature of every request against the
//! `test`/`test` credentials, records the call, and answers with whatever the
//! test's responder returns. Clients reach it through [`HyperTransport`], so
//! requests cross a real socket.
//!
//! ```text
//! cargo test -p ruststack-integration
//! ```

use std::convert::Infallible;
use std::future::Future;
use std::net::SocketAddr;
use std::pin::Pin;
use std::sync::{Arc, Once};
use std::time::Duration;

use bytes::Bytes;
use http_body_util::{BodyExt, Full};
use hyper::body::Incoming;
use hyper::service::Service;
use hyper_util::rt::{TokioExecutor, TokioIo};
use hyper_util::server::conn::auto::Builder as HttpConnBuilder;
use parking_lot::Mutex;
use ruststack_auth::sigv4::VerifiedSignature;
use ruststack_auth::{StaticCredentialsProvider, hash_payload, verify_sigv4};
use ruststack_cloudformation_client::AwsCloudFormationClient;
use ruststack_core::{ClientConfig, EndpointProtocol};
use ruststack_http_client::{HyperTransport, JitterBounds, RetryConfiguration};
use tokio::net::TcpListener;
use tokio::task::JoinHandle;
use tracing::{debug, warn};

/// Access key every client and the server share.
pub const ACCESS_KEY: &str = "test";
/// Secret key the server verifies signatures with.
pub const SECRET_KEY: &str = "test";

static INIT: Once = Once::new();

/// Initialize tracing (once).
fn init_tracing() {
    INIT.call_once(|| {
        tracing_subscriber::fmt()
            .with_env_filter(
                tracing_subscriber::EnvFilter::try_from_default_env()
                    .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("warn")),
            )
            .with_test_writer()
            .init();
    });
}

/// One request as the server saw it.
#[derive(Debug, Clone)]
pub struct RecordedCall {
    /// `x-amz-target` header.
    pub target: Option<String>,
    /// Operation name from the target, e.g. `DescribeStacks`.
    pub operation: Option<String>,
    /// `content-type` header.
    pub content_type: Option<String>,
    /// Request body.
    pub body: Bytes,
    /// Outcome of signature verification.
    pub signature: Result<VerifiedSignature, String>,
}

impl RecordedCall {
    /// The body parsed as JSON, `Null` when empty.
    #[must_use]
    pub fn json(&self) -> serde_json::Value {
        if self.body.is_empty() {
            return serde_json::Value::Null;
        }
        serde_json::from_slice(&self.body).unwrap_or(serde_json::Value::Null)
    }
}

/// What the server sends back for one call.
#[derive(Debug, Clone)]
pub struct Reply {
    /// HTTP status.
    pub status: u16,
    /// JSON body.
    pub body: String,
    /// Delay before answering.
    pub delay: Option<Duration>,
}

impl Reply {
    /// A 200 reply with `body`.
    #[must_use]
    pub fn ok(body: impl Into<String>) -> Self {
        Self {
            status: 200,
            body: body.into(),
            delay: None,
        }
    }

    /// An error reply in the `awsJson1_0` shape.
    #[must_use]
    pub fn error(status: u16, code: &str, message: &str) -> Self {
        Self {
            status,
            body: serde_json::json!({ "__type": code, "message": message }).to_string(),
            delay: None,
        }
    }

    /// Answer only after `delay`.
    #[must_use]
    pub fn after(mut self, delay: Duration) -> Self {
        self.delay = Some(delay);
        self
    }
}

type Responder = dyn Fn(&RecordedCall) -> Reply + Send + Sync;

struct ServerState {
    credentials: StaticCredentialsProvider,
    responder: Box<Responder>,
    calls: Mutex<Vec<RecordedCall>>,
}

#[derive(Clone)]
struct FakeService {
    state: Arc<ServerState>,
}

impl Service<http::Request<Incoming>> for FakeService {
    type Response = http::Response<Full<Bytes>>;
    type Error = Infallible;
    type Future = Pin<Box<dyn Future<Output = Result<Self::Response, Self::Error>> + Send>>;

    fn call(&self, req: http::Request<Incoming>) -> Self::Future {
        let state = Arc::clone(&self.state);
        Box::pin(async move { Ok(state.handle(req).await) })
    }
}

impl ServerState {
    async fn handle(&self, req: http::Request<Incoming>) -> http::Response<Full<Bytes>> {
        let (parts, incoming) = req.into_parts();
        let body = match incoming.collect().await {
            Ok(collected) => collected.to_bytes(),
            Err(e) => {
                warn!(error = %e, "failed to read request body");
                return respond(&Reply::error(400, "SerializationException", "unreadable body"));
            }
        };

        let signature = verify_sigv4(&parts, &hash_payload(&body), &self.credentials)
            .map_err(|e| e.to_string());
        let header = |name: &str| {
            parts
                .headers
                .get(name)
                .and_then(|v| v.to_str().ok())
                .map(str::to_owned)
        };
        let target = header("x-amz-target");
        let call = RecordedCall {
            operation: target
                .as_deref()
                .and_then(|t| t.split_once('.'))
                .map(|(_, op)| op.to_owned()),
            target,
            content_type: header("content-type"),
            body,
            signature,
        };
        debug!(target = ?call.target, "received call");

        let reply = match &call.signature {
            Ok(_) => (self.responder)(&call),
            Err(message) => Reply::error(403, "SignatureDoesNotMatch", message),
        };
        self.calls.lock().push(call);

        if let Some(delay) = reply.delay {
            tokio::time::sleep(delay).await;
        }
        respond(&reply)
    }
}

fn respond(reply: &Reply) -> http::Response<Full<Bytes>> {
    http::Response::builder()
        .status(reply.status)
        .header("content-type", "application/x-amz-json-1.0")
        .header("x-amzn-RequestId", uuid::Uuid::new_v4().to_string())
        .body(Full::new(Bytes::from(reply.body.clone())))
        .unwrap_or_else(|_| http::Response::new(Full::new(Bytes::new())))
}

/// An in-process stand-in for the CloudFormation endpoint.
pub struct FakeCloudFormation {
    addr: SocketAddr,
    state: Arc<ServerState>,
    accept_loop: JoinHandle<()>,
}

impl std::fmt::Debug for FakeCloudFormation {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FakeCloudFormation")
            .field("addr", &self.addr)
            .finish_non_exhaustive()
    }
}

impl FakeCloudFormation {
    /// Bind a random local port and serve calls with `responder`.
    pub async fn start(responder: impl Fn(&RecordedCall) -> Reply + Send + Sync + 'static) -> Self {
        init_tracing();

        let listener = TcpListener::bind("127.0.0.1:0")
            .await
            .unwrap_or_else(|e| panic!("failed to bind test server: {e}"));
        let addr = listener
            .local_addr()
            .unwrap_or_else(|e| panic!("failed to read local address: {e}"));
        let state = Arc::new(ServerState {
            credentials: StaticCredentialsProvider::new(ACCESS_KEY, SECRET_KEY),
            responder: Box::new(responder),
            calls: Mutex::new(Vec::new()),
        });

        let service = FakeService {
            state: Arc::clone(&state),
        };
        let accept_loop = tokio::spawn(async move {
            let http = HttpConnBuilder::new(TokioExecutor::new());
            loop {
                let (stream, peer_addr) = match listener.accept().await {
                    Ok(conn) => conn,
                    Err(e) => {
                        warn!(error = %e, "failed to accept connection");
                        continue;
                    }
                };
                let conn = http
                    .serve_connection(TokioIo::new(stream), service.clone())
                    .into_owned();
                tokio::spawn(async move {
                    if let Err(e) = conn.await {
                        debug!(peer_addr = %peer_addr, error = %e, "connection closed");
                    }
                });
            }
        });

        Self {
            addr,
            state,
            accept_loop,
        }
    }

    /// Port the server listens on.
    #[must_use]
    pub fn port(&self) -> u16 {
        self.addr.port()
    }

    /// Every call received so far, in arrival order.
    #[must_use]
    pub fn calls(&self) -> Vec<RecordedCall> {
        self.state.calls.lock().clone()
    }

    /// A client for this server, signing with `secret_key`.
    #[must_use]
    pub fn client_with_secret(&self, secret_key: &str) -> AwsCloudFormationClient {
        client_for_port(self.port(), secret_key)
    }

    /// A client for this server, signing with the shared test credentials.
    #[must_use]
    pub fn client(&self) -> AwsCloudFormationClient {
        self.client_with_secret(SECRET_KEY)
    }
}

impl Drop for FakeCloudFormation {
    fn drop(&mut self) {
        self.accept_loop.abort();
    }
}

/// A client for `127.0.0.1:port` with three quick attempts per call.
#[must_use]
pub fn client_for_port(port: u16, secret_key: &str) -> AwsCloudFormationClient {
    let config = ClientConfig {
        endpoint_host: Some("127.0.0.1".to_owned()),
        endpoint_port: Some(port),
        protocol: EndpointProtocol::Http,
        ..ClientConfig::default()
    };
    AwsCloudFormationClient::new(
        &config,
        Arc::new(StaticCredentialsProvider::new(ACCESS_KEY, secret_key)),
        Arc::new(HyperTransport::new()),
    )
    .with_retry(
        RetryConfiguration::builder()
            .max_attempts(3)
            .base_delay(Duration::from_millis(10))
            .jitter(JitterBounds::NONE)
            .build(),
    )
}

mod test_errors;
mod test_stacks;
