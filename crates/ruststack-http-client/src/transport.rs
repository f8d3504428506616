//! The transport collaborator.
//!
//! The pipeline hands a fully built request to an [`HttpTransport`] and treats
//! whatever comes back as one attempt. [`HyperTransport`] is a plain-HTTP
//! implementation over hyper-util's pooled client.

use std::future::Future;
use std::pin::Pin;

use bytes::Bytes;
use http_body_util::{BodyExt, Full};
use hyper_util::client::legacy::Client;
use hyper_util::client::legacy::connect::HttpConnector;
use hyper_util::rt::TokioExecutor;
use tracing::debug;

use crate::error::TransportError;

/// Boxed future returned by [`HttpTransport::send`].
pub type TransportFuture<'a> =
    Pin<Box<dyn Future<Output = Result<http::Response<Bytes>, TransportError>> + Send + 'a>>;

/// Sends one request and returns the full response.
pub trait HttpTransport: Send + Sync + 'static {
    /// Send `request`.
    fn send(&self, request: http::Request<Bytes>) -> TransportFuture<'_>;
}

/// [`HttpTransport`] over a pooled hyper client, plain HTTP only.
#[derive(Debug, Clone)]
pub struct HyperTransport {
    client: Client<HttpConnector, Full<Bytes>>,
}

impl Default for HyperTransport {
    fn default() -> Self {
        Self::new()
    }
}

impl HyperTransport {
    /// Create a transport with a fresh connection pool.
    #[must_use]
    pub fn new() -> Self {
        Self {
            client: Client::builder(TokioExecutor::new()).build_http(),
        }
    }
}

impl HttpTransport for HyperTransport {
    fn send(&self, request: http::Request<Bytes>) -> TransportFuture<'_> {
        Box::pin(async move {
            if request.uri().scheme() != Some(&http::uri::Scheme::HTTP) {
                return Err(TransportError::fatal(format!(
                    "HyperTransport only speaks plain HTTP, got {}",
                    request.uri()
                )));
            }

            let (parts, body) = request.into_parts();
            debug!(method = %parts.method, uri = %parts.uri, "sending request");

            let response = self
                .client
                .request(http::Request::from_parts(parts, Full::new(body)))
                .await
                .map_err(|e| classify_client_error(&e))?;

            let (parts, incoming) = response.into_parts();
            let body = incoming
                .collect()
                .await
                .map(http_body_util::Collected::to_bytes)
                .map_err(|e| {
                    TransportError::retriable(format!("failed to read response body: {e}"))
                })?;

            debug!(status = %parts.status, bytes = body.len(), "received response");
            Ok(http::Response::from_parts(parts, body))
        })
    }
}

/// Connect failures and failures on an established connection are
/// retriable. A request hyper refuses to send is not.
fn classify_client_error(e: &hyper_util::client::legacy::Error) -> TransportError {
    if e.is_connect() {
        return TransportError::retriable(format!("failed to connect: {e}"));
    }

    let mut source = std::error::Error::source(e);
    while let Some(cause) = source {
        if let Some(hyper_error) = cause.downcast_ref::<hyper::Error>() {
            if hyper_error.is_user() {
                return TransportError::fatal(format!("request rejected: {e}"));
            }
            break;
        }
        source = cause.source();
    }

    TransportError::retriable(format!("request failed: {e}"))
}
