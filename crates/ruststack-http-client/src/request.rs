//! The request under construction.

use bytes::Bytes;
use http::header::{HeaderName, HeaderValue};
use http::{HeaderMap, Method, Uri};
use ruststack_core::EndpointProtocol;

use crate::codec::to_query_string;
use crate::error::CodecError;

/// Mutable request state that stages fill in, turned into an
/// `http::Request` once the build phase is done.
#[derive(Debug, Clone)]
pub struct HttpRequestBuilder {
    method: Method,
    protocol: EndpointProtocol,
    host: Option<String>,
    port: Option<u16>,
    path: String,
    query: Vec<(String, String)>,
    headers: HeaderMap,
    body: Bytes,
}

impl HttpRequestBuilder {
    /// Start an empty request for `method` with path `/`.
    #[must_use]
    pub fn new(method: Method) -> Self {
        Self {
            method,
            protocol: EndpointProtocol::default(),
            host: None,
            port: None,
            path: "/".to_owned(),
            query: Vec::new(),
            headers: HeaderMap::new(),
            body: Bytes::new(),
        }
    }

    /// HTTP method.
    #[must_use]
    pub fn method(&self) -> &Method {
        &self.method
    }

    /// Endpoint scheme.
    #[must_use]
    pub fn protocol(&self) -> EndpointProtocol {
        self.protocol
    }

    /// Set the endpoint scheme.
    pub fn set_protocol(&mut self, protocol: EndpointProtocol) {
        self.protocol = protocol;
    }

    /// Endpoint host, once set.
    #[must_use]
    pub fn host(&self) -> Option<&str> {
        self.host.as_deref()
    }

    /// Set the endpoint host.
    pub fn set_host(&mut self, host: impl Into<String>) {
        self.host = Some(host.into());
    }

    /// Explicit port, if any.
    #[must_use]
    pub fn port(&self) -> Option<u16> {
        self.port
    }

    /// Set the endpoint port.
    pub fn set_port(&mut self, port: u16) {
        self.port = Some(port);
    }

    /// Encoded request path.
    #[must_use]
    pub fn path(&self) -> &str {
        &self.path
    }

    /// Replace the encoded request path.
    pub fn set_path(&mut self, path: impl Into<String>) {
        self.path = path.into();
    }

    /// Unencoded query parameters.
    #[must_use]
    pub fn query(&self) -> &[(String, String)] {
        &self.query
    }

    /// Add query parameters, keeping the whole list sorted.
    pub fn append_query(&mut self, params: impl IntoIterator<Item = (String, String)>) {
        self.query.extend(params);
        self.query.sort();
    }

    /// Request headers.
    #[must_use]
    pub fn headers(&self) -> &HeaderMap {
        &self.headers
    }

    /// Set a header, replacing any existing value.
    ///
    /// # Errors
    ///
    /// Returns [`CodecError::InvalidHeader`] if the name or value is not a
    /// valid HTTP header.
    pub fn insert_header(&mut self, name: &str, value: &str) -> Result<(), CodecError> {
        let header_name = HeaderName::from_bytes(name.to_ascii_lowercase().as_bytes())
            .map_err(|_| CodecError::InvalidHeader(name.to_owned()))?;
        let header_value =
            HeaderValue::from_str(value).map_err(|_| CodecError::InvalidHeader(name.to_owned()))?;
        self.headers.insert(header_name, header_value);
        Ok(())
    }

    /// Remove a header if present.
    pub fn remove_header(&mut self, name: &str) {
        self.headers.remove(name);
    }

    /// Request body.
    #[must_use]
    pub fn body(&self) -> &Bytes {
        &self.body
    }

    /// Replace the request body.
    pub fn set_body(&mut self, body: Bytes) {
        self.body = body;
    }

    /// Value of the `Host` header: the host, plus the port when it is not the
    /// scheme's default.
    ///
    /// # Errors
    ///
    /// Returns [`CodecError::Message`] if no host has been set.
    pub fn authority(&self) -> Result<String, CodecError> {
        let host = self
            .host
            .as_deref()
            .ok_or_else(|| CodecError::Message("request has no host".to_owned()))?;
        Ok(match self.port {
            Some(port) if port != self.protocol.default_port() => format!("{host}:{port}"),
            _ => host.to_owned(),
        })
    }

    /// The full request URI.
    ///
    /// # Errors
    ///
    /// Returns [`CodecError::Message`] if no host is set or the pieces do not
    /// form a valid URI.
    pub fn uri(&self) -> Result<Uri, CodecError> {
        let mut uri = format!("{}://{}{}", self.protocol, self.authority()?, self.path);
        if !self.query.is_empty() {
            uri.push('?');
            uri.push_str(&to_query_string(&self.query));
        }
        uri.parse()
            .map_err(|e| CodecError::Message(format!("invalid request URI {uri:?}: {e}")))
    }

    /// Produce the request to hand to the transport.
    ///
    /// # Errors
    ///
    /// See [`HttpRequestBuilder::uri`].
    pub fn build(&self) -> Result<http::Request<Bytes>, CodecError> {
        let mut request = http::Request::new(self.body.clone());
        *request.method_mut() = self.method.clone();
        *request.uri_mut() = self.uri()?;
        *request.headers_mut() = self.headers.clone();
        Ok(request)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_should_build_uri_with_sorted_query() {
        let mut builder = HttpRequestBuilder::new(Method::GET);
        builder.set_protocol(EndpointProtocol::Http);
        builder.set_host("localhost");
        builder.set_port(4566);
        builder.set_path("/stacks");
        builder.append_query([
            ("b".to_owned(), "2".to_owned()),
            ("a".to_owned(), "x y".to_owned()),
        ]);

        assert_eq!(
            builder.uri().unwrap().to_string(),
            "http://localhost:4566/stacks?a=x%20y&b=2"
        );
    }

    #[test]
    fn test_should_omit_default_port_from_authority() {
        let mut builder = HttpRequestBuilder::new(Method::POST);
        builder.set_host("cloudformation.us-east-1.amazonaws.com");
        builder.set_port(443);
        assert_eq!(
            builder.authority().unwrap(),
            "cloudformation.us-east-1.amazonaws.com"
        );
    }

    #[test]
    fn test_should_fail_without_host() {
        let builder = HttpRequestBuilder::new(Method::POST);
        assert!(builder.build().is_err());
    }

    #[test]
    fn test_should_reject_invalid_header_value() {
        let mut builder = HttpRequestBuilder::new(Method::POST);
        let result = builder.insert_header("x-amz-target", "bad\nvalue");
        assert!(matches!(result, Err(CodecError::InvalidHeader(_))));
    }
}
