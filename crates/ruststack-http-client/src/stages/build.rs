//! Build-phase stages: endpoint and content headers.
//!
//! These stages ignore the input, so each is a [`RequestStage`] for every
//! input type.

use ruststack_core::EndpointProtocol;

use crate::context::InvocationContext;
use crate::error::StageError;
use crate::request::HttpRequestBuilder;
use crate::stage::{RequestStage, Stage};

/// Sets the endpoint host.
#[derive(Debug, Clone)]
pub struct HostStage {
    host: String,
}

impl HostStage {
    /// Stage name.
    pub const NAME: &'static str = "Host";

    /// Create the stage.
    pub fn new(host: impl Into<String>) -> Self {
        Self { host: host.into() }
    }
}

impl Stage for HostStage {
    fn name(&self) -> &str {
        Self::NAME
    }
}

impl<I> RequestStage<I> for HostStage {
    fn apply(
        &self,
        _input: &I,
        request: &mut HttpRequestBuilder,
        _ctx: &mut InvocationContext,
    ) -> Result<(), StageError> {
        request.set_host(self.host.clone());
        Ok(())
    }
}

/// Sets the endpoint scheme.
#[derive(Debug, Clone, Copy)]
pub struct ProtocolStage {
    protocol: EndpointProtocol,
}

impl ProtocolStage {
    /// Stage name.
    pub const NAME: &'static str = "Protocol";

    /// Create the stage.
    #[must_use]
    pub fn new(protocol: EndpointProtocol) -> Self {
        Self { protocol }
    }
}

impl Stage for ProtocolStage {
    fn name(&self) -> &str {
        Self::NAME
    }
}

impl<I> RequestStage<I> for ProtocolStage {
    fn apply(
        &self,
        _input: &I,
        request: &mut HttpRequestBuilder,
        _ctx: &mut InvocationContext,
    ) -> Result<(), StageError> {
        request.set_protocol(self.protocol);
        Ok(())
    }
}

/// Sets the endpoint port.
#[derive(Debug, Clone, Copy)]
pub struct PortStage {
    port: u16,
}

impl PortStage {
    /// Stage name.
    pub const NAME: &'static str = "Port";

    /// Create the stage.
    #[must_use]
    pub fn new(port: u16) -> Self {
        Self { port }
    }
}

impl Stage for PortStage {
    fn name(&self) -> &str {
        Self::NAME
    }
}

impl<I> RequestStage<I> for PortStage {
    fn apply(
        &self,
        _input: &I,
        request: &mut HttpRequestBuilder,
        _ctx: &mut InvocationContext,
    ) -> Result<(), StageError> {
        request.set_port(self.port);
        Ok(())
    }
}

/// Sets `content-type`, or drops it for a zero-length body when configured to.
#[derive(Debug, Clone)]
pub struct ContentTypeStage {
    content_type: String,
    omit_for_empty_body: bool,
}

impl ContentTypeStage {
    /// Stage name.
    pub const NAME: &'static str = "ContentType";

    /// Create the stage.
    pub fn new(content_type: impl Into<String>, omit_for_empty_body: bool) -> Self {
        Self {
            content_type: content_type.into(),
            omit_for_empty_body,
        }
    }
}

impl Stage for ContentTypeStage {
    fn name(&self) -> &str {
        Self::NAME
    }
}

impl<I> RequestStage<I> for ContentTypeStage {
    fn apply(
        &self,
        _input: &I,
        request: &mut HttpRequestBuilder,
        ctx: &mut InvocationContext,
    ) -> Result<(), StageError> {
        if self.omit_for_empty_body && ctx.body.is_empty() {
            request.remove_header("content-type");
        } else {
            request.insert_header("content-type", &self.content_type)?;
        }
        Ok(())
    }
}

/// Sets `content-length` from the body record, or drops it for a zero-length
/// body when configured to.
#[derive(Debug, Clone, Copy)]
pub struct ContentLengthStage {
    omit_for_empty_body: bool,
}

impl ContentLengthStage {
    /// Stage name.
    pub const NAME: &'static str = "ContentLength";

    /// Create the stage.
    #[must_use]
    pub fn new(omit_for_empty_body: bool) -> Self {
        Self {
            omit_for_empty_body,
        }
    }
}

impl Stage for ContentLengthStage {
    fn name(&self) -> &str {
        Self::NAME
    }
}

impl<I> RequestStage<I> for ContentLengthStage {
    fn apply(
        &self,
        _input: &I,
        request: &mut HttpRequestBuilder,
        ctx: &mut InvocationContext,
    ) -> Result<(), StageError> {
        if self.omit_for_empty_body && ctx.body.is_empty() {
            request.remove_header("content-length");
        } else {
            request.insert_header("content-length", &ctx.body.len().to_string())?;
        }
        Ok(())
    }
}
