//! Serialize-phase stages: one per request location.

use crate::codec::{
    MapEncodingStrategy, encode_body, encode_headers, encode_path, encode_query, join_postfix,
};
use crate::context::InvocationContext;
use crate::error::StageError;
use crate::operation::HttpRequestInput;
use crate::request::HttpRequestBuilder;
use crate::shape::{Shape, to_shape};
use crate::stage::{RequestStage, Stage};

/// Fills the path template from the input's path fields.
#[derive(Debug, Clone)]
pub struct UrlPathStage {
    template: String,
}

impl UrlPathStage {
    /// Stage name.
    pub const NAME: &'static str = "UrlPath";

    /// Create the stage for a path template such as `/stacks/{StackName}`.
    pub fn new(template: impl Into<String>) -> Self {
        Self {
            template: template.into(),
        }
    }
}

impl Stage for UrlPathStage {
    fn name(&self) -> &str {
        Self::NAME
    }
}

impl<I: HttpRequestInput> RequestStage<I> for UrlPathStage {
    fn apply(
        &self,
        input: &I,
        request: &mut HttpRequestBuilder,
        _ctx: &mut InvocationContext,
    ) -> Result<(), StageError> {
        let shape = match input.path_encodable() {
            Some(path) => to_shape(path)?,
            None => Shape::Null,
        };
        let path = encode_path(&self.template, &shape)?;
        request.set_path(join_postfix(&path, input.path_postfix()));
        Ok(())
    }
}

/// Adds the input's query fields.
#[derive(Debug, Clone, Default)]
pub struct QueryItemsStage {
    strategy: MapEncodingStrategy,
}

impl QueryItemsStage {
    /// Stage name.
    pub const NAME: &'static str = "QueryItems";

    /// Create the stage with an explicit map encoding.
    #[must_use]
    pub fn new(strategy: MapEncodingStrategy) -> Self {
        Self { strategy }
    }
}

impl Stage for QueryItemsStage {
    fn name(&self) -> &str {
        Self::NAME
    }
}

impl<I: HttpRequestInput> RequestStage<I> for QueryItemsStage {
    fn apply(
        &self,
        input: &I,
        request: &mut HttpRequestBuilder,
        _ctx: &mut InvocationContext,
    ) -> Result<(), StageError> {
        if let Some(query) = input.query_encodable() {
            request.append_query(encode_query(&to_shape(query)?, &self.strategy)?);
        }
        Ok(())
    }
}

/// Adds the input's header fields.
#[derive(Debug, Clone, Copy, Default)]
pub struct AdditionalHeadersStage;

impl AdditionalHeadersStage {
    /// Stage name.
    pub const NAME: &'static str = "AdditionalHeaders";
}

impl Stage for AdditionalHeadersStage {
    fn name(&self) -> &str {
        Self::NAME
    }
}

impl<I: HttpRequestInput> RequestStage<I> for AdditionalHeadersStage {
    fn apply(
        &self,
        input: &I,
        request: &mut HttpRequestBuilder,
        _ctx: &mut InvocationContext,
    ) -> Result<(), StageError> {
        if let Some(headers) = input.headers_encodable() {
            for (name, value) in encode_headers(&to_shape(headers)?)? {
                request.insert_header(&name, &value)?;
            }
        }
        Ok(())
    }
}

/// Writes the JSON body and records it in the call's
/// [`BodyContext`](crate::context::BodyContext).
#[derive(Debug, Clone, Copy, Default)]
pub struct JsonBodyStage;

impl JsonBodyStage {
    /// Stage name.
    pub const NAME: &'static str = "JsonBody";
}

impl Stage for JsonBodyStage {
    fn name(&self) -> &str {
        Self::NAME
    }
}

impl<I: HttpRequestInput> RequestStage<I> for JsonBodyStage {
    fn apply(
        &self,
        input: &I,
        request: &mut HttpRequestBuilder,
        ctx: &mut InvocationContext,
    ) -> Result<(), StageError> {
        if let Some(body) = input.body_encodable() {
            let bytes = encode_body(body)?;
            ctx.body.record(bytes.len());
            request.set_body(bytes);
        }
        Ok(())
    }
}
