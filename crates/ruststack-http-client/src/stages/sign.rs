//! The SigV4 signing stage. Runs last in the build phase.

use chrono::{DateTime, Utc};
use ruststack_auth::canonical::{UriEncoding, select_signed_headers};
use ruststack_auth::sigv4::format_amz_date;
use ruststack_auth::{SigningParams, sign_request};
use tracing::debug;

use crate::context::InvocationContext;
use crate::error::StageError;
use crate::request::HttpRequestBuilder;
use crate::stage::{RequestStage, Stage};

/// Signs the request with the call's credentials.
///
/// Adds `host`, `x-amz-date`, `x-amz-security-token` (for temporary
/// credentials) and `x-amz-target` (when configured), then `authorization`.
#[derive(Debug, Clone)]
pub struct SigV4SigningStage {
    region: String,
    service: String,
    target: Option<String>,
    sign_all_headers: bool,
    uri_encoding: UriEncoding,
    clock: fn() -> DateTime<Utc>,
}

impl SigV4SigningStage {
    /// Stage name.
    pub const NAME: &'static str = "SigV4";

    /// Create the stage for a region and service.
    ///
    /// The path is double-encoded in the canonical request unless the
    /// service is `s3`.
    pub fn new(region: impl Into<String>, service: impl Into<String>) -> Self {
        let service = service.into();
        Self {
            region: region.into(),
            uri_encoding: UriEncoding::for_service(&service),
            service,
            target: None,
            sign_all_headers: false,
            clock: Utc::now,
        }
    }

    /// Send and sign `x-amz-target: <target>`.
    #[must_use]
    pub fn with_target(mut self, target: Option<String>) -> Self {
        self.target = target;
        self
    }

    /// Sign every header instead of the minimal set.
    #[must_use]
    pub fn with_sign_all_headers(mut self, sign_all_headers: bool) -> Self {
        self.sign_all_headers = sign_all_headers;
        self
    }

    /// Override how the path is encoded into the canonical request.
    #[must_use]
    pub fn with_uri_encoding(mut self, uri_encoding: UriEncoding) -> Self {
        self.uri_encoding = uri_encoding;
        self
    }

    /// Replace the clock used for the signing timestamp.
    #[must_use]
    pub fn with_clock(mut self, clock: fn() -> DateTime<Utc>) -> Self {
        self.clock = clock;
        self
    }
}

impl Stage for SigV4SigningStage {
    fn name(&self) -> &str {
        Self::NAME
    }
}

impl<I> RequestStage<I> for SigV4SigningStage {
    fn apply(
        &self,
        _input: &I,
        request: &mut HttpRequestBuilder,
        ctx: &mut InvocationContext,
    ) -> Result<(), StageError> {
        let credentials = ctx.credentials().credentials()?;
        let timestamp = (self.clock)();

        let authority = request.authority()?;
        request.insert_header("host", &authority)?;
        request.insert_header("x-amz-date", &format_amz_date(timestamp))?;
        if let Some(token) = &credentials.session_token {
            request.insert_header("x-amz-security-token", token)?;
        }
        if let Some(target) = &self.target {
            request.insert_header("x-amz-target", target)?;
        }

        let signed_headers = select_signed_headers(request.headers(), self.sign_all_headers);
        let signed_refs: Vec<&str> = signed_headers.iter().map(String::as_str).collect();
        let uri = request.uri()?;

        let output = sign_request(
            request.method(),
            &uri,
            request.headers(),
            &signed_refs,
            request.body(),
            &SigningParams {
                credentials: &credentials,
                region: &self.region,
                service: &self.service,
                timestamp,
                uri_encoding: self.uri_encoding,
            },
        )?;

        debug!(
            operation = ctx.operation(),
            attempt = ctx.attempt(),
            signed_headers = %output.signed_headers,
            "signed request"
        );
        request.insert_header("authorization", &output.authorization)?;
        Ok(())
    }
}
