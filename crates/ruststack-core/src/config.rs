//! Client configuration.
//!
//! All configuration is driven by environment variables, falling back to the
//! public AWS endpoint for the configured region.

use std::time::Duration;

use crate::error::{RustStackError, RustStackResult};
use crate::types::{AwsRegion, EndpointProtocol};

/// Configuration shared by RustStack service clients.
#[derive(Debug, Clone, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ClientConfig {
    /// AWS region requests are signed for.
    pub region: AwsRegion,
    /// Endpoint host name. `None` means the regional AWS endpoint.
    pub endpoint_host: Option<String>,
    /// Endpoint port. `None` means the protocol's default port.
    pub endpoint_port: Option<u16>,
    /// Endpoint protocol.
    pub protocol: EndpointProtocol,
    /// Total number of attempts per call, including the first.
    pub max_attempts: u32,
    /// Delay before the first retry, in milliseconds.
    pub base_delay_ms: u64,
    /// Upper bound for a single backoff delay, in milliseconds.
    pub max_delay_ms: u64,
    /// Log level filter used by binaries.
    pub log_level: String,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            region: AwsRegion::default(),
            endpoint_host: None,
            endpoint_port: None,
            protocol: EndpointProtocol::Https,
            max_attempts: 5,
            base_delay_ms: 100,
            max_delay_ms: 20_000,
            log_level: "info".to_owned(),
        }
    }
}

impl ClientConfig {
    /// Load configuration from environment variables.
    ///
    /// | Variable | Default |
    /// |----------|---------|
    /// | `AWS_REGION` / `DEFAULT_REGION` | `us-east-1` |
    /// | `CLOUDFORMATION_ENDPOINT` | regional AWS host |
    /// | `CLOUDFORMATION_PORT` | protocol default |
    /// | `CLOUDFORMATION_PROTOCOL` | `https` |
    /// | `RETRY_MAX_ATTEMPTS` | `5` |
    /// | `RETRY_BASE_DELAY_MS` | `100` |
    /// | `RETRY_MAX_DELAY_MS` | `20000` |
    /// | `LOG_LEVEL` | `info` |
    ///
    /// # Errors
    ///
    /// Returns [`RustStackError::Config`] when a numeric variable does not
    /// parse, or [`RustStackError::InvalidProtocol`] for an unknown scheme.
    pub fn from_env() -> RustStackResult<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Load configuration through an arbitrary variable lookup.
    ///
    /// # Errors
    ///
    /// See [`ClientConfig::from_env`].
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> RustStackResult<Self> {
        let mut config = Self::default();

        if let Some(v) = lookup("AWS_REGION").or_else(|| lookup("DEFAULT_REGION")) {
            config.region = AwsRegion::new(v);
        }
        if let Some(v) = lookup("CLOUDFORMATION_ENDPOINT") {
            config.endpoint_host = Some(v);
        }
        if let Some(v) = lookup("CLOUDFORMATION_PORT") {
            config.endpoint_port = Some(parse_number("CLOUDFORMATION_PORT", &v)?);
        }
        if let Some(v) = lookup("CLOUDFORMATION_PROTOCOL") {
            config.protocol = v.parse()?;
        }
        if let Some(v) = lookup("RETRY_MAX_ATTEMPTS") {
            config.max_attempts = parse_number("RETRY_MAX_ATTEMPTS", &v)?;
        }
        if let Some(v) = lookup("RETRY_BASE_DELAY_MS") {
            config.base_delay_ms = parse_number("RETRY_BASE_DELAY_MS", &v)?;
        }
        if let Some(v) = lookup("RETRY_MAX_DELAY_MS") {
            config.max_delay_ms = parse_number("RETRY_MAX_DELAY_MS", &v)?;
        }
        if let Some(v) = lookup("LOG_LEVEL") {
            config.log_level = v;
        }

        if config.max_attempts == 0 {
            return Err(RustStackError::Config(
                "RETRY_MAX_ATTEMPTS must be at least 1".to_owned(),
            ));
        }

        tracing::debug!(
            region = %config.region,
            protocol = %config.protocol,
            "loaded client configuration"
        );
        Ok(config)
    }

    /// Host name requests are sent to for the given service prefix.
    #[must_use]
    pub fn host_for(&self, service: &str) -> String {
        self.endpoint_host
            .clone()
            .unwrap_or_else(|| format!("{service}.{}.amazonaws.com", self.region))
    }

    /// Port requests are sent to.
    #[must_use]
    pub fn port(&self) -> u16 {
        self.endpoint_port
            .unwrap_or_else(|| self.protocol.default_port())
    }

    /// Delay before the first retry.
    #[must_use]
    pub fn base_delay(&self) -> Duration {
        Duration::from_millis(self.base_delay_ms)
    }

    /// Upper bound for a single backoff delay.
    #[must_use]
    pub fn max_delay(&self) -> Duration {
        Duration::from_millis(self.max_delay_ms)
    }
}

fn parse_number<T: std::str::FromStr>(key: &str, value: &str) -> RustStackResult<T> {
    value
        .trim()
        .parse()
        .map_err(|_| RustStackError::Config(format!("{key} must be a number, got {value:?}")))
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use super::*;

    fn lookup_from(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| ((*k).to_owned(), (*v).to_owned()))
            .collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn test_should_create_default_config() {
        let config = ClientConfig::default();
        assert_eq!(config.region.as_str(), "us-east-1");
        assert_eq!(config.protocol, EndpointProtocol::Https);
        assert_eq!(config.max_attempts, 5);
        assert_eq!(config.port(), 443);
    }

    #[test]
    fn test_should_derive_regional_host() {
        let config =
            ClientConfig::from_lookup(lookup_from(&[("AWS_REGION", "eu-west-1")])).unwrap();
        assert_eq!(
            config.host_for("cloudformation"),
            "cloudformation.eu-west-1.amazonaws.com"
        );
    }

    #[test]
    fn test_should_override_endpoint_from_environment() {
        let config = ClientConfig::from_lookup(lookup_from(&[
            ("CLOUDFORMATION_ENDPOINT", "localhost"),
            ("CLOUDFORMATION_PORT", "4566"),
            ("CLOUDFORMATION_PROTOCOL", "http"),
            ("RETRY_MAX_ATTEMPTS", "3"),
        ]))
        .unwrap();
        assert_eq!(config.host_for("cloudformation"), "localhost");
        assert_eq!(config.port(), 4566);
        assert_eq!(config.protocol, EndpointProtocol::Http);
        assert_eq!(config.max_attempts, 3);
    }

    #[test]
    fn test_should_reject_non_numeric_port() {
        let result = ClientConfig::from_lookup(lookup_from(&[("CLOUDFORMATION_PORT", "abc")]));
        assert!(matches!(result, Err(RustStackError::Config(_))));
    }

    #[test]
    fn test_should_reject_zero_attempts() {
        let result = ClientConfig::from_lookup(lookup_from(&[("RETRY_MAX_ATTEMPTS", "0")]));
        assert!(matches!(result, Err(RustStackError::Config(_))));
    }

    #[test]
    fn test_should_serialize_config_in_camel_case() {
        let json = serde_json::to_value(ClientConfig::default()).unwrap();
        assert_eq!(json["maxAttempts"], 5);
        assert_eq!(json["protocol"], "https");
    }
}
