//! Client configuration.
//!
//! Resolved once at startup and handed to [`HttpTransport::new`](crate::HttpTransport::new).

use crate::{ClientError, ClientResult};
use std::time::Duration;

/// Backend address used when none is configured.
pub const DEFAULT_BASE_URL: &str = "http://localhost:8000";

/// Per-request timeout used when none is configured.
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(30);

/// Connection settings for the OPAL backend.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ClientConfig {
    base_url: String,
    timeout: Duration,
}

impl ClientConfig {
    /// Create a new `ClientConfig`.
    ///
    /// A trailing `/` on `base_url` is dropped; request paths always start with one.
    ///
    /// # Errors
    ///
    /// Returns `ClientError::InvalidConfig` if the base URL is not an `http(s)://` URL or the
    /// timeout is zero.
    pub fn new(base_url: impl Into<String>, timeout: Duration) -> ClientResult<Self> {
        let base_url = base_url.into().trim().trim_end_matches('/').to_string();

        let host = base_url
            .strip_prefix("http://")
            .or_else(|| base_url.strip_prefix("https://"));
        if host.map_or(true, str::is_empty) {
            return Err(ClientError::InvalidConfig(format!(
                "base URL must start with http:// or https:// and name a host: {base_url:?}"
            )));
        }

        if timeout.is_zero() {
            return Err(ClientError::InvalidConfig(
                "request timeout cannot be zero".into(),
            ));
        }

        Ok(Self { base_url, timeout })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    pub fn timeout(&self) -> Duration {
        self.timeout
    }
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_BASE_URL.to_string(),
            timeout: DEFAULT_TIMEOUT,
        }
    }
}

/// Parse the request timeout, in whole seconds, from an optional string value.
///
/// If `value` is `None` or empty/whitespace, returns [`DEFAULT_TIMEOUT`].
pub fn timeout_from_env_value(value: Option<String>) -> ClientResult<Duration> {
    let value = value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty());

    match value {
        None => Ok(DEFAULT_TIMEOUT),
        Some(v) => v.parse::<u64>().map(Duration::from_secs).map_err(|_| {
            ClientError::InvalidConfig(format!("timeout must be a whole number of seconds: {v}"))
        }),
    }
}
