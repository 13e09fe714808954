//! HTTP transport.
//!
//! [`Transport`] is the seam between the loaders and the network: one JSON request in, one JSON
//! body out. [`HttpTransport`] implements it with `reqwest`.

use crate::config::ClientConfig;
use crate::{ClientError, ClientResult};
use async_trait::async_trait;
use reqwest::header::ACCEPT;
use reqwest::{Method, StatusCode};
use serde_json::Value;

/// Sends JSON requests to the OPAL backend.
#[async_trait]
pub trait Transport: Send + Sync {
    /// Sends a request to `path` (relative to the backend root, starting with `/`).
    ///
    /// Returns the decoded response body, `null` for an empty body.
    ///
    /// # Errors
    ///
    /// Returns `ClientError::Status` for non-success responses, `ClientError::Request` if no
    /// response arrived and `ClientError::Decode` if the body is not JSON.
    async fn send(&self, method: Method, path: &str, body: Option<&Value>) -> ClientResult<Value>;
}

/// `reqwest`-backed transport.
#[derive(Clone, Debug)]
pub struct HttpTransport {
    base_url: String,
    client: reqwest::Client,
}

impl HttpTransport {
    pub fn new(cfg: &ClientConfig) -> ClientResult<Self> {
        let client = reqwest::Client::builder()
            .timeout(cfg.timeout())
            .build()
            .map_err(ClientError::ClientBuild)?;

        Ok(Self {
            base_url: cfg.base_url().to_string(),
            client,
        })
    }

    pub fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }
}

#[async_trait]
impl Transport for HttpTransport {
    async fn send(&self, method: Method, path: &str, body: Option<&Value>) -> ClientResult<Value> {
        let url = self.url(path);
        tracing::debug!("{} {}", method, url);

        let mut request = self
            .client
            .request(method.clone(), &url)
            .header(ACCEPT, "application/json");
        if let Some(body) = body {
            request = request.json(body);
        }

        let request_error = |source| ClientError::Request {
            method: method.clone(),
            path: path.to_owned(),
            source,
        };
        let response = request.send().await.map_err(request_error)?;
        let status = response.status();
        let text = response.text().await.map_err(request_error)?;

        if !status.is_success() {
            tracing::debug!("{} {} -> {}", method, url, status);
            return Err(ClientError::Status {
                method,
                path: path.to_owned(),
                status: status.as_u16(),
                message: error_message(&text, status),
            });
        }

        decode_body(path, &text)
    }
}

/// Decodes a response body; an empty body is `null`.
pub(crate) fn decode_body(path: &str, text: &str) -> ClientResult<Value> {
    if text.trim().is_empty() {
        return Ok(Value::Null);
    }
    serde_json::from_str(text).map_err(|source| ClientError::Decode {
        path: path.to_owned(),
        source,
    })
}

/// Human-readable message for a failed request.
///
/// The backend answers errors with `{"error": "..."}` or a bare JSON string; anything else is
/// reported verbatim, and an empty body falls back to the status reason.
fn error_message(body: &str, status: StatusCode) -> String {
    let from_json = match serde_json::from_str::<Value>(body) {
        Ok(Value::String(message)) => Some(message),
        Ok(value) => value
            .get("error")
            .and_then(Value::as_str)
            .map(str::to_owned),
        Err(_) => None,
    };

    from_json
        .or_else(|| {
            let body = body.trim();
            (!body.is_empty()).then(|| body.to_owned())
        })
        .unwrap_or_else(|| {
            status
                .canonical_reason()
                .unwrap_or("request failed")
                .to_owned()
        })
}
