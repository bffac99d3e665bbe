//! Transport seam between the dispatcher and the spaces HTTP API.
//!
//! The dispatcher only sequences requests; [`Transport`] performs them.
//! [`HttpTransport`] is the production implementation over [`reqwest`].
//! Retries, backoff and auth all live on this side of the seam.

use async_trait::async_trait;
use reqwest::header::CONTENT_TYPE;

use crate::config::HttpTransportConfig;
use crate::request::Method;

/// Errors surfaced by a [`Transport`].
#[derive(Debug, thiserror::Error)]
pub enum TransportError {
    /// The HTTP request itself failed (network, DNS, TLS, timeout).
    #[error("HTTP request failed: {0}")]
    Request(#[from] reqwest::Error),

    /// The service returned a non-2xx status code.
    #[error("Spaces API error ({status}): {body}")]
    Status {
        /// HTTP status code.
        status: u16,
        /// Raw response body for debugging.
        body: String,
    },
}

/// Performs a single JSON request against the spaces API.
#[async_trait]
pub trait Transport: Send + Sync {
    /// Send `body` (already JSON-encoded) to `url` and return the raw
    /// response body.
    async fn create_or_update(
        &self,
        method: Method,
        url: &str,
        body: Vec<u8>,
    ) -> Result<Vec<u8>, TransportError>;

    /// Whether the repository is linked to the service.
    fn is_linked(&self) -> bool;
}

// ---------------------------------------------------------------------------
// HttpTransport
// ---------------------------------------------------------------------------

/// [`Transport`] backed by a shared [`reqwest::Client`].
pub struct HttpTransport {
    client: reqwest::Client,
    config: HttpTransportConfig,
}

impl HttpTransport {
    pub fn new(config: HttpTransportConfig) -> Result<Self, TransportError> {
        let client = reqwest::Client::builder()
            .timeout(config.request_timeout)
            .build()?;
        Ok(Self { client, config })
    }

    /// Reuse an existing [`reqwest::Client`] (connection pooling across
    /// transports). The config's timeout is ignored in that case.
    pub fn with_client(client: reqwest::Client, config: HttpTransportConfig) -> Self {
        Self { client, config }
    }

    fn endpoint(&self, url: &str) -> String {
        format!("{}{}", self.config.api_url.trim_end_matches('/'), url)
    }

    // ---- private helpers ----

    /// Return the body of a 2xx response, or a [`TransportError::Status`]
    /// carrying the status and body text.
    async fn read_body(response: reqwest::Response) -> Result<Vec<u8>, TransportError> {
        let status = response.status();
        if !status.is_success() {
            let body = response
                .text()
                .await
                .unwrap_or_else(|_| "<unreadable body>".to_string());
            return Err(TransportError::Status {
                status: status.as_u16(),
                body,
            });
        }
        Ok(response.bytes().await?.to_vec())
    }
}

#[async_trait]
impl Transport for HttpTransport {
    async fn create_or_update(
        &self,
        method: Method,
        url: &str,
        body: Vec<u8>,
    ) -> Result<Vec<u8>, TransportError> {
        let endpoint = self.endpoint(url);
        let mut request = match method {
            Method::Post => self.client.post(&endpoint),
            Method::Patch => self.client.patch(&endpoint),
        };

        if let Some(token) = &self.config.token {
            request = request.bearer_auth(token);
        }
        if let Some(team_id) = &self.config.team_id {
            request = request.query(&[("teamId", team_id)]);
        }

        tracing::debug!(%method, url = %endpoint, "Sending spaces request");

        let response = request
            .header(CONTENT_TYPE, "application/json")
            .body(body)
            .send()
            .await?;

        Self::read_body(response).await
    }

    fn is_linked(&self) -> bool {
        self.config.token.is_some() && self.config.team_id.is_some()
    }
}
