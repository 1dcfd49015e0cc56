//! reqwest-backed transport
//!
//! Joins the descriptor path onto the configured base URL, forwards query,
//! headers, and JSON body, and reads the full response body. Status codes are
//! returned verbatim; only failures with no response become `TransportError`.

use std::time::Duration;

use tracing::{debug, trace};

use crate::error::{Error, Result, TransportError};
use crate::request::{PreparedRequest, RawResponse};
use crate::{SendFuture, Transport};

/// HTTP transport rooted at the backend API base URL (e.g. `http://host/api`).
#[derive(Debug, Clone)]
pub struct HttpTransport {
    client: reqwest::Client,
    base_url: String,
}

impl HttpTransport {
    /// Build a transport with a per-attempt timeout.
    ///
    /// The client-level overall deadline is enforced above this layer; this
    /// timeout only bounds a single round trip.
    pub fn new(base_url: &str, timeout: Duration) -> Result<Self> {
        if !base_url.starts_with("http://") && !base_url.starts_with("https://") {
            return Err(Error::InvalidUrl(format!(
                "base URL must start with http:// or https://, got: {base_url}"
            )));
        }
        let client = reqwest::Client::builder()
            .user_agent(concat!("mail-client/", env!("CARGO_PKG_VERSION")))
            .timeout(timeout)
            .build()
            .map_err(|e| Error::Client(e.to_string()))?;
        Ok(Self::with_client(client, base_url))
    }

    /// Wrap an existing reqwest client (shared connection pool).
    pub fn with_client(client: reqwest::Client, base_url: &str) -> Self {
        Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
        }
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Underlying reqwest client, for callers that share its connection pool.
    pub fn client(&self) -> &reqwest::Client {
        &self.client
    }

    /// Absolute URL for a descriptor path.
    pub fn url_for(&self, path: &str) -> String {
        if path.starts_with('/') {
            format!("{}{}", self.base_url, path)
        } else {
            format!("{}/{}", self.base_url, path)
        }
    }

    async fn send_inner(
        &self,
        request: PreparedRequest,
    ) -> std::result::Result<RawResponse, TransportError> {
        let url = self.url_for(&request.path);
        debug!(method = %request.method, %url, "sending request");

        let mut builder = self
            .client
            .request(request.method, &url)
            .headers(request.headers);
        if !request.query.is_empty() {
            builder = builder.query(&request.query);
        }
        if let Some(body) = &request.body {
            builder = builder.json(body);
        }

        let response = builder.send().await?;
        let status = response.status().as_u16();
        let headers = response.headers().clone();
        let body = response.bytes().await?;
        trace!(status, bytes = body.len(), "response received");

        Ok(RawResponse {
            status,
            headers,
            body,
        })
    }
}

impl Transport for HttpTransport {
    fn id(&self) -> &str {
        "http"
    }

    fn send(&self, request: PreparedRequest) -> SendFuture<'_> {
        Box::pin(self.send_inner(request))
    }
}
