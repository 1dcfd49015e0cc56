//! Token refresh endpoint
//!
//! The backend rotates credentials through a single call: `POST /auth/refresh`
//! with the refresh token as the bearer credential and no body. The response
//! carries a new access token and, usually, a new refresh token.

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::constants::REFRESH_PATH;
use crate::error::{Error, Result};

/// Response from the refresh endpoint.
///
/// The backend answers with the same shape as login (`token`,
/// `refreshToken`, profile fields); only the credential fields are kept.
#[derive(Debug, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TokenResponse {
    #[serde(alias = "token")]
    pub access_token: String,
    /// Absent when the backend keeps the current refresh token
    #[serde(default)]
    pub refresh_token: Option<String>,
    #[serde(default)]
    pub expires_in: Option<u64>,
}

/// Calls the refresh endpoint on the configured backend.
#[derive(Debug, Clone)]
pub struct RefreshClient {
    client: reqwest::Client,
    base_url: String,
}

impl RefreshClient {
    pub fn new(client: reqwest::Client, base_url: &str) -> Self {
        Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
        }
    }

    pub fn endpoint(&self) -> String {
        format!("{}{}", self.base_url, REFRESH_PATH)
    }

    /// Exchange a refresh token for a new token pair.
    ///
    /// 401/403 from the endpoint means the refresh token itself is no longer
    /// accepted and is reported as `InvalidCredentials`.
    pub async fn refresh(&self, refresh_token: &str) -> Result<TokenResponse> {
        let response = self
            .client
            .post(self.endpoint())
            .bearer_auth(refresh_token)
            .send()
            .await
            .map_err(|e| Error::Http(format!("token refresh request failed: {e}")))?;

        let status = response.status();
        if !status.is_success() {
            let body = response
                .text()
                .await
                .unwrap_or_else(|_| String::from("<no body>"));

            if status.as_u16() == 401 || status.as_u16() == 403 {
                return Err(Error::InvalidCredentials(format!(
                    "refresh token rejected ({status}): {body}"
                )));
            }

            return Err(Error::Refresh(format!(
                "token refresh returned {status}: {body}"
            )));
        }

        let tokens = response
            .json::<TokenResponse>()
            .await
            .map_err(|e| Error::Parse(format!("invalid refresh response: {e}")))?;
        debug!(
            rotated_refresh = tokens.refresh_token.is_some(),
            "refresh endpoint issued new access token"
        );
        Ok(tokens)
    }
}
