//! Access token exchange and freshness policy
//!
//! `request_token` performs the client-credentials POST against the access
//! control endpoint. `CachedToken` is what the cache keeps from a successful
//! response, stamped with the instant it was obtained.
//!
//! The token endpoint advertises `expires_in` as a string of seconds. It is
//! stored exactly as received and only interpreted at check time, through
//! `parse_expiry_or_treat_as_expired`.

use std::time::Duration;

use common::Secret;
use serde::{Deserialize, Deserializer};
use tokio::time::Instant;

use crate::credentials::TokenCredentials;
use crate::error::{Error, Result};

/// Response body from the token endpoint.
#[derive(Debug, Deserialize)]
pub struct TokenResponse {
    #[serde(default)]
    pub token_type: String,
    pub access_token: String,
    /// Seconds of validity as text. Some deployments send a bare number;
    /// either form is kept as text.
    #[serde(default, deserialize_with = "expires_in_as_text")]
    pub expires_in: String,
    #[serde(default)]
    pub scope: String,
}

fn expires_in_as_text<'de, D>(deserializer: D) -> std::result::Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    match serde_json::Value::deserialize(deserializer)? {
        serde_json::Value::String(s) => Ok(s),
        serde_json::Value::Number(n) => Ok(n.to_string()),
        serde_json::Value::Null => Ok(String::new()),
        other => Err(serde::de::Error::custom(format!(
            "expires_in must be a string or number, got {other}"
        ))),
    }
}

/// The token currently held by a cache.
#[derive(Debug, Clone)]
pub struct CachedToken {
    pub token_type: String,
    pub access_token: Secret<String>,
    pub expires_in: String,
    pub scope: String,
    pub obtained_at: Instant,
}

impl CachedToken {
    pub fn from_response(response: TokenResponse, obtained_at: Instant) -> Self {
        Self {
            token_type: response.token_type,
            access_token: Secret::new(response.access_token),
            expires_in: response.expires_in,
            scope: response.scope,
            obtained_at,
        }
    }

    /// Advertised lifetime under the expiry policy.
    pub fn lifetime(&self) -> Duration {
        parse_expiry_or_treat_as_expired(&self.expires_in)
    }

    /// Whether the token's lifetime has fully elapsed at `now`. No margin.
    pub fn is_stale_at(&self, now: Instant) -> bool {
        now.saturating_duration_since(self.obtained_at) >= self.lifetime()
    }
}

/// Interpret `expires_in` as whole seconds.
///
/// Anything that is not an integer yields zero, so a token with an
/// unverifiable lifetime is always refreshed before use. Negative values
/// clamp to zero.
pub fn parse_expiry_or_treat_as_expired(raw: &str) -> Duration {
    match raw.parse::<i64>() {
        Ok(secs) => Duration::from_secs(secs.max(0).unsigned_abs()),
        Err(_) => Duration::ZERO,
    }
}

/// Exchange client credentials for an access token.
///
/// POSTs `client_id`, `client_secret`, `scope` and `grant_type` form-encoded
/// to the configured access token URL.
pub async fn request_token(
    client: &reqwest::Client,
    credentials: &TokenCredentials,
) -> Result<TokenResponse> {
    let response = client
        .post(&credentials.access_token_url)
        .form(&[
            ("client_id", credentials.client_id.as_str()),
            ("client_secret", credentials.client_secret.expose().as_str()),
            ("scope", credentials.scope.as_str()),
            ("grant_type", credentials.grant_type.as_str()),
        ])
        .send()
        .await
        .map_err(|e| transport_error("token request failed", e))?;

    let status = response.status();
    if !status.is_success() {
        let body = response
            .text()
            .await
            .unwrap_or_else(|_| String::from("<no body>"));
        return Err(Error::Status {
            status: status.as_u16(),
            body,
        });
    }

    let body = response
        .text()
        .await
        .map_err(|e| transport_error("reading token response failed", e))?;

    serde_json::from_str::<TokenResponse>(&body).map_err(|e| Error::Decode(e.to_string()))
}

/// Timeouts anywhere in the exchange, headers or body, stay distinguishable.
fn transport_error(context: &str, err: reqwest::Error) -> Error {
    if err.is_timeout() {
        Error::Timeout(format!("{context}: {err}"))
    } else {
        Error::Http(format!("{context}: {err}"))
    }
}
