//! Token cache for one translation service
//!
//! A `TokenCache` owns its credentials and at most one live `CachedToken`.
//! Refreshes are serialized by a tokio Mutex held across the token POST, so
//! concurrent translations against a stale cache share a single refresh
//! instead of each issuing their own. The token itself sits behind a separate
//! `RwLock` that is only held to copy or swap the value, so readers such as
//! health checks never wait on the token endpoint.
//!
//! A failed refresh leaves the previous token in place. Callers see the error;
//! the old token is only replaced on the next successful refresh.

use std::sync::{RwLock, RwLockReadGuard, RwLockWriteGuard};

use common::{Params, Secret};
use tokio::sync::Mutex;
use tokio::time::Instant;
use tracing::{debug, info, warn};

use crate::credentials::TokenCredentials;
use crate::error::{Error, Result};
use crate::token::{self, CachedToken};

pub struct TokenCache {
    credentials: TokenCredentials,
    client: reqwest::Client,
    refresh_lock: Mutex<()>,
    token: RwLock<Option<CachedToken>>,
}

impl TokenCache {
    /// Create a cache with no token. The first use always refreshes.
    ///
    /// `client` should carry a request timeout; the cache applies none of its own.
    pub fn new(credentials: TokenCredentials, client: reqwest::Client) -> Self {
        debug!(
            client_id = %credentials.client_id,
            access_token_url = %credentials.access_token_url,
            "token cache created"
        );
        Self {
            credentials,
            client,
            refresh_lock: Mutex::new(()),
            token: RwLock::new(None),
        }
    }

    /// Build a cache from the host's parameter bag.
    pub fn from_params(params: &Params, client: reqwest::Client) -> Result<Self> {
        let credentials = TokenCredentials::from_params(params)?;
        Ok(Self::new(credentials, client))
    }

    pub fn credentials(&self) -> &TokenCredentials {
        &self.credentials
    }

    pub fn translator_url(&self) -> &str {
        &self.credentials.translator_url
    }

    /// Clone of the current token, if one has been obtained.
    ///
    /// Never waits for an in-flight refresh.
    pub fn snapshot(&self) -> Option<CachedToken> {
        self.read().clone()
    }

    /// Whether the next use must refresh: no token yet, or its lifetime elapsed.
    pub fn needs_refresh(&self) -> bool {
        is_stale(self.read().as_ref(), Instant::now())
    }

    /// Whether a refresh is currently in flight.
    pub fn is_refreshing(&self) -> bool {
        self.refresh_lock.try_lock().is_err()
    }

    /// Fetch a new token unconditionally.
    pub async fn refresh(&self) -> Result<()> {
        let _guard = self.refresh_lock.lock().await;
        self.refresh_serialized().await
    }

    /// Current access token, refreshing first if it is missing or stale.
    pub async fn bearer_token(&self) -> Result<Secret<String>> {
        if let Some(token) = self.fresh_token() {
            return Ok(token);
        }

        let _guard = self.refresh_lock.lock().await;
        // Another caller may have refreshed while we waited
        if let Some(token) = self.fresh_token() {
            return Ok(token);
        }
        self.refresh_serialized().await?;
        match self.read().as_ref() {
            Some(current) => Ok(current.access_token.clone()),
            None => Err(Error::Decode("token endpoint returned no token".into())),
        }
    }

    fn fresh_token(&self) -> Option<Secret<String>> {
        let token = self.read();
        match token.as_ref() {
            Some(t) if !t.is_stale_at(Instant::now()) => Some(t.access_token.clone()),
            _ => None,
        }
    }

    /// Callers must hold `refresh_lock`.
    async fn refresh_serialized(&self) -> Result<()> {
        debug!(client_id = %self.credentials.client_id, "requesting access token");
        match token::request_token(&self.client, &self.credentials).await {
            Ok(response) => {
                let fresh = CachedToken::from_response(response, Instant::now());
                info!(
                    client_id = %self.credentials.client_id,
                    token_type = %fresh.token_type,
                    expires_in = %fresh.expires_in,
                    "access token refreshed"
                );
                metrics::counter!("mstranslate_token_refreshes_total", "outcome" => "success")
                    .increment(1);
                *self.write() = Some(fresh);
                Ok(())
            }
            Err(e) => {
                warn!(
                    client_id = %self.credentials.client_id,
                    error = %e,
                    kept_previous = self.read().is_some(),
                    "access token refresh failed"
                );
                metrics::counter!("mstranslate_token_refreshes_total", "outcome" => "error")
                    .increment(1);
                Err(e)
            }
        }
    }

    fn read(&self) -> RwLockReadGuard<'_, Option<CachedToken>> {
        self.token.read().unwrap_or_else(|e| e.into_inner())
    }

    fn write(&self) -> RwLockWriteGuard<'_, Option<CachedToken>> {
        self.token.write().unwrap_or_else(|e| e.into_inner())
    }

    #[cfg(test)]
    pub(crate) fn install(&self, token: CachedToken) {
        *self.write() = Some(token);
    }
}

fn is_stale(token: Option<&CachedToken>, now: Instant) -> bool {
    token.is_none_or(|t| t.is_stale_at(now))
}

impl std::fmt::Debug for TokenCache {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TokenCache")
            .field("credentials", &self.credentials)
            .finish_non_exhaustive()
    }
}
