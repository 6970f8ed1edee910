//! Client credentials and endpoints for one translation service
//!
//! Built once from the host's parameter bag and never mutated afterwards.
//! Only `client_id` and `client_secret` are required; every other key falls
//! back to the Microsoft Translator defaults in `constants`.

use common::{Params, Secret};

use crate::constants::{
    DEFAULT_ACCESS_TOKEN_URL, DEFAULT_GRANT_TYPE, DEFAULT_SCOPE, DEFAULT_TRANSLATOR_URL,
};
use crate::error::Result;

const CLIENT_ID: &str = "client_id";
const CLIENT_SECRET: &str = "client_secret";
const SCOPE: &str = "scope";
const GRANT_TYPE: &str = "grant_type";
const ACCESS_TOKEN_URL: &str = "access_token_url";
const TRANSLATOR_URL: &str = "translator_url";

/// OAuth client credentials plus the two endpoints they are used against.
#[derive(Debug, Clone)]
pub struct TokenCredentials {
    pub client_id: String,
    pub client_secret: Secret<String>,
    pub scope: String,
    pub grant_type: String,
    pub access_token_url: String,
    pub translator_url: String,
}

impl TokenCredentials {
    /// Credentials with every optional field at its default.
    pub fn new(client_id: impl Into<String>, client_secret: impl Into<Secret<String>>) -> Self {
        Self {
            client_id: client_id.into(),
            client_secret: client_secret.into(),
            scope: DEFAULT_SCOPE.to_owned(),
            grant_type: DEFAULT_GRANT_TYPE.to_owned(),
            access_token_url: DEFAULT_ACCESS_TOKEN_URL.to_owned(),
            translator_url: DEFAULT_TRANSLATOR_URL.to_owned(),
        }
    }

    /// Read credentials from a parameter bag.
    ///
    /// Fails with `Error::Config` when a required key is missing or when any
    /// recognized key holds something other than text.
    pub fn from_params(params: &Params) -> Result<Self> {
        let client_id = params.require_str(CLIENT_ID)?;
        let client_secret = params.require_str(CLIENT_SECRET)?;
        let mut credentials = Self::new(client_id, client_secret);

        if let Some(scope) = params.optional_str(SCOPE)? {
            credentials.scope = scope.to_owned();
        }
        if let Some(grant_type) = params.optional_str(GRANT_TYPE)? {
            credentials.grant_type = grant_type.to_owned();
        }
        if let Some(url) = params.optional_str(ACCESS_TOKEN_URL)? {
            credentials.access_token_url = url.to_owned();
        }
        if let Some(url) = params.optional_str(TRANSLATOR_URL)? {
            credentials.translator_url = url.to_owned();
        }
        Ok(credentials)
    }

    pub fn with_scope(mut self, scope: impl Into<String>) -> Self {
        self.scope = scope.into();
        self
    }

    pub fn with_grant_type(mut self, grant_type: impl Into<String>) -> Self {
        self.grant_type = grant_type.into();
        self
    }

    pub fn with_access_token_url(mut self, url: impl Into<String>) -> Self {
        self.access_token_url = url.into();
        self
    }

    pub fn with_translator_url(mut self, url: impl Into<String>) -> Self {
        self.translator_url = url.into();
        self
    }
}
