//! Host-facing state creation
//!
//! A host turns each parameter bag into a registered `TokenCache` here; the
//! callable `mstranslate(state, from, to, text)` is `Translator::translate`.

use std::sync::Arc;

use common::Params;
use ms_auth::TokenCache;
use tracing::info;

use crate::error::{Error, Result};
use crate::registry::StateRegistry;

/// Build a token cache from `params` and register it as `name`.
///
/// Fails with `Error::Config` on invalid parameters or when `name` is taken.
pub fn create_state(
    registry: &StateRegistry,
    name: &str,
    params: &Params,
    client: reqwest::Client,
) -> Result<Arc<TokenCache>> {
    let cache = TokenCache::from_params(params, client).map_err(|e| match e {
        ms_auth::Error::Config(msg) => Error::Config(format!("state '{name}': {msg}")),
        other => Error::Auth(other),
    })?;
    let cache = Arc::new(cache);
    if !registry.insert_if_absent(name, cache.clone()) {
        return Err(Error::Config(format!("state '{name}' already exists")));
    }
    info!(
        state = name,
        client_id = %cache.credentials().client_id,
        translator_url = %cache.translator_url(),
        "translation state created"
    );
    Ok(cache)
}
