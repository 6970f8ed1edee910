//! OAuth client-credentials token cache for Microsoft Translator
//!
//! Holds the client credentials for one translation service, caches the most
//! recent access token, and refreshes it when its advertised lifetime has
//! elapsed. The cache knows nothing about translation itself beyond carrying
//! the translator endpoint URL for its callers.
//!
//! Token flow:
//! 1. Host builds a `TokenCache` from a parameter bag via `TokenCache::from_params()`
//! 2. Caller asks `TokenCache::bearer_token()` before each translation request
//! 3. A missing or stale token triggers `token::request_token()` under the cache lock
//! 4. The decoded response replaces the cached token and resets its timestamp

pub mod cache;
pub mod constants;
pub mod credentials;
pub mod error;
pub mod token;

pub use cache::TokenCache;
pub use constants::*;
pub use credentials::TokenCredentials;
pub use error::{Error, Result};
pub use token::{CachedToken, TokenResponse, parse_expiry_or_treat_as_expired, request_token};
