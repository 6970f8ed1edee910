//! Microsoft Translator calls for query-engine hosts
//!
//! The host registers named token caches in a `StateRegistry` and evaluates
//! `mstranslate(state, from, to, text)` through `Translator::translate`. Each
//! call resolves its cache by name, takes a bearer token from it (refreshing
//! when stale), issues the GET, and unwraps the bare XML reply.
//!
//! Call flow:
//! 1. Host creates caches with `plugin::create_state()` from its parameter bags
//! 2. `Translator::translate()` resolves the name through its `TokenSource`
//! 3. `TokenCache::bearer_token()` supplies a fresh token
//! 4. `response::decode_translation()` extracts the `<string>` text

pub mod error;
pub mod plugin;
pub mod registry;
pub mod response;
pub mod translate;

pub use error::{Error, Result};
pub use registry::{StateRegistry, TokenSource};
pub use response::decode_translation;
pub use translate::{Translator, encode_query};
