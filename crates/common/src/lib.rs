//! Shared types for the translation adapter crates
//!
//! `Params` is the untyped configuration bag a host hands to state creators;
//! `Secret` keeps client secrets and bearer tokens out of logs.

mod error;
pub mod params;
mod secret;

pub use error::{Error, Result};
pub use params::{Params, Value};
pub use secret::Secret;
