//! Named shared state and the token lookup seam
//!
//! Hosts keep every user-defined state in one registry keyed by name, not only
//! token caches. `Translator` never touches the registry directly; it asks a
//! `TokenSource`, which lets tests substitute a fixed cache.

use std::any::Any;
use std::collections::HashMap;
use std::sync::{Arc, RwLock};

use ms_auth::TokenCache;
use tracing::debug;

use crate::error::{Error, Result};

/// A registry entry. Entries are shared with every caller that resolves them.
pub type SharedState = Arc<dyn Any + Send + Sync>;

/// Resolves a state name to the token cache the translation should use.
pub trait TokenSource: Send + Sync {
    /// `NotFound` when nothing is registered under `name`, `Type` when the
    /// entry exists but is not a `TokenCache`.
    fn resolve(&self, name: &str) -> Result<Arc<TokenCache>>;
}

/// Process-wide map of named shared states.
#[derive(Default)]
pub struct StateRegistry {
    states: RwLock<HashMap<String, SharedState>>,
}

impl StateRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register `state`, replacing and returning any entry with the same name.
    pub fn insert<T: Any + Send + Sync>(
        &self,
        name: impl Into<String>,
        state: Arc<T>,
    ) -> Option<SharedState> {
        let name = name.into();
        debug!(state = %name, "registering state");
        self.write().insert(name, state)
    }

    /// Register `state` only if the name is free. Returns whether it was added.
    pub fn insert_if_absent<T: Any + Send + Sync>(
        &self,
        name: impl Into<String>,
        state: Arc<T>,
    ) -> bool {
        let mut states = self.write();
        let name = name.into();
        if states.contains_key(&name) {
            return false;
        }
        debug!(state = %name, "registering state");
        states.insert(name, state);
        true
    }

    pub fn get(&self, name: &str) -> Option<SharedState> {
        self.read().get(name).cloned()
    }

    pub fn remove(&self, name: &str) -> Option<SharedState> {
        let removed = self.write().remove(name);
        if removed.is_some() {
            debug!(state = name, "removed state");
        }
        removed
    }

    /// Registered names, sorted.
    pub fn names(&self) -> Vec<String> {
        let mut names: Vec<String> = self.read().keys().cloned().collect();
        names.sort();
        names
    }

    pub fn len(&self) -> usize {
        self.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn read(&self) -> std::sync::RwLockReadGuard<'_, HashMap<String, SharedState>> {
        self.states.read().unwrap_or_else(|e| e.into_inner())
    }

    fn write(&self) -> std::sync::RwLockWriteGuard<'_, HashMap<String, SharedState>> {
        self.states.write().unwrap_or_else(|e| e.into_inner())
    }
}

impl TokenSource for StateRegistry {
    fn resolve(&self, name: &str) -> Result<Arc<TokenCache>> {
        let state = self
            .get(name)
            .ok_or_else(|| Error::NotFound(name.to_owned()))?;
        state
            .downcast::<TokenCache>()
            .map_err(|_| Error::Type(name.to_owned()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ms_auth::TokenCredentials;

    fn cache() -> Arc<TokenCache> {
        Arc::new(TokenCache::new(
            TokenCredentials::new("baz", "boo"),
            reqwest::Client::new(),
        ))
    }

    #[test]
    fn resolve_returns_registered_cache() {
        let registry = StateRegistry::new();
        let cache = cache();
        registry.insert("ms", cache.clone());

        let resolved = registry.resolve("ms").unwrap();
        assert!(Arc::ptr_eq(&resolved, &cache));
    }

    #[test]
    fn resolve_unknown_name_is_not_found() {
        let registry = StateRegistry::new();
        let err = registry.resolve("missing").unwrap_err();
        assert!(matches!(err, Error::NotFound(ref n) if n == "missing"), "got: {err}");
    }

    #[test]
    fn resolve_wrong_type_is_type_error() {
        let registry = StateRegistry::new();
        registry.insert("counter", Arc::new(42_u64));
        let err = registry.resolve("counter").unwrap_err();
        assert!(matches!(err, Error::Type(ref n) if n == "counter"), "got: {err}");
    }

    #[test]
    fn insert_if_absent_keeps_first_entry() {
        let registry = StateRegistry::new();
        let first = cache();
        assert!(registry.insert_if_absent("ms", first.clone()));
        assert!(!registry.insert_if_absent("ms", cache()));
        assert!(Arc::ptr_eq(&registry.resolve("ms").unwrap(), &first));
    }

    #[test]
    fn insert_replaces_and_remove_drops() {
        let registry = StateRegistry::new();
        assert!(registry.insert("ms", cache()).is_none());
        assert!(registry.insert("ms", cache()).is_some());
        assert_eq!(registry.len(), 1);

        assert!(registry.remove("ms").is_some());
        assert!(registry.remove("ms").is_none());
        assert!(registry.is_empty());
    }

    #[test]
    fn names_are_sorted() {
        let registry = StateRegistry::new();
        registry.insert("zh", cache());
        registry.insert("en", cache());
        assert_eq!(registry.names(), vec!["en", "zh"]);
    }
}
