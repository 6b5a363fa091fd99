//! Per-run resolution cache and failure registry.
//!
//! Both structures are shared across concurrent cascades via `Arc` and are
//! never persisted: a fresh engine starts empty. The cache maps raw compound
//! names (not variants) to their resolved SMILES, so two spellings that
//! collapse to the same backend hit are still cached independently under
//! their own keys.

use dashmap::DashMap;

/// Append-only map of resolved `name -> SMILES` for the current run.
#[derive(Debug, Default)]
pub struct ResolutionCache {
    entries: DashMap<String, String>,
}

impl ResolutionCache {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&self, name: &str, smiles: &str) {
        self.entries.insert(name.to_string(), smiles.to_string());
    }

    #[must_use]
    pub fn get(&self, name: &str) -> Option<String> {
        self.entries.get(name).map(|entry| entry.value().clone())
    }

    #[must_use]
    pub fn contains(&self, name: &str) -> bool {
        self.entries.contains_key(name)
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// Set of names whose cascades exhausted every strategy this run.
///
/// A registered name is never re-queried; repeat requests short-circuit to
/// `NotFound` with zero backend traffic.
#[derive(Debug, Default)]
pub struct FailureRegistry {
    entries: DashMap<String, ()>,
}

impl FailureRegistry {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    pub fn record(&self, name: &str) {
        self.entries.insert(name.to_string(), ());
    }

    #[must_use]
    pub fn contains(&self, name: &str) -> bool {
        self.entries.contains_key(name)
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cache_insert_and_get() {
        let cache = ResolutionCache::new();
        assert!(cache.get("curcumin").is_none());

        cache.insert("curcumin", "CCO");
        assert_eq!(cache.get("curcumin"), Some("CCO".to_string()));
        assert!(cache.contains("curcumin"));
        assert_eq!(cache.len(), 1);
    }

    #[test]
    fn test_cache_keys_are_case_sensitive() {
        let cache = ResolutionCache::new();
        cache.insert("Curcumin", "CCO");
        assert!(cache.get("curcumin").is_none());
    }

    #[test]
    fn test_registry_record_and_contains() {
        let registry = FailureRegistry::new();
        assert!(!registry.contains("unobtainium"));

        registry.record("unobtainium");
        assert!(registry.contains("unobtainium"));
        assert_eq!(registry.len(), 1);
    }

    #[test]
    fn test_registry_record_is_idempotent() {
        let registry = FailureRegistry::new();
        registry.record("unobtainium");
        registry.record("unobtainium");
        assert_eq!(registry.len(), 1);
    }
}
