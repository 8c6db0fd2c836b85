//! Configuration registry - the canonical collection of emulator configurations.
//!
//! The registry owns an insertion-ordered map keyed by path, which gives both
//! the list order and the path-uniqueness invariant for free. Every mutation
//! follows the same shape:
//!
//! 1. Build the next collection from the current one
//! 2. Persist the full next collection through [`ConfigStore`]
//! 3. Swap it in only after the write succeeded
//!
//! so a failed write leaves memory and disk exactly as they were.

use crate::models::{EmulatorConfig, EmulatorKind};
use crate::store::{ConfigStore, KeyValueStore, StoreError};
use indexmap::IndexMap;
use thiserror::Error;

/// Errors raised by registry mutations.
#[derive(Debug, Error)]
pub enum RegistryError {
    #[error("Emulator path already configured: {0}")]
    DuplicatePath(String),

    #[error("Configuration path must not be empty")]
    EmptyPath,

    #[error("Configuration name must not be empty")]
    EmptyName,

    #[error("Failed to persist configurations: {0}")]
    Persist(#[from] StoreError),
}

/// Insertion-ordered, path-unique collection of [`EmulatorConfig`], mirrored to a store.
#[derive(Debug)]
pub struct ConfigRegistry<S> {
    configs: IndexMap<String, EmulatorConfig>,
    store: ConfigStore<S>,
}

impl<S: KeyValueStore> ConfigRegistry<S> {
    /// Load the collection from `backend`.
    ///
    /// Never fails: an absent, unreadable or malformed record yields an empty
    /// registry. Entries repeating an earlier path are dropped (first wins).
    pub fn load(backend: S) -> Self {
        let store = ConfigStore::new(backend);

        let loaded = match store.load() {
            Ok(Some(configs)) => configs,
            Ok(None) => {
                tracing::info!("No persisted emulator configurations, starting empty");
                Vec::new()
            }
            Err(e) => {
                tracing::warn!("Ignoring persisted emulator configurations: {}", e);
                Vec::new()
            }
        };

        let mut configs = IndexMap::with_capacity(loaded.len());
        for config in loaded {
            if configs.contains_key(&config.path) {
                tracing::warn!("Dropping repeated configuration path on load: {}", config.path);
                continue;
            }
            configs.insert(config.path.clone(), config);
        }

        tracing::info!("Loaded {} emulator configuration(s)", configs.len());
        Self { configs, store }
    }

    /// All configurations, in insertion order.
    pub fn list(&self) -> Vec<&EmulatorConfig> {
        self.configs.values().collect()
    }

    pub fn iter(&self) -> impl Iterator<Item = &EmulatorConfig> {
        self.configs.values()
    }

    /// Owned copy of the collection, in insertion order.
    pub fn to_vec(&self) -> Vec<EmulatorConfig> {
        self.configs.values().cloned().collect()
    }

    pub fn get(&self, path: &str) -> Option<&EmulatorConfig> {
        self.configs.get(path)
    }

    pub fn contains(&self, path: &str) -> bool {
        self.configs.contains_key(path)
    }

    pub fn len(&self) -> usize {
        self.configs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.configs.is_empty()
    }

    /// Configurations of one emulator kind, in insertion order.
    pub fn configs_for(&self, kind: EmulatorKind) -> impl Iterator<Item = &EmulatorConfig> {
        self.configs.values().filter(move |c| c.emulator == kind)
    }

    /// First configuration of `kind`, if any.
    pub fn first_for(&self, kind: EmulatorKind) -> Option<&EmulatorConfig> {
        self.configs_for(kind).next()
    }

    /// Append a user-supplied configuration.
    ///
    /// # Errors
    /// - [`RegistryError::EmptyPath`] / [`RegistryError::EmptyName`] on blank input
    /// - [`RegistryError::DuplicatePath`] when `path` is already configured (exact match)
    /// - [`RegistryError::Persist`] when the write fails; nothing changes in that case
    pub fn add(
        &mut self,
        path: &str,
        name: &str,
        emulator: EmulatorKind,
    ) -> Result<EmulatorConfig, RegistryError> {
        if path.is_empty() {
            return Err(RegistryError::EmptyPath);
        }
        if name.trim().is_empty() {
            return Err(RegistryError::EmptyName);
        }
        if self.contains(path) {
            tracing::warn!("Rejected duplicate emulator path: {}", path);
            return Err(RegistryError::DuplicatePath(path.to_string()));
        }

        let config = EmulatorConfig::new(path, name, emulator);
        let mut next = self.configs.clone();
        next.insert(config.path.clone(), config.clone());
        self.commit(next)?;

        tracing::info!("Added {} configuration '{}' at {}", emulator, name, path);
        Ok(config)
    }

    /// Remove the configuration at `path`.
    ///
    /// Idempotent: an unknown path still rewrites the record (the unchanged
    /// collection) and returns `Ok(None)`.
    pub fn remove(&mut self, path: &str) -> Result<Option<EmulatorConfig>, RegistryError> {
        let mut next = self.configs.clone();
        let removed = next.shift_remove(path);
        self.commit(next)?;

        match &removed {
            Some(config) => tracing::info!("Removed configuration '{}' at {}", config.name, path),
            None => tracing::debug!("No configuration at {}, nothing removed", path),
        }
        Ok(removed)
    }

    /// Append a detector-synthesized configuration.
    ///
    /// Unlike [`add`](Self::add) this trusts the caller and does not reject a
    /// known path: an existing entry at the same path is replaced in place.
    /// The path must still be non-empty.
    pub fn append_default(&mut self, config: EmulatorConfig) -> Result<EmulatorConfig, RegistryError> {
        if config.path.is_empty() {
            return Err(RegistryError::EmptyPath);
        }

        let mut next = self.configs.clone();
        if let Some(previous) = next.insert(config.path.clone(), config.clone()) {
            tracing::warn!(
                "Default configuration replaced existing entry '{}' at {}",
                previous.name,
                previous.path
            );
        }
        self.commit(next)?;

        tracing::info!(
            "Added default {} configuration '{}' at {}",
            config.emulator,
            config.name,
            config.path
        );
        Ok(config)
    }

    /// Access to the underlying store.
    pub fn store(&self) -> &ConfigStore<S> {
        &self.store
    }

    fn commit(&mut self, next: IndexMap<String, EmulatorConfig>) -> Result<(), RegistryError> {
        let snapshot: Vec<EmulatorConfig> = next.values().cloned().collect();
        self.store.persist(&snapshot)?;
        self.configs = next;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::{CONFIG_KEY, MemoryStore};

    fn registry() -> (ConfigRegistry<MemoryStore>, MemoryStore) {
        let store = MemoryStore::new();
        (ConfigRegistry::load(store.clone()), store)
    }

    #[test]
    fn test_load_empty_store() {
        let (registry, _store) = registry();
        assert!(registry.is_empty());
    }

    #[test]
    fn test_add_returns_entry_and_lists_it() {
        let (mut registry, _store) = registry();

        let created = registry.add("/opt/ryu", "main", EmulatorKind::Ryu).unwrap();

        assert_eq!(created, EmulatorConfig::new("/opt/ryu", "main", EmulatorKind::Ryu));
        assert_eq!(registry.list(), vec![&created]);
    }

    #[test]
    fn test_add_persists_full_collection() {
        let (mut registry, store) = registry();
        registry.add("/a", "a", EmulatorKind::Ryu).unwrap();
        registry.add("/b", "b", EmulatorKind::Yuzu).unwrap();

        let reloaded = ConfigRegistry::load(store);
        assert_eq!(reloaded.to_vec(), registry.to_vec());
    }

    #[test]
    fn test_add_duplicate_path_is_rejected() {
        let (mut registry, store) = registry();
        registry.add("/a", "first", EmulatorKind::Ryu).unwrap();
        let before = store.get(CONFIG_KEY).unwrap();

        let result = registry.add("/a", "dup", EmulatorKind::Ryu);

        assert!(matches!(result, Err(RegistryError::DuplicatePath(ref p)) if p == "/a"));
        assert_eq!(registry.len(), 1);
        assert_eq!(registry.get("/a").unwrap().name, "first");
        assert_eq!(store.get(CONFIG_KEY).unwrap(), before);
    }

    #[test]
    fn test_add_same_name_different_path_is_allowed() {
        let (mut registry, _store) = registry();
        registry.add("/a", "main", EmulatorKind::Ryu).unwrap();
        registry.add("/b", "main", EmulatorKind::Ryu).unwrap();
        assert_eq!(registry.len(), 2);
    }

    #[test]
    fn test_add_blank_inputs() {
        let (mut registry, _store) = registry();
        assert!(matches!(registry.add("", "x", EmulatorKind::Ryu), Err(RegistryError::EmptyPath)));
        assert!(matches!(registry.add("/a", "", EmulatorKind::Ryu), Err(RegistryError::EmptyName)));
        assert!(registry.is_empty());
    }

    #[test]
    fn test_remove_keeps_order() {
        let (mut registry, _store) = registry();
        registry.add("/a", "a", EmulatorKind::Ryu).unwrap();
        registry.add("/b", "b", EmulatorKind::Ryu).unwrap();
        registry.add("/c", "c", EmulatorKind::Ryu).unwrap();

        let removed = registry.remove("/b").unwrap();

        assert_eq!(removed.unwrap().path, "/b");
        let paths: Vec<_> = registry.iter().map(|c| c.path.as_str()).collect();
        assert_eq!(paths, vec!["/a", "/c"]);
    }

    #[test]
    fn test_remove_unknown_is_noop() {
        let (mut registry, _store) = registry();
        registry.add("/a", "a", EmulatorKind::Ryu).unwrap();

        assert!(registry.remove("/missing").unwrap().is_none());
        assert_eq!(registry.len(), 1);
    }

    #[test]
    fn test_failed_write_leaves_registry_unchanged() {
        let (mut registry, store) = registry();
        registry.add("/a", "a", EmulatorKind::Ryu).unwrap();
        store.set_fail_writes(true);

        assert!(matches!(
            registry.add("/b", "b", EmulatorKind::Ryu),
            Err(RegistryError::Persist(_))
        ));
        assert!(matches!(registry.remove("/a"), Err(RegistryError::Persist(_))));
        assert_eq!(registry.to_vec(), vec![EmulatorConfig::new("/a", "a", EmulatorKind::Ryu)]);
    }

    #[test]
    fn test_append_default_bypasses_duplicate_check() {
        let (mut registry, _store) = registry();
        registry.add("/a", "mine", EmulatorKind::Ryu).unwrap();
        registry.add("/b", "other", EmulatorKind::Ryu).unwrap();

        registry
            .append_default(EmulatorConfig::new("/a", "Default", EmulatorKind::Ryu))
            .unwrap();

        assert_eq!(registry.len(), 2);
        assert_eq!(registry.list()[0].name, "Default");
        assert_eq!(registry.list()[1].path, "/b");
    }

    #[test]
    fn test_malformed_record_loads_empty() {
        let store = MemoryStore::with_record(CONFIG_KEY, &b"\x00\x01 not yaml ["[..]);
        let registry = ConfigRegistry::load(store);
        assert!(registry.is_empty());
    }

    #[test]
    fn test_load_drops_repeated_paths() {
        let yaml = "- path: /a\n  name: one\n  emulator: ryu\n- path: /a\n  name: two\n  emulator: yuzu\n";
        let registry = ConfigRegistry::load(MemoryStore::with_record(CONFIG_KEY, yaml));

        assert_eq!(registry.len(), 1);
        assert_eq!(registry.get("/a").unwrap().name, "one");
    }

    #[test]
    fn test_configs_for_kind() {
        let (mut registry, _store) = registry();
        registry.add("/y", "y", EmulatorKind::Yuzu).unwrap();
        registry.add("/r1", "r1", EmulatorKind::Ryu).unwrap();
        registry.add("/r2", "r2", EmulatorKind::Ryu).unwrap();

        assert_eq!(registry.configs_for(EmulatorKind::Ryu).count(), 2);
        assert_eq!(registry.first_for(EmulatorKind::Ryu).unwrap().path, "/r1");
        assert_eq!(registry.first_for(EmulatorKind::Yuzu).unwrap().path, "/y");
    }
}
