//! In-memory catalog of field configurations, keyed by field key.
//!
//! Hosts load field definitions from their own settings store and publish
//! them here. The catalog uses `arc-swap` for lock-free reads on the hot path.

use std::{collections::HashMap, sync::Arc};

use arc_swap::ArcSwap;
use serde_json::{Map, Value};
use tracing::{info, warn};

use common::FieldConfig;

/// Shared, lock-free map of field configurations keyed by field key.
///
/// Readers never block; [`FieldCatalog::replace_all`] atomically swaps in a
/// completely new map.
#[derive(Clone, Debug)]
pub struct FieldCatalog {
    inner: Arc<ArcSwap<HashMap<String, FieldConfig>>>,
}

impl FieldCatalog {
    /// Create a new, empty [`FieldCatalog`].
    pub fn new() -> Self {
        Self {
            inner: Arc::new(ArcSwap::new(Arc::new(HashMap::new()))),
        }
    }

    /// Return the number of fields currently cataloged.
    pub fn len(&self) -> usize {
        self.inner.load().len()
    }

    /// Return `true` if no fields are cataloged.
    pub fn is_empty(&self) -> bool {
        self.inner.load().is_empty()
    }

    /// Look up a field by key.
    pub fn get(&self, field_key: &str) -> Option<FieldConfig> {
        self.inner.load().get(field_key).cloned()
    }

    /// Atomically replace every entry with `configs`.
    ///
    /// A later config with the same field key overrides an earlier one.
    pub fn replace_all(&self, configs: impl IntoIterator<Item = FieldConfig>) {
        let map: HashMap<String, FieldConfig> = configs
            .into_iter()
            .map(|cfg| (cfg.field_key.clone(), cfg))
            .collect();
        self.inner.store(Arc::new(map));
        info!(count = self.len(), "field catalog replaced");
    }

    /// Replace every entry from raw host settings objects, as stored by the
    /// host's field editor. Entries without a `key` are skipped.
    pub fn load_settings<'a>(
        &self,
        fields: impl IntoIterator<Item = &'a Map<String, Value>>,
        slug: &str,
    ) {
        let configs: Vec<FieldConfig> = fields
            .into_iter()
            .map(|settings| FieldConfig::from_settings(settings, slug))
            .filter(|cfg| {
                if cfg.field_key.is_empty() {
                    warn!("skipping field settings without a key");
                    false
                } else {
                    true
                }
            })
            .collect();
        self.replace_all(configs);
    }
}

impl Default for FieldCatalog {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn initially_empty() {
        let catalog = FieldCatalog::new();
        assert!(catalog.is_empty());
        assert_eq!(catalog.len(), 0);
        assert!(catalog.get("field_1").is_none());
    }

    #[test]
    fn replace_all_and_get() {
        let catalog = FieldCatalog::new();
        catalog.replace_all([FieldConfig::new("field_ssn").encrypted(true)]);
        assert_eq!(catalog.len(), 1);
        assert!(catalog.get("field_ssn").unwrap().is_encrypted);
        assert!(catalog.get("other").is_none());
    }

    #[test]
    fn replace_all_is_atomic() {
        let catalog = FieldCatalog::new();
        catalog.replace_all([FieldConfig::new("a")]);
        catalog.replace_all([FieldConfig::new("b")]);
        assert!(catalog.get("a").is_none());
        assert!(catalog.get("b").is_some());
    }

    #[test]
    fn clones_share_contents() {
        let catalog = FieldCatalog::new();
        let reader = catalog.clone();
        catalog.replace_all([FieldConfig::new("a")]);
        assert!(reader.get("a").is_some());
    }

    #[test]
    fn load_settings_skips_keyless_entries() {
        let with_key = json!({"key": "field_a", "_acf_efo_is_encrypted": true});
        let without_key = json!({"_acf_efo_is_encrypted": true});
        let catalog = FieldCatalog::new();
        catalog.load_settings(
            [with_key.as_object().unwrap(), without_key.as_object().unwrap()],
            "_acf_efo_",
        );
        assert_eq!(catalog.len(), 1);
        assert!(catalog.get("field_a").unwrap().is_encrypted);
    }
}
