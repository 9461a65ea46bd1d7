//! Mapping-shaped persistent variable
//!
//! Every mutation through a [`PersistentDict`] is written to disk before the
//! call returns, whether or not the context auto-saves.

use tracing::{trace, warn};

use crate::error::Result;
use crate::store::{self, SharedStore};
use crate::value::{Mapping, Value};

/// Live mapping bound to one store entry
#[derive(Debug, Clone)]
pub struct PersistentDict {
    store: SharedStore,
    name: String,
}

impl PersistentDict {
    pub(crate) fn new(store: SharedStore, name: &str) -> Self {
        Self {
            store,
            name: name.to_string(),
        }
    }

    /// Entry name in the store
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Read the mapping. `None` if the entry was replaced by a non-mapping
    /// through the raw mapping view.
    fn read<R>(&self, f: impl FnOnce(&Mapping) -> R) -> Option<R> {
        let store = store::lock(&self.store);
        match store.dict(&self.name) {
            Ok(Some(map)) => Some(f(map)),
            Ok(None) => Some(f(&Mapping::new())),
            Err(e) => {
                warn!(name = %self.name, error = %e, "dict entry no longer holds a mapping");
                None
            }
        }
    }

    /// Apply a mutation and write the store; undone if the write fails
    fn mutate<R>(&self, f: impl FnOnce(&mut Mapping) -> R) -> Result<R> {
        let result = store::lock(&self.store).commit_dict(&self.name, f)?;
        trace!(name = %self.name, "dict mutation saved");
        Ok(result)
    }

    pub fn get(&self, key: &str) -> Option<Value> {
        self.read(|map| map.get(key).cloned()).flatten()
    }

    pub fn contains_key(&self, key: &str) -> bool {
        self.read(|map| map.contains_key(key)).unwrap_or(false)
    }

    pub fn len(&self) -> usize {
        self.read(|map| map.len()).unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn keys(&self) -> Vec<String> {
        self.read(|map| map.keys().cloned().collect())
            .unwrap_or_default()
    }

    /// Copy of the current contents.
    ///
    /// Fails with `TypeMismatch` if the entry was overwritten with a
    /// non-mapping through the raw mapping view.
    pub fn snapshot(&self) -> Result<Mapping> {
        let store = store::lock(&self.store);
        Ok(store.dict(&self.name)?.cloned().unwrap_or_default())
    }

    /// Insert or replace a key; returns the previous value
    pub fn insert(&self, key: impl Into<String>, value: impl Into<Value>) -> Result<Option<Value>> {
        let (key, value) = (key.into(), value.into());
        self.mutate(|map| map.insert(key, value))
    }

    pub fn remove(&self, key: &str) -> Result<Option<Value>> {
        self.mutate(|map| map.shift_remove(key))
    }

    pub fn clear(&self) -> Result<()> {
        self.mutate(Mapping::clear)
    }

    pub fn extend<I, K, V>(&self, items: I) -> Result<()>
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<Value>,
    {
        self.mutate(|map| {
            map.extend(items.into_iter().map(|(k, v)| (k.into(), v.into())));
        })
    }

    /// Mutate the mapping in place, including nested values, then save once
    pub fn update<R>(&self, f: impl FnOnce(&mut Mapping) -> R) -> Result<R> {
        self.mutate(f)
    }

    /// Write the store now. Idempotent.
    pub fn sync(&self) -> Result<()> {
        store::lock(&self.store).flush_entry(&self.name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::codec::Codec;
    use crate::config::{CodecOptions, FileFormat};
    use crate::error::PvarsError;
    use crate::store::Store;
    use std::fs;
    use std::sync::{Arc, Mutex};
    use tempfile::TempDir;

    fn dict_in(dir: &TempDir, format: FileFormat) -> PersistentDict {
        let mut store = Store::new(
            dir.path().join("d.pdb"),
            Codec::new(format, CodecOptions::default()),
        );
        store.bind_dict("X", Mapping::new()).unwrap();
        PersistentDict::new(Arc::new(Mutex::new(store)), "X")
    }

    #[test]
    fn test_insert_is_written_immediately() {
        let dir = TempDir::new().unwrap();
        let dict = dict_in(&dir, FileFormat::Json);

        dict.insert("k", 1i64).unwrap();
        assert_eq!(
            fs::read(dir.path().join("d.pdb")).unwrap(),
            br#"{"X":{"k":1}}"#
        );
    }

    #[test]
    fn test_nested_update() {
        let dir = TempDir::new().unwrap();
        let dict = dict_in(&dir, FileFormat::Json);
        dict.insert("inner", Value::Map(Mapping::new())).unwrap();

        dict.update(|map| {
            if let Some(inner) = map.get_mut("inner").and_then(Value::as_map_mut) {
                inner.insert("deep".into(), Value::Bool(true));
            }
        })
        .unwrap();

        assert_eq!(
            fs::read(dir.path().join("d.pdb")).unwrap(),
            br#"{"X":{"inner":{"deep":true}}}"#
        );
    }

    #[test]
    fn test_remove_and_clear() {
        let dir = TempDir::new().unwrap();
        let dict = dict_in(&dir, FileFormat::Json);
        dict.extend([("a", 1i64), ("b", 2i64)]).unwrap();
        assert_eq!(dict.keys(), vec!["a", "b"]);

        assert_eq!(dict.remove("a").unwrap(), Some(Value::Int(1)));
        assert_eq!(dict.remove("a").unwrap(), None);
        dict.clear().unwrap();
        assert!(dict.is_empty());
        assert_eq!(fs::read(dir.path().join("d.pdb")).unwrap(), br#"{"X":{}}"#);
    }

    #[test]
    fn test_encode_failure_surfaces() {
        let dir = TempDir::new().unwrap();
        let dict = dict_in(&dir, FileFormat::Csv);
        let err = dict.insert("k", 1i64).unwrap_err();
        assert!(matches!(err, PvarsError::UnrepresentableValue { .. }));
    }

    #[test]
    fn test_rejected_value_is_rolled_back() {
        let dir = TempDir::new().unwrap();
        let dict = dict_in(&dir, FileFormat::Json);
        dict.insert("ok", 1i64).unwrap();

        assert!(dict.insert("bad", f64::NAN).is_err());
        assert!(!dict.contains_key("bad"));
        assert_eq!(dict.len(), 1);
        // The store can still be written
        dict.insert("next", 2i64).unwrap();
        assert_eq!(
            fs::read(dir.path().join("d.pdb")).unwrap(),
            br#"{"X":{"ok":1,"next":2}}"#
        );
    }

    #[test]
    fn test_overwritten_entry_reads_empty_and_snapshot_fails() {
        let dir = TempDir::new().unwrap();
        let dict = dict_in(&dir, FileFormat::Json);
        dict.insert("k", 1i64).unwrap();
        store::lock(&dict.store).insert("X", Value::Int(7));

        assert_eq!(dict.get("k"), None);
        assert_eq!(dict.len(), 0);
        assert!(matches!(
            dict.snapshot(),
            Err(PvarsError::TypeMismatch { .. })
        ));
    }

    #[test]
    fn test_sync_is_idempotent() {
        let dir = TempDir::new().unwrap();
        let dict = dict_in(&dir, FileFormat::Pickle);
        dict.insert("k", "v").unwrap();
        let path = dir.path().join("d.pdb");
        let first = fs::read(&path).unwrap();
        dict.sync().unwrap();
        dict.sync().unwrap();
        assert_eq!(fs::read(&path).unwrap(), first);
    }

    #[test]
    fn test_clones_share_entry() {
        let dir = TempDir::new().unwrap();
        let dict = dict_in(&dir, FileFormat::Json);
        let other = dict.clone();
        other.insert("shared", 3i64).unwrap();
        assert_eq!(dict.get("shared"), Some(Value::Int(3)));
        assert_eq!(dict.len(), 1);
    }
}
