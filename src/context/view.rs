//! Raw view over a store's whole mapping
//!
//! Changes made here are held in memory and written by the next flush
//! (`save`, `sync`, a dict mutation or a shutdown trigger). Editing a name
//! here that is also bound as a variable or dict has no defined ordering with
//! respect to that binding; avoid it where the result matters.

use crate::error::Result;
use crate::store::{self, SharedStore};
use crate::value::{Mapping, Value};

/// Live name -> value view returned by `Context::all`
#[derive(Debug, Clone)]
pub struct AllEntries {
    store: SharedStore,
}

impl AllEntries {
    pub(crate) fn new(store: SharedStore) -> Self {
        Self { store }
    }

    pub fn get(&self, name: &str) -> Option<Value> {
        store::lock(&self.store).get(name).cloned()
    }

    pub fn contains_key(&self, name: &str) -> bool {
        store::lock(&self.store).contains(name)
    }

    /// Set a value; returns the previous one
    pub fn insert(&self, name: &str, value: impl Into<Value>) -> Option<Value> {
        store::lock(&self.store).insert(name, value.into())
    }

    pub fn remove(&self, name: &str) -> Option<Value> {
        store::lock(&self.store).remove(name)
    }

    /// Remove every entry
    pub fn clear(&self) {
        let mut store = store::lock(&self.store);
        for name in store.names() {
            store.remove(&name);
        }
    }

    pub fn names(&self) -> Vec<String> {
        store::lock(&self.store).names()
    }

    pub fn len(&self) -> usize {
        store::lock(&self.store).len()
    }

    pub fn is_empty(&self) -> bool {
        store::lock(&self.store).is_empty()
    }

    pub fn snapshot(&self) -> Mapping {
        store::lock(&self.store).snapshot()
    }

    /// Flush the store, read-backs included
    pub fn sync(&self) -> Result<()> {
        store::lock(&self.store).flush()
    }
}
