//! In-memory image of one backing file
//!
//! A [`Store`] loads the file once, owns every [`Entry`] and read-back
//! [`Binding`] registered against it, and writes the full mapping back
//! through its [`Codec`] on flush.

pub mod atomic;
mod binding;
mod entry;

use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use indexmap::IndexMap;
use tracing::debug;

pub use binding::{Binding, ReadBack};
pub use entry::{BindingKind, Entry};

use crate::codec::Codec;
use crate::config::FileFormat;
use crate::error::{PvarsError, Result};
use crate::value::{Mapping, Value};

/// Store shared between a context, its dicts and its lifecycle triggers
pub type SharedStore = Arc<Mutex<Store>>;

/// Lock a shared store, recovering the data if a previous holder panicked
pub(crate) fn lock(store: &SharedStore) -> MutexGuard<'_, Store> {
    store.lock().unwrap_or_else(PoisonError::into_inner)
}

#[derive(Debug)]
pub struct Store {
    path: PathBuf,
    codec: Codec,
    entries: IndexMap<String, Entry>,
    /// Read-back bindings in registration order
    bindings: Vec<Binding>,
    loaded_format: Option<FileFormat>,
    flushed: bool,
    layout_changed: bool,
}

impl Store {
    /// Empty store for `path`; nothing is read until [`Store::load`]
    pub fn new(path: impl Into<PathBuf>, codec: Codec) -> Self {
        Self {
            path: path.into(),
            codec,
            entries: IndexMap::new(),
            bindings: Vec::new(),
            loaded_format: None,
            flushed: false,
            layout_changed: false,
        }
    }

    /// Create a store and load its backing file
    pub fn open(path: impl Into<PathBuf>, codec: Codec) -> Result<Self> {
        let mut store = Self::new(path, codec);
        store.load()?;
        Ok(store)
    }

    /// Read the backing file into the entries.
    ///
    /// A missing file is an empty store. Anything that cannot be decoded is an
    /// error; it is never treated as empty.
    pub fn load(&mut self) -> Result<()> {
        let bytes = match fs::read(&self.path) {
            Ok(bytes) => bytes,
            Err(e) if e.kind() == io::ErrorKind::NotFound => {
                debug!(path = %self.path.display(), "no backing file yet, starting empty");
                return Ok(());
            }
            Err(e) => return Err(e.into()),
        };

        let (mapping, format) =
            self.codec
                .detect(&bytes)
                .map_err(|reason| PvarsError::DecodeFailure {
                    path: self.path.clone(),
                    reason,
                })?;

        let count = mapping.len();
        for (name, value) in mapping {
            match self.entries.get_mut(&name) {
                Some(entry) => {
                    entry.replace(value);
                    entry.mark_clean();
                }
                None => {
                    self.entries.insert(name.clone(), Entry::loaded(&name, value));
                }
            }
        }
        self.loaded_format = Some(format);

        debug!(path = %self.path.display(), %format, entries = count, "loaded store");
        Ok(())
    }

    /// Bind `name` as a variable. The default applies only if the name is
    /// absent. Returns a copy of the stored value.
    pub fn bind_var(&mut self, name: &str, default: Value, read_back: ReadBack) -> Result<Value> {
        if let Some(kind) = self.entries.get(name).and_then(Entry::kind) {
            debug!(name, %kind, "refusing second binding");
            return Err(PvarsError::NameCollision(name.to_string()));
        }

        let entry = self
            .entries
            .entry(name.to_string())
            .or_insert_with(|| Entry::fresh(name, default.clone()));
        entry.bind(BindingKind::Var, default);

        let value = entry.value().clone();
        self.bindings.push(Binding::new(name, read_back));
        Ok(value)
    }

    /// Drop the read-back registered for `name`
    pub fn unbind_var(&mut self, name: &str) {
        self.bindings.retain(|b| b.name() != name);
        if let Some(entry) = self.entries.get_mut(name) {
            entry.unbind();
        }
    }

    /// Bind `name` as a mapping. Several dict bindings may share one name; a
    /// variable binding may not.
    pub fn bind_dict(&mut self, name: &str, default: Mapping) -> Result<()> {
        if let Some(entry) = self.entries.get(name) {
            if entry.kind() == Some(BindingKind::Var) {
                return Err(PvarsError::NameCollision(name.to_string()));
            }
            if entry.value().as_map().is_none() {
                return Err(PvarsError::TypeMismatch {
                    name: name.to_string(),
                    expected: "map",
                    found: entry.value().type_name(),
                });
            }
        }

        let default = Value::Map(default);
        self.entries
            .entry(name.to_string())
            .or_insert_with(|| Entry::fresh(name, default.clone()))
            .bind(BindingKind::Dict, default);
        Ok(())
    }

    /// Sample every read-back in registration order and fold values that
    /// differ from the stored ones into their entries
    pub fn collect(&mut self) -> Result<usize> {
        let mut changed = 0;
        for binding in &mut self.bindings {
            let stored = self.entries.get(binding.name()).map(Entry::value);
            if let Some(value) = binding.poll(stored)? {
                let name = binding.name();
                let entry = self
                    .entries
                    .entry(name.to_string())
                    .or_insert_with(|| Entry::fresh(name, Value::Null));
                entry.set_kind(BindingKind::Var);
                entry.replace(value);
                changed += 1;
            }
        }
        Ok(changed)
    }

    /// Collect reassignments, then write the whole mapping
    pub fn flush(&mut self) -> Result<()> {
        let changed = self.collect()?;
        debug!(path = %self.path.display(), changed, "flushing store");
        self.write()
    }

    /// Flush on behalf of one dict entry. Read-backs are not sampled, but the
    /// file still receives every entry.
    pub fn flush_entry(&mut self, name: &str) -> Result<()> {
        debug!(path = %self.path.display(), entry = name, "flushing after dict mutation");
        self.write()
    }

    /// Encode and atomically write the current mapping
    pub fn write(&mut self) -> Result<()> {
        let snapshot = self.snapshot();
        let bytes = self.codec.encode(&snapshot)?;
        atomic::write(&self.path, &bytes)?;

        for entry in self.entries.values_mut() {
            entry.mark_clean();
        }
        self.flushed = true;
        self.layout_changed = false;

        debug!(
            path = %self.path.display(),
            format = %self.codec.format,
            entries = snapshot.len(),
            bytes = bytes.len(),
            "wrote store"
        );
        Ok(())
    }

    /// Restore registered defaults and drop entries that have none.
    ///
    /// Bound variables are not touched: a variable that still differs from
    /// its default is picked up again by the next flush.
    pub fn reset(&mut self) {
        self.entries.retain(|_, entry| entry.default().is_some());
        for entry in self.entries.values_mut() {
            entry.reset();
        }
        self.layout_changed = true;
        debug!(path = %self.path.display(), kept = self.entries.len(), "reset store");
    }

    pub fn get(&self, name: &str) -> Option<&Value> {
        self.entries.get(name).map(Entry::value)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.entries.contains_key(name)
    }

    /// Set a value directly, creating an unbound entry if needed
    pub fn insert(&mut self, name: &str, value: Value) -> Option<Value> {
        match self.entries.get_mut(name) {
            Some(entry) => Some(entry.replace(value)),
            None => {
                self.entries
                    .insert(name.to_string(), Entry::fresh(name, value));
                None
            }
        }
    }

    pub fn remove(&mut self, name: &str) -> Option<Value> {
        let removed = self.entries.shift_remove(name).map(|e| e.value().clone());
        if removed.is_some() {
            // A removal changes the file even though no entry is dirty
            self.layout_changed = true;
        }
        removed
    }

    pub fn names(&self) -> Vec<String> {
        self.entries.keys().cloned().collect()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Copy of the full name -> value mapping
    pub fn snapshot(&self) -> Mapping {
        self.entries
            .iter()
            .map(|(name, entry)| (name.clone(), entry.value().clone()))
            .collect()
    }

    /// Run `f` on the mapping held by a dict entry, marking it changed
    pub fn with_dict_mut<R>(&mut self, name: &str, f: impl FnOnce(&mut Mapping) -> R) -> Result<R> {
        let entry = self
            .entries
            .entry(name.to_string())
            .or_insert_with(|| Entry::fresh(name, Value::Map(Mapping::new())));
        entry.set_kind(BindingKind::Dict);

        let found = entry.value().type_name();
        match entry.value_mut().as_map_mut() {
            Some(map) => Ok(f(map)),
            None => Err(PvarsError::TypeMismatch {
                name: name.to_string(),
                expected: "map",
                found,
            }),
        }
    }

    /// Apply `f` to a dict entry and write the store.
    ///
    /// If the write fails the entry is put back as it was, so a value the
    /// codec refuses never lingers to block later flushes.
    pub fn commit_dict<R>(&mut self, name: &str, f: impl FnOnce(&mut Mapping) -> R) -> Result<R> {
        let prior = self.entries.get(name).cloned();
        let result = self.with_dict_mut(name, f)?;
        if let Err(e) = self.write() {
            match prior {
                Some(entry) => {
                    self.entries.insert(name.to_string(), entry);
                }
                None => {
                    self.entries.shift_remove(name);
                }
            }
            debug!(path = %self.path.display(), entry = name, error = %e, "dict mutation rolled back");
            return Err(e);
        }
        Ok(result)
    }

    /// Mapping held by a dict entry
    pub fn dict(&self, name: &str) -> Result<Option<&Mapping>> {
        match self.entries.get(name) {
            None => Ok(None),
            Some(entry) => entry
                .value()
                .as_map()
                .map(Some)
                .ok_or_else(|| PvarsError::TypeMismatch {
                    name: name.to_string(),
                    expected: "map",
                    found: entry.value().type_name(),
                }),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn codec(&self) -> Codec {
        self.codec
    }

    pub fn set_codec(&mut self, codec: Codec) {
        self.codec = codec;
    }

    /// Format the backing file was found in, if it existed
    pub fn loaded_format(&self) -> Option<FileFormat> {
        self.loaded_format
    }

    /// At least one write has completed
    pub fn has_flushed(&self) -> bool {
        self.flushed
    }

    pub fn is_dirty(&self) -> bool {
        self.entries.values().any(Entry::is_dirty)
    }

    /// Something in memory differs from the file
    pub fn needs_flush(&self) -> bool {
        self.layout_changed || self.is_dirty()
    }

    pub fn binding_count(&self) -> usize {
        self.bindings.len()
    }
}
