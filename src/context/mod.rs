//! Context management for pvars
//!
//! A [`Context`] owns one store and its lifecycle triggers for a single
//! backing file, and hands out persistent variables and dicts bound to it.
//! Clones share the same store. When the last clone is dropped the exit
//! trigger fires, saving the store if auto-save is on.

pub mod path;
mod view;

use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex, PoisonError, Weak};

use serde::de::DeserializeOwned;
use serde::Serialize;
use tracing::debug;

pub use view::AllEntries;

use crate::codec::Codec;
use crate::config::{Config, ConfigUpdate, FileFormat};
use crate::dict::PersistentDict;
use crate::error::{PvarsError, Result};
use crate::lifecycle::{LifecycleManager, Trigger};
use crate::store::{self, SharedStore, Store};
use crate::value::{Mapping, Value};

/// Live contexts by backing file, for [`get_context`]
static CONTEXTS: Mutex<Vec<(PathBuf, Weak<ContextInner>)>> = Mutex::new(Vec::new());

/// Where a context's backing file lives and how to open it
#[derive(Debug, Clone, Default)]
pub struct ContextOptions {
    /// Subdirectory of the executable's directory for the derived file
    pub extra_path: Option<PathBuf>,
    /// Explicit backing file; relative paths start at the current directory
    pub abs_path: Option<PathBuf>,
    pub config: Option<Config>,
}

impl ContextOptions {
    /// Options for an explicit backing file
    pub fn at(path: impl Into<PathBuf>) -> Self {
        Self {
            abs_path: Some(path.into()),
            ..Self::default()
        }
    }

    /// Derived backing file placed under `extra_path`
    pub fn under(extra_path: impl Into<PathBuf>) -> Self {
        Self {
            extra_path: Some(extra_path.into()),
            ..Self::default()
        }
    }

    pub fn with_config(mut self, config: Config) -> Self {
        self.config = Some(config);
        self
    }
}

/// Get the context for a backing file, opening it on first use.
///
/// While any clone of a context is alive, asking again for the same file
/// returns it. A `config` given for an existing context is applied through
/// [`Context::configure`].
pub fn get_context(options: ContextOptions) -> Result<Context> {
    let path = path::resolve(options.extra_path.as_deref(), options.abs_path.as_deref())?;

    let existing = {
        let mut contexts = CONTEXTS.lock().unwrap_or_else(PoisonError::into_inner);
        contexts.retain(|(_, weak)| weak.strong_count() > 0);
        contexts
            .iter()
            .find(|(p, _)| *p == path)
            .and_then(|(_, weak)| weak.upgrade())
    };

    if let Some(inner) = existing {
        let context = Context { inner };
        if let Some(config) = options.config {
            context.configure(config.into())?;
        }
        debug!(path = %path.display(), "reusing context");
        return Ok(context);
    }

    let context = Context::open(&path, options.config.unwrap_or_default())?;
    CONTEXTS
        .lock()
        .unwrap_or_else(PoisonError::into_inner)
        .push((path, Arc::downgrade(&context.inner)));
    Ok(context)
}

#[derive(Debug)]
struct ContextInner {
    path: PathBuf,
    store: SharedStore,
    lifecycle: Arc<LifecycleManager>,
    config: Mutex<Config>,
}

impl Drop for ContextInner {
    fn drop(&mut self) {
        self.lifecycle.fire(Trigger::Exit);
    }
}

/// Handle on one backing file
#[derive(Debug, Clone)]
pub struct Context {
    inner: Arc<ContextInner>,
}

impl Context {
    /// Open `path` directly. Unlike [`get_context`] this never reuses an
    /// existing context, so two contexts on one file are possible; the last
    /// one to write wins.
    pub fn open(path: impl AsRef<Path>, config: Config) -> Result<Self> {
        let path = path.as_ref().to_path_buf();
        let codec = Codec::new(config.file_format, config.options);
        let store = Arc::new(Mutex::new(Store::open(&path, codec)?));
        let lifecycle = LifecycleManager::new(Arc::clone(&store), config.auto_save);

        debug!(path = %path.display(), auto_save = config.auto_save, format = %config.file_format, "opened context");
        Ok(Self {
            inner: Arc::new(ContextInner {
                path,
                store,
                lifecycle,
                config: Mutex::new(config),
            }),
        })
    }

    /// Bind a persistent variable.
    ///
    /// Returns the stored value, or `default` if `name` is not stored yet.
    /// `read_back` must return the variable's current value; it is called at
    /// every flush to pick up reassignments. It runs while the store is
    /// locked, so it must not call back into this context.
    pub fn make_var<F>(
        &self,
        name: &str,
        default: impl Into<Value>,
        mut read_back: F,
    ) -> Result<Value>
    where
        F: FnMut() -> Value + Send + 'static,
    {
        store::lock(&self.inner.store).bind_var(
            name,
            default.into(),
            Box::new(move || Ok(read_back())),
        )
    }

    /// Typed form of [`Context::make_var`] for any serde type
    pub fn make_typed<T, F>(&self, name: &str, default: T, mut read_back: F) -> Result<T>
    where
        T: Serialize + DeserializeOwned,
        F: FnMut() -> T + Send + 'static,
    {
        let default = Value::from_serialize(&default)?;
        let mut store = store::lock(&self.inner.store);
        let value = store.bind_var(
            name,
            default,
            Box::new(move || Value::from_serialize(&read_back())),
        )?;
        // A stored value of another shape must not leave a binding behind
        value.deserialize_into().inspect_err(|_| store.unbind_var(name))
    }

    /// Bind a persistent dict; every mutation through it is saved at once
    pub fn make_dict(&self, name: &str, default: Mapping) -> Result<PersistentDict> {
        store::lock(&self.inner.store).bind_dict(name, default)?;
        Ok(PersistentDict::new(Arc::clone(&self.inner.store), name))
    }

    /// Change configuration. Only allowed until the store first writes.
    pub fn configure(&self, update: ConfigUpdate) -> Result<()> {
        let mut config = self
            .inner
            .config
            .lock()
            .unwrap_or_else(PoisonError::into_inner);
        let mut next = *config;
        next.merge(&update);
        if next == *config {
            return Ok(());
        }

        let mut store = store::lock(&self.inner.store);
        if store.has_flushed() {
            return Err(PvarsError::ConfigurationAfterUse(self.inner.path.clone()));
        }
        store.set_codec(Codec::new(next.file_format, next.options));
        drop(store);

        if next.auto_save != config.auto_save {
            self.inner.lifecycle.set_auto_save(next.auto_save);
        }
        debug!(path = %self.inner.path.display(), ?next, "reconfigured");
        *config = next;
        Ok(())
    }

    /// Restore every bound name to its default, forget unbound names, and
    /// write the result immediately. A variable that still holds another
    /// value is stored again by the next save.
    pub fn reset(&self) -> Result<()> {
        let mut store = store::lock(&self.inner.store);
        store.reset();
        store.write()
    }

    /// Raw view over every stored name
    pub fn all(&self) -> AllEntries {
        AllEntries::new(Arc::clone(&self.inner.store))
    }

    /// Pick up reassigned variables and write the store
    pub fn save(&self) -> Result<()> {
        store::lock(&self.inner.store).flush()
    }

    pub fn path(&self) -> &Path {
        &self.inner.path
    }

    pub fn config(&self) -> Config {
        *self
            .inner
            .config
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
    }

    /// Format the backing file was found in when opened
    pub fn loaded_format(&self) -> Option<FileFormat> {
        store::lock(&self.inner.store).loaded_format()
    }

    /// Memory differs from the file, ignoring unsampled read-backs
    pub fn needs_flush(&self) -> bool {
        store::lock(&self.inner.store).needs_flush()
    }

    pub fn lifecycle(&self) -> &Arc<LifecycleManager> {
        &self.inner.lifecycle
    }
}
