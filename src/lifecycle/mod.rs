//! Shutdown-time saving
//!
//! A [`LifecycleManager`] wires the two shutdown triggers (normal exit and
//! interrupt) to its store's flush. The process-level plumbing that actually
//! observes those events lives in [`hooks`].

pub mod hooks;

use std::panic::{self, AssertUnwindSafe};
use std::path::PathBuf;
use std::sync::{Arc, Mutex, PoisonError};

use tracing::{debug, error, info, warn};

use crate::store::{self, SharedStore};

/// Event that forces a save
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Trigger {
    /// Normal termination of the owner
    Exit,
    /// Operator interrupt (Ctrl+C)
    Interrupt,
}

impl std::fmt::Display for Trigger {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Trigger::Exit => write!(f, "exit"),
            Trigger::Interrupt => write!(f, "interrupt"),
        }
    }
}

#[derive(Debug, Default)]
struct TriggerState {
    registered: Vec<Trigger>,
    /// A trigger already saved successfully
    completed: bool,
}

/// Trigger -> flush wiring for one store
#[derive(Debug)]
pub struct LifecycleManager {
    store: SharedStore,
    path: PathBuf,
    state: Mutex<TriggerState>,
}

impl LifecycleManager {
    /// Create a manager; both triggers are registered when `auto_save` is set
    pub fn new(store: SharedStore, auto_save: bool) -> Arc<Self> {
        let path = store::lock(&store).path().to_path_buf();
        let manager = Arc::new(Self {
            store,
            path,
            state: Mutex::new(TriggerState::default()),
        });
        hooks::watch(&manager);
        manager.set_auto_save(auto_save);
        manager
    }

    /// Register or drop both triggers
    pub fn set_auto_save(&self, auto_save: bool) {
        let mut state = self.state.lock().unwrap_or_else(PoisonError::into_inner);
        if auto_save {
            state.registered = vec![Trigger::Exit, Trigger::Interrupt];
            if let Err(e) = hooks::install_interrupt_hook() {
                warn!(path = %self.path.display(), error = %e, "interrupt trigger not armed");
            }
        } else {
            state.registered.clear();
        }
        debug!(path = %self.path.display(), auto_save, "lifecycle triggers updated");
    }

    pub fn registered(&self) -> Vec<Trigger> {
        self.state
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .registered
            .clone()
    }

    pub fn is_registered(&self, trigger: Trigger) -> bool {
        self.registered().contains(&trigger)
    }

    /// Whether a trigger has already saved the store
    pub fn completed(&self) -> bool {
        self.state
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .completed
    }

    /// Flush the store for `trigger`.
    ///
    /// Never fails and never panics: errors are logged and dropped so they
    /// cannot hold up shutdown. Returns true when this call saved the store.
    /// Unregistered triggers and triggers after a successful save are no-ops.
    pub fn fire(&self, trigger: Trigger) -> bool {
        let mut state = self.state.lock().unwrap_or_else(PoisonError::into_inner);
        if !state.registered.contains(&trigger) {
            debug!(path = %self.path.display(), %trigger, "trigger not registered");
            return false;
        }
        if state.completed {
            debug!(path = %self.path.display(), %trigger, "already saved");
            return false;
        }

        let outcome = panic::catch_unwind(AssertUnwindSafe(|| store::lock(&self.store).flush()));
        match outcome {
            Ok(Ok(())) => {
                state.completed = true;
                info!(path = %self.path.display(), %trigger, "saved on shutdown");
                true
            }
            Ok(Err(e)) => {
                error!(path = %self.path.display(), %trigger, error = %e, "shutdown save failed");
                false
            }
            Err(_) => {
                error!(path = %self.path.display(), %trigger, "shutdown save panicked");
                false
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::codec::Codec;
    use crate::config::{CodecOptions, FileFormat};
    use crate::store::Store;
    use crate::value::Value;
    use tempfile::TempDir;

    fn shared(dir: &TempDir, format: FileFormat) -> SharedStore {
        let store = Store::new(dir.path().join("s.pdb"), Codec::new(format, CodecOptions::default()));
        Arc::new(Mutex::new(store))
    }

    #[test]
    fn test_no_triggers_without_auto_save() {
        let dir = TempDir::new().unwrap();
        let manager = LifecycleManager::new(shared(&dir, FileFormat::Json), false);
        assert!(manager.registered().is_empty());
        assert!(!manager.fire(Trigger::Exit));
        assert!(!dir.path().join("s.pdb").exists());
    }

    #[test]
    fn test_fire_saves_once() {
        let dir = TempDir::new().unwrap();
        let store = shared(&dir, FileFormat::Json);
        store::lock(&store).insert("count", Value::Int(5));
        let manager = LifecycleManager::new(Arc::clone(&store), true);

        assert!(manager.fire(Trigger::Exit));
        assert!(manager.completed());
        assert!(!manager.fire(Trigger::Interrupt));
        assert_eq!(
            std::fs::read(dir.path().join("s.pdb")).unwrap(),
            br#"{"count":5}"#
        );
    }

    #[test]
    fn test_failure_is_swallowed_and_retried() {
        let dir = TempDir::new().unwrap();
        let store = shared(&dir, FileFormat::Csv);
        store::lock(&store).insert("nested", Value::from(vec![1i64]));
        let manager = LifecycleManager::new(Arc::clone(&store), true);

        assert!(!manager.fire(Trigger::Interrupt));
        assert!(!manager.completed());

        store::lock(&store).insert("nested", Value::Int(1));
        assert!(manager.fire(Trigger::Exit));
    }

    #[test]
    fn test_panicking_read_back_is_contained() {
        let dir = TempDir::new().unwrap();
        let store = shared(&dir, FileFormat::Json);
        store::lock(&store)
            .bind_var(
                "boom",
                Value::Null,
                Box::new(|| -> crate::Result<Value> { panic!("read-back failed") }),
            )
            .unwrap();
        let manager = LifecycleManager::new(Arc::clone(&store), true);
        assert!(!manager.fire(Trigger::Exit));
    }

    #[test]
    fn test_toggle_auto_save() {
        let dir = TempDir::new().unwrap();
        let manager = LifecycleManager::new(shared(&dir, FileFormat::Json), true);
        assert!(manager.is_registered(Trigger::Interrupt));
        manager.set_auto_save(false);
        assert!(!manager.is_registered(Trigger::Exit));
    }
}
