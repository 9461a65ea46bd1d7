//! Process-level shutdown hooks
//!
//! The interrupt handler is process-global (a process can install only one
//! Ctrl+C handler), so managers register here by weak reference and a single
//! handler fans the interrupt out to every live manager before exiting.

use std::sync::{Arc, Mutex, OnceLock, PoisonError, Weak};

use tracing::info;

use super::{LifecycleManager, Trigger};
use crate::error::{PvarsError, Result};

/// Exit status after an interrupt, 128 + SIGINT
pub const INTERRUPT_EXIT_CODE: i32 = 130;

static WATCHED: Registry = Registry::new();
static INTERRUPT_HOOK: OnceLock<std::result::Result<(), String>> = OnceLock::new();

/// Weakly held set of managers
#[derive(Debug)]
pub struct Registry {
    managers: Mutex<Vec<Weak<LifecycleManager>>>,
}

impl Registry {
    pub const fn new() -> Self {
        Self {
            managers: Mutex::new(Vec::new()),
        }
    }

    pub fn watch(&self, manager: &Arc<LifecycleManager>) {
        let mut managers = self.managers.lock().unwrap_or_else(PoisonError::into_inner);
        managers.retain(|w| w.strong_count() > 0);
        managers.push(Arc::downgrade(manager));
    }

    /// Fire `trigger` on every live manager; returns how many saved
    pub fn fire_all(&self, trigger: Trigger) -> usize {
        // Collect first so the list is not locked while stores flush
        let live: Vec<Arc<LifecycleManager>> = self
            .managers
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .iter()
            .filter_map(Weak::upgrade)
            .collect();

        live.iter().filter(|m| m.fire(trigger)).count()
    }
}

impl Default for Registry {
    fn default() -> Self {
        Self::new()
    }
}

pub(crate) fn watch(manager: &Arc<LifecycleManager>) {
    WATCHED.watch(manager);
}

/// Install the Ctrl+C handler, once per process
pub fn install_interrupt_hook() -> Result<()> {
    INTERRUPT_HOOK
        .get_or_init(|| ctrlc::set_handler(on_interrupt).map_err(|e| e.to_string()))
        .clone()
        .map_err(PvarsError::Hook)
}

fn on_interrupt() {
    let saved = WATCHED.fire_all(Trigger::Interrupt);
    info!(saved, "interrupted, exiting");
    std::process::exit(INTERRUPT_EXIT_CODE);
}

/// Save every auto-saving store now.
///
/// For programs that leave through `std::process::exit`, which skips the
/// save normally done when a context is dropped.
pub fn shutdown() -> usize {
    WATCHED.fire_all(Trigger::Exit)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::codec::Codec;
    use crate::store::Store;
    use crate::value::Value;
    use tempfile::TempDir;

    #[test]
    fn test_fire_all_reaches_watched_managers() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("hooked.pdb");
        let store = Arc::new(Mutex::new(Store::new(&path, Codec::default())));
        crate::store::lock(&store).insert("k", Value::Int(1));
        let manager = LifecycleManager::new(store, true);
        let registry = Registry::new();
        registry.watch(&manager);

        assert_eq!(registry.fire_all(Trigger::Exit), 1);
        assert!(manager.completed());
        assert!(path.exists());
    }

    #[test]
    fn test_dropped_managers_are_skipped() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("gone.pdb");
        let store = Arc::new(Mutex::new(Store::new(&path, Codec::default())));
        let registry = Registry::new();
        registry.watch(&LifecycleManager::new(store, true));

        assert_eq!(registry.fire_all(Trigger::Exit), 0);
        assert!(!path.exists());
    }
}
