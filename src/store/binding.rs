//! Read-back bindings for scalar-style variables
//!
//! A value handed to the caller is a copy, so the store cannot see later
//! assignments to the caller's variable. Instead the caller hands over a
//! supplier that re-reads the variable; the store samples it at every flush
//! and folds any difference from the stored value into the entry.

use crate::error::Result;
use crate::value::Value;

/// Supplier returning the variable's current value
pub type ReadBack = Box<dyn FnMut() -> Result<Value> + Send>;

pub struct Binding {
    name: String,
    read_back: ReadBack,
}

impl Binding {
    pub(crate) fn new(name: &str, read_back: ReadBack) -> Self {
        Self {
            name: name.to_string(),
            read_back,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Sample the variable. Returns its value if it differs from `stored`.
    pub(crate) fn poll(&mut self, stored: Option<&Value>) -> Result<Option<Value>> {
        let current = (self.read_back)()?;
        if stored == Some(&current) {
            return Ok(None);
        }
        Ok(Some(current))
    }
}

impl std::fmt::Debug for Binding {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Binding")
            .field("name", &self.name)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicI64, Ordering};
    use std::sync::Arc;

    fn counter_binding(source: &Arc<AtomicI64>) -> Binding {
        let source = Arc::clone(source);
        let read_back: ReadBack = Box::new(move || Ok(Value::Int(source.load(Ordering::SeqCst))));
        Binding::new("count", read_back)
    }

    #[test]
    fn test_poll_compares_against_stored() {
        let source = Arc::new(AtomicI64::new(0));
        let mut binding = counter_binding(&source);

        assert_eq!(binding.poll(Some(&Value::Int(0))).unwrap(), None);
        source.store(2, Ordering::SeqCst);
        assert_eq!(binding.poll(Some(&Value::Int(0))).unwrap(), Some(Value::Int(2)));
        assert_eq!(binding.poll(Some(&Value::Int(2))).unwrap(), None);
    }

    #[test]
    fn test_poll_reports_until_stored_matches() {
        let source = Arc::new(AtomicI64::new(7));
        let mut binding = counter_binding(&source);
        // Nothing is remembered between samples
        assert_eq!(binding.poll(Some(&Value::Int(0))).unwrap(), Some(Value::Int(7)));
        assert_eq!(binding.poll(Some(&Value::Int(0))).unwrap(), Some(Value::Int(7)));
        assert_eq!(binding.poll(None).unwrap(), Some(Value::Int(7)));
    }
}
