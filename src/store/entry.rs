//! A named slot in a store

use crate::value::Value;

/// How a name is bound by the caller
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BindingKind {
    /// Scalar-style variable with a read-back supplier
    Var,
    /// Mapping that flushes on every mutation
    Dict,
}

impl std::fmt::Display for BindingKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            BindingKind::Var => write!(f, "variable"),
            BindingKind::Dict => write!(f, "dict"),
        }
    }
}

#[derive(Debug, Clone)]
pub struct Entry {
    name: String,
    default: Option<Value>,
    stored: Value,
    dirty: bool,
    kind: Option<BindingKind>,
}

impl Entry {
    /// Entry read from the backing file; clean until changed
    pub(crate) fn loaded(name: &str, value: Value) -> Self {
        Self {
            name: name.to_string(),
            default: None,
            stored: value,
            dirty: false,
            kind: None,
        }
    }

    /// Entry not yet on disk
    pub(crate) fn fresh(name: &str, value: Value) -> Self {
        Self {
            dirty: true,
            ..Self::loaded(name, value)
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn value(&self) -> &Value {
        &self.stored
    }

    pub fn default(&self) -> Option<&Value> {
        self.default.as_ref()
    }

    pub fn kind(&self) -> Option<BindingKind> {
        self.kind
    }

    /// Changed since the last successful flush
    pub fn is_dirty(&self) -> bool {
        self.dirty
    }

    pub(crate) fn bind(&mut self, kind: BindingKind, default: Value) {
        self.kind = Some(kind);
        self.default.get_or_insert(default);
    }

    pub(crate) fn unbind(&mut self) {
        self.kind = None;
    }

    pub(crate) fn set_kind(&mut self, kind: BindingKind) {
        self.kind = Some(kind);
    }

    /// Replace the stored value; returns the previous one
    pub(crate) fn replace(&mut self, value: Value) -> Value {
        if self.stored != value {
            self.dirty = true;
        }
        std::mem::replace(&mut self.stored, value)
    }

    /// Mutable access for in-place edits; always counts as a change
    pub(crate) fn value_mut(&mut self) -> &mut Value {
        self.dirty = true;
        &mut self.stored
    }

    /// Back to the registered default
    pub(crate) fn reset(&mut self) {
        if let Some(default) = &self.default {
            self.stored = default.clone();
            self.dirty = true;
        }
    }

    pub(crate) fn mark_clean(&mut self) {
        self.dirty = false;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_replace_marks_dirty_only_on_change() {
        let mut entry = Entry::loaded("x", Value::Int(1));
        entry.replace(Value::Int(1));
        assert!(!entry.is_dirty());
        let old = entry.replace(Value::Int(2));
        assert_eq!(old, Value::Int(1));
        assert!(entry.is_dirty());
    }

    #[test]
    fn test_bind_keeps_first_default() {
        let mut entry = Entry::fresh("x", Value::Int(0));
        entry.bind(BindingKind::Var, Value::Int(0));
        entry.bind(BindingKind::Var, Value::Int(9));
        assert_eq!(entry.default(), Some(&Value::Int(0)));
    }

    #[test]
    fn test_reset_restores_default() {
        let mut entry = Entry::loaded("x", Value::Int(5));
        entry.bind(BindingKind::Var, Value::Int(0));
        entry.mark_clean();
        entry.reset();
        assert_eq!(entry.value(), &Value::Int(0));
        assert!(entry.is_dirty());
    }
}
