//! Error types for pvars

use std::path::PathBuf;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum PvarsError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Cannot decode {}: {reason}", path.display())]
    DecodeFailure { path: PathBuf, reason: String },

    #[error("Encode error: {0}")]
    EncodeFailure(String),

    #[error("Value not representable as {format}: {reason}")]
    UnrepresentableValue { format: String, reason: String },

    #[error("Name '{0}' is already bound in this store")]
    NameCollision(String),

    #[error("Entry '{name}' holds {found}, expected {expected}")]
    TypeMismatch {
        name: String,
        expected: &'static str,
        found: &'static str,
    },

    #[error("Cannot convert stored value: {0}")]
    Conversion(String),

    #[error("Cannot configure {}: the store has already been flushed", .0.display())]
    ConfigurationAfterUse(PathBuf),

    #[error("Invalid path: {0}")]
    InvalidPath(String),

    #[error("Lifecycle hook error: {0}")]
    Hook(String),
}

impl PvarsError {
    pub(crate) fn unrepresentable(format: impl Into<String>, reason: impl Into<String>) -> Self {
        PvarsError::UnrepresentableValue {
            format: format.into(),
            reason: reason.into(),
        }
    }
}

pub type Result<T> = std::result::Result<T, PvarsError>;
