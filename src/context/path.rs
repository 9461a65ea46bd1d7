//! Backing-file identity resolution

use std::env;
use std::fs;
use std::path::{Path, PathBuf};

use crate::error::{PvarsError, Result};

/// Extension of derived backing files
pub const EXTENSION: &str = "pdb";

/// Resolve the backing file for a context.
///
/// `abs_path` wins when given; a relative one is taken from the current
/// directory. Otherwise the file is named after the running executable and
/// placed in its directory, under `extra_path` if set. Missing parent
/// directories are created. The result is canonical so it can key contexts.
pub fn resolve(extra_path: Option<&Path>, abs_path: Option<&Path>) -> Result<PathBuf> {
    if let Some(path) = abs_path {
        let path = if path.is_absolute() {
            path.to_path_buf()
        } else {
            env::current_dir()?.join(path)
        };
        return canonical_file(&path);
    }

    let exe = env::current_exe()?;
    let file_name = derived_file_name(&exe)?;
    let dir = exe
        .parent()
        .ok_or_else(|| PvarsError::InvalidPath(exe.display().to_string()))?;
    let dir = match extra_path {
        Some(extra) => dir.join(extra),
        None => dir.to_path_buf(),
    };
    canonical_file(&dir.join(file_name))
}

/// `<stem>.pdb` for a program path
pub fn derived_file_name(program: &Path) -> Result<String> {
    program
        .file_stem()
        .map(|stem| format!("{}.{}", stem.to_string_lossy(), EXTENSION))
        .ok_or_else(|| PvarsError::InvalidPath(program.display().to_string()))
}

fn canonical_file(path: &Path) -> Result<PathBuf> {
    let name = path
        .file_name()
        .ok_or_else(|| PvarsError::InvalidPath(path.display().to_string()))?;
    let parent = match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent,
        _ => Path::new("."),
    };
    fs::create_dir_all(parent)?;
    Ok(parent.canonicalize()?.join(name))
}
