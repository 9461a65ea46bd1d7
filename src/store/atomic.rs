//! Atomic replacement of a backing file
//!
//! Bytes go to a temporary sibling of the target, are synced, and the
//! temporary is renamed over the target. A failure at any step removes the
//! temporary and leaves the previous content in place.

use std::io::{self, Write};
use std::path::Path;

/// Atomically replace `path` with `bytes`
pub fn write(path: &Path, bytes: &[u8]) -> io::Result<()> {
    write_with_hook(path, bytes, |_| Ok(()))
}

/// Like [`write`], calling `before_commit` with the temporary path after the
/// data is durable and before the rename. An error from the hook aborts the
/// commit.
pub fn write_with_hook<F>(path: &Path, bytes: &[u8], before_commit: F) -> io::Result<()>
where
    F: FnOnce(&Path) -> io::Result<()>,
{
    let dir = match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent,
        _ => Path::new("."),
    };
    let prefix = format!(
        ".{}.",
        path.file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| "pvars".to_string())
    );

    let mut tmp = tempfile::Builder::new()
        .prefix(&prefix)
        .suffix(".tmp")
        .tempfile_in(dir)?;
    tmp.write_all(bytes)?;
    tmp.as_file().sync_all()?;

    before_commit(tmp.path())?;

    tmp.persist(path).map_err(|e| e.error)?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    #[test]
    fn test_write_creates_and_replaces() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("state.pdb");

        write(&path, b"first").unwrap();
        assert_eq!(fs::read(&path).unwrap(), b"first");
        write(&path, b"second").unwrap();
        assert_eq!(fs::read(&path).unwrap(), b"second");
    }

    #[test]
    fn test_failed_commit_keeps_previous_content() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("state.pdb");
        write(&path, b"durable").unwrap();

        let result = write_with_hook(&path, b"torn", |tmp| {
            assert!(tmp.exists());
            Err(io::Error::new(io::ErrorKind::Other, "simulated crash"))
        });

        assert!(result.is_err());
        assert_eq!(fs::read(&path).unwrap(), b"durable");
        // Only the target remains; the temporary was cleaned up
        assert_eq!(fs::read_dir(dir.path()).unwrap().count(), 1);
    }

    #[test]
    fn test_write_into_subdirectory() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("nested");
        fs::create_dir(&path).unwrap();
        let target = path.join("x.pdb");
        write(&target, b"ok").unwrap();
        assert!(target.exists());
    }
}
