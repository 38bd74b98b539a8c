//! # bakrs Filesystem I/O Operations
//!
//! File: cli/src/common/fs/io.rs
//! Author: Christi Mahu
//! Repository: https://github.com/christimahu/bakrs
//!
//! ## Overview
//!
//! Small wrappers around `std::fs` used for precondition checks before any
//! archive is written or extracted:
//! - **`ensure_dir_exists`**: Creates a directory (and parents) if missing and
//!   rejects paths that exist but are not directories.
//! - **`probe_writable`**: Proves a directory accepts new files by creating an
//!   anonymous temporary file in it.
//! - **`base_name`**: The final path component used to name archives.
//!
use crate::core::error::Result;
use anyhow::{bail, Context};
use std::fs;
use std::io;
use std::path::Path;
use tracing::{debug, info};

/// Ensures that a directory exists at the specified path.
///
/// If the path does not exist, this function attempts to create the directory,
/// including any necessary parent directories (similar to `mkdir -p`).
///
/// # Errors
///
/// Returns an `Err` if:
/// - The path exists but is not a directory.
/// - Creating the directory fails (e.g., due to permissions).
pub fn ensure_dir_exists(path: &Path) -> Result<()> {
    // Check if the path exists first; create the whole chain if not.
    if !path.exists() {
        fs::create_dir_all(path)
            .with_context(|| format!("Failed to create directory {:?}", path))?;
        info!("Created directory: {:?}", path);
    } else if !path.is_dir() {
        // Something else (a file, a socket) is in the way.
        bail!("Path exists but is not a directory: {:?}", path);
    } else {
        debug!("Directory already exists: {:?}", path);
    }
    Ok(())
}

/// Checks that new files can be created inside `dir`.
///
/// Permission bits alone are not conclusive (read-only mounts, ACLs, root),
/// so this creates an unnamed temporary file which the OS removes on close.
pub fn probe_writable(dir: &Path) -> io::Result<()> {
    tempfile::tempfile_in(dir).map(drop)
}

/// Returns the last component of `path` as a string, ignoring trailing slashes.
///
/// Returns `None` for paths such as `/` or `..` that have no usable name.
pub fn base_name(path: &Path) -> Option<String> {
    path.file_name()
        .map(|name| name.to_string_lossy().into_owned())
        .filter(|name| !name.is_empty())
}

// --- Unit Tests ---
#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;
    use tempfile::tempdir;

    #[test]
    fn test_ensure_dir_exists_creates_new() -> Result<()> {
        let base_dir = tempdir()?;
        let new_dir = base_dir.path().join("new/subdir");
        assert!(!new_dir.exists());
        ensure_dir_exists(&new_dir)?;
        assert!(new_dir.is_dir());
        Ok(())
    }

    #[test]
    fn test_ensure_dir_exists_already_exists() -> Result<()> {
        let base_dir = tempdir()?;
        let existing_dir = base_dir.path().join("existing");
        fs::create_dir(&existing_dir)?;
        ensure_dir_exists(&existing_dir)?;
        assert!(existing_dir.is_dir());
        Ok(())
    }

    #[test]
    fn test_ensure_dir_exists_path_is_file() -> Result<()> {
        let base_dir = tempdir()?;
        let file_path = base_dir.path().join("a_file.txt");
        fs::write(&file_path, "hello")?;
        let result = ensure_dir_exists(&file_path);
        assert!(result
            .unwrap_err()
            .to_string()
            .contains("Path exists but is not a directory"));
        Ok(())
    }

    #[test]
    fn test_probe_writable_leaves_no_files() -> Result<()> {
        let base_dir = tempdir()?;
        probe_writable(base_dir.path())?;
        assert_eq!(fs::read_dir(base_dir.path())?.count(), 0);
        Ok(())
    }

    #[test]
    fn test_probe_writable_missing_dir_fails() {
        let base_dir = tempdir().unwrap();
        assert!(probe_writable(&base_dir.path().join("missing")).is_err());
    }

    #[test]
    fn test_base_name() {
        assert_eq!(base_name(Path::new("/etc/myapp")), Some("myapp".into()));
        assert_eq!(base_name(&PathBuf::from("/etc/myapp/")), Some("myapp".into()));
        assert_eq!(base_name(Path::new("/")), None);
    }
}
