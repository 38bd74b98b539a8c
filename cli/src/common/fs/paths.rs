//! # bakrs Archive Entry Path Safety
//!
//! File: cli/src/common/fs/paths.rs
//! Author: Christi Mahu
//! Repository: https://github.com/christimahu/bakrs
//!
//! ## Overview
//!
//! Archive entries carry paths chosen by whoever produced the archive. Before
//! anything is extracted, each path is reduced to a plain relative path made of
//! normal components. Anything that could point outside the restore target is
//! refused outright:
//!
//! - absolute paths (`/etc/passwd`) and Windows prefixes (`C:\`)
//! - any `..` component, even one that would stay inside after normalization
//! - embedded NUL bytes
//!
//! `.` components are dropped, so `./myapp/file` and `myapp/file` are the same
//! entry.
//!
use std::path::{Component, Path, PathBuf};

/// Returns the normalized relative form of an archive entry path, or `None`
/// if the path could escape the directory it is extracted into.
pub fn sanitize_entry_path(raw: &Path) -> Option<PathBuf> {
    let mut clean = PathBuf::new();
    for component in raw.components() {
        match component {
            Component::Normal(part) => {
                if part.to_string_lossy().contains('\0') {
                    return None;
                }
                clean.push(part);
            }
            Component::CurDir => continue,
            Component::ParentDir | Component::RootDir | Component::Prefix(_) => return None,
        }
    }
    Some(clean)
}

/// Resolves a hard-link target recorded in the archive against the target root.
///
/// Hard-link names in tar are relative to the archive root, not to the link's
/// own directory, so the same rules as entry paths apply.
pub fn sanitize_link_target(raw: &Path) -> Option<PathBuf> {
    sanitize_entry_path(raw).filter(|clean| !clean.as_os_str().is_empty())
}

/// True if `path` lies strictly below `ancestor` (both already sanitized).
pub fn descends_from(path: &Path, ancestor: &Path) -> bool {
    path != ancestor && path.starts_with(ancestor)
}
