//! # bakrs Archive Extraction (`common::archive::extract`)
//!
//! File: cli/src/common/archive/extract.rs
//! Author: Christi Mahu
//! Repository: https://github.com/christimahu/bakrs
//!
//! ## Overview
//!
//! This module implements `restore`: extracting a `.tar.gz` produced by
//! `bakrs backup` (or any compatible tool) into a target directory without
//! ever writing outside it.
//!
//! ## Architecture
//!
//! Restore is two passes over the archive:
//!
//! 1. **Validation** (`scan::scan_archive`): headers, gzip CRC, and every entry
//!    path are checked before the target is created or touched. A single unsafe
//!    entry rejects the whole archive.
//! 2. **Extraction**: entries are unpacked one by one with `Entry::unpack_in`.
//!    Before each entry the deepest existing ancestor of its destination is
//!    canonicalized and must still lie inside the target, which catches
//!    symlinks that were already present in the target directory. Directory
//!    entries are unpacked last so their modes and mtimes stick.
//!
//! Files in the target that the archive does not mention are left alone.
//! Permissions and mtimes are always restored; ownership only when running as
//! root.
//!
use crate::common::archive::job::{RestoreJob, RestoreReport};
use crate::common::archive::scan::{self, ArchiveListing, EntryKind};
use crate::common::fs::io::{ensure_dir_exists, probe_writable};
use crate::common::fs::paths::sanitize_entry_path;
use crate::common::process::CancelToken;
use crate::core::error::{BakError, Result};
use anyhow::{anyhow, bail};
use std::fmt::Display;
use std::fs::{self, File};
use std::io::Read;
use std::path::{Path, PathBuf};
use std::time::{Duration, SystemTime};
use tracing::{debug, info, warn};

const OPERATION: &str = "restore";

/// # Restore Archive (`restore`)
///
/// Extracts `job.archive` into `job.target` and returns how many entries were
/// extracted.
///
/// ## Errors
///
/// - `ArchiveNotFound`, `ArchiveCorrupt`, `PathTraversalRejected` from the
///   validation pass (nothing written).
/// - `TargetNotWritable` if the target cannot be created or written.
/// - `PathTraversalRejected` during extraction if an existing symlink in the
///   target would redirect an entry outside it.
/// - `ArchiveCorrupt` / `ToolFailure` / `Interrupted` during extraction, each
///   carrying the number of entries already extracted.
pub fn restore(job: &RestoreJob, cancel: &CancelToken) -> Result<RestoreReport> {
    // 1. Validate everything before the target is created.
    info!("Validating archive {}", job.archive.display());
    let listing = scan::scan_archive(&job.archive, cancel)?;

    // 2. Create the target and resolve it once; every check below compares against this.
    prepare_target(&job.target)?;
    let root = job
        .target
        .canonicalize()
        .map_err(|e| target_error(&job.target, e))?;
    // 3. Symlinks already in the target must not redirect any entry.
    check_existing_links(&root, &listing)?;

    info!(
        "Extracting {} entries from {} into {}",
        listing.entries.len(),
        job.archive.display(),
        root.display()
    );
    // 4. Second read of the archive, this time writing.
    let extracted = extract_entries(&job.archive, &root, cancel)?;
    if extracted != listing.entries.len() {
        warn!(
            "Archive changed during restore: validated {} entries, extracted {}",
            listing.entries.len(),
            extracted
        );
    }

    info!("Restore complete: {} entries into {}", extracted, root.display());
    Ok(RestoreReport {
        target: root,
        extracted,
    })
}

/// Second pass: unpack each entry under `root` (already canonical).
///
/// Directory entries are held back and unpacked last, deepest first, so their
/// permissions cannot block writing their children and their mtimes are not
/// disturbed afterwards.
fn extract_entries(archive_path: &Path, root: &Path, cancel: &CancelToken) -> Result<usize> {
    let file = scan::open_archive(archive_path)?;
    let mut archive = scan::archive_reader(file, cancel);
    archive.set_preserve_permissions(true);
    archive.set_preserve_mtime(true);
    archive.set_overwrite(true);
    archive.set_unpack_xattrs(false);
    archive.set_preserve_ownerships(nix::unistd::geteuid().is_root());

    let mut extracted = 0usize;
    let mut directories = Vec::new();

    let entries = archive
        .entries()
        .map_err(|e| corrupt(archive_path, e, 0, cancel))?;
    for entry in entries {
        if cancel.is_cancelled() {
            bail!(interrupted(extracted));
        }
        let mut entry = entry.map_err(|e| corrupt(archive_path, e, extracted, cancel))?;
        let (raw_path, clean) = checked_path(&entry, archive_path, root, extracted, cancel)?;

        if entry.header().entry_type().is_dir() {
            // tar will not unpack a directory onto a symlink, and neither do we.
            if is_symlink(&root.join(&clean)) {
                return Err(traversal(&raw_path));
            }
            directories.push((clean, entry));
            continue;
        }
        remove_stale_symlink(&root.join(&clean))
            .map_err(|e| engine_error(e, extracted, cancel))?;
        unpack_one(&mut entry, root, &raw_path, extracted, cancel)?;
        debug!("Extracted {}", clean.display());
        extracted += 1;
    }

    // Deepest first, so a parent's mtime is set after its children are done.
    directories.sort_by(|a, b| b.0.cmp(&a.0));
    for (clean, mut entry) in directories {
        if cancel.is_cancelled() {
            bail!(interrupted(extracted));
        }
        let (raw_path, _) = checked_path(&entry, archive_path, root, extracted, cancel)?;
        unpack_one(&mut entry, root, &raw_path, extracted, cancel)?;
        if let Ok(mtime) = entry.header().mtime() {
            if let Err(e) = set_dir_mtime(&root.join(&clean), mtime) {
                warn!("Could not restore mtime of {}: {}", clean.display(), e);
            }
        }
        debug!("Extracted directory {}", clean.display());
        extracted += 1;
    }

    Ok(extracted)
}

/// Returns the entry's raw and sanitized paths once its destination is known
/// to stay inside `root`.
fn checked_path<R: Read>(
    entry: &tar::Entry<'_, R>,
    archive_path: &Path,
    root: &Path,
    extracted: usize,
    cancel: &CancelToken,
) -> Result<(PathBuf, PathBuf)> {
    let raw_path = entry
        .path()
        .map_err(|e| corrupt(archive_path, e, extracted, cancel))?
        .into_owned();
    let clean = sanitize_entry_path(&raw_path).ok_or_else(|| traversal(&raw_path))?;
    ensure_within(root, &clean).map_err(|_| traversal(&raw_path))?;
    Ok((raw_path, clean))
}

fn unpack_one<R: Read>(
    entry: &mut tar::Entry<'_, R>,
    root: &Path,
    raw_path: &Path,
    extracted: usize,
    cancel: &CancelToken,
) -> Result<()> {
    match entry.unpack_in(root) {
        Ok(true) => Ok(()),
        Ok(false) => Err(traversal(raw_path)),
        Err(e) => Err(engine_error(e, extracted, cancel)),
    }
}

fn prepare_target(target: &Path) -> Result<()> {
    ensure_dir_exists(target).map_err(|e| target_error(target, format!("{:#}", e)))?;
    probe_writable(target).map_err(|e| target_error(target, e))
}

/// Rejects the archive up front if any entry's parent already resolves outside
/// `root`, or a directory entry would land on an existing symlink.
fn check_existing_links(root: &Path, listing: &ArchiveListing) -> Result<()> {
    for entry in &listing.entries {
        ensure_within(root, &entry.path).map_err(|_| traversal(&entry.path))?;
        if entry.kind == EntryKind::Directory && is_symlink(&root.join(&entry.path)) {
            return Err(traversal(&entry.path));
        }
    }
    Ok(())
}

fn is_symlink(path: &Path) -> bool {
    fs::symlink_metadata(path).is_ok_and(|meta| meta.file_type().is_symlink())
}

/// Checks that the deepest existing ancestor of `root/clean`'s parent
/// canonicalizes to a path inside `root`.
fn ensure_within(root: &Path, clean: &Path) -> std::result::Result<(), PathBuf> {
    let Some(parent) = clean.parent() else {
        return Ok(());
    };
    let mut probe = root.join(parent);
    loop {
        if let Ok(resolved) = probe.canonicalize() {
            return if resolved.starts_with(root) {
                Ok(())
            } else {
                Err(resolved)
            };
        }
        if !probe.pop() || !probe.starts_with(root) {
            return Ok(());
        }
    }
}

/// An existing symlink at a file's destination is replaced, never written through.
fn remove_stale_symlink(destination: &Path) -> std::io::Result<()> {
    if is_symlink(destination) {
        debug!("Replacing existing symlink {}", destination.display());
        fs::remove_file(destination)?;
    }
    Ok(())
}

fn set_dir_mtime(dir: &Path, mtime: u64) -> std::io::Result<()> {
    let modified = SystemTime::UNIX_EPOCH + Duration::from_secs(mtime);
    File::open(dir)?.set_modified(modified)
}

fn target_error(target: &Path, reason: impl Display) -> anyhow::Error {
    anyhow!(BakError::TargetNotWritable {
        path: target.to_path_buf(),
        reason: reason.to_string(),
    })
}

fn traversal(raw_path: &Path) -> anyhow::Error {
    anyhow!(BakError::PathTraversalRejected {
        entry: raw_path.display().to_string(),
    })
}

fn interrupted(completed: usize) -> BakError {
    BakError::Interrupted {
        operation: OPERATION.into(),
        completed,
    }
}

fn corrupt(archive_path: &Path, err: impl Display, extracted: usize, cancel: &CancelToken) -> anyhow::Error {
    if cancel.is_cancelled() {
        anyhow!(interrupted(extracted))
    } else {
        anyhow!(BakError::ArchiveCorrupt {
            path: archive_path.to_path_buf(),
            reason: err.to_string(),
            extracted,
        })
    }
}

fn engine_error(err: impl Display, extracted: usize, cancel: &CancelToken) -> anyhow::Error {
    if cancel.is_cancelled() {
        anyhow!(interrupted(extracted))
    } else {
        anyhow!(BakError::ToolFailure {
            operation: OPERATION.into(),
            output: err.to_string(),
            extracted,
        })
    }
}
