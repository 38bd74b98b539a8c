//! # bakrs TAR Archive Creation (`common::archive::tar`)
//!
//! File: cli/src/common/archive/tar.rs
//! Author: Christi Mahu
//! Repository: https://github.com/christimahu/bakrs
//!
//! ## Overview
//!
//! This module implements `backup`: it turns a source directory into a
//! gzipped tarball (`.tar.gz`) inside a destination directory.
//!
//! ## Architecture
//!
//! The module leverages the `tar` crate for building the archive structure and
//! the `flate2` crate for Gzip compression.
//!
//! - The source directory is walked with `walkdir` in sorted order, without
//!   following symlinks. Entries are rooted at the source's base name, so
//!   `/etc/myapp/conf.toml` is stored as `myapp/conf.toml`.
//! - Regular files are streamed through a `CancellableReader`, so a signal
//!   aborts even a long single-file copy. Directories and symlinks are added
//!   with their own metadata (symlinks keep their link target).
//! - The archive is written to a hidden `.partial` temporary file in the
//!   destination directory, optionally re-read for verification, fsynced, and
//!   then renamed to its final name with a no-clobber rename. Any failure drops
//!   the temporary file, which deletes it.
//!
//! ## Usage
//!
//! ```rust
//! let job = BackupJob::new(Path::new("/etc/myapp"), Path::new("/backups"))?;
//! let report = tar::backup(&job, &BackupOptions::default(), &CancelToken::new())?;
//! println!("Wrote {}", report.archive_path.display());
//! ```
//!
use crate::common::archive::job::{BackupJob, BackupReport};
use crate::common::archive::scan;
use crate::common::fs::io::{ensure_dir_exists, probe_writable};
use crate::common::process::CancelToken;
use crate::core::config::default_compression_level;
use crate::core::error::{BakError, Result};
use anyhow::{anyhow, bail};
use flate2::write::GzEncoder;
use flate2::Compression;
use std::fmt::Display;
use std::fs::{self, File};
use std::io::{self, BufWriter, Read, Write};
use std::os::unix::fs::FileTypeExt;
use std::path::Path;
use tracing::{debug, info, warn};
use walkdir::WalkDir;

const OPERATION: &str = "backup";

/// Tunables for a backup run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BackupOptions {
    /// Gzip level, 0-9.
    pub compression_level: u32,
    /// Re-read the finished archive before publishing it.
    pub verify: bool,
}

impl Default for BackupOptions {
    fn default() -> Self {
        Self {
            compression_level: default_compression_level(),
            verify: true,
        }
    }
}

/// # Create Backup Archive (`backup`)
///
/// Archives `job.source()` into `job.archive_path()`.
///
/// ## Errors
///
/// - `SourceNotFound` if the source is missing, not a directory, or unreadable.
/// - `DestinationNotWritable` if the destination cannot be created or written.
/// - `ArchiveCollision` if the final archive name already exists (checked
///   before writing and again by the no-clobber rename).
/// - `ToolFailure` if reading the source or writing/verifying the archive fails.
/// - `Interrupted` if `cancel` fires; the temporary file is removed.
pub fn backup(job: &BackupJob, options: &BackupOptions, cancel: &CancelToken) -> Result<BackupReport> {
    // 1. Preconditions: a readable source and a usable destination directory.
    check_source(job.source())?;
    prepare_destination(job.destination())?;

    // 2. Refuse early if the final name is taken (a dangling symlink counts too).
    let final_path = job.archive_path();
    if fs::symlink_metadata(&final_path).is_ok() {
        bail!(BakError::ArchiveCollision { path: final_path });
    }

    // 3. Hidden temporary file next to the final name, removed on drop unless persisted.
    let temp = tempfile::Builder::new()
        .prefix(&format!(".{}.", job.archive_name()))
        .suffix(".partial")
        .tempfile_in(job.destination())
        .map_err(|e| destination_error(job.destination(), e))?;
    debug!("Writing archive to temporary file {}", temp.path().display());

    info!(
        "Archiving {} into {}",
        job.source().display(),
        final_path.display()
    );
    // The destination may live inside the source tree; never archive ourselves.
    let in_progress = temp.path().canonicalize().ok();
    let entries = write_tar_gz(
        job,
        temp.as_file(),
        in_progress.as_deref(),
        options.compression_level,
        cancel,
    )?;

    // 4. Read the archive back before anyone can see it under its final name.
    if options.verify {
        verify_written_archive(temp.path(), entries, cancel)?;
    }
    if cancel.is_cancelled() {
        bail!(interrupted(entries));
    }

    // 5. Flush to disk, then publish with a rename that never replaces an existing file.
    temp.as_file()
        .sync_all()
        .map_err(|e| engine_error(e, entries, cancel))?;
    let bytes = temp
        .as_file()
        .metadata()
        .map_err(|e| engine_error(e, entries, cancel))?
        .len();

    temp.persist_noclobber(&final_path).map_err(|e| {
        if e.error.kind() == io::ErrorKind::AlreadyExists {
            anyhow!(BakError::ArchiveCollision {
                path: final_path.clone(),
            })
        } else {
            destination_error(job.destination(), e.error)
        }
    })?;

    info!(
        "Backup complete: {} ({} entries, {} bytes)",
        final_path.display(),
        entries,
        bytes
    );
    Ok(BackupReport {
        archive_path: final_path,
        entries,
        bytes,
    })
}

/// Streams the source tree as a gzipped tar into `file`; returns the entry count.
fn write_tar_gz(
    job: &BackupJob,
    file: &File,
    skip: Option<&Path>,
    level: u32,
    cancel: &CancelToken,
) -> Result<usize> {
    let encoder = GzEncoder::new(BufWriter::new(file), Compression::new(level));
    let mut tar_builder = tar::Builder::new(encoder);
    // Store symlinks as symlink entries rather than the files they point to.
    tar_builder.follow_symlinks(false);

    let root_name = Path::new(job.root_name());
    let mut entries = 0usize;

    // Sorted walk so the same tree always produces the same entry order.
    for item in WalkDir::new(job.source())
        .follow_links(false)
        .sort_by_file_name()
    {
        if cancel.is_cancelled() {
            bail!(interrupted(entries));
        }
        let item = item.map_err(|e| engine_error(e, entries, cancel))?;
        if skip == Some(item.path()) {
            continue;
        }
        // Entry names are rooted at the source's base name: `myapp/conf.d/x.toml`.
        let relative = item
            .path()
            .strip_prefix(job.source())
            .map_err(|e| engine_error(e, entries, cancel))?;
        let name = root_name.join(relative);

        let file_type = item.file_type();
        if file_type.is_file() {
            // Regular files are streamed through the cancel-aware reader.
            let metadata = item.metadata().map_err(|e| engine_error(e, entries, cancel))?;
            let mut header = tar::Header::new_gnu();
            header.set_metadata_in_mode(&metadata, tar::HeaderMode::Complete);
            let source_file = File::open(item.path()).map_err(|e| {
                engine_error(format!("{}: {}", item.path().display(), e), entries, cancel)
            })?;
            // Exactly the size recorded in the header, even if the file grows meanwhile.
            let data = cancel.reader(source_file).take(metadata.len());
            tar_builder
                .append_data(&mut header, &name, data)
                .map_err(|e| engine_error(e, entries, cancel))?;
        } else if file_type.is_socket() {
            // tar has no socket entry type.
            warn!("Skipping socket {}", item.path().display());
            continue;
        } else {
            // Directories, symlinks, FIFOs and devices: header only.
            tar_builder
                .append_path_with_name(item.path(), &name)
                .map_err(|e| engine_error(e, entries, cancel))?;
        }
        debug!("Added {}", name.display());
        entries += 1;
    }

    // Finalize the TAR structure, then the Gzip stream, then flush the buffer.
    let encoder = tar_builder
        .into_inner()
        .map_err(|e| engine_error(e, entries, cancel))?;
    let mut writer = encoder.finish().map_err(|e| engine_error(e, entries, cancel))?;
    writer.flush().map_err(|e| engine_error(e, entries, cancel))?;

    Ok(entries)
}

/// Re-reads the temporary archive and checks it holds every entry written.
fn verify_written_archive(path: &Path, expected: usize, cancel: &CancelToken) -> Result<()> {
    debug!("Verifying {}", path.display());
    let listing = scan::scan_archive(path, cancel).map_err(|e| {
        match e.downcast_ref::<BakError>() {
            Some(BakError::Interrupted { .. }) => e,
            _ => anyhow!(BakError::ToolFailure {
                operation: "backup verification".into(),
                output: format!("{:#}", e),
                extracted: 0,
            }),
        }
    })?;
    if listing.entries.len() != expected {
        bail!(BakError::ToolFailure {
            operation: "backup verification".into(),
            output: format!(
                "archive holds {} entries but {} were written",
                listing.entries.len(),
                expected
            ),
            extracted: 0,
        });
    }
    Ok(())
}

fn check_source(source: &Path) -> Result<()> {
    let readable = source.is_dir() && fs::read_dir(source).is_ok();
    if !readable {
        bail!(BakError::SourceNotFound {
            path: source.to_path_buf(),
        });
    }
    Ok(())
}

fn prepare_destination(destination: &Path) -> Result<()> {
    ensure_dir_exists(destination).map_err(|e| destination_error(destination, format!("{:#}", e)))?;
    probe_writable(destination).map_err(|e| destination_error(destination, e))
}

fn destination_error(destination: &Path, reason: impl Display) -> anyhow::Error {
    anyhow!(BakError::DestinationNotWritable {
        path: destination.to_path_buf(),
        reason: reason.to_string(),
    })
}

fn interrupted(completed: usize) -> BakError {
    BakError::Interrupted {
        operation: OPERATION.into(),
        completed,
    }
}

/// Wraps an archive engine error, unless it was caused by cancellation.
fn engine_error(err: impl Display, completed: usize, cancel: &CancelToken) -> anyhow::Error {
    if cancel.is_cancelled() {
        anyhow!(interrupted(completed))
    } else {
        anyhow!(BakError::ToolFailure {
            operation: OPERATION.into(),
            output: err.to_string(),
            extracted: 0,
        })
    }
}
