//! # bakrs Archive Validation Pass (`common::archive::scan`)
//!
//! File: cli/src/common/archive/scan.rs
//! Author: Christi Mahu
//! Repository: https://github.com/christimahu/bakrs
//!
//! ## Overview
//!
//! Reads a `.tar.gz` archive from start to finish without writing anything and
//! returns a listing of its entries. The scan is the integrity and safety gate
//! in front of every restore, the body of `bakrs list`, and the verification
//! step of `bakrs backup`.
//!
//! A scan fails with:
//! - `ArchiveNotFound` if the archive is missing or not a regular file.
//! - `ArchiveCorrupt` if the gzip stream or any tar header is invalid,
//!   including a truncated stream or bad gzip trailer (the decoder is drained
//!   to EOF so the CRC is checked).
//! - `PathTraversalRejected` for the first entry whose path (or hard-link
//!   target) is absolute, contains `..`, or descends through a symlink entry
//!   recorded earlier in the same archive.
//!
use crate::common::fs::paths::{descends_from, sanitize_entry_path, sanitize_link_target};
use crate::common::process::{CancelToken, CancellableReader};
use crate::core::error::{BakError, Result};
use anyhow::{anyhow, bail};
use chrono::{DateTime, Local};
use flate2::read::GzDecoder;
use std::fmt;
use std::fs::File;
use std::io::{self, BufReader};
use std::path::{Path, PathBuf};
use tar::EntryType;
use tracing::debug;

/// Coarse entry type shown in listings.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EntryKind {
    File,
    Directory,
    Symlink,
    HardLink,
    Other,
}

impl EntryKind {
    fn from_entry_type(entry_type: EntryType) -> Self {
        if entry_type.is_dir() {
            EntryKind::Directory
        } else if entry_type.is_symlink() {
            EntryKind::Symlink
        } else if entry_type.is_hard_link() {
            EntryKind::HardLink
        } else if entry_type.is_file() {
            EntryKind::File
        } else {
            EntryKind::Other
        }
    }

    /// Single-character marker in the style of `ls -l`.
    pub fn marker(self) -> char {
        match self {
            EntryKind::File => '-',
            EntryKind::Directory => 'd',
            EntryKind::Symlink => 'l',
            EntryKind::HardLink => 'h',
            EntryKind::Other => '?',
        }
    }
}

/// One validated archive entry.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EntrySummary {
    /// Sanitized relative path.
    pub path: PathBuf,
    pub kind: EntryKind,
    pub size: u64,
    pub mode: u32,
    /// Seconds since the Unix epoch.
    pub mtime: u64,
    /// Symlink or hard-link target, as recorded.
    pub link_target: Option<PathBuf>,
}

impl fmt::Display for EntrySummary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let modified = i64::try_from(self.mtime)
            .ok()
            .and_then(|secs| DateTime::from_timestamp(secs, 0))
            .map(|utc| utc.with_timezone(&Local).format("%Y-%m-%d %H:%M").to_string())
            .unwrap_or_else(|| "-".to_string());
        write!(
            f,
            "{} {:04o} {:>12} {} {}",
            self.kind.marker(),
            self.mode & 0o7777,
            self.size,
            modified,
            self.path.display()
        )?;
        if let Some(target) = &self.link_target {
            write!(f, " -> {}", target.display())?;
        }
        Ok(())
    }
}

/// All entries of an archive, in archive order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ArchiveListing {
    pub entries: Vec<EntrySummary>,
}

impl ArchiveListing {
    /// Sum of regular file sizes.
    pub fn total_bytes(&self) -> u64 {
        self.entries
            .iter()
            .filter(|entry| entry.kind == EntryKind::File)
            .map(|entry| entry.size)
            .sum()
    }

    pub fn count(&self, kind: EntryKind) -> usize {
        self.entries.iter().filter(|entry| entry.kind == kind).count()
    }
}

/// Opens `path` for reading, mapping every failure to `ArchiveNotFound`.
pub fn open_archive(path: &Path) -> Result<File> {
    let not_found = || {
        anyhow!(BakError::ArchiveNotFound {
            path: path.to_path_buf(),
        })
    };
    if !path.is_file() {
        return Err(not_found());
    }
    File::open(path).map_err(|_| not_found())
}

/// Gzip + tar reader stack used for every archive read.
pub type ArchiveReader = tar::Archive<GzDecoder<BufReader<CancellableReader<File>>>>;

/// Builds an [`ArchiveReader`] over `file` that stops reading once `cancel` fires.
pub fn archive_reader(file: File, cancel: &CancelToken) -> ArchiveReader {
    tar::Archive::new(GzDecoder::new(BufReader::new(cancel.reader(file))))
}

/// Validates every entry of `path` and returns the listing.
pub fn scan_archive(path: &Path, cancel: &CancelToken) -> Result<ArchiveListing> {
    let file = open_archive(path)?;
    let mut archive = archive_reader(file, cancel);
    let mut listing = ArchiveListing::default();
    let mut symlinks: Vec<PathBuf> = Vec::new();

    let corrupt = |err: io::Error, seen: usize| -> anyhow::Error {
        if cancel.is_cancelled() {
            anyhow!(BakError::Interrupted {
                operation: "archive scan".into(),
                completed: seen,
            })
        } else {
            anyhow!(BakError::ArchiveCorrupt {
                path: path.to_path_buf(),
                reason: err.to_string(),
                extracted: 0,
            })
        }
    };

    for entry in archive.entries().map_err(|e| corrupt(e, 0))? {
        let seen = listing.entries.len();
        if cancel.is_cancelled() {
            bail!(BakError::Interrupted {
                operation: "archive scan".into(),
                completed: seen,
            });
        }
        let entry = entry.map_err(|e| corrupt(e, seen))?;
        let raw_path = entry.path().map_err(|e| corrupt(e, seen))?.into_owned();
        // Lexical check first: no absolute paths, no `..`.
        let clean = sanitize_entry_path(&raw_path).ok_or_else(|| traversal(&raw_path))?;
        // Then the ladder check against symlinks this archive already created.
        if symlinks.iter().any(|link| descends_from(&clean, link)) {
            return Err(traversal(&raw_path));
        }

        let header = entry.header();
        let kind = EntryKind::from_entry_type(header.entry_type());
        let link_target = entry
            .link_name()
            .map_err(|e| corrupt(e, seen))?
            .map(|target| target.into_owned());

        match kind {
            EntryKind::Symlink => symlinks.push(clean.clone()),
            // Unpacking a directory over an earlier symlink would go through the link.
            EntryKind::Directory if symlinks.contains(&clean) => {
                return Err(traversal(&raw_path));
            }
            EntryKind::HardLink => {
                let target = link_target
                    .as_deref()
                    .and_then(sanitize_link_target)
                    .ok_or_else(|| traversal(&raw_path))?;
                if symlinks.iter().any(|link| descends_from(&target, link)) {
                    return Err(traversal(&raw_path));
                }
            }
            _ => {}
        }

        let summary = EntrySummary {
            path: clean,
            kind,
            size: entry.size(),
            mode: header.mode().map_err(|e| corrupt(e, seen))?,
            mtime: header.mtime().map_err(|e| corrupt(e, seen))?,
            link_target,
        };
        debug!("Scanned {}", summary.path.display());
        listing.entries.push(summary);
    }

    // Drain the decoder so a truncated stream or bad gzip trailer is detected.
    let seen = listing.entries.len();
    let mut decoder = archive.into_inner();
    io::copy(&mut decoder, &mut io::sink()).map_err(|e| corrupt(e, seen))?;

    debug!("Archive {} holds {} entries", path.display(), seen);
    Ok(listing)
}

fn traversal(raw_path: &Path) -> anyhow::Error {
    anyhow!(BakError::PathTraversalRejected {
        entry: raw_path.display().to_string(),
    })
}
