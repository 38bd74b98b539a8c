//! # bakrs Archive Jobs (`common::archive::job`)
//!
//! File: cli/src/common/archive/job.rs
//! Author: Christi Mahu
//! Repository: https://github.com/christimahu/bakrs
//!
//! ## Overview
//!
//! Immutable descriptions of a single backup or restore request, plus the
//! reports each operation returns. A job is built once per invocation from
//! validated CLI/config values and dropped when the operation finishes.
//!
//! Archive names follow `<basename(source)>-<YYYYMMDD-HHMMSS>.tar.gz`, where the
//! timestamp is captured when the job is created.
//!
use crate::common::fs::io::base_name;
use crate::core::error::{BakError, Result};
use anyhow::anyhow;
use chrono::{Local, NaiveDateTime};
use std::path::{Path, PathBuf};

/// `strftime` pattern for the timestamp embedded in archive names.
pub const TIMESTAMP_FORMAT: &str = "%Y%m%d-%H%M%S";
/// Extension of every archive bakrs produces.
pub const ARCHIVE_EXTENSION: &str = "tar.gz";

/// A request to archive `source` into `destination`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BackupJob {
    source: PathBuf,
    destination: PathBuf,
    root_name: String,
    timestamp: String,
}

impl BackupJob {
    /// Creates a job stamped with the current local time.
    pub fn new(source: &Path, destination: &Path) -> Result<Self> {
        Self::at(source, destination, Local::now().naive_local())
    }

    /// Creates a job stamped with `captured_at`.
    ///
    /// `source` is canonicalized so that `.` or a trailing `/` still yield the
    /// directory's real name; a missing source is `SourceNotFound`.
    pub fn at(source: &Path, destination: &Path, captured_at: NaiveDateTime) -> Result<Self> {
        let canonical = source.canonicalize().map_err(|_| {
            anyhow!(BakError::SourceNotFound {
                path: source.to_path_buf(),
            })
        })?;
        let root_name = base_name(&canonical).ok_or_else(|| {
            anyhow!(BakError::SourceNotFound {
                path: source.to_path_buf(),
            })
        })?;
        Ok(Self {
            source: canonical,
            destination: destination.to_path_buf(),
            root_name,
            timestamp: format_timestamp(captured_at),
        })
    }

    pub fn source(&self) -> &Path {
        &self.source
    }

    pub fn destination(&self) -> &Path {
        &self.destination
    }

    /// Top-level directory name inside the archive.
    pub fn root_name(&self) -> &str {
        &self.root_name
    }

    pub fn archive_name(&self) -> String {
        format!("{}-{}.{}", self.root_name, self.timestamp, ARCHIVE_EXTENSION)
    }

    /// Final location of the archive.
    pub fn archive_path(&self) -> PathBuf {
        self.destination.join(self.archive_name())
    }
}

/// A request to extract `archive` into `target`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RestoreJob {
    pub archive: PathBuf,
    pub target: PathBuf,
}

impl RestoreJob {
    pub fn new(archive: &Path, target: &Path) -> Self {
        Self {
            archive: archive.to_path_buf(),
            target: target.to_path_buf(),
        }
    }
}

/// Outcome of a successful backup.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BackupReport {
    pub archive_path: PathBuf,
    /// Number of entries written (directories, files, symlinks).
    pub entries: usize,
    /// Size of the finished archive in bytes.
    pub bytes: u64,
}

/// Outcome of a successful restore.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RestoreReport {
    pub target: PathBuf,
    /// Number of entries extracted.
    pub extracted: usize,
}

pub fn format_timestamp(captured_at: NaiveDateTime) -> String {
    captured_at.format(TIMESTAMP_FORMAT).to_string()
}
