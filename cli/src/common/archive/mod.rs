//! # bakrs Archive Module (`common::archive`)
//!
//! File: cli/src/common/archive/mod.rs
//! Author: Christi Mahu
//! Repository: https://github.com/christimahu/bakrs
//!
//! ## Overview
//!
//! Everything bakrs does with `.tar.gz` archives lives here:
//!
//! - **`job`**: `BackupJob` / `RestoreJob` descriptions, archive naming, and the
//!   reports returned to the command layer.
//! - **`tar`**: Creating an archive from a directory tree, written atomically.
//! - **`scan`**: Reading an archive without extracting it. Used by `list`, by
//!   backup verification, and as the validation pass of restore.
//! - **`extract`**: Restoring an archive into a target directory.
//!
//! All operations are synchronous and take a `CancelToken`; the command layer
//! runs them on a blocking thread via `common::process::run_cancellable`.
//!
//! ```rust,ignore
//! use crate::common::archive::{job::BackupJob, tar};
//! use crate::common::process::CancelToken;
//!
//! let job = BackupJob::new(Path::new("/etc/myapp"), Path::new("/backups"))?;
//! let report = tar::backup(&job, &tar::BackupOptions::default(), &CancelToken::new())?;
//! println!("{}", report.archive_path.display());
//! ```
//!

pub mod extract;
pub mod job;
pub mod scan;
pub mod tar;
