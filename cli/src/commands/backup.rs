//! # bakrs Backup Command (`commands::backup`)
//!
//! File: cli/src/commands/backup.rs
//! Author: Christi Mahu
//! Repository: https://github.com/christimahu/bakrs
//!
//! ## Overview
//!
//! Implements `bakrs backup`, which archives a source directory into
//! `<dest>/<name>-<YYYYMMDD-HHMMSS>.tar.gz`.
//!
//! ## Usage
//!
//! ```bash
//! bakrs backup --source /etc/myapp --dest /var/backups
//! bakrs backup --source . --level 9 --no-verify   # dest from config
//! ```
//!
//! On success the archive path is printed on stdout, so scripts can capture it.
//!
use crate::{
    common::{
        archive::{
            job::BackupJob,
            tar::{self, BackupOptions},
        },
        process::{run_cancellable, CancelToken},
    },
    core::{
        config::Config,
        error::{BakError, Result},
    },
};
use anyhow::anyhow;
use clap::Parser;
use std::path::PathBuf;
use tracing::{debug, info};

/// Arguments for `bakrs backup`.
#[derive(Parser, Debug)]
#[command(about = "Archive a directory into a timestamped .tar.gz")]
pub struct BackupArgs {
    /// Directory to back up. Its base name becomes the archive's top-level entry.
    #[arg(long, short)]
    source: PathBuf,

    /// Directory that receives the archive. Created if missing.
    /// Required unless `backup.destination` is configured.
    #[arg(long, short)]
    dest: Option<PathBuf>,

    /// gzip compression level, 0 (store) to 9 (smallest). Overrides `backup.compression_level`.
    #[arg(long, value_parser = clap::value_parser!(u32).range(0..=9))]
    level: Option<u32>,

    /// Skip re-reading the finished archive before it is moved into place.
    #[arg(long)]
    no_verify: bool,
}

/// # Handle Backup Command (`handle_backup`)
///
/// Resolves the destination (flag, then config), builds a `BackupJob`
/// stamped with the current local time, and runs `tar::backup` on the blocking
/// pool. SIGINT/SIGTERM cancel the job and remove the partial archive.
///
/// ## Errors
///
/// `BakError::Config` when no destination is known; otherwise whatever
/// `tar::backup` returns.
pub async fn handle_backup(args: BackupArgs, cfg: &Config) -> Result<()> {
    debug!("Backup args: {:?}", args);

    let destination = resolve_destination(&args, cfg)?;
    let options = BackupOptions {
        compression_level: args.level.unwrap_or(cfg.backup.compression_level),
        verify: cfg.backup.verify && !args.no_verify,
    };
    let job = BackupJob::new(&args.source, &destination)?;
    info!(
        "Backing up {} to {}",
        job.source().display(),
        job.archive_path().display()
    );

    let report = run_cancellable("backup", CancelToken::new(), move |cancel| {
        tar::backup(&job, &options, &cancel)
    })
    .await?;

    info!(
        "Wrote {} entries ({} bytes)",
        report.entries, report.bytes
    );
    println!("{}", report.archive_path.display());
    Ok(())
}

fn resolve_destination(args: &BackupArgs, cfg: &Config) -> Result<PathBuf> {
    args.dest
        .clone()
        .or_else(|| cfg.backup.destination.as_ref().map(PathBuf::from))
        .ok_or_else(|| {
            anyhow!(BakError::Config(
                "no backup destination: pass --dest or set backup.destination".into()
            ))
        })
}
