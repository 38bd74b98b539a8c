//! # bakrs Restore Command (`commands::restore`)
//!
//! File: cli/src/commands/restore.rs
//! Author: Christi Mahu
//! Repository: https://github.com/christimahu/bakrs
//!
//! ## Overview
//!
//! Implements `bakrs restore`: validates an archive in full, then extracts it
//! into the target directory. Archives containing entries that would land
//! outside the target are rejected before anything is written (exit code 3).
//!
//! ## Usage
//!
//! ```bash
//! bakrs restore --archive /var/backups/myapp-20240102-030405.tar.gz --target /srv
//! bakrs restore --archive myapp-20240102-030405.tar.gz   # target from config, else "."
//! ```
//!
use crate::{
    common::{
        archive::{extract, job::RestoreJob},
        process::{run_cancellable, CancelToken},
    },
    core::{config::Config, error::Result},
};
use clap::Parser;
use std::path::PathBuf;
use tracing::{debug, info};

/// Arguments for `bakrs restore`.
#[derive(Parser, Debug)]
#[command(about = "Extract an archive into a target directory")]
pub struct RestoreArgs {
    /// Archive to restore.
    #[arg(long, short)]
    archive: PathBuf,

    /// Directory to extract into. Created if missing.
    /// Defaults to `restore.target` from config, then the current directory.
    #[arg(long, short)]
    target: Option<PathBuf>,
}

/// # Handle Restore Command (`handle_restore`)
///
/// Runs `extract::restore` on the blocking pool and prints the number of
/// restored entries. A signal stops extraction after the current entry.
pub async fn handle_restore(args: RestoreArgs, cfg: &Config) -> Result<()> {
    debug!("Restore args: {:?}", args);

    let target = resolve_target(&args, cfg);
    let job = RestoreJob::new(&args.archive, &target);
    info!("Restoring {} into {}", job.archive.display(), job.target.display());

    let report = run_cancellable("restore", CancelToken::new(), move |cancel| {
        extract::restore(&job, &cancel)
    })
    .await?;

    println!(
        "Restored {} entries into {}",
        report.extracted,
        report.target.display()
    );
    Ok(())
}

fn resolve_target(args: &RestoreArgs, cfg: &Config) -> PathBuf {
    args.target
        .clone()
        .or_else(|| cfg.restore.target.as_ref().map(PathBuf::from))
        .unwrap_or_else(|| PathBuf::from("."))
}
