//! # bakrs List Command (`commands::list`)
//!
//! File: cli/src/commands/list.rs
//! Author: Christi Mahu
//! Repository: https://github.com/christimahu/bakrs
//!
//! ## Overview
//!
//! Implements `bakrs list`, which runs the same validation pass as `restore`
//! without a target and prints one line per entry:
//!
//! ```text
//! d 0755            0 2024-01-02 03:04 myapp
//! - 0644          812 2024-01-02 03:04 myapp/app.toml
//! l 0777            0 2024-01-02 03:04 myapp/current -> app.toml
//! ```
//!
//! A zero exit status therefore also means the archive is safe to restore.
//!
use crate::{
    common::{
        archive::scan::{self, ArchiveListing, EntryKind},
        process::{run_cancellable, CancelToken},
    },
    core::error::Result,
};
use clap::Parser;
use std::path::PathBuf;
use tracing::debug;

/// Arguments for `bakrs list`.
#[derive(Parser, Debug)]
#[command(about = "Validate an archive and list its entries")]
pub struct ListArgs {
    /// Archive to inspect.
    #[arg(long, short)]
    archive: PathBuf,
}

pub async fn handle_list(args: ListArgs) -> Result<()> {
    debug!("List args: {:?}", args);
    let archive = args.archive.clone();

    let listing = run_cancellable("list", CancelToken::new(), move |cancel| {
        scan::scan_archive(&archive, &cancel)
    })
    .await?;

    for entry in &listing.entries {
        println!("{}", entry);
    }
    println!("{}", summary(&listing));
    Ok(())
}

fn summary(listing: &ArchiveListing) -> String {
    format!(
        "{} entries ({} files, {} directories, {} symlinks), {} bytes",
        listing.entries.len(),
        listing.count(EntryKind::File),
        listing.count(EntryKind::Directory),
        listing.count(EntryKind::Symlink),
        listing.total_bytes()
    )
}
