//! # bakrs Main Entry Point
//!
//! File: cli/src/main.rs
//! Author: Christi Mahu
//! Repository: https://github.com/christimahu/bakrs
//!
//! ## Overview
//!
//! This file is the entry point of the `bakrs` CLI. It handles:
//! - Command-line argument parsing using Clap
//! - Setting up the logging system based on verbosity flags
//! - Loading the layered configuration
//! - Routing execution to the command handlers
//! - Turning errors into messages on stderr and exit codes
//!
//! ## Exit Codes
//!
//! | Code | Meaning |
//! |------|---------|
//! | 0    | Success |
//! | 1    | Precondition failure (bad paths, collision, corrupt archive, configuration) |
//! | 2    | Archive engine failure |
//! | 3    | Path traversal rejected |
//! | 130  | Interrupted by SIGINT/SIGTERM |
//!
//! ## Examples
//!
//! ```bash
//! bakrs backup --source /etc/myapp --dest /var/backups
//! bakrs -v restore --archive /var/backups/myapp-20240102-030405.tar.gz --target /tmp/check
//! RUST_LOG=debug bakrs list --archive myapp-20240102-030405.tar.gz
//! ```
//!
use clap::Parser;
use std::path::PathBuf;
use tracing_subscriber::{fmt, EnvFilter};

mod commands; // One module per subcommand (backup, restore, list)
mod common; // Archive engine, filesystem helpers, cancellation
mod core; // Errors and configuration

/// Top-level command-line arguments.
#[derive(Parser, Debug)]
#[command(
    name = "bakrs",
    about = "Back up and restore directories as timestamped .tar.gz archives",
    long_about = "Back up a directory into <name>-<YYYYMMDD-HHMMSS>.tar.gz, list an archive's \
                  contents, or restore it into a target directory.\n\
                  Archives with entries that would escape the target are refused.",
    propagate_version = true,
    version
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
    /// Increase log verbosity (-v info, -vv debug, -vvv trace). RUST_LOG takes precedence.
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,
    /// Use this config file instead of the user and project config files.
    #[arg(long, global = true, env = "BAKRS_CONFIG")]
    config: Option<PathBuf>,
}

#[derive(Parser, Debug)]
enum Commands {
    #[command(alias = "b")]
    Backup(commands::backup::BackupArgs),
    #[command(alias = "r")]
    Restore(commands::restore::RestoreArgs),
    #[command(alias = "ls")]
    List(commands::list::ListArgs),
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    let log_level = match cli.verbose {
        0 => "warn",
        1 => "info",
        2 => "debug",
        _ => "trace",
    };
    let env_filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(log_level));
    fmt::Subscriber::builder()
        .with_env_filter(env_filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .compact()
        .init();

    tracing::debug!("Parsed CLI arguments: {:?}", cli);

    if let Err(e) = run(cli).await {
        tracing::error!("Command execution failed: {:?}", e);
        eprintln!("Error: {:#}", e);
        std::process::exit(core::error::exit_code(&e));
    }
}

async fn run(cli: Cli) -> core::error::Result<()> {
    let cfg = core::config::load_config(cli.config.as_deref())?;

    match cli.command {
        Commands::Backup(args) => commands::backup::handle_backup(args, &cfg).await,
        Commands::Restore(args) => commands::restore::handle_restore(args, &cfg).await,
        Commands::List(args) => commands::list::handle_list(args).await,
    }
}
