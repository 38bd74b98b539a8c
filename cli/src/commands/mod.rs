//! # bakrs Command Modules (`commands`)
//!
//! File: cli/src/commands/mod.rs
//! Author: Christi Mahu
//! Repository: https://github.com/christimahu/bakrs
//!
//! ## Overview
//!
//! One module per top-level subcommand. Each module defines a `clap` args
//! struct and an async `handle_*` function that:
//!
//! 1. Merges its flags with the loaded `Config`.
//! 2. Builds the job description from `common::archive::job`.
//! 3. Runs the blocking archive operation through `common::process::run_cancellable`.
//! 4. Prints the result to stdout.
//!
//! Errors are returned to `main`, which maps them to exit codes.
//!

/// `bakrs backup`: archive a directory into a timestamped `.tar.gz`.
pub mod backup;
/// `bakrs list`: validate an archive and print its entries.
pub mod list;
/// `bakrs restore`: extract an archive into a target directory.
pub mod restore;
