//! # bakrs Filesystem Utilities (`common::fs`)
//!
//! File: cli/src/common/fs/mod.rs
//! Author: Christi Mahu
//! Repository: https://github.com/christimahu/bakrs
//!
//! ## Overview
//!
//! Filesystem helpers shared by the archive code:
//!
//! - **`io`**: Directory creation, writability probing, base-name extraction.
//! - **`paths`**: Sanitization of archive entry paths against traversal.
//!
//! Import from the specific submodule, e.g. `crate::common::fs::io::ensure_dir_exists`.
//!

/// Directory creation and writability checks.
pub mod io;
/// Archive entry path sanitization.
pub mod paths;
