//! # bakrs Common Utilities (`common`)
//!
//! File: cli/src/common/mod.rs
//! Author: Christi Mahu
//! Repository: https://github.com/christimahu/bakrs
//!
//! ## Overview
//!
//! Shared building blocks used by the command handlers in `commands::`. The
//! commands parse arguments and print results; the work itself happens here.
//!
//! ## Architecture
//!
//! - **`archive`**: Backup, restore, and listing of `.tar.gz` archives.
//! - **`fs`**: Directory preparation and archive path sanitization.
//! - **`process`**: Cancellation tokens and signal-aware execution of blocking jobs.
//!
//! ## Usage
//!
//! Import from the specific submodule:
//!
//! ```rust,ignore
//! use crate::common::archive::extract;
//! use crate::common::process::{run_cancellable, CancelToken};
//! ```
//!

pub mod archive;
pub mod fs;
pub mod process;
