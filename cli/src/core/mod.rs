//! # bakrs Core Infrastructure
//!
//! File: cli/src/core/mod.rs
//! Author: Christi Mahu
//! Repository: https://github.com/christimahu/bakrs
//!
//! ## Overview
//!
//! This module aggregates the infrastructure shared by every command:
//! - `config`: Configuration loading, merging, and validation
//! - `error`: The `BakError` taxonomy and exit-code mapping
//!
//! ```rust
//! use crate::core::config; // For loading configuration
//! use crate::core::error::{BakError, Result}; // For error handling
//! ```
//!
pub mod config;
pub mod error;
