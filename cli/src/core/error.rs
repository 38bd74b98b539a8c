//! # bakrs Error Types
//!
//! File: cli/src/core/error.rs
//! Author: Christi Mahu
//! Repository: https://github.com/christimahu/bakrs
//!
//! ## Overview
//!
//! This module defines the error taxonomy used by every bakrs operation and
//! the mapping from an error to the process exit status.
//!
//! ## Architecture
//!
//! The error system consists of two main components:
//! - `BakError`: A custom error enum using `thiserror`, one variant per failure kind
//! - `Result<T>`: A type alias for `anyhow::Result<T>` so callers can attach context
//!
//! Variants fall into four categories (see [`ErrorCategory`]):
//! - Precondition errors (bad paths, permissions, name collisions, configuration)
//! - Integrity errors (corrupt archives, path traversal attempts)
//! - Tool errors (the tar/gzip engine failed while reading or writing)
//! - Interruption (SIGINT/SIGTERM received mid-operation)
//!
//! ## Examples
//!
//! ```rust
//! // Return a specific error kind
//! if !source.is_dir() {
//!     anyhow::bail!(BakError::SourceNotFound { path: source.to_path_buf() });
//! }
//!
//! // Map any error back to an exit status
//! let code = exit_code(&err);
//! ```
//!
use std::path::PathBuf;
use thiserror::Error;

/// Custom error type for bakrs.
#[derive(Error, Debug)]
pub enum BakError {
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Source directory '{}' not found or not readable.", path.display())]
    SourceNotFound { path: PathBuf },

    #[error("Destination directory '{}' is not writable: {reason}", path.display())]
    DestinationNotWritable { path: PathBuf, reason: String },

    #[error("Archive '{}' already exists; refusing to overwrite it.", path.display())]
    ArchiveCollision { path: PathBuf },

    #[error("Archive '{}' not found or not a readable file.", path.display())]
    ArchiveNotFound { path: PathBuf },

    #[error("Archive '{}' is corrupt ({extracted} entries already extracted): {reason}", path.display())]
    ArchiveCorrupt {
        path: PathBuf,
        reason: String,
        extracted: usize,
    },

    #[error("Archive entry '{entry}' would be written outside the restore target.")]
    PathTraversalRejected { entry: String },

    #[error("Target directory '{}' is not writable: {reason}", path.display())]
    TargetNotWritable { path: PathBuf, reason: String },

    #[error("Archive engine failed during {operation} ({extracted} entries already extracted):\n{output}")]
    ToolFailure {
        operation: String,
        output: String,
        extracted: usize,
    },

    #[error("Interrupted by signal during {operation} ({completed} entries processed); partial output removed where possible.")]
    Interrupted { operation: String, completed: usize },
}

/// Broad classes of failure, each with its own reporting rules.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorCategory {
    Precondition,
    Integrity,
    ToolInvocation,
    Interrupted,
}

impl BakError {
    /// Returns the category this error belongs to.
    pub fn category(&self) -> ErrorCategory {
        match self {
            BakError::Config(_)
            | BakError::SourceNotFound { .. }
            | BakError::DestinationNotWritable { .. }
            | BakError::ArchiveCollision { .. }
            | BakError::ArchiveNotFound { .. }
            | BakError::TargetNotWritable { .. } => ErrorCategory::Precondition,
            BakError::ArchiveCorrupt { .. } | BakError::PathTraversalRejected { .. } => {
                ErrorCategory::Integrity
            }
            BakError::ToolFailure { .. } => ErrorCategory::ToolInvocation,
            BakError::Interrupted { .. } => ErrorCategory::Interrupted,
        }
    }

    /// Process exit status for this error.
    ///
    /// `1` precondition / corrupt archive, `2` archive engine failure,
    /// `3` traversal rejected, `130` interrupted (128 + SIGINT).
    pub fn exit_code(&self) -> i32 {
        match self {
            BakError::PathTraversalRejected { .. } => 3,
            _ => match self.category() {
                ErrorCategory::Precondition | ErrorCategory::Integrity => 1,
                ErrorCategory::ToolInvocation => 2,
                ErrorCategory::Interrupted => 130,
            },
        }
    }
}

/// Exit status for an arbitrary error from a command handler.
///
/// Walks the `anyhow` chain looking for a `BakError`; anything else is
/// treated as an unexpected engine failure.
pub fn exit_code(err: &anyhow::Error) -> i32 {
    err.chain()
        .find_map(|cause| cause.downcast_ref::<BakError>())
        .map_or(2, BakError::exit_code)
}

/// Type alias for Result using anyhow::Error for broad compatibility.
pub type Result<T> = anyhow::Result<T>;

// --- Unit Tests ---
#[cfg(test)]
mod tests {
    use super::*;
    use anyhow::Context;

    #[test]
    fn test_error_display() {
        let config_err = BakError::Config("Missing setting 'foo'".to_string());
        assert_eq!(
            config_err.to_string(),
            "Configuration error: Missing setting 'foo'"
        );

        let collision = BakError::ArchiveCollision {
            path: PathBuf::from("/backups/myapp-20240102-030405.tar.gz"),
        };
        assert_eq!(
            collision.to_string(),
            "Archive '/backups/myapp-20240102-030405.tar.gz' already exists; refusing to overwrite it."
        );

        let traversal = BakError::PathTraversalRejected {
            entry: "../escape.txt".into(),
        };
        assert!(traversal.to_string().contains("'../escape.txt'"));
    }

    #[test]
    fn test_exit_codes_by_kind() {
        let source = BakError::SourceNotFound {
            path: PathBuf::from("/nope"),
        };
        assert_eq!(source.exit_code(), 1);

        let corrupt = BakError::ArchiveCorrupt {
            path: PathBuf::from("a.tar.gz"),
            reason: "bad header".into(),
            extracted: 0,
        };
        assert_eq!(corrupt.category(), ErrorCategory::Integrity);
        assert_eq!(corrupt.exit_code(), 1);

        let tool = BakError::ToolFailure {
            operation: "backup".into(),
            output: "No space left on device".into(),
            extracted: 0,
        };
        assert_eq!(tool.exit_code(), 2);

        let traversal = BakError::PathTraversalRejected {
            entry: "/etc/passwd".into(),
        };
        assert_eq!(traversal.exit_code(), 3);

        let interrupted = BakError::Interrupted {
            operation: "backup".into(),
            completed: 4,
        };
        assert_eq!(interrupted.exit_code(), 130);
    }

    #[test]
    fn test_exit_code_through_context() {
        let result: Result<()> = Err(anyhow::Error::new(BakError::PathTraversalRejected {
            entry: "../x".into(),
        }))
        .context("Restore failed");
        let err = result.unwrap_err();
        assert_eq!(exit_code(&err), 3);

        let plain = anyhow::anyhow!("something unexpected");
        assert_eq!(exit_code(&plain), 2);
    }
}
