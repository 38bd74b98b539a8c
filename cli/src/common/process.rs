//! # bakrs Process Signal & Cancellation Utilities (`common::process`)
//!
//! File: cli/src/common/process.rs
//! Author: Christi Mahu
//! Repository: https://github.com/christimahu/bakrs
//!
//! ## Overview
//!
//! Archive work is blocking and single-threaded, but the process still has to
//! react to SIGINT/SIGTERM by stopping promptly and cleaning up its temporary
//! archive. This module provides the pieces for that:
//!
//! - **`CancelToken`**: A cloneable flag shared between the signal listener and
//!   the blocking job. Jobs poll it between archive entries.
//! - **`CancellableReader`**: Wraps any `Read` so that a long copy (one huge
//!   file) aborts mid-stream once the token fires.
//! - **`run_cancellable`**: Runs a job on Tokio's blocking pool and races it
//!   against the signal futures. On a signal the token is cancelled and the job
//!   is awaited so that its own cleanup (dropping temp files) completes before
//!   the process exits.
//!
//! ## Usage
//!
//! ```rust
//! let report = process::run_cancellable("backup", CancelToken::new(), move |cancel| {
//!     archive::tar::backup(&job, &options, &cancel)
//! })
//! .await?;
//! ```
//!
use crate::core::error::Result;
use anyhow::Context;
use std::future::Future;
use std::io::{self, Read};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use tokio::signal;
use tracing::{debug, warn};

/// Message carried by the I/O error a `CancellableReader` returns once cancelled.
pub const CANCELLED_MESSAGE: &str = "operation cancelled by signal";

/// Shared cancellation flag.
#[derive(Debug, Clone, Default)]
pub struct CancelToken(Arc<AtomicBool>);

impl CancelToken {
    pub fn new() -> Self {
        Self::default()
    }

    /// Requests cancellation. Idempotent.
    pub fn cancel(&self) {
        self.0.store(true, Ordering::SeqCst);
    }

    pub fn is_cancelled(&self) -> bool {
        self.0.load(Ordering::SeqCst)
    }

    /// Wraps `inner` so reads fail once this token is cancelled.
    pub fn reader<R: Read>(&self, inner: R) -> CancellableReader<R> {
        CancellableReader {
            inner,
            token: self.clone(),
        }
    }
}

/// `Read` adapter that checks a [`CancelToken`] before every read.
pub struct CancellableReader<R> {
    inner: R,
    token: CancelToken,
}

impl<R: Read> Read for CancellableReader<R> {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        // ErrorKind::Interrupted would be retried by io::copy, so use Other.
        if self.token.is_cancelled() {
            return Err(io::Error::new(io::ErrorKind::Other, CANCELLED_MESSAGE));
        }
        self.inner.read(buf)
    }
}

/// Waits for SIGINT (Ctrl+C) or, on Unix, SIGTERM and returns the signal name.
pub async fn wait_for_signal() -> &'static str {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            warn!("Failed to listen for Ctrl+C: {}", e);
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut stream) => {
                stream.recv().await;
            }
            Err(e) => {
                warn!("Failed to install SIGTERM handler: {}", e);
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => "SIGINT",
        _ = terminate => "SIGTERM",
    }
}

/// Runs `job` on the blocking pool, cancelling `cancel` if a signal arrives first.
///
/// Always waits for the job to return, so any cleanup it performs on the
/// cancellation path finishes before this function does.
pub async fn run_cancellable<T, F>(operation: &str, cancel: CancelToken, job: F) -> Result<T>
where
    F: FnOnce(CancelToken) -> Result<T> + Send + 'static,
    T: Send + 'static,
{
    run_until(operation, cancel, job, wait_for_signal()).await
}

/// Same as `run_cancellable`, with `shutdown` standing in for the signal listener.
async fn run_until<T, F, S>(operation: &str, cancel: CancelToken, job: F, shutdown: S) -> Result<T>
where
    F: FnOnce(CancelToken) -> Result<T> + Send + 'static,
    T: Send + 'static,
    S: Future<Output = &'static str>,
{
    let worker_token = cancel.clone();
    let mut handle = tokio::task::spawn_blocking(move || job(worker_token));

    tokio::select! {
        // Job finished on its own: hand back its result.
        joined = &mut handle => {
            return joined.with_context(|| format!("{} worker panicked", operation))?;
        }
        // Signal first: flag the job, then fall through and wait for it to unwind.
        signal_name = shutdown => {
            warn!("Received {}, stopping {}...", signal_name, operation);
            cancel.cancel();
        }
    }

    debug!("Waiting for {} worker to finish cleanup", operation);
    handle
        .await
        .with_context(|| format!("{} worker panicked", operation))?
}
