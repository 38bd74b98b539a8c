//! # bakrs CLI Integration Test Common Helpers
//!
//! File: cli/tests/common.rs
//! Author: Christi Mahu
//! Repository: https://github.com/christimahu/bakrs
//!
//! ## Overview
//!
//! Shared helpers for the integration tests in `cli/tests/`. Each test file
//! declares `mod common;` and runs the compiled `bakrs` binary through
//! `assert_cmd`.
//!
//! Commands are started inside a scratch directory with `HOME` and
//! `XDG_CONFIG_HOME` pointed at it, so no user or project config leaks into
//! the tests.
//!

// Not every test file uses every helper.
#![allow(dead_code)]

pub use assert_cmd::Command;
use flate2::write::GzEncoder;
use flate2::Compression;
use std::fs::{self, File};
use std::path::{Path, PathBuf};

/// Exit codes documented in `main.rs`.
pub const EXIT_PRECONDITION: i32 = 1;
pub const EXIT_TRAVERSAL: i32 = 3;

/// # Get bakrs Command (`bakrs_cmd`)
///
/// Returns a `Command` for the `bakrs` binary built for this test run, isolated
/// to `home` (working directory and config lookup).
///
/// ## Panics
/// Panics if the `bakrs` binary cannot be found via `Command::cargo_bin`.
pub fn bakrs_cmd(home: &Path) -> Command {
    let mut cmd = Command::cargo_bin("bakrs").expect("Failed to find bakrs binary for testing");
    cmd.current_dir(home)
        .env("HOME", home)
        .env("XDG_CONFIG_HOME", home.join(".config"))
        .env_remove("BAKRS_CONFIG")
        .env_remove("RUST_LOG");
    cmd
}

/// Creates `<root>/myapp` with a small tree: nested files, an empty file,
/// and a relative symlink.
pub fn make_source(root: &Path) -> PathBuf {
    let source = root.join("myapp");
    fs::create_dir_all(source.join("conf.d")).unwrap();
    fs::write(source.join("app.toml"), "port = 8080\n").unwrap();
    fs::write(source.join("conf.d/extra.toml"), "debug = true\n").unwrap();
    fs::write(source.join("empty"), "").unwrap();
    std::os::unix::fs::symlink("app.toml", source.join("current.toml")).unwrap();
    source
}

/// Writes a `.tar.gz` of regular files whose names go into the header
/// verbatim, so unsafe names like `../escape.txt` can be produced.
pub fn write_raw_archive(path: &Path, files: &[(&str, &[u8])]) {
    let file = File::create(path).unwrap();
    let mut builder = tar::Builder::new(GzEncoder::new(file, Compression::default()));
    for (name, data) in files {
        let mut header = tar::Header::new_old();
        header.as_old_mut().name[..name.len()].copy_from_slice(name.as_bytes());
        header.set_entry_type(tar::EntryType::Regular);
        header.set_mode(0o644);
        header.set_mtime(1_700_000_000);
        header.set_size(data.len() as u64);
        header.set_cksum();
        builder.append(&header, *data).unwrap();
    }
    builder.into_inner().unwrap().finish().unwrap();
}

/// Runs `bakrs backup` and returns the archive path printed on stdout.
pub fn backup(home: &Path, source: &Path, dest: &Path) -> PathBuf {
    let output = bakrs_cmd(home)
        .args(["backup", "--source"])
        .arg(source)
        .arg("--dest")
        .arg(dest)
        .output()
        .unwrap();
    assert!(output.status.success(), "backup failed: {:?}", output);
    PathBuf::from(String::from_utf8(output.stdout).unwrap().trim())
}
