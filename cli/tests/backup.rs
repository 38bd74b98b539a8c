//! # bakrs Backup Integration Tests
//!
//! File: cli/tests/backup.rs
//! Author: Christi Mahu
//! Repository: https://github.com/christimahu/bakrs
//!
//! ## Overview
//!
//! Runs `bakrs backup` end to end: archive naming, destination handling,
//! configuration defaults, and precondition failures.
//!

mod common;

use common::{backup, bakrs_cmd, make_source, EXIT_PRECONDITION};
use predicates::prelude::*;
use std::fs;
use tempfile::tempdir;

#[test]
fn test_backup_prints_timestamped_archive_path() {
    let home = tempdir().unwrap();
    let source = make_source(home.path());
    let dest = home.path().join("backups");

    let archive = backup(home.path(), &source, &dest);

    assert_eq!(archive.parent(), Some(dest.as_path()));
    let name = archive.file_name().unwrap().to_str().unwrap();
    // myapp-YYYYMMDD-HHMMSS.tar.gz
    assert!(name.starts_with("myapp-"), "{}", name);
    assert!(name.ends_with(".tar.gz"), "{}", name);
    assert_eq!(name.len(), "myapp-20240102-030405.tar.gz".len(), "{}", name);
    assert!(archive.is_file());

    let leftovers: Vec<_> = fs::read_dir(&dest)
        .unwrap()
        .filter_map(|e| e.ok())
        .filter(|e| e.file_name().to_string_lossy().ends_with(".partial"))
        .collect();
    assert!(leftovers.is_empty());
}

#[test]
fn test_backup_trailing_slash_uses_directory_name() {
    let home = tempdir().unwrap();
    make_source(home.path());
    let dest = home.path().join("out");

    bakrs_cmd(home.path())
        .args(["backup", "--source", "myapp/", "--dest", "out"])
        .assert()
        .success()
        .stdout(predicate::str::contains("myapp-"));
    assert_eq!(fs::read_dir(dest).unwrap().count(), 1);
}

#[test]
fn test_backup_destination_from_project_config() {
    let home = tempdir().unwrap();
    make_source(home.path());
    let dest = home.path().join("configured");
    fs::write(
        home.path().join(".bakrs.toml"),
        format!("[backup]\ndestination = \"{}\"\ncompression_level = 1\n", dest.display()),
    )
    .unwrap();

    bakrs_cmd(home.path())
        .args(["backup", "--source", "myapp"])
        .assert()
        .success();
    assert_eq!(fs::read_dir(dest).unwrap().count(), 1);
}

#[test]
fn test_backup_without_destination_fails() {
    let home = tempdir().unwrap();
    make_source(home.path());

    bakrs_cmd(home.path())
        .args(["backup", "--source", "myapp"])
        .assert()
        .code(EXIT_PRECONDITION)
        .stderr(predicate::str::contains("--dest"));
}

#[test]
fn test_backup_missing_source_fails() {
    let home = tempdir().unwrap();

    bakrs_cmd(home.path())
        .args(["backup", "--source", "nope", "--dest", "out"])
        .assert()
        .code(EXIT_PRECONDITION)
        .stderr(predicate::str::contains("nope"));
    assert!(!home.path().join("out").exists());
}

#[test]
fn test_backup_destination_is_file_fails() {
    let home = tempdir().unwrap();
    make_source(home.path());
    fs::write(home.path().join("out"), "not a dir").unwrap();

    bakrs_cmd(home.path())
        .args(["backup", "--source", "myapp", "--dest", "out"])
        .assert()
        .code(EXIT_PRECONDITION);
    assert_eq!(fs::read_to_string(home.path().join("out")).unwrap(), "not a dir");
}
