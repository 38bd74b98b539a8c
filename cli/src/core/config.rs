//! # bakrs Configuration System
//!
//! File: cli/src/core/config.rs
//! Author: Christi Mahu
//! Repository: https://github.com/christimahu/bakrs
//!
//! ## Overview
//!
//! This module loads, merges, and validates the optional configuration that
//! supplies defaults for the `backup` and `restore` commands. Command-line
//! flags always take precedence over anything configured here.
//!
//! ## Architecture
//!
//! Configuration sources (in order of precedence):
//! 1. An explicit `--config <file>` (replaces both files below)
//! 2. Project-specific `.bakrs.toml` in current directory or ancestors
//! 3. User-specific `~/.config/bakrs/config.toml`
//! 4. Default values defined in the code
//!
//! ## Examples
//!
//! ```toml
//! [backup]
//! destination = "~/backups"
//! compression_level = 9
//! verify = true
//!
//! [restore]
//! target = "/srv/restore"
//! ```
//!
//! The configuration is loaded once per invocation in `main` and passed to
//! the command handlers by reference.
//!
use crate::core::error::{BakError, Result};
use anyhow::{anyhow, Context};
use directories::ProjectDirs;
use serde::Deserialize;
use std::{
    fs,
    path::{Path, PathBuf},
};
use tracing::{debug, info};

/// Effective configuration after all files are merged and defaults applied.
#[derive(Debug, Default, Clone, PartialEq)]
pub struct Config {
    pub backup: BackupConfig,
    pub restore: RestoreConfig,
}

/// Defaults for `bakrs backup`.
#[derive(Debug, Clone, PartialEq)]
pub struct BackupConfig {
    /// Destination directory used when `--dest` is omitted.
    pub destination: Option<String>,
    /// Gzip level, 0 (store) through 9 (best).
    pub compression_level: u32,
    /// Re-read the finished archive before renaming it into place.
    pub verify: bool,
}

impl Default for BackupConfig {
    fn default() -> Self {
        Self {
            destination: None,
            compression_level: default_compression_level(),
            verify: true,
        }
    }
}

/// Defaults for `bakrs restore`.
#[derive(Debug, Default, Clone, PartialEq)]
pub struct RestoreConfig {
    /// Target directory used when `--target` is omitted.
    pub target: Option<String>,
}

/// One TOML file as written. Every key is optional so that a value set in a
/// file can be told apart from a value left to the default.
#[derive(Deserialize, Debug, Default, Clone, PartialEq)]
#[serde(deny_unknown_fields)]
struct ConfigFile {
    #[serde(default)]
    backup: BackupFile,
    #[serde(default)]
    restore: RestoreFile,
}

#[derive(Deserialize, Debug, Default, Clone, PartialEq)]
#[serde(deny_unknown_fields)]
struct BackupFile {
    destination: Option<String>, // Can use ~
    compression_level: Option<u32>,
    verify: Option<bool>,
}

#[derive(Deserialize, Debug, Default, Clone, PartialEq)]
#[serde(deny_unknown_fields)]
struct RestoreFile {
    target: Option<String>, // Can use ~
}

impl ConfigFile {
    /// Lays `over` on top of `self`: every key set in `over` wins.
    fn layer(self, over: ConfigFile) -> ConfigFile {
        ConfigFile {
            backup: BackupFile {
                destination: over.backup.destination.or(self.backup.destination),
                compression_level: over
                    .backup
                    .compression_level
                    .or(self.backup.compression_level),
                verify: over.backup.verify.or(self.backup.verify),
            },
            restore: RestoreFile {
                target: over.restore.target.or(self.restore.target),
            },
        }
    }

    /// Fills unset keys with the built-in defaults.
    fn resolve(self) -> Config {
        let defaults = BackupConfig::default();
        Config {
            backup: BackupConfig {
                destination: self.backup.destination,
                compression_level: self
                    .backup
                    .compression_level
                    .unwrap_or(defaults.compression_level),
                verify: self.backup.verify.unwrap_or(defaults.verify),
            },
            restore: RestoreConfig {
                target: self.restore.target,
            },
        }
    }
}

pub(crate) fn default_compression_level() -> u32 {
    6
}

const PROJECT_CONFIG_FILENAME: &str = ".bakrs.toml";
const MAX_COMPRESSION_LEVEL: u32 = 9;

/// Loads the effective configuration.
///
/// When `explicit` is given only that file is read (and it must exist);
/// otherwise the user and project files are merged over the defaults.
pub fn load_config(explicit: Option<&Path>) -> Result<Config> {
    let file = match explicit {
        Some(path) => {
            info!("Loading configuration from: {}", path.display());
            if !path.is_file() {
                return Err(anyhow!(BakError::Config(format!(
                    "Configuration file '{}' does not exist.",
                    path.display()
                ))));
            }
            load_config_from_path(path)?
        }
        None => {
            // Project keys override user keys; anything unset in both falls back to defaults.
            let user_config = load_user_config()?.unwrap_or_default();
            match load_project_config()? {
                Some(project_config) => user_config.layer(project_config),
                None => user_config,
            }
        }
    };
    let mut config = file.resolve();
    expand_config_paths(&mut config);
    validate_config(&config).context("Configuration validation failed")?;
    debug!("Final loaded configuration: {:?}", config);
    Ok(config)
}

fn load_user_config() -> Result<Option<ConfigFile>> {
    let Some(proj_dirs) = ProjectDirs::from("com", "bakrs", "bakrs") else {
        debug!("Could not determine user config directory.");
        return Ok(None);
    };
    let config_path = proj_dirs.config_dir().join("config.toml");
    if config_path.is_file() {
        info!("Loading user configuration from: {}", config_path.display());
        load_config_from_path(&config_path).map(Some)
    } else {
        debug!(
            "User configuration file not found at {}",
            config_path.display()
        );
        Ok(None)
    }
}

fn load_project_config() -> Result<Option<ConfigFile>> {
    let current_dir = std::env::current_dir().context("Failed to get current directory")?;
    match find_project_config_path(&current_dir) {
        Some(path) => {
            info!("Loading project configuration from: {}", path.display());
            load_config_from_path(&path).map(Some)
        }
        None => {
            debug!("No {} found in current directory or ancestors.", PROJECT_CONFIG_FILENAME);
            Ok(None)
        }
    }
}

/// Walks up from `start` looking for `.bakrs.toml`, stopping at a `.git` root.
fn find_project_config_path(start: &Path) -> Option<PathBuf> {
    for dir in start.ancestors() {
        let candidate = dir.join(PROJECT_CONFIG_FILENAME);
        if candidate.is_file() {
            return Some(candidate);
        }
        if dir.join(".git").is_dir() {
            debug!(
                "Found .git directory at {}, stopping project config search.",
                dir.display()
            );
            return None;
        }
    }
    None
}

fn load_config_from_path(path: &Path) -> Result<ConfigFile> {
    // Unreadable files are configuration problems too (exit code 1), not engine failures.
    let content = fs::read_to_string(path).map_err(|e| {
        anyhow!(BakError::Config(format!(
            "Failed to read configuration file {}: {}",
            path.display(),
            e
        )))
    })?;
    toml::from_str(&content).map_err(|e| {
        anyhow!(BakError::Config(format!(
            "Failed to parse TOML from file {}: {}",
            path.display(),
            e
        )))
    })
}

fn expand_config_paths(config: &mut Config) {
    if let Some(dest) = config.backup.destination.as_mut() {
        *dest = shellexpand::tilde(dest.as_str()).into_owned();
        debug!("Expanded backup destination: {}", dest);
    }
    if let Some(target) = config.restore.target.as_mut() {
        *target = shellexpand::tilde(target.as_str()).into_owned();
        debug!("Expanded restore target: {}", target);
    }
}

fn validate_config(config: &Config) -> Result<()> {
    if config.backup.compression_level > MAX_COMPRESSION_LEVEL {
        return Err(anyhow!(BakError::Config(format!(
            "Invalid compression_level {}. Expected 0-{}.",
            config.backup.compression_level, MAX_COMPRESSION_LEVEL
        ))));
    }
    let configured_dirs = [
        ("backup.destination", config.backup.destination.as_deref()),
        ("restore.target", config.restore.target.as_deref()),
    ];
    for (key, value) in configured_dirs {
        let Some(value) = value else { continue };
        if value.is_empty() {
            return Err(anyhow!(BakError::Config(format!("{} cannot be empty.", key))));
        }
        let path = Path::new(value);
        if path.exists() && !path.is_dir() {
            return Err(anyhow!(BakError::Config(format!(
                "Configured {} '{}' exists but is not a directory.",
                key,
                path.display()
            ))));
        }
    }
    debug!("Configuration validation successful.");
    Ok(())
}

// --- Unit Tests ---
#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    fn parse(toml_content: &str) -> ConfigFile {
        toml::from_str(toml_content).expect("Failed to parse TOML")
    }

    #[test]
    fn test_deserialize_basic_toml() {
        let file = parse(
            r#"
            [backup]
            destination = "~/backups"
            compression_level = 9

            [restore]
            target = "/srv/restore"
        "#,
        );
        assert_eq!(file.backup.verify, None); // Not set in the file

        let config = file.resolve();
        assert_eq!(config.backup.destination.as_deref(), Some("~/backups"));
        assert_eq!(config.backup.compression_level, 9);
        assert!(config.backup.verify); // Default
        assert_eq!(config.restore.target.as_deref(), Some("/srv/restore"));
    }

    #[test]
    fn test_empty_file_resolves_to_defaults() {
        assert_eq!(parse("").resolve(), Config::default());
    }

    #[test]
    fn test_unknown_field_rejected() {
        let result: std::result::Result<ConfigFile, _> =
            toml::from_str("[backup]\nincremental = true\n");
        assert!(result.is_err());
    }

    #[test]
    fn test_path_expansion() {
        let mut config = Config {
            backup: BackupConfig {
                destination: Some("~/bk".to_string()),
                ..Default::default()
            },
            restore: RestoreConfig {
                target: Some("/absolute/path".to_string()),
            },
        };

        expand_config_paths(&mut config);

        let home_dir = dirs::home_dir().unwrap();
        assert_eq!(
            config.backup.destination.unwrap(),
            home_dir.join("bk").to_string_lossy()
        );
        assert_eq!(config.restore.target.unwrap(), "/absolute/path");
    }

    #[test]
    fn test_layer_prefers_project_values() {
        let user = parse(
            "[backup]\ndestination = \"/user/bk\"\ncompression_level = 3\n[restore]\ntarget = \"/user/restore\"\n",
        );
        let project = parse("[backup]\ndestination = \"/project/bk\"\n");

        let merged = user.layer(project).resolve();
        assert_eq!(merged.backup.destination.as_deref(), Some("/project/bk"));
        assert_eq!(merged.backup.compression_level, 3); // Only the user file sets it
        assert_eq!(merged.restore.target.as_deref(), Some("/user/restore"));
    }

    #[test]
    fn test_project_can_reenable_verification() {
        let user = parse("[backup]\nverify = false\n");
        let project = parse("[backup]\nverify = true\n");

        assert!(user.clone().layer(project).resolve().backup.verify);
        // Left unset in the project, the user's choice stands.
        assert!(!user.layer(parse("")).resolve().backup.verify);
    }

    #[test]
    fn test_project_level_equal_to_default_still_wins() {
        let user = parse("[backup]\ncompression_level = 9\n");
        let project = parse(&format!(
            "[backup]\ncompression_level = {}\n",
            default_compression_level()
        ));

        let merged = user.layer(project).resolve();
        assert_eq!(merged.backup.compression_level, default_compression_level());
    }

    #[test]
    fn test_unreadable_config_file_is_config_error() {
        // A directory cannot be read as a file, even as root.
        let temp_dir = tempdir().unwrap();
        let err = load_config_from_path(temp_dir.path()).unwrap_err();
        assert!(matches!(
            err.downcast_ref::<BakError>(),
            Some(BakError::Config(_))
        ));
        assert_eq!(crate::core::error::exit_code(&err), 1);
    }

    #[test]
    fn test_find_project_config_stops_at_git_root() {
        let temp_dir = tempdir().unwrap();
        let repo = temp_dir.path().join("repo");
        let nested = repo.join("a/b");
        fs::create_dir_all(&nested).unwrap();
        fs::create_dir(repo.join(".git")).unwrap();
        fs::write(temp_dir.path().join(PROJECT_CONFIG_FILENAME), "").unwrap();

        assert_eq!(find_project_config_path(&nested), None);

        fs::write(repo.join(PROJECT_CONFIG_FILENAME), "").unwrap();
        assert_eq!(
            find_project_config_path(&nested),
            Some(repo.join(PROJECT_CONFIG_FILENAME))
        );
    }

    #[test]
    fn test_load_explicit_config_file() {
        let temp_dir = tempdir().unwrap();
        let dest = temp_dir.path().join("dest");
        let file = temp_dir.path().join("bakrs.toml");
        fs::write(
            &file,
            format!("[backup]\ndestination = \"{}\"\nverify = false\n", dest.display()),
        )
        .unwrap();

        let config = load_config(Some(&file)).unwrap();
        assert_eq!(config.backup.destination, Some(dest.display().to_string()));
        assert!(!config.backup.verify);
    }

    #[test]
    fn test_load_missing_explicit_config_fails() {
        let temp_dir = tempdir().unwrap();
        let result = load_config(Some(&temp_dir.path().join("missing.toml")));
        assert!(result.unwrap_err().to_string().contains("does not exist"));
    }

    #[test]
    fn test_validate_config_invalid_level() {
        let config = Config {
            backup: BackupConfig {
                compression_level: 12,
                ..Default::default()
            },
            ..Default::default()
        };
        let result = validate_config(&config);
        assert!(result
            .unwrap_err()
            .to_string()
            .contains("Invalid compression_level"));
    }

    #[test]
    fn test_validate_config_destination_is_file() {
        let temp_dir = tempdir().unwrap();
        let file_path = temp_dir.path().join("not_a_dir");
        fs::write(&file_path, "").unwrap();

        let config = Config {
            backup: BackupConfig {
                destination: Some(file_path.to_string_lossy().to_string()),
                ..Default::default()
            },
            ..Default::default()
        };
        let result = validate_config(&config);
        assert!(result.unwrap_err().to_string().contains("is not a directory"));
    }
}
