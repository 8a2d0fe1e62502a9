//! Process configuration and on-disk directory layout.
//!
//! Configuration is an immutable value built once in `main` and passed into
//! every component constructor. Nothing in the core reads ambient global
//! state, which keeps the engine and store testable against a tempdir root.

use crate::error::Result;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::PathBuf;

/// User-facing configuration, persisted as JSON under `~/.config/grip/`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// Directory where grip stores all of its data.
    pub root_dir: PathBuf,
    /// GitHub token for API access (optional, raises rate limits).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub github_token: Option<String>,
}

/// Resolved directory layout under the root.
#[derive(Debug, Clone)]
pub struct Directories {
    pub root: PathBuf,
    /// Command symlinks users put on their PATH.
    pub bin: PathBuf,
    /// Actual downloaded binaries, named `owner-repo-version`.
    pub bin_actual: PathBuf,
    pub config: PathBuf,
    pub db: PathBuf,
    pub logs: PathBuf,
}

fn home_dir() -> PathBuf {
    std::env::var_os("HOME")
        .map(PathBuf::from)
        .unwrap_or_else(|| PathBuf::from("."))
}

fn config_file_path() -> PathBuf {
    home_dir().join(".config").join("grip").join("config.json")
}

impl Default for Config {
    fn default() -> Self {
        Self {
            root_dir: home_dir().join("grip"),
            github_token: None,
        }
    }
}

impl Config {
    /// Build a config rooted at an explicit directory (used by tests).
    pub fn with_root(root_dir: impl Into<PathBuf>) -> Self {
        Self {
            root_dir: root_dir.into(),
            github_token: None,
        }
    }

    /// Load from `~/.config/grip/config.json`, falling back to defaults
    /// when no config file exists yet.
    pub fn load() -> Result<Self> {
        let path = config_file_path();
        match fs::read_to_string(&path) {
            Ok(contents) => Ok(serde_json::from_str(&contents)?),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(Self::default()),
            Err(e) => Err(e.into()),
        }
    }

    /// Persist to `~/.config/grip/config.json`.
    pub fn save(&self) -> Result<()> {
        let path = config_file_path();
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }
        let json = serde_json::to_string_pretty(self)?;
        fs::write(&path, json)?;
        Ok(())
    }

    pub fn directories(&self) -> Directories {
        Directories {
            root: self.root_dir.clone(),
            bin: self.root_dir.join("bin"),
            bin_actual: self.root_dir.join("bin").join("actual"),
            config: self.root_dir.join("config"),
            db: self.root_dir.join("db"),
            logs: self.root_dir.join("logs"),
        }
    }

    /// Create the full directory tree if missing. Safe to call on every
    /// process start.
    pub fn ensure_directories(&self) -> Result<()> {
        let dirs = self.directories();
        for dir in [
            &dirs.root,
            &dirs.bin,
            &dirs.bin_actual,
            &dirs.config,
            &dirs.db,
            &dirs.logs,
        ] {
            fs::create_dir_all(dir)?;
        }

        let readme = dirs.bin.join("README.md");
        if !readme.exists() {
            fs::write(
                &readme,
                "# grip binaries\n\nThis directory contains symlinks to installed binaries.\n\
                 Do not modify its contents manually; use the `grip` command instead.\n",
            )?;
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn directories_hang_off_root() {
        let cfg = Config::with_root("/tmp/grip-root");
        let dirs = cfg.directories();
        assert_eq!(dirs.bin, PathBuf::from("/tmp/grip-root/bin"));
        assert_eq!(dirs.bin_actual, PathBuf::from("/tmp/grip-root/bin/actual"));
        assert_eq!(dirs.db, PathBuf::from("/tmp/grip-root/db"));
    }

    #[test]
    fn ensure_directories_is_idempotent() {
        let tmp = tempfile::tempdir().unwrap();
        let cfg = Config::with_root(tmp.path().join("grip"));
        cfg.ensure_directories().unwrap();
        cfg.ensure_directories().unwrap();
        assert!(cfg.directories().bin_actual.is_dir());
        assert!(cfg.directories().bin.join("README.md").is_file());
    }
}
