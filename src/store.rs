//! Metadata store - the durable record of what is considered installed.
//!
//! One [`Package`] record exists per installed (owner, repo) pair, persisted
//! as a JSON document at `{root}/db/packages.json`. The record is the single
//! source of truth for "is this package installed"; the filesystem can
//! transiently diverge after a crash, which the auditor closes.
//!
//! Every mutation is written through to disk immediately, via a temp file
//! renamed into place so a crash never leaves a half-written store.

use crate::error::{GripError, Result};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fs;
use std::path::PathBuf;

/// An installed package record.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Package {
    pub owner: String,
    pub repo: String,
    /// Release tag this package is at (e.g. "v1.0.0").
    pub version: String,
    /// File name in the binary store (`owner-repo-version[.exe]`).
    pub binary: String,
    /// Frozen packages are excluded from batch updates.
    pub frozen: bool,
    /// Normalized "os-arch" the binary was selected for.
    pub platform: String,
    pub installed_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Package {
    pub fn new(
        owner: impl Into<String>,
        repo: impl Into<String>,
        version: impl Into<String>,
        binary: impl Into<String>,
        frozen: bool,
        platform: impl Into<String>,
    ) -> Self {
        let now = Utc::now();
        Self {
            owner: owner.into(),
            repo: repo.into(),
            version: version.into(),
            binary: binary.into(),
            frozen,
            platform: platform.into(),
            installed_at: now,
            updated_at: now,
        }
    }
}

/// CRUD over package records, keyed by (owner, repo).
pub struct PackageStore {
    path: PathBuf,
    packages: BTreeMap<(String, String), Package>,
}

impl PackageStore {
    /// Open the store at `path`, creating an empty one if missing.
    /// Idempotent; safe to call on every process start.
    pub fn open(path: impl Into<PathBuf>) -> Result<Self> {
        let path = path.into();

        let packages = match fs::read_to_string(&path) {
            Ok(contents) => {
                let list: Vec<Package> = serde_json::from_str(&contents)?;
                list.into_iter()
                    .map(|p| ((p.owner.clone(), p.repo.clone()), p))
                    .collect()
            }
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => BTreeMap::new(),
            Err(e) => return Err(e.into()),
        };

        let store = Self { path, packages };
        if !store.path.exists() {
            store.persist()?;
        }
        Ok(store)
    }

    /// Insert a new record. The store assigns both timestamps. Fails with
    /// `AlreadyExists` when the (owner, repo) key is taken.
    pub fn add(&mut self, mut pkg: Package) -> Result<Package> {
        let key = (pkg.owner.clone(), pkg.repo.clone());
        if self.packages.contains_key(&key) {
            return Err(GripError::AlreadyExists {
                owner: pkg.owner,
                repo: pkg.repo,
            });
        }

        let now = Utc::now();
        pkg.installed_at = now;
        pkg.updated_at = now;
        self.packages.insert(key, pkg.clone());
        self.persist()?;
        Ok(pkg)
    }

    /// Look up a record. Missing is not an error.
    pub fn get(&self, owner: &str, repo: &str) -> Option<&Package> {
        self.packages.get(&(owner.to_string(), repo.to_string()))
    }

    /// All records, ordered by owner then repo.
    pub fn list(&self) -> Vec<&Package> {
        self.packages.values().collect()
    }

    /// Overwrite the mutable fields (version, binary, frozen, platform) of
    /// an existing record, bumping `updated_at`.
    pub fn update(&mut self, pkg: &Package) -> Result<Package> {
        let key = (pkg.owner.clone(), pkg.repo.clone());
        let Some(existing) = self.packages.get_mut(&key) else {
            return Err(GripError::NotFound(format!("{}/{}", pkg.owner, pkg.repo)));
        };

        existing.version = pkg.version.clone();
        existing.binary = pkg.binary.clone();
        existing.frozen = pkg.frozen;
        existing.platform = pkg.platform.clone();
        existing.updated_at = Utc::now();
        let updated = existing.clone();
        self.persist()?;
        Ok(updated)
    }

    /// Delete a record. Errors when the key does not exist.
    pub fn delete(&mut self, owner: &str, repo: &str) -> Result<()> {
        let key = (owner.to_string(), repo.to_string());
        if self.packages.remove(&key).is_none() {
            return Err(GripError::NotFound(format!("{owner}/{repo}")));
        }
        self.persist()?;
        Ok(())
    }

    fn persist(&self) -> Result<()> {
        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent)?;
        }

        let list: Vec<&Package> = self.packages.values().collect();
        let json = serde_json::to_string_pretty(&list)?;

        let tmp = self.path.with_extension("json.tmp");
        fs::write(&tmp, json)?;
        fs::rename(&tmp, &self.path)?;
        Ok(())
    }
}
