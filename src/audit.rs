//! Integrity auditing - detecting drift between the metadata store and the
//! filesystem.
//!
//! A record is broken when its binary identifier is empty, escapes the
//! binary store, or does not follow the `owner-repo-version[.exe]` naming
//! convention. Fix mode deletes broken records. Files in the binary store
//! that no record references are reported as orphans but never deleted;
//! cleaning those up stays a manual decision.

use crate::config::Config;
use crate::error::{GripError, Result};
use crate::store::{Package, PackageStore};
use std::collections::HashSet;
use std::fs;
use std::path::{Component, Path, PathBuf};

/// A broken package record.
#[derive(Debug, Clone, PartialEq)]
pub struct Violation {
    pub owner: String,
    pub repo: String,
    pub reason: String,
}

impl Violation {
    pub fn into_error(self) -> GripError {
        GripError::Integrity {
            owner: self.owner,
            repo: self.repo,
            reason: self.reason,
        }
    }
}

/// What an audit pass found.
#[derive(Debug, Default)]
pub struct AuditReport {
    pub checked: usize,
    pub violations: Vec<Violation>,
    /// Files in the binary store no record references.
    pub orphans: Vec<PathBuf>,
}

/// Check every record without mutating anything.
pub fn audit(cfg: &Config, store: &PackageStore) -> Result<AuditReport> {
    let dirs = cfg.directories();
    let mut report = AuditReport::default();

    for pkg in store.list() {
        report.checked += 1;
        if let Some(reason) = check_record(pkg, &dirs.bin_actual) {
            report.violations.push(Violation {
                owner: pkg.owner.clone(),
                repo: pkg.repo.clone(),
                reason,
            });
        }
    }

    report.orphans = find_orphans(&dirs.bin_actual, store)?;
    Ok(report)
}

/// Audit and delete every broken record. Orphaned files are still only
/// reported.
pub fn fix(cfg: &Config, store: &mut PackageStore) -> Result<AuditReport> {
    let report = audit(cfg, store)?;
    for violation in &report.violations {
        store.delete(&violation.owner, &violation.repo)?;
    }
    Ok(report)
}

fn check_record(pkg: &Package, bin_actual: &Path) -> Option<String> {
    if pkg.binary.trim().is_empty() {
        return Some("binary identifier is empty".to_string());
    }

    if !stays_within_store(&pkg.binary, bin_actual) {
        return Some(format!(
            "binary path '{}' escapes the binary store",
            pkg.binary
        ));
    }

    let expected = format!("{}-{}-{}", pkg.owner, pkg.repo, pkg.version);
    let actual = pkg.binary.strip_suffix(".exe").unwrap_or(&pkg.binary);
    if actual != expected {
        return Some(format!(
            "binary name '{}' does not match '{expected}'",
            pkg.binary
        ));
    }

    None
}

/// A binary identifier must be a single plain file name; anything with
/// separators or parent components can point outside the store root.
fn stays_within_store(binary: &str, bin_actual: &Path) -> bool {
    let path = Path::new(binary);
    let mut components = path.components();
    let single_normal = matches!(components.next(), Some(Component::Normal(_)))
        && components.next().is_none();

    single_normal && bin_actual.join(binary).starts_with(bin_actual)
}

fn find_orphans(bin_actual: &Path, store: &PackageStore) -> Result<Vec<PathBuf>> {
    let entries = match fs::read_dir(bin_actual) {
        Ok(entries) => entries,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(vec![]),
        Err(e) => return Err(e.into()),
    };

    let referenced: HashSet<&str> = store.list().iter().map(|p| p.binary.as_str()).collect();

    let mut orphans = Vec::new();
    for entry in entries {
        let entry = entry?;
        let name = entry.file_name().to_string_lossy().into_owned();
        if !referenced.contains(name.as_str()) {
            orphans.push(entry.path());
        }
    }
    orphans.sort();
    Ok(orphans)
}
