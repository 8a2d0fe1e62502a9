//! Package transitions - install, update, remove.
//!
//! A package is either absent or installed; transitions run to completion or
//! fail, there is no persisted in-progress state. Each transition touches
//! three coupled resources in a fixed order:
//!
//! - **Install**: download binary, chmod, create symlink, insert record.
//!   The record is written last, so any single failure leaves no record; a
//!   failed insert triggers best-effort removal of the symlink and binary.
//! - **Update**: download the new binary, chmod, swap the symlink via a
//!   temp link renamed into place (no window without a symlink), update the
//!   record, then best-effort delete the old binary.
//! - **Remove**: symlink, then binary (both tolerate already-missing), then
//!   the record, which must exist.
//!
//! Crash windows between the filesystem writes and the record write are
//! accepted and closed by the auditor; there is no cross-resource
//! transaction.

use crate::asset::select_asset;
use crate::config::Config;
use crate::error::{GripError, Result};
use crate::github::ReleaseSource;
use crate::platform::Platform;
use crate::resolver::{self, RepoPicker};
use crate::store::{Package, PackageStore};
use std::fs;
use std::os::unix::fs as unix_fs;
use std::path::{Path, PathBuf};
use tracing::{debug, warn};

/// Flags shared by the transition operations.
#[derive(Debug, Clone, Default)]
pub struct Options {
    pub non_interactive: bool,
    pub freeze: bool,
    pub dry_run: bool,
}

/// What a transition did (or would do, for dry runs).
#[derive(Debug, Clone, PartialEq)]
pub enum Outcome {
    Installed {
        owner: String,
        repo: String,
        version: String,
    },
    Updated {
        owner: String,
        repo: String,
        from: String,
        to: String,
    },
    Removed {
        owner: String,
        repo: String,
    },
    /// Frozen packages are skipped, not failed.
    SkippedFrozen {
        owner: String,
        repo: String,
        version: String,
    },
    AlreadyLatest {
        owner: String,
        repo: String,
        version: String,
    },
    /// Dry-run plan; nothing was mutated.
    Planned {
        description: String,
    },
    /// The user backed out; not an error.
    Cancelled,
}

/// Install a package resolved from free-form `input`.
pub async fn install(
    input: &str,
    platform: &Platform,
    cfg: &Config,
    store: &mut PackageStore,
    source: &impl ReleaseSource,
    picker: &impl RepoPicker,
    opts: &Options,
) -> Result<Outcome> {
    let Some(repository) = resolver::resolve(source, picker, input).await? else {
        return Ok(Outcome::Cancelled);
    };
    let owner = repository.owner.login.clone();
    let repo = repository.name.clone();

    install_resolved(&owner, &repo, platform, cfg, store, source, picker, opts)
        .await
        .map_err(|e| e.annotate("install", &owner, &repo))
}

#[allow(clippy::too_many_arguments)]
async fn install_resolved(
    owner: &str,
    repo: &str,
    platform: &Platform,
    cfg: &Config,
    store: &mut PackageStore,
    source: &impl ReleaseSource,
    picker: &impl RepoPicker,
    opts: &Options,
) -> Result<Outcome> {
    if store.get(owner, repo).is_some() {
        return Err(GripError::AlreadyExists {
            owner: owner.to_string(),
            repo: repo.to_string(),
        });
    }

    let release = source.latest_release(owner, repo).await?;
    let asset = select_asset(platform, &release.assets)?.clone();
    let binary_name = binary_file_name(owner, repo, &release.tag_name, &asset.name);

    let dirs = cfg.directories();
    let binary_path = dirs.bin_actual.join(&binary_name);
    let symlink_path = dirs.bin.join(symlink_file_name(repo, platform));

    if opts.dry_run {
        return Ok(Outcome::Planned {
            description: format!(
                "install {owner}/{repo}@{} (asset {}, binary {}, symlink {})",
                release.tag_name,
                asset.name,
                binary_path.display(),
                symlink_path.display(),
            ),
        });
    }

    if !picker.confirm(&format!(
        "Install {owner}/{repo} {} ({})?",
        release.tag_name, asset.name
    ))? {
        return Ok(Outcome::Cancelled);
    }

    fs::create_dir_all(&dirs.bin_actual)?;
    fs::create_dir_all(&dirs.bin)?;

    source.download_asset(&asset, &binary_path).await?;

    if let Err(e) = set_executable(&binary_path) {
        best_effort_remove(&binary_path);
        return Err(e);
    }

    if let Err(e) = unix_fs::symlink(&binary_path, &symlink_path) {
        best_effort_remove(&binary_path);
        return Err(e.into());
    }

    let pkg = Package::new(
        owner,
        repo,
        &release.tag_name,
        &binary_name,
        opts.freeze,
        platform.to_string(),
    );
    if let Err(e) = store.add(pkg) {
        // Compensate in reverse order; the original error wins.
        best_effort_remove(&symlink_path);
        best_effort_remove(&binary_path);
        return Err(e);
    }

    Ok(Outcome::Installed {
        owner: owner.to_string(),
        repo: repo.to_string(),
        version: release.tag_name,
    })
}

/// Update an installed package to the latest release.
pub async fn update(
    owner: &str,
    repo: &str,
    platform: &Platform,
    cfg: &Config,
    store: &mut PackageStore,
    source: &impl ReleaseSource,
    picker: &impl RepoPicker,
    opts: &Options,
) -> Result<Outcome> {
    update_inner(owner, repo, platform, cfg, store, source, picker, opts)
        .await
        .map_err(|e| e.annotate("update", owner, repo))
}

#[allow(clippy::too_many_arguments)]
async fn update_inner(
    owner: &str,
    repo: &str,
    platform: &Platform,
    cfg: &Config,
    store: &mut PackageStore,
    source: &impl ReleaseSource,
    picker: &impl RepoPicker,
    opts: &Options,
) -> Result<Outcome> {
    let Some(pkg) = store.get(owner, repo).cloned() else {
        return Err(GripError::NotFound(format!("{owner}/{repo}")));
    };

    // Batch callers filter frozen packages already; this is a re-check so a
    // direct update of a frozen package skips instead of mutating.
    if pkg.frozen {
        return Ok(Outcome::SkippedFrozen {
            owner: pkg.owner,
            repo: pkg.repo,
            version: pkg.version,
        });
    }

    let release = source.latest_release(owner, repo).await?;
    if release.tag_name == pkg.version {
        return Ok(Outcome::AlreadyLatest {
            owner: pkg.owner,
            repo: pkg.repo,
            version: pkg.version,
        });
    }

    let asset = select_asset(platform, &release.assets)?.clone();
    let new_binary_name = binary_file_name(owner, repo, &release.tag_name, &asset.name);

    let dirs = cfg.directories();
    let old_binary_path = dirs.bin_actual.join(&pkg.binary);
    let new_binary_path = dirs.bin_actual.join(&new_binary_name);
    let symlink_path = dirs.bin.join(symlink_file_name(repo, platform));

    if opts.dry_run {
        return Ok(Outcome::Planned {
            description: format!(
                "update {owner}/{repo} from {} to {} (asset {})",
                pkg.version, release.tag_name, asset.name
            ),
        });
    }

    if !picker.confirm(&format!(
        "Update {owner}/{repo} from {} to {} ({})?",
        pkg.version, release.tag_name, asset.name
    ))? {
        return Ok(Outcome::Cancelled);
    }

    fs::create_dir_all(&dirs.bin_actual)?;
    fs::create_dir_all(&dirs.bin)?;

    source.download_asset(&asset, &new_binary_path).await?;

    if let Err(e) = set_executable(&new_binary_path) {
        best_effort_remove(&new_binary_path);
        return Err(e);
    }

    if let Err(e) = replace_symlink(&new_binary_path, &symlink_path) {
        best_effort_remove(&new_binary_path);
        return Err(e);
    }

    let mut updated = pkg.clone();
    updated.version = release.tag_name.clone();
    updated.binary = new_binary_name.clone();
    updated.platform = platform.to_string();
    if let Err(e) = store.update(&updated) {
        best_effort_remove(&symlink_path);
        best_effort_remove(&new_binary_path);
        return Err(e);
    }

    // The update already succeeded; losing the old binary is not fatal.
    if pkg.binary != new_binary_name {
        best_effort_remove(&old_binary_path);
    }

    Ok(Outcome::Updated {
        owner: owner.to_string(),
        repo: repo.to_string(),
        from: pkg.version,
        to: release.tag_name,
    })
}

/// Remove an installed package.
pub fn remove(
    owner: &str,
    repo: &str,
    platform: &Platform,
    cfg: &Config,
    store: &mut PackageStore,
    opts: &Options,
) -> Result<Outcome> {
    remove_inner(owner, repo, platform, cfg, store, opts)
        .map_err(|e| e.annotate("remove", owner, repo))
}

fn remove_inner(
    owner: &str,
    repo: &str,
    platform: &Platform,
    cfg: &Config,
    store: &mut PackageStore,
    opts: &Options,
) -> Result<Outcome> {
    let Some(pkg) = store.get(owner, repo).cloned() else {
        return Err(GripError::NotFound(format!("{owner}/{repo}")));
    };

    let dirs = cfg.directories();
    let binary_path = dirs.bin_actual.join(&pkg.binary);
    let symlink_path = dirs.bin.join(symlink_file_name(repo, platform));

    if opts.dry_run {
        return Ok(Outcome::Planned {
            description: format!(
                "remove {owner}/{repo}@{} (binary {}, symlink {})",
                pkg.version,
                binary_path.display(),
                symlink_path.display(),
            ),
        });
    }

    // Symlink first, then binary, then the record: a crash mid-removal
    // never leaves a dangling symlink without a record still marking the
    // package installed.
    remove_if_exists(&symlink_path)?;
    remove_if_exists(&binary_path)?;
    store.delete(owner, repo)?;

    Ok(Outcome::Removed {
        owner: owner.to_string(),
        repo: repo.to_string(),
    })
}

/// Result of a batch update run.
#[derive(Debug, Default)]
pub struct UpdateReport {
    pub outcomes: Vec<Outcome>,
    pub failures: Vec<(String, GripError)>,
}

/// Update every installed package sequentially, continuing past individual
/// failures. Frozen packages are filtered out up front.
pub async fn update_all(
    platform: &Platform,
    cfg: &Config,
    store: &mut PackageStore,
    source: &impl ReleaseSource,
    picker: &impl RepoPicker,
    opts: &Options,
) -> Result<UpdateReport> {
    let targets: Vec<(String, String, String, bool)> = store
        .list()
        .iter()
        .map(|p| (p.owner.clone(), p.repo.clone(), p.version.clone(), p.frozen))
        .collect();

    let mut report = UpdateReport::default();
    for (owner, repo, version, frozen) in targets {
        if frozen {
            report.outcomes.push(Outcome::SkippedFrozen {
                owner,
                repo,
                version,
            });
            continue;
        }

        match update(&owner, &repo, platform, cfg, store, source, picker, opts).await {
            Ok(outcome) => report.outcomes.push(outcome),
            Err(e) => {
                debug!(package = %format!("{owner}/{repo}"), error = %e, "update failed");
                report.failures.push((format!("{owner}/{repo}"), e));
            }
        }
    }

    Ok(report)
}

/// Binary-store file name: `owner-repo-tag`, plus `.exe` when the asset
/// indicates a Windows binary.
fn binary_file_name(owner: &str, repo: &str, tag: &str, asset_name: &str) -> String {
    let mut name = format!("{owner}-{repo}-{tag}");
    if asset_name.to_lowercase().ends_with(".exe") {
        name.push_str(".exe");
    }
    name
}

/// Symlinks are named after the repo alone, not owner/repo.
fn symlink_file_name(repo: &str, platform: &Platform) -> String {
    if platform.os == "windows" {
        format!("{repo}.exe")
    } else {
        repo.to_string()
    }
}

fn set_executable(path: &Path) -> Result<()> {
    use std::os::unix::fs::PermissionsExt;
    fs::set_permissions(path, fs::Permissions::from_mode(0o755))?;
    Ok(())
}

/// Swap a symlink without a window where it is missing: create a temp link
/// next to the target and rename it into place.
fn replace_symlink(target: &Path, link: &Path) -> Result<()> {
    let tmp = temp_link_path(link);
    best_effort_remove(&tmp);
    unix_fs::symlink(target, &tmp)?;
    if let Err(e) = fs::rename(&tmp, link) {
        best_effort_remove(&tmp);
        return Err(e.into());
    }
    Ok(())
}

fn temp_link_path(link: &Path) -> PathBuf {
    let name = link
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_default();
    link.with_file_name(format!(".{name}.new"))
}

fn remove_if_exists(path: &Path) -> Result<()> {
    match fs::remove_file(path) {
        Ok(()) => Ok(()),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
        Err(e) => Err(e.into()),
    }
}

/// Cleanup that must never mask the error it runs under.
fn best_effort_remove(path: &Path) {
    if let Err(e) = fs::remove_file(path) {
        if e.kind() != std::io::ErrorKind::NotFound {
            warn!(path = %path.display(), error = %e, "cleanup failed");
        }
    }
}
