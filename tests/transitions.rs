// Integration tests for the install/update/remove transitions, run against
// an in-memory release source and a tempdir root. No network.

use grip::Config;
use grip::error::GripError;
use grip::github::{Asset, Release, ReleaseSource, RepoOwner, Repository, SearchResults};
use grip::installer::{self, Options, Outcome};
use grip::platform::Platform;
use grip::resolver::NonInteractive;
use grip::store::PackageStore;
use std::collections::HashMap;
use std::os::unix::fs::PermissionsExt;
use std::path::{Path, PathBuf};
use std::sync::Mutex;
use std::sync::atomic::{AtomicUsize, Ordering};

const PAYLOAD: &[u8] = b"#!/bin/sh\necho ok\n";

/// In-memory release source: one latest release per repo, downloads write a
/// fixed payload, and every upstream call is counted.
struct MockSource {
    releases: Mutex<HashMap<String, Release>>,
    search: HashMap<String, SearchResults>,
    calls: AtomicUsize,
}

impl MockSource {
    fn new() -> Self {
        Self {
            releases: Mutex::new(HashMap::new()),
            search: HashMap::new(),
            calls: AtomicUsize::new(0),
        }
    }

    /// Register a repo with a latest release carrying the usual asset trio,
    /// resolvable via an exact `owner/repo` search.
    fn with_release(mut self, owner: &str, repo: &str, tag: &str) -> Self {
        self.set_release(owner, repo, tag);
        self.search.insert(
            format!("repo:{owner}/{repo}"),
            SearchResults {
                total_count: 1,
                items: vec![Repository {
                    full_name: format!("{owner}/{repo}"),
                    name: repo.to_string(),
                    owner: RepoOwner {
                        login: owner.to_string(),
                    },
                    description: None,
                    stars: 100,
                }],
            },
        );
        self
    }

    fn set_release(&self, owner: &str, repo: &str, tag: &str) {
        let release = Release {
            tag_name: tag.to_string(),
            name: None,
            assets: vec![
                asset(&format!("{repo}-{tag}-darwin-arm64")),
                asset(&format!("{repo}-{tag}-linux-amd64")),
                asset(&format!("{repo}-{tag}-windows-amd64.exe")),
            ],
            published_at: None,
            body: None,
        };
        self.releases
            .lock()
            .unwrap()
            .insert(format!("{owner}/{repo}"), release);
    }

    fn call_count(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

fn asset(name: &str) -> Asset {
    Asset {
        name: name.to_string(),
        size: PAYLOAD.len() as u64,
        download_url: format!("mock://{name}"),
    }
}

impl ReleaseSource for MockSource {
    async fn latest_release(&self, owner: &str, repo: &str) -> grip::Result<Release> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.releases
            .lock()
            .unwrap()
            .get(&format!("{owner}/{repo}"))
            .cloned()
            .ok_or_else(|| GripError::NotFound(format!("{owner}/{repo}")))
    }

    async fn releases(&self, owner: &str, repo: &str) -> grip::Result<Vec<Release>> {
        Ok(vec![self.latest_release(owner, repo).await?])
    }

    async fn search_repositories(&self, query: &str) -> grip::Result<SearchResults> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        Ok(self.search.get(query).cloned().unwrap_or_default())
    }

    async fn download_asset(&self, _asset: &Asset, dest: &Path) -> grip::Result<()> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if let Some(parent) = dest.parent() {
            std::fs::create_dir_all(parent)?;
        }
        std::fs::write(dest, PAYLOAD)?;
        Ok(())
    }
}

struct Harness {
    _tmp: tempfile::TempDir,
    cfg: Config,
    store: PackageStore,
    platform: Platform,
}

impl Harness {
    fn new() -> Self {
        let tmp = tempfile::tempdir().unwrap();
        let cfg = Config::with_root(tmp.path().join("grip"));
        cfg.ensure_directories().unwrap();
        let store = PackageStore::open(cfg.directories().db.join("packages.json")).unwrap();
        Self {
            _tmp: tmp,
            cfg,
            store,
            platform: Platform::new("linux", "amd64"),
        }
    }

    fn binary_path(&self, name: &str) -> PathBuf {
        self.cfg.directories().bin_actual.join(name)
    }

    fn symlink_path(&self, repo: &str) -> PathBuf {
        self.cfg.directories().bin.join(repo)
    }

    async fn install(&mut self, source: &MockSource, input: &str, opts: &Options) -> grip::Result<Outcome> {
        installer::install(
            input,
            &self.platform,
            &self.cfg,
            &mut self.store,
            source,
            &NonInteractive,
            opts,
        )
        .await
    }

    async fn update(&mut self, source: &MockSource, owner: &str, repo: &str, opts: &Options) -> grip::Result<Outcome> {
        installer::update(
            owner,
            repo,
            &self.platform,
            &self.cfg,
            &mut self.store,
            source,
            &NonInteractive,
            opts,
        )
        .await
    }

    fn remove(&mut self, owner: &str, repo: &str, opts: &Options) -> grip::Result<Outcome> {
        installer::remove(
            owner,
            repo,
            &self.platform,
            &self.cfg,
            &mut self.store,
            opts,
        )
    }
}

#[tokio::test]
async fn install_creates_binary_symlink_and_record() {
    let source = MockSource::new().with_release("sharkdp", "bat", "v0.24.0");
    let mut h = Harness::new();

    let outcome = h
        .install(&source, "sharkdp/bat", &Options::default())
        .await
        .unwrap();
    assert!(matches!(outcome, Outcome::Installed { ref version, .. } if version == "v0.24.0"));

    let binary = h.binary_path("sharkdp-bat-v0.24.0");
    assert_eq!(std::fs::read(&binary).unwrap(), PAYLOAD);
    let mode = std::fs::metadata(&binary).unwrap().permissions().mode();
    assert_ne!(mode & 0o111, 0, "binary must be executable");

    let link = h.symlink_path("bat");
    assert_eq!(std::fs::read_link(&link).unwrap(), binary);

    let pkg = h.store.get("sharkdp", "bat").unwrap();
    assert_eq!(pkg.version, "v0.24.0");
    assert_eq!(pkg.binary, "sharkdp-bat-v0.24.0");
    assert_eq!(pkg.platform, "linux-amd64");
    assert!(!pkg.frozen);
}

#[tokio::test]
async fn install_twice_is_already_exists_and_changes_nothing() {
    let source = MockSource::new().with_release("sharkdp", "bat", "v0.24.0");
    let mut h = Harness::new();

    h.install(&source, "sharkdp/bat", &Options::default())
        .await
        .unwrap();
    let before = h.store.get("sharkdp", "bat").unwrap().clone();

    let err = h
        .install(&source, "sharkdp/bat", &Options::default())
        .await
        .unwrap_err();
    assert!(matches!(err.root(), GripError::AlreadyExists { .. }));

    // First installation is untouched.
    assert_eq!(*h.store.get("sharkdp", "bat").unwrap(), before);
    assert!(h.binary_path("sharkdp-bat-v0.24.0").exists());
    assert!(h.symlink_path("bat").exists());
}

#[tokio::test]
async fn install_dry_run_mutates_nothing() {
    let source = MockSource::new().with_release("sharkdp", "bat", "v0.24.0");
    let mut h = Harness::new();

    let opts = Options {
        dry_run: true,
        ..Options::default()
    };
    let outcome = h.install(&source, "sharkdp/bat", &opts).await.unwrap();
    assert!(matches!(outcome, Outcome::Planned { .. }));

    assert!(h.store.get("sharkdp", "bat").is_none());
    assert!(!h.binary_path("sharkdp-bat-v0.24.0").exists());
    assert!(!h.symlink_path("bat").exists());
}

#[tokio::test]
async fn failed_symlink_leaves_no_record_and_no_binary() {
    let source = MockSource::new().with_release("sharkdp", "bat", "v0.24.0");
    let mut h = Harness::new();

    // Occupy the symlink path with a regular file so link creation fails.
    std::fs::write(h.symlink_path("bat"), b"in the way").unwrap();

    let err = h
        .install(&source, "sharkdp/bat", &Options::default())
        .await
        .unwrap_err();
    assert!(matches!(err.root(), GripError::Filesystem(_)));

    assert!(h.store.get("sharkdp", "bat").is_none());
    assert!(!h.binary_path("sharkdp-bat-v0.24.0").exists());
}

#[tokio::test]
async fn frozen_package_update_is_a_skip_with_no_calls() {
    let source = MockSource::new().with_release("sharkdp", "bat", "v0.24.0");
    let mut h = Harness::new();

    let opts = Options {
        freeze: true,
        ..Options::default()
    };
    h.install(&source, "sharkdp/bat", &opts).await.unwrap();
    source.set_release("sharkdp", "bat", "v0.25.0");

    let calls_before = source.call_count();
    let binary = h.binary_path("sharkdp-bat-v0.24.0");
    let mtime = std::fs::metadata(&binary).unwrap().modified().unwrap();

    let outcome = h
        .update(&source, "sharkdp", "bat", &Options::default())
        .await
        .unwrap();
    assert!(matches!(outcome, Outcome::SkippedFrozen { .. }));

    // Zero network calls, zero filesystem mutation.
    assert_eq!(source.call_count(), calls_before);
    assert_eq!(
        std::fs::metadata(&binary).unwrap().modified().unwrap(),
        mtime
    );
    assert_eq!(h.store.get("sharkdp", "bat").unwrap().version, "v0.24.0");
}

#[tokio::test]
async fn update_at_latest_is_a_reported_noop() {
    let source = MockSource::new().with_release("sharkdp", "bat", "v0.24.0");
    let mut h = Harness::new();

    h.install(&source, "sharkdp/bat", &Options::default())
        .await
        .unwrap();
    let calls_before = source.call_count();

    let outcome = h
        .update(&source, "sharkdp", "bat", &Options::default())
        .await
        .unwrap();
    assert!(matches!(outcome, Outcome::AlreadyLatest { ref version, .. } if version == "v0.24.0"));

    // Exactly one release fetch, no download.
    assert_eq!(source.call_count(), calls_before + 1);
    assert!(h.binary_path("sharkdp-bat-v0.24.0").exists());
}

#[tokio::test]
async fn update_swaps_binary_symlink_and_record() {
    let source = MockSource::new().with_release("sharkdp", "bat", "v0.24.0");
    let mut h = Harness::new();

    h.install(&source, "sharkdp/bat", &Options::default())
        .await
        .unwrap();
    let installed = h.store.get("sharkdp", "bat").unwrap().clone();

    source.set_release("sharkdp", "bat", "v0.25.0");
    let outcome = h
        .update(&source, "sharkdp", "bat", &Options::default())
        .await
        .unwrap();
    assert_eq!(
        outcome,
        Outcome::Updated {
            owner: "sharkdp".into(),
            repo: "bat".into(),
            from: "v0.24.0".into(),
            to: "v0.25.0".into(),
        }
    );

    let new_binary = h.binary_path("sharkdp-bat-v0.25.0");
    assert!(new_binary.exists());
    assert!(!h.binary_path("sharkdp-bat-v0.24.0").exists());
    assert_eq!(std::fs::read_link(h.symlink_path("bat")).unwrap(), new_binary);

    let pkg = h.store.get("sharkdp", "bat").unwrap();
    assert_eq!(pkg.version, "v0.25.0");
    assert_eq!(pkg.binary, "sharkdp-bat-v0.25.0");
    assert_eq!(pkg.installed_at, installed.installed_at);
    assert!(pkg.updated_at > installed.updated_at);
}

#[tokio::test]
async fn update_missing_package_is_not_found() {
    let source = MockSource::new();
    let mut h = Harness::new();

    let err = h
        .update(&source, "nobody", "nothing", &Options::default())
        .await
        .unwrap_err();
    assert!(matches!(err.root(), GripError::NotFound(_)));
}

#[tokio::test]
async fn remove_deletes_all_three_resources() {
    let source = MockSource::new().with_release("sharkdp", "bat", "v0.24.0");
    let mut h = Harness::new();

    h.install(&source, "sharkdp/bat", &Options::default())
        .await
        .unwrap();
    h.remove("sharkdp", "bat", &Options::default()).unwrap();

    assert!(h.store.get("sharkdp", "bat").is_none());
    assert!(!h.binary_path("sharkdp-bat-v0.24.0").exists());
    assert!(!h.symlink_path("bat").exists());
}

#[tokio::test]
async fn remove_tolerates_missing_files_but_not_missing_record() {
    let source = MockSource::new().with_release("sharkdp", "bat", "v0.24.0");
    let mut h = Harness::new();

    h.install(&source, "sharkdp/bat", &Options::default())
        .await
        .unwrap();

    // Simulate drift: binary and symlink already gone.
    std::fs::remove_file(h.binary_path("sharkdp-bat-v0.24.0")).unwrap();
    std::fs::remove_file(h.symlink_path("bat")).unwrap();

    let outcome = h.remove("sharkdp", "bat", &Options::default()).unwrap();
    assert!(matches!(outcome, Outcome::Removed { .. }));
    assert!(h.store.get("sharkdp", "bat").is_none());

    // A second remove has no record to delete.
    let err = h.remove("sharkdp", "bat", &Options::default()).unwrap_err();
    assert!(matches!(err.root(), GripError::NotFound(_)));
}

#[tokio::test]
async fn remove_dry_run_mutates_nothing() {
    let source = MockSource::new().with_release("sharkdp", "bat", "v0.24.0");
    let mut h = Harness::new();

    h.install(&source, "sharkdp/bat", &Options::default())
        .await
        .unwrap();

    let opts = Options {
        dry_run: true,
        ..Options::default()
    };
    let outcome = h.remove("sharkdp", "bat", &opts).unwrap();
    assert!(matches!(outcome, Outcome::Planned { .. }));

    assert!(h.store.get("sharkdp", "bat").is_some());
    assert!(h.binary_path("sharkdp-bat-v0.24.0").exists());
    assert!(h.symlink_path("bat").exists());
}

#[tokio::test]
async fn batch_update_continues_past_failures() {
    let source = MockSource::new()
        .with_release("aa", "one", "v1")
        .with_release("bb", "two", "v1")
        .with_release("cc", "three", "v1");
    let mut h = Harness::new();

    for input in ["aa/one", "bb/two", "cc/three"] {
        h.install(&source, input, &Options::default()).await.unwrap();
    }

    // New releases for the first and last; the middle one vanishes
    // upstream so its update fails.
    source.set_release("aa", "one", "v2");
    source.releases.lock().unwrap().remove("bb/two");
    source.set_release("cc", "three", "v2");

    let report = installer::update_all(
        &h.platform,
        &h.cfg,
        &mut h.store,
        &source,
        &NonInteractive,
        &Options::default(),
    )
    .await
    .unwrap();

    assert_eq!(report.failures.len(), 1);
    assert_eq!(report.failures[0].0, "bb/two");
    assert!(matches!(report.failures[0].1.root(), GripError::NotFound(_)));

    // Both remaining packages were still visited and updated.
    assert_eq!(h.store.get("aa", "one").unwrap().version, "v2");
    assert_eq!(h.store.get("cc", "three").unwrap().version, "v2");
    assert_eq!(h.store.get("bb", "two").unwrap().version, "v1");
}

#[tokio::test]
async fn batch_update_filters_frozen_packages() {
    let source = MockSource::new()
        .with_release("aa", "one", "v1")
        .with_release("bb", "two", "v1");
    let mut h = Harness::new();

    h.install(&source, "aa/one", &Options::default()).await.unwrap();
    let freeze = Options {
        freeze: true,
        ..Options::default()
    };
    h.install(&source, "bb/two", &freeze).await.unwrap();

    source.set_release("aa", "one", "v2");
    source.set_release("bb", "two", "v2");

    let report = installer::update_all(
        &h.platform,
        &h.cfg,
        &mut h.store,
        &source,
        &NonInteractive,
        &Options::default(),
    )
    .await
    .unwrap();

    assert!(report.failures.is_empty());
    assert!(report
        .outcomes
        .iter()
        .any(|o| matches!(o, Outcome::SkippedFrozen { repo, .. } if repo == "two")));
    assert_eq!(h.store.get("aa", "one").unwrap().version, "v2");
    assert_eq!(h.store.get("bb", "two").unwrap().version, "v1");
}

#[tokio::test]
async fn windows_assets_get_exe_binary_names() {
    let source = MockSource::new().with_release("cli", "cli", "v2.40.0");
    let mut h = Harness::new();
    h.platform = Platform::new("windows", "amd64");

    let outcome = h
        .install(&source, "cli/cli", &Options::default())
        .await
        .unwrap();
    assert!(matches!(outcome, Outcome::Installed { .. }));

    let pkg = h.store.get("cli", "cli").unwrap();
    assert_eq!(pkg.binary, "cli-cli-v2.40.0.exe");
    assert!(h.binary_path("cli-cli-v2.40.0.exe").exists());
    assert!(h.cfg.directories().bin.join("cli.exe").exists());
}
