//! GitHub REST API client.
//!
//! This module provides a [`GitHubClient`] for the three upstream operations
//! the engine needs: fetching releases, searching repositories, and
//! downloading release assets. It handles timeout management, token
//! authentication, and `Link`-header pagination.
//!
//! The [`ReleaseSource`] trait is the seam between the engine and the
//! network; tests substitute an in-memory implementation.

use crate::error::{GripError, Result};
use chrono::{DateTime, Utc};
use indicatif::{ProgressBar, ProgressStyle};
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::Duration;
use tokio::fs;
use tokio::io::AsyncWriteExt;

const GITHUB_API_BASE: &str = "https://api.github.com";
const REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

/// A GitHub release.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Release {
    /// Tag name (e.g. "v1.0.0").
    pub tag_name: String,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub assets: Vec<Asset>,
    #[serde(default)]
    pub published_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub body: Option<String>,
}

/// A single downloadable file attached to a release.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Asset {
    pub name: String,
    #[serde(default)]
    pub size: u64,
    #[serde(rename = "browser_download_url")]
    pub download_url: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RepoOwner {
    pub login: String,
}

/// A repository returned by the search API.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Repository {
    pub full_name: String,
    pub name: String,
    pub owner: RepoOwner,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(rename = "stargazers_count", default)]
    pub stars: u64,
}

/// Search results, ranked as returned by the API.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SearchResults {
    pub total_count: usize,
    pub items: Vec<Repository>,
}

/// Upstream operations the transition engine depends on.
///
/// Implemented by [`GitHubClient`]; tests provide an in-memory source.
pub trait ReleaseSource {
    /// Fetch the latest release for a repository.
    fn latest_release(
        &self,
        owner: &str,
        repo: &str,
    ) -> impl Future<Output = Result<Release>> + Send;

    /// Fetch all releases, following pagination in order.
    fn releases(&self, owner: &str, repo: &str)
    -> impl Future<Output = Result<Vec<Release>>> + Send;

    /// Search repositories, accumulating all result pages.
    fn search_repositories(&self, query: &str)
    -> impl Future<Output = Result<SearchResults>> + Send;

    /// Download an asset to `dest`, creating parent directories as needed.
    fn download_asset(&self, asset: &Asset, dest: &Path)
    -> impl Future<Output = Result<()>> + Send;
}

/// GitHub API client.
#[derive(Clone)]
pub struct GitHubClient {
    client: reqwest::Client,
    token: Option<String>,
    base_url: String,
}

impl GitHubClient {
    /// Create a client, optionally authenticated with a token.
    pub fn new(token: Option<String>) -> Result<Self> {
        Self::with_base_url(token, GITHUB_API_BASE)
    }

    /// Point the client at a different API host; tests use a local server.
    pub fn with_base_url(token: Option<String>, base_url: impl Into<String>) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(REQUEST_TIMEOUT)
            .user_agent(format!("grip/{}", env!("CARGO_PKG_VERSION")))
            .build()?;

        Ok(Self {
            client,
            token,
            base_url: base_url.into(),
        })
    }

    fn get(&self, url: &str) -> reqwest::RequestBuilder {
        let mut req = self
            .client
            .get(url)
            .header("Accept", "application/vnd.github.v3+json");
        if let Some(token) = &self.token {
            req = req.header("Authorization", format!("token {token}"));
        }
        req
    }

    async fn fetch_latest_release(&self, owner: &str, repo: &str) -> Result<Release> {
        let url = format!("{}/repos/{owner}/{repo}/releases/latest", self.base_url);
        let response = self.get(&url).send().await?;

        if response.status() == reqwest::StatusCode::NOT_FOUND {
            return Err(GripError::NotFound(format!("{owner}/{repo}")));
        }
        if !response.status().is_success() {
            return Err(GripError::UpstreamStatus {
                status: response.status(),
                url,
            });
        }

        Ok(response.json().await?)
    }

    async fn fetch_releases(&self, owner: &str, repo: &str) -> Result<Vec<Release>> {
        let mut all = Vec::new();
        let mut page = 1;

        loop {
            let url = format!("{}/repos/{owner}/{repo}/releases?page={page}", self.base_url);
            let response = self.get(&url).send().await?;

            if !response.status().is_success() {
                return Err(GripError::UpstreamStatus {
                    status: response.status(),
                    url,
                });
            }

            let has_next = has_next_page(&response);
            let releases: Vec<Release> = response.json().await?;
            all.extend(releases);

            if !has_next {
                break;
            }
            page += 1;
        }

        Ok(all)
    }

    async fn fetch_search(&self, query: &str) -> Result<SearchResults> {
        let mut all = SearchResults::default();
        let mut page = 1;

        loop {
            let url = format!("{}/search/repositories", self.base_url);
            let response = self
                .get(&url)
                .query(&[("q", query), ("per_page", "100"), ("page", &page.to_string())])
                .send()
                .await?;

            if !response.status().is_success() {
                return Err(GripError::UpstreamStatus {
                    status: response.status(),
                    url: response.url().to_string(),
                });
            }

            let has_next = has_next_page(&response);
            let results: SearchResults = response.json().await?;
            all.total_count = results.total_count;
            all.items.extend(results.items);

            if !has_next {
                break;
            }
            page += 1;
        }

        Ok(all)
    }

    async fn fetch_asset(&self, asset: &Asset, dest: &Path) -> Result<()> {
        let response = self
            .get(&asset.download_url)
            .header("Accept", "application/octet-stream")
            .send()
            .await?;

        if !response.status().is_success() {
            return Err(GripError::UpstreamStatus {
                status: response.status(),
                url: asset.download_url.clone(),
            });
        }

        if let Some(parent) = dest.parent() {
            fs::create_dir_all(parent).await?;
        }

        let pb = progress_bar(asset);
        let mut file = fs::File::create(dest).await?;
        let mut response = response;
        let mut downloaded: u64 = 0;

        while let Some(chunk) = response.chunk().await? {
            file.write_all(&chunk).await?;
            downloaded += chunk.len() as u64;
            pb.set_position(downloaded);
        }

        file.flush().await?;
        pb.finish_and_clear();

        Ok(())
    }
}

impl ReleaseSource for GitHubClient {
    async fn latest_release(&self, owner: &str, repo: &str) -> Result<Release> {
        self.fetch_latest_release(owner, repo).await
    }

    async fn releases(&self, owner: &str, repo: &str) -> Result<Vec<Release>> {
        self.fetch_releases(owner, repo).await
    }

    async fn search_repositories(&self, query: &str) -> Result<SearchResults> {
        self.fetch_search(query).await
    }

    async fn download_asset(&self, asset: &Asset, dest: &Path) -> Result<()> {
        self.fetch_asset(asset, dest).await
    }
}

fn has_next_page(response: &reqwest::Response) -> bool {
    link_has_next(
        response
            .headers()
            .get(reqwest::header::LINK)
            .and_then(|v| v.to_str().ok()),
    )
}

/// True when a `Link` header value advertises another page.
fn link_has_next(link: Option<&str>) -> bool {
    link.is_some_and(|l| l.contains("rel=\"next\""))
}

fn progress_bar(asset: &Asset) -> ProgressBar {
    let pb = ProgressBar::new(asset.size);
    if let Ok(style) = ProgressStyle::default_bar()
        .template("{msg} [{bar:40.cyan/blue}] {bytes}/{total_bytes} ({bytes_per_sec}, {eta})")
    {
        pb.set_style(style.progress_chars("#>-"));
    }
    pb.set_message(format!("⬇ {}", asset.name));
    pb
}
