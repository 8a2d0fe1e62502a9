//! Repository resolution - mapping free-form user input to one repository.
//!
//! Input like `sharkdp/bat`, `bat`, or `sharkdp` is resolved through a
//! waterfall of search queries, stopping at the first query that matches
//! anything:
//!
//! 1. `repo:owner/repo` exact match (input contains a slash; a single hit
//!    short-circuits the rest)
//! 2. `user:owner name in:name`
//! 3. `in:name input sort:stars-desc`
//! 4. `user:input sort:stars-desc`
//!
//! When a step yields more than one candidate, the ranked list is handed to
//! a [`RepoPicker`] for a single choice. Cancelling the picker aborts the
//! whole operation without an error.

use crate::error::{GripError, Result};
use crate::github::{ReleaseSource, Repository};
use colored::Colorize;

/// Capability interface for choosing among ranked candidates.
///
/// The resolver stays headless: interactive and non-interactive frontends
/// plug in here.
pub trait RepoPicker {
    /// Pick one candidate, or return `None` when the user cancels.
    fn pick(&self, query: &str, candidates: &[Repository]) -> Result<Option<Repository>>;

    /// Ask the user to confirm a mutating plan. Defaults to yes so
    /// non-interactive frontends proceed without blocking.
    fn confirm(&self, _prompt: &str) -> Result<bool> {
        Ok(true)
    }
}

/// Picker for `--non-interactive` runs: any ambiguity is a failure because
/// there is no prompting capability.
pub struct NonInteractive;

impl RepoPicker for NonInteractive {
    fn pick(&self, query: &str, candidates: &[Repository]) -> Result<Option<Repository>> {
        Err(GripError::Ambiguous {
            query: query.to_string(),
            count: candidates.len(),
        })
    }
}

/// Interactive picker backed by a terminal select prompt.
pub struct TerminalPicker;

impl RepoPicker for TerminalPicker {
    fn pick(&self, query: &str, candidates: &[Repository]) -> Result<Option<Repository>> {
        let options: Vec<String> = candidates.iter().map(describe).collect();
        let prompt = format!("Select a repository for '{query}' ({} found)", candidates.len());

        match inquire::Select::new(&prompt, options)
            .with_page_size(15)
            .raw_prompt()
        {
            Ok(choice) => Ok(Some(candidates[choice.index].clone())),
            Err(inquire::InquireError::OperationCanceled)
            | Err(inquire::InquireError::OperationInterrupted) => Ok(None),
            Err(e) => Err(GripError::Other(anyhow::Error::new(e))),
        }
    }

    fn confirm(&self, prompt: &str) -> Result<bool> {
        match inquire::Confirm::new(prompt).with_default(true).prompt() {
            Ok(answer) => Ok(answer),
            Err(inquire::InquireError::OperationCanceled)
            | Err(inquire::InquireError::OperationInterrupted) => Ok(false),
            Err(e) => Err(GripError::Other(anyhow::Error::new(e))),
        }
    }
}

fn describe(repo: &Repository) -> String {
    let mut desc = repo.description.clone().unwrap_or_default();
    const MAX: usize = 72;
    if desc.chars().count() > MAX {
        desc = desc.chars().take(MAX - 3).collect::<String>() + "...";
    }
    format!(
        "{} {} {} | {}",
        repo.full_name.bold(),
        "⭐".yellow(),
        repo.stars,
        desc
    )
}

/// Resolve `input` to a single repository.
///
/// Returns `Ok(None)` when the user cancelled the selection. Zero matches
/// across every step is `NotFound`; upstream search failures propagate.
pub async fn resolve(
    source: &impl ReleaseSource,
    picker: &impl RepoPicker,
    input: &str,
) -> Result<Option<Repository>> {
    let results = search(source, input).await?;

    let Some(mut results) = results else {
        return Err(GripError::NotFound(input.to_string()));
    };

    if results.items.is_empty() {
        return Err(GripError::NotFound(input.to_string()));
    }
    if results.items.len() == 1 {
        return Ok(Some(results.items.remove(0)));
    }

    results.items.sort_by(|a, b| b.stars.cmp(&a.stars));
    picker.pick(input, &results.items)
}

async fn search(
    source: &impl ReleaseSource,
    input: &str,
) -> Result<Option<crate::github::SearchResults>> {
    if let Some((owner, name)) = input.split_once('/') {
        let exact = source
            .search_repositories(&format!("repo:{owner}/{name}"))
            .await?;
        if exact.total_count == 1 && !exact.items.is_empty() {
            return Ok(Some(exact));
        }

        let scoped = source
            .search_repositories(&format!("user:{owner} {name} in:name"))
            .await?;
        if !scoped.items.is_empty() {
            return Ok(Some(scoped));
        }
    }

    let by_name = source
        .search_repositories(&format!("in:name {input} sort:stars-desc"))
        .await?;
    if !by_name.items.is_empty() {
        return Ok(Some(by_name));
    }

    let by_user = source
        .search_repositories(&format!("user:{input} sort:stars-desc"))
        .await?;
    if !by_user.items.is_empty() {
        return Ok(Some(by_user));
    }

    Ok(None)
}

/// Search without resolving to a single pick; used by the `search` command.
pub async fn search_candidates(
    source: &impl ReleaseSource,
    input: &str,
) -> Result<crate::github::SearchResults> {
    match search(source, input).await? {
        Some(mut results) => {
            results.items.sort_by(|a, b| b.stars.cmp(&a.stars));
            Ok(results)
        }
        None => Err(GripError::NotFound(input.to_string())),
    }
}
