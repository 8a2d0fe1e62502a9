//! Command implementations for the grip CLI.
//!
//! Each submodule maps onto one subcommand and owns its terminal output;
//! the transition engine itself never prints.

pub mod configure;
pub mod doctor;
pub mod install;
pub mod list;
pub mod remove;
pub mod search;
pub mod update;

pub use configure::configure;
pub use doctor::doctor;
pub use install::install;
pub use list::list;
pub use remove::remove;
pub use search::search;
pub use update::update;

use crate::error::{GripError, Result};
use crate::installer::Outcome;
use crate::store::PackageStore;
use colored::Colorize;

/// Print what a transition did.
pub(crate) fn report(outcome: &Outcome) {
    match outcome {
        Outcome::Installed {
            owner,
            repo,
            version,
        } => {
            println!(
                "{} Installed {}@{}",
                "✓".green(),
                format!("{owner}/{repo}").bold(),
                version
            );
        }
        Outcome::Updated {
            owner,
            repo,
            from,
            to,
        } => {
            println!(
                "{} Updated {} from {} to {}",
                "✓".green(),
                format!("{owner}/{repo}").bold(),
                from,
                to.green()
            );
        }
        Outcome::Removed { owner, repo } => {
            println!(
                "{} Removed {}",
                "✓".green(),
                format!("{owner}/{repo}").bold()
            );
        }
        Outcome::SkippedFrozen {
            owner,
            repo,
            version,
        } => {
            println!(
                "{} Skipping frozen package {}@{}",
                "❄".cyan(),
                format!("{owner}/{repo}").bold(),
                version
            );
        }
        Outcome::AlreadyLatest {
            owner,
            repo,
            version,
        } => {
            println!(
                "{} is already at latest version {}",
                format!("{owner}/{repo}").bold(),
                version
            );
        }
        Outcome::Planned { description } => {
            println!("{} Would {}", "→".cyan(), description);
        }
        Outcome::Cancelled => {
            println!("Cancelled");
        }
    }
}

/// Resolve a CLI package argument against the store: either an explicit
/// `owner/repo`, or a bare repo name when exactly one record matches it.
pub(crate) fn find_installed(store: &PackageStore, input: &str) -> Result<(String, String)> {
    if let Some((owner, repo)) = input.split_once('/') {
        return Ok((owner.to_string(), repo.to_string()));
    }

    let matches: Vec<_> = store
        .list()
        .into_iter()
        .filter(|p| p.repo == input)
        .collect();

    match matches.as_slice() {
        [] => Err(GripError::NotFound(input.to_string())),
        [only] => Ok((only.owner.clone(), only.repo.clone())),
        many => Err(GripError::Ambiguous {
            query: input.to_string(),
            count: many.len(),
        }),
    }
}
