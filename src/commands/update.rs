use crate::config::Config;
use crate::error::Result;
use crate::github::ReleaseSource;
use crate::installer::{self, Options, UpdateReport};
use crate::platform::Platform;
use crate::resolver::{NonInteractive, RepoPicker, TerminalPicker};
use crate::store::PackageStore;
use colored::Colorize;

/// Update named packages, or every installed package when none are given.
pub async fn update(
    packages: &[String],
    cfg: &Config,
    store: &mut PackageStore,
    source: &impl ReleaseSource,
    opts: &Options,
) -> Result<()> {
    if opts.non_interactive {
        run(packages, cfg, store, source, &NonInteractive, opts).await
    } else {
        run(packages, cfg, store, source, &TerminalPicker, opts).await
    }
}

async fn run(
    packages: &[String],
    cfg: &Config,
    store: &mut PackageStore,
    source: &impl ReleaseSource,
    picker: &impl RepoPicker,
    opts: &Options,
) -> Result<()> {
    let platform = Platform::current();

    let report = if packages.is_empty() {
        if store.list().is_empty() {
            println!("No packages installed");
            return Ok(());
        }
        installer::update_all(&platform, cfg, store, source, picker, opts).await?
    } else {
        let mut report = UpdateReport::default();
        for package in packages {
            let (owner, repo) = super::find_installed(store, package)?;
            match installer::update(&owner, &repo, &platform, cfg, store, source, picker, opts)
                .await
            {
                Ok(outcome) => report.outcomes.push(outcome),
                Err(e) => report.failures.push((format!("{owner}/{repo}"), e)),
            }
        }
        report
    };

    for outcome in &report.outcomes {
        super::report(outcome);
    }
    for (package, error) in &report.failures {
        eprintln!("{} {}: {}", "✗".red(), package.bold(), error);
    }

    if !report.failures.is_empty() {
        return Err(crate::error::GripError::Other(anyhow::anyhow!(
            "{} package(s) failed to update",
            report.failures.len()
        )));
    }

    Ok(())
}
