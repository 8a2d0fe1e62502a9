use crate::audit;
use crate::config::Config;
use crate::error::Result;
use crate::store::PackageStore;
use colored::Colorize;

/// Check metadata/filesystem integrity; `--fix` deletes broken records.
pub fn doctor(cfg: &Config, store: &mut PackageStore, fix: bool) -> Result<()> {
    let report = if fix {
        audit::fix(cfg, store)?
    } else {
        audit::audit(cfg, store)?
    };

    if report.violations.is_empty() {
        println!(
            "{} {} package record(s) checked, no integrity violations",
            "✓".green(),
            report.checked
        );
    } else {
        for v in &report.violations {
            let action = if fix { "removed record for" } else { "broken:" };
            println!(
                "{} {} {} ({})",
                "✗".red(),
                action,
                format!("{}/{}", v.owner, v.repo).bold(),
                v.reason
            );
        }
    }

    if !report.orphans.is_empty() {
        println!(
            "{} {} orphaned file(s) in the binary store (not removed):",
            "⚠".yellow(),
            report.orphans.len()
        );
        for path in &report.orphans {
            println!("  {}", path.display());
        }
    }

    if !fix {
        if let Some(first) = report.violations.into_iter().next() {
            return Err(first.into_error());
        }
    }

    Ok(())
}
