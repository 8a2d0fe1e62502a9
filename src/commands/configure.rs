use crate::config::Config;
use crate::error::{GripError, Result};
use colored::Colorize;
use std::path::PathBuf;

const OPERATIONS: &[(&str, &str)] = &[
    ("token", "Set GitHub API token"),
    ("root", "Change root directory"),
    ("show", "Show current configuration"),
];

/// Interactively edit the configuration, or just print it with `--show`.
pub fn configure(cfg: &mut Config, show: bool) -> Result<()> {
    if show {
        print_config(cfg);
        return Ok(());
    }

    let options: Vec<String> = OPERATIONS
        .iter()
        .map(|(name, desc)| format!("{name} - {desc}"))
        .collect();

    let choice = match inquire::Select::new("Configure grip", options).raw_prompt() {
        Ok(choice) => choice.index,
        Err(inquire::InquireError::OperationCanceled)
        | Err(inquire::InquireError::OperationInterrupted) => return Ok(()),
        Err(e) => return Err(GripError::Other(anyhow::Error::new(e))),
    };

    match OPERATIONS[choice].0 {
        "token" => configure_token(cfg),
        "root" => configure_root(cfg),
        _ => {
            print_config(cfg);
            Ok(())
        }
    }
}

fn configure_token(cfg: &mut Config) -> Result<()> {
    let token = match inquire::Password::new("GitHub token (empty to clear):")
        .without_confirmation()
        .prompt()
    {
        Ok(token) => token,
        Err(inquire::InquireError::OperationCanceled)
        | Err(inquire::InquireError::OperationInterrupted) => return Ok(()),
        Err(e) => return Err(GripError::Other(anyhow::Error::new(e))),
    };

    let token = token.trim();
    if token.is_empty() {
        cfg.github_token = None;
        println!("GitHub token cleared");
    } else {
        cfg.github_token = Some(token.to_string());
        println!("GitHub token updated");
    }

    cfg.save()
}

fn configure_root(cfg: &mut Config) -> Result<()> {
    let prompt = format!("New root directory (current: {}):", cfg.root_dir.display());
    let input = match inquire::Text::new(&prompt).prompt() {
        Ok(input) => input,
        Err(inquire::InquireError::OperationCanceled)
        | Err(inquire::InquireError::OperationInterrupted) => return Ok(()),
        Err(e) => return Err(GripError::Other(anyhow::Error::new(e))),
    };

    let input = input.trim();
    if input.is_empty() {
        println!("Root directory unchanged");
        return Ok(());
    }

    cfg.root_dir = expand_home(input);
    cfg.save()?;

    println!("Root directory changed to {}", cfg.root_dir.display());
    println!("{}", "Note: move any existing packages there manually".yellow());
    Ok(())
}

fn expand_home(path: &str) -> PathBuf {
    if let Some(rest) = path.strip_prefix("~/") {
        if let Some(home) = std::env::var_os("HOME") {
            return PathBuf::from(home).join(rest);
        }
    } else if path == "~" {
        if let Some(home) = std::env::var_os("HOME") {
            return PathBuf::from(home);
        }
    }
    PathBuf::from(path)
}

fn print_config(cfg: &Config) {
    println!("Current configuration:");
    println!("  Root directory: {}", cfg.root_dir.display());
    let token = if cfg.github_token.is_some() {
        "[set]"
    } else {
        "[not set]"
    };
    println!("  GitHub token:   {token}");
}
