use clap::{Parser, Subcommand};
use grip::installer::Options;
use grip::{Config, GitHubClient, PackageStore, commands};

#[derive(Parser)]
#[command(name = "grip")]
#[command(author, version, about = "Install binaries straight from GitHub releases", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Enable verbose output
    #[arg(short, long, global = true)]
    verbose: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Install a package from its latest GitHub release
    Install {
        /// Repository: owner/repo, a repo name, or a user to search for
        package: String,

        /// Fail on ambiguity instead of prompting
        #[arg(long)]
        non_interactive: bool,

        /// Freeze the installed version (excluded from updates)
        #[arg(long)]
        freeze: bool,

        /// Show what would be done without making changes
        #[arg(long)]
        dry_run: bool,
    },

    /// Update installed packages to their latest releases
    Update {
        /// Packages to update (all non-frozen packages if empty)
        packages: Vec<String>,

        /// Skip confirmation prompts
        #[arg(long)]
        non_interactive: bool,

        /// Show what would be done without making changes
        #[arg(long)]
        dry_run: bool,
    },

    /// Remove an installed package
    Remove {
        /// Package: owner/repo or a repo name
        package: String,

        /// Show what would be done without making changes
        #[arg(long)]
        dry_run: bool,
    },

    /// List installed packages
    List,

    /// Search GitHub for a repository
    Search {
        /// Query string
        query: String,
    },

    /// Configure grip settings
    Configure {
        /// Print the current configuration and exit
        #[arg(long)]
        show: bool,
    },

    /// Check for drift between the package database and the filesystem
    Doctor {
        /// Delete broken package records
        #[arg(long)]
        fix: bool,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let default_filter = if cli.verbose { "grip=debug" } else { "warn" };
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(default_filter)),
        )
        .init();

    let mut cfg = Config::load()?;

    // Configure neither needs the store nor the directory tree.
    if let Commands::Configure { show } = &cli.command {
        commands::configure(&mut cfg, *show)?;
        return Ok(());
    }

    cfg.ensure_directories()?;
    let dirs = cfg.directories();
    let mut store = PackageStore::open(dirs.db.join("packages.json"))?;
    let client = GitHubClient::new(cfg.github_token.clone())?;

    match cli.command {
        Commands::Install {
            package,
            non_interactive,
            freeze,
            dry_run,
        } => {
            let opts = Options {
                non_interactive,
                freeze,
                dry_run,
            };
            commands::install(&package, &cfg, &mut store, &client, &opts).await?;
        }
        Commands::Update {
            packages,
            non_interactive,
            dry_run,
        } => {
            let opts = Options {
                non_interactive,
                dry_run,
                ..Options::default()
            };
            commands::update(&packages, &cfg, &mut store, &client, &opts).await?;
        }
        Commands::Remove { package, dry_run } => {
            let opts = Options {
                dry_run,
                ..Options::default()
            };
            commands::remove(&package, &cfg, &mut store, &opts)?;
        }
        Commands::List => {
            commands::list(&store)?;
        }
        Commands::Search { query } => {
            commands::search(&query, &client).await?;
        }
        Commands::Doctor { fix } => {
            commands::doctor(&cfg, &mut store, fix)?;
        }
        Commands::Configure { .. } => unreachable!("handled above"),
    }

    Ok(())
}
