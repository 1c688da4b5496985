//! Reposync CLI - keep local git working copies in sync with their upstream

mod commands;

use clap::{Parser, Subcommand};
use reposync_core::Config;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use commands::{InspectArgs, SyncArgs};

/// Reposync: keep local working copies of git repositories up to date
#[derive(Parser, Debug)]
#[command(name = "reposync")]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Enable verbose output
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Root directory for checkouts without an explicit directory
    #[arg(long, global = true, env = "REPOSYNC_CACHE_DIR")]
    cache_dir: Option<std::path::PathBuf>,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Show version information
    Version,

    /// Clone or update a repository
    #[command(visible_alias = "s")]
    Sync(SyncArgs),

    /// Print the short hash of the checked-out commit
    Head(InspectArgs),

    /// Print the timestamp of the most recent commit
    Stamp(InspectArgs),

    /// Show branch, short hash and latest commit time
    Status(InspectArgs),

    /// Show current configuration
    Config,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::registry()
        .with(fmt::layer())
        .with(EnvFilter::from_default_env())
        .init();

    let cli = Cli::parse();

    if cli.verbose {
        tracing::info!("Verbose mode enabled");
    }

    let timeout = match cli.command {
        Some(Commands::Sync(ref args)) => args.timeout(),
        _ => None,
    };
    let config = Config::load_with_overrides(timeout, cli.cache_dir.clone())?;

    if cli.verbose {
        tracing::info!(
            timeout = ?config.sync.timeout,
            cache_dir = ?config.sync.cache_dir,
            repositories = config.repositories.len(),
            "Configuration loaded"
        );
    }

    match cli.command {
        Some(Commands::Version) => {
            println!("reposync {}", env!("CARGO_PKG_VERSION"));
        }
        Some(Commands::Sync(args)) => {
            args.execute(cli.verbose, &config).await?;
        }
        Some(Commands::Head(args)) => args.head()?,
        Some(Commands::Stamp(args)) => args.stamp()?,
        Some(Commands::Status(args)) => args.status()?,
        Some(Commands::Config) => {
            println!("Reposync Configuration");
            println!("======================");
            println!();
            print!("{}", config.to_toml()?);
            println!();
            if let Some(path) = Config::default_config_path() {
                println!("Config file: {}", path.display());
                if path.exists() {
                    println!("  (exists)");
                } else {
                    println!("  (not found - using defaults)");
                }
            }
        }
        None => {
            println!("Reposync - keep local git working copies up to date");
            println!();
            println!("Use --help for usage information");
        }
    }

    Ok(())
}
