//! Feeder CLI - command-line interface for bulk GitHub Enterprise migration.

mod commands;
mod config;
mod progress;
mod shutdown;

use std::path::{Path, PathBuf};

use clap::{Parser, Subcommand};
use feeder::{Shutdown, SqlStore};
use tracing_subscriber::EnvFilter;

use crate::commands::run::RunArgs;
use crate::commands::status::OutputFormat;

#[derive(Parser)]
#[command(name = "feeder")]
#[command(version)]
#[command(about = "Migrate repositories from GitHub into GitHub Enterprise")]
#[command(
    long_about = "Feeder reads owner/repo lines, clones each repository from the source host, \
creates it on a GitHub Enterprise instance and pushes it there. Repositories are spread \
across generated organizations of bounded size. Every repository ends with one recorded \
outcome, so an interrupted run can simply be started again."
)]
#[command(after_long_help = r#"EXAMPLES
    Migrate the repositories listed in a file:
        $ feeder run repos.txt

    Read the list from stdin with 8 workers and 4 concurrent clones:
        $ cat repos.txt | feeder run --workers 8 --clone-concurrency 4

    Show what has been recorded, including failed repositories:
        $ feeder status --failures

    Generate shell completions:
        $ feeder completions bash > ~/.local/share/bash-completion/completions/feeder

CONFIGURATION
    Feeder reads configuration from:
      1. ~/.config/feeder/config.toml (or $XDG_CONFIG_HOME/feeder/config.toml)
      2. ./feeder.toml
      3. Environment variables (FEEDER_* prefix, sections split by "__")
      4. .env file in current directory

ENVIRONMENT VARIABLES
    FEEDER_DATABASE__URL          Database connection string (default: ~/.local/state/feeder/feeder.db)
    FEEDER_SOURCE__HOST           Source host (default: github.com)
    FEEDER_DESTINATION__HOST      GitHub Enterprise host
    FEEDER_DESTINATION__API_URL   API root (default: https://<host>/api/v3)
    FEEDER_DESTINATION__TOKEN     Token allowed to create organizations and repositories
    FEEDER_DESTINATION__ADMIN     Account made owner of created organizations
    FEEDER_FEED__WORKERS          Worker count (default: 20)
"#)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Migrate repositories listed as owner/repo lines
    Run(RunArgs),
    /// Show recorded outcomes
    Status {
        /// Output format
        #[arg(short, long, value_enum, default_value_t = OutputFormat::Table)]
        output: OutputFormat,
        /// List failed repositories
        #[arg(long)]
        failures: bool,
    },
    /// Run database migrations
    Migrate {
        #[command(subcommand)]
        action: MigrateAction,
    },
    /// Generate shell completions
    Completions {
        /// Shell to generate completions for
        shell: clap_complete::Shell,
    },
    /// Generate man page(s)
    Man {
        /// Output directory for man pages (prints to stdout if not specified)
        #[arg(short, long)]
        output: Option<PathBuf>,
    },
}

#[derive(Subcommand)]
enum MigrateAction {
    /// Apply all pending migrations
    Up,
    /// Rollback the last migration
    Down,
    /// Show migration status
    Status,
    /// Fresh install - drop all tables and reapply migrations
    Fresh,
}

/// Create the parent directory of a file-backed SQLite database.
fn ensure_sqlite_dir(database_url: &str) -> std::io::Result<()> {
    let Some(db_path) = database_url.strip_prefix("sqlite://") else {
        return Ok(());
    };
    // Strip query parameters (e.g., ?mode=rwc) before path operations
    let db_path = db_path.split('?').next().unwrap_or(db_path);
    let db_path = Path::new(db_path);

    if db_path.is_relative() && !db_path.as_os_str().is_empty() {
        tracing::warn!(
            "Database path '{}' is relative - behavior depends on current directory. \
             Consider using an absolute path.",
            db_path.display()
        );
    }

    if let Some(parent) = db_path.parent()
        && !parent.as_os_str().is_empty()
    {
        std::fs::create_dir_all(parent)?;
    }
    Ok(())
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    dotenvy::dotenv().ok();

    let env_filter = match EnvFilter::try_from_default_env() {
        Ok(filter) => filter,
        Err(_) => EnvFilter::new("feeder=info,feeder_cli=info"),
    };
    tracing_subscriber::fmt()
        .with_env_filter(env_filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();

    // Load configuration (config file -> env vars -> defaults)
    let config = config::Config::load();

    let cli = Cli::parse();

    // Handle commands that don't require database access first
    match &cli.command {
        Commands::Completions { shell } => {
            commands::meta::handle_completions(*shell)?;
            return Ok(());
        }
        Commands::Man { output } => {
            commands::meta::handle_man(output.clone())?;
            return Ok(());
        }
        _ => {}
    }

    let database_url = config
        .database_url()
        .ok_or("Could not determine a database location; set FEEDER_DATABASE__URL")?;
    ensure_sqlite_dir(&database_url)?;

    match cli.command {
        Commands::Run(args) => {
            let shutdown = Shutdown::new();
            shutdown::setup_shutdown_handler(shutdown.clone());
            commands::run::handle_run(args, &config, &database_url, shutdown).await?;
        }
        Commands::Status { output, failures } => {
            let db = feeder::connect_and_migrate(&database_url).await?;
            commands::status::handle_status(&SqlStore::new(db), output, failures).await?;
        }
        Commands::Migrate { action } => {
            commands::migrate::handle_migrate(action, &database_url).await?;
        }
        Commands::Completions { .. } | Commands::Man { .. } => {}
    }

    Ok(())
}
