use std::path::PathBuf;
use std::sync::Arc;

use clap::Args;
use feeder::feed::{Collaborators, FeedOptions, FeedStats, run_feed};
use feeder::ghe::GheClient;
use feeder::work::read_input_files;
use feeder::{GitCli, Shutdown, SqlStore};

use super::status::{OutputFormat, print_json, print_table, run_rows};
use crate::config::Config;
use crate::progress::LoggingReporter;

/// Flags for `feeder run`. Anything left unset comes from configuration.
#[derive(Debug, Clone, Default, Args)]
pub(crate) struct RunArgs {
    /// Files listing `owner/repo` lines; `-` reads stdin
    #[arg(value_name = "FILE", default_value = "-")]
    pub inputs: Vec<PathBuf>,

    /// Number of workers
    #[arg(short, long)]
    pub workers: Option<usize>,

    /// Maximum concurrent clones across all workers
    #[arg(long)]
    pub clone_concurrency: Option<usize>,

    /// Maximum concurrent pushes across all workers
    #[arg(long)]
    pub push_concurrency: Option<usize>,

    /// Destination API requests per second
    #[arg(long)]
    pub api_rps: Option<u32>,

    /// Total push attempts per repository, including the first
    #[arg(long)]
    pub push_attempts: Option<usize>,

    /// Root directory for per-worker checkouts
    #[arg(long)]
    pub scratch_dir: Option<PathBuf>,

    /// Seed organization names for a reproducible run
    #[arg(long)]
    pub org_seed: Option<u64>,

    /// Re-process repositories that already have a recorded outcome
    #[arg(long)]
    pub no_resume: bool,

    /// Output format for the run summary
    #[arg(short, long, value_enum, default_value_t = OutputFormat::Table)]
    pub output: OutputFormat,
}

impl RunArgs {
    /// Layer the flags over options built from configuration.
    pub(crate) fn apply(&self, mut options: FeedOptions) -> FeedOptions {
        if let Some(workers) = self.workers {
            options.workers = workers;
        }
        if let Some(n) = self.clone_concurrency {
            options.clone_concurrency = n;
        }
        if let Some(n) = self.push_concurrency {
            options.push_concurrency = n;
        }
        if let Some(rps) = self.api_rps {
            options.api_rps = rps;
        }
        if let Some(attempts) = self.push_attempts {
            options.push_retry.attempts = attempts;
        }
        if let Some(dir) = &self.scratch_dir {
            options.scratch_dir = dir.clone();
        }
        if self.org_seed.is_some() {
            options.org_seed = self.org_seed;
        }
        if self.no_resume {
            options.resume = false;
        }
        options
    }
}

pub(crate) async fn handle_run(
    args: RunArgs,
    config: &Config,
    database_url: &str,
    shutdown: Shutdown,
) -> Result<(), Box<dyn std::error::Error>> {
    let options = args.apply(config.feed_options()?);
    let api_url = config.destination_api_url()?;

    let lines = read_input_files(&args.inputs).await?;
    if lines.is_empty() {
        println!("No repositories to migrate.");
        return Ok(());
    }

    let db = feeder::connect_and_migrate(database_url).await?;
    let collaborators = Collaborators {
        source: Arc::new(GitCli::new()),
        api: Arc::new(GheClient::new(&api_url, &options.destination.token)?),
        store: Arc::new(SqlStore::new(db)),
    };

    tracing::info!(
        destination = %options.destination.host,
        workers = options.workers,
        clone_concurrency = options.clone_concurrency,
        push_concurrency = options.push_concurrency,
        api_rps = options.api_rps,
        "Connecting to destination"
    );

    let stats = Arc::new(FeedStats::new());
    let reporter = Arc::new(LoggingReporter::new());
    let on_progress = stats.observer(Some(reporter.as_callback()));

    let summary = run_feed(lines, collaborators, options, shutdown.clone(), Some(on_progress)).await?;

    let snapshot = stats.snapshot();
    tracing::info!(
        orgs_created = snapshot.orgs_created,
        org_create_failures = snapshot.org_create_failures,
        push_retries = snapshot.push_retries,
        "Run statistics"
    );

    match args.output {
        OutputFormat::Table => print_table(run_rows(&summary)),
        OutputFormat::Json => print_json(&summary)?,
    }

    if summary.crashed_workers > 0 {
        return Err(format!("{} worker(s) crashed", summary.crashed_workers).into());
    }
    if shutdown.is_triggered() {
        println!("Interrupted. Run again to pick up where this run stopped.");
    }

    Ok(())
}
