//! sqlvc: keep a SQL Server schema under version control

mod commands;
mod config;
mod logging;
mod output;

use clap::{Parser, Subcommand};
use std::path::PathBuf;
use std::process::ExitCode;

use sqlvc_versioning::{ReconcileSession, SyncOptions};

use crate::config::{AppConfig, Overrides};
use crate::logging::LoggingConfig;

/// Snapshot a SQL Server schema into a git repository
#[derive(Parser, Debug)]
#[command(name = "sqlvc", version, about, long_about = None)]
struct Cli {
    /// Configuration file (default: ./sqlvc.toml, then the user config directory)
    #[arg(long, global = true, value_name = "FILE")]
    config: Option<PathBuf>,

    /// Database to connect to, overriding the configuration file
    #[arg(long, short = 'd', global = true, env = "SQLVC_DATABASE")]
    database: Option<String>,

    /// Snapshot directory inside the repository
    #[arg(long, global = true, value_name = "DIR")]
    snapshot_dir: Option<PathBuf>,

    /// More log output (-v debug, -vv trace)
    #[arg(long, short, global = true, action = clap::ArgAction::Count)]
    verbose: u8,

    /// Only log warnings and errors
    #[arg(long, short, global = true, conflicts_with = "verbose")]
    quiet: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Compare the live database with the snapshot (writes nothing)
    Status,

    /// Write the live schema to the snapshot and stage it
    Sync {
        /// Reconcile and report without writing
        #[arg(long)]
        dry_run: bool,
    },

    /// Sync, then commit the staged snapshot
    Commit {
        /// Commit message
        #[arg(long, short)]
        message: String,
    },

    /// Show unified diffs of changed objects
    ///
    /// Without a key, every modified object is shown. A key such as
    /// `dbo.Orders.tables` also works for added and deleted objects.
    Diff {
        /// Object key, `schema.name.kind`
        #[arg(value_name = "KEY")]
        key: Option<String>,
    },

    /// Print the synthesized CREATE TABLE statement for a table
    Ddl {
        /// `schema.table`, or a bare table name in `dbo`
        #[arg(value_name = "TABLE")]
        table: String,
    },

    /// Push the repository to its remote
    Push,

    /// Pull the repository from its remote
    Pull,
}

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();

    match run(cli).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            tracing::error!(error = %format!("{err:#}"), "command failed");
            eprintln!("error: {err:#}");
            ExitCode::FAILURE
        }
    }
}

async fn run(cli: Cli) -> anyhow::Result<()> {
    let (mut config, source) = AppConfig::load(cli.config.as_deref())?;
    config.apply_overrides(&Overrides {
        database: cli.database.clone(),
        snapshot_dir: cli.snapshot_dir.clone(),
    });

    let _guard = logging::init(LoggingConfig {
        default_filter: logging::effective_filter(&config.logging.filter, cli.verbose, cli.quiet),
        enable_json_logs: config.logging.json_file,
        ..Default::default()
    })?;

    match &source {
        Some(path) => tracing::debug!(path = %path.display(), "loaded configuration"),
        None => tracing::debug!("no configuration file found; using defaults"),
    }

    let repository = &config.repository;
    let (remote, branch) = (repository.remote(), repository.branch());
    match cli.command {
        Commands::Push => return commands::run_push(&repository.vcs(), remote, branch).await,
        Commands::Pull => return commands::run_pull(&repository.vcs(), remote, branch).await,
        _ => {}
    }

    let session = ReconcileSession::open(&config.connection, repository).await?;
    let result = match &cli.command {
        Commands::Status => commands::run_status(&session).await,
        Commands::Sync { dry_run } => {
            let options = if *dry_run {
                SyncOptions::new().dry_run()
            } else {
                SyncOptions::new()
            };
            commands::run_sync(&session, options).await
        }
        Commands::Commit { message } => {
            commands::run_sync(&session, SyncOptions::new().with_message(message.as_str())).await
        }
        Commands::Diff { key } => commands::run_diff(&session, key.as_deref()).await,
        Commands::Ddl { table } => commands::run_ddl(&session, table).await,
        Commands::Push | Commands::Pull => Ok(()),
    };

    let closed = session.close().await;
    result?;
    closed
}
