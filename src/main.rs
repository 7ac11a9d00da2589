//! # Traction Scout CLI (`scout`)
//!
//! ## Usage
//!
//! ```bash
//! scout --config ./config/scout.toml <command>
//! ```
//!
//! ## Commands
//!
//! | Command | Description |
//! |---------|-------------|
//! | `scout init` | Create the SQLite database and run schema migrations |
//! | `scout ingest <file>` | Enrich every record in a JSON / JSON-lines file |
//! | `scout refresh` | Run a full refresh cycle from the configured source |
//! | `scout top` | Ranked list of the best candidates |
//! | `scout history <owner>/<name>` | Snapshot and growth history |
//! | `scout stats` | Ledger summary |
//! | `scout serve` | Start the JSON HTTP API |
//! | `scout completions <shell>` | Print shell completions |
//!
//! Logging goes to stderr and is controlled with `RUST_LOG`
//! (default `info`).

use clap::{CommandFactory, Parser, Subcommand};
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

use traction_scout::progress::ProgressMode;
use traction_scout::top::{parse_category, TopFilter};
use traction_scout::{config, history, ingest, migrate, refresh, server, stats, top};

/// Traction Scout: track open-source projects over time and score them as
/// investment candidates.
///
/// All commands except `completions` read a TOML configuration file. See
/// `config/scout.example.toml` for a full example.
#[derive(Parser)]
#[command(
    name = "scout",
    about = "Traction Scout — growth tracking and investability scoring for open-source projects",
    version
)]
struct Cli {
    /// Path to configuration file (TOML).
    #[arg(long, global = true, default_value = "./config/scout.toml")]
    config: PathBuf,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Initialize the database schema. Safe to run repeatedly.
    Init,

    /// Record one observation per entity from a records file.
    ///
    /// The file is a JSON array or JSON-lines of raw metric records.
    Ingest {
        file: PathBuf,

        /// Observation date (YYYY-MM-DD). Defaults to today (UTC).
        #[arg(long)]
        date: Option<String>,
    },

    /// Discover, filter, and enrich every candidate of the configured source.
    Refresh {
        /// Progress output on stderr. Defaults to human when stderr is a TTY.
        #[arg(long, value_enum)]
        progress: Option<ProgressMode>,
    },

    /// List the highest-scoring entities.
    Top {
        #[arg(long, default_value_t = 20)]
        limit: usize,

        /// Only this category (e.g. `ai-ml`, `security`).
        #[arg(long)]
        category: Option<String>,

        #[arg(long)]
        include_big_tech: bool,

        /// Also list awesome-lists, tutorials, and similar repositories.
        #[arg(long)]
        include_non_investable: bool,

        #[arg(long)]
        json: bool,
    },

    /// Show the snapshot and growth history of one entity.
    History {
        /// Entity as `owner/name`.
        entity: String,

        #[arg(long)]
        json: bool,
    },

    /// Print ledger statistics.
    Stats,

    /// Start the JSON HTTP API.
    Serve,

    /// Print a shell completion script.
    Completions {
        #[arg(value_enum)]
        shell: clap_complete::Shell,
    },
}

fn init_tracing() {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .init();
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    // Commands that don't require config
    if let Commands::Completions { shell } = &cli.command {
        clap_complete::generate(*shell, &mut Cli::command(), "scout", &mut std::io::stdout());
        return Ok(());
    }

    init_tracing();
    let cfg = config::load_config(&cli.config)?;

    match cli.command {
        Commands::Init => {
            migrate::run_migrations(&cfg).await?;
            println!("Database initialized successfully.");
        }
        Commands::Ingest { file, date } => {
            ingest::run_ingest(&cfg, &file, date.as_deref()).await?;
        }
        Commands::Refresh { progress } => {
            let mode = progress.unwrap_or_else(ProgressMode::default_for_tty);
            let reporter = mode.reporter();
            refresh::run_refresh_cmd(&cfg, reporter.as_ref()).await?;
        }
        Commands::Top {
            limit,
            category,
            include_big_tech,
            include_non_investable,
            json,
        } => {
            let filter = TopFilter {
                limit,
                category: category.as_deref().map(parse_category).transpose()?,
                include_big_tech,
                include_non_investable,
            };
            top::run_top(&cfg, &filter, json).await?;
        }
        Commands::History { entity, json } => {
            history::run_history(&cfg, &entity, json).await?;
        }
        Commands::Stats => {
            stats::run_stats(&cfg).await?;
        }
        Commands::Serve => {
            server::run_server(&cfg).await?;
        }
        Commands::Completions { .. } => {
            // Handled above (before config loading)
            unreachable!()
        }
    }

    Ok(())
}
