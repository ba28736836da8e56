//! decision-maker: run one decision against a SQLite-backed store.
//!
//! Logs go to stderr (filter with `RUST_LOG`); results go to stdout as JSON.

use std::path::PathBuf;

use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand};
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use decision_core::config::{CONFIDENCE_THRESHOLD, MARGIN_ERROR};
use decision_core::{DecisionEngine, EvidenceTable, SqliteStore};

#[derive(Parser)]
#[command(name = "decision-maker")]
#[command(about = "Pick the most probable category from multi-source confidence scores")]
struct Cli {
    /// Path to the SQLite store
    #[arg(long, env = "DECISION_DB", default_value = "database.db", global = true)]
    db: PathBuf,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Create the store and seed default parameters if it does not exist
    Init,
    /// Decide on one evidence table and print the result
    Decide {
        /// Evidence table (split-orientation JSON)
        #[arg(short, long)]
        input: PathBuf,
        /// Run index, used only to correlate repeated runs in the logs
        iteration: Option<u64>,
    },
    /// Set a tunable parameter
    SetParam {
        name: String,
        value: f64,
    },
    /// Print every registered category with its usage count
    Areas,
}

fn main() {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info".into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    if let Err(e) = run(Cli::parse()) {
        tracing::error!("{e:#}");
        std::process::exit(1);
    }
}

fn run(cli: Cli) -> Result<()> {
    match cli.command {
        Commands::Init => {
            SqliteStore::bootstrap(&cli.db)
                .with_context(|| format!("initializing {}", cli.db.display()))?;
        }
        Commands::Decide { input, iteration } => {
            let span = tracing::info_span!("decide", iteration = iteration.unwrap_or_default());
            let _guard = span.enter();

            let store = SqliteStore::bootstrap(&cli.db)
                .with_context(|| format!("initializing {}", cli.db.display()))?;
            let matrix = EvidenceTable::from_path(&input)
                .and_then(EvidenceTable::into_matrix)
                .with_context(|| format!("reading {}", input.display()))?;

            let engine = DecisionEngine::with_store(&store);
            let report = engine.decide_report(&matrix)?;
            info!(fingerprint = %report.matrix_fingerprint, "run complete");

            println!("{}", serde_json::to_string(&report.result)?);
        }
        Commands::SetParam { name, value } => {
            if name != CONFIDENCE_THRESHOLD && name != MARGIN_ERROR {
                bail!("unknown parameter {name:?}, expected {CONFIDENCE_THRESHOLD} or {MARGIN_ERROR}");
            }
            let store = SqliteStore::open(&cli.db)?;
            store.set_parameter(&name, value)?;
            info!(%name, value, "parameter updated");
        }
        Commands::Areas => {
            let store = SqliteStore::open(&cli.db)?;
            println!("{}", serde_json::to_string_pretty(&store.categories()?)?);
        }
    }
    Ok(())
}
