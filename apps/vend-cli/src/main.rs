//! Vend CLI - run the vending machine from the command line
//!
//! Usage:
//! ```bash
//! vend status
//! vend items --available
//! vend add "Green Tea" 20 15
//! vend refill 10 50
//! vend refill-all 20
//! vend buy "green tea"        # then type 20, 5, ... or c to cancel
//! vend collect --json
//! ```
//!
//! ## Startup Sequence
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  1. Parse flags (clap)                                                  │
//! │  2. Load config: vend.toml → VEND_* env → --db flag                     │
//! │  3. Initialize tracing (RUST_LOG, else config log_filter)               │
//! │  4. Open database (migrations + cash table seeding)                     │
//! │  5. Run the subcommand against VendingMachine                           │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use std::path::PathBuf;
use std::process::ExitCode;
use tracing::info;
use tracing_subscriber::EnvFilter;

use vend_core::Denomination;
use vend_db::{Database, DbConfig};
use vend_engine::VendingMachine;

mod commands;
mod config;
mod output;

use config::CliConfig;
use output::Output;

/// Vend - vending machine transaction engine
#[derive(Parser)]
#[command(name = "vend")]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    /// Database file path (overrides config and VEND_DB_PATH)
    #[arg(long, global = true)]
    pub db: Option<PathBuf>,

    /// Config file path (default: vend.toml in the platform config dir)
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,

    /// Print results as JSON
    #[arg(long, global = true)]
    pub json: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Show whether the machine can enter purchase mode
    Status,

    /// List items
    Items {
        /// Only items with stock left
        #[arg(long)]
        available: bool,
    },

    /// Show the change reserve and the collection box
    Cash,

    /// Add an item
    Add {
        /// Item name (stored lowercase)
        name: String,
        /// Price in THB (1-10000)
        price: i64,
        /// Initial stock (0-1000)
        stock: i64,
    },

    /// Delete an item
    Delete {
        /// Item name
        name: String,
    },

    /// Add stock to an item
    Restock {
        /// Item name
        name: String,
        /// Units to add (0-1000)
        amount: i64,
    },

    /// Refill one change denomination
    Refill {
        /// Denomination: 20, 10, 5 or 1
        denomination: Denomination,
        /// Pieces to add (0-1000)
        amount: i64,
    },

    /// Refill every change denomination by the same amount
    RefillAll {
        /// Pieces to add to each of 20, 10, 5 and 1 (0-1000)
        amount: i64,
    },

    /// Empty the collection box
    Collect,

    /// Buy an item, reading denominations from stdin
    Buy {
        /// Item name
        name: String,
    },
}

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();

    let config = match CliConfig::load(cli.config.as_deref()) {
        Ok(config) => config,
        Err(e) => {
            eprintln!("Error: {}", e);
            return ExitCode::FAILURE;
        }
    };

    init_tracing(&config.log_filter);

    let out = Output::new(cli.json);
    match run(cli, config, &out).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            out.error(&err);
            ExitCode::FAILURE
        }
    }
}

async fn run(cli: Cli, config: CliConfig, out: &Output) -> Result<()> {
    let db_path = cli.db.unwrap_or(config.database_path);

    if let Some(parent) = db_path.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent)
            .with_context(|| format!("Failed to create {}", parent.display()))?;
    }

    let db = Database::new(DbConfig::new(&db_path))
        .await
        .with_context(|| format!("Failed to open database {}", db_path.display()))?;
    info!(path = %db_path.display(), "Database ready");

    let vm = VendingMachine::new(db);

    let result = match cli.command {
        Commands::Status => commands::status(&vm, out).await,
        Commands::Items { available } => commands::items(&vm, out, available).await,
        Commands::Cash => commands::cash(&vm, out).await,
        Commands::Add { name, price, stock } => commands::add(&vm, out, &name, price, stock).await,
        Commands::Delete { name } => commands::delete(&vm, out, &name).await,
        Commands::Restock { name, amount } => commands::restock(&vm, out, &name, amount).await,
        Commands::Refill {
            denomination,
            amount,
        } => commands::refill(&vm, out, denomination, amount).await,
        Commands::RefillAll { amount } => commands::refill_all(&vm, out, amount).await,
        Commands::Collect => commands::collect(&vm, out).await,
        Commands::Buy { name } => {
            commands::buy::buy(&vm, out, &name, config.tender_buffer).await
        }
    };

    vm.database().close().await;
    result
}

/// Initializes the tracing subscriber. Logs go to stderr so `--json`
/// output on stdout stays clean.
fn init_tracing(default_filter: &str) {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_filter));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}
