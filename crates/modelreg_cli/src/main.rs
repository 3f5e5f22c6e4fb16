//! modelreg CLI
//!
//! Command-line tools for model registries.
//!
//! # Commands
//!
//! - `list` - Print every model row
//! - `show` - Print one model row
//! - `prune` - Drop rows whose model directory is gone
//! - `unlock` - Remove lock markers leaked by crashed processes
//! - `verify` - Check table, ledger and directories for consistency

mod commands;

use clap::{Parser, Subcommand};
use modelreg_core::{Registry, RegistryConfig};
use std::path::{Path, PathBuf};
use std::time::Duration;
use tracing_subscriber::EnvFilter;

/// modelreg command-line registry tools.
#[derive(Parser)]
#[command(name = "modelreg")]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Path to the registry root
    #[arg(global = true, short, long)]
    path: Option<PathBuf>,

    /// Enable verbose output
    #[arg(global = true, short, long)]
    verbose: bool,

    /// Seconds to wait for a lock before giving up
    #[arg(global = true, long, default_value = "60")]
    timeout_secs: u64,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Print every model row
    List {
        /// Output format (text, json)
        #[arg(short, long, default_value = "text")]
        format: String,
    },

    /// Print one model row
    Show {
        /// Model id
        id: String,

        /// Output format (text, json)
        #[arg(short, long, default_value = "text")]
        format: String,
    },

    /// Drop rows whose model directory no longer exists
    Prune {
        /// Dry run - show what would be removed
        #[arg(short, long)]
        dry_run: bool,
    },

    /// Remove leaked lock markers
    Unlock {
        /// Remove the record table marker
        #[arg(short, long)]
        table: bool,

        /// Remove the ledger marker
        #[arg(short, long)]
        ledger: bool,
    },

    /// Check registry consistency
    Verify,

    /// Show version information
    Version,
}

fn open_registry(path: &Path, timeout_secs: u64) -> Result<Registry, Box<dyn std::error::Error>> {
    let config = RegistryConfig::new()
        .create_if_missing(false)
        .lock_timeout(Duration::from_secs(timeout_secs));
    Ok(Registry::open(path, config)?)
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    // Initialize logging
    let filter = if cli.verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::new("info")
    };
    tracing_subscriber::fmt().with_env_filter(filter).init();

    if let Commands::Version = cli.command {
        println!("modelreg CLI v{}", env!("CARGO_PKG_VERSION"));
        println!("modelreg core v{}", modelreg_core::VERSION);
        return Ok(());
    }

    let path = cli.path.ok_or("Registry path required (--path)")?;
    let registry = open_registry(&path, cli.timeout_secs)?;

    match cli.command {
        Commands::List { format } => commands::list::run(&registry, &format)?,
        Commands::Show { id, format } => commands::show::run(&registry, &id, &format)?,
        Commands::Prune { dry_run } => commands::prune::run(&registry, dry_run)?,
        Commands::Unlock { table, ledger } => {
            let both = !table && !ledger;
            commands::unlock::run(&registry, table || both, ledger || both)?;
        }
        Commands::Verify => commands::verify::run(&registry)?,
        Commands::Version => {}
    }

    Ok(())
}
