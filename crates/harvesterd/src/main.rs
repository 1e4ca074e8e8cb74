//! Command line interface for the harvester paper catalog.
//!
//! The `harvester` binary wires a [`Config`] into the library's three pipelines:
//! - `fetch` synchronizes the catalog with the arXiv API, or imports a bulk snapshot with `--bulk`
//! - `download` fetches the PDF of every catalogued paper that is not on disk yet
//! - `status` reports catalog size and local PDF coverage
//!
//! # Usage
//!
//! ```bash
//! # Pull the most recently updated machine learning papers
//! harvester fetch --query "cat:cs.LG" --max-index 1000
//!
//! # Import a metadata snapshot, keeping two categories
//! harvester fetch --bulk arxiv-metadata-oai-snapshot.json --categories cs.LG,stat.ML
//!
//! # Download everything that is missing
//! harvester download --pdf-dir ./pdf
//!
//! # See where things stand
//! harvester status -v
//! ```

#![warn(missing_docs, clippy::missing_docs_in_private_items)]

use std::{path::PathBuf, time::Duration};

use clap::{builder::ArgAction, Args, Parser, Subcommand};
use console::style;
use harvester::{database::Database, error::HarvesterError, prelude::*, Config};
use tracing::{debug, trace};
use tracing_subscriber::EnvFilter;

pub mod commands;
pub mod error;

use crate::{commands::*, error::*};

/// Prefix for information messages
static INFO_PREFIX: &str = "ℹ ";
/// Prefix for success messages
static SUCCESS_PREFIX: &str = "✓ ";
/// Prefix for warning messages
static WARNING_PREFIX: &str = "⚠️ ";
/// Prefix for error messages
static ERROR_PREFIX: &str = "✗ ";

/// Command line interface configuration and argument parsing
#[derive(Parser)]
#[command(author, version, about = "Harvest arXiv paper metadata and PDFs into a local catalog")]
pub struct Cli {
  /// Verbose mode (-v, -vv, -vvv) for different levels of logging detail
  #[arg(
        short,
        long,
        action = ArgAction::Count,
        global = true,
        help = "Increase logging verbosity"
    )]
  verbose: u8,

  /// Path to a TOML configuration file. If not specified, the platform-specific default is read
  /// when it exists.
  #[arg(long, global = true)]
  config: Option<PathBuf>,

  /// Path to the catalog database, overriding the configuration.
  #[arg(long, global = true)]
  db: Option<PathBuf>,

  /// The subcommand to execute
  #[command(subcommand)]
  command: Commands,
}

/// Configures the logging system based on the verbosity level
///
/// The verbosity levels are:
/// - 0: error (default)
/// - 1: warn
/// - 2: info
/// - 3: debug
/// - 4+: trace
///
/// `RUST_LOG` takes precedence when set.
fn setup_logging(verbosity: u8) -> Result<()> {
  let filter = match verbosity {
    0 => "error",
    1 => "warn",
    2 => "info",
    3 => "debug",
    _ => "trace",
  };

  let filter = match EnvFilter::try_from_default_env() {
    Ok(filter) => filter,
    Err(_) => EnvFilter::try_new(filter)?,
  };

  tracing_subscriber::fmt()
    .with_env_filter(filter)
    .with_writer(std::io::stderr)
    .with_file(true)
    .with_line_number(true)
    .with_target(true)
    .init();
  Ok(())
}

/// Reads the configuration and applies the global overrides.
///
/// An explicitly given `--config` file must exist; the default location may be absent.
fn load_config(cli: &Cli) -> Result<Config> {
  let config = match &cli.config {
    Some(path) => Config::load(path)?,
    None => Config::load_or_default(Config::default_path())?,
  };
  let config = match &cli.db {
    Some(db) => config.with_database_path(db),
    None => config,
  };
  debug!("Using configuration: {config:?}");
  Ok(config)
}

/// Entry point for the harvester CLI application
///
/// # Errors
///
/// Returns [`HarvesterdError`] when the configuration cannot be read, the catalog cannot be
/// saved, or a fetch run fails. Per-PDF download failures are reported but not fatal.
#[tokio::main]
async fn main() -> Result<()> {
  let cli = Cli::parse();
  setup_logging(cli.verbose)?;

  let result = match load_config(&cli) {
    Ok(config) => match &cli.command {
      Commands::Fetch(args) => fetch(&config, args).await,
      Commands::Download(args) => download(&config, args).await,
      Commands::Status(args) => status(&config, args).await,
    },
    Err(e) => Err(e),
  };

  if let Err(e) = &result {
    eprintln!("{} {e}", style(ERROR_PREFIX).red());
  }
  result
}
