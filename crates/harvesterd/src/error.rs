//! Error types for the harvester CLI.

use thiserror::Error;

use super::*;

/// Result alias used throughout the CLI.
pub type Result<T> = core::result::Result<T, HarvesterdError>;

/// Errors that end a CLI invocation.
#[derive(Error, Debug)]
pub enum HarvesterdError {
  /// An error from the harvester library.
  #[error(transparent)]
  Harvester(#[from] HarvesterError),

  /// A file system or terminal error.
  #[error(transparent)]
  IO(#[from] std::io::Error),

  /// The logging filter could not be parsed.
  #[error(transparent)]
  LogFilter(#[from] tracing_subscriber::filter::ParseError),
}
