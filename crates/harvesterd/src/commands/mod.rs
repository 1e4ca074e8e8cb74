use super::*;

pub mod download;
pub mod fetch;
pub mod status;

pub use download::{download, DownloadArgs};
pub use fetch::{fetch, FetchArgs};
pub use status::{status, StatusArgs};

/// Available commands for the CLI
#[derive(Subcommand, Clone)]
pub enum Commands {
  /// Fetch paper metadata from the arXiv API, or import it from a bulk snapshot
  Fetch(FetchArgs),

  /// Download the PDF of every catalogued paper that is not on disk yet
  Download(DownloadArgs),

  /// Show catalog size and how many PDFs are present locally
  Status(StatusArgs),
}

/// Opens the configured catalog database.
async fn open_store(config: &Config) -> Result<Database> {
  trace!("Opening catalog at {:?}", config.database_path);
  Ok(Database::open(&config.database_path).await?)
}
