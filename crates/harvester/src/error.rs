//! Error types for the harvester library.
//!
//! Failures fall into a few families, and the pipelines treat each family differently:
//! - Transport errors ([`HarvesterError::Network`], [`HarvesterError::ApiError`]) end a metadata
//!   sync run but are isolated per item by the downloader
//! - [`HarvesterError::MalformedFeed`] stops a sync run early without failing it
//! - Data-contract errors ([`HarvesterError::MalformedIdentifier`], [`HarvesterError::PdfLink`],
//!   [`HarvesterError::Dataset`]) are never merged into the catalog
//! - Persistence errors are recovered on load and propagated on save
//!
//! # Examples
//!
//! ```
//! use harvester::{entry::parse_identifier_url, error::HarvesterError};
//!
//! match parse_identifier_url("http://arxiv.org/abs/abc123") {
//!   Err(HarvesterError::MalformedIdentifier(url)) => println!("bad identifier: {url}"),
//!   Err(e) => println!("other error: {e}"),
//!   Ok((id, version)) => println!("{id} at v{version}"),
//! }
//! ```

use thiserror::Error;

/// Error type alias used for the [`harvester`](crate) crate.
pub type Result<T> = core::result::Result<T, HarvesterError>;

/// Errors that can occur while harvesting, storing, or downloading papers.
#[derive(Error, Debug)]
pub enum HarvesterError {
  /// A network request failed.
  ///
  /// This covers unreachable hosts, TLS failures and requests that exceeded their configured
  /// timeout.
  #[error(transparent)]
  Network(#[from] reqwest::Error),

  /// A remote API answered, but not with something usable.
  ///
  /// Raised for non-success HTTP statuses and for the arXiv error entry.
  #[error("API error: {0}")]
  ApiError(String),

  /// A feed body arrived but could not be read as an Atom document.
  ///
  /// Throttled requests often come back as HTML or truncated XML. The synchronizer treats this
  /// like an empty page and ends the run normally.
  #[error("Malformed feed page: {0}")]
  MalformedFeed(String),

  /// A feed item's identifier URL does not end in `<id>v<version>`.
  ///
  /// The remote contract has drifted when this happens, so the record is never merged.
  #[error("Malformed identifier URL: {0}")]
  MalformedIdentifier(String),

  /// An entry does not carry exactly one `application/pdf` link.
  #[error("Entry {id} has {count} PDF links, expected exactly one")]
  PdfLink {
    /// Record ID of the offending entry
    id:    String,
    /// Number of PDF links found
    count: usize,
  },

  /// A URL could not be parsed or has no usable final path segment.
  #[error("Invalid URL: {0}")]
  InvalidUrl(String),

  /// A bulk snapshot record could not be reshaped into a catalog entry.
  #[error("Invalid dataset record: {0}")]
  Dataset(String),

  /// JSON encoding or decoding failed.
  #[error(transparent)]
  Json(#[from] serde_json::Error),

  /// A SQLite operation failed.
  #[error(transparent)]
  Sqlite(#[from] rusqlite::Error),

  /// An async SQLite operation failed.
  #[error(transparent)]
  AsyncSqlite(#[from] tokio_rusqlite::Error),

  /// A file system operation failed.
  #[error(transparent)]
  Path(#[from] std::io::Error),

  /// A directory walk failed.
  #[error(transparent)]
  WalkDir(#[from] walkdir::Error),

  /// A configuration file could not be parsed.
  #[error(transparent)]
  TomlDe(#[from] toml::de::Error),

  /// Configuration is missing or inconsistent.
  #[error("{0}")]
  Config(String),
}
