//! Incremental harvesting of scholarly paper metadata and PDF artifacts.
//!
//! `harvester` keeps a local catalog of papers in sync with a remote paginated search feed (the
//! arXiv Atom API) or a bulk metadata snapshot, and downloads the PDF artifacts referenced by
//! that catalog. It provides:
//!
//! - Version-aware merging of incoming records into a persistent [`Catalog`]
//! - A paginated, rate-limited metadata synchronizer
//! - A streaming importer for bulk JSON Lines snapshots
//! - A resumable, failure-isolated PDF downloader
//! - An atomic SQLite-backed catalog store
//!
//! # Getting Started
//!
//! ```no_run
//! use harvester::{
//!   database::Database,
//!   feed::ArxivFeed,
//!   prelude::*,
//!   sync::{sync, SyncOptions},
//!   Config,
//! };
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!   let config = Config::default();
//!   let store = Database::open(&config.database_path).await?;
//!   let mut catalog = store.load().await;
//!
//!   let feed = ArxivFeed::new(&config.feed)?;
//!   let options = SyncOptions::new("cat:cs.LG").with_max_index(1000);
//!   let report = sync(&mut catalog, &feed, &options).await?;
//!
//!   if report.total_added > 0 {
//!     store.save(&catalog).await?;
//!   }
//!   Ok(())
//! }
//! ```
//!
//! # Module Organization
//!
//! - [`entry`]: Catalog entries and identifier parsing
//! - [`catalog`]: The in-memory catalog and its merge rule
//! - [`feed`]: Remote paginated feed clients
//! - [`dataset`]: Bulk snapshot records and readers
//! - [`database`]: Persistent catalog storage
//! - [`sync`], [`import`], [`download`]: The three pipelines
//! - [`config`]: Explicit configuration passed into each pipeline
//! - [`prelude`]: Common traits and types for ergonomic imports

#![warn(missing_docs)]

use std::{
  collections::{BTreeMap, BTreeSet, HashSet},
  fmt::Display,
  path::{Path, PathBuf},
  time::Duration,
};

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use lazy_static::lazy_static;
use regex::Regex;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::{debug, error, info, trace, warn};
#[cfg(test)]
use {tempfile::tempdir, tracing_test::traced_test};

pub mod catalog;
pub mod config;
pub mod database;
pub mod dataset;
pub mod download;
pub mod entry;
pub mod error;
pub mod feed;
pub mod import;
pub mod rate_limit;
pub mod sync;

pub use crate::{
  catalog::{Catalog, MergeOutcome},
  config::Config,
  entry::{Author, Entry, Link},
};
use crate::{error::*, rate_limit::RateLimit};

/// Common traits and types for ergonomic imports.
///
/// ```no_run
/// use harvester::{database::Database, prelude::*};
///
/// async fn example() -> Result<(), HarvesterError> {
///   let store = Database::open(Database::default_path()).await?;
///   let catalog = store.load().await;
///   println!("{} entries", catalog.len());
///   Ok(())
/// }
/// ```
pub mod prelude {
  pub use crate::{
    database::CatalogStore, download::ArtifactFetcher, error::HarvesterError, feed::FeedClient,
  };
}
