//! The bulk snapshot importer.
//!
//! [`import_bulk`] consumes a lazy stream of [`BulkRecord`]s, optionally filters it by category,
//! reshapes each record into an [`Entry`] and merges it with the same rule the synchronizer
//! uses. The stream is pulled one record at a time, so memory stays flat no matter how large the
//! snapshot is.
//!
//! # Examples
//!
//! ```no_run
//! use std::collections::BTreeSet;
//!
//! use harvester::{
//!   dataset::JsonLines,
//!   import::{import_bulk, ImportOptions},
//!   Catalog,
//! };
//!
//! # fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let mut catalog = Catalog::new();
//! let options = ImportOptions::default().with_categories(BTreeSet::from(["cs.LG".to_string()]));
//! let report =
//!   import_bulk(&mut catalog, JsonLines::open("arxiv-metadata-oai-snapshot.json")?, &options)?;
//! println!("{} added, {} filtered out", report.added, report.filtered);
//! # Ok(())
//! # }
//! ```

use super::*;
use crate::dataset::BulkRecord;

/// How often progress is logged, in records read.
const PROGRESS_INTERVAL: usize = 10_000;

/// Parameters of one import run.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ImportOptions {
  /// Only records sharing at least one of these categories are imported
  pub categories:         Option<BTreeSet<String>>,
  /// Stop after this many consecutive matching records were already known
  pub stop_after_skipped: Option<usize>,
}

impl ImportOptions {
  /// Restricts the import to records in any of `categories`.
  pub fn with_categories(mut self, categories: BTreeSet<String>) -> Self {
    self.categories = Some(categories);
    self
  }

  /// Stops the import after `count` consecutive skipped records.
  pub fn with_stop_after_skipped(mut self, count: usize) -> Self {
    self.stop_after_skipped = Some(count);
    self
  }
}

/// Outcome of an import run.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ImportReport {
  /// Records read from the stream
  pub processed: usize,
  /// Distinct records inserted or replaced
  pub added:     usize,
  /// Matching records that did not change the catalog
  pub skipped:   usize,
  /// Records rejected by the category filter
  pub filtered:  usize,
  /// Whether `stop_after_skipped` ended the run early
  pub stopped:   bool,
}

/// Imports a stream of snapshot records into `catalog`.
///
/// # Errors
///
/// A read error or a record that cannot be reshaped ([`HarvesterError::Dataset`]) ends the run.
/// Records merged before the error stay merged in `catalog`.
pub fn import_bulk<I>(
  catalog: &mut Catalog,
  records: I,
  options: &ImportOptions,
) -> Result<ImportReport>
where
  I: IntoIterator<Item = Result<BulkRecord>>,
{
  let mut report = ImportReport::default();
  let mut added_ids = HashSet::new();
  let mut consecutive_skipped = 0;

  for record in records {
    let record = record?;
    report.processed += 1;
    if report.processed % PROGRESS_INTERVAL == 0 {
      info!(
        "Processed {} records: {} added, {} skipped, {} filtered",
        report.processed,
        added_ids.len(),
        report.skipped,
        report.filtered
      );
    }

    if let Some(categories) = &options.categories {
      if !record.matches(categories) {
        report.filtered += 1;
        continue;
      }
    }

    let entry = record.into_entry()?;
    let id = entry.id.clone();
    match catalog.merge(entry) {
      MergeOutcome::Skipped => {
        report.skipped += 1;
        consecutive_skipped += 1;
      },
      outcome => {
        trace!("Imported {id}: {outcome:?}");
        added_ids.insert(id);
        consecutive_skipped = 0;
      },
    }

    if options.stop_after_skipped.is_some_and(|limit| consecutive_skipped >= limit.max(1)) {
      info!("{consecutive_skipped} records in a row were already known. Stopping.");
      report.stopped = true;
      break;
    }
  }

  report.added = added_ids.len();
  info!(
    "Import finished: {} processed, {} added, {} skipped, {} filtered",
    report.processed, report.added, report.skipped, report.filtered
  );
  Ok(report)
}
