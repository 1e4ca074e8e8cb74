//! The paginated metadata synchronizer.
//!
//! [`sync`] walks a feed page by page, most recently updated first, and merges every record into
//! the catalog with the version-aware merge rule. Because the feed is ordered by update time, a
//! page that brings nothing new usually means every later page is already known too, which is
//! what [`SyncOptions::stop_on_no_added`] exploits.
//!
//! The catalog is only mutated in memory; persisting it is the caller's decision.
//!
//! # Examples
//!
//! ```no_run
//! use harvester::{
//!   config::FeedConfig,
//!   feed::ArxivFeed,
//!   sync::{sync, SyncOptions},
//!   Catalog,
//! };
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let feed = ArxivFeed::new(&FeedConfig::default())?;
//! let mut catalog = Catalog::new();
//! let options = SyncOptions::new("cat:cs.CV+OR+cat:cs.LG").with_max_index(300);
//! let report = sync(&mut catalog, &feed, &options).await?;
//! println!("added {} papers, stopped because {:?}", report.total_added, report.stop_reason);
//! # Ok(())
//! # }
//! ```

use super::*;
use crate::feed::FeedClient;

/// Parameters of one synchronization run.
#[derive(Debug, Clone, PartialEq)]
pub struct SyncOptions {
  /// Feed search query, passed through verbatim
  pub query:            String,
  /// Offset of the first page
  pub start_index:      usize,
  /// Offset at which paging stops (exclusive)
  pub max_index:        usize,
  /// Records requested per page
  pub page_size:        usize,
  /// Pause between pages
  pub rate_limit:       RateLimit,
  /// Stop as soon as a page adds nothing new
  pub stop_on_no_added: bool,
}

impl SyncOptions {
  /// Options for `query` with the defaults: offsets `0..10000`, 100 records per page, 5s plus up
  /// to 3s between pages, stopping once a page adds nothing.
  pub fn new(query: impl Into<String>) -> Self {
    Self {
      query:            query.into(),
      start_index:      0,
      max_index:        10_000,
      page_size:        100,
      rate_limit:       RateLimit::new(Duration::from_secs(5), Duration::from_secs(3)),
      stop_on_no_added: true,
    }
  }

  /// Sets the offset of the first page.
  pub fn with_start_index(mut self, start_index: usize) -> Self {
    self.start_index = start_index;
    self
  }

  /// Sets the offset at which paging stops.
  pub fn with_max_index(mut self, max_index: usize) -> Self {
    self.max_index = max_index;
    self
  }

  /// Sets the page size. Zero is treated as one.
  pub fn with_page_size(mut self, page_size: usize) -> Self {
    self.page_size = page_size.max(1);
    self
  }

  /// Sets the pause between pages.
  pub fn with_rate_limit(mut self, rate_limit: RateLimit) -> Self {
    self.rate_limit = rate_limit;
    self
  }

  /// Sets whether a page without new records ends the run.
  pub fn with_stop_on_no_added(mut self, stop_on_no_added: bool) -> Self {
    self.stop_on_no_added = stop_on_no_added;
    self
  }
}

/// Why a run ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum StopReason {
  /// The cursor reached `max_index`.
  #[default]
  Exhausted,
  /// A page came back empty, which usually means throttling.
  EmptyPage,
  /// A page body could not be parsed, which usually means throttling too.
  MalformedPage,
  /// A page added nothing and `stop_on_no_added` was set.
  NoNewEntries,
}

/// Outcome of a synchronization run.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SyncReport {
  /// Distinct records inserted or replaced
  pub total_added:   usize,
  /// Incoming records that did not change the catalog
  pub total_skipped: usize,
  /// Pages requested, including the one that ended the run
  pub pages:         usize,
  /// Why the run ended
  pub stop_reason:   StopReason,
}

/// Runs the synchronizer against `feed`, merging into `catalog`.
///
/// Each page is normalized completely before any of it is merged, so a page with a malformed
/// identifier leaves the catalog as it was after the previous page.
///
/// # Errors
///
/// Transport errors from the feed and [`HarvesterError::MalformedIdentifier`] end the run. Pages
/// merged before the error stay merged in `catalog`. A page body that cannot be parsed is not an
/// error: the run stops with [`StopReason::MalformedPage`].
pub async fn sync<F>(catalog: &mut Catalog, feed: &F, options: &SyncOptions) -> Result<SyncReport>
where F: FeedClient + ?Sized {
  let mut report = SyncReport::default();
  let mut added_ids = HashSet::new();
  let page_size = options.page_size.max(1);

  for start in (options.start_index..options.max_index).step_by(page_size) {
    if report.pages > 0 {
      options.rate_limit.pause().await;
    }

    info!("Results {} - {}", start, start.saturating_add(page_size));
    let records = match feed.fetch_page(&options.query, start, page_size).await {
      Ok(records) => records,
      Err(HarvesterError::MalformedFeed(detail)) => {
        report.pages += 1;
        warn!("Could not parse the feed page, possibly rate limited. Stopping. {detail}");
        report.stop_reason = StopReason::MalformedPage;
        break;
      },
      Err(e) => return Err(e),
    };
    report.pages += 1;

    if records.is_empty() {
      warn!("Received no results from the feed, possibly rate limited. Stopping.");
      report.stop_reason = StopReason::EmptyPage;
      break;
    }

    let entries = records.into_iter().map(Entry::from_feed).collect::<Result<Vec<_>>>()?;

    let mut page_added = HashSet::new();
    let mut page_skipped = 0;
    for entry in entries {
      let id = entry.id.clone();
      let line = format!("Updated {} added {}", entry.updated.format("%Y-%m-%d"), entry.title);
      if catalog.merge(entry).changed() {
        debug!("{line}");
        page_added.insert(id);
      } else {
        page_skipped += 1;
      }
    }

    info!("Added {} papers, already had {}.", page_added.len(), page_skipped);
    report.total_skipped += page_skipped;
    let page_added_count = page_added.len();
    added_ids.extend(page_added);
    report.total_added = added_ids.len();

    if page_added_count == 0 && options.stop_on_no_added {
      info!("No new papers were added. Stopping.");
      report.stop_reason = StopReason::NoNewEntries;
      break;
    }
  }

  info!(
    "Sync finished after {} pages: {} added, {} skipped",
    report.pages, report.total_added, report.total_skipped
  );
  Ok(report)
}
