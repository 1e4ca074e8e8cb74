//! Module for the "fetch" functionality: feed synchronization and bulk import.

use std::collections::BTreeSet;

use harvester::{
  dataset::JsonLines,
  feed::ArxivFeed,
  import::{import_bulk, ImportOptions},
  rate_limit::duration_from_secs,
  sync::{sync, StopReason, SyncOptions},
};

use super::*;

/// Query used when none is given: the machine learning and vision categories.
pub const DEFAULT_QUERY: &str =
  "cat:cs.CV+OR+cat:cs.AI+OR+cat:cs.LG+OR+cat:cs.CL+OR+cat:cs.NE+OR+cat:stat.ML";

/// Arguments that can be used for the [`Commands::Fetch`]
#[derive(Args, Clone, Debug)]
pub struct FetchArgs {
  /// arXiv search query, passed through verbatim
  #[arg(long, visible_alias = "search-query", default_value = DEFAULT_QUERY)]
  pub query: String,

  /// Offset of the first result, 0 being the most recently updated
  #[arg(long, default_value_t = 0)]
  pub start_index: usize,

  /// Upper bound on the result offset to fetch
  #[arg(long, default_value_t = 10_000)]
  pub max_index: usize,

  /// Results requested per API call
  #[arg(long, default_value_t = 100)]
  pub results_per_iteration: usize,

  /// Seconds to wait between API calls, on top of the random jitter
  #[arg(long)]
  pub wait_time: Option<f64>,

  /// Stop early once a page brings no new papers (1/0, true/false)
  #[arg(
    long,
    default_value = "true",
    action = ArgAction::Set,
    value_parser = clap::builder::BoolishValueParser::new()
  )]
  pub break_on_no_added: bool,

  /// Import this JSON Lines metadata snapshot instead of calling the API
  #[arg(long)]
  pub bulk: Option<PathBuf>,

  /// Only import snapshot records in any of these categories
  #[arg(long, value_delimiter = ',', num_args = 1.., requires = "bulk")]
  pub categories: Vec<String>,

  /// Stop the import after this many consecutive already-known records
  #[arg(long, requires = "bulk")]
  pub stop_after_skipped: Option<usize>,
}

/// Function for the [`Commands::Fetch`] in the CLI.
///
/// The catalog is saved only when the run succeeded and added at least one paper.
pub async fn fetch(config: &Config, args: &FetchArgs) -> Result<()> {
  let store = open_store(config).await?;
  let mut catalog = store.load().await;
  println!(
    "{} Catalog at {} holds {} papers",
    style(INFO_PREFIX).cyan(),
    style(config.database_path.display()).yellow(),
    catalog.len()
  );

  let added = match &args.bulk {
    Some(snapshot) => {
      let mut options = ImportOptions::default();
      if !args.categories.is_empty() {
        options = options.with_categories(args.categories.iter().cloned().collect::<BTreeSet<_>>());
      }
      if let Some(count) = args.stop_after_skipped {
        options = options.with_stop_after_skipped(count);
      }

      println!(
        "{} Importing {}",
        style(INFO_PREFIX).cyan(),
        style(snapshot.display()).yellow()
      );
      let report = import_bulk(&mut catalog, JsonLines::open(snapshot)?, &options)?;
      println!(
        "{} Read {} records: {} added, {} already known, {} filtered out",
        style(INFO_PREFIX).cyan(),
        report.processed,
        report.added,
        report.skipped,
        report.filtered
      );
      report.added
    },
    None => {
      let mut rate_limit = config.feed.rate_limit()?;
      if let Some(wait_time) = args.wait_time {
        rate_limit.delay = duration_from_secs(wait_time)?;
      }
      let options = SyncOptions::new(args.query.clone())
        .with_start_index(args.start_index)
        .with_max_index(args.max_index)
        .with_page_size(args.results_per_iteration)
        .with_rate_limit(rate_limit)
        .with_stop_on_no_added(args.break_on_no_added);

      let feed = ArxivFeed::new(&config.feed)?;
      let report = sync(&mut catalog, &feed, &options).await?;
      let reason = match report.stop_reason {
        StopReason::Exhausted => "reached the maximum index",
        StopReason::EmptyPage => "the API returned no results, possibly rate limited",
        StopReason::MalformedPage => "the API returned an unreadable page, possibly rate limited",
        StopReason::NoNewEntries => "a page brought nothing new",
      };
      if matches!(report.stop_reason, StopReason::EmptyPage | StopReason::MalformedPage) {
        println!("{} Stopped: {reason}", style(WARNING_PREFIX).yellow());
      }
      println!(
        "{} Fetched {} pages: {} added, {} already known ({reason})",
        style(INFO_PREFIX).cyan(),
        report.pages,
        report.total_added,
        report.total_skipped
      );
      report.total_added
    },
  };

  if added > 0 {
    store.save(&catalog).await?;
    println!(
      "{} Saved catalog with {} papers",
      style(SUCCESS_PREFIX).green(),
      style(catalog.len()).yellow()
    );
  } else {
    println!("{} Nothing new, catalog left unchanged", style(INFO_PREFIX).cyan());
  }
  Ok(())
}
