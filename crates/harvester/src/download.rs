//! The resumable PDF artifact downloader.
//!
//! [`download_all`] walks the catalog once and makes sure every entry's PDF exists under the
//! target directory. Whatever is already there (anywhere below the directory, by base filename)
//! is left alone, so an interrupted run simply resumes where it stopped. A failure on one
//! artifact is logged and recorded in the [`DownloadReport`], and the loop moves on.
//!
//! Artifacts are written to `<filename>.part` and renamed into place only once complete, so a
//! truncated download never shows up under the final name.
//!
//! # Examples
//!
//! ```no_run
//! use harvester::{
//!   database::Database,
//!   download::{download_all, DownloadOptions, HttpFetcher},
//!   prelude::*,
//!   Config,
//! };
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let config = Config::default();
//! let catalog = Database::open(&config.database_path).await?.load().await;
//! let options = DownloadOptions::from_config(&config)?;
//! let fetcher = HttpFetcher::new(options.timeout)?;
//! let report = download_all(&catalog, &fetcher, &options).await?;
//! println!("{}/{} artifacts available", report.succeeded, report.attempted);
//! # Ok(())
//! # }
//! ```

use futures::StreamExt;
use tokio::{
  fs::File,
  io::{AsyncWriteExt, BufWriter},
};
use walkdir::WalkDir;

use super::*;

/// Suffix of in-progress downloads.
pub const PART_SUFFIX: &str = ".part";

/// Something that can store the artifact behind a URL at a local path.
#[async_trait]
pub trait ArtifactFetcher: Send + Sync {
  /// Fetches `url` into `dest`, returning the number of bytes written.
  ///
  /// On error nothing is left at `dest`.
  async fn fetch(&self, url: &str, dest: &Path) -> Result<u64>;
}

/// [`ArtifactFetcher`] over HTTP.
#[derive(Debug, Clone)]
pub struct HttpFetcher {
  /// Web client carrying the per-artifact timeout
  client: reqwest::Client,
}

impl HttpFetcher {
  /// Creates a fetcher whose requests (connect and body) are bounded by `timeout`.
  pub fn new(timeout: Duration) -> Result<Self> {
    let client = reqwest::Client::builder().timeout(timeout).build()?;
    Ok(Self { client })
  }

  async fn fetch_to(&self, url: &str, part: &Path) -> Result<u64> {
    let response = self.client.get(url).send().await?;
    let status = response.status();
    if !status.is_success() {
      trace!("{url} response: {response:?}");
      return Err(HarvesterError::ApiError(format!("Failed to download PDF: {status}")));
    }

    let mut file = File::create(part).await?;
    let mut writer = BufWriter::new(&mut file);
    let mut stream = response.bytes_stream();
    let mut bytes_written = 0;
    while let Some(chunk) = stream.next().await {
      let chunk = chunk?;
      writer.write_all(&chunk).await?;
      bytes_written += chunk.len() as u64;
    }
    writer.flush().await?;
    file.sync_all().await?;

    Ok(bytes_written)
  }
}

#[async_trait]
impl ArtifactFetcher for HttpFetcher {
  async fn fetch(&self, url: &str, dest: &Path) -> Result<u64> {
    let part = part_path(dest);
    let result = match self.fetch_to(url, &part).await {
      Ok(bytes) => tokio::fs::rename(&part, dest).await.map(|_| bytes).map_err(Into::into),
      Err(e) => Err(e),
    };

    if result.is_err() {
      if let Err(e) = tokio::fs::remove_file(&part).await {
        trace!("No partial file to remove at {part:?}: {e}");
      }
    }
    result
  }
}

/// Path of the in-progress file for `dest`.
pub fn part_path(dest: &Path) -> PathBuf {
  let mut name = dest.file_name().unwrap_or_default().to_os_string();
  name.push(PART_SUFFIX);
  dest.with_file_name(name)
}

/// Base filenames of every file anywhere under `dir`, excluding in-progress downloads.
pub fn scan_local_artifacts(dir: &Path) -> Result<HashSet<String>> {
  let mut found = HashSet::new();
  for item in WalkDir::new(dir).min_depth(1) {
    let item = item?;
    if !item.file_type().is_file() {
      continue;
    }
    if let Some(name) = item.file_name().to_str() {
      if !name.ends_with(PART_SUFFIX) {
        found.insert(name.to_string());
      }
    }
  }
  Ok(found)
}

/// Parameters of one download run.
#[derive(Debug, Clone, PartialEq)]
pub struct DownloadOptions {
  /// Directory artifacts are written into
  pub target_dir: PathBuf,
  /// Per-artifact timeout, applied when building an [`HttpFetcher`]
  pub timeout:    Duration,
  /// Pause after each successful fetch
  pub rate_limit: RateLimit,
}

impl DownloadOptions {
  /// Options for `target_dir` with a 10s timeout and 50ms plus up to 100ms between fetches.
  pub fn new(target_dir: impl Into<PathBuf>) -> Self {
    Self {
      target_dir: target_dir.into(),
      timeout:    Duration::from_secs(10),
      rate_limit: RateLimit::new(Duration::from_millis(50), Duration::from_millis(100)),
    }
  }

  /// Options taken from the configuration's PDF directory and download settings.
  pub fn from_config(config: &Config) -> Result<Self> {
    Ok(Self {
      target_dir: config.pdf_dir.clone(),
      timeout:    config.download.timeout(),
      rate_limit: config.download.rate_limit()?,
    })
  }

  /// Sets the per-artifact timeout.
  pub fn with_timeout(mut self, timeout: Duration) -> Self {
    self.timeout = timeout;
    self
  }

  /// Sets the pause after each successful fetch.
  pub fn with_rate_limit(mut self, rate_limit: RateLimit) -> Self {
    self.rate_limit = rate_limit;
    self
  }
}

/// One artifact that could not be made available.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DownloadFailure {
  /// Record ID of the entry
  pub id:    String,
  /// Artifact URL, when one could be derived
  pub url:   Option<String>,
  /// Cause of the failure
  pub error: String,
}

/// Outcome of a download run.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DownloadReport {
  /// Entries whose artifact is now present: downloaded plus already present
  pub succeeded:       usize,
  /// Entries considered
  pub attempted:       usize,
  /// Entries whose artifact was found locally without fetching
  pub already_present: usize,
  /// Per-item failures, in catalog order
  pub failures:        Vec<DownloadFailure>,
}

/// Downloads the PDF of every catalog entry that is not present locally yet.
///
/// # Errors
///
/// Only failing to create or scan the target directory is an error. Per-artifact problems (a
/// missing or ambiguous PDF link, a network error, a non-success status, an I/O error) end up in
/// [`DownloadReport::failures`].
pub async fn download_all<A>(
  catalog: &Catalog,
  fetcher: &A,
  options: &DownloadOptions,
) -> Result<DownloadReport>
where
  A: ArtifactFetcher + ?Sized,
{
  tokio::fs::create_dir_all(&options.target_dir).await?;
  let present = scan_local_artifacts(&options.target_dir)?;
  debug!("Found {} files under {:?}", present.len(), options.target_dir);

  let mut report = DownloadReport::default();
  for entry in catalog.entries() {
    report.attempted += 1;

    let (url, filename) = match entry.artifact_url().and_then(|url| {
      let filename = entry.artifact_filename()?;
      Ok((url, filename))
    }) {
      Ok(found) => found,
      Err(e) => {
        error!("Cannot download {}: {e}", entry.id);
        report.failures.push(DownloadFailure {
          id:    entry.id.clone(),
          url:   None,
          error: e.to_string(),
        });
        continue;
      },
    };

    if present.contains(&filename) {
      trace!("{filename} exists, skipping");
      report.already_present += 1;
      report.succeeded += 1;
      continue;
    }

    let dest = options.target_dir.join(&filename);
    info!("Fetching {url} into {dest:?}");
    match fetcher.fetch(&url, &dest).await {
      Ok(bytes) => {
        debug!("Wrote {bytes} bytes to {dest:?}");
        report.succeeded += 1;
        options.rate_limit.pause().await;
      },
      Err(e) => {
        error!("Error downloading {url}: {e}");
        report.failures.push(DownloadFailure {
          id:    entry.id.clone(),
          url:   Some(url),
          error: e.to_string(),
        });
      },
    }

    info!("{}/{} of {} downloaded ok.", report.succeeded, report.attempted, catalog.len());
  }

  info!(
    "Final number of papers downloaded okay: {}/{} ({} already present, {} failed)",
    report.succeeded,
    report.attempted,
    report.already_present,
    report.failures.len()
  );
  Ok(report)
}
