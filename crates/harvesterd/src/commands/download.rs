//! Module for the "download" functionality.

use harvester::download::{download_all, DownloadOptions, HttpFetcher};

use super::*;

/// Arguments that can be used for the [`Commands::Download`]
#[derive(Args, Clone, Debug)]
pub struct DownloadArgs {
  /// Directory PDFs are stored in, overriding the configuration
  #[arg(long)]
  pub pdf_dir: Option<PathBuf>,

  /// Per-PDF timeout in seconds, overriding the configuration
  #[arg(long)]
  pub timeout: Option<u64>,
}

/// Function for the [`Commands::Download`] in the CLI.
///
/// Individual PDF failures are listed and counted but do not fail the command.
pub async fn download(config: &Config, args: &DownloadArgs) -> Result<()> {
  let catalog = open_store(config).await?.load().await;

  let mut options = DownloadOptions::from_config(config)?;
  if let Some(pdf_dir) = &args.pdf_dir {
    options.target_dir = pdf_dir.clone();
  }
  if let Some(timeout) = args.timeout {
    options = options.with_timeout(Duration::from_secs(timeout.max(1)));
  }

  println!(
    "{} Downloading PDFs for {} papers into {}",
    style(INFO_PREFIX).cyan(),
    catalog.len(),
    style(options.target_dir.display()).yellow()
  );

  let fetcher = HttpFetcher::new(options.timeout)?;
  let report = download_all(&catalog, &fetcher, &options).await?;

  for failure in &report.failures {
    println!(
      "{} {}: {}",
      style(WARNING_PREFIX).yellow(),
      style(&failure.id).cyan(),
      failure.error
    );
  }
  println!(
    "{} {}/{} PDFs available ({} already present, {} failed)",
    style(SUCCESS_PREFIX).green(),
    report.succeeded,
    report.attempted,
    report.already_present,
    report.failures.len()
  );
  Ok(())
}
