//! Module for the "status" functionality.

use harvester::download::scan_local_artifacts;

use super::*;

/// Arguments that can be used for the [`Commands::Status`]
#[derive(Args, Clone, Debug)]
pub struct StatusArgs {
  /// Directory PDFs are stored in, overriding the configuration
  #[arg(long)]
  pub pdf_dir: Option<PathBuf>,
}

/// Function for the [`Commands::Status`] in the CLI.
pub async fn status(config: &Config, args: &StatusArgs) -> Result<()> {
  let catalog = open_store(config).await?.load().await;
  let pdf_dir = args.pdf_dir.as_ref().unwrap_or(&config.pdf_dir);

  let present = if pdf_dir.is_dir() { scan_local_artifacts(pdf_dir)? } else { Default::default() };
  let with_pdf = catalog
    .entries()
    .filter(|entry| entry.artifact_filename().is_ok_and(|name| present.contains(&name)))
    .count();

  println!(
    "{} Catalog: {} papers in {}",
    style(INFO_PREFIX).cyan(),
    style(catalog.len()).yellow(),
    style(config.database_path.display()).yellow()
  );
  println!(
    "{} PDFs: {}/{} present in {}",
    style(INFO_PREFIX).cyan(),
    style(with_pdf).yellow(),
    catalog.len(),
    style(pdf_dir.display()).yellow()
  );
  if let Some(latest) = catalog.entries().max_by_key(|entry| entry.updated) {
    println!(
      "{} Most recently updated: {} ({})",
      style(INFO_PREFIX).cyan(),
      latest,
      latest.updated.format("%Y-%m-%d")
    );
  }
  Ok(())
}
