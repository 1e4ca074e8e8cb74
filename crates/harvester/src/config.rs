//! Explicit configuration for the harvesting pipelines.
//!
//! A [`Config`] enumerates every option the library recognizes. It is read from a TOML file (or
//! defaulted) once by the caller and then handed to each pipeline's entry point, so no component
//! reads ambient global state.
//!
//! # Example Configuration
//!
//! ```toml
//! database_path = "/var/lib/harvester/catalog.db"
//! pdf_dir = "/var/lib/harvester/pdf"
//!
//! [feed]
//! base_url = "http://export.arxiv.org/api/query"
//! timeout_secs = 30
//! wait_time_secs = 5.0
//! jitter_secs = 3.0
//!
//! [download]
//! timeout_secs = 10
//! wait_time_secs = 0.05
//! jitter_secs = 0.1
//! ```

use super::*;

/// Top level configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
  /// Location of the catalog database
  pub database_path: PathBuf,
  /// Directory PDF artifacts are downloaded into
  pub pdf_dir:       PathBuf,
  /// Remote feed settings
  pub feed:          FeedConfig,
  /// Artifact download settings
  pub download:      DownloadConfig,
}

/// Settings for the remote paginated feed.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FeedConfig {
  /// Query endpoint of the feed API
  pub base_url:       String,
  /// Per-request timeout in seconds
  pub timeout_secs:   u64,
  /// Fixed pause between pages in seconds
  pub wait_time_secs: f64,
  /// Upper bound of the random extra pause between pages in seconds
  pub jitter_secs:    f64,
}

/// Settings for artifact downloads.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DownloadConfig {
  /// Per-artifact timeout in seconds, covering connect and body
  pub timeout_secs:   u64,
  /// Fixed pause after each successful fetch in seconds
  pub wait_time_secs: f64,
  /// Upper bound of the random extra pause after each fetch in seconds
  pub jitter_secs:    f64,
}

impl Default for Config {
  fn default() -> Self {
    Self {
      database_path: Self::default_database_path(),
      pdf_dir:       Self::default_pdf_dir(),
      feed:          FeedConfig::default(),
      download:      DownloadConfig::default(),
    }
  }
}

impl Default for FeedConfig {
  fn default() -> Self {
    Self {
      base_url:       "http://export.arxiv.org/api/query".to_string(),
      timeout_secs:   30,
      wait_time_secs: 5.0,
      jitter_secs:    3.0,
    }
  }
}

impl Default for DownloadConfig {
  fn default() -> Self { Self { timeout_secs: 10, wait_time_secs: 0.05, jitter_secs: 0.1 } }
}

impl Config {
  /// Default location of the configuration file.
  ///
  /// - On Unix: `~/.config/harvester/config.toml`
  /// - On macOS: `~/Library/Application Support/harvester/config.toml`
  /// - On Windows: `%APPDATA%\harvester\config.toml`
  pub fn default_path() -> PathBuf {
    dirs::config_dir().unwrap_or_else(|| PathBuf::from(".")).join("harvester").join("config.toml")
  }

  /// Default location of the catalog database, under the platform data directory.
  pub fn default_database_path() -> PathBuf {
    dirs::data_dir().unwrap_or_else(|| PathBuf::from(".")).join("harvester").join("catalog.db")
  }

  /// Default PDF directory, under the platform document directory.
  pub fn default_pdf_dir() -> PathBuf {
    dirs::document_dir().unwrap_or_else(|| PathBuf::from(".")).join("harvester").join("pdf")
  }

  /// Reads a configuration from a TOML file. Missing keys take their defaults.
  pub fn load(path: impl AsRef<Path>) -> Result<Self> {
    let content = std::fs::read_to_string(path.as_ref())?;
    Self::from_toml_str(&content)
  }

  /// Like [`Config::load`], but a missing file yields [`Config::default`].
  pub fn load_or_default(path: impl AsRef<Path>) -> Result<Self> {
    let path = path.as_ref();
    if path.exists() {
      Self::load(path)
    } else {
      debug!("No configuration at {path:?}, using defaults");
      Ok(Self::default())
    }
  }

  /// Parses a configuration from a TOML string.
  pub fn from_toml_str(content: &str) -> Result<Self> {
    let config: Config = toml::from_str(content)?;
    config.validate()?;
    Ok(config)
  }

  /// Sets the catalog database location.
  pub fn with_database_path(mut self, database_path: &Path) -> Self {
    self.database_path = database_path.to_path_buf();
    self
  }

  /// Sets the PDF directory.
  pub fn with_pdf_dir(mut self, pdf_dir: &Path) -> Self {
    self.pdf_dir = pdf_dir.to_path_buf();
    self
  }

  fn validate(&self) -> Result<()> {
    if !self.feed.wait_time_secs.is_finite() || !self.feed.jitter_secs.is_finite() {
      return Err(HarvesterError::Config("feed delays must be finite".into()));
    }
    if !self.download.wait_time_secs.is_finite() || !self.download.jitter_secs.is_finite() {
      return Err(HarvesterError::Config("download delays must be finite".into()));
    }
    if self.feed.timeout_secs == 0 || self.download.timeout_secs == 0 {
      return Err(HarvesterError::Config("timeouts must be at least one second".into()));
    }
    self.feed.rate_limit()?;
    self.download.rate_limit()?;
    Ok(())
  }
}

impl FeedConfig {
  /// Per-request timeout.
  pub fn timeout(&self) -> Duration { Duration::from_secs(self.timeout_secs) }

  /// Pause between pages.
  pub fn rate_limit(&self) -> Result<RateLimit> {
    RateLimit::from_secs_f64(self.wait_time_secs, self.jitter_secs)
  }
}

impl DownloadConfig {
  /// Per-artifact timeout.
  pub fn timeout(&self) -> Duration { Duration::from_secs(self.timeout_secs) }

  /// Pause after each successful fetch.
  pub fn rate_limit(&self) -> Result<RateLimit> {
    RateLimit::from_secs_f64(self.wait_time_secs, self.jitter_secs)
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn test_defaults() {
    let config = Config::default();
    assert!(config.database_path.ends_with("harvester/catalog.db"));
    assert!(config.pdf_dir.ends_with("harvester/pdf"));
    assert_eq!(config.feed.timeout(), Duration::from_secs(30));
    assert_eq!(config.feed.rate_limit().unwrap().delay, Duration::from_secs(5));
    assert_eq!(config.download.rate_limit().unwrap().jitter, Duration::from_millis(100));
  }

  #[test]
  fn test_partial_toml_keeps_defaults() {
    let config = Config::from_toml_str(
      r#"
        pdf_dir = "/tmp/pdfs"

        [feed]
        wait_time_secs = 1.5
      "#,
    )
    .unwrap();

    assert_eq!(config.pdf_dir, PathBuf::from("/tmp/pdfs"));
    assert_eq!(config.feed.wait_time_secs, 1.5);
    assert_eq!(config.feed.jitter_secs, 3.0);
    assert_eq!(config.feed.base_url, "http://export.arxiv.org/api/query");
    assert_eq!(config.download, DownloadConfig::default());
  }

  #[test]
  fn test_rejects_zero_timeout() {
    let result = Config::from_toml_str("[download]\ntimeout_secs = 0\n");
    assert!(matches!(result, Err(HarvesterError::Config(_))));
  }

  #[test]
  fn test_rejects_oversized_delay() {
    let result = Config::from_toml_str("[feed]\nwait_time_secs = 1e300\n");
    assert!(matches!(result, Err(HarvesterError::Config(_))));
  }

  #[test]
  fn test_rejects_unknown_types() {
    let result = Config::from_toml_str("[feed]\ntimeout_secs = \"soon\"\n");
    assert!(matches!(result, Err(HarvesterError::TomlDe(_))));
  }

  #[test]
  fn test_load_or_default_missing_file() {
    let dir = tempdir().unwrap();
    let config = Config::load_or_default(dir.path().join("missing.toml")).unwrap();
    assert_eq!(config, Config::default());
  }

  #[test]
  fn test_load_from_file() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("config.toml");
    std::fs::write(&path, "database_path = \"/tmp/catalog.db\"\n").unwrap();
    let config = Config::load(&path).unwrap().with_pdf_dir(Path::new("/tmp/out"));
    assert_eq!(config.database_path, PathBuf::from("/tmp/catalog.db"));
    assert_eq!(config.pdf_dir, PathBuf::from("/tmp/out"));
  }
}
