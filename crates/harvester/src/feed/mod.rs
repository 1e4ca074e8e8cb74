//! Remote paginated feed clients.
//!
//! The synchronizer only needs one capability from a feed: "give me the records from `start` to
//! `start + count` for this query". That capability is the [`FeedClient`] trait, implemented here
//! for the arXiv Atom API by [`ArxivFeed`] and by in-memory fakes in tests.
//!
//! Provider responses are canonicalized at this boundary into plain [`FeedRecord`]s; nothing
//! downstream ever sees the Atom document shape.
//!
//! # Examples
//!
//! ```no_run
//! use harvester::{config::FeedConfig, feed::ArxivFeed, prelude::*};
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let feed = ArxivFeed::new(&FeedConfig::default())?;
//! let records = feed.fetch_page("cat:cs.LG", 0, 100).await?;
//! for record in &records {
//!   println!("{} {}", record.id_url, record.title);
//! }
//! # Ok(())
//! # }
//! ```

use super::*;
use crate::config::FeedConfig;

mod atom;

pub use atom::parse_feed;

/// A raw record from a feed page, already reduced to plain data.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FeedRecord {
  /// Identifier URL whose final segment is `<id>v<version>`
  pub id_url:           String,
  /// Timestamp of this version
  pub updated:          DateTime<Utc>,
  /// Timestamp of the first version
  pub published:        Option<DateTime<Utc>>,
  /// Title with whitespace collapsed
  pub title:            String,
  /// Abstract with whitespace collapsed
  pub summary:          String,
  /// Authors in listed order
  pub authors:          Vec<Author>,
  /// Typed links, including the PDF link
  pub links:            Vec<Link>,
  /// Category terms
  pub categories:       Vec<String>,
  /// Primary category term
  pub primary_category: Option<String>,
  /// Provider-specific auxiliary fields (comment, journal reference, DOI)
  pub extra:            BTreeMap<String, Value>,
}

/// A source of paginated search results.
#[async_trait]
pub trait FeedClient: Send + Sync {
  /// Fetches `count` records starting at offset `start` for `query`.
  ///
  /// Returns an empty vector when the feed has nothing at that offset (or is throttling).
  ///
  /// # Errors
  ///
  /// Returns a transport error ([`HarvesterError::Network`] or [`HarvesterError::ApiError`])
  /// when no page could be obtained at all.
  async fn fetch_page(&self, query: &str, start: usize, count: usize) -> Result<Vec<FeedRecord>>;
}

/// Client for the arXiv Atom query API.
#[derive(Debug, Clone)]
pub struct ArxivFeed {
  /// Internal web client, carrying the request timeout.
  client:   reqwest::Client,
  /// Query endpoint, e.g. `http://export.arxiv.org/api/query`.
  base_url: String,
}

impl ArxivFeed {
  /// Creates a client from the feed configuration.
  pub fn new(config: &FeedConfig) -> Result<Self> {
    let client = reqwest::Client::builder().timeout(config.timeout()).build()?;
    Ok(Self { client, base_url: config.base_url.clone() })
  }

  /// Builds the request URL for one page, most recently updated first.
  ///
  /// The query is passed through verbatim so that arXiv's `+OR+` syntax keeps its meaning.
  pub fn page_url(&self, query: &str, start: usize, count: usize) -> String {
    format!(
      "{}?search_query={query}&sortBy=lastUpdatedDate&start={start}&max_results={count}",
      self.base_url
    )
  }
}

#[async_trait]
impl FeedClient for ArxivFeed {
  async fn fetch_page(&self, query: &str, start: usize, count: usize) -> Result<Vec<FeedRecord>> {
    let url = self.page_url(query, start, count);
    debug!("Fetching feed page via: {url}");

    let response = self.client.get(&url).send().await?;
    let status = response.status();
    if !status.is_success() {
      return Err(HarvesterError::ApiError(format!("Feed request failed: {status}")));
    }

    let data = response.bytes().await?;
    trace!("Feed response: {}", String::from_utf8_lossy(&data));

    parse_feed(&String::from_utf8_lossy(&data))
  }
}
