//! Atom response parsing for the arXiv query API.
//!
//! Namespace declarations and element prefixes (`arxiv:`, `opensearch:`) are stripped before the
//! document is deserialized, so the serde structs below address everything by local name.

use quick_xml::de::from_str;

use super::*;
use crate::entry::collapse_whitespace;

/// An Atom feed. Only the entries matter.
#[derive(Debug, Deserialize)]
struct AtomFeed {
  #[serde(rename = "entry", default)]
  entries: Vec<AtomEntry>,
}

#[derive(Debug, Deserialize)]
struct AtomEntry {
  /// Identifier URL, e.g. `http://arxiv.org/abs/2301.07041v2`
  id:               String,
  updated:          DateTime<Utc>,
  #[serde(default)]
  published:        Option<DateTime<Utc>>,
  title:            String,
  #[serde(default)]
  summary:          String,
  #[serde(rename = "author", default)]
  authors:          Vec<AtomAuthor>,
  #[serde(rename = "link", default)]
  links:            Vec<AtomLink>,
  #[serde(rename = "category", default)]
  categories:       Vec<AtomCategory>,
  #[serde(default)]
  primary_category: Option<AtomCategory>,
  #[serde(default)]
  comment:          Option<String>,
  #[serde(default)]
  journal_ref:      Option<String>,
  #[serde(default)]
  doi:              Option<String>,
}

#[derive(Debug, Deserialize)]
struct AtomAuthor {
  name:         String,
  #[serde(rename = "affiliation", default)]
  affiliations: Vec<String>,
}

#[derive(Debug, Deserialize)]
struct AtomLink {
  #[serde(rename = "@href")]
  href:       String,
  #[serde(rename = "@rel", default)]
  rel:        Option<String>,
  #[serde(rename = "@type", default)]
  media_type: Option<String>,
  #[serde(rename = "@title", default)]
  title:      Option<String>,
}

#[derive(Debug, Deserialize)]
struct AtomCategory {
  #[serde(rename = "@term")]
  term: String,
}

/// Parses an arXiv Atom response into feed records.
///
/// An empty feed yields an empty vector.
///
/// # Errors
///
/// Returns [`HarvesterError::MalformedFeed`] if the document cannot be parsed, and
/// [`HarvesterError::ApiError`] if arXiv answered with its error entry instead of results.
pub fn parse_feed(xml: &str) -> Result<Vec<FeedRecord>> {
  let stripped = strip_xml_namespaces(xml);
  let feed: AtomFeed = from_str(&stripped).map_err(|e| {
    HarvesterError::MalformedFeed(format!("{e}; body starts with {:?}", excerpt(xml)))
  })?;

  if let Some(error) = feed.entries.iter().find(|entry| entry.id.contains("/api/errors")) {
    return Err(HarvesterError::ApiError(collapse_whitespace(&error.summary)));
  }

  Ok(feed.entries.into_iter().map(FeedRecord::from).collect())
}

/// First few hundred characters of `body`, whitespace collapsed.
fn excerpt(body: &str) -> String {
  const LIMIT: usize = 200;
  let collapsed = collapse_whitespace(body);
  match collapsed.char_indices().nth(LIMIT) {
    Some((end, _)) => format!("{}...", &collapsed[..end]),
    None => collapsed,
  }
}

impl From<AtomEntry> for FeedRecord {
  fn from(entry: AtomEntry) -> Self {
    let mut extra = BTreeMap::new();
    for (key, value) in
      [("comment", entry.comment), ("journal_ref", entry.journal_ref), ("doi", entry.doi)]
    {
      if let Some(value) = value {
        extra.insert(key.to_string(), Value::String(collapse_whitespace(&value)));
      }
    }

    FeedRecord {
      id_url: entry.id.trim().to_string(),
      updated: entry.updated,
      published: entry.published,
      title: collapse_whitespace(&entry.title),
      summary: collapse_whitespace(&entry.summary),
      authors: entry
        .authors
        .into_iter()
        .map(|author| Author {
          name:        collapse_whitespace(&author.name),
          affiliation: (!author.affiliations.is_empty()).then(|| author.affiliations.join("; ")),
        })
        .collect(),
      links: entry
        .links
        .into_iter()
        .map(|link| Link {
          href:       link.href,
          media_type: link.media_type,
          rel:        link.rel,
          title:      link.title,
        })
        .collect(),
      categories: entry.categories.into_iter().map(|c| c.term).collect(),
      primary_category: entry.primary_category.map(|c| c.term),
      extra,
    }
  }
}

/// Removes namespace declarations and element prefixes.
fn strip_xml_namespaces(xml: &str) -> String {
  lazy_static! {
    static ref DECLARATION: Regex = Regex::new(r#"\s+xmlns(?::\w+)?="[^"]*""#).unwrap();
    static ref PREFIX: Regex = Regex::new(r"(</?)[A-Za-z_][\w.-]*:").unwrap();
  }
  let result = DECLARATION.replace_all(xml, "");
  PREFIX.replace_all(&result, "$1").into_owned()
}
