//! Catalog entries and identifier handling.
//!
//! An [`Entry`] is the normalized record for one paper at the latest version the catalog has
//! seen. Entries are produced at the ingestion boundary, either from a feed record
//! ([`Entry::from_feed`]) or from a bulk snapshot record
//! ([`BulkRecord::into_entry`](crate::dataset::BulkRecord::into_entry)), so the merge logic never
//! sees a provider-specific shape.
//!
//! # Examples
//!
//! ```
//! use harvester::entry::parse_identifier_url;
//!
//! let (id, version) = parse_identifier_url("http://arxiv.org/abs/1512.08756v2").unwrap();
//! assert_eq!(id, "1512.08756");
//! assert_eq!(version, 2);
//! ```

use url::Url;

use super::*;
use crate::feed::FeedRecord;

/// Media type marking the downloadable artifact of an entry.
pub const PDF_MEDIA_TYPE: &str = "application/pdf";

/// Normalized catalog record for one paper.
///
/// Everything the synchronizer needs to reason about lives in typed fields; anything
/// provider-specific that is kept only for downstream consumers goes into [`Entry::extra`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Entry {
  /// Canonical record ID without version suffix (e.g. `"1512.08756"`)
  pub id:               String,
  /// Version number, monotonically increasing per record ID
  pub version:          u32,
  /// The paper's title with whitespace collapsed
  pub title:            String,
  /// Timestamp of the version this entry holds
  pub updated:          DateTime<Utc>,
  /// Timestamp of the first version, when known
  #[serde(default)]
  pub published:        Option<DateTime<Utc>>,
  /// Paper authors in listed order
  #[serde(default)]
  pub authors:          Vec<Author>,
  /// Links to alternate representations, including the PDF artifact
  #[serde(default)]
  pub links:            Vec<Link>,
  /// Abstract text
  #[serde(default)]
  pub summary:          String,
  /// Category tags (e.g. `cs.LG`)
  #[serde(default)]
  pub tags:             Vec<String>,
  /// Primary category, if the provider names one
  #[serde(default)]
  pub primary_category: Option<String>,
  /// Provider-specific auxiliary fields
  #[serde(default)]
  pub extra:            BTreeMap<String, Value>,
}

/// Author of a paper.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Author {
  /// Author's full name
  pub name:        String,
  /// Optional institutional affiliation
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub affiliation: Option<String>,
}

/// A typed link attached to an entry.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Link {
  /// Link target
  pub href:       String,
  /// Media type of the target (e.g. `application/pdf`)
  #[serde(rename = "type", default)]
  pub media_type: Option<String>,
  /// Link relation (`alternate`, `related`)
  #[serde(default)]
  pub rel:        Option<String>,
  /// Human readable link title (`pdf`, `doi`)
  #[serde(default)]
  pub title:      Option<String>,
}

impl Author {
  /// Creates an author with just a name.
  pub fn new(name: impl Into<String>) -> Self { Self { name: name.into(), affiliation: None } }
}

impl Link {
  /// Creates the `application/pdf` link for an entry.
  pub fn pdf(href: impl Into<String>) -> Self {
    Self {
      href:       href.into(),
      media_type: Some(PDF_MEDIA_TYPE.to_string()),
      rel:        Some("related".to_string()),
      title:      Some("pdf".to_string()),
    }
  }

  /// Creates the `text/html` alternate link for an entry.
  pub fn alternate(href: impl Into<String>) -> Self {
    Self {
      href:       href.into(),
      media_type: Some("text/html".to_string()),
      rel:        Some("alternate".to_string()),
      title:      None,
    }
  }

  /// Whether this link points at the PDF artifact.
  pub fn is_pdf(&self) -> bool { self.media_type.as_deref() == Some(PDF_MEDIA_TYPE) }
}

impl Entry {
  /// Normalizes a feed record into an entry.
  ///
  /// The record ID and version are taken from the record's identifier URL, see
  /// [`parse_identifier_url`].
  ///
  /// # Errors
  ///
  /// Returns [`HarvesterError::MalformedIdentifier`] if the identifier URL does not end in
  /// `<id>v<version>`.
  pub fn from_feed(record: FeedRecord) -> Result<Self> {
    let (id, version) = parse_identifier_url(&record.id_url)?;
    Ok(Self {
      id,
      version,
      title: record.title,
      updated: record.updated,
      published: record.published,
      authors: record.authors,
      links: record.links,
      summary: record.summary,
      tags: record.categories,
      primary_category: record.primary_category,
      extra: record.extra,
    })
  }

  /// Returns the entry's single PDF link.
  ///
  /// # Errors
  ///
  /// Returns [`HarvesterError::PdfLink`] when the entry carries zero or several PDF links.
  pub fn pdf_link(&self) -> Result<&Link> {
    let mut pdfs = self.links.iter().filter(|link| link.is_pdf());
    match (pdfs.next(), pdfs.next()) {
      (Some(link), None) => Ok(link),
      (first, second) => Err(HarvesterError::PdfLink {
        id:    self.id.clone(),
        count: first.iter().count() + second.iter().count() + pdfs.count(),
      }),
    }
  }

  /// URL of the PDF artifact.
  ///
  /// arXiv PDF links omit the extension, so `.pdf` is appended unless already present.
  pub fn artifact_url(&self) -> Result<String> {
    let href = &self.pdf_link()?.href;
    if href.ends_with(".pdf") {
      Ok(href.clone())
    } else {
      Ok(format!("{href}.pdf"))
    }
  }

  /// Local filename of the PDF artifact: the final path segment of [`Entry::artifact_url`].
  pub fn artifact_filename(&self) -> Result<String> {
    let artifact_url = self.artifact_url()?;
    let url =
      Url::parse(&artifact_url).map_err(|_| HarvesterError::InvalidUrl(artifact_url.clone()))?;
    url
      .path_segments()
      .and_then(|mut segments| segments.next_back())
      .filter(|segment| !segment.is_empty())
      .map(str::to_string)
      .ok_or(HarvesterError::InvalidUrl(artifact_url))
  }
}

impl Display for Entry {
  fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
    write!(f, "{}v{} {}", self.id, self.version, self.title)
  }
}

/// Extracts the record ID and version from an identifier URL.
///
/// The final path segment must have the exact shape `<id>v<version>`: a non-empty ID, a single
/// `v` separator and a decimal version, e.g. `http://arxiv.org/abs/1512.08756v2`.
///
/// # Errors
///
/// Returns [`HarvesterError::MalformedIdentifier`] for any other shape, including a missing
/// separator (`.../abc123`) or a second one (`.../1v2v3`).
pub fn parse_identifier_url(url: &str) -> Result<(String, u32)> {
  lazy_static! {
    static ref ID_VERSION: Regex = Regex::new(r"^([^v]+)v([0-9]+)$").unwrap();
  }

  let id_version = url.rsplit('/').next().unwrap_or(url);
  let captures = ID_VERSION
    .captures(id_version)
    .ok_or_else(|| HarvesterError::MalformedIdentifier(url.to_string()))?;
  let version = captures[2]
    .parse::<u32>()
    .map_err(|_| HarvesterError::MalformedIdentifier(url.to_string()))?;
  Ok((captures[1].to_string(), version))
}

/// Collapses runs of whitespace (including line breaks) into single spaces.
pub(crate) fn collapse_whitespace(text: &str) -> String {
  text.split_whitespace().collect::<Vec<_>>().join(" ")
}
