//! Bulk metadata snapshot records and readers.
//!
//! The bulk source is the arXiv metadata snapshot: one JSON object per line, several gigabytes in
//! total. [`JsonLines`] reads it lazily, one record at a time, and [`BulkRecord::into_entry`]
//! reshapes each record into the same [`Entry`] schema the feed produces.
//!
//! # Examples
//!
//! ```no_run
//! use harvester::dataset::JsonLines;
//!
//! # fn example() -> Result<(), Box<dyn std::error::Error>> {
//! for record in JsonLines::open("arxiv-metadata-oai-snapshot.json")? {
//!   let entry = record?.into_entry()?;
//!   println!("{entry}");
//! }
//! # Ok(())
//! # }
//! ```

use std::{
  fs::File,
  io::{BufRead, BufReader, Lines},
};

use super::*;
use crate::entry::{collapse_whitespace, parse_identifier_url};

/// Host used for synthesized abstract and PDF links.
const ARXIV_HOST: &str = "http://arxiv.org";

/// One record of the bulk metadata snapshot.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BulkRecord {
  /// Record ID without version suffix
  pub id:             String,
  /// Who submitted the paper
  #[serde(default)]
  pub submitter:      Option<String>,
  /// Raw, comma separated author string
  #[serde(default)]
  pub authors:        String,
  /// Title, possibly spanning lines
  pub title:          String,
  /// Free-form submission comments
  #[serde(default)]
  pub comments:       Option<String>,
  /// Journal reference
  #[serde(rename = "journal-ref", default)]
  pub journal_ref:    Option<String>,
  /// DOI
  #[serde(default)]
  pub doi:            Option<String>,
  /// Report number
  #[serde(rename = "report-no", default)]
  pub report_no:      Option<String>,
  /// Space separated category list
  #[serde(default)]
  pub categories:     String,
  /// License URL
  #[serde(default)]
  pub license:        Option<String>,
  /// Abstract
  #[serde(rename = "abstract", default)]
  pub abstract_text:  String,
  /// Revision history, oldest first
  #[serde(default)]
  pub versions:       Vec<Revision>,
  /// Date of the last metadata update
  #[serde(default)]
  pub update_date:    Option<String>,
  /// Authors split into `[last, first, suffix]`
  #[serde(default)]
  pub authors_parsed: Vec<Vec<String>>,
}

/// One entry of a record's revision history.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Revision {
  /// Version tag, e.g. `v2`
  pub version: String,
  /// RFC 2822 creation time, e.g. `Mon, 2 Apr 2007 19:18:42 GMT`
  pub created: String,
}

impl BulkRecord {
  /// The record's categories in listed order, without duplicates.
  pub fn category_list(&self) -> Vec<String> {
    let mut seen = HashSet::new();
    self
      .categories
      .split_whitespace()
      .filter(|category| seen.insert(*category))
      .map(str::to_string)
      .collect()
  }

  /// Whether any of the record's categories is in `filter`.
  pub fn matches(&self, filter: &BTreeSet<String>) -> bool {
    self.categories.split_whitespace().any(|category| filter.contains(category))
  }

  /// Reshapes this record into a catalog entry.
  ///
  /// The version is the length of the revision history; the PDF and abstract links are
  /// synthesized from the latest revision tag. The record ID is taken from the synthesized link
  /// exactly as for feed records, so old-style IDs (`hep-ph/0701001`) lose their archive prefix
  /// in both paths alike.
  ///
  /// # Errors
  ///
  /// Returns [`HarvesterError::Dataset`] if the revision history is empty or a revision timestamp
  /// is not RFC 2822, and [`HarvesterError::MalformedIdentifier`] if the synthesized link does
  /// not parse back into an ID and version.
  pub fn into_entry(self) -> Result<Entry> {
    let (Some(first), Some(last)) = (self.versions.first(), self.versions.last()) else {
      return Err(HarvesterError::Dataset(format!("{} has no revisions", self.id)));
    };
    let version = u32::try_from(self.versions.len())
      .map_err(|_| HarvesterError::Dataset(format!("{} has too many revisions", self.id)))?;
    let updated = parse_revision_time(&self.id, &last.created)?;
    let published = parse_revision_time(&self.id, &first.created)?;

    let tag = &last.version;
    let abs_url = format!("{ARXIV_HOST}/abs/{}{tag}", self.id);
    let (id, _) = parse_identifier_url(&abs_url)?;
    let links =
      vec![Link::alternate(abs_url), Link::pdf(format!("{ARXIV_HOST}/pdf/{}{tag}", self.id))];

    let tags = self.category_list();
    let authors = self.author_list();

    let mut extra = BTreeMap::new();
    for (key, value) in [
      ("submitter", &self.submitter),
      ("comment", &self.comments),
      ("journal_ref", &self.journal_ref),
      ("doi", &self.doi),
      ("report_no", &self.report_no),
      ("license", &self.license),
      ("update_date", &self.update_date),
    ] {
      if let Some(value) = value {
        extra.insert(key.to_string(), Value::String(collapse_whitespace(value)));
      }
    }

    Ok(Entry {
      version,
      title: collapse_whitespace(&self.title),
      updated,
      published: Some(published),
      authors,
      links,
      summary: collapse_whitespace(&self.abstract_text),
      primary_category: tags.first().cloned(),
      tags,
      extra,
      id,
    })
  }

  /// Authors as `"<first> <last>"`, falling back to the raw author string.
  fn author_list(&self) -> Vec<Author> {
    if !self.authors_parsed.is_empty() {
      return self
        .authors_parsed
        .iter()
        .map(|parts| {
          let last = parts.first().map(String::as_str).unwrap_or_default();
          let first = parts.get(1).map(String::as_str).unwrap_or_default();
          Author::new(format!("{first} {last}").trim())
        })
        .filter(|author| !author.name.is_empty())
        .collect();
    }

    collapse_whitespace(&self.authors)
      .split(',')
      .flat_map(|chunk| chunk.split(" and "))
      .map(str::trim)
      .filter(|name| !name.is_empty())
      .map(Author::new)
      .collect()
  }
}

fn parse_revision_time(id: &str, created: &str) -> Result<DateTime<Utc>> {
  DateTime::parse_from_rfc2822(created.trim())
    .map(|dt| dt.with_timezone(&Utc))
    .map_err(|e| {
      HarvesterError::Dataset(format!("{id} has invalid revision time {created:?}: {e}"))
    })
}

/// Lazy reader over a JSON Lines snapshot.
///
/// Each call to `next` reads exactly one non-blank line; the file is never held in memory.
pub struct JsonLines<R> {
  /// Remaining lines of the input.
  lines:       Lines<R>,
  /// One-based number of the last line read.
  line_number: usize,
}

impl JsonLines<BufReader<File>> {
  /// Opens a snapshot file.
  pub fn open(path: impl AsRef<Path>) -> Result<Self> {
    let file = File::open(path.as_ref())?;
    Ok(Self::new(BufReader::new(file)))
  }
}

impl<R: BufRead> JsonLines<R> {
  /// Wraps any buffered reader.
  pub fn new(reader: R) -> Self { Self { lines: reader.lines(), line_number: 0 } }
}

impl<R: BufRead> Iterator for JsonLines<R> {
  type Item = Result<BulkRecord>;

  fn next(&mut self) -> Option<Self::Item> {
    loop {
      let line = match self.lines.next()? {
        Ok(line) => line,
        Err(e) => return Some(Err(e.into())),
      };
      self.line_number += 1;
      if line.trim().is_empty() {
        continue;
      }
      return Some(serde_json::from_str(&line).map_err(|e| {
        HarvesterError::Dataset(format!("line {}: {e}", self.line_number))
      }));
    }
  }
}
