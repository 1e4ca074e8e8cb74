//! The in-memory catalog and the version-aware merge rule.
//!
//! Every pipeline that brings records into the catalog goes through [`Catalog::merge`], which is
//! what makes repeated harvests idempotent: an incoming entry only replaces what is stored when
//! its record is new or its version is strictly greater.
//!
//! # Examples
//!
//! ```
//! # use harvester::{Catalog, Entry, MergeOutcome};
//! # fn example(v1: Entry, v2: Entry) {
//! let mut catalog = Catalog::new();
//! assert_eq!(catalog.merge(v2.clone()), MergeOutcome::Inserted);
//! assert_eq!(catalog.merge(v1), MergeOutcome::Skipped);
//! assert_eq!(catalog.merge(v2), MergeOutcome::Skipped);
//! # }
//! ```

use super::*;

/// Mapping from record ID to the latest known [`Entry`] for that record.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Catalog {
  /// Entries keyed by record ID.
  entries: BTreeMap<String, Entry>,
}

/// Result of merging one incoming entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MergeOutcome {
  /// The record was not in the catalog.
  Inserted,
  /// The record was present at a lower version and has been replaced.
  Replaced {
    /// Version that was stored before the merge
    previous: u32,
  },
  /// The stored version is equal or newer; nothing changed.
  Skipped,
}

impl MergeOutcome {
  /// Whether the merge changed the catalog.
  pub fn changed(&self) -> bool { !matches!(self, MergeOutcome::Skipped) }
}

impl Catalog {
  /// Creates an empty catalog.
  pub fn new() -> Self { Self::default() }

  /// Applies the merge rule for one incoming entry.
  ///
  /// The entry is stored iff its record ID is absent or its version is strictly greater than the
  /// stored one.
  pub fn merge(&mut self, entry: Entry) -> MergeOutcome {
    match self.entries.get(&entry.id) {
      Some(stored) if entry.version <= stored.version => {
        trace!("Skipping {}v{}, already have v{}", entry.id, entry.version, stored.version);
        MergeOutcome::Skipped
      },
      Some(stored) => {
        let previous = stored.version;
        self.entries.insert(entry.id.clone(), entry);
        MergeOutcome::Replaced { previous }
      },
      None => {
        self.entries.insert(entry.id.clone(), entry);
        MergeOutcome::Inserted
      },
    }
  }

  /// Looks up an entry by record ID.
  pub fn get(&self, id: &str) -> Option<&Entry> { self.entries.get(id) }

  /// Stored version for a record ID.
  pub fn version(&self, id: &str) -> Option<u32> { self.entries.get(id).map(|e| e.version) }

  /// Whether the catalog holds the record.
  pub fn contains(&self, id: &str) -> bool { self.entries.contains_key(id) }

  /// Number of records.
  pub fn len(&self) -> usize { self.entries.len() }

  /// Whether the catalog holds no records.
  pub fn is_empty(&self) -> bool { self.entries.is_empty() }

  /// Iterates over entries in record ID order.
  pub fn entries(&self) -> impl Iterator<Item = &Entry> { self.entries.values() }
}

impl FromIterator<Entry> for Catalog {
  fn from_iter<T: IntoIterator<Item = Entry>>(iter: T) -> Self {
    let mut catalog = Catalog::new();
    for entry in iter {
      catalog.merge(entry);
    }
    catalog
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  fn entry(id: &str, version: u32, title: &str) -> Entry {
    Entry {
      id: id.to_string(),
      version,
      title: title.to_string(),
      updated: Utc::now(),
      published: None,
      authors: Vec::new(),
      links: vec![Link::pdf(format!("http://arxiv.org/pdf/{id}v{version}"))],
      summary: String::new(),
      tags: Vec::new(),
      primary_category: None,
      extra: BTreeMap::new(),
    }
  }

  #[test]
  fn test_merge_inserts_absent_record() {
    let mut catalog = Catalog::new();
    assert_eq!(catalog.merge(entry("1000", 1, "first")), MergeOutcome::Inserted);
    assert_eq!(catalog.len(), 1);
    assert_eq!(catalog.version("1000"), Some(1));
  }

  #[test]
  fn test_merge_replaces_newer_version() {
    let mut catalog = Catalog::new();
    catalog.merge(entry("1000", 1, "first"));
    assert_eq!(catalog.merge(entry("1000", 3, "third")), MergeOutcome::Replaced { previous: 1 });
    assert_eq!(catalog.len(), 1);
    assert_eq!(catalog.get("1000").unwrap().title, "third");
  }

  #[test]
  fn test_merge_skips_equal_and_stale_versions() {
    let mut catalog = Catalog::new();
    catalog.merge(entry("1000", 2, "second"));

    assert_eq!(catalog.merge(entry("1000", 2, "second again")), MergeOutcome::Skipped);
    assert_eq!(catalog.merge(entry("1000", 1, "first")), MergeOutcome::Skipped);
    assert_eq!(catalog.get("1000").unwrap().title, "second");
    assert!(!MergeOutcome::Skipped.changed());
  }

  #[test]
  fn test_stored_version_is_maximum_observed() {
    let versions = [3, 1, 4, 1, 5, 2, 5, 3];
    let catalog: Catalog = versions.iter().map(|v| entry("1000", *v, "x")).collect();
    assert_eq!(catalog.version("1000"), Some(5));
  }

  #[test]
  fn test_catalog_serializes_as_plain_map() {
    let catalog: Catalog = vec![entry("1000", 1, "a"), entry("2000", 2, "b")].into_iter().collect();
    let json = serde_json::to_value(&catalog).unwrap();
    assert!(json.get("1000").is_some());
    assert_eq!(json["2000"]["version"], 2);

    let back: Catalog = serde_json::from_value(json).unwrap();
    assert_eq!(back, catalog);
  }
}
