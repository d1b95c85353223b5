//! Core traits and types shared by the synchronization layer.

use chrono::{DateTime, Utc};
use serde::de::DeserializeOwned;
use std::borrow::Cow;
use std::fmt;

use super::pagination::FilterField;

/// Trait for records that can be listed, cached and viewed.
///
/// Implementors describe how they arrive on the wire, which of their fields
/// are searchable, and how they sort.
pub trait Record: Clone + Send + Sync + fmt::Debug + 'static {
  /// Raw wire representation, decoded from one element of the envelope array
  type Wire: DeserializeOwned + Into<Self>;

  /// Sortable fields for this record type
  type Field: SortField;

  /// Envelope key and endpoint path segment (e.g. "jobs")
  const COLLECTION: &'static str;

  /// Stable identifier, used as the final sort tie-breaker
  fn record_id(&self) -> &str;

  /// Searchable field values in a fixed order, already resolved from aliases
  fn search_fields(&self) -> Vec<Cow<'_, str>>;

  /// Value used when sorting by `field`
  fn sort_key(&self, field: Self::Field) -> SortKey;

  /// Value matched against a request filter.
  /// Returns None if the record doesn't carry that attribute.
  fn filter_value(&self, field: FilterField) -> Option<Cow<'_, str>>;
}

/// Trait for the sortable-field enum of a record type.
pub trait SortField: Copy + Eq + fmt::Debug + Send + Sync + 'static {
  /// All fields in display order
  fn all() -> &'static [Self];

  /// Column label
  fn label(self) -> &'static str;
}

/// Comparable value extracted from a record for sorting.
#[derive(Debug, Clone, PartialEq)]
pub enum SortKey {
  Text(String),
  /// None when the source value was missing or unparsable
  Date(Option<DateTime<Utc>>),
  Number(Option<f64>),
}

/// Which adapter in the fallback chain produced a cache entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SourceKind {
  /// Live case-management API
  Primary,
  /// Older API deployment kept as a secondary source
  Legacy,
  /// Static sample data bundled with the binary
  Sample,
}

impl SourceKind {
  pub fn as_str(self) -> &'static str {
    match self {
      SourceKind::Primary => "primary",
      SourceKind::Legacy => "legacy",
      SourceKind::Sample => "sample",
    }
  }
}

impl fmt::Display for SourceKind {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    f.write_str(self.as_str())
  }
}
