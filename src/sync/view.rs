//! Client-side search and sort over the cached record set.
//!
//! Everything here is pure and synchronous; it never touches the network or
//! the cache.

use chrono::{DateTime, NaiveDate, NaiveDateTime, Utc};
use std::cmp::Ordering;
use unicode_normalization::char::is_combining_mark;
use unicode_normalization::UnicodeNormalization;

use super::traits::{Record, SortField, SortKey};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SortDirection {
  #[default]
  Ascending,
  Descending,
}

impl SortDirection {
  pub fn flipped(self) -> Self {
    match self {
      SortDirection::Ascending => SortDirection::Descending,
      SortDirection::Descending => SortDirection::Ascending,
    }
  }

  pub fn arrow(self) -> &'static str {
    match self {
      SortDirection::Ascending => "▲",
      SortDirection::Descending => "▼",
    }
  }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SortSpec<F> {
  pub field: F,
  pub direction: SortDirection,
}

impl<F: SortField> SortSpec<F> {
  pub fn ascending(field: F) -> Self {
    Self {
      field,
      direction: SortDirection::Ascending,
    }
  }

  /// Selecting the current field flips direction; a new field starts ascending.
  pub fn toggle(previous: Option<Self>, field: F) -> Self {
    match previous {
      Some(spec) if spec.field == field => Self {
        field,
        direction: spec.direction.flipped(),
      },
      _ => Self::ascending(field),
    }
  }
}

/// Derive the displayed list from cached records.
///
/// Search is a case-insensitive substring match over each record's search
/// fields; an empty term keeps everything. Sorting is total (ties fall back to
/// the record id), so applying the same view twice gives the same result.
pub fn view<R: Record>(records: &[R], search: &str, sort: Option<SortSpec<R::Field>>) -> Vec<R> {
  let needle = search.trim().to_lowercase();

  let mut matched: Vec<R> = records
    .iter()
    .filter(|record| matches_search(*record, &needle))
    .cloned()
    .collect();

  if let Some(spec) = sort {
    matched.sort_by(|a, b| {
      let ordering = compare_records(a, b, spec.field);
      match spec.direction {
        SortDirection::Ascending => ordering,
        SortDirection::Descending => ordering.reverse(),
      }
    });
  }

  matched
}

fn matches_search<R: Record>(record: &R, needle: &str) -> bool {
  if needle.is_empty() {
    return true;
  }
  record
    .search_fields()
    .iter()
    .any(|field| field.to_lowercase().contains(needle))
}

fn compare_records<R: Record>(a: &R, b: &R, field: R::Field) -> Ordering {
  compare_keys(&a.sort_key(field), &b.sort_key(field))
    .then_with(|| compare_text(a.record_id(), b.record_id()))
}

/// Order two sort keys. Missing or unparsable values sort first.
pub fn compare_keys(a: &SortKey, b: &SortKey) -> Ordering {
  match (a, b) {
    (SortKey::Text(a), SortKey::Text(b)) => compare_text(a, b),
    (SortKey::Date(a), SortKey::Date(b)) => a.cmp(b),
    (SortKey::Number(a), SortKey::Number(b)) => match (a, b) {
      (Some(a), Some(b)) => a.total_cmp(b),
      (None, None) => Ordering::Equal,
      (None, Some(_)) => Ordering::Less,
      (Some(_), None) => Ordering::Greater,
    },
    // Mixed kinds never come from one field; keep the order stable anyway
    _ => rank(a).cmp(&rank(b)),
  }
}

fn rank(key: &SortKey) -> u8 {
  match key {
    SortKey::Text(_) => 0,
    SortKey::Date(_) => 1,
    SortKey::Number(_) => 2,
  }
}

/// Collation-style text ordering: case and accents are ignored first, then
/// the raw strings break ties.
pub fn compare_text(a: &str, b: &str) -> Ordering {
  fold(a)
    .cmp(&fold(b))
    .then_with(|| a.cmp(b))
}

fn fold(s: &str) -> String {
  s.trim()
    .nfd()
    .filter(|c| !is_combining_mark(*c))
    .flat_map(char::to_lowercase)
    .collect()
}

/// Parse the date formats seen from the upstream.
///
/// Returns None for empty or unrecognized input.
pub fn parse_timestamp(s: &str) -> Option<DateTime<Utc>> {
  let s = s.trim();
  if s.is_empty() {
    return None;
  }

  if let Ok(dt) = DateTime::parse_from_rfc3339(s) {
    return Some(dt.with_timezone(&Utc));
  }

  for format in ["%Y-%m-%dT%H:%M:%S%.f", "%Y-%m-%d %H:%M:%S%.f", "%Y-%m-%d %H:%M"] {
    if let Ok(dt) = NaiveDateTime::parse_from_str(s, format) {
      return Some(dt.and_utc());
    }
  }

  for format in ["%Y-%m-%d", "%m/%d/%Y", "%Y/%m/%d"] {
    if let Ok(date) = NaiveDate::parse_from_str(s, format) {
      return date.and_hms_opt(0, 0, 0).map(|dt| dt.and_utc());
    }
  }

  None
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::sync::testing::{TestField, TestRecord};

  fn records() -> Vec<TestRecord> {
    vec![
      TestRecord::new("1", "John Smith", "served").created("2024-03-01"),
      TestRecord::new("2", "Ana Lopez", "pending").created("not a date"),
      TestRecord::new("3", "SMITHERS LLC", "attempted").created("2024-01-15T10:00:00Z"),
      TestRecord::new("4", "Bob Jones", "Pending").created("02/10/2024"),
      TestRecord::new("5", "Émile Zola", "served").amount(1250.0),
    ]
  }

  fn ids(records: &[TestRecord]) -> Vec<&str> {
    records.iter().map(|r| r.id.as_str()).collect()
  }

  #[test]
  fn test_search_is_case_insensitive_substring() {
    let result = view(&records(), "smith", None);
    assert_eq!(ids(&result), vec!["1", "3"]);
  }

  #[test]
  fn test_empty_search_keeps_all() {
    let result = view(&records(), "  ", None);
    assert_eq!(result.len(), 5);
  }

  #[test]
  fn test_search_matches_coerced_numbers() {
    let result = view(&records(), "1250", None);
    assert_eq!(ids(&result), vec!["5"]);
  }

  #[test]
  fn test_empty_search_still_sorts() {
    let result = view(&records(), "", Some(SortSpec::ascending(TestField::Name)));
    assert_eq!(ids(&result), vec!["2", "4", "5", "1", "3"]);
  }

  #[test]
  fn test_toggle_same_field_reverses() {
    let first = SortSpec::toggle(None, TestField::Status);
    assert_eq!(first.direction, SortDirection::Ascending);
    let ascending = view(&records(), "", Some(first));

    let second = SortSpec::toggle(Some(first), TestField::Status);
    assert_eq!(second.direction, SortDirection::Descending);
    let descending = view(&records(), "", Some(second));

    let mut reversed = ascending.clone();
    reversed.reverse();
    assert_eq!(descending, reversed);
  }

  #[test]
  fn test_new_field_resets_to_ascending() {
    let spec = SortSpec {
      field: TestField::Status,
      direction: SortDirection::Descending,
    };
    let next = SortSpec::toggle(Some(spec), TestField::Name);
    assert_eq!(next, SortSpec::ascending(TestField::Name));
  }

  #[test]
  fn test_unparsable_dates_sort_first() {
    let result = view(&records(), "", Some(SortSpec::ascending(TestField::Created)));
    // 2 (bad date) and 5 (no date) both sort earliest, tie broken by id
    assert_eq!(ids(&result), vec!["2", "5", "3", "4", "1"]);
  }

  #[test]
  fn test_case_differences_sort_together() {
    let result = view(&records(), "", Some(SortSpec::ascending(TestField::Status)));
    assert_eq!(ids(&result), vec!["3", "4", "2", "1", "5"]);
  }

  #[test]
  fn test_view_is_idempotent() {
    let spec = Some(SortSpec {
      field: TestField::Created,
      direction: SortDirection::Descending,
    });
    let once = view(&records(), "e", spec);
    let twice = view(&once, "e", spec);
    assert_eq!(once, twice);
  }

  #[test]
  fn test_parse_timestamp_formats() {
    assert!(parse_timestamp("2024-03-01T09:30:00+02:00").is_some());
    assert!(parse_timestamp("2024-03-01 09:30:00").is_some());
    assert!(parse_timestamp("2024-03-01").is_some());
    assert!(parse_timestamp("03/01/2024").is_some());
    assert_eq!(
      parse_timestamp("03/01/2024"),
      parse_timestamp("2024-03-01")
    );
    assert!(parse_timestamp("").is_none());
    assert!(parse_timestamp("soon").is_none());
  }

  #[test]
  fn test_numbers_missing_sort_first() {
    let a = SortKey::Number(None);
    let b = SortKey::Number(Some(-5.0));
    assert_eq!(compare_keys(&a, &b), Ordering::Less);
  }

  #[test]
  fn test_accents_fold() {
    // Folded forms tie, raw text breaks the tie
    assert_eq!(compare_text("Émile", "emile"), Ordering::Greater);
    assert_eq!(compare_text("Émile", "Eric"), Ordering::Less);
  }

  #[test]
  fn test_accents_outside_latin1_fold() {
    assert_eq!(compare_text("Šimon", "Zola"), Ordering::Less);
    assert_eq!(compare_text("Ångström", "Bohr"), Ordering::Less);
    assert_eq!(compare_text("Dvořák", "Dvorak"), Ordering::Greater);
    // Precomposed and decomposed spellings fold to the same key
    assert_eq!(fold("Šimon"), fold("S\u{30c}imon"));
  }
}
