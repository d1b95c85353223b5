//! Cache keys derived from request parameters.

use sha2::{Digest, Sha256};
use std::fmt;

use super::pagination::{Filters, Window};
use super::source::FetchRequest;

/// Identifies one cached page.
///
/// Always keyed by `(offset, limit)` plus filters, never by page number, so a
/// limit change can't alias an entry for a different window.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct CacheKey {
  pub collection: &'static str,
  pub offset: u64,
  pub limit: u64,
  pub filters: Filters,
}

impl CacheKey {
  pub fn new(collection: &'static str, request: &FetchRequest) -> Self {
    Self {
      collection,
      offset: request.window.offset,
      limit: request.window.limit,
      filters: request.filters.clone(),
    }
  }

  pub fn window(&self) -> Window {
    Window::new(self.offset, self.limit)
  }

  /// Rebuild the request this key was derived from
  pub fn request(&self) -> FetchRequest {
    FetchRequest {
      window: self.window(),
      filters: self.filters.clone(),
    }
  }

  /// Stable, fixed-length identifier for logs
  pub fn cache_hash(&self) -> String {
    let mut hasher = Sha256::new();
    hasher.update(self.description().as_bytes());
    hex::encode(hasher.finalize())
  }

  pub fn description(&self) -> String {
    if self.filters.is_empty() {
      format!("{}:{}:{}", self.collection, self.offset, self.limit)
    } else {
      format!(
        "{}:{}:{}:{}",
        self.collection, self.offset, self.limit, self.filters
      )
    }
  }
}

impl fmt::Display for CacheKey {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    f.write_str(&self.description())
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::sync::pagination::FilterField;

  fn request(offset: u64, limit: u64) -> FetchRequest {
    FetchRequest::new(Window::new(offset, limit), Filters::default())
  }

  #[test]
  fn test_different_windows_differ() {
    let a = CacheKey::new("jobs", &request(0, 50));
    let b = CacheKey::new("jobs", &request(50, 50));
    let c = CacheKey::new("jobs", &request(0, 25));
    assert_ne!(a, b);
    assert_ne!(a, c);
    assert_ne!(a.cache_hash(), b.cache_hash());
  }

  #[test]
  fn test_page_aliasing_is_impossible() {
    // page 3 at limit 25 and page 2 at limit 50 both start at offset 50
    let a = CacheKey::new("jobs", &request(50, 25));
    let b = CacheKey::new("jobs", &request(50, 50));
    assert_ne!(a, b);
  }

  #[test]
  fn test_filters_are_part_of_key() {
    let mut filters = Filters::default();
    filters.set(FilterField::Status, Some("served".to_string()));
    let plain = CacheKey::new("jobs", &request(0, 50));
    let filtered = CacheKey::new(
      "jobs",
      &FetchRequest::new(Window::new(0, 50), filters),
    );
    assert_ne!(plain, filtered);
    assert_eq!(filtered.description(), "jobs:0:50:status=served");
  }

  #[test]
  fn test_hash_is_stable() {
    let a = CacheKey::new("invoices", &request(0, 50));
    let b = CacheKey::new("invoices", &request(0, 50));
    assert_eq!(a.cache_hash(), b.cache_hash());
    assert_eq!(a.cache_hash().len(), 64);
  }

  #[test]
  fn test_request_round_trip() {
    let req = request(100, 50);
    assert_eq!(CacheKey::new("jobs", &req).request(), req);
  }
}
