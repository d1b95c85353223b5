//! Pagination window and filter state for a list page.

use std::fmt;

/// The slice of a collection a request asks for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Window {
  pub offset: u64,
  pub limit: u64,
}

impl Window {
  pub fn new(offset: u64, limit: u64) -> Self {
    Self {
      offset,
      limit: limit.max(1),
    }
  }

  /// 1-based page number for page/limit style APIs
  pub fn page(&self) -> u64 {
    self.offset / self.limit + 1
  }
}

/// Server-side request filters.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FilterField {
  Status,
  Priority,
  ClientId,
  ServerId,
}

impl FilterField {
  /// Query parameter name sent to the upstream
  pub fn param(self) -> &'static str {
    match self {
      FilterField::Status => "status",
      FilterField::Priority => "priority",
      FilterField::ClientId => "client_id",
      FilterField::ServerId => "server_id",
    }
  }
}

/// Active filter values. Empty strings are never stored.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash)]
pub struct Filters {
  pub status: Option<String>,
  pub priority: Option<String>,
  pub client_id: Option<String>,
  pub server_id: Option<String>,
}

impl Filters {
  pub fn get(&self, field: FilterField) -> Option<&str> {
    match field {
      FilterField::Status => self.status.as_deref(),
      FilterField::Priority => self.priority.as_deref(),
      FilterField::ClientId => self.client_id.as_deref(),
      FilterField::ServerId => self.server_id.as_deref(),
    }
  }

  fn slot(&mut self, field: FilterField) -> &mut Option<String> {
    match field {
      FilterField::Status => &mut self.status,
      FilterField::Priority => &mut self.priority,
      FilterField::ClientId => &mut self.client_id,
      FilterField::ServerId => &mut self.server_id,
    }
  }

  /// Set or clear a filter. Returns true if the value changed.
  pub fn set(&mut self, field: FilterField, value: Option<String>) -> bool {
    let value = value
      .map(|v| v.trim().to_string())
      .filter(|v| !v.is_empty());
    let slot = self.slot(field);
    if *slot == value {
      return false;
    }
    *slot = value;
    true
  }

  /// Active filters in a fixed order
  pub fn active(&self) -> Vec<(FilterField, &str)> {
    [
      FilterField::Status,
      FilterField::Priority,
      FilterField::ClientId,
      FilterField::ServerId,
    ]
    .into_iter()
    .filter_map(|f| self.get(f).map(|v| (f, v)))
    .collect()
  }

  /// Active filters as (param, value) pairs, for query strings
  pub fn pairs(&self) -> Vec<(&'static str, &str)> {
    self
      .active()
      .into_iter()
      .map(|(f, v)| (f.param(), v))
      .collect()
  }

  pub fn is_empty(&self) -> bool {
    self.pairs().is_empty()
  }
}

impl fmt::Display for Filters {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    let parts: Vec<String> = self
      .pairs()
      .into_iter()
      .map(|(k, v)| format!("{}={}", k, v))
      .collect();
    f.write_str(&parts.join(","))
  }
}

/// Current pagination window plus the total reported by the last resolution.
///
/// Only explicit navigation mutates the window. The total is updated from
/// resolved data by the owning controller.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PaginationState {
  offset: u64,
  limit: u64,
  total: u64,
  filters: Filters,
}

impl PaginationState {
  pub fn new(limit: u64) -> Self {
    Self {
      offset: 0,
      limit: limit.max(1),
      total: 0,
      filters: Filters::default(),
    }
  }

  pub fn window(&self) -> Window {
    Window::new(self.offset, self.limit)
  }

  pub fn filters(&self) -> &Filters {
    &self.filters
  }

  pub fn offset(&self) -> u64 {
    self.offset
  }

  pub fn limit(&self) -> u64 {
    self.limit
  }

  pub fn total(&self) -> u64 {
    self.total
  }

  pub fn page(&self) -> u64 {
    self.offset / self.limit + 1
  }

  pub fn total_pages(&self) -> u64 {
    self.total.div_ceil(self.limit)
  }

  pub fn has_next(&self) -> bool {
    self.page() < self.total_pages()
  }

  pub fn has_prev(&self) -> bool {
    self.page() > 1
  }

  /// Record the total from a resolved page.
  pub fn set_total(&mut self, total: u64) {
    self.total = total;
  }

  // Transitions below return true when the window or filters changed,
  // meaning the caller must resolve a (possibly new) key.

  pub fn next_page(&mut self) -> bool {
    if !self.has_next() {
      return false;
    }
    self.offset += self.limit;
    true
  }

  pub fn prev_page(&mut self) -> bool {
    if !self.has_prev() {
      return false;
    }
    self.offset = self.offset.saturating_sub(self.limit);
    true
  }

  pub fn first_page(&mut self) -> bool {
    if self.offset == 0 {
      return false;
    }
    self.offset = 0;
    true
  }

  pub fn last_page(&mut self) -> bool {
    let pages = self.total_pages();
    if pages == 0 {
      return false;
    }
    let last = (pages - 1) * self.limit;
    if last == self.offset {
      return false;
    }
    self.offset = last;
    true
  }

  pub fn set_limit(&mut self, limit: u64) -> bool {
    let limit = limit.max(1);
    if limit == self.limit {
      return false;
    }
    self.limit = limit;
    self.offset = 0;
    true
  }

  pub fn set_filter(&mut self, field: FilterField, value: Option<String>) -> bool {
    if !self.filters.set(field, value) {
      return false;
    }
    self.offset = 0;
    true
  }

  pub fn clear_filters(&mut self) -> bool {
    if self.filters.is_empty() {
      return false;
    }
    self.filters = Filters::default();
    self.offset = 0;
    true
  }
}
