//! Data source adapter contract used by the fallback chain.

use futures::future::BoxFuture;

use super::pagination::{Filters, Window};
use super::traits::Record;

/// Parameters sent to a data source.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FetchRequest {
  pub window: Window,
  pub filters: Filters,
}

impl FetchRequest {
  pub fn new(window: Window, filters: Filters) -> Self {
    Self { window, filters }
  }
}

/// A structurally valid page returned by a source.
#[derive(Debug, Clone)]
pub struct RawPage<R> {
  pub records: Vec<R>,
  pub total: u64,
  /// Source flagged the data as mock/sample
  pub mock: bool,
  pub response_time_ms: Option<u64>,
}

/// Failure reported by a single source call.
///
/// The variant decides what the orchestrator does next: transient errors are
/// retried on the same source, the others advance the chain immediately.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum SourceError {
  /// Connection failure or unparsable body
  #[error("transient failure: {0}")]
  Transient(String),
  /// HTTP error with a parseable body, or a response missing required fields
  #[error("invalid response: {0}")]
  Structural(String),
  /// Source explicitly reported it has nothing to serve
  #[error("no data: {0}")]
  NoData(String),
}

impl SourceError {
  pub fn is_transient(&self) -> bool {
    matches!(self, SourceError::Transient(_))
  }

  pub fn message(&self) -> &str {
    match self {
      SourceError::Transient(m) | SourceError::Structural(m) | SourceError::NoData(m) => m,
    }
  }
}

/// A data source adapter.
///
/// Adapters are stateless apart from the network call itself. Timeouts are
/// enforced by the caller, so implementations should not add their own.
pub trait DataSource<R: Record>: Send + Sync {
  /// Short name for logs (e.g. a host name)
  fn name(&self) -> &str;

  fn fetch<'a>(&'a self, request: &'a FetchRequest) -> BoxFuture<'a, Result<RawPage<R>, SourceError>>;
}
