//! Fetch orchestration: cache-first resolution with retries and fallback.

use std::sync::Arc;
use std::time::Duration;
use tokio::time::{sleep, timeout};
use tracing::{debug, info, warn};

use super::fallback::{ChainLink, FallbackChain};
use super::key::CacheKey;
use super::source::{FetchRequest, RawPage, SourceError};
use super::status::{ActivityGuard, StatusHandle};
use super::store::{CacheEntry, CacheStore, PutOutcome, WriteOrigin};
use super::traits::{Record, SourceKind};

/// Terminal failure of a resolution.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum FetchError {
  /// Every source in the chain failed
  #[error("all data sources failed (last: {last}): {message}")]
  Exhausted { last: SourceKind, message: String },
  /// The chain has no sources configured
  #[error("no data sources configured")]
  NoSources,
}

/// Why a single source was abandoned.
enum LinkFailure {
  TimedOut(Duration),
  Failed(SourceError),
}

impl LinkFailure {
  fn message(&self) -> String {
    match self {
      LinkFailure::TimedOut(limit) => format!("timed out after {}s", limit.as_secs()),
      LinkFailure::Failed(err) => err.to_string(),
    }
  }
}

/// Resolves pages from the cache or, when stale, from the fallback chain.
///
/// Cancelling a resolution is done by dropping its future; nothing is written
/// to the store in that case.
pub struct FetchOrchestrator<R: Record> {
  store: Arc<CacheStore<R>>,
  chain: FallbackChain<R>,
  ttl: Duration,
  status: StatusHandle,
}

impl<R: Record> FetchOrchestrator<R> {
  pub fn new(
    store: Arc<CacheStore<R>>,
    chain: FallbackChain<R>,
    ttl: Duration,
    status: StatusHandle,
  ) -> Self {
    Self {
      store,
      chain,
      ttl,
      status,
    }
  }

  pub fn key_for(&self, request: &FetchRequest) -> CacheKey {
    CacheKey::new(R::COLLECTION, request)
  }

  pub fn store(&self) -> &Arc<CacheStore<R>> {
    &self.store
  }

  /// Return the cached entry for `request` if it is still fresh.
  pub fn cached(&self, request: &FetchRequest) -> Option<Arc<CacheEntry<R>>> {
    let key = self.key_for(request);
    self
      .store
      .get(&key)
      .filter(|entry| self.store.is_fresh(entry, self.ttl))
  }

  /// Resolve a page.
  ///
  /// 1. Unless forced, a fresh cache entry is returned with no network call
  /// 2. Otherwise each source is tried in priority order
  /// 3. Transient failures retry the same source per its policy
  /// 4. Timeouts and structural failures move to the next source
  /// 5. The first success is written to the store and returned
  pub async fn resolve(
    &self,
    request: &FetchRequest,
    force_refresh: bool,
  ) -> Result<Arc<CacheEntry<R>>, FetchError> {
    let key = self.key_for(request);

    if !force_refresh {
      if let Some(entry) = self.cached(request) {
        debug!(key = %key, age_ms = entry.age().as_millis() as u64, "cache hit");
        return Ok(entry);
      }
    }

    let _syncing = ActivityGuard::syncing(&self.status);
    let generation = self.store.begin_request();
    let mut last_failure: Option<(SourceKind, String)> = None;

    for link in self.chain.links() {
      match self.try_link(link, request).await {
        Ok(page) => {
          let entry = CacheEntry::from_page(key.clone(), page, link.kind, generation);
          let fetched_at_wall = entry.fetched_at_wall;
          info!(
            key = %key,
            hash = %key.cache_hash(),
            source = %link.kind,
            total = entry.total,
            "resolved page"
          );

          // A newer write may have landed while we were waiting; the store
          // hands back whichever entry it kept.
          let (outcome, stored) = self.store.put(entry, WriteOrigin::Resolve);
          if outcome == PutOutcome::Superseded {
            debug!(key = %key, "serving newer entry written during resolution");
          }
          self.status.record_success(fetched_at_wall);
          return Ok(stored);
        }
        Err(failure) => {
          let message = failure.message();
          warn!(
            key = %key,
            source = %link.kind,
            name = link.source.name(),
            error = %message,
            "data source failed, advancing chain"
          );
          last_failure = Some((link.kind, message));
        }
      }
    }

    let err = match last_failure {
      Some((last, message)) => FetchError::Exhausted { last, message },
      None => FetchError::NoSources,
    };
    self.status.record_error(err.to_string());
    Err(err)
  }

  /// Run one source to completion under its retry policy.
  async fn try_link(
    &self,
    link: &ChainLink<R>,
    request: &FetchRequest,
  ) -> Result<RawPage<R>, LinkFailure> {
    let mut retry_no = 0;
    loop {
      let failure = match timeout(link.policy.timeout, link.source.fetch(request)).await {
        Ok(Ok(page)) => return Ok(page),
        // Hard timeout: no retry on the same source
        Err(_) => return Err(LinkFailure::TimedOut(link.policy.timeout)),
        Ok(Err(err)) if !err.is_transient() => return Err(LinkFailure::Failed(err)),
        Ok(Err(err)) => err,
      };

      retry_no += 1;
      let Some(delay) = link.policy.retry_delay(retry_no) else {
        return Err(LinkFailure::Failed(failure));
      };
      debug!(
        source = %link.kind,
        retry = retry_no,
        delay_ms = delay.as_millis() as u64,
        error = %failure,
        "retrying data source"
      );
      sleep(delay).await;
    }
  }
}
