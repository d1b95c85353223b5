//! In-memory cache store shared by the orchestrator and the freshness monitor.

use chrono::{DateTime, Utc};
use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;
use tokio::sync::broadcast;
use tokio::time::Instant;
use tracing::debug;

use super::key::CacheKey;
use super::source::RawPage;
use super::traits::{Record, SourceKind};

/// One cached page of records.
#[derive(Debug, Clone)]
pub struct CacheEntry<R> {
  pub key: CacheKey,
  pub records: Vec<R>,
  pub total: u64,
  /// Monotonic fetch time, used for freshness
  pub fetched_at: Instant,
  /// Wall-clock fetch time, for display
  pub fetched_at_wall: DateTime<Utc>,
  pub source: SourceKind,
  /// Request generation that produced this entry
  pub generation: u64,
  pub mock: bool,
  pub response_time_ms: Option<u64>,
}

impl<R> CacheEntry<R> {
  pub fn from_page(key: CacheKey, page: RawPage<R>, source: SourceKind, generation: u64) -> Self {
    Self {
      key,
      records: page.records,
      total: page.total,
      fetched_at: Instant::now(),
      fetched_at_wall: Utc::now(),
      source,
      generation,
      mock: page.mock,
      response_time_ms: page.response_time_ms,
    }
  }

  pub fn age(&self) -> Duration {
    self.fetched_at.elapsed()
  }
}

/// Who wrote an entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WriteOrigin {
  Resolve,
  Monitor,
}

/// Notification sent to store subscribers.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StoreEvent {
  Updated { key: CacheKey, origin: WriteOrigin },
  Cleared,
}

/// Result of a write attempt.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PutOutcome {
  Applied,
  /// A newer entry was already stored; the write was dropped
  Superseded,
}

struct StoreInner<R> {
  entries: HashMap<CacheKey, Arc<CacheEntry<R>>>,
  generation: u64,
  last_displayed: Option<CacheKey>,
}

/// Keyed page cache.
///
/// Holds at most one entry per key and never evicts; entries expire only
/// logically via [`CacheStore::is_fresh`]. Writes are ordered by request
/// generation so a slow response can't replace a newer one.
pub struct CacheStore<R> {
  inner: Mutex<StoreInner<R>>,
  events: broadcast::Sender<StoreEvent>,
}

impl<R: Record> CacheStore<R> {
  pub fn new() -> Self {
    let (events, _) = broadcast::channel(32);
    Self {
      inner: Mutex::new(StoreInner {
        entries: HashMap::new(),
        generation: 0,
        last_displayed: None,
      }),
      events,
    }
  }

  fn lock(&self) -> MutexGuard<'_, StoreInner<R>> {
    // No invariant spans a panic inside the lock, so a poisoned store is usable.
    self.inner.lock().unwrap_or_else(PoisonError::into_inner)
  }

  pub fn get(&self, key: &CacheKey) -> Option<Arc<CacheEntry<R>>> {
    self.lock().entries.get(key).cloned()
  }

  /// Check if an entry is younger than `ttl`.
  pub fn is_fresh(&self, entry: &CacheEntry<R>, ttl: Duration) -> bool {
    entry.age() < ttl
  }

  /// Allocate a generation for a request that is about to start.
  pub fn begin_request(&self) -> u64 {
    let mut inner = self.lock();
    inner.generation += 1;
    inner.generation
  }

  /// Store an entry unless a newer one for the same key is already present.
  ///
  /// Returns the outcome together with the entry the store now holds for the
  /// key, which is the existing one when the write was superseded.
  pub fn put(
    &self,
    entry: CacheEntry<R>,
    origin: WriteOrigin,
  ) -> (PutOutcome, Arc<CacheEntry<R>>) {
    let key = entry.key.clone();
    let stored = {
      let mut inner = self.lock();
      if let Some(existing) = inner.entries.get(&key) {
        if existing.generation > entry.generation || existing.fetched_at > entry.fetched_at {
          debug!(
            key = %key,
            stored = existing.generation,
            incoming = entry.generation,
            "dropping superseded cache write"
          );
          return (PutOutcome::Superseded, Arc::clone(existing));
        }
      }
      let stored = Arc::new(entry);
      inner.entries.insert(key.clone(), Arc::clone(&stored));
      stored
    };
    let _ = self.events.send(StoreEvent::Updated { key, origin });
    (PutOutcome::Applied, stored)
  }

  /// Drop every entry. Generations keep counting so in-flight writes from
  /// before the clear still order correctly against later ones.
  pub fn clear(&self) {
    self.lock().entries.clear();
    let _ = self.events.send(StoreEvent::Cleared);
  }

  /// Remember which key the UI is currently showing.
  pub fn mark_displayed(&self, key: &CacheKey) {
    self.lock().last_displayed = Some(key.clone());
  }

  pub fn last_displayed(&self) -> Option<CacheKey> {
    self.lock().last_displayed.clone()
  }

  pub fn subscribe(&self) -> broadcast::Receiver<StoreEvent> {
    self.events.subscribe()
  }

  pub fn len(&self) -> usize {
    self.lock().entries.len()
  }

  pub fn is_empty(&self) -> bool {
    self.len() == 0
  }
}

impl<R: Record> Default for CacheStore<R> {
  fn default() -> Self {
    Self::new()
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::sync::pagination::{Filters, Window};
  use crate::sync::source::FetchRequest;
  use crate::sync::testing::TestRecord;

  fn key(offset: u64) -> CacheKey {
    CacheKey::new(
      "tests",
      &FetchRequest::new(Window::new(offset, 50), Filters::default()),
    )
  }

  fn entry(offset: u64, total: u64, generation: u64) -> CacheEntry<TestRecord> {
    let page = RawPage {
      records: vec![TestRecord::new("1", "Smith", "open")],
      total,
      mock: false,
      response_time_ms: None,
    };
    CacheEntry::from_page(key(offset), page, SourceKind::Primary, generation)
  }

  #[tokio::test(start_paused = true)]
  async fn test_get_miss_then_hit() {
    let store = CacheStore::new();
    assert!(store.get(&key(0)).is_none());

    let generation = store.begin_request();
    let (outcome, stored) = store.put(entry(0, 120, generation), WriteOrigin::Resolve);
    assert_eq!(outcome, PutOutcome::Applied);

    let cached = store.get(&key(0)).unwrap();
    assert!(Arc::ptr_eq(&cached, &stored));
    assert_eq!(cached.total, 120);
    assert!(store.get(&key(50)).is_none());
  }

  #[tokio::test(start_paused = true)]
  async fn test_freshness_follows_ttl() {
    let store = CacheStore::new();
    let generation = store.begin_request();
    store.put(entry(0, 1, generation), WriteOrigin::Resolve);
    let cached = store.get(&key(0)).unwrap();

    let ttl = Duration::from_secs(300);
    assert!(store.is_fresh(&cached, ttl));
    tokio::time::advance(Duration::from_secs(299)).await;
    assert!(store.is_fresh(&cached, ttl));
    tokio::time::advance(Duration::from_secs(1)).await;
    assert!(!store.is_fresh(&cached, ttl));
  }

  #[tokio::test(start_paused = true)]
  async fn test_older_generation_is_rejected() {
    let store = CacheStore::new();
    let slow = store.begin_request();
    let fast = store.begin_request();

    store.put(entry(0, 121, fast), WriteOrigin::Resolve);
    let (outcome, kept) = store.put(entry(0, 120, slow), WriteOrigin::Resolve);

    assert_eq!(outcome, PutOutcome::Superseded);
    assert_eq!(kept.total, 121);
    assert_eq!(store.get(&key(0)).unwrap().total, 121);
  }

  #[tokio::test(start_paused = true)]
  async fn test_put_overwrites_in_place() {
    let store = CacheStore::new();
    let first = store.begin_request();
    store.put(entry(0, 120, first), WriteOrigin::Resolve);
    tokio::time::advance(Duration::from_secs(5)).await;
    let second = store.begin_request();
    store.put(entry(0, 125, second), WriteOrigin::Resolve);

    assert_eq!(store.len(), 1);
    assert_eq!(store.get(&key(0)).unwrap().total, 125);
  }

  #[tokio::test(start_paused = true)]
  async fn test_subscribers_see_writes_and_clear() {
    let store = CacheStore::new();
    let mut events = store.subscribe();

    let generation = store.begin_request();
    store.put(entry(50, 1, generation), WriteOrigin::Monitor);
    store.clear();

    assert_eq!(
      events.recv().await.unwrap(),
      StoreEvent::Updated {
        key: key(50),
        origin: WriteOrigin::Monitor
      }
    );
    assert_eq!(events.recv().await.unwrap(), StoreEvent::Cleared);
    assert!(store.is_empty());
  }

  #[tokio::test(start_paused = true)]
  async fn test_clear_keeps_generation_counter() {
    let store: CacheStore<TestRecord> = CacheStore::new();
    let before = store.begin_request();
    store.clear();
    assert!(store.begin_request() > before);
  }

  #[test]
  fn test_last_displayed() {
    let store: CacheStore<TestRecord> = CacheStore::new();
    assert!(store.last_displayed().is_none());
    store.mark_displayed(&key(50));
    assert_eq!(store.last_displayed(), Some(key(50)));
  }
}
