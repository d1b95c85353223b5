//! Per-page controller: the one piece a list view talks to.
//!
//! Loads run as spawned tasks and are collected with [`SyncController::poll`]
//! from the UI tick, the same way a query result is picked up without ever
//! blocking the draw loop.

use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{mpsc, oneshot};
use tokio::task::JoinHandle;
use tracing::debug;

use super::fallback::FallbackChain;
use super::monitor::{FreshnessMonitor, MonitorChange};
use super::orchestrator::{FetchError, FetchOrchestrator};
use super::pagination::{FilterField, PaginationState};
use super::source::FetchRequest;
use super::status::{StatusHandle, SyncStatus};
use super::store::{CacheEntry, CacheStore};
use super::traits::Record;

/// Tunables shared by every list page.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SyncSettings {
  pub ttl: Duration,
  /// Zero disables the freshness monitor
  pub poll_interval: Duration,
  pub page_size: u64,
  /// Window size of the monitor's count probe
  pub probe_limit: u64,
}

impl Default for SyncSettings {
  fn default() -> Self {
    Self {
      ttl: Duration::from_secs(300),
      poll_interval: Duration::from_secs(60),
      page_size: 50,
      probe_limit: 1,
    }
  }
}

/// What the page currently shows.
#[derive(Debug, Clone)]
pub enum LoadState<R> {
  Idle,
  Loading,
  Ready(Arc<CacheEntry<R>>),
  Failed(String),
}

impl<R> LoadState<R> {
  pub fn is_loading(&self) -> bool {
    matches!(self, LoadState::Loading)
  }

  pub fn error(&self) -> Option<&str> {
    match self {
      LoadState::Failed(message) => Some(message),
      _ => None,
    }
  }
}

type LoadResult<R> = Result<Arc<CacheEntry<R>>, FetchError>;

struct PendingLoad<R> {
  task: JoinHandle<()>,
  rx: oneshot::Receiver<LoadResult<R>>,
}

pub struct SyncController<R: Record> {
  pagination: PaginationState,
  store: Arc<CacheStore<R>>,
  orchestrator: Arc<FetchOrchestrator<R>>,
  monitor: FreshnessMonitor<R>,
  status: StatusHandle,
  state: LoadState<R>,
  /// Last entry shown, kept on screen while a new load is in flight
  current: Option<Arc<CacheEntry<R>>>,
  pending: Option<PendingLoad<R>>,
  changes_tx: mpsc::UnboundedSender<MonitorChange>,
  changes_rx: mpsc::UnboundedReceiver<MonitorChange>,
  notice: Option<MonitorChange>,
}

impl<R: Record> SyncController<R> {
  pub fn new(chain: FallbackChain<R>, settings: SyncSettings) -> Self {
    let store = Arc::new(CacheStore::new());
    let status = StatusHandle::new();
    let monitor = FreshnessMonitor::new(
      Arc::clone(&store),
      chain.primary().cloned(),
      status.clone(),
      settings.poll_interval,
      settings.probe_limit,
    );
    let orchestrator = Arc::new(FetchOrchestrator::new(
      Arc::clone(&store),
      chain,
      settings.ttl,
      status.clone(),
    ));
    let (changes_tx, changes_rx) = mpsc::unbounded_channel();

    Self {
      pagination: PaginationState::new(settings.page_size),
      store,
      orchestrator,
      monitor,
      status,
      state: LoadState::Idle,
      current: None,
      pending: None,
      changes_tx,
      changes_rx,
      notice: None,
    }
  }

  /// Start background monitoring and load the first page.
  pub fn start(&mut self) {
    let tx = self.changes_tx.clone();
    self.monitor.start(move |change| {
      let _ = tx.send(change);
    });
    self.load(false);
  }

  pub fn pagination(&self) -> &PaginationState {
    &self.pagination
  }

  pub fn state(&self) -> &LoadState<R> {
    &self.state
  }

  pub fn entry(&self) -> Option<&Arc<CacheEntry<R>>> {
    self.current.as_ref()
  }

  pub fn records(&self) -> &[R] {
    self.current.as_ref().map(|e| e.records.as_slice()).unwrap_or(&[])
  }

  pub fn store(&self) -> &Arc<CacheStore<R>> {
    &self.store
  }

  pub fn sync_status(&self) -> SyncStatus {
    self.status.current()
  }

  fn request(&self) -> FetchRequest {
    FetchRequest::new(self.pagination.window(), self.pagination.filters().clone())
  }

  /// Resolve the current window.
  ///
  /// A fresh cache hit is applied immediately. Otherwise any in-flight load
  /// is cancelled and a new one is spawned; pick it up with `poll`.
  pub fn load(&mut self, force_refresh: bool) {
    self.cancel_pending();
    let request = self.request();

    if !force_refresh {
      if let Some(entry) = self.orchestrator.cached(&request) {
        self.apply(entry);
        return;
      }
    }

    let (tx, rx) = oneshot::channel();
    let orchestrator = Arc::clone(&self.orchestrator);
    let task = tokio::spawn(async move {
      let result = orchestrator.resolve(&request, force_refresh).await;
      let _ = tx.send(result);
    });
    self.pending = Some(PendingLoad { task, rx });
    self.state = LoadState::Loading;
  }

  /// Manual retry, bypassing the cache.
  pub fn refresh(&mut self) {
    self.load(true);
  }

  fn cancel_pending(&mut self) {
    if let Some(pending) = self.pending.take() {
      debug!("cancelling in-flight load");
      pending.task.abort();
    }
  }

  fn apply(&mut self, entry: Arc<CacheEntry<R>>) {
    self.pagination.set_total(entry.total);
    self.store.mark_displayed(&entry.key);
    self.current = Some(Arc::clone(&entry));
    self.state = LoadState::Ready(entry);
  }

  /// Collect a finished load and any monitor changes.
  ///
  /// Returns true if anything visible changed. Call on every tick.
  pub fn poll(&mut self) -> bool {
    let mut changed = false;

    if let Some(pending) = &mut self.pending {
      match pending.rx.try_recv() {
        Ok(Ok(entry)) => {
          self.pending = None;
          self.apply(entry);
          changed = true;
        }
        Ok(Err(err)) => {
          self.pending = None;
          self.state = LoadState::Failed(err.to_string());
          changed = true;
        }
        Err(oneshot::error::TryRecvError::Empty) => {}
        Err(oneshot::error::TryRecvError::Closed) => {
          // Task went away without answering; nothing to show for it
          self.pending = None;
          self.state = match &self.current {
            Some(entry) => LoadState::Ready(Arc::clone(entry)),
            None => LoadState::Idle,
          };
          changed = true;
        }
      }
    }

    while let Ok(change) = self.changes_rx.try_recv() {
      changed |= self.absorb(change);
    }

    changed
  }

  fn absorb(&mut self, change: MonitorChange) -> bool {
    let on_screen = self.current.as_ref().is_some_and(|e| e.key == change.key);
    if !on_screen || self.pending.is_some() {
      return false;
    }
    let Some(entry) = self.store.get(&change.key) else {
      return false;
    };
    self.apply(entry);
    self.notice = Some(change);
    true
  }

  /// Whether the background poller is alive.
  pub fn is_monitoring(&self) -> bool {
    self.monitor.is_running()
  }

  /// The latest silently applied upstream change, if not yet shown.
  pub fn take_update_notice(&mut self) -> Option<MonitorChange> {
    self.notice.take()
  }

  pub fn next_page(&mut self) -> bool {
    self.navigate(PaginationState::next_page)
  }

  pub fn prev_page(&mut self) -> bool {
    self.navigate(PaginationState::prev_page)
  }

  pub fn first_page(&mut self) -> bool {
    self.navigate(PaginationState::first_page)
  }

  pub fn last_page(&mut self) -> bool {
    self.navigate(PaginationState::last_page)
  }

  pub fn set_limit(&mut self, limit: u64) -> bool {
    self.navigate(|p| p.set_limit(limit))
  }

  pub fn set_filter(&mut self, field: FilterField, value: Option<String>) -> bool {
    self.navigate(|p| p.set_filter(field, value))
  }

  pub fn clear_filters(&mut self) -> bool {
    self.navigate(PaginationState::clear_filters)
  }

  fn navigate(&mut self, transition: impl FnOnce(&mut PaginationState) -> bool) -> bool {
    if !transition(&mut self.pagination) {
      return false;
    }
    self.load(false);
    true
  }

  /// Drop every cached page and reload the current one.
  pub fn clear_cache(&mut self) {
    self.cancel_pending();
    self.store.clear();
    self.load(false);
  }
}

impl<R: Record> Drop for SyncController<R> {
  fn drop(&mut self) {
    self.cancel_pending();
  }
}
