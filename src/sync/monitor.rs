//! Background freshness monitor.
//!
//! Periodically asks the primary source for a count-only summary and, when it
//! disagrees with the cached total for the page on screen, swaps in a fresh
//! copy of that page. Best effort: failures are logged and the next tick tries
//! again. Each tick makes at most two calls and never retries.

use std::sync::Arc;
use std::time::Duration;
use tokio::task::JoinHandle;
use tokio::time::{interval_at, timeout, Instant, MissedTickBehavior};
use tracing::{debug, info, warn};

use super::fallback::ChainLink;
use super::key::CacheKey;
use super::pagination::Window;
use super::source::{FetchRequest, RawPage, SourceError};
use super::status::{ActivityGuard, StatusHandle};
use super::store::{CacheEntry, CacheStore, PutOutcome, WriteOrigin};
use super::traits::Record;

/// A detected upstream change that has been applied to the cache.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MonitorChange {
  pub key: CacheKey,
  pub previous_total: u64,
  pub total: u64,
}

struct Probe<R: Record> {
  store: Arc<CacheStore<R>>,
  primary: Option<ChainLink<R>>,
  status: StatusHandle,
  probe_limit: u64,
}

impl<R: Record> Probe<R> {
  async fn call(&self, link: &ChainLink<R>, request: &FetchRequest) -> Result<RawPage<R>, SourceError> {
    match timeout(link.policy.timeout, link.source.fetch(request)).await {
      Ok(result) => result,
      Err(_) => Err(SourceError::Transient(format!(
        "probe timed out after {}s",
        link.policy.timeout.as_secs()
      ))),
    }
  }

  async fn check_once(&self) -> Result<Option<MonitorChange>, SourceError> {
    let Some(primary) = &self.primary else {
      return Ok(None);
    };
    let Some(key) = self.store.last_displayed() else {
      return Ok(None);
    };
    let Some(cached) = self.store.get(&key) else {
      return Ok(None);
    };

    let _polling = ActivityGuard::polling(&self.status);
    let generation = self.store.begin_request();

    let probe = FetchRequest::new(Window::new(0, self.probe_limit), key.filters.clone());
    let summary = self.call(primary, &probe).await?;
    if summary.total == cached.total {
      debug!(key = %key, total = cached.total, "cache matches upstream");
      return Ok(None);
    }

    let window_request = key.request();
    let page = if probe == window_request {
      summary
    } else {
      self.call(primary, &window_request).await?
    };

    let entry = CacheEntry::from_page(key.clone(), page, primary.kind, generation);
    let total = entry.total;
    match self.store.put(entry, WriteOrigin::Monitor) {
      (PutOutcome::Applied, _) if total != cached.total => Ok(Some(MonitorChange {
        key,
        previous_total: cached.total,
        total,
      })),
      // Either the page already settled back, or a user fetch beat us to it
      _ => Ok(None),
    }
  }
}

/// Passive poller, independent of user navigation.
///
/// Stops when dropped.
pub struct FreshnessMonitor<R: Record> {
  probe: Arc<Probe<R>>,
  interval: Duration,
  task: Option<JoinHandle<()>>,
}

impl<R: Record> FreshnessMonitor<R> {
  pub fn new(
    store: Arc<CacheStore<R>>,
    primary: Option<ChainLink<R>>,
    status: StatusHandle,
    interval: Duration,
    probe_limit: u64,
  ) -> Self {
    Self {
      probe: Arc::new(Probe {
        store,
        primary,
        status,
        probe_limit: probe_limit.max(1),
      }),
      interval,
      task: None,
    }
  }

  /// Start polling. `on_change` runs once per applied change.
  ///
  /// Restarts the poller if it was already running. Must be called from
  /// within a Tokio runtime.
  pub fn start<F>(&mut self, on_change: F)
  where
    F: Fn(MonitorChange) + Send + Sync + 'static,
  {
    self.stop();
    if self.interval.is_zero() {
      return;
    }

    let probe = Arc::clone(&self.probe);
    let period = self.interval;
    self.task = Some(tokio::spawn(async move {
      // First check one period from now; the page was just resolved
      let mut ticker = interval_at(Instant::now() + period, period);
      ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);
      loop {
        ticker.tick().await;
        match probe.check_once().await {
          Ok(Some(change)) => {
            info!(
              key = %change.key,
              previous = change.previous_total,
              total = change.total,
              "upstream change absorbed"
            );
            on_change(change);
          }
          Ok(None) => {}
          Err(err) => warn!(error = %err, "freshness check failed"),
        }
      }
    }));
  }

  pub fn stop(&mut self) {
    if let Some(task) = self.task.take() {
      task.abort();
    }
  }

  pub fn is_running(&self) -> bool {
    self.task.as_ref().is_some_and(|t| !t.is_finished())
  }

  /// Run a single check outside the polling loop.
  pub async fn check_once(&self) -> Result<Option<MonitorChange>, SourceError> {
    self.probe.check_once().await
  }
}

impl<R: Record> Drop for FreshnessMonitor<R> {
  fn drop(&mut self) {
    self.stop();
  }
}
