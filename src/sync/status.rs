//! Observable sync status, produced by the orchestrator and the monitor.

use chrono::{DateTime, Utc};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use tokio::sync::watch;

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SyncStatus {
  /// A user-driven resolution is hitting the network
  pub is_syncing: bool,
  /// The freshness monitor is mid-tick
  pub is_polling: bool,
  /// Last successful network resolution
  pub last_sync: Option<DateTime<Utc>>,
  /// Message from the last failed resolution, cleared on success
  pub error: Option<String>,
}

/// Write side of the status channel. Cheap to clone.
#[derive(Debug, Clone)]
pub struct StatusHandle {
  tx: watch::Sender<SyncStatus>,
  /// Resolutions currently on the network; `is_syncing` is `in_flight > 0`
  in_flight: Arc<AtomicUsize>,
}

impl StatusHandle {
  pub fn new() -> Self {
    let (tx, _) = watch::channel(SyncStatus::default());
    Self {
      tx,
      in_flight: Arc::new(AtomicUsize::new(0)),
    }
  }

  pub fn subscribe(&self) -> watch::Receiver<SyncStatus> {
    self.tx.subscribe()
  }

  pub fn current(&self) -> SyncStatus {
    self.tx.borrow().clone()
  }

  fn begin_sync(&self) {
    let in_flight = self.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
    self.set_syncing(in_flight > 0);
  }

  fn end_sync(&self) {
    let in_flight = self.in_flight.fetch_sub(1, Ordering::SeqCst).saturating_sub(1);
    self.set_syncing(in_flight > 0);
  }

  fn set_syncing(&self, syncing: bool) {
    self.tx.send_if_modified(|s| {
      let changed = s.is_syncing != syncing;
      s.is_syncing = syncing;
      changed
    });
  }

  fn set_polling(&self, polling: bool) {
    self.tx.send_if_modified(|s| {
      let changed = s.is_polling != polling;
      s.is_polling = polling;
      changed
    });
  }

  pub fn record_success(&self, at: DateTime<Utc>) {
    self.tx.send_modify(|s| {
      s.last_sync = Some(at);
      s.error = None;
    });
  }

  pub fn record_error(&self, message: String) {
    self.tx.send_modify(|s| s.error = Some(message));
  }
}

impl Default for StatusHandle {
  fn default() -> Self {
    Self::new()
  }
}

#[derive(Debug, Clone, Copy)]
enum Activity {
  Syncing,
  Polling,
}

/// Holds an activity flag set for its lifetime, so a cancelled future
/// doesn't leave the flag stuck on.
pub(crate) struct ActivityGuard<'a> {
  status: &'a StatusHandle,
  activity: Activity,
}

impl<'a> ActivityGuard<'a> {
  pub(crate) fn syncing(status: &'a StatusHandle) -> Self {
    status.begin_sync();
    Self {
      status,
      activity: Activity::Syncing,
    }
  }

  pub(crate) fn polling(status: &'a StatusHandle) -> Self {
    status.set_polling(true);
    Self {
      status,
      activity: Activity::Polling,
    }
  }
}

impl Drop for ActivityGuard<'_> {
  fn drop(&mut self) {
    match self.activity {
      Activity::Syncing => self.status.end_sync(),
      Activity::Polling => self.status.set_polling(false),
    }
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn test_guards_reset_flags() {
    let status = StatusHandle::new();
    {
      let _syncing = ActivityGuard::syncing(&status);
      let _polling = ActivityGuard::polling(&status);
      assert!(status.current().is_syncing);
      assert!(status.current().is_polling);
    }
    assert!(!status.current().is_syncing);
    assert!(!status.current().is_polling);
  }

  #[test]
  fn test_overlapping_syncs() {
    let status = StatusHandle::new();
    let first = ActivityGuard::syncing(&status);
    let second = ActivityGuard::syncing(&status);
    drop(first);
    assert!(status.current().is_syncing);
    drop(second);
    assert!(!status.current().is_syncing);
  }

  #[test]
  fn test_success_clears_error() {
    let status = StatusHandle::new();
    status.record_error("upstream down".to_string());
    assert_eq!(status.current().error.as_deref(), Some("upstream down"));

    status.record_success(Utc::now());
    let current = status.current();
    assert!(current.error.is_none());
    assert!(current.last_sync.is_some());
  }

  #[test]
  fn test_subscribers_observe_changes() {
    let status = StatusHandle::new();
    let mut rx = status.subscribe();
    let polling = ActivityGuard::polling(&status);
    assert!(rx.has_changed().unwrap());
    assert!(rx.borrow_and_update().is_polling);

    drop(polling);
    assert!(rx.has_changed().unwrap());
    assert!(!rx.borrow_and_update().is_polling);
    assert!(!rx.has_changed().unwrap());
  }
}
