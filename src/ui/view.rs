use crossterm::event::KeyEvent;
use ratatui::prelude::*;

use crate::sync::SyncStatus;

/// A keyboard shortcut hint for display in the header
#[derive(Debug, Clone)]
pub struct ShortcutInfo {
  pub key: &'static str,
  pub label: &'static str,
  pub priority: u8, // Lower = shown first
}

impl ShortcutInfo {
  pub const fn new(key: &'static str, label: &'static str) -> Self {
    Self {
      key,
      label,
      priority: 100,
    }
  }

  pub const fn with_priority(mut self, priority: u8) -> Self {
    self.priority = priority;
    self
  }
}

/// Actions that a view can request in response to user input
pub enum ViewAction {
  None,
  /// Push a new view onto the stack
  Push(Box<dyn View>),
  /// Pop current view from stack (go back)
  Pop,
}

/// Trait for view behavior
///
/// Views handle their own input modes (search, sort, etc.) and return
/// actions for the App to execute: App → View → Components.
///
/// Views that load data own a `SyncController` and poll it in `tick()`.
pub trait View {
  /// Handle a key event, returning an action for App to execute
  fn handle_key(&mut self, key: KeyEvent) -> ViewAction;

  fn render(&mut self, frame: &mut Frame, area: Rect);

  fn breadcrumb_label(&self) -> String;

  /// Called on each tick to allow views to poll their controller
  fn tick(&mut self) {}

  /// Sync state shown in the header, if this view syncs data
  fn sync_status(&self) -> Option<SyncStatus> {
    None
  }

  /// Transient message for the header (e.g. "data updated")
  fn notice(&self) -> Option<String> {
    None
  }

  /// Right-aligned footer text (e.g. page position)
  fn footer_status(&self) -> Option<String> {
    None
  }

  /// Drop cached data and refetch; returns false if the view has none
  fn refresh(&mut self, _clear_cache: bool) -> bool {
    false
  }

  fn shortcuts(&self) -> Vec<ShortcutInfo> {
    vec![
      ShortcutInfo::new(":", "command").with_priority(10),
      ShortcutInfo::new("q", "back").with_priority(30),
    ]
  }
}
