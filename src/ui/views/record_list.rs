use std::time::{Duration, Instant};

use crossterm::event::{KeyCode, KeyEvent};
use ratatui::prelude::*;
use ratatui::widgets::{Block, Borders, Cell, Paragraph, Row, Table, TableState};

use super::record_detail::RecordDetailView;
use super::rows::{next_status, ListRow};
use crate::sync::{view, FilterField, LoadState, SortField, SortSpec, SyncController, SyncStatus};
use crate::ui::components::{KeyResult, SearchEvent, SearchInput};
use crate::ui::ensure_valid_selection;
use crate::ui::renderfns::{status_color, truncate};
use crate::ui::view::{ShortcutInfo, View, ViewAction};

const PAGE_SIZES: &[u64] = &[10, 25, 50, 100];
const NOTICE_TTL: Duration = Duration::from_secs(5);

/// Page size after `current` in the +/- cycle
fn step_page_size(current: u64, grow: bool) -> u64 {
  if grow {
    PAGE_SIZES
      .iter()
      .copied()
      .find(|&s| s > current)
      .unwrap_or(PAGE_SIZES[0])
  } else {
    PAGE_SIZES
      .iter()
      .rev()
      .copied()
      .find(|&s| s < current)
      .unwrap_or(PAGE_SIZES[PAGE_SIZES.len() - 1])
  }
}

/// Paged table of one record type.
///
/// The controller owns fetching and caching; this view only keeps what is
/// local to the screen: selection, search term and sort.
pub struct RecordListView<R: ListRow> {
  controller: SyncController<R>,
  table_state: TableState,
  search: SearchInput,
  sort: Option<SortSpec<R::Field>>,
  visible: Vec<R>,
  notice: Option<(String, Instant)>,
}

impl<R: ListRow> RecordListView<R> {
  pub fn new(mut controller: SyncController<R>) -> Self {
    controller.start();
    let mut view = Self {
      controller,
      table_state: TableState::default(),
      search: SearchInput::new(),
      sort: None,
      visible: Vec::new(),
      notice: None,
    };
    view.recompute();
    view
  }

  fn recompute(&mut self) {
    self.visible = view(self.controller.records(), self.search.query(), self.sort);
    ensure_valid_selection(&mut self.table_state, self.visible.len());
  }

  /// Run a controller transition; a new window starts at the top
  fn navigate(&mut self, transition: impl FnOnce(&mut SyncController<R>) -> bool) {
    if transition(&mut self.controller) {
      self.table_state.select(Some(0));
      self.recompute();
    }
  }

  fn sort_by_column(&mut self, index: usize) {
    if let Some(&field) = R::Field::all().get(index) {
      self.sort = Some(SortSpec::toggle(self.sort, field));
      self.recompute();
    }
  }

  fn cycle_status_filter(&mut self) {
    let current = self.controller.pagination().filters().get(FilterField::Status);
    let next = next_status(R::STATUSES, current);
    self.navigate(|c| c.set_filter(FilterField::Status, next));
  }

  /// Narrow to the selected row's client, or drop that filter if set
  fn toggle_client_filter(&mut self) {
    let current = self.controller.pagination().filters().get(FilterField::ClientId);
    let next = if current.is_some() {
      None
    } else {
      self
        .selected()
        .and_then(|r| r.filter_value(FilterField::ClientId))
        .map(|v| v.into_owned())
    };
    if current.is_none() && next.is_none() {
      return;
    }
    self.navigate(|c| c.set_filter(FilterField::ClientId, next));
  }

  fn selected(&self) -> Option<&R> {
    self.table_state.selected().and_then(|i| self.visible.get(i))
  }

  fn title(&self) -> String {
    let p = self.controller.pagination();
    let mut title = format!(
      " {} [page {}/{}, {} total]",
      R::TITLE,
      p.page(),
      p.total_pages().max(1),
      p.total()
    );
    if !self.search.query().is_empty() {
      title.push_str(&format!(" /{} ({} shown)", self.search.query(), self.visible.len()));
    }
    if self.controller.state().is_loading() {
      title.push_str(" (loading...)");
    }
    title.push(' ');
    title
  }

  /// Active filters and sort, shown under the table
  fn describe_query(&self) -> Option<String> {
    let mut parts: Vec<String> = self
      .controller
      .pagination()
      .filters()
      .active()
      .into_iter()
      .map(|(field, value)| format!("{}={}", field.param(), value))
      .collect();
    if let Some(sort) = self.sort {
      parts.push(format!("sort {} {}", sort.field.label(), sort.direction.arrow()));
    }
    if parts.is_empty() {
      None
    } else {
      Some(format!(" {} ", parts.join("  ")))
    }
  }

  fn render_table(&mut self, frame: &mut Frame, area: Rect) {
    let mut block = Block::default()
      .title(self.title())
      .title_alignment(Alignment::Center)
      .borders(Borders::ALL)
      .border_style(Style::default().fg(Color::Blue));
    if let Some(query) = self.describe_query() {
      block = block.title_bottom(Line::from(query).style(Style::default().fg(Color::DarkGray)));
    }

    if self.visible.is_empty() {
      let state = self.controller.state();
      let content = if let Some(message) = state.error() {
        format!("Failed to load: {}\n\nPress 'r' to retry.", message)
      } else if !matches!(state, LoadState::Ready(_)) {
        "Loading...".to_string()
      } else if !self.search.query().is_empty() {
        "Nothing on this page matches the search.".to_string()
      } else {
        format!("No {} found.", R::TITLE.to_lowercase())
      };
      let paragraph = Paragraph::new(content)
        .block(block)
        .style(Style::default().fg(Color::DarkGray));
      frame.render_widget(paragraph, area);
      return;
    }

    let fields = R::Field::all();
    let header = Row::new(fields.iter().enumerate().map(|(i, &field)| {
      let arrow = match self.sort {
        Some(spec) if spec.field == field => spec.direction.arrow(),
        _ => "",
      };
      Cell::from(format!("{} {}{}", i + 1, field.label(), arrow))
    }))
    .style(Style::default().fg(Color::Yellow).bold());

    let rows = self.visible.iter().map(|record| {
      Row::new(fields.iter().map(|&field| {
        let text = truncate(&record.cell(field), 40);
        if field == R::STATUS_FIELD {
          Cell::from(text).style(Style::default().fg(status_color(record.status())))
        } else {
          Cell::from(text)
        }
      }))
    });

    let widths: Vec<Constraint> = fields.iter().map(|&f| R::width(f)).collect();
    let table = Table::new(rows, widths)
      .header(header)
      .block(block)
      .row_highlight_style(
        Style::default()
          .bg(Color::DarkGray)
          .add_modifier(Modifier::BOLD),
      )
      .highlight_symbol("> ");

    frame.render_stateful_widget(table, area, &mut self.table_state);
  }
}

impl<R: ListRow> View for RecordListView<R> {
  fn handle_key(&mut self, key: KeyEvent) -> ViewAction {
    match self.search.handle_key(key) {
      KeyResult::Event(SearchEvent::Changed(_)) => {
        self.recompute();
        return ViewAction::None;
      }
      KeyResult::Event(SearchEvent::Submitted) | KeyResult::Handled => return ViewAction::None,
      KeyResult::NotHandled => {}
    }

    match key.code {
      KeyCode::Char('j') | KeyCode::Down => self.table_state.select_next(),
      KeyCode::Char('k') | KeyCode::Up => self.table_state.select_previous(),
      KeyCode::Char('n') | KeyCode::Right | KeyCode::PageDown => {
        self.navigate(SyncController::next_page)
      }
      KeyCode::Char('p') | KeyCode::Left | KeyCode::PageUp => {
        self.navigate(SyncController::prev_page)
      }
      KeyCode::Char('g') | KeyCode::Home => self.navigate(SyncController::first_page),
      KeyCode::Char('G') | KeyCode::End => self.navigate(SyncController::last_page),
      KeyCode::Char('+') | KeyCode::Char('=') => {
        let size = step_page_size(self.controller.pagination().limit(), true);
        self.navigate(|c| c.set_limit(size));
      }
      KeyCode::Char('-') => {
        let size = step_page_size(self.controller.pagination().limit(), false);
        self.navigate(|c| c.set_limit(size));
      }
      KeyCode::Char(c @ '1'..='9') => {
        let index = (c as u8 - b'1') as usize;
        self.sort_by_column(index);
      }
      KeyCode::Char('f') => self.cycle_status_filter(),
      KeyCode::Char('F') => self.navigate(SyncController::clear_filters),
      KeyCode::Char('c') => self.toggle_client_filter(),
      KeyCode::Char('r') => {
        self.refresh(false);
      }
      KeyCode::Char('C') => {
        self.refresh(true);
      }
      KeyCode::Enter => {
        if let Some(record) = self.selected() {
          return ViewAction::Push(Box::new(RecordDetailView::new(record.clone())));
        }
      }
      KeyCode::Char('q') | KeyCode::Esc => return ViewAction::Pop,
      _ => {}
    }
    ViewAction::None
  }

  fn render(&mut self, frame: &mut Frame, area: Rect) {
    self.render_table(frame, area);
    self.search.render_overlay(frame, area);
  }

  fn breadcrumb_label(&self) -> String {
    R::TITLE.to_string()
  }

  fn tick(&mut self) {
    if self.controller.poll() {
      self.recompute();
    }
    if let Some(change) = self.controller.take_update_notice() {
      let message = format!(
        "Data updated: {} → {} {}",
        change.previous_total,
        change.total,
        R::TITLE.to_lowercase()
      );
      self.notice = Some((message, Instant::now()));
    }
    if self
      .notice
      .as_ref()
      .is_some_and(|(_, at)| at.elapsed() >= NOTICE_TTL)
    {
      self.notice = None;
    }
  }

  fn sync_status(&self) -> Option<SyncStatus> {
    Some(self.controller.sync_status())
  }

  fn notice(&self) -> Option<String> {
    self.notice.as_ref().map(|(message, _)| message.clone())
  }

  fn footer_status(&self) -> Option<String> {
    let p = self.controller.pagination();
    let entry = self.controller.entry()?;
    let first = if p.total() == 0 { 0 } else { p.offset() + 1 };
    let last = (p.offset() + entry.records.len() as u64).min(p.total());
    let mut status = format!("{}-{} of {} | {}", first, last, p.total(), entry.source);
    if let Some(ms) = entry.response_time_ms {
      status.push_str(&format!(" {}ms", ms));
    }
    if entry.mock {
      status.push_str(" | sample data");
    }
    if self.controller.is_monitoring() {
      status.push_str(" | watching");
    }
    Some(status)
  }

  fn refresh(&mut self, clear_cache: bool) -> bool {
    if clear_cache {
      self.controller.clear_cache();
    } else {
      self.controller.refresh();
    }
    self.recompute();
    true
  }

  fn shortcuts(&self) -> Vec<ShortcutInfo> {
    vec![
      ShortcutInfo::new(":", "command").with_priority(10),
      ShortcutInfo::new("/", "search").with_priority(20),
      ShortcutInfo::new("n/p", "page").with_priority(30),
      ShortcutInfo::new("1-9", "sort").with_priority(40),
      ShortcutInfo::new("f", "status").with_priority(50),
      ShortcutInfo::new("r", "refresh").with_priority(60),
    ]
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::sync::{FallbackChain, RetryPolicy, SourceKind, SyncSettings};
  use crate::upstream::{InvoiceRecord, JobRecord, SampleSource};
  use crossterm::event::KeyModifiers;
  use std::sync::Arc;

  fn key(code: KeyCode) -> KeyEvent {
    KeyEvent::new(code, KeyModifiers::NONE)
  }

  fn sample_view<R: ListRow>(page_size: u64) -> RecordListView<R> {
    let source = SampleSource::<R>::bundled().unwrap();
    let chain = FallbackChain::new().with_source(
      0,
      SourceKind::Sample,
      Arc::new(source),
      RetryPolicy::local(),
    );
    let settings = SyncSettings {
      page_size,
      poll_interval: Duration::ZERO,
      ..SyncSettings::default()
    };
    RecordListView::new(SyncController::new(chain, settings))
  }

  /// Let the spawned load finish and pick it up
  async fn settle<R: ListRow>(view: &mut RecordListView<R>) {
    for _ in 0..10 {
      tokio::task::yield_now().await;
      view.tick();
      if !view.controller.state().is_loading() {
        return;
      }
    }
  }

  #[test]
  fn test_step_page_size() {
    assert_eq!(step_page_size(10, true), 25);
    assert_eq!(step_page_size(30, true), 50);
    assert_eq!(step_page_size(100, true), 10);
    assert_eq!(step_page_size(50, false), 25);
    assert_eq!(step_page_size(10, false), 100);
  }

  #[tokio::test]
  async fn test_pages_through_sample_jobs() {
    let mut view = sample_view::<JobRecord>(5);
    settle(&mut view).await;
    assert_eq!(view.visible.len(), 5);
    assert_eq!(view.controller.pagination().total(), 12);

    view.handle_key(key(KeyCode::Char('G')));
    settle(&mut view).await;
    assert_eq!(view.controller.pagination().offset(), 10);
    assert_eq!(view.visible.len(), 2);
    assert_eq!(view.footer_status().as_deref(), Some("11-12 of 12 | sample 0ms | sample data"));
  }

  #[tokio::test]
  async fn test_search_filters_loaded_page_only() {
    let mut view = sample_view::<JobRecord>(50);
    settle(&mut view).await;
    assert_eq!(view.visible.len(), 12);

    view.handle_key(key(KeyCode::Char('/')));
    for c in "served".chars() {
      view.handle_key(key(KeyCode::Char(c)));
    }
    assert_eq!(view.visible.len(), 4);
    assert!(view.visible.iter().all(|j| j.status == "served"));

    view.handle_key(key(KeyCode::Esc));
    assert_eq!(view.visible.len(), 12);
  }

  #[tokio::test]
  async fn test_status_filter_refetches() {
    let mut view = sample_view::<JobRecord>(50);
    settle(&mut view).await;

    view.handle_key(key(KeyCode::Char('f')));
    settle(&mut view).await;
    assert_eq!(
      view.controller.pagination().filters().get(FilterField::Status),
      Some("pending")
    );
    assert_eq!(view.controller.pagination().total(), 4);

    view.handle_key(key(KeyCode::Char('F')));
    settle(&mut view).await;
    assert_eq!(view.controller.pagination().total(), 12);
  }

  #[tokio::test]
  async fn test_sort_key_toggles_direction() {
    let mut view = sample_view::<InvoiceRecord>(50);
    settle(&mut view).await;

    // Column 4 is Amount
    view.handle_key(key(KeyCode::Char('4')));
    let ascending: Vec<_> = view.visible.iter().map(|r| r.amount).collect();
    view.handle_key(key(KeyCode::Char('4')));
    let descending: Vec<_> = view.visible.iter().map(|r| r.amount).collect();

    assert_eq!(ascending.len(), 8);
    assert_eq!(ascending.first(), Some(&Some(0.0)));
    assert_eq!(ascending.last(), Some(&Some(150.0)));
    let mut reversed = descending;
    reversed.reverse();
    assert_eq!(reversed, ascending);
  }

  #[tokio::test]
  async fn test_enter_opens_detail_and_q_pops() {
    let mut view = sample_view::<JobRecord>(10);
    settle(&mut view).await;

    assert!(matches!(view.handle_key(key(KeyCode::Enter)), ViewAction::Push(_)));
    assert!(matches!(view.handle_key(key(KeyCode::Char('q'))), ViewAction::Pop));
  }
}
