use crate::commands::CommandKind;
use crate::config::Config;
use crate::event::{Event, EventHandler};
use crate::sync::{SyncController, SyncStatus};
use crate::ui::components::{CommandEvent, CommandInput, KeyResult};
use crate::ui::renderfns::{draw_footer, draw_header};
use crate::ui::view::{View, ViewAction};
use crate::ui::views::{ListRow, RecordListView};
use crate::upstream::{self, ClientRecord, InvoiceRecord, JobRecord};
use color_eyre::Result;
use crossterm::event::{KeyCode, KeyEvent, KeyModifiers};
use crossterm::terminal::{
  disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen,
};
use crossterm::ExecutableCommand;
use ratatui::prelude::*;
use std::io::{stdout, Stdout};
use std::time::Duration;
use tracing::{error, info};

const TICK_RATE: Duration = Duration::from_millis(250);

/// Main application state
pub struct App {
  config: Config,
  /// Only the bundled sample data, no network
  sample_only: bool,
  /// Navigation stack - root is always at index 0
  view_stack: Vec<Box<dyn View>>,
  command: CommandInput,
  /// Footer message, e.g. an unknown command or a source that failed to build
  message: Option<String>,
  title: String,
  should_quit: bool,
}

impl App {
  pub fn new(config: Config, sample_only: bool) -> Self {
    let title = if sample_only {
      format!("{} (sample)", config.display_title())
    } else {
      config.display_title()
    };
    Self {
      config,
      sample_only,
      view_stack: Vec::new(),
      command: CommandInput::new(),
      message: None,
      title,
      should_quit: false,
    }
  }

  pub async fn run(&mut self) -> Result<()> {
    enable_raw_mode()?;
    stdout().execute(EnterAlternateScreen)?;
    let mut terminal = Terminal::new(CrosstermBackend::new(stdout()))?;

    let result = self.event_loop(&mut terminal).await;

    // Restore even if the loop failed
    disable_raw_mode()?;
    stdout().execute(LeaveAlternateScreen)?;
    result
  }

  async fn event_loop(&mut self, terminal: &mut Terminal<CrosstermBackend<Stdout>>) -> Result<()> {
    let mut events = EventHandler::new(TICK_RATE);
    self.execute(CommandKind::Jobs);

    while !self.should_quit {
      terminal.draw(|frame| self.draw(frame))?;

      match events.next().await {
        Some(Event::Key(key)) => self.handle_key(key),
        Some(Event::Resize) | Some(Event::Tick) => {}
        None => break,
      }
      // Poll on every event so a busy keyboard can't starve the controllers.
      // Views under a detail page keep collecting their loads too.
      for view in self.view_stack.iter_mut() {
        view.tick();
      }
    }
    Ok(())
  }

  fn root_view<R: ListRow>(&self) -> Result<Box<dyn View>> {
    let chain = upstream::build_chain::<R>(&self.config, self.sample_only)?;
    let controller = SyncController::new(chain, self.config.sync.settings());
    Ok(Box::new(RecordListView::new(controller)))
  }

  /// Replace the whole stack with a new root page
  fn open_root(&mut self, built: Result<Box<dyn View>>) {
    match built {
      Ok(view) => {
        info!(view = %view.breadcrumb_label(), "opening view");
        self.view_stack.clear();
        self.view_stack.push(view);
        self.message = None;
      }
      Err(e) => {
        error!(error = %e, "failed to open view");
        self.message = Some(e.to_string());
      }
    }
  }

  fn execute(&mut self, kind: CommandKind) {
    match kind {
      CommandKind::Jobs => self.open_root(self.root_view::<JobRecord>()),
      CommandKind::Invoices => self.open_root(self.root_view::<InvoiceRecord>()),
      CommandKind::Clients => self.open_root(self.root_view::<ClientRecord>()),
      CommandKind::Refresh | CommandKind::ClearCache => {
        let clear = kind == CommandKind::ClearCache;
        let handled = self
          .view_stack
          .iter_mut()
          .rev()
          .any(|view| view.refresh(clear));
        if !handled {
          self.message = Some("Nothing to refresh".to_string());
        }
      }
      CommandKind::Quit => self.should_quit = true,
    }
  }

  fn handle_key(&mut self, key: KeyEvent) {
    if key.code == KeyCode::Char('c') && key.modifiers.contains(KeyModifiers::CONTROL) {
      self.should_quit = true;
      return;
    }
    if !self.command.is_active() {
      self.message = None;
    }

    match self.command.handle_key(key) {
      KeyResult::Event(CommandEvent::Submitted(kind)) => {
        self.execute(kind);
        return;
      }
      KeyResult::Event(CommandEvent::Unknown(input)) => {
        self.message = Some(format!("Unknown command: {}", input));
        return;
      }
      KeyResult::Event(CommandEvent::Cancelled) | KeyResult::Handled => return,
      KeyResult::NotHandled => {}
    }

    let Some(view) = self.view_stack.last_mut() else {
      if matches!(key.code, KeyCode::Char('q') | KeyCode::Esc) {
        self.should_quit = true;
      }
      return;
    };

    match view.handle_key(key) {
      ViewAction::None => {}
      ViewAction::Push(next) => self.view_stack.push(next),
      ViewAction::Pop => {
        if self.view_stack.len() > 1 {
          self.view_stack.pop();
        } else {
          self.should_quit = true;
        }
      }
    }
  }

  fn draw(&mut self, frame: &mut Frame) {
    let chunks = Layout::default()
      .direction(Direction::Vertical)
      .constraints([
        Constraint::Length(1), // Header
        Constraint::Min(1),    // Content
        Constraint::Length(1), // Footer
      ])
      .split(frame.area());

    // Header reflects the root page's sync state even under a detail view
    let root = self.view_stack.first();
    let status = root.and_then(|v| v.sync_status()).unwrap_or_else(SyncStatus::default);
    let notice = root.and_then(|v| v.notice());
    let shortcuts = self
      .view_stack
      .last()
      .map(|v| v.shortcuts())
      .unwrap_or_default();
    draw_header(
      frame,
      chunks[0],
      &self.title,
      &status,
      notice.as_deref(),
      &shortcuts,
    );

    if let Some(view) = self.view_stack.last_mut() {
      view.render(frame, chunks[1]);
    }
    self.command.render_overlay(frame, chunks[1]);

    let breadcrumb: Vec<String> = self.view_stack.iter().map(|v| v.breadcrumb_label()).collect();
    let footer = self
      .message
      .clone()
      .or_else(|| self.view_stack.last().and_then(|v| v.footer_status()));
    draw_footer(frame, chunks[2], &breadcrumb, footer.as_deref());
  }
}
