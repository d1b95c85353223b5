use crossterm::event::{KeyCode, KeyEvent};
use ratatui::prelude::*;
use ratatui::widgets::{Block, Borders, Paragraph, Wrap};

use super::rows::ListRow;
use crate::ui::renderfns::status_color;
use crate::ui::view::{ShortcutInfo, View, ViewAction};

/// Read-only field listing for one record, as it was in the cached page
pub struct RecordDetailView<R: ListRow> {
  record: R,
  scroll: u16,
}

impl<R: ListRow> RecordDetailView<R> {
  pub fn new(record: R) -> Self {
    Self { record, scroll: 0 }
  }

  fn lines(&self) -> Vec<Line<'static>> {
    let details = self.record.details();
    let label_width = details.iter().map(|(l, _)| l.len()).max().unwrap_or(0) + 2;

    details
      .into_iter()
      .map(|(label, value)| {
        let value_style = if label == "Status" {
          Style::default().fg(status_color(self.record.status()))
        } else {
          Style::default()
        };
        Line::from(vec![
          Span::styled(
            format!("{:<width$}", format!("{}:", label), width = label_width),
            Style::default().fg(Color::DarkGray),
          ),
          Span::styled(value, value_style),
        ])
      })
      .collect()
  }
}

impl<R: ListRow> View for RecordDetailView<R> {
  fn handle_key(&mut self, key: KeyEvent) -> ViewAction {
    match key.code {
      KeyCode::Char('j') | KeyCode::Down => self.scroll = self.scroll.saturating_add(1),
      KeyCode::Char('k') | KeyCode::Up => self.scroll = self.scroll.saturating_sub(1),
      KeyCode::Char('q') | KeyCode::Esc => return ViewAction::Pop,
      _ => {}
    }
    ViewAction::None
  }

  fn render(&mut self, frame: &mut Frame, area: Rect) {
    let block = Block::default()
      .title(format!(" {} ", self.record.detail_title()))
      .title_alignment(Alignment::Center)
      .borders(Borders::ALL)
      .border_style(Style::default().fg(Color::Blue));

    let paragraph = Paragraph::new(self.lines())
      .block(block)
      .wrap(Wrap { trim: false })
      .scroll((self.scroll, 0));
    frame.render_widget(paragraph, area);
  }

  fn breadcrumb_label(&self) -> String {
    self.record.detail_title()
  }

  fn shortcuts(&self) -> Vec<ShortcutInfo> {
    vec![
      ShortcutInfo::new("j/k", "scroll").with_priority(20),
      ShortcutInfo::new("q", "back").with_priority(30),
    ]
  }
}
