use ratatui::prelude::*;
use ratatui::widgets::Paragraph;

use super::utils::format_sync_time;
use crate::sync::SyncStatus;
use crate::ui::view::ShortcutInfo;

/// Draw the header bar: title, sync indicator, notice and shortcuts
pub fn draw_header(
  frame: &mut Frame,
  area: Rect,
  title: &str,
  status: &SyncStatus,
  notice: Option<&str>,
  shortcuts: &[ShortcutInfo],
) {
  let sep = Span::styled("│", Style::default().fg(Color::DarkGray));

  let mut spans = vec![
    Span::styled(" servedash ", Style::default().fg(Color::Cyan).bold()),
    sep.clone(),
    Span::styled(format!(" {} ", title), Style::default().fg(Color::White)),
    sep,
    Span::raw(" "),
  ];
  spans.extend(sync_spans(status));

  if let Some(notice) = notice {
    spans.push(Span::raw("  "));
    spans.push(Span::styled(
      format!(" {} ", notice),
      Style::default().fg(Color::Black).bg(Color::Yellow),
    ));
  }

  spans.push(Span::raw("  "));
  let mut ordered: Vec<&ShortcutInfo> = shortcuts.iter().collect();
  ordered.sort_by_key(|s| s.priority);
  for (i, shortcut) in ordered.into_iter().enumerate() {
    if i > 0 {
      spans.push(Span::raw("   "));
    }
    spans.push(Span::styled(
      format!("<{}>", shortcut.key),
      Style::default().fg(Color::Cyan),
    ));
    spans.push(Span::styled(
      format!(" {}", shortcut.label),
      Style::default().fg(Color::DarkGray),
    ));
  }

  let paragraph = Paragraph::new(Line::from(spans)).style(Style::default().bg(Color::Black));
  frame.render_widget(paragraph, area);
}

/// Syncing wins over polling; an error is shown next to the last good sync
fn sync_spans(status: &SyncStatus) -> Vec<Span<'static>> {
  let mut spans = Vec::new();
  if status.is_syncing {
    spans.push(Span::styled("⟳ syncing", Style::default().fg(Color::Yellow)));
  } else if status.is_polling {
    spans.push(Span::styled("◌ checking", Style::default().fg(Color::DarkGray)));
  } else {
    match status.last_sync {
      Some(at) => spans.push(Span::styled(
        format!("✓ synced {}", format_sync_time(at)),
        Style::default().fg(Color::Green),
      )),
      None => spans.push(Span::styled("· not synced", Style::default().fg(Color::DarkGray))),
    }
  }

  if let Some(error) = &status.error {
    spans.push(Span::raw(" "));
    spans.push(Span::styled(
      format!("✗ {}", error),
      Style::default().fg(Color::Red),
    ));
  }
  spans
}
