use chrono::{DateTime, Local, Utc};
use ratatui::prelude::Color;

/// Truncate to `max_len` characters, adding "..." if truncated
pub fn truncate(s: &str, max_len: usize) -> String {
  if s.chars().count() <= max_len {
    s.to_string()
  } else {
    let kept: String = s.chars().take(max_len.saturating_sub(3)).collect();
    format!("{}...", kept)
  }
}

/// Display color for job, invoice and client statuses
pub fn status_color(status: &str) -> Color {
  match status.to_lowercase().as_str() {
    "served" | "completed" | "paid" | "active" => Color::Green,
    "pending" | "open" | "assigned" | "in progress" | "sent" | "partial" => Color::Yellow,
    "attempted" | "on hold" | "on-hold" => Color::Magenta,
    "overdue" | "non-service" | "non service" | "cancelled" | "void" | "inactive" => Color::Red,
    _ => Color::White,
  }
}

pub fn format_money(amount: Option<f64>) -> String {
  match amount {
    Some(a) if a < 0.0 => format!("-${:.2}", -a),
    Some(a) => format!("${:.2}", a),
    None => "-".to_string(),
  }
}

/// Local wall-clock time of a sync, e.g. "14:05:09"
pub fn format_sync_time(at: DateTime<Utc>) -> String {
  at.with_timezone(&Local).format("%H:%M:%S").to_string()
}

/// Show the date part of an upstream timestamp, or the raw text if it has none
pub fn short_date(raw: &str) -> &str {
  match raw.split_once('T') {
    Some((date, _)) => date,
    None => raw,
  }
}
