use ratatui::layout::Constraint;

use crate::sync::Record;
use crate::ui::renderfns::{format_money, short_date};
use crate::upstream::types::{ClientField, InvoiceField, JobField};
use crate::upstream::{ClientRecord, InvoiceRecord, JobRecord};

/// How a record type is laid out in the list and detail views.
///
/// Columns are the record's sort fields, in `SortField::all()` order, so the
/// number keys line up with what is on screen.
pub trait ListRow: Record {
  /// View title and breadcrumb
  const TITLE: &'static str;
  /// Column colored by status
  const STATUS_FIELD: Self::Field;
  /// Status filter values cycled with `f`
  const STATUSES: &'static [&'static str];

  fn cell(&self, field: Self::Field) -> String;

  fn width(field: Self::Field) -> Constraint;

  fn status(&self) -> &str;

  fn detail_title(&self) -> String;

  /// Label/value pairs for the detail view
  fn details(&self) -> Vec<(&'static str, String)>;
}

fn or_dash(value: &Option<String>) -> String {
  value.clone().unwrap_or_else(|| "-".to_string())
}

fn date(raw: &str) -> String {
  if raw.is_empty() {
    "-".to_string()
  } else {
    short_date(raw).to_string()
  }
}

impl ListRow for JobRecord {
  const TITLE: &'static str = "Jobs";
  const STATUS_FIELD: JobField = JobField::Status;
  const STATUSES: &'static [&'static str] =
    &["pending", "attempted", "served", "non-service", "cancelled"];

  fn cell(&self, field: JobField) -> String {
    match field {
      JobField::JobNumber => self.job_number.clone(),
      JobField::Recipient => self.recipient.clone(),
      JobField::Client => self.client.clone(),
      JobField::Status => self.status.clone(),
      JobField::Priority => or_dash(&self.priority),
      JobField::Created => date(&self.created),
      JobField::Due => date(&self.due),
      JobField::Amount => format_money(self.amount),
    }
  }

  fn width(field: JobField) -> Constraint {
    match field {
      JobField::JobNumber => Constraint::Length(12),
      JobField::Recipient | JobField::Client => Constraint::Fill(1),
      JobField::Status => Constraint::Length(12),
      JobField::Priority => Constraint::Length(9),
      JobField::Created | JobField::Due => Constraint::Length(11),
      JobField::Amount => Constraint::Length(10),
    }
  }

  fn status(&self) -> &str {
    &self.status
  }

  fn detail_title(&self) -> String {
    format!("Job {}", self.job_number)
  }

  fn details(&self) -> Vec<(&'static str, String)> {
    vec![
      ("Job #", self.job_number.clone()),
      ("Status", self.status.clone()),
      ("Priority", or_dash(&self.priority)),
      ("Recipient", self.recipient.clone()),
      ("Address", self.address.clone()),
      ("Client", self.client.clone()),
      ("Server", or_dash(&self.server)),
      ("Created", self.created.clone()),
      ("Due", self.due.clone()),
      ("Amount", format_money(self.amount)),
      ("ID", self.id.clone()),
    ]
  }
}

impl ListRow for InvoiceRecord {
  const TITLE: &'static str = "Invoices";
  const STATUS_FIELD: InvoiceField = InvoiceField::Status;
  const STATUSES: &'static [&'static str] = &["draft", "open", "overdue", "paid", "void"];

  fn cell(&self, field: InvoiceField) -> String {
    match field {
      InvoiceField::Number => self.invoice_number.clone(),
      InvoiceField::Client => self.client.clone(),
      InvoiceField::Status => self.status.clone(),
      InvoiceField::Amount => format_money(self.amount),
      InvoiceField::Balance => format_money(self.balance),
      InvoiceField::Issued => date(&self.issued),
      InvoiceField::Due => date(&self.due),
    }
  }

  fn width(field: InvoiceField) -> Constraint {
    match field {
      InvoiceField::Number => Constraint::Length(12),
      InvoiceField::Client => Constraint::Fill(1),
      InvoiceField::Status => Constraint::Length(10),
      InvoiceField::Amount | InvoiceField::Balance => Constraint::Length(11),
      InvoiceField::Issued | InvoiceField::Due => Constraint::Length(11),
    }
  }

  fn status(&self) -> &str {
    &self.status
  }

  fn detail_title(&self) -> String {
    format!("Invoice {}", self.invoice_number)
  }

  fn details(&self) -> Vec<(&'static str, String)> {
    vec![
      ("Invoice #", self.invoice_number.clone()),
      ("Status", self.status.clone()),
      ("Client", self.client.clone()),
      ("Job", or_dash(&self.job_id)),
      ("Amount", format_money(self.amount)),
      ("Balance", format_money(self.balance)),
      ("Issued", self.issued.clone()),
      ("Due", self.due.clone()),
      ("ID", self.id.clone()),
    ]
  }
}

impl ListRow for ClientRecord {
  const TITLE: &'static str = "Clients";
  const STATUS_FIELD: ClientField = ClientField::Status;
  const STATUSES: &'static [&'static str] = &["active", "on-hold", "inactive"];

  fn cell(&self, field: ClientField) -> String {
    match field {
      ClientField::Name => self.name.clone(),
      ClientField::Contact => or_dash(&self.contact),
      ClientField::Status => self.status.clone(),
      ClientField::ActiveJobs => self
        .active_jobs
        .map(|n| n.to_string())
        .unwrap_or_else(|| "-".to_string()),
      ClientField::Balance => format_money(self.balance),
      ClientField::Created => date(&self.created),
    }
  }

  fn width(field: ClientField) -> Constraint {
    match field {
      ClientField::Name | ClientField::Contact => Constraint::Fill(1),
      ClientField::Status => Constraint::Length(10),
      ClientField::ActiveJobs => Constraint::Length(8),
      ClientField::Balance => Constraint::Length(11),
      ClientField::Created => Constraint::Length(11),
    }
  }

  fn status(&self) -> &str {
    &self.status
  }

  fn detail_title(&self) -> String {
    self.name.clone()
  }

  fn details(&self) -> Vec<(&'static str, String)> {
    vec![
      ("Name", self.name.clone()),
      ("Status", self.status.clone()),
      ("Contact", or_dash(&self.contact)),
      ("Email", or_dash(&self.email)),
      ("Phone", or_dash(&self.phone)),
      ("Active jobs", self.cell(ClientField::ActiveJobs)),
      ("Balance", format_money(self.balance)),
      ("Created", self.created.clone()),
      ("ID", self.id.clone()),
    ]
  }
}

/// Next status filter in the cycle: off → first → ... → last → off.
/// An unknown current value restarts the cycle.
pub fn next_status(statuses: &[&str], current: Option<&str>) -> Option<String> {
  let next = match current {
    None => statuses.first(),
    Some(current) => match statuses.iter().position(|s| s.eq_ignore_ascii_case(current)) {
      Some(i) => statuses.get(i + 1),
      None => statuses.first(),
    },
  };
  next.map(|s| s.to_string())
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::sync::SortField;

  #[test]
  fn test_next_status_cycles_back_to_off() {
    let statuses = InvoiceRecord::STATUSES;
    assert_eq!(next_status(statuses, None).as_deref(), Some("draft"));
    assert_eq!(next_status(statuses, Some("Open")).as_deref(), Some("overdue"));
    assert_eq!(next_status(statuses, Some("void")), None);
    assert_eq!(next_status(statuses, Some("weird")).as_deref(), Some("draft"));
    assert_eq!(next_status(&[], None), None);
  }

  #[test]
  fn test_status_field_is_a_column() {
    assert!(JobField::all().contains(&JobRecord::STATUS_FIELD));
    assert!(InvoiceField::all().contains(&InvoiceRecord::STATUS_FIELD));
    assert!(ClientField::all().contains(&ClientRecord::STATUS_FIELD));
  }

  #[test]
  fn test_job_cells() {
    let job = JobRecord {
      id: "1001".to_string(),
      job_number: "J-1001".to_string(),
      status: "served".to_string(),
      priority: None,
      recipient: "Jane Doe".to_string(),
      address: "1 Main St".to_string(),
      client: "Acme Law".to_string(),
      client_id: Some("1".to_string()),
      server: None,
      server_id: None,
      created: "2024-03-02T10:15:00Z".to_string(),
      due: String::new(),
      amount: Some(75.0),
    };
    assert_eq!(job.cell(JobField::Priority), "-");
    assert_eq!(job.cell(JobField::Created), "2024-03-02");
    assert_eq!(job.cell(JobField::Due), "-");
    assert_eq!(job.cell(JobField::Amount), "$75.00");
    assert_eq!(job.detail_title(), "Job J-1001");
  }
}
