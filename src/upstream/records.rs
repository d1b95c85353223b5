//! Record implementations for upstream types.

use std::borrow::Cow;

use crate::sync::{parse_timestamp, FilterField, Record, SortField, SortKey};

use super::api_types::{ApiClient, ApiInvoice, ApiJob};
use super::types::{ClientField, ClientRecord, InvoiceField, InvoiceRecord, JobField, JobRecord};

fn money(amount: Option<f64>) -> Option<Cow<'static, str>> {
  amount.map(|a| Cow::Owned(format!("{:.2}", a)))
}

fn opt(value: &Option<String>) -> Option<Cow<'_, str>> {
  value.as_deref().map(Cow::Borrowed)
}

// ============================================================================
// Jobs
// ============================================================================

impl SortField for JobField {
  fn all() -> &'static [Self] {
    &[
      JobField::JobNumber,
      JobField::Recipient,
      JobField::Client,
      JobField::Status,
      JobField::Priority,
      JobField::Created,
      JobField::Due,
      JobField::Amount,
    ]
  }

  fn label(self) -> &'static str {
    match self {
      JobField::JobNumber => "Job #",
      JobField::Recipient => "Recipient",
      JobField::Client => "Client",
      JobField::Status => "Status",
      JobField::Priority => "Priority",
      JobField::Created => "Created",
      JobField::Due => "Due",
      JobField::Amount => "Amount",
    }
  }
}

impl Record for JobRecord {
  type Wire = ApiJob;
  type Field = JobField;
  const COLLECTION: &'static str = "jobs";

  fn record_id(&self) -> &str {
    &self.id
  }

  fn search_fields(&self) -> Vec<Cow<'_, str>> {
    let mut fields: Vec<Cow<'_, str>> = vec![
      Cow::Borrowed(self.job_number.as_str()),
      Cow::Borrowed(self.recipient.as_str()),
      Cow::Borrowed(self.address.as_str()),
      Cow::Borrowed(self.client.as_str()),
      Cow::Borrowed(self.status.as_str()),
    ];
    fields.extend(opt(&self.server));
    fields.extend(money(self.amount));
    fields
  }

  fn sort_key(&self, field: JobField) -> SortKey {
    match field {
      JobField::JobNumber => SortKey::Text(self.job_number.clone()),
      JobField::Recipient => SortKey::Text(self.recipient.clone()),
      JobField::Client => SortKey::Text(self.client.clone()),
      JobField::Status => SortKey::Text(self.status.clone()),
      JobField::Priority => SortKey::Text(self.priority.clone().unwrap_or_default()),
      JobField::Created => SortKey::Date(parse_timestamp(&self.created)),
      JobField::Due => SortKey::Date(parse_timestamp(&self.due)),
      JobField::Amount => SortKey::Number(self.amount),
    }
  }

  fn filter_value(&self, field: FilterField) -> Option<Cow<'_, str>> {
    match field {
      FilterField::Status => Some(Cow::Borrowed(self.status.as_str())),
      FilterField::Priority => opt(&self.priority),
      FilterField::ClientId => opt(&self.client_id),
      FilterField::ServerId => opt(&self.server_id),
    }
  }
}

// ============================================================================
// Invoices
// ============================================================================

impl SortField for InvoiceField {
  fn all() -> &'static [Self] {
    &[
      InvoiceField::Number,
      InvoiceField::Client,
      InvoiceField::Status,
      InvoiceField::Amount,
      InvoiceField::Balance,
      InvoiceField::Issued,
      InvoiceField::Due,
    ]
  }

  fn label(self) -> &'static str {
    match self {
      InvoiceField::Number => "Invoice #",
      InvoiceField::Client => "Client",
      InvoiceField::Status => "Status",
      InvoiceField::Amount => "Amount",
      InvoiceField::Balance => "Balance",
      InvoiceField::Issued => "Issued",
      InvoiceField::Due => "Due",
    }
  }
}

impl Record for InvoiceRecord {
  type Wire = ApiInvoice;
  type Field = InvoiceField;
  const COLLECTION: &'static str = "invoices";

  fn record_id(&self) -> &str {
    &self.id
  }

  fn search_fields(&self) -> Vec<Cow<'_, str>> {
    let mut fields: Vec<Cow<'_, str>> = vec![
      Cow::Borrowed(self.invoice_number.as_str()),
      Cow::Borrowed(self.client.as_str()),
      Cow::Borrowed(self.status.as_str()),
    ];
    fields.extend(opt(&self.job_id));
    fields.extend(money(self.amount));
    fields
  }

  fn sort_key(&self, field: InvoiceField) -> SortKey {
    match field {
      InvoiceField::Number => SortKey::Text(self.invoice_number.clone()),
      InvoiceField::Client => SortKey::Text(self.client.clone()),
      InvoiceField::Status => SortKey::Text(self.status.clone()),
      InvoiceField::Amount => SortKey::Number(self.amount),
      InvoiceField::Balance => SortKey::Number(self.balance),
      InvoiceField::Issued => SortKey::Date(parse_timestamp(&self.issued)),
      InvoiceField::Due => SortKey::Date(parse_timestamp(&self.due)),
    }
  }

  fn filter_value(&self, field: FilterField) -> Option<Cow<'_, str>> {
    match field {
      FilterField::Status => Some(Cow::Borrowed(self.status.as_str())),
      FilterField::ClientId => opt(&self.client_id),
      FilterField::Priority | FilterField::ServerId => None,
    }
  }
}

// ============================================================================
// Clients
// ============================================================================

impl SortField for ClientField {
  fn all() -> &'static [Self] {
    &[
      ClientField::Name,
      ClientField::Contact,
      ClientField::Status,
      ClientField::ActiveJobs,
      ClientField::Balance,
      ClientField::Created,
    ]
  }

  fn label(self) -> &'static str {
    match self {
      ClientField::Name => "Name",
      ClientField::Contact => "Contact",
      ClientField::Status => "Status",
      ClientField::ActiveJobs => "Active jobs",
      ClientField::Balance => "Balance",
      ClientField::Created => "Since",
    }
  }
}

impl Record for ClientRecord {
  type Wire = ApiClient;
  type Field = ClientField;
  const COLLECTION: &'static str = "clients";

  fn record_id(&self) -> &str {
    &self.id
  }

  fn search_fields(&self) -> Vec<Cow<'_, str>> {
    let mut fields: Vec<Cow<'_, str>> = vec![
      Cow::Borrowed(self.name.as_str()),
      Cow::Borrowed(self.status.as_str()),
    ];
    fields.extend(opt(&self.contact));
    fields.extend(opt(&self.email));
    fields.extend(opt(&self.phone));
    fields
  }

  fn sort_key(&self, field: ClientField) -> SortKey {
    match field {
      ClientField::Name => SortKey::Text(self.name.clone()),
      ClientField::Contact => SortKey::Text(self.contact.clone().unwrap_or_default()),
      ClientField::Status => SortKey::Text(self.status.clone()),
      ClientField::ActiveJobs => SortKey::Number(self.active_jobs.map(|n| n as f64)),
      ClientField::Balance => SortKey::Number(self.balance),
      ClientField::Created => SortKey::Date(parse_timestamp(&self.created)),
    }
  }

  fn filter_value(&self, field: FilterField) -> Option<Cow<'_, str>> {
    match field {
      FilterField::Status => Some(Cow::Borrowed(self.status.as_str())),
      FilterField::ClientId => Some(Cow::Borrowed(self.id.as_str())),
      FilterField::Priority | FilterField::ServerId => None,
    }
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::sync::{view, SortSpec};

  fn job(id: &str, recipient: &str, amount: Option<f64>) -> JobRecord {
    JobRecord {
      id: id.to_string(),
      job_number: format!("J-{}", id),
      status: "pending".to_string(),
      priority: None,
      recipient: recipient.to_string(),
      address: String::new(),
      client: "Acme Legal".to_string(),
      client_id: Some("7".to_string()),
      server: None,
      server_id: None,
      created: String::new(),
      due: String::new(),
      amount,
    }
  }

  #[test]
  fn test_job_search_covers_amount() {
    let jobs = vec![job("1", "Jane Doe", Some(95.0)), job("2", "John Smith", None)];
    let found = view(&jobs, "95.00", None);
    assert_eq!(found.len(), 1);
    assert_eq!(found[0].id, "1");

    let found = view(&jobs, "SMITH", None);
    assert_eq!(found[0].id, "2");
  }

  #[test]
  fn test_job_amount_sort_puts_missing_first() {
    let jobs = vec![
      job("1", "a", Some(200.0)),
      job("2", "b", None),
      job("3", "c", Some(50.0)),
    ];
    let sorted = view(&jobs, "", Some(SortSpec::ascending(JobField::Amount)));
    let ids: Vec<&str> = sorted.iter().map(|j| j.id.as_str()).collect();
    assert_eq!(ids, vec!["2", "3", "1"]);
  }

  #[test]
  fn test_filter_values() {
    let j = job("1", "a", None);
    assert_eq!(j.filter_value(FilterField::ClientId).as_deref(), Some("7"));
    assert_eq!(j.filter_value(FilterField::ServerId), None);
  }

  #[test]
  fn test_fields_have_labels() {
    assert_eq!(JobField::all().len(), 8);
    assert!(InvoiceField::all().iter().all(|f| !f.label().is_empty()));
    assert_eq!(ClientField::all()[0], ClientField::Name);
  }
}
