//! Serde-deserializable types matching the case-management API responses.
//!
//! The upstream has renamed fields over the years and different deployments
//! still send different spellings, so most wire fields are optional and the
//! domain value is resolved from the first non-empty alias.

use serde::Deserialize;
use serde_json::Value;

use crate::sync::{RawPage, Record, SourceError, Window};

use super::types::{ClientRecord, InvoiceRecord, JobRecord};

// ============================================================================
// Flexible scalars
// ============================================================================

/// A value the upstream sends as either a string or a number.
#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
pub enum ApiScalar {
  Text(String),
  Number(serde_json::Number),
  Bool(bool),
}

impl ApiScalar {
  pub fn into_text(self) -> String {
    match self {
      ApiScalar::Text(s) => s,
      ApiScalar::Number(n) => n.to_string(),
      ApiScalar::Bool(b) => b.to_string(),
    }
  }

  pub fn as_f64(&self) -> Option<f64> {
    match self {
      ApiScalar::Number(n) => n.as_f64(),
      ApiScalar::Text(s) => s.trim().trim_start_matches('$').replace(',', "").parse().ok(),
      ApiScalar::Bool(_) => None,
    }
  }

  pub fn as_u64(&self) -> Option<u64> {
    match self {
      ApiScalar::Number(n) => n.as_u64(),
      ApiScalar::Text(s) => s.trim().parse().ok(),
      ApiScalar::Bool(_) => None,
    }
  }
}

fn text(value: Option<ApiScalar>) -> Option<String> {
  value.map(ApiScalar::into_text)
}

/// First value that isn't empty after trimming.
pub fn first_non_empty<I>(values: I) -> Option<String>
where
  I: IntoIterator<Item = Option<String>>,
{
  values
    .into_iter()
    .flatten()
    .map(|v| v.trim().to_string())
    .find(|v| !v.is_empty())
}

fn join_name(first: Option<String>, last: Option<String>) -> Option<String> {
  let joined = [first, last]
    .into_iter()
    .flatten()
    .map(|s| s.trim().to_string())
    .filter(|s| !s.is_empty())
    .collect::<Vec<_>>()
    .join(" ");
  (!joined.is_empty()).then_some(joined)
}

// ============================================================================
// Common nested field types
// ============================================================================

/// A person or organization, nested or referenced.
#[derive(Debug, Default, Deserialize)]
pub struct ApiParty {
  pub id: Option<ApiScalar>,
  pub name: Option<String>,
  pub full_name: Option<String>,
  pub first_name: Option<String>,
  pub last_name: Option<String>,
  pub company_name: Option<String>,
}

impl ApiParty {
  fn display_name(self) -> Option<String> {
    let joined = join_name(self.first_name, self.last_name);
    first_non_empty([self.name, self.full_name, joined, self.company_name])
  }
}

#[derive(Debug, Default, Deserialize)]
pub struct ApiAddress {
  pub full: Option<String>,
  pub formatted: Option<String>,
  pub street: Option<String>,
  pub address1: Option<String>,
  pub line1: Option<String>,
  pub city: Option<String>,
  pub state: Option<String>,
  pub zip: Option<String>,
  pub postal_code: Option<String>,
}

impl ApiAddress {
  fn display(self) -> Option<String> {
    if let Some(full) = first_non_empty([self.full, self.formatted]) {
      return Some(full);
    }
    let street = first_non_empty([self.street, self.address1, self.line1]);
    let zip = first_non_empty([self.zip, self.postal_code]);
    let region = [self.state, zip]
      .into_iter()
      .flatten()
      .filter(|s| !s.trim().is_empty())
      .collect::<Vec<_>>()
      .join(" ");
    let parts: Vec<String> = [street, self.city, Some(region)]
      .into_iter()
      .flatten()
      .map(|s| s.trim().to_string())
      .filter(|s| !s.is_empty())
      .collect();
    (!parts.is_empty()).then(|| parts.join(", "))
  }
}

// ============================================================================
// Jobs
// ============================================================================

#[derive(Debug, Deserialize)]
pub struct ApiJob {
  pub id: Option<ApiScalar>,
  pub job_id: Option<ApiScalar>,
  pub job_number: Option<ApiScalar>,
  pub case_number: Option<String>,
  pub status: Option<String>,
  pub priority: Option<String>,
  pub recipient: Option<ApiParty>,
  pub recipient_name: Option<String>,
  pub servee_name: Option<String>,
  pub defendant_name: Option<String>,
  pub service_address: Option<String>,
  pub address: Option<ApiAddress>,
  #[serde(default)]
  pub addresses: Vec<ApiAddress>,
  pub client: Option<ApiParty>,
  pub client_name: Option<String>,
  pub client_id: Option<ApiScalar>,
  pub server: Option<ApiParty>,
  pub server_name: Option<String>,
  pub server_id: Option<ApiScalar>,
  pub created_at: Option<String>,
  pub created: Option<String>,
  pub date_created: Option<String>,
  pub due_date: Option<String>,
  pub deadline: Option<String>,
  pub amount: Option<ApiScalar>,
  pub price: Option<ApiScalar>,
  pub fee: Option<ApiScalar>,
}

impl From<ApiJob> for JobRecord {
  fn from(job: ApiJob) -> Self {
    let id = first_non_empty([text(job.id), text(job.job_id)]).unwrap_or_default();
    let job_number =
      first_non_empty([text(job.job_number), job.case_number]).unwrap_or_else(|| id.clone());

    let (recipient_nested, _) = split_party(job.recipient);
    let recipient = first_non_empty([
      recipient_nested,
      job.recipient_name,
      job.servee_name,
      job.defendant_name,
    ])
    .unwrap_or_default();

    let address = first_non_empty([
      job.service_address,
      job.address.and_then(ApiAddress::display),
      job.addresses.into_iter().next().and_then(ApiAddress::display),
    ])
    .unwrap_or_default();

    let (client_nested, client_nested_id) = split_party(job.client);
    let (server_nested, server_nested_id) = split_party(job.server);

    JobRecord {
      id,
      job_number,
      status: job.status.unwrap_or_default(),
      priority: first_non_empty([job.priority]),
      recipient,
      address,
      client: first_non_empty([client_nested, job.client_name]).unwrap_or_default(),
      client_id: first_non_empty([text(job.client_id), client_nested_id]),
      server: first_non_empty([server_nested, job.server_name]),
      server_id: first_non_empty([text(job.server_id), server_nested_id]),
      created: first_non_empty([job.created_at, job.created, job.date_created]).unwrap_or_default(),
      due: first_non_empty([job.due_date, job.deadline]).unwrap_or_default(),
      amount: [job.amount, job.price, job.fee]
        .iter()
        .flatten()
        .find_map(ApiScalar::as_f64),
    }
  }
}

/// Split a nested party into (display name, id).
fn split_party(party: Option<ApiParty>) -> (Option<String>, Option<String>) {
  match party {
    Some(mut party) => {
      let id = text(party.id.take());
      (party.display_name(), id)
    }
    None => (None, None),
  }
}

// ============================================================================
// Invoices
// ============================================================================

#[derive(Debug, Deserialize)]
pub struct ApiInvoice {
  pub id: Option<ApiScalar>,
  pub invoice_id: Option<ApiScalar>,
  pub invoice_number: Option<ApiScalar>,
  pub number: Option<ApiScalar>,
  pub status: Option<String>,
  pub client: Option<ApiParty>,
  pub client_name: Option<String>,
  pub client_id: Option<ApiScalar>,
  pub job_id: Option<ApiScalar>,
  pub total: Option<ApiScalar>,
  pub amount: Option<ApiScalar>,
  pub balance: Option<ApiScalar>,
  pub amount_due: Option<ApiScalar>,
  pub issued_at: Option<String>,
  pub invoice_date: Option<String>,
  pub created_at: Option<String>,
  pub due_date: Option<String>,
}

impl From<ApiInvoice> for InvoiceRecord {
  fn from(invoice: ApiInvoice) -> Self {
    let id = first_non_empty([text(invoice.id), text(invoice.invoice_id)]).unwrap_or_default();
    let (client_nested, client_nested_id) = split_party(invoice.client);

    InvoiceRecord {
      invoice_number: first_non_empty([text(invoice.invoice_number), text(invoice.number)])
        .unwrap_or_else(|| id.clone()),
      id,
      status: invoice.status.unwrap_or_default(),
      client: first_non_empty([client_nested, invoice.client_name]).unwrap_or_default(),
      client_id: first_non_empty([text(invoice.client_id), client_nested_id]),
      job_id: first_non_empty([text(invoice.job_id)]),
      amount: [invoice.total, invoice.amount]
        .iter()
        .flatten()
        .find_map(ApiScalar::as_f64),
      balance: [invoice.balance, invoice.amount_due]
        .iter()
        .flatten()
        .find_map(ApiScalar::as_f64),
      issued: first_non_empty([invoice.issued_at, invoice.invoice_date, invoice.created_at])
        .unwrap_or_default(),
      due: invoice.due_date.unwrap_or_default(),
    }
  }
}

// ============================================================================
// Clients
// ============================================================================

#[derive(Debug, Deserialize)]
pub struct ApiClient {
  pub id: Option<ApiScalar>,
  pub client_id: Option<ApiScalar>,
  pub name: Option<String>,
  pub company_name: Option<String>,
  pub business_name: Option<String>,
  pub contact: Option<ApiParty>,
  pub contact_name: Option<String>,
  pub email: Option<String>,
  pub contact_email: Option<String>,
  pub phone: Option<String>,
  pub phone_number: Option<String>,
  pub status: Option<String>,
  pub active_jobs: Option<ApiScalar>,
  pub open_jobs: Option<ApiScalar>,
  pub balance: Option<ApiScalar>,
  pub outstanding_balance: Option<ApiScalar>,
  pub created_at: Option<String>,
  pub created: Option<String>,
}

impl From<ApiClient> for ClientRecord {
  fn from(client: ApiClient) -> Self {
    let (contact_nested, _) = split_party(client.contact);
    ClientRecord {
      id: first_non_empty([text(client.id), text(client.client_id)]).unwrap_or_default(),
      name: first_non_empty([client.name, client.company_name, client.business_name])
        .unwrap_or_default(),
      contact: first_non_empty([contact_nested, client.contact_name]),
      email: first_non_empty([client.email, client.contact_email]),
      phone: first_non_empty([client.phone, client.phone_number]),
      status: client.status.unwrap_or_default(),
      active_jobs: [client.active_jobs, client.open_jobs]
        .iter()
        .flatten()
        .find_map(ApiScalar::as_u64),
      balance: [client.balance, client.outstanding_balance]
        .iter()
        .flatten()
        .find_map(ApiScalar::as_f64),
      created: first_non_empty([client.created_at, client.created]).unwrap_or_default(),
    }
  }
}

// ============================================================================
// List envelope
// ============================================================================

/// Decode a list response `{ <collection>: [...], total, mock?, error?, response_time_ms? }`.
///
/// - body that isn't JSON: transient (proxies and gateways send HTML on hiccups)
/// - `error` set: the source has no data to serve
/// - collection array missing, or an element that doesn't decode: structural
/// - `total` missing: `offset + records.len()`
pub fn decode_page<R: Record>(body: &[u8], window: Window) -> Result<RawPage<R>, SourceError> {
  let value: Value = serde_json::from_slice(body)
    .map_err(|e| SourceError::Transient(format!("response was not JSON: {}", e)))?;
  decode_envelope(value, window)
}

pub fn decode_envelope<R: Record>(value: Value, window: Window) -> Result<RawPage<R>, SourceError> {
  let Value::Object(mut envelope) = value else {
    return Err(SourceError::Structural(
      "response is not a JSON object".to_string(),
    ));
  };

  if let Some(message) = envelope.get("error").and_then(error_message) {
    return Err(SourceError::NoData(message));
  }

  let Some(Value::Array(items)) = envelope.remove(R::COLLECTION) else {
    return Err(SourceError::Structural(format!(
      "response is missing the `{}` array",
      R::COLLECTION
    )));
  };

  let records = items
    .into_iter()
    .enumerate()
    .map(|(i, item)| {
      serde_json::from_value::<R::Wire>(item)
        .map(Into::into)
        .map_err(|e| {
          SourceError::Structural(format!("malformed {} record at index {}: {}", R::COLLECTION, i, e))
        })
    })
    .collect::<Result<Vec<R>, _>>()?;

  let total = envelope
    .get("total")
    .and_then(|v| v.as_u64().or_else(|| v.as_str().and_then(|s| s.trim().parse().ok())))
    .unwrap_or(window.offset + records.len() as u64);

  Ok(RawPage {
    records,
    total,
    mock: envelope.get("mock").and_then(Value::as_bool).unwrap_or(false),
    response_time_ms: envelope.get("response_time_ms").and_then(Value::as_u64),
  })
}

/// Message carried by an `error` field, if it signals a failure.
fn error_message(value: &Value) -> Option<String> {
  match value {
    Value::Null | Value::Bool(false) => None,
    Value::String(s) if s.trim().is_empty() => None,
    Value::String(s) => Some(s.clone()),
    Value::Object(obj) => Some(
      obj
        .get("message")
        .and_then(Value::as_str)
        .map(str::to_string)
        .unwrap_or_else(|| value.to_string()),
    ),
    other => Some(other.to_string()),
  }
}

/// Classify a non-success HTTP response.
///
/// A JSON body means the upstream answered deliberately, so the call won't
/// improve on retry. Anything else is treated as a transport hiccup.
pub fn classify_http_error(status: u16, body: &[u8]) -> SourceError {
  match serde_json::from_slice::<Value>(body) {
    Ok(value) => {
      let detail = ["error", "message", "detail"]
        .iter()
        .find_map(|k| value.get(*k).and_then(error_message))
        .unwrap_or_else(|| "request rejected".to_string());
      SourceError::Structural(format!("HTTP {}: {}", status, detail))
    }
    Err(_) => SourceError::Transient(format!("HTTP {} with unreadable body", status)),
  }
}
