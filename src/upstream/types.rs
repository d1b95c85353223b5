/// A service-of-process job
#[derive(Debug, Clone, PartialEq)]
pub struct JobRecord {
  pub id: String,
  pub job_number: String,
  pub status: String,
  pub priority: Option<String>,
  /// Person or entity being served
  pub recipient: String,
  pub address: String,
  pub client: String,
  pub client_id: Option<String>,
  /// Assigned process server
  pub server: Option<String>,
  pub server_id: Option<String>,
  pub created: String,
  pub due: String,
  pub amount: Option<f64>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct InvoiceRecord {
  pub id: String,
  pub invoice_number: String,
  pub status: String,
  pub client: String,
  pub client_id: Option<String>,
  pub job_id: Option<String>,
  pub amount: Option<f64>,
  /// Amount still owed
  pub balance: Option<f64>,
  pub issued: String,
  pub due: String,
}

/// A law firm or other customer ordering jobs
#[derive(Debug, Clone, PartialEq)]
pub struct ClientRecord {
  pub id: String,
  pub name: String,
  pub contact: Option<String>,
  pub email: Option<String>,
  pub phone: Option<String>,
  pub status: String,
  pub active_jobs: Option<u64>,
  pub balance: Option<f64>,
  pub created: String,
}

/// Sortable job columns
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum JobField {
  JobNumber,
  Recipient,
  Client,
  Status,
  Priority,
  Created,
  Due,
  Amount,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InvoiceField {
  Number,
  Client,
  Status,
  Amount,
  Balance,
  Issued,
  Due,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ClientField {
  Name,
  Contact,
  Status,
  ActiveJobs,
  Balance,
  Created,
}
