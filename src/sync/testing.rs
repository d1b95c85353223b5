//! Test doubles for the sync layer.

use futures::future::BoxFuture;
use futures::FutureExt;
use serde::Deserialize;
use std::borrow::Cow;
use std::collections::VecDeque;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use super::pagination::FilterField;
use super::source::{DataSource, FetchRequest, RawPage, SourceError};
use super::traits::{Record, SortField, SortKey};
use super::view::parse_timestamp;

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct TestRecord {
  pub id: String,
  pub name: String,
  pub status: String,
  #[serde(default)]
  pub created: String,
  #[serde(default)]
  pub amount: Option<f64>,
}

impl TestRecord {
  pub fn new(id: &str, name: &str, status: &str) -> Self {
    Self {
      id: id.to_string(),
      name: name.to_string(),
      status: status.to_string(),
      created: String::new(),
      amount: None,
    }
  }

  pub fn created(mut self, created: &str) -> Self {
    self.created = created.to_string();
    self
  }

  pub fn amount(mut self, amount: f64) -> Self {
    self.amount = Some(amount);
    self
  }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TestField {
  Name,
  Status,
  Created,
  Amount,
}

impl SortField for TestField {
  fn all() -> &'static [Self] {
    &[
      TestField::Name,
      TestField::Status,
      TestField::Created,
      TestField::Amount,
    ]
  }

  fn label(self) -> &'static str {
    match self {
      TestField::Name => "Name",
      TestField::Status => "Status",
      TestField::Created => "Created",
      TestField::Amount => "Amount",
    }
  }
}

impl Record for TestRecord {
  type Wire = TestRecord;
  type Field = TestField;
  const COLLECTION: &'static str = "tests";

  fn record_id(&self) -> &str {
    &self.id
  }

  fn search_fields(&self) -> Vec<Cow<'_, str>> {
    let mut fields = vec![
      Cow::Borrowed(self.id.as_str()),
      Cow::Borrowed(self.name.as_str()),
      Cow::Borrowed(self.status.as_str()),
    ];
    if let Some(amount) = self.amount {
      fields.push(Cow::Owned(format!("{:.2}", amount)));
    }
    fields
  }

  fn sort_key(&self, field: TestField) -> SortKey {
    match field {
      TestField::Name => SortKey::Text(self.name.clone()),
      TestField::Status => SortKey::Text(self.status.clone()),
      TestField::Created => SortKey::Date(parse_timestamp(&self.created)),
      TestField::Amount => SortKey::Number(self.amount),
    }
  }

  fn filter_value(&self, field: FilterField) -> Option<Cow<'_, str>> {
    match field {
      FilterField::Status => Some(Cow::Borrowed(self.status.as_str())),
      _ => None,
    }
  }
}

/// Build `total` records and return the slice covered by `request`.
pub fn page_for(request: &FetchRequest, total: u64) -> RawPage<TestRecord> {
  let start = request.window.offset.min(total);
  let end = (request.window.offset + request.window.limit).min(total);
  let records = (start..end)
    .map(|i| TestRecord::new(&i.to_string(), &format!("record {}", i), "open"))
    .collect();
  RawPage {
    records,
    total,
    mock: false,
    response_time_ms: None,
  }
}

/// What a scripted call does.
#[derive(Debug, Clone)]
pub enum Step {
  /// Return a page with the given collection total
  Total(u64),
  Fail(SourceError),
  /// Never complete
  Hang,
  /// Wait, then run the inner step
  Delayed(Duration, Box<Step>),
}

impl Step {
  pub fn delayed(delay: Duration, step: Step) -> Self {
    Step::Delayed(delay, Box::new(step))
  }
}

/// Data source that plays back a script of outcomes and counts calls.
pub struct ScriptedSource {
  name: String,
  script: Mutex<VecDeque<Step>>,
  otherwise: Step,
  calls: AtomicUsize,
  requests: Mutex<Vec<FetchRequest>>,
}

impl ScriptedSource {
  pub fn new(name: &str, otherwise: Step) -> Self {
    Self {
      name: name.to_string(),
      script: Mutex::new(VecDeque::new()),
      otherwise,
      calls: AtomicUsize::new(0),
      requests: Mutex::new(Vec::new()),
    }
  }

  /// Queue a one-off step ahead of the default
  pub fn then(self, step: Step) -> Self {
    self.script.lock().unwrap().push_back(step);
    self
  }

  /// Replace the default step for all later calls
  pub fn set_otherwise(&mut self, step: Step) {
    self.otherwise = step;
  }

  pub fn arc(self) -> Arc<Self> {
    Arc::new(self)
  }

  pub fn calls(&self) -> usize {
    self.calls.load(Ordering::SeqCst)
  }

  pub fn requests(&self) -> Vec<FetchRequest> {
    self.requests.lock().unwrap().clone()
  }

  fn next_step(&self) -> Step {
    self
      .script
      .lock()
      .unwrap()
      .pop_front()
      .unwrap_or_else(|| self.otherwise.clone())
  }
}

fn run_step(
  step: Step,
  request: FetchRequest,
) -> BoxFuture<'static, Result<RawPage<TestRecord>, SourceError>> {
  async move {
    match step {
      Step::Total(total) => Ok(page_for(&request, total)),
      Step::Fail(err) => Err(err),
      Step::Hang => futures::future::pending().await,
      Step::Delayed(delay, inner) => {
        tokio::time::sleep(delay).await;
        run_step(*inner, request).await
      }
    }
  }
  .boxed()
}

impl DataSource<TestRecord> for ScriptedSource {
  fn name(&self) -> &str {
    &self.name
  }

  fn fetch<'a>(
    &'a self,
    request: &'a FetchRequest,
  ) -> BoxFuture<'a, Result<RawPage<TestRecord>, SourceError>> {
    self.calls.fetch_add(1, Ordering::SeqCst);
    self.requests.lock().unwrap().push(request.clone());
    run_step(self.next_step(), request.clone())
  }
}

/// Lets a test change a source's default step after it's shared.
pub struct SwitchableSource {
  inner: Mutex<ScriptedSource>,
}

impl SwitchableSource {
  pub fn new(source: ScriptedSource) -> Arc<Self> {
    Arc::new(Self {
      inner: Mutex::new(source),
    })
  }

  pub fn switch(&self, step: Step) {
    self.inner.lock().unwrap().set_otherwise(step);
  }

  pub fn calls(&self) -> usize {
    self.inner.lock().unwrap().calls()
  }

  pub fn requests(&self) -> Vec<FetchRequest> {
    self.inner.lock().unwrap().requests()
  }
}

impl DataSource<TestRecord> for SwitchableSource {
  fn name(&self) -> &str {
    "switchable"
  }

  fn fetch<'a>(
    &'a self,
    request: &'a FetchRequest,
  ) -> BoxFuture<'a, Result<RawPage<TestRecord>, SourceError>> {
    let inner = self.inner.lock().unwrap();
    inner.calls.fetch_add(1, Ordering::SeqCst);
    inner.requests.lock().unwrap().push(request.clone());
    run_step(inner.next_step(), request.clone())
  }
}
