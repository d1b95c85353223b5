//! Static sample data, the last link of every fallback chain.

use futures::future::{self, BoxFuture};
use futures::FutureExt;

use crate::sync::{DataSource, FetchRequest, Filters, RawPage, Record, SourceError, Window};

use super::api_types::decode_page;

fn bundled_json(collection: &str) -> Option<&'static str> {
  match collection {
    "jobs" => Some(include_str!("samples/jobs.json")),
    "invoices" => Some(include_str!("samples/invoices.json")),
    "clients" => Some(include_str!("samples/clients.json")),
    _ => None,
  }
}

/// In-memory source. Filters and the window are applied locally and every
/// page is flagged as mock data.
pub struct SampleSource<R> {
  records: Vec<R>,
}

impl<R: Record> SampleSource<R> {
  pub fn new(records: Vec<R>) -> Self {
    Self { records }
  }

  /// Sample records shipped with the binary, decoded like a live response.
  pub fn bundled() -> Result<Self, SourceError> {
    let body = bundled_json(R::COLLECTION).ok_or_else(|| {
      SourceError::NoData(format!("no sample data for {}", R::COLLECTION))
    })?;
    let page = decode_page::<R>(body.as_bytes(), Window::new(0, u64::MAX))?;
    Ok(Self::new(page.records))
  }

  pub fn len(&self) -> usize {
    self.records.len()
  }

  fn select(&self, request: &FetchRequest) -> RawPage<R> {
    let matched: Vec<&R> = self
      .records
      .iter()
      .filter(|r| matches_filters(*r, &request.filters))
      .collect();
    let total = matched.len() as u64;
    let offset = usize::try_from(request.window.offset).unwrap_or(usize::MAX);
    let limit = usize::try_from(request.window.limit).unwrap_or(usize::MAX);

    RawPage {
      records: matched.into_iter().skip(offset).take(limit).cloned().collect(),
      total,
      mock: true,
      response_time_ms: Some(0),
    }
  }
}

/// Filters a record doesn't carry don't exclude it.
fn matches_filters<R: Record>(record: &R, filters: &Filters) -> bool {
  filters
    .active()
    .into_iter()
    .all(|(field, wanted)| match record.filter_value(field) {
      Some(value) => value.trim().eq_ignore_ascii_case(wanted),
      None => true,
    })
}

impl<R: Record> DataSource<R> for SampleSource<R> {
  fn name(&self) -> &str {
    "sample"
  }

  fn fetch<'a>(&'a self, request: &'a FetchRequest) -> BoxFuture<'a, Result<RawPage<R>, SourceError>> {
    future::ready(Ok(self.select(request))).boxed()
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::sync::FilterField;
  use crate::upstream::types::{ClientRecord, InvoiceRecord, JobRecord};

  fn request(offset: u64, limit: u64, filters: Filters) -> FetchRequest {
    FetchRequest::new(Window::new(offset, limit), filters)
  }

  #[test]
  fn test_bundled_data_decodes() {
    let jobs = SampleSource::<JobRecord>::bundled().unwrap();
    assert_eq!(jobs.len(), 12);
    assert!(jobs.records.iter().all(|j| !j.recipient.is_empty()));
    assert!(jobs.records.iter().all(|j| !j.address.is_empty()));

    assert_eq!(SampleSource::<InvoiceRecord>::bundled().unwrap().len(), 8);
    assert_eq!(SampleSource::<ClientRecord>::bundled().unwrap().len(), 6);
  }

  #[tokio::test]
  async fn test_window_and_total() {
    let jobs = SampleSource::<JobRecord>::bundled().unwrap();
    let page = jobs.fetch(&request(10, 5, Filters::default())).await.unwrap();
    assert_eq!(page.total, 12);
    assert_eq!(page.records.len(), 2);
    assert!(page.mock);

    let past_end = jobs.fetch(&request(50, 5, Filters::default())).await.unwrap();
    assert!(past_end.records.is_empty());
    assert_eq!(past_end.total, 12);
  }

  #[tokio::test]
  async fn test_filters_apply_locally() {
    let jobs = SampleSource::<JobRecord>::bundled().unwrap();
    let mut filters = Filters::default();
    filters.set(FilterField::Status, Some("SERVED".to_string()));

    let page = jobs.fetch(&request(0, 2, filters.clone())).await.unwrap();
    assert_eq!(page.total, 4);
    assert_eq!(page.records.len(), 2);
    assert!(page.records.iter().all(|j| j.status == "served"));

    filters.set(FilterField::Status, None);
    filters.set(FilterField::ClientId, Some("1".to_string()));
    let page = jobs.fetch(&request(0, 50, filters)).await.unwrap();
    let ids: Vec<&str> = page.records.iter().map(|j| j.id.as_str()).collect();
    assert_eq!(ids, vec!["1001", "1004", "1011"]);
  }

  #[tokio::test]
  async fn test_inapplicable_filter_keeps_records() {
    let invoices = SampleSource::<InvoiceRecord>::bundled().unwrap();
    let mut filters = Filters::default();
    filters.set(FilterField::ServerId, Some("31".to_string()));
    let page = invoices.fetch(&request(0, 50, filters)).await.unwrap();
    assert_eq!(page.total, 8);
  }
}
