use color_eyre::{eyre::eyre, Result};
use futures::future::BoxFuture;
use futures::FutureExt;
use serde::Deserialize;
use std::marker::PhantomData;
use std::time::Instant;
use tracing::debug;
use url::Url;

use crate::sync::{DataSource, FetchRequest, RawPage, Record, SourceError, Window};

use super::api_types::{classify_http_error, decode_page};

/// How a deployment expects the window in the query string.
#[derive(Debug, Clone, Copy, Default, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum PageStyle {
  /// `offset` + `limit`
  #[default]
  Offset,
  /// 1-based `page` + `limit`
  Page,
}

impl PageStyle {
  pub fn params(self, window: Window) -> [(&'static str, u64); 2] {
    match self {
      PageStyle::Offset => [("offset", window.offset), ("limit", window.limit)],
      PageStyle::Page => [("page", window.page()), ("limit", window.limit)],
    }
  }
}

/// Case-management API client for one collection.
pub struct HttpSource<R> {
  name: String,
  client: reqwest::Client,
  endpoint: Url,
  style: PageStyle,
  token: Option<String>,
  _record: PhantomData<fn() -> R>,
}

impl<R: Record> HttpSource<R> {
  pub fn new(base: &Url, style: PageStyle, token: Option<String>) -> Result<Self> {
    let endpoint = collection_url(base, R::COLLECTION)?;
    let client = reqwest::Client::builder()
      .user_agent(concat!(env!("CARGO_PKG_NAME"), "/", env!("CARGO_PKG_VERSION")))
      .build()
      .map_err(|e| eyre!("Failed to create HTTP client: {}", e))?;

    Ok(Self {
      name: base.host_str().unwrap_or("upstream").to_string(),
      client,
      endpoint,
      style,
      token,
      _record: PhantomData,
    })
  }

  pub fn endpoint(&self) -> &Url {
    &self.endpoint
  }

  async fn get_page(&self, request: &FetchRequest) -> Result<RawPage<R>, SourceError> {
    let started = Instant::now();
    let mut req = self
      .client
      .get(self.endpoint.clone())
      .query(&self.style.params(request.window)[..])
      .query(&request.filters.pairs());
    if let Some(token) = &self.token {
      req = req.bearer_auth(token);
    }

    let response = req
      .send()
      .await
      .map_err(|e| SourceError::Transient(format!("request to {} failed: {}", self.name, e)))?;
    let status = response.status();
    let body = response
      .bytes()
      .await
      .map_err(|e| SourceError::Transient(format!("reading response from {}: {}", self.name, e)))?;

    debug!(
      endpoint = %self.endpoint,
      status = status.as_u16(),
      bytes = body.len(),
      "upstream response"
    );

    if !status.is_success() {
      return Err(classify_http_error(status.as_u16(), &body));
    }

    let mut page = decode_page::<R>(&body, request.window)?;
    if page.response_time_ms.is_none() {
      page.response_time_ms = Some(started.elapsed().as_millis() as u64);
    }
    Ok(page)
  }
}

impl<R: Record> DataSource<R> for HttpSource<R> {
  fn name(&self) -> &str {
    &self.name
  }

  fn fetch<'a>(&'a self, request: &'a FetchRequest) -> BoxFuture<'a, Result<RawPage<R>, SourceError>> {
    self.get_page(request).boxed()
  }
}

/// Append the collection to the base path, keeping any existing prefix.
fn collection_url(base: &Url, collection: &str) -> Result<Url> {
  let mut url = base.clone();
  url
    .path_segments_mut()
    .map_err(|_| eyre!("API url cannot be used as a base: {}", base))?
    .pop_if_empty()
    .push(collection);
  url.set_query(None);
  Ok(url)
}
