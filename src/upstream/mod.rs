pub mod api_types;
pub mod client;
mod records;
pub mod sample;
pub mod types;

use color_eyre::{eyre::eyre, Result};
use std::sync::Arc;
use tracing::info;

use crate::config::Config;
use crate::sync::{FallbackChain, Record, RetryPolicy, SourceKind};

pub use client::{HttpSource, PageStyle};
pub use sample::SampleSource;
pub use types::{ClientRecord, InvoiceRecord, JobRecord};

/// Assemble the fallback chain for one collection: live API, then the legacy
/// deployment if configured, then bundled sample data.
pub fn build_chain<R: Record>(config: &Config, sample_only: bool) -> Result<FallbackChain<R>> {
  let mut chain = FallbackChain::new();

  if !sample_only {
    if let Some(api) = &config.api {
      let token = Config::api_token();
      let primary = HttpSource::<R>::new(&api.url()?, api.page_style, token.clone())?;
      chain = chain.with_source(0, SourceKind::Primary, Arc::new(primary), RetryPolicy::primary());

      if let Some(legacy_url) = api.legacy_url()? {
        let legacy = HttpSource::<R>::new(&legacy_url, api.legacy_page_style, token)?;
        chain = chain.with_source(1, SourceKind::Legacy, Arc::new(legacy), RetryPolicy::secondary());
      }
    }
  }

  if sample_only || config.sample_fallback || chain.is_empty() {
    let sample = SampleSource::<R>::bundled()
      .map_err(|e| eyre!("Failed to load sample {}: {}", R::COLLECTION, e))?;
    info!(collection = R::COLLECTION, records = sample.len(), "sample data loaded");
    chain = chain.with_source(2, SourceKind::Sample, Arc::new(sample), RetryPolicy::local());
  }

  info!(collection = R::COLLECTION, chain = %chain.describe(), "data sources ready");
  Ok(chain)
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::config::ApiConfig;

  fn config(legacy: bool, sample_fallback: bool) -> Config {
    Config {
      api: Some(ApiConfig {
        url: "https://cases.example.com/api".to_string(),
        page_style: PageStyle::Offset,
        legacy_url: legacy.then(|| "https://old.example.com/".to_string()),
        legacy_page_style: PageStyle::Page,
      }),
      sample_fallback,
      ..Config::default()
    }
  }

  fn kinds<R: Record>(chain: &FallbackChain<R>) -> Vec<SourceKind> {
    chain.links().iter().map(|l| l.kind).collect()
  }

  #[test]
  fn test_full_chain_order() {
    let chain = build_chain::<JobRecord>(&config(true, true), false).unwrap();
    assert_eq!(
      kinds(&chain),
      vec![SourceKind::Primary, SourceKind::Legacy, SourceKind::Sample]
    );
    assert_eq!(chain.links()[1].policy, RetryPolicy::secondary());
  }

  #[test]
  fn test_without_sample_fallback() {
    let chain = build_chain::<InvoiceRecord>(&config(false, false), false).unwrap();
    assert_eq!(kinds(&chain), vec![SourceKind::Primary]);
  }

  #[test]
  fn test_sample_only() {
    let chain = build_chain::<ClientRecord>(&config(true, false), true).unwrap();
    assert_eq!(kinds(&chain), vec![SourceKind::Sample]);
  }

  #[test]
  fn test_no_api_falls_back_to_samples() {
    let chain = build_chain::<JobRecord>(&Config::default(), false).unwrap();
    assert_eq!(kinds(&chain), vec![SourceKind::Sample]);
  }
}
