//! Ordered list of data sources tried in turn.

use std::sync::Arc;

use super::policy::RetryPolicy;
use super::source::DataSource;
use super::traits::{Record, SourceKind};

/// One adapter in the chain, with its own retry policy.
pub struct ChainLink<R: Record> {
  /// Lower values are tried first
  pub priority: u8,
  pub kind: SourceKind,
  pub source: Arc<dyn DataSource<R>>,
  pub policy: RetryPolicy,
}

impl<R: Record> Clone for ChainLink<R> {
  fn clone(&self) -> Self {
    Self {
      priority: self.priority,
      kind: self.kind,
      source: Arc::clone(&self.source),
      policy: self.policy,
    }
  }
}

/// Fallback chain, always kept sorted by priority.
pub struct FallbackChain<R: Record> {
  links: Vec<ChainLink<R>>,
}

impl<R: Record> FallbackChain<R> {
  pub fn new() -> Self {
    Self { links: Vec::new() }
  }

  /// Add a source. Links with equal priority keep insertion order.
  pub fn with_source(
    mut self,
    priority: u8,
    kind: SourceKind,
    source: Arc<dyn DataSource<R>>,
    policy: RetryPolicy,
  ) -> Self {
    self.links.push(ChainLink {
      priority,
      kind,
      source,
      policy,
    });
    self.links.sort_by_key(|link| link.priority);
    self
  }

  pub fn links(&self) -> &[ChainLink<R>] {
    &self.links
  }

  /// The highest-priority source, polled by the freshness monitor
  pub fn primary(&self) -> Option<&ChainLink<R>> {
    self.links.first()
  }

  pub fn is_empty(&self) -> bool {
    self.links.is_empty()
  }

  /// Names in chain order, for logs
  pub fn describe(&self) -> String {
    self
      .links
      .iter()
      .map(|link| format!("{}({})", link.kind, link.source.name()))
      .collect::<Vec<_>>()
      .join(" -> ")
  }
}

impl<R: Record> Default for FallbackChain<R> {
  fn default() -> Self {
    Self::new()
  }
}

impl<R: Record> Clone for FallbackChain<R> {
  fn clone(&self) -> Self {
    Self {
      links: self.links.clone(),
    }
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::sync::testing::{ScriptedSource, Step, TestRecord};

  #[test]
  fn test_links_sorted_by_priority() {
    let chain: FallbackChain<TestRecord> = FallbackChain::new()
      .with_source(
        2,
        SourceKind::Sample,
        ScriptedSource::new("sample", Step::Total(1)).arc(),
        RetryPolicy::local(),
      )
      .with_source(
        0,
        SourceKind::Primary,
        ScriptedSource::new("live", Step::Total(1)).arc(),
        RetryPolicy::primary(),
      )
      .with_source(
        1,
        SourceKind::Legacy,
        ScriptedSource::new("old", Step::Total(1)).arc(),
        RetryPolicy::secondary(),
      );

    let kinds: Vec<SourceKind> = chain.links().iter().map(|l| l.kind).collect();
    assert_eq!(
      kinds,
      vec![SourceKind::Primary, SourceKind::Legacy, SourceKind::Sample]
    );
    assert_eq!(chain.primary().map(|l| l.kind), Some(SourceKind::Primary));
    assert_eq!(
      chain.describe(),
      "primary(live) -> legacy(old) -> sample(sample)"
    );
  }

  #[test]
  fn test_empty_chain() {
    let chain: FallbackChain<TestRecord> = FallbackChain::default();
    assert!(chain.is_empty());
    assert!(chain.primary().is_none());
  }
}
