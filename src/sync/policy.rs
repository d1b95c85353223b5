//! Retry policy applied to each adapter in the fallback chain.

use std::time::Duration;

/// Delay inserted before a retry.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Backoff {
  None,
  /// `step * retry_no` (1s, 2s, 3s for a 1s step)
  Linear { step: Duration },
}

impl Backoff {
  /// Delay before retry number `retry_no` (1-based)
  pub fn delay(&self, retry_no: u32) -> Duration {
    match self {
      Backoff::None => Duration::ZERO,
      Backoff::Linear { step } => step.saturating_mul(retry_no.max(1)),
    }
  }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
  /// Retries after the first attempt, for transient failures only
  pub max_retries: u32,
  pub backoff: Backoff,
  /// Hard limit on a single call
  pub timeout: Duration,
}

impl RetryPolicy {
  /// Live API: 15s timeout, three linear retries.
  pub fn primary() -> Self {
    Self {
      max_retries: 3,
      backoff: Backoff::Linear {
        step: Duration::from_secs(1),
      },
      timeout: Duration::from_secs(15),
    }
  }

  /// Secondary sources get a shorter timeout.
  pub fn secondary() -> Self {
    Self {
      timeout: Duration::from_secs(10),
      ..Self::primary()
    }
  }

  /// In-process sources never fail transiently.
  pub fn local() -> Self {
    Self {
      max_retries: 0,
      backoff: Backoff::None,
      timeout: Duration::from_secs(1),
    }
  }

  pub fn with_backoff(mut self, backoff: Backoff) -> Self {
    self.backoff = backoff;
    self
  }

  /// Delay before retry `retry_no`, or None once retries are exhausted.
  pub fn retry_delay(&self, retry_no: u32) -> Option<Duration> {
    if retry_no == 0 || retry_no > self.max_retries {
      return None;
    }
    Some(self.backoff.delay(retry_no))
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn test_linear_backoff() {
    let policy = RetryPolicy::primary();
    assert_eq!(policy.retry_delay(1), Some(Duration::from_secs(1)));
    assert_eq!(policy.retry_delay(2), Some(Duration::from_secs(2)));
    assert_eq!(policy.retry_delay(3), Some(Duration::from_secs(3)));
    assert_eq!(policy.retry_delay(4), None);
  }

  #[test]
  fn test_secondary_timeout() {
    assert_eq!(RetryPolicy::primary().timeout, Duration::from_secs(15));
    assert_eq!(RetryPolicy::secondary().timeout, Duration::from_secs(10));
    assert_eq!(RetryPolicy::secondary().max_retries, 3);
  }

  #[test]
  fn test_local_never_retries() {
    assert_eq!(RetryPolicy::local().retry_delay(1), None);
  }

  #[test]
  fn test_no_backoff() {
    let policy = RetryPolicy::primary().with_backoff(Backoff::None);
    assert_eq!(policy.retry_delay(2), Some(Duration::ZERO));
  }
}
