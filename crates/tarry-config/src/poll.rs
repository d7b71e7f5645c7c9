//! Poll timing settings.

use std::num::NonZeroUsize;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::error::ConfigError;

/// Retry interval used when none is configured.
pub const DEFAULT_INTERVAL_MS: u64 = 100;

/// How often to retry, how long to wait, and how many workers may poll at once.
///
/// Every field is optional so that settings from several sources can be
/// layered. Unset fields fall back to built-in defaults when read.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PollConfig {
  /// Pause between failed attempts, defaults to [`DEFAULT_INTERVAL_MS`]
  #[serde(skip_serializing_if = "Option::is_none")]
  pub interval_ms: Option<u64>,

  /// Maximum total wait; no limit when unset
  #[serde(skip_serializing_if = "Option::is_none")]
  pub timeout_ms: Option<u64>,

  /// Concurrency cap for group polls; unbounded when unset
  #[serde(skip_serializing_if = "Option::is_none")]
  pub max_workers: Option<usize>,
}

impl PollConfig {
  pub fn from_json(json: &str) -> Result<Self, ConfigError> {
    let config: Self = serde_json::from_str(json)?;
    config.validate()?;
    Ok(config)
  }

  pub fn interval(&self) -> Duration {
    Duration::from_millis(self.interval_ms.unwrap_or(DEFAULT_INTERVAL_MS))
  }

  pub fn timeout(&self) -> Option<Duration> {
    self.timeout_ms.map(Duration::from_millis)
  }

  pub fn max_workers(&self) -> Option<NonZeroUsize> {
    self.max_workers.and_then(NonZeroUsize::new)
  }

  /// Layer `overrides` on top of `self`. Fields set in `overrides` win.
  pub fn merge(self, overrides: PollConfig) -> Self {
    Self {
      interval_ms: overrides.interval_ms.or(self.interval_ms),
      timeout_ms: overrides.timeout_ms.or(self.timeout_ms),
      max_workers: overrides.max_workers.or(self.max_workers),
    }
  }

  pub fn validate(&self) -> Result<(), ConfigError> {
    if self.max_workers == Some(0) {
      return Err(ConfigError::ZeroMaxWorkers);
    }
    Ok(())
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn test_defaults() {
    let config = PollConfig::default();
    assert_eq!(config.interval(), Duration::from_millis(100));
    assert_eq!(config.timeout(), None);
    assert_eq!(config.max_workers(), None);
  }

  #[test]
  fn test_parse() {
    let config =
      PollConfig::from_json(r#"{"interval_ms": 250, "timeout_ms": 5000, "max_workers": 4}"#)
        .unwrap();
    assert_eq!(config.interval(), Duration::from_millis(250));
    assert_eq!(config.timeout(), Some(Duration::from_secs(5)));
    assert_eq!(config.max_workers(), NonZeroUsize::new(4));
  }

  #[test]
  fn test_parse_empty_object() {
    assert_eq!(PollConfig::from_json("{}").unwrap(), PollConfig::default());
  }

  #[test]
  fn test_rejects_zero_max_workers() {
    let err = PollConfig::from_json(r#"{"max_workers": 0}"#).unwrap_err();
    assert!(matches!(err, ConfigError::ZeroMaxWorkers));
  }

  #[test]
  fn test_merge_overrides_win_when_set() {
    let base = PollConfig {
      interval_ms: Some(50),
      timeout_ms: Some(1000),
      max_workers: None,
    };
    let overrides = PollConfig {
      interval_ms: None,
      timeout_ms: Some(2000),
      max_workers: Some(3),
    };

    let merged = base.merge(overrides);

    assert_eq!(merged.interval_ms, Some(50));
    assert_eq!(merged.timeout_ms, Some(2000));
    assert_eq!(merged.max_workers, Some(3));
  }

  #[test]
  fn test_serialize_skips_unset() {
    let json = serde_json::to_string(&PollConfig::default()).unwrap();
    assert_eq!(json, "{}");
  }
}
