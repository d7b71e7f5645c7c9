use thiserror::Error;

#[derive(Debug, Error)]
pub enum ConfigError {
  #[error("failed to parse configuration: {0}")]
  Parse(#[from] serde_json::Error),

  #[error("plan has no probes")]
  NoProbes,

  #[error("duplicate probe name: {0}")]
  DuplicateProbe(String),

  #[error("probe {name} has an empty command")]
  EmptyCommand { name: String },

  #[error("mode `once` takes exactly one probe, got {count}")]
  OnceWithMany { count: usize },

  #[error("max_workers must be at least 1")]
  ZeroMaxWorkers,
}
