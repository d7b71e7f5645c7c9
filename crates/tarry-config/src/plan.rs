//! Wait plans.
//!
//! A plan names a set of probes and a [`WaitMode`]:
//!
//! ```json
//! {
//!   "mode": "all",
//!   "timeout_ms": 30000,
//!   "interval_ms": 500,
//!   "probes": [
//!     { "name": "db", "command": "pg_isready", "args": ["-h", "localhost"] },
//!     { "name": "api", "command": "curl", "args": ["-sf", "http://localhost:8080/health"] }
//!   ]
//! }
//! ```

use std::collections::HashSet;

use serde::{Deserialize, Serialize};

use crate::error::ConfigError;
use crate::poll::PollConfig;
use crate::probe::ProbeDef;

/// How a plan's probes are waited on.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum WaitMode {
  /// Poll a single probe
  Once,
  /// Poll every probe and report each outcome
  #[default]
  All,
  /// Poll every probe and stop at the first success
  First,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PlanDef {
  #[serde(flatten)]
  pub poll: PollConfig,
  #[serde(default)]
  pub mode: WaitMode,
  pub probes: Vec<ProbeDef>,
}

impl PlanDef {
  /// Parse and validate a plan.
  pub fn from_json(json: &str) -> Result<Self, ConfigError> {
    let plan: Self = serde_json::from_str(json)?;
    plan.validate()?;
    Ok(plan)
  }

  pub fn validate(&self) -> Result<(), ConfigError> {
    self.poll.validate()?;

    if self.probes.is_empty() {
      return Err(ConfigError::NoProbes);
    }
    if self.mode == WaitMode::Once && self.probes.len() > 1 {
      return Err(ConfigError::OnceWithMany {
        count: self.probes.len(),
      });
    }

    let mut seen = HashSet::new();
    for probe in &self.probes {
      if probe.command.trim().is_empty() {
        return Err(ConfigError::EmptyCommand {
          name: probe.name.clone(),
        });
      }
      if !seen.insert(probe.name.as_str()) {
        return Err(ConfigError::DuplicateProbe(probe.name.clone()));
      }
    }

    Ok(())
  }
}
