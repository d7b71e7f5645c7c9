//! JSON reports printed by `tarry run`.

use std::collections::{BTreeMap, HashMap};

use serde::Serialize;
use tarry_config::WaitMode;
use tarry_core::PollResult;
use tarry_probe::{ProbeError, ProbeOutput};

#[derive(Debug, Serialize)]
pub struct Report {
  pub mode: WaitMode,
  pub ok: bool,
  /// Outcome of a `once` or `first` wait
  #[serde(skip_serializing_if = "Option::is_none")]
  pub result: Option<ProbeReport>,
  /// Per-probe outcomes of an `all` wait
  #[serde(skip_serializing_if = "BTreeMap::is_empty")]
  pub probes: BTreeMap<String, ProbeReport>,
}

#[derive(Debug, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum ProbeReport {
  Ready {
    #[serde(flatten)]
    output: ProbeOutput,
  },
  Failed {
    error: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    last_error: Option<String>,
    elapsed_ms: u64,
  },
}

impl ProbeReport {
  pub fn is_ready(&self) -> bool {
    matches!(self, ProbeReport::Ready { .. })
  }
}

impl From<PollResult<ProbeOutput, ProbeError>> for ProbeReport {
  fn from(result: PollResult<ProbeOutput, ProbeError>) -> Self {
    match result {
      Ok(output) => ProbeReport::Ready { output },
      Err(failure) => ProbeReport::Failed {
        error: failure.to_string(),
        last_error: failure.last_error().map(ToString::to_string),
        elapsed_ms: u64::try_from(failure.elapsed().as_millis()).unwrap_or(u64::MAX),
      },
    }
  }
}

impl Report {
  /// Report for a wait that produced a single outcome.
  pub fn single(mode: WaitMode, result: PollResult<ProbeOutput, ProbeError>) -> Self {
    let result = ProbeReport::from(result);
    Self {
      mode,
      ok: result.is_ready(),
      result: Some(result),
      probes: BTreeMap::new(),
    }
  }

  /// Report for an `all` wait. Ok only when every probe is ready.
  pub fn all(results: HashMap<String, PollResult<ProbeOutput, ProbeError>>) -> Self {
    let probes: BTreeMap<_, _> = results
      .into_iter()
      .map(|(name, result)| (name, ProbeReport::from(result)))
      .collect();
    Self {
      mode: WaitMode::All,
      ok: probes.values().all(ProbeReport::is_ready),
      result: None,
      probes,
    }
  }
}
