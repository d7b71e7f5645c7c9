use std::process::Stdio;

use async_trait::async_trait;
use serde::Serialize;
use tarry_config::{PlanDef, ProbeDef};
use tarry_core::{Deadline, Worker, Workers};
use tokio::process::Command;
use tracing::debug;

use crate::error::ProbeError;

/// Captured output of a successful probe run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ProbeOutput {
  pub stdout: String,
  pub stderr: String,
  /// `None` when the process was terminated by a signal
  pub exit_code: Option<i32>,
}

/// A worker that runs one external command per attempt.
#[derive(Debug, Clone)]
pub struct CommandProbe {
  def: ProbeDef,
}

impl CommandProbe {
  pub fn new(def: ProbeDef) -> Self {
    Self { def }
  }

  /// Build a probe from a program and its arguments.
  pub fn from_argv<I, S>(name: impl Into<String>, program: impl Into<String>, args: I) -> Self
  where
    I: IntoIterator<Item = S>,
    S: Into<String>,
  {
    Self::new(ProbeDef::new(name, program).with_args(args))
  }

  pub fn name(&self) -> &str {
    &self.def.name
  }

  pub fn def(&self) -> &ProbeDef {
    &self.def
  }

  fn command(&self) -> Command {
    let mut command = Command::new(&self.def.command);
    command
      .args(&self.def.args)
      .envs(&self.def.env)
      .stdin(Stdio::null())
      .stdout(Stdio::piped())
      .stderr(Stdio::piped());
    if let Some(cwd) = &self.def.cwd {
      command.current_dir(cwd);
    }
    command
  }

  /// Run the command once and judge the result.
  pub async fn run(&self) -> Result<ProbeOutput, ProbeError> {
    let output = self
      .command()
      .output()
      .await
      .map_err(|e| ProbeError::spawn(&self.def.command, e))?;

    let probe_output = ProbeOutput {
      stdout: String::from_utf8_lossy(&output.stdout).into_owned(),
      stderr: String::from_utf8_lossy(&output.stderr).into_owned(),
      exit_code: output.status.code(),
    };

    debug!(
      probe = %self.def.name,
      exit_code = ?probe_output.exit_code,
      "probe command finished"
    );

    if !output.status.success() {
      return Err(ProbeError::exit(
        &self.def.command,
        output.status.to_string(),
        probe_output.stderr.trim_end(),
      ));
    }

    if let Some(expected) = &self.def.expect_stdout {
      if !probe_output.stdout.contains(expected.as_str()) {
        return Err(ProbeError::unexpected_output(&self.def.command, expected));
      }
    }

    Ok(probe_output)
  }
}

#[async_trait]
impl Worker for CommandProbe {
  type Output = ProbeOutput;
  type Error = ProbeError;

  async fn work(&self, _deadline: &Deadline) -> Result<ProbeOutput, ProbeError> {
    self.run().await
  }
}

/// Build a named worker registry with one probe per plan entry.
pub fn registry_from_plan(plan: &PlanDef) -> Workers<ProbeOutput, ProbeError> {
  plan
    .probes
    .iter()
    .fold(Workers::new(), |workers, def| {
      workers.with(def.name.clone(), CommandProbe::new(def.clone()))
    })
}

#[cfg(test)]
mod tests {
  use tarry_config::{PollConfig, WaitMode};

  use super::*;

  #[test]
  fn test_registry_from_plan() {
    let plan = PlanDef {
      poll: PollConfig::default(),
      mode: WaitMode::All,
      probes: vec![ProbeDef::new("db", "true"), ProbeDef::new("api", "true")],
    };

    let workers = registry_from_plan(&plan);

    let mut names: Vec<_> = workers.names().collect();
    names.sort();
    assert_eq!(names, vec!["api", "db"]);
  }

  #[test]
  fn test_from_argv() {
    let probe = CommandProbe::from_argv("echo", "echo", ["hello", "world"]);
    assert_eq!(probe.name(), "echo");
    assert_eq!(probe.def().command, "echo");
    assert_eq!(probe.def().args, vec!["hello", "world"]);
  }
}
