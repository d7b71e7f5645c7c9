use std::collections::HashMap;

use serde::{Deserialize, Serialize};

/// A command to run repeatedly until it reports readiness.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProbeDef {
  /// Unique name within a plan, used as the key in reports
  pub name: String,

  /// Program to execute, resolved through `PATH`
  pub command: String,

  #[serde(default, skip_serializing_if = "Vec::is_empty")]
  pub args: Vec<String>,

  /// Extra environment variables, added to the inherited environment
  #[serde(default, skip_serializing_if = "HashMap::is_empty")]
  pub env: HashMap<String, String>,

  #[serde(skip_serializing_if = "Option::is_none")]
  pub cwd: Option<String>,

  /// When set, stdout must contain this text for the probe to succeed
  #[serde(skip_serializing_if = "Option::is_none")]
  pub expect_stdout: Option<String>,
}

impl ProbeDef {
  pub fn new(name: impl Into<String>, command: impl Into<String>) -> Self {
    Self {
      name: name.into(),
      command: command.into(),
      args: Vec::new(),
      env: HashMap::new(),
      cwd: None,
      expect_stdout: None,
    }
  }

  pub fn with_args<I, S>(mut self, args: I) -> Self
  where
    I: IntoIterator<Item = S>,
    S: Into<String>,
  {
    self.args = args.into_iter().map(Into::into).collect();
    self
  }

  pub fn with_expect_stdout(mut self, expected: impl Into<String>) -> Self {
    self.expect_stdout = Some(expected.into());
    self
  }
}
