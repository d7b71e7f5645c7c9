use thiserror::Error;

#[derive(Debug, Error)]
pub enum ProbeError {
  #[error("failed to spawn {command}: {source}")]
  Spawn {
    command: String,
    #[source]
    source: std::io::Error,
  },

  #[error("{command} failed with {status}")]
  Exit {
    command: String,
    status: String,
    stderr: String,
  },

  #[error("{command} stdout did not contain {expected:?}")]
  UnexpectedOutput { command: String, expected: String },
}

impl ProbeError {
  pub fn spawn(command: impl Into<String>, source: std::io::Error) -> Self {
    Self::Spawn {
      command: command.into(),
      source,
    }
  }

  pub fn exit(
    command: impl Into<String>,
    status: impl Into<String>,
    stderr: impl Into<String>,
  ) -> Self {
    Self::Exit {
      command: command.into(),
      status: status.into(),
      stderr: stderr.into(),
    }
  }

  pub fn unexpected_output(command: impl Into<String>, expected: impl Into<String>) -> Self {
    Self::UnexpectedOutput {
      command: command.into(),
      expected: expected.into(),
    }
  }
}
