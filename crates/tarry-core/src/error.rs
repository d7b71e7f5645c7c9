//! Error types for polling.

use std::time::Duration;

use thiserror::Error;

/// Result of a poll: the worker's value, or the [`Failure`] that ended polling.
pub type PollResult<T, E> = Result<T, Failure<E>>;

/// Underlying error of a first-success poll in which no worker succeeded.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
#[error("all workers failed")]
pub struct AllWorkersFailed;

/// Underlying error recorded when a boolean worker reports `false`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
#[error("condition not met")]
pub struct NotReady;

/// Polling stopped before the worker succeeded.
///
/// Distinct from the worker's own error type `E`, which is relayed as the
/// source when one was captured.
#[derive(Debug, Clone, Error)]
pub enum Failure<E> {
  /// The deadline was done before any worker error was captured.
  #[error("context cancelled after {elapsed:?}")]
  Expired { elapsed: Duration },

  /// The deadline was done after the worker failed at least once.
  #[error("context cancelled after {elapsed:?} : {source}")]
  Worker {
    elapsed: Duration,
    #[source]
    source: E,
  },

  /// Every worker of a first-success poll failed.
  #[error("context cancelled after {elapsed:?} : {source}")]
  AllFailed {
    elapsed: Duration,
    #[source]
    source: AllWorkersFailed,
  },
}

impl<E> Failure<E> {
  /// Polling ended with no worker error captured.
  pub fn expired(elapsed: Duration) -> Self {
    Self::Expired { elapsed }
  }

  /// Polling ended after the worker returned `source`.
  pub fn worker(elapsed: Duration, source: E) -> Self {
    Self::Worker { elapsed, source }
  }

  /// No worker of a group succeeded.
  pub fn all_failed(elapsed: Duration) -> Self {
    Self::AllFailed {
      elapsed,
      source: AllWorkersFailed,
    }
  }

  /// Time from the start of polling until it stopped.
  pub fn elapsed(&self) -> Duration {
    match self {
      Self::Expired { elapsed } | Self::Worker { elapsed, .. } | Self::AllFailed { elapsed, .. } => {
        *elapsed
      }
    }
  }

  /// The last error returned by the worker, if one was captured.
  pub fn last_error(&self) -> Option<&E> {
    match self {
      Self::Worker { source, .. } => Some(source),
      _ => None,
    }
  }

  /// Consume the failure, returning the last worker error if one was captured.
  pub fn into_last_error(self) -> Option<E> {
    match self {
      Self::Worker { source, .. } => Some(source),
      _ => None,
    }
  }

  /// Whether this is the aggregate failure of a first-success poll.
  pub fn is_all_failed(&self) -> bool {
    matches!(self, Self::AllFailed { .. })
  }

  /// Drop the captured worker error, keeping only the elapsed time.
  pub fn without_cause<F>(self) -> Failure<F> {
    match self {
      Self::AllFailed { elapsed, source } => Failure::AllFailed { elapsed, source },
      other => Failure::Expired {
        elapsed: other.elapsed(),
      },
    }
  }

  /// Map the worker error type.
  pub fn map_err<F>(self, op: impl FnOnce(E) -> F) -> Failure<F> {
    match self {
      Self::Expired { elapsed } => Failure::Expired { elapsed },
      Self::Worker { elapsed, source } => Failure::Worker {
        elapsed,
        source: op(source),
      },
      Self::AllFailed { elapsed, source } => Failure::AllFailed { elapsed, source },
    }
  }
}
