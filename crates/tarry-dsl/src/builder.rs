//! The [`Await`] builder.

use std::collections::HashMap;
use std::future::Future;
use std::num::NonZeroUsize;
use std::time::Duration;

use tarry_config::{DEFAULT_INTERVAL_MS, PollConfig};
use tarry_core::{
  Deadline, NotReady, PollResult, Workers, poll_all, poll_all_bounded, poll_first,
  poll_first_bounded, poll_once, predicate,
};
use tracing::debug;

/// Retry interval used by every constructor.
const DEFAULT_INTERVAL: Duration = Duration::from_millis(DEFAULT_INTERVAL_MS);

/// A reusable description of how to wait.
///
/// `Await` is cheap to clone and each `until_*` call runs an independent poll.
#[derive(Debug, Clone)]
pub struct Await {
  deadline: Deadline,
  max_wait: Option<Duration>,
  interval: Duration,
  max_workers: Option<NonZeroUsize>,
}

impl Await {
  /// Wait for at most `max_wait`, with no outer cancellation.
  pub fn at_most(max_wait: Duration) -> Self {
    Self::with_deadline(&Deadline::new()).timeout(max_wait)
  }

  /// Wait until `deadline` is done.
  pub fn with_deadline(deadline: &Deadline) -> Self {
    Self {
      deadline: deadline.clone(),
      max_wait: None,
      interval: DEFAULT_INTERVAL,
      max_workers: None,
    }
  }

  /// Wait with the timing and concurrency of `config`, with no outer
  /// cancellation.
  pub fn from_config(config: &PollConfig) -> Self {
    Self::with_deadline(&Deadline::new()).with_config(config)
  }

  /// Apply `config`. The interval is always replaced; the timeout and worker
  /// cap only when `config` sets them.
  pub fn with_config(mut self, config: &PollConfig) -> Self {
    self.interval = config.interval();
    if let Some(max_wait) = config.timeout() {
      self.max_wait = Some(max_wait);
    }
    if let Some(max_workers) = config.max_workers() {
      self.max_workers = Some(max_workers);
    }
    self
  }

  /// Give up after `max_wait`, or earlier if the outer deadline is done first.
  pub fn timeout(mut self, max_wait: Duration) -> Self {
    self.max_wait = Some(max_wait);
    self
  }

  pub fn retrying_every(mut self, interval: Duration) -> Self {
    self.interval = interval;
    self
  }

  /// Cap the number of workers polling at once in [`all`](Self::all) and
  /// [`first`](Self::first).
  pub fn max_workers(mut self, max_workers: NonZeroUsize) -> Self {
    self.max_workers = Some(max_workers);
    self
  }

  /// The outer deadline handed to polling functions.
  pub fn deadline(&self) -> &Deadline {
    &self.deadline
  }

  pub fn interval(&self) -> Duration {
    self.interval
  }

  /// Retry `check` until it returns `true`.
  ///
  /// `check` receives the outer deadline, not the timeout scope. A failure
  /// never carries a last error.
  pub async fn until_true<F, Fut>(&self, check: F) -> PollResult<(), NotReady>
  where
    F: Fn(Deadline) -> Fut + Send + Sync,
    Fut: Future<Output = bool> + Send + 'static,
  {
    let outer = self.deadline.clone();
    let worker = predicate(move |_| check(outer.clone()));
    poll_once(&self.scope(), self.interval, &worker)
      .await
      .map_err(|failure| failure.without_cause())
  }

  /// Retry `call` until it returns `Ok(())`.
  ///
  /// `call` receives the outer deadline, not the timeout scope.
  pub async fn until_no_error<F, Fut, E>(&self, call: F) -> PollResult<(), E>
  where
    F: Fn(Deadline) -> Fut + Send + Sync,
    Fut: Future<Output = Result<(), E>> + Send + 'static,
    E: Send + 'static,
  {
    self.until_ok(call).await
  }

  /// Retry `call` until it returns `Ok`, and return the value.
  ///
  /// `call` receives the outer deadline, not the timeout scope.
  pub async fn until_ok<F, Fut, T, E>(&self, call: F) -> PollResult<T, E>
  where
    F: Fn(Deadline) -> Fut + Send + Sync,
    Fut: Future<Output = Result<T, E>> + Send + 'static,
    T: Send + 'static,
    E: Send + 'static,
  {
    let outer = self.deadline.clone();
    let worker = move |_: Deadline| call(outer.clone());
    poll_once(&self.scope(), self.interval, &worker).await
  }

  /// Poll every worker and collect each outcome by name.
  ///
  /// Workers in a group observe the timeout scope.
  pub async fn all<T, E>(&self, workers: &Workers<T, E>) -> HashMap<String, PollResult<T, E>>
  where
    T: Send + 'static,
    E: Send + 'static,
  {
    let scope = self.scope();
    match self.max_workers {
      Some(max) => poll_all_bounded(&scope, self.interval, workers, max).await,
      None => poll_all(&scope, self.interval, workers).await,
    }
  }

  /// Poll every worker and return the first success.
  ///
  /// Workers in a group observe the timeout scope.
  pub async fn first<T, E>(&self, workers: &Workers<T, E>) -> PollResult<T, E>
  where
    T: Send + 'static,
    E: Send + 'static,
  {
    let scope = self.scope();
    match self.max_workers {
      Some(max) => poll_first_bounded(&scope, self.interval, workers, max).await,
      None => poll_first(&scope, self.interval, workers).await,
    }
  }

  /// The scope the engine polls under.
  fn scope(&self) -> Deadline {
    match self.max_wait {
      Some(max_wait) => {
        debug!(?max_wait, interval = ?self.interval, "polling with timeout");
        self.deadline.with_timeout(max_wait)
      }
      None => self.deadline.clone(),
    }
  }
}
