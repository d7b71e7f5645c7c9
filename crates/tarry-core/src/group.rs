//! Fan-out polling over a named group of workers.
//!
//! Two policies share the same per-worker loop ([`poll_once`]):
//! - [`poll_all`] waits for every worker and returns each outcome by name.
//! - [`poll_first`] returns the first success and cancels the rest.
//!
//! Both spawn one tokio task per worker. The `_bounded` variants gate those
//! tasks behind a fixed number of permits.

use std::collections::HashMap;
use std::num::NonZeroUsize;
use std::panic::AssertUnwindSafe;
use std::sync::Arc;
use std::time::Duration;

use futures::FutureExt;
use tokio::sync::{Semaphore, mpsc};
use tokio::task::JoinHandle;
use tokio::time::Instant;
use tracing::{debug, info, instrument, warn};

use crate::deadline::Deadline;
use crate::error::{Failure, PollResult};
use crate::poll::poll_once;
use crate::worker::{SharedWorker, Worker};

/// A completed poll routed back to the worker that produced it.
type NamedResult<T, E> = (String, PollResult<T, E>);

/// A named collection of workers sharing output and error types.
pub struct Workers<T, E> {
  entries: HashMap<String, SharedWorker<T, E>>,
}

impl<T, E> Workers<T, E>
where
  T: Send + 'static,
  E: Send + 'static,
{
  /// Create an empty registry.
  pub fn new() -> Self {
    Self {
      entries: HashMap::new(),
    }
  }

  /// Add a worker, returning the registry for chaining.
  ///
  /// A worker registered under an existing name replaces it.
  pub fn with<W>(mut self, name: impl Into<String>, worker: W) -> Self
  where
    W: Worker<Output = T, Error = E> + 'static,
  {
    self.insert(name, worker);
    self
  }

  /// Add a worker. Returns the worker previously registered under `name`.
  pub fn insert<W>(&mut self, name: impl Into<String>, worker: W) -> Option<SharedWorker<T, E>>
  where
    W: Worker<Output = T, Error = E> + 'static,
  {
    let worker: SharedWorker<T, E> = Arc::new(worker);
    self.entries.insert(name.into(), worker)
  }

  /// Add an already shared worker.
  pub fn insert_shared(
    &mut self,
    name: impl Into<String>,
    worker: SharedWorker<T, E>,
  ) -> Option<SharedWorker<T, E>> {
    self.entries.insert(name.into(), worker)
  }

  /// Look up a worker by name.
  pub fn get(&self, name: &str) -> Option<&SharedWorker<T, E>> {
    self.entries.get(name)
  }

  /// Registered names, in no particular order.
  pub fn names(&self) -> impl Iterator<Item = &str> {
    self.entries.keys().map(String::as_str)
  }

  pub fn len(&self) -> usize {
    self.entries.len()
  }

  pub fn is_empty(&self) -> bool {
    self.entries.is_empty()
  }

  fn iter(&self) -> impl Iterator<Item = (&String, &SharedWorker<T, E>)> {
    self.entries.iter()
  }
}

impl<T, E> Default for Workers<T, E>
where
  T: Send + 'static,
  E: Send + 'static,
{
  fn default() -> Self {
    Self::new()
  }
}

impl<T, E> Clone for Workers<T, E> {
  fn clone(&self) -> Self {
    Self {
      entries: self.entries.clone(),
    }
  }
}

/// Poll every worker concurrently and wait for all of them.
///
/// Each worker's outcome is recorded under its name; one worker's failure never
/// stops another.
pub async fn poll_all<T, E>(
  deadline: &Deadline,
  interval: Duration,
  workers: &Workers<T, E>,
) -> HashMap<String, PollResult<T, E>>
where
  T: Send + 'static,
  E: Send + 'static,
{
  collect_all(deadline, interval, workers, None).await
}

/// Like [`poll_all`], with at most `max_workers` polls running at once.
pub async fn poll_all_bounded<T, E>(
  deadline: &Deadline,
  interval: Duration,
  workers: &Workers<T, E>,
  max_workers: NonZeroUsize,
) -> HashMap<String, PollResult<T, E>>
where
  T: Send + 'static,
  E: Send + 'static,
{
  collect_all(deadline, interval, workers, Some(max_workers)).await
}

/// Poll every worker concurrently and return the first success.
///
/// Workers poll under a child scope of `deadline`. As soon as one succeeds the
/// child scope is cancelled and the value returned; the others stop retrying
/// but are neither awaited nor interrupted. If every worker fails first, the
/// result is an aggregate failure. If `deadline` is done first, the result is
/// an expiry failure.
pub async fn poll_first<T, E>(
  deadline: &Deadline,
  interval: Duration,
  workers: &Workers<T, E>,
) -> PollResult<T, E>
where
  T: Send + 'static,
  E: Send + 'static,
{
  race_first(deadline, interval, workers, None).await
}

/// Like [`poll_first`], with at most `max_workers` polls running at once.
pub async fn poll_first_bounded<T, E>(
  deadline: &Deadline,
  interval: Duration,
  workers: &Workers<T, E>,
  max_workers: NonZeroUsize,
) -> PollResult<T, E>
where
  T: Send + 'static,
  E: Send + 'static,
{
  race_first(deadline, interval, workers, Some(max_workers)).await
}

#[instrument(
  name = "poll_all",
  skip_all,
  fields(workers = workers.len(), max_workers = ?max_workers)
)]
async fn collect_all<T, E>(
  deadline: &Deadline,
  interval: Duration,
  workers: &Workers<T, E>,
  max_workers: Option<NonZeroUsize>,
) -> HashMap<String, PollResult<T, E>>
where
  T: Send + 'static,
  E: Send + 'static,
{
  let mut results = HashMap::with_capacity(workers.len());
  if workers.is_empty() {
    debug!("no workers to poll");
    return results;
  }

  info!("polling all workers");

  let permits = max_workers.map(|n| Arc::new(Semaphore::new(n.get())));
  let handles: Vec<JoinHandle<NamedResult<T, E>>> = workers
    .iter()
    .map(|(name, worker)| {
      tokio::spawn(run_poll(
        name.clone(),
        Arc::clone(worker),
        deadline.clone(),
        interval,
        permits.clone(),
      ))
    })
    .collect();

  for joined in futures::future::join_all(handles).await {
    let (name, result) = match joined {
      Ok(named) => named,
      Err(e) => resume_join_error(e),
    };
    if let Err(failure) = &result {
      warn!(worker = %name, elapsed = ?failure.elapsed(), "worker did not succeed");
    }
    results.insert(name, result);
  }

  let succeeded = results.values().filter(|r| r.is_ok()).count();
  info!(succeeded, failed = results.len() - succeeded, "all workers finished");

  results
}

#[instrument(
  name = "poll_first",
  skip_all,
  fields(workers = workers.len(), max_workers = ?max_workers)
)]
async fn race_first<T, E>(
  deadline: &Deadline,
  interval: Duration,
  workers: &Workers<T, E>,
  max_workers: Option<NonZeroUsize>,
) -> PollResult<T, E>
where
  T: Send + 'static,
  E: Send + 'static,
{
  let start = Instant::now();

  // Losers observe this scope; it is cancelled on every return path.
  let scope = deadline.child();
  let _release = scope.drop_guard();

  // A panicking poll reports its payload so it can be resumed here.
  let (sender, mut completions) =
    mpsc::channel::<std::thread::Result<NamedResult<T, E>>>(workers.len().max(1));
  let permits = max_workers.map(|n| Arc::new(Semaphore::new(n.get())));

  info!("racing workers for first success");

  for (name, worker) in workers.iter() {
    let sender = sender.clone();
    let poll = run_poll(
      name.clone(),
      Arc::clone(worker),
      scope.clone(),
      interval,
      permits.clone(),
    );
    // Detached: completions are reported over the channel, never joined.
    tokio::spawn(async move {
      let completed = AssertUnwindSafe(poll).catch_unwind().await;
      let _ = sender.send(completed).await;
    });
  }
  drop(sender);

  loop {
    tokio::select! {
      biased;
      completed = completions.recv() => match completed {
        Some(Err(payload)) => std::panic::resume_unwind(payload),
        Some(Ok((name, Ok(value)))) => {
          info!(worker = %name, elapsed = ?start.elapsed(), "first worker succeeded");
          return Ok(value);
        }
        Some(Ok((name, Err(failure)))) => {
          debug!(
            worker = %name,
            elapsed = ?failure.elapsed(),
            captured_error = failure.last_error().is_some(),
            "worker failed"
          );
        }
        None => {
          warn!(elapsed = ?start.elapsed(), "all workers failed");
          return Err(Failure::all_failed(start.elapsed()));
        }
      },
      _ = deadline.done() => {
        warn!(elapsed = ?start.elapsed(), reason = ?deadline.reason(), "deadline done before any worker succeeded");
        return Err(Failure::expired(start.elapsed()));
      }
    }
  }
}

/// Poll one worker, optionally waiting for a permit first.
async fn run_poll<T, E>(
  name: String,
  worker: SharedWorker<T, E>,
  deadline: Deadline,
  interval: Duration,
  permits: Option<Arc<Semaphore>>,
) -> NamedResult<T, E>
where
  T: Send + 'static,
  E: Send + 'static,
{
  // The semaphore is never closed, so acquiring only waits.
  let _permit = match permits {
    Some(permits) => permits.acquire_owned().await.ok(),
    None => None,
  };
  let result = poll_once(&deadline, interval, worker.as_ref()).await;
  (name, result)
}

fn resume_join_error<T>(e: tokio::task::JoinError) -> T {
  match e.try_into_panic() {
    Ok(payload) => std::panic::resume_unwind(payload),
    Err(e) => unreachable!("poll task was cancelled: {e}"),
  }
}
