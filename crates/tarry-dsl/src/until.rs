use std::future::Future;
use std::time::Duration;

use tarry_core::{Deadline, NotReady, PollResult, poll_once, predicate};

/// Retry `check` every `interval` until it returns `true` or `deadline` is done.
///
/// A boolean check has no error to relay, so a failure never carries one.
pub async fn until_true<F, Fut>(
  deadline: &Deadline,
  interval: Duration,
  check: F,
) -> PollResult<(), NotReady>
where
  F: Fn(Deadline) -> Fut + Send + Sync,
  Fut: Future<Output = bool> + Send + 'static,
{
  poll_once(deadline, interval, &predicate(check))
    .await
    .map_err(|failure| failure.without_cause())
}

/// Retry `call` every `interval` until it returns `Ok` or `deadline` is done.
///
/// A failure carries the last error `call` returned.
pub async fn until_no_error<F, Fut, E>(
  deadline: &Deadline,
  interval: Duration,
  call: F,
) -> PollResult<(), E>
where
  F: Fn(Deadline) -> Fut + Send + Sync,
  Fut: Future<Output = Result<(), E>> + Send + 'static,
  E: Send + 'static,
{
  poll_once(deadline, interval, &call).await
}

#[cfg(test)]
mod tests {
  use std::sync::Arc;
  use std::sync::atomic::{AtomicU32, Ordering};

  use super::*;

  #[tokio::test]
  async fn test_until_true_strips_last_error() {
    let deadline = Deadline::after(Duration::from_millis(5));

    let failure = until_true(&deadline, Duration::from_millis(1), |_| async { false })
      .await
      .unwrap_err();

    assert_eq!(failure.last_error(), None);
    assert!(failure.to_string().starts_with("context cancelled after "));
  }

  #[tokio::test]
  async fn test_until_no_error_keeps_last_error() {
    let calls = Arc::new(AtomicU32::new(0));
    let counter = Arc::clone(&calls);
    let deadline = Deadline::after(Duration::from_millis(5));

    let failure = until_no_error(&deadline, Duration::from_millis(1), move |_| {
      let n = counter.fetch_add(1, Ordering::SeqCst) + 1;
      async move { Err::<(), _>(n) }
    })
    .await
    .unwrap_err();

    assert_eq!(failure.last_error(), Some(&calls.load(Ordering::SeqCst)));
  }
}
