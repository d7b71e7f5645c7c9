//! Integration tests for the single-worker retry loop.

use std::sync::Arc;
use std::sync::atomic::{AtomicU32, Ordering};
use std::time::{Duration, Instant};

use tarry_core::{Deadline, Failure, NotReady, blocking, poll_once, predicate};

#[derive(Debug, Clone, PartialEq, thiserror::Error)]
#[error("foo")]
struct Foo;

#[derive(Debug, Clone, PartialEq, thiserror::Error)]
#[error("attempt {0} failed")]
struct AttemptFailed(u32);

#[tokio::test]
async fn test_returns_when_worker_succeeds() {
  let worker = |_: Deadline| async {
    tokio::time::sleep(Duration::from_millis(1)).await;
    Ok::<_, Foo>(())
  };

  let result = poll_once(&Deadline::new(), Duration::from_nanos(1), &worker).await;
  assert!(result.is_ok());
}

#[tokio::test]
async fn test_success_after_n_attempts() {
  let calls = Arc::new(AtomicU32::new(0));
  let counter = Arc::clone(&calls);
  let worker = move |_: Deadline| {
    let counter = Arc::clone(&counter);
    async move {
      let n = counter.fetch_add(1, Ordering::SeqCst) + 1;
      if n >= 3 { Ok(n) } else { Err(AttemptFailed(n)) }
    }
  };

  let result = poll_once(&Deadline::new(), Duration::from_millis(1), &worker).await;

  assert_eq!(result.unwrap(), 3);
  assert_eq!(calls.load(Ordering::SeqCst), 3);
}

#[tokio::test]
async fn test_success_does_not_wait_for_interval() {
  let worker = |_: Deadline| async { Ok::<_, Foo>("ready") };

  let start = Instant::now();
  let result = poll_once(&Deadline::new(), Duration::from_secs(5), &worker).await;

  assert_eq!(result.unwrap(), "ready");
  assert!(start.elapsed() < Duration::from_secs(1));
}

#[tokio::test]
async fn test_cancel_from_worker_stops_retrying() {
  let deadline = Deadline::new();
  let calls = Arc::new(AtomicU32::new(0));
  let counter = Arc::clone(&calls);
  let worker = move |deadline: Deadline| {
    let counter = Arc::clone(&counter);
    async move {
      if counter.fetch_add(1, Ordering::SeqCst) + 1 > 10 {
        deadline.cancel();
      }
      Err::<(), _>(Foo)
    }
  };

  let result = poll_once(&deadline, Duration::from_millis(1), &worker).await;

  let failure = result.unwrap_err();
  assert!(matches!(failure, Failure::Worker { .. }));
  assert_eq!(failure.last_error(), Some(&Foo));
  assert_eq!(calls.load(Ordering::SeqCst), 11);
}

#[tokio::test]
async fn test_fails_fast_when_deadline_already_done() {
  let deadline = Deadline::new();
  deadline.cancel();
  let calls = Arc::new(AtomicU32::new(0));
  let counter = Arc::clone(&calls);
  let worker = move |_: Deadline| {
    counter.fetch_add(1, Ordering::SeqCst);
    async { Err::<(), _>(Foo) }
  };

  let result = poll_once(&deadline, Duration::from_secs(1), &worker).await;

  let failure = result.unwrap_err();
  assert!(matches!(failure, Failure::Expired { .. }));
  assert_eq!(failure.last_error(), None);
  assert!(failure.elapsed() < Duration::from_millis(50));
  assert_eq!(calls.load(Ordering::SeqCst), 0);
}

#[tokio::test]
async fn test_timeout_relays_last_error() {
  let deadline = Deadline::after(Duration::from_millis(30));
  let calls = Arc::new(AtomicU32::new(0));
  let counter = Arc::clone(&calls);
  let worker = move |_: Deadline| {
    let counter = Arc::clone(&counter);
    async move { Err::<(), _>(AttemptFailed(counter.fetch_add(1, Ordering::SeqCst) + 1)) }
  };

  let result = poll_once(&deadline, Duration::from_millis(1), &worker).await;

  let failure = result.unwrap_err();
  let attempts = calls.load(Ordering::SeqCst);
  assert!(attempts >= 1);
  assert_eq!(failure.last_error(), Some(&AttemptFailed(attempts)));
  assert!(failure.elapsed() >= Duration::from_millis(25));
}

#[tokio::test]
async fn test_timeout_with_long_interval() {
  let deadline = Deadline::after(Duration::from_millis(1));
  let worker = |_: Deadline| async { Err::<(), _>(Foo) };

  let start = Instant::now();
  let result = poll_once(&deadline, Duration::from_secs(1), &worker).await;

  let failure = result.unwrap_err();
  assert_eq!(failure.into_last_error(), Some(Foo));
  assert!(start.elapsed() < Duration::from_millis(500));
}

#[tokio::test]
async fn test_failure_message() {
  let deadline = Deadline::after(Duration::from_millis(2));
  let worker = |_: Deadline| async { Err::<(), _>(Foo) };

  let failure = poll_once(&deadline, Duration::from_millis(1), &worker)
    .await
    .unwrap_err();

  let message = failure.to_string();
  assert!(message.starts_with("context cancelled after "), "{message}");
  assert!(message.ends_with(" : foo"), "{message}");
}

#[tokio::test]
async fn test_zero_interval_still_times_out() {
  let deadline = Deadline::after(Duration::from_millis(10));
  let worker = |_: Deadline| async { Err::<(), _>(Foo) };

  let result = poll_once(&deadline, Duration::ZERO, &worker).await;

  assert_eq!(result.unwrap_err().last_error(), Some(&Foo));
}

#[tokio::test]
async fn test_predicate_worker() {
  let calls = Arc::new(AtomicU32::new(0));
  let counter = Arc::clone(&calls);
  let worker = predicate(move |_| {
    let counter = Arc::clone(&counter);
    async move { counter.fetch_add(1, Ordering::SeqCst) + 1 >= 3 }
  });

  let result = poll_once(&Deadline::new(), Duration::from_nanos(1), &worker).await;

  assert!(result.is_ok());
  assert_eq!(calls.load(Ordering::SeqCst), 3);
}

#[tokio::test]
async fn test_predicate_timeout_reports_not_ready() {
  let deadline = Deadline::after(Duration::from_millis(5));
  let worker = predicate(|_| async { false });

  let result = poll_once(&deadline, Duration::from_millis(1), &worker).await;

  assert_eq!(result.unwrap_err().last_error(), Some(&NotReady));
}

#[tokio::test(flavor = "multi_thread")]
async fn test_blocking_worker_is_not_interrupted() {
  let deadline = Deadline::after(Duration::from_millis(10));
  let worker = blocking(|_: &Deadline| {
    std::thread::sleep(Duration::from_millis(60));
    Err::<(), _>(Foo)
  });

  let failure = poll_once(&deadline, Duration::from_millis(1), &worker)
    .await
    .unwrap_err();

  assert_eq!(failure.last_error(), Some(&Foo));
  assert!(failure.elapsed() >= Duration::from_millis(60));
}

#[tokio::test]
async fn test_value_returned_after_timer() {
  let ready_at = Instant::now() + Duration::from_millis(5);
  let worker = move |_: Deadline| async move {
    if Instant::now() >= ready_at {
      Ok("timer finished")
    } else {
      Err(Foo)
    }
  };
  let deadline = Deadline::after(Duration::from_secs(2));

  let result = poll_once(&deadline, Duration::from_micros(200), &worker).await;

  assert_eq!(result.unwrap(), "timer finished");
}
