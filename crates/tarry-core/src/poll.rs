//! The single-worker retry loop.

use std::time::Duration;

use tokio::time::Instant;
use tracing::debug;

use crate::deadline::Deadline;
use crate::error::{Failure, PollResult};
use crate::worker::Worker;

/// Invoke `worker` every `interval` until it succeeds or `deadline` is done.
///
/// A deadline that is already done fails fast without invoking the worker.
/// A success returns immediately. Otherwise the returned [`Failure`] carries
/// the elapsed time and the last error the worker returned.
///
/// The worker is never interrupted: an attempt in progress when the deadline
/// fires runs to completion, and no further attempt is started.
pub async fn poll_once<W>(
  deadline: &Deadline,
  interval: Duration,
  worker: &W,
) -> PollResult<W::Output, W::Error>
where
  W: Worker + ?Sized,
{
  let start = Instant::now();

  if deadline.is_done() {
    debug!(reason = ?deadline.reason(), "deadline done before first attempt");
    return Err(Failure::expired(start.elapsed()));
  }

  let mut attempt: u64 = 0;
  loop {
    attempt += 1;

    let error = match worker.work(deadline).await {
      Ok(value) => {
        debug!(attempt, elapsed = ?start.elapsed(), "worker succeeded");
        return Ok(value);
      }
      Err(error) => error,
    };

    if deadline.is_done() {
      debug!(attempt, elapsed = ?start.elapsed(), "deadline done after failed attempt");
      return Err(Failure::worker(start.elapsed(), error));
    }

    debug!(attempt, ?interval, "worker attempt failed, retrying");

    tokio::select! {
      biased;
      _ = deadline.done() => {
        debug!(attempt, elapsed = ?start.elapsed(), "deadline done while waiting to retry");
        return Err(Failure::worker(start.elapsed(), error));
      }
      _ = wait(interval) => {}
    }
  }
}

/// Sleep for `interval`, or just yield to the scheduler when it is zero.
async fn wait(interval: Duration) {
  if interval.is_zero() {
    tokio::task::yield_now().await;
  } else {
    tokio::time::sleep(interval).await;
  }
}
