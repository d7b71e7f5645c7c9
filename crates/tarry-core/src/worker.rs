//! Workers and worker adapters.
//!
//! Any `Fn(Deadline) -> impl Future<Output = Result<T, E>>` closure is a
//! [`Worker`]. Workers that only report success use `T = ()`. Boolean and
//! synchronous workers are adapted with [`predicate`] and [`blocking`].

use std::future::Future;
use std::sync::Arc;

use async_trait::async_trait;

use crate::deadline::Deadline;
use crate::error::NotReady;

/// A unit of polled work.
///
/// The engine awaits every invocation to completion. A worker that wants to
/// stop early must observe the deadline it is given.
#[async_trait]
pub trait Worker: Send + Sync {
  /// Value produced on success.
  type Output: Send + 'static;
  /// Error produced when the attempt fails.
  type Error: Send + 'static;

  /// Run one attempt.
  async fn work(&self, deadline: &Deadline) -> Result<Self::Output, Self::Error>;
}

/// A type-erased, shareable worker.
pub type SharedWorker<T, E> = Arc<dyn Worker<Output = T, Error = E>>;

#[async_trait]
impl<F, Fut, T, E> Worker for F
where
  F: Fn(Deadline) -> Fut + Send + Sync,
  Fut: Future<Output = Result<T, E>> + Send + 'static,
  T: Send + 'static,
  E: Send + 'static,
{
  type Output = T;
  type Error = E;

  async fn work(&self, deadline: &Deadline) -> Result<T, E> {
    (self)(deadline.clone()).await
  }
}

/// Worker adapted from a boolean check. See [`predicate`].
pub struct Predicate<F> {
  check: F,
}

/// Adapt a boolean check: `true` succeeds with `()`, `false` fails with [`NotReady`].
pub fn predicate<F, Fut>(check: F) -> Predicate<F>
where
  F: Fn(Deadline) -> Fut + Send + Sync,
  Fut: Future<Output = bool> + Send + 'static,
{
  Predicate { check }
}

#[async_trait]
impl<F, Fut> Worker for Predicate<F>
where
  F: Fn(Deadline) -> Fut + Send + Sync,
  Fut: Future<Output = bool> + Send + 'static,
{
  type Output = ();
  type Error = NotReady;

  async fn work(&self, deadline: &Deadline) -> Result<(), NotReady> {
    if (self.check)(deadline.clone()).await {
      Ok(())
    } else {
      Err(NotReady)
    }
  }
}

/// Worker adapted from a synchronous closure. See [`blocking`].
pub struct Blocking<F> {
  call: Arc<F>,
}

/// Adapt a synchronous closure that may block.
///
/// Each attempt runs on tokio's blocking pool, so a slow call never stalls the
/// async scheduler. The call still runs to completion after its poll has
/// given up.
pub fn blocking<F, T, E>(call: F) -> Blocking<F>
where
  F: Fn(&Deadline) -> Result<T, E> + Send + Sync + 'static,
  T: Send + 'static,
  E: Send + 'static,
{
  Blocking {
    call: Arc::new(call),
  }
}

#[async_trait]
impl<F, T, E> Worker for Blocking<F>
where
  F: Fn(&Deadline) -> Result<T, E> + Send + Sync + 'static,
  T: Send + 'static,
  E: Send + 'static,
{
  type Output = T;
  type Error = E;

  async fn work(&self, deadline: &Deadline) -> Result<T, E> {
    let call = Arc::clone(&self.call);
    let deadline = deadline.clone();
    match tokio::task::spawn_blocking(move || call(&deadline)).await {
      Ok(result) => result,
      Err(e) => match e.try_into_panic() {
        Ok(payload) => std::panic::resume_unwind(payload),
        Err(e) => unreachable!("blocking worker was cancelled: {e}"),
      },
    }
  }
}
