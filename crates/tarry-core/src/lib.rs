//! Tarry Core
//!
//! The polling engine behind tarry. Given a [`Worker`] that may fail or not yet
//! have a result, it retries at a fixed interval until the worker succeeds or a
//! [`Deadline`] is done.
//!
//! # Architecture
//!
//! ```text
//! poll_first / poll_all          (group: one tokio task per named worker)
//!         │
//!         ▼
//!     poll_once                  (retry loop: attempt, then race interval vs deadline)
//!         │
//!         ▼
//!      Worker                    (user code; observes the Deadline cooperatively)
//! ```
//!
//! Cancellation is cooperative. A done deadline stops further attempts but
//! never interrupts one in progress.
//!
//! # Usage
//!
//! ```ignore
//! use std::time::Duration;
//! use tarry_core::{Deadline, Workers, poll_first, poll_once};
//!
//! let deadline = Deadline::after(Duration::from_secs(5));
//! let value = poll_once(&deadline, Duration::from_millis(100), &|_| async {
//!   check_service().await
//! })
//! .await?;
//!
//! let workers = Workers::new()
//!   .with("primary", |_| async { ping("primary").await })
//!   .with("replica", |_| async { ping("replica").await });
//! let fastest = poll_first(&deadline, Duration::from_millis(100), &workers).await?;
//! ```

mod deadline;
mod error;
mod group;
mod poll;
mod worker;

pub use deadline::{Deadline, DoneReason};
pub use error::{AllWorkersFailed, Failure, NotReady, PollResult};
pub use group::{Workers, poll_all, poll_all_bounded, poll_first, poll_first_bounded};
pub use poll::poll_once;
pub use worker::{Blocking, Predicate, SharedWorker, Worker, blocking, predicate};
