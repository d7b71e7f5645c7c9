//! Tarry DSL
//!
//! A fluent layer over `tarry-core` for the common "wait until" cases:
//!
//! ```ignore
//! Await::at_most(Duration::from_secs(10))
//!   .retrying_every(Duration::from_millis(200))
//!   .until_true(|_| async { port_is_open().await })
//!   .await?;
//!
//! Await::with_deadline(&shutdown)
//!   .timeout(Duration::from_secs(1))
//!   .until_no_error(|deadline| async move { connect(&deadline).await })
//!   .await?;
//! ```
//!
//! Builders start with a 100ms retry interval. The free functions
//! [`until_true`] and [`until_no_error`] take the deadline and interval
//! directly.

mod builder;
mod until;

pub use builder::Await;
pub use until::{until_no_error, until_true};
