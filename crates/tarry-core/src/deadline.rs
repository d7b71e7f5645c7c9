//! Cancellable deadlines.
//!
//! A [`Deadline`] pairs a [`CancellationToken`] with an optional expiry instant.
//! It is done once either the token is cancelled or the expiry has passed.
//! Child scopes share the parent's expiry (or an earlier one) and are cancelled
//! whenever the parent is, but cancelling a child never affects the parent.

use std::time::Duration;

use tokio::time::Instant;
use tokio_util::sync::{CancellationToken, DropGuard};

/// Why a [`Deadline`] is done.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DoneReason {
  /// The cancel trigger was fired.
  Cancelled,
  /// The expiry instant passed.
  DeadlineExceeded,
}

/// A cancellation scope with an optional expiry.
///
/// Cloning is cheap and every clone observes the same scope.
#[derive(Debug, Clone, Default)]
pub struct Deadline {
  token: CancellationToken,
  expires_at: Option<Instant>,
}

impl Deadline {
  /// A scope that never expires and is only done when cancelled.
  pub fn new() -> Self {
    Self::default()
  }

  /// A scope that expires `timeout` from now.
  pub fn after(timeout: Duration) -> Self {
    Self::at(Instant::now() + timeout)
  }

  /// A scope that expires at `instant`.
  pub fn at(instant: Instant) -> Self {
    Self {
      token: CancellationToken::new(),
      expires_at: Some(instant),
    }
  }

  /// Wrap an existing token. The scope has no expiry.
  pub fn from_token(token: CancellationToken) -> Self {
    Self {
      token,
      expires_at: None,
    }
  }

  /// Derive a child scope with the same expiry.
  pub fn child(&self) -> Self {
    Self {
      token: self.token.child_token(),
      expires_at: self.expires_at,
    }
  }

  /// Derive a child scope that expires after `timeout`, or earlier if the
  /// parent expires first.
  pub fn with_timeout(&self, timeout: Duration) -> Self {
    let candidate = Instant::now() + timeout;
    let expires_at = match self.expires_at {
      Some(parent) if parent < candidate => parent,
      _ => candidate,
    };
    Self {
      token: self.token.child_token(),
      expires_at: Some(expires_at),
    }
  }

  /// Fire the cancel trigger for this scope and all of its children.
  pub fn cancel(&self) {
    self.token.cancel();
  }

  /// Returns a guard that cancels this scope when dropped.
  pub fn drop_guard(&self) -> DropGuard {
    self.token.clone().drop_guard()
  }

  /// Whether the cancel trigger was fired (here or on an ancestor).
  pub fn is_cancelled(&self) -> bool {
    self.token.is_cancelled()
  }

  /// Whether the expiry instant has passed.
  pub fn is_expired(&self) -> bool {
    self
      .expires_at
      .is_some_and(|expires_at| Instant::now() >= expires_at)
  }

  /// Whether the scope is done, for either reason.
  pub fn is_done(&self) -> bool {
    self.reason().is_some()
  }

  /// The reason the scope is done, or `None` while it is still live.
  ///
  /// Cancellation takes precedence when both apply.
  pub fn reason(&self) -> Option<DoneReason> {
    if self.is_cancelled() {
      Some(DoneReason::Cancelled)
    } else if self.is_expired() {
      Some(DoneReason::DeadlineExceeded)
    } else {
      None
    }
  }

  /// Time left before expiry. `None` when the scope has no expiry.
  pub fn remaining(&self) -> Option<Duration> {
    self
      .expires_at
      .map(|expires_at| expires_at.saturating_duration_since(Instant::now()))
  }

  /// The expiry instant, if any.
  pub fn expires_at(&self) -> Option<Instant> {
    self.expires_at
  }

  /// The underlying cancellation token.
  pub fn token(&self) -> &CancellationToken {
    &self.token
  }

  /// Completes once the scope is done.
  pub async fn done(&self) {
    match self.expires_at {
      Some(expires_at) => {
        tokio::select! {
          _ = self.token.cancelled() => {}
          _ = tokio::time::sleep_until(expires_at) => {}
        }
      }
      None => self.token.cancelled().await,
    }
  }
}
