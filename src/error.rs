//! Error taxonomy for the data layer.
//!
//! The classes map to distinct propagation policies: validation failures are
//! surfaced before any I/O, not-found is a user-visible state, transient
//! remote failures are retried and then absorbed by local fallbacks, and only
//! persistence failures (remote and local both failed) block the caller.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum StoreError {
  /// Bad input, rejected before any I/O. Never retried.
  #[error("validation failed: {0}")]
  Validation(String),

  /// The entity is absent from every reachable store.
  #[error("recipe {0} not found")]
  NotFound(String),

  /// Network error, timeout, or server-side failure.
  #[error("remote request failed: {0}")]
  Transient(String),

  /// Both the remote store and the local fallback failed.
  #[error("persistence failed: {0}")]
  Persistence(String),
}

impl StoreError {
  /// Whether the retry wrapper should attempt the operation again.
  pub fn is_retryable(&self) -> bool {
    matches!(self, StoreError::Transient(_))
  }
}

impl From<reqwest::Error> for StoreError {
  fn from(e: reqwest::Error) -> Self {
    if e.is_timeout() {
      StoreError::Transient(format!("request timed out: {}", e))
    } else {
      StoreError::Transient(e.to_string())
    }
  }
}
