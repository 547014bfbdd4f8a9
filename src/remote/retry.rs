//! Generic retry wrapper with exponential backoff.

use std::future::Future;
use std::time::Duration;
use tracing::warn;

use crate::error::StoreError;

pub const DEFAULT_MAX_ATTEMPTS: u32 = 3;
pub const DEFAULT_INITIAL_DELAY: Duration = Duration::from_secs(1);

/// Run `op` up to `max_attempts` times, doubling the wait between attempts.
/// Errors that are not transient (validation, not-found) abort immediately;
/// after the attempts are exhausted the last failure propagates.
pub async fn with_retry<T, F, Fut>(
  mut op: F,
  max_attempts: u32,
  initial_delay: Duration,
) -> Result<T, StoreError>
where
  F: FnMut() -> Fut,
  Fut: Future<Output = Result<T, StoreError>>,
{
  let mut delay = initial_delay;
  let mut attempt = 1;

  loop {
    match op().await {
      Ok(value) => return Ok(value),
      Err(e) if e.is_retryable() && attempt < max_attempts => {
        warn!(
          "attempt {}/{} failed, retrying in {:?}: {}",
          attempt, max_attempts, delay, e
        );
        tokio::time::sleep(delay).await;
        delay *= 2;
        attempt += 1;
      }
      Err(e) => return Err(e),
    }
  }
}
