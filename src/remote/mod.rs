//! Remote recipe store: availability probing and resilient HTTP calls.

mod client;
mod retry;

#[cfg(test)]
pub mod mock;

pub use client::ApiClient;
pub use retry::with_retry;

use crate::error::StoreError;
use crate::recipe::types::{Recipe, RecipeDraft, RecipePatch};

/// Operations the data access layer needs from the remote store.
///
/// `ApiClient` implements this against the HTTP API; tests substitute an
/// in-memory mock with forced failures and call counters.
pub trait RemoteApi {
  /// Cheap reachability check. Collapses every failure mode to `false`.
  async fn probe(&self) -> bool;

  async fn list_recipes(&self) -> Result<Vec<Recipe>, StoreError>;

  /// `Ok(None)` is the explicit not-found outcome, distinct from an error.
  async fn get_recipe(&self, id: &str) -> Result<Option<Recipe>, StoreError>;

  async fn create_recipe(&self, draft: &RecipeDraft) -> Result<Recipe, StoreError>;

  async fn update_recipe(&self, id: &str, patch: &RecipePatch) -> Result<Recipe, StoreError>;

  /// Deleting an id that is already gone is a success.
  async fn delete_recipe(&self, id: &str) -> Result<(), StoreError>;
}
