//! Application state: the in-memory recipe collection, its filters, and
//! optimistic mutations over the recipe store.

use std::time::{Duration, Instant};
use tracing::warn;

use crate::error::StoreError;
use crate::recipe::filter::Filters;
use crate::recipe::types::{Recipe, RecipeDraft, RecipePatch};
use crate::remote::RemoteApi;
use crate::store::RecipeStore;

/// Where the current collection came from, as shown to the user.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DataSource {
  /// No refresh has completed yet.
  Checking,
  Connected,
  Disconnected,
}

/// How an optimistic mutation ended.
#[derive(Debug, Clone, PartialEq)]
pub enum MutationOutcome {
  /// The store confirmed it; the payload is the authoritative recipe.
  Committed(Recipe),
  /// The store rejected it and the collection was restored.
  RolledBack(String),
}

/// Refreshes within this window are skipped unless forced.
const DEFAULT_STALE_AFTER: Duration = Duration::from_secs(60);

/// Main application state
pub struct AppState<R: RemoteApi> {
  store: RecipeStore<R>,

  /// The recipe collection as the user currently sees it, including
  /// not-yet-confirmed optimistic entries.
  recipes: Vec<Recipe>,

  /// Active list filters
  pub filters: Filters,

  source: DataSource,
  loading: bool,
  last_error: Option<String>,
  last_refresh: Option<Instant>,
  stale_after: Duration,
}

impl<R: RemoteApi> AppState<R> {
  pub fn new(store: RecipeStore<R>) -> Self {
    Self {
      store,
      recipes: Vec::new(),
      filters: Filters::default(),
      source: DataSource::Checking,
      loading: false,
      last_error: None,
      last_refresh: None,
      stale_after: DEFAULT_STALE_AFTER,
    }
  }

  pub fn with_stale_after(mut self, stale_after: Duration) -> Self {
    self.stale_after = stale_after;
    self
  }

  pub fn recipes(&self) -> &[Recipe] {
    &self.recipes
  }

  /// The collection with the active filters applied.
  pub fn filtered(&self) -> Vec<Recipe> {
    self.filters.apply(&self.recipes)
  }

  pub fn source(&self) -> DataSource {
    self.source
  }

  pub fn is_loading(&self) -> bool {
    self.loading
  }

  pub fn last_error(&self) -> Option<&str> {
    self.last_error.as_deref()
  }

  pub fn find(&self, id: &str) -> Option<&Recipe> {
    self.recipes.iter().find(|r| r.id == id)
  }

  /// Live reachability check, independent of where the current collection
  /// came from.
  pub async fn probe(&self) -> bool {
    self.store.probe().await
  }

  /// Reload the collection from the store. A recent successful refresh is
  /// reused unless `force` is set.
  pub async fn refresh(&mut self, force: bool) {
    if !force {
      if let Some(at) = self.last_refresh {
        if at.elapsed() < self.stale_after {
          return;
        }
      }
    }

    self.loading = true;
    self.source = DataSource::Checking;
    let listing = self.store.list_all().await;
    self.recipes = listing.recipes;
    self.source = if listing.origin.is_remote() {
      DataSource::Connected
    } else {
      DataSource::Disconnected
    };
    self.last_refresh = Some(Instant::now());
    self.loading = false;
  }

  /// Create a recipe optimistically: it appears in the collection at once
  /// under a pending id, then is reconciled with the stored copy or
  /// removed. Validation failures surface immediately with nothing shown.
  pub async fn create(&mut self, draft: RecipeDraft) -> Result<MutationOutcome, StoreError> {
    draft.validate()?;

    let pending_id = format!("pending-{}", chrono::Utc::now().timestamp_millis());
    let tentative = draft.clone().into_recipe(pending_id.clone(), chrono::Utc::now());
    self.recipes.insert(0, tentative);

    match self.store.create(draft).await {
      Ok(recipe) => {
        match self.recipes.iter_mut().find(|r| r.id == pending_id) {
          Some(slot) => *slot = recipe.clone(),
          None => self.recipes.insert(0, recipe.clone()),
        }
        self.last_error = None;
        Ok(MutationOutcome::Committed(recipe))
      }
      Err(e) => {
        self.recipes.retain(|r| r.id != pending_id);
        warn!("create rolled back: {}", e);
        self.last_error = Some(e.to_string());
        Ok(MutationOutcome::RolledBack(e.to_string()))
      }
    }
  }

  /// Patch a recipe optimistically, restoring the previous copy when the
  /// store rejects the change.
  pub async fn update(&mut self, id: &str, patch: RecipePatch) -> Result<MutationOutcome, StoreError> {
    let snapshot = self.find(id).cloned();
    if let Some(recipe) = self.recipes.iter_mut().find(|r| r.id == id) {
      patch.apply_to(recipe);
    }

    match self.store.update(id, patch).await {
      Ok(recipe) => {
        if let Some(slot) = self.recipes.iter_mut().find(|r| r.id == id) {
          *slot = recipe.clone();
        }
        self.last_error = None;
        Ok(MutationOutcome::Committed(recipe))
      }
      Err(e) => {
        match snapshot {
          Some(previous) => {
            if let Some(slot) = self.recipes.iter_mut().find(|r| r.id == id) {
              *slot = previous;
            }
          }
          None => self.recipes.retain(|r| r.id != id),
        }
        warn!("update of {} rolled back: {}", id, e);
        self.last_error = Some(e.to_string());
        Ok(MutationOutcome::RolledBack(e.to_string()))
      }
    }
  }

  pub async fn toggle_favorite(&mut self, id: &str) -> Result<MutationOutcome, StoreError> {
    let target = !self.find(id).map(|r| r.is_favorite).unwrap_or(false);
    self.update(id, RecipePatch::favorite(target)).await
  }

  /// Delete a recipe optimistically, reinserting it at its old position
  /// when no store could drop it.
  pub async fn delete(&mut self, id: &str) -> Result<MutationOutcome, StoreError> {
    let Some(pos) = self.recipes.iter().position(|r| r.id == id) else {
      return Err(StoreError::NotFound(id.to_string()));
    };
    let removed = self.recipes.remove(pos);

    match self.store.delete(id).await {
      Ok(()) => {
        self.last_error = None;
        Ok(MutationOutcome::Committed(removed))
      }
      Err(e) => {
        let pos = pos.min(self.recipes.len());
        self.recipes.insert(pos, removed);
        warn!("delete of {} rolled back: {}", id, e);
        self.last_error = Some(e.to_string());
        Ok(MutationOutcome::RolledBack(e.to_string()))
      }
    }
  }

  #[cfg(test)]
  pub(crate) fn set_recipes(&mut self, recipes: Vec<Recipe>) {
    self.recipes = recipes;
  }
}
