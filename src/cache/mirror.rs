//! Long-lived offline mirror of the recipe collection.
//!
//! Older on-device layouts stored the mirror under more than one key. New
//! writes go to the canonical key only; a one-time migration merges any
//! legacy data forward, and removals still sweep every known key so a
//! deleted recipe cannot resurrect from a stale copy.

use std::sync::Arc;
use tracing::{info, warn};

use crate::error::StoreError;
use crate::recipe::types::Recipe;

use super::store::CacheStore;

/// Canonical mirror key.
pub(crate) const MIRROR_KEY: &str = "recipes_mirror";
/// Keys used by older on-device layouts for the same collection.
pub(crate) const LEGACY_KEYS: &[&str] = &["fallback_recipes", "recipes_cache"];

pub struct OfflineMirror {
  store: Arc<CacheStore>,
}

impl OfflineMirror {
  pub fn new(store: Arc<CacheStore>) -> Self {
    let mirror = Self { store };
    mirror.migrate_legacy();
    mirror
  }

  /// Merge legacy mirror keys into the canonical key, canonical data taking
  /// precedence on id collisions, then drop the legacy rows.
  fn migrate_legacy(&self) {
    let mut merged: Vec<Recipe> = self
      .store
      .get_persistent(MIRROR_KEY)
      .unwrap_or_default();
    let mut found_legacy = false;

    for key in LEGACY_KEYS {
      if let Some(rows) = self.store.get_persistent::<Vec<Recipe>>(key) {
        found_legacy = true;
        for recipe in rows {
          if !merged.iter().any(|m| m.id == recipe.id) {
            merged.push(recipe);
          }
        }
      }
    }

    if !found_legacy {
      return;
    }

    info!("migrating legacy mirror keys, {} recipes total", merged.len());
    if let Err(e) = self.store.set_persistent(MIRROR_KEY, &merged) {
      warn!("legacy mirror migration failed, keeping old keys: {}", e);
      return;
    }
    for key in LEGACY_KEYS {
      self.store.delete_persistent(key);
    }
  }

  /// The full mirrored collection; empty when nothing was mirrored yet.
  pub fn load(&self) -> Vec<Recipe> {
    self.store.get_persistent(MIRROR_KEY).unwrap_or_default()
  }

  pub fn save(&self, recipes: &[Recipe]) -> Result<(), StoreError> {
    self
      .store
      .set_persistent(MIRROR_KEY, &recipes)
      .map_err(|e| StoreError::Persistence(format!("mirror write failed: {}", e)))
  }

  /// Remove an id from the canonical key and from any legacy key that still
  /// holds data.
  pub fn remove(&self, id: &str) -> Result<(), StoreError> {
    let mut last_failure = None;

    for key in std::iter::once(&MIRROR_KEY).chain(LEGACY_KEYS.iter()) {
      let Some(mut rows) = self.store.get_persistent::<Vec<Recipe>>(key) else {
        continue;
      };
      let before = rows.len();
      rows.retain(|r| r.id != id);
      if rows.len() == before {
        continue;
      }
      if let Err(e) = self.store.set_persistent(key, &rows) {
        warn!("failed to remove {} from mirror key {}: {}", id, key, e);
        last_failure = Some(e.to_string());
      }
    }

    match last_failure {
      Some(e) => Err(StoreError::Persistence(format!(
        "mirror removal of {} failed: {}",
        id, e
      ))),
      None => Ok(()),
    }
  }
}
