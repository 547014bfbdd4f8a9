//! The recipe store façade. Every read prefers fresh remote data but
//! degrades through the response cache and the offline mirror; every
//! write lands remotely when the server is reachable and locally when
//! it is not, so the catalog stays usable either way.

use chrono::Utc;
use std::sync::Arc;
use tracing::{debug, info, warn};

use crate::cache::{keys, CacheStore, OfflineMirror};
use crate::error::StoreError;
use crate::recipe::categories;
use crate::recipe::sample;
use crate::recipe::types::{Recipe, RecipeDraft, RecipePatch};
use crate::remote::RemoteApi;

/// Where a listing's data came from, in descending freshness.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Origin {
  Remote,
  Cache,
  Mirror,
  Sample,
}

impl Origin {
  /// Cache entries are recent remote data, so both count as connected.
  pub fn is_remote(&self) -> bool {
    matches!(self, Origin::Remote | Origin::Cache)
  }
}

pub struct Listing {
  pub recipes: Vec<Recipe>,
  pub origin: Origin,
}

pub struct RecipeStore<R: RemoteApi> {
  remote: R,
  cache: Arc<CacheStore>,
  mirror: OfflineMirror,
}

impl<R: RemoteApi> RecipeStore<R> {
  /// Building the store also migrates any legacy mirror data forward.
  pub fn new(remote: R, cache: Arc<CacheStore>) -> Self {
    let mirror = OfflineMirror::new(Arc::clone(&cache));
    Self {
      remote,
      cache,
      mirror,
    }
  }

  pub async fn probe(&self) -> bool {
    self.remote.probe().await
  }

  /// The full catalog: cache, then remote, then the offline fallbacks.
  pub async fn list_all(&self) -> Listing {
    if let Some(recipes) = self.cache.get::<Vec<Recipe>>(keys::ALL_RECIPES) {
      if !recipes.is_empty() {
        debug!("serving {} recipes from cache", recipes.len());
        return Listing {
          recipes,
          origin: Origin::Cache,
        };
      }
    }

    if self.remote.probe().await {
      match self.remote.list_recipes().await {
        Ok(recipes) => {
          self.cache.set(keys::ALL_RECIPES, &recipes, None);
          if let Err(e) = self.mirror.save(&recipes) {
            warn!("could not refresh offline mirror: {}", e);
          }
          return Listing {
            recipes,
            origin: Origin::Remote,
          };
        }
        Err(e) => warn!("remote listing failed, falling back: {}", e),
      }
    }

    self.list_offline()
  }

  /// Mirror contents, or the built-in samples when nothing was ever
  /// mirrored. Samples are written to the mirror so edits to them stick.
  fn list_offline(&self) -> Listing {
    let mirrored = self.mirror.load();
    if !mirrored.is_empty() {
      return Listing {
        recipes: mirrored,
        origin: Origin::Mirror,
      };
    }

    info!("mirror is empty, seeding sample recipes");
    let samples = sample::seed_recipes();
    if let Err(e) = self.mirror.save(&samples) {
      warn!("could not persist sample recipes: {}", e);
    }
    Listing {
      recipes: samples,
      origin: Origin::Sample,
    }
  }

  /// A single recipe. Remote miss is a definitive `None`; remote failure
  /// falls back to cached and offline copies.
  pub async fn get(&self, id: &str) -> Option<Recipe> {
    if self.remote.probe().await {
      match self.remote.get_recipe(id).await {
        Ok(Some(recipe)) => {
          self.cache.set(&keys::recipe_by_id(id), &recipe, None);
          return Some(recipe);
        }
        Ok(None) => return None,
        Err(e) => warn!("remote lookup of {} failed, falling back: {}", id, e),
      }
    }

    if let Some(recipe) = self.cache.get::<Recipe>(&keys::recipe_by_id(id)) {
      return Some(recipe);
    }
    self
      .list_offline()
      .recipes
      .into_iter()
      .find(|r| r.id == id)
  }

  /// Recipes in one category, served from the derived cache view when
  /// available.
  pub async fn list_by_category(&self, category: &str) -> Listing {
    let key = keys::recipes_by_category(category);
    if let Some(recipes) = self.cache.get::<Vec<Recipe>>(&key) {
      return Listing {
        recipes,
        origin: Origin::Cache,
      };
    }

    let listing = self.list_all().await;
    let recipes: Vec<Recipe> = listing
      .recipes
      .into_iter()
      .filter(|r| r.category == category)
      .collect();
    self.cache.set(&key, &recipes, None);
    Listing {
      recipes,
      origin: listing.origin,
    }
  }

  pub async fn favorites(&self) -> Listing {
    if let Some(recipes) = self.cache.get::<Vec<Recipe>>(keys::FAVORITE_RECIPES) {
      return Listing {
        recipes,
        origin: Origin::Cache,
      };
    }

    let listing = self.list_all().await;
    let recipes: Vec<Recipe> = listing
      .recipes
      .into_iter()
      .filter(|r| r.is_favorite)
      .collect();
    self.cache.set(keys::FAVORITE_RECIPES, &recipes, None);
    Listing {
      recipes,
      origin: listing.origin,
    }
  }

  /// Create a recipe, remotely when reachable, otherwise locally under a
  /// synthesized id. Validation failures never reach any store.
  pub async fn create(&self, draft: RecipeDraft) -> Result<Recipe, StoreError> {
    draft.validate()?;

    if self.remote.probe().await {
      match self.remote.create_recipe(&draft).await {
        Ok(recipe) => {
          self.record_in_mirror(recipe.clone());
          self.invalidate(&recipe.id);
          return Ok(recipe);
        }
        Err(e @ StoreError::Validation(_)) => return Err(e),
        Err(e) => warn!("remote create failed, storing locally: {}", e),
      }
    }

    self.create_local(draft)
  }

  fn create_local(&self, draft: RecipeDraft) -> Result<Recipe, StoreError> {
    let recipe = draft.into_recipe(local_id(), Utc::now());
    let mut recipes = self.mirror.load();
    recipes.insert(0, recipe.clone());
    self.mirror.save(&recipes)?;
    self.invalidate(&recipe.id);
    info!("created {} locally as {}", recipe.title, recipe.id);
    Ok(recipe)
  }

  /// Patch a recipe. A remote not-found is definitive and surfaces as an
  /// error; a remote failure falls back to patching the mirror copy.
  pub async fn update(&self, id: &str, patch: RecipePatch) -> Result<Recipe, StoreError> {
    if self.remote.probe().await {
      match self.remote.update_recipe(id, &patch).await {
        Ok(recipe) => {
          self.record_in_mirror(recipe.clone());
          self.invalidate(id);
          return Ok(recipe);
        }
        Err(e @ (StoreError::NotFound(_) | StoreError::Validation(_))) => return Err(e),
        Err(e) => warn!("remote update of {} failed, patching locally: {}", id, e),
      }
    }

    self.update_local(id, &patch)
  }

  fn update_local(&self, id: &str, patch: &RecipePatch) -> Result<Recipe, StoreError> {
    let mut recipes = self.mirror.load();
    let recipe = recipes
      .iter_mut()
      .find(|r| r.id == id)
      .ok_or_else(|| StoreError::NotFound(id.to_string()))?;
    patch.apply_to(recipe);
    recipe.updated_at = Utc::now();
    let updated = recipe.clone();
    self.mirror.save(&recipes)?;
    self.invalidate(id);
    Ok(updated)
  }

  pub async fn toggle_favorite(&self, id: &str, value: bool) -> Result<Recipe, StoreError> {
    self.update(id, RecipePatch::favorite(value)).await
  }

  /// Delete everywhere. The remote and mirror removals are independent;
  /// the operation only fails when neither store could drop the recipe.
  pub async fn delete(&self, id: &str) -> Result<(), StoreError> {
    let remote_failed = if self.remote.probe().await {
      match self.remote.delete_recipe(id).await {
        Ok(()) => false,
        Err(e) => {
          warn!("remote delete of {} failed: {}", id, e);
          true
        }
      }
    } else {
      true
    };

    let mirror_result = self.mirror.remove(id);
    self.invalidate(id);

    match mirror_result {
      Err(e) if remote_failed => Err(e),
      _ => Ok(()),
    }
  }

  /// Wipe the response cache and the offline mirror.
  pub fn clear_cache(&self) {
    self.cache.clear();
  }

  #[cfg(test)]
  pub(crate) fn remote_for_tests(&self) -> &R {
    &self.remote
  }

  /// Upsert one recipe into the mirror, newest first.
  fn record_in_mirror(&self, recipe: Recipe) {
    let mut recipes = self.mirror.load();
    match recipes.iter_mut().find(|r| r.id == recipe.id) {
      Some(existing) => *existing = recipe,
      None => recipes.insert(0, recipe),
    }
    if let Err(e) = self.mirror.save(&recipes) {
      warn!("could not update offline mirror: {}", e);
    }
  }

  /// Drop every view that could contain the touched recipe. Category
  /// views are swept wholesale since the patch may have moved it.
  fn invalidate(&self, id: &str) {
    self.cache.delete(keys::ALL_RECIPES);
    self.cache.delete(keys::FAVORITE_RECIPES);
    self.cache.delete(&keys::recipe_by_id(id));
    for (category, _) in categories::CATEGORIES {
      self.cache.delete(&keys::recipes_by_category(category));
    }
  }
}

/// Offline ids carry a `local-` prefix so they can never collide with
/// server-assigned ones.
fn local_id() -> String {
  format!(
    "local-{}-{:08x}",
    Utc::now().timestamp_millis(),
    rand::random::<u32>()
  )
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::recipe::types::Difficulty;
  use crate::remote::mock::MockRemote;
  use std::collections::BTreeMap;

  fn store(remote: MockRemote) -> RecipeStore<MockRemote> {
    let cache = Arc::new(CacheStore::open_in_memory().unwrap());
    RecipeStore::new(remote, cache)
  }

  fn soup_draft() -> RecipeDraft {
    RecipeDraft {
      title: "Soup".into(),
      category: "soups".into(),
      ingredients: vec!["water".into(), "salt".into()],
      directions: vec!["boil".into()],
      ..Default::default()
    }
  }

  #[tokio::test]
  async fn invalid_draft_never_reaches_any_store() {
    let store = store(MockRemote::new());
    let result = store
      .create(RecipeDraft {
        title: "  ".into(),
        ..soup_draft()
      })
      .await;

    assert!(matches!(result, Err(StoreError::Validation(_))));
    assert_eq!(store.remote_for_tests().total_calls(), 0);
    assert!(store.mirror.load().is_empty());
  }

  #[tokio::test]
  async fn online_create_round_trips_through_the_server() {
    let store = store(MockRemote::new());
    let created = store.create(soup_draft()).await.unwrap();

    assert_eq!(created.id, "srv-1");
    assert_eq!(created.created_at, created.updated_at);
    assert!(!created.is_favorite);

    let listing = store.list_all().await;
    assert_eq!(listing.origin, Origin::Remote);
    assert_eq!(listing.recipes.len(), 1);
    assert_eq!(listing.recipes[0].title, "Soup");
  }

  #[tokio::test]
  async fn second_listing_is_served_from_cache() {
    let remote = MockRemote::with_recipes(vec![
      soup_draft().into_recipe("srv-9".into(), Utc::now()),
    ]);
    let store = store(remote);

    assert_eq!(store.list_all().await.origin, Origin::Remote);
    assert_eq!(store.list_all().await.origin, Origin::Cache);
    assert_eq!(
      store
        .remote_for_tests()
        .calls
        .list
        .load(std::sync::atomic::Ordering::SeqCst),
      1
    );
  }

  #[tokio::test]
  async fn offline_listing_seeds_samples_once() {
    let store = store(MockRemote::offline());

    let first = store.list_all().await;
    assert_eq!(first.origin, Origin::Sample);
    assert!(!first.recipes.is_empty());

    // Seeding persisted the samples, so they now come from the mirror.
    let second = store.list_all().await;
    assert_eq!(second.origin, Origin::Mirror);
    assert_eq!(second.recipes.len(), first.recipes.len());
  }

  #[tokio::test]
  async fn offline_create_appears_exactly_once_in_listings() {
    let store = store(MockRemote::offline());
    store.list_all().await; // seed the mirror

    let created = store.create(soup_draft()).await.unwrap();
    assert!(created.id.starts_with("local-"));

    let listing = store.list_all().await;
    assert_eq!(listing.origin, Origin::Mirror);
    let matches: Vec<&Recipe> = listing.recipes.iter().filter(|r| r.id == created.id).collect();
    assert_eq!(matches.len(), 1);
    assert_eq!(listing.recipes[0].id, created.id);
  }

  #[tokio::test]
  async fn offline_update_patches_the_mirror_copy() {
    let store = store(MockRemote::offline());
    let created = store.create(soup_draft()).await.unwrap();

    let updated = store
      .update(
        &created.id,
        RecipePatch {
          title: Some("Better Soup".into()),
          ..Default::default()
        },
      )
      .await
      .unwrap();

    assert_eq!(updated.title, "Better Soup");
    assert!(updated.updated_at >= created.updated_at);
    assert_eq!(updated.created_at, created.created_at);

    let listing = store.list_all().await;
    assert_eq!(listing.recipes[0].title, "Better Soup");
  }

  #[tokio::test]
  async fn update_of_unknown_remote_id_is_a_hard_error() {
    let store = store(MockRemote::new());
    let result = store.update("srv-404", RecipePatch::favorite(true)).await;
    assert!(matches!(result, Err(StoreError::NotFound(_))));
  }

  #[tokio::test]
  async fn get_falls_back_to_the_mirror_when_offline() {
    let store = store(MockRemote::offline());
    let created = store.create(soup_draft()).await.unwrap();

    let found = store.get(&created.id).await.unwrap();
    assert_eq!(found.id, created.id);
    assert!(store.get("no-such-id").await.is_none());
  }

  #[tokio::test]
  async fn delete_is_idempotent() {
    let store = store(MockRemote::new());
    let created = store.create(soup_draft()).await.unwrap();

    store.delete(&created.id).await.unwrap();
    store.delete(&created.id).await.unwrap();
    assert!(store.list_all().await.recipes.is_empty());
  }

  #[tokio::test]
  async fn toggle_favorite_feeds_the_favorites_view() {
    let store = store(MockRemote::new());
    let created = store.create(soup_draft()).await.unwrap();

    store.toggle_favorite(&created.id, true).await.unwrap();
    let favorites = store.favorites().await;
    assert_eq!(favorites.recipes.len(), 1);
    assert!(favorites.recipes[0].is_favorite);

    store.toggle_favorite(&created.id, false).await.unwrap();
    assert!(store.favorites().await.recipes.is_empty());
  }

  #[tokio::test]
  async fn category_view_filters_the_catalog() {
    let now = Utc::now();
    let remote = MockRemote::with_recipes(vec![
      soup_draft().into_recipe("srv-1".into(), now),
      RecipeDraft {
        title: "Greek Salad".into(),
        category: "salads".into(),
        ingredients: vec!["feta".into()],
        directions: vec!["mix".into()],
        ..Default::default()
      }
      .into_recipe("srv-2".into(), now),
    ]);
    let store = store(remote);

    let soups = store.list_by_category("soups").await;
    assert_eq!(soups.recipes.len(), 1);
    assert_eq!(soups.recipes[0].category, "soups");
    // Second read comes from the derived cache view.
    assert_eq!(store.list_by_category("soups").await.origin, Origin::Cache);
  }

  #[tokio::test]
  async fn reachable_but_failing_list_falls_back_to_the_mirror() {
    let remote = MockRemote::with_recipes(vec![
      soup_draft().into_recipe("srv-1".into(), Utc::now()),
    ]);
    let store = store(remote);
    store.list_all().await; // mirror now holds the catalog
    store.cache.clear_volatile();

    // The server answers the probe but every listing call fails, which is
    // exactly what retry exhaustion looks like to the caller.
    store.remote_for_tests().set_fail_reads(true);

    let listing = store.list_all().await;
    assert_eq!(listing.origin, Origin::Mirror);
    assert_eq!(listing.recipes[0].id, "srv-1");
  }

  #[tokio::test]
  async fn reachable_but_failing_create_stores_locally() {
    let store = store(MockRemote::new());
    store.remote_for_tests().set_fail_writes(true);

    let created = store.create(soup_draft()).await.unwrap();
    assert!(created.id.starts_with("local-"));
    assert_eq!(store.mirror.load()[0].id, created.id);
    assert!(store.remote_for_tests().recipes().is_empty());
  }

  #[tokio::test]
  async fn reachable_but_failing_update_patches_the_mirror_copy() {
    let store = store(MockRemote::new());
    let created = store.create(soup_draft()).await.unwrap();
    store.remote_for_tests().set_fail_writes(true);

    let updated = store
      .update(
        &created.id,
        RecipePatch {
          title: Some("Rescued Soup".into()),
          ..Default::default()
        },
      )
      .await
      .unwrap();

    assert_eq!(updated.title, "Rescued Soup");
    assert_eq!(store.mirror.load()[0].title, "Rescued Soup");
  }

  #[tokio::test]
  async fn created_recipe_reads_back_with_every_field_intact() {
    let store = store(MockRemote::new());
    let draft = RecipeDraft {
      description: "A weeknight staple".into(),
      images: vec!["data:image/jpeg;base64,abcd".into()],
      prep_time: "30 min".into(),
      difficulty: Some(Difficulty::Easy),
      additional_instructions: BTreeMap::from([(
        "Garnish".to_string(),
        vec!["chop parsley".to_string()],
      )]),
      ..soup_draft()
    };

    let created = store.create(draft.clone()).await.unwrap();
    let fetched = store.get(&created.id).await.unwrap();

    assert_eq!(fetched.title, draft.title);
    assert_eq!(fetched.category, draft.category);
    assert_eq!(fetched.ingredients, draft.ingredients);
    assert_eq!(fetched.directions, draft.directions);
    assert_eq!(fetched.images, draft.images);
    assert_eq!(
      fetched.additional_instructions,
      draft.additional_instructions
    );
    assert_eq!(fetched.description, draft.description);
    assert_eq!(fetched.prep_time, draft.prep_time);
    assert_eq!(fetched.difficulty, draft.difficulty);
  }

  #[tokio::test]
  async fn remote_outage_after_caching_serves_the_mirror() {
    let remote = MockRemote::with_recipes(vec![
      soup_draft().into_recipe("srv-1".into(), Utc::now()),
    ]);
    let store = store(remote);
    store.list_all().await; // populate cache and mirror
    store.cache.clear_volatile();
    store.remote_for_tests().set_reachable(false);

    let listing = store.list_all().await;
    assert_eq!(listing.origin, Origin::Mirror);
    assert_eq!(listing.recipes[0].id, "srv-1");
  }
}
