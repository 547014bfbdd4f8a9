//! Local durable persistence: a TTL key-value cache and the long-lived
//! offline mirror of the recipe collection, both backed by one SQLite file.

mod mirror;
mod store;

pub use mirror::OfflineMirror;
pub use store::CacheStore;

/// Well-known volatile cache keys.
pub mod keys {
  pub const ALL_RECIPES: &str = "all_recipes";
  pub const FAVORITE_RECIPES: &str = "favorite_recipes";

  pub fn recipe_by_id(id: &str) -> String {
    format!("recipe_{}", id)
  }

  pub fn recipes_by_category(category: &str) -> String {
    format!("recipes_category_{}", category)
  }
}
