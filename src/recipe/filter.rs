//! Pure, synchronous filtering and sorting over the in-memory collection.

use super::types::{Difficulty, Recipe};

/// Sort order applied after filtering.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SortOrder {
  TitleAsc,
  TitleDesc,
  Newest,
  Oldest,
}

impl SortOrder {
  pub fn parse(s: &str) -> Option<Self> {
    match s {
      "title-asc" => Some(SortOrder::TitleAsc),
      "title-desc" => Some(SortOrder::TitleDesc),
      "newest" => Some(SortOrder::Newest),
      "oldest" => Some(SortOrder::Oldest),
      _ => None,
    }
  }
}

/// Independent filter criteria. All active predicates compose by logical
/// AND; the sort is applied last.
#[derive(Debug, Clone, Default)]
pub struct Filters {
  /// Case-insensitive substring over title, ingredients, and directions.
  pub query: String,
  pub category: String,
  pub favorites_only: bool,
  /// Newest-first ordering when no explicit sort is set.
  pub recent_only: bool,
  pub difficulty: Option<Difficulty>,
  /// Some(true) = only with images, Some(false) = only without.
  pub has_images: Option<bool>,
  /// Case-insensitive substring over ingredients only.
  pub ingredient: String,
  pub sort: Option<SortOrder>,
}

impl Filters {
  /// Filter and sort a collection. Relative order is preserved unless a
  /// sort is active.
  pub fn apply(&self, recipes: &[Recipe]) -> Vec<Recipe> {
    let mut filtered: Vec<Recipe> = recipes
      .iter()
      .filter(|r| self.matches(r))
      .cloned()
      .collect();

    match self.sort {
      Some(SortOrder::TitleAsc) => {
        filtered.sort_by_key(|r| r.title.to_lowercase());
      }
      Some(SortOrder::TitleDesc) => {
        filtered.sort_by_key(|r| std::cmp::Reverse(r.title.to_lowercase()));
      }
      Some(SortOrder::Newest) => {
        filtered.sort_by_key(|r| std::cmp::Reverse(r.created_at));
      }
      Some(SortOrder::Oldest) => {
        filtered.sort_by_key(|r| r.created_at);
      }
      None => {
        if self.recent_only {
          filtered.sort_by_key(|r| std::cmp::Reverse(r.created_at));
        }
      }
    }

    filtered
  }

  fn matches(&self, recipe: &Recipe) -> bool {
    if !self.query.is_empty() {
      let query = self.query.to_lowercase();
      let hit = recipe.title.to_lowercase().contains(&query)
        || recipe
          .ingredients
          .iter()
          .any(|i| i.to_lowercase().contains(&query))
        || recipe
          .directions
          .iter()
          .any(|d| d.to_lowercase().contains(&query));
      if !hit {
        return false;
      }
    }

    if !self.category.is_empty() && recipe.category != self.category {
      return false;
    }

    if self.favorites_only && !recipe.is_favorite {
      return false;
    }

    if let Some(difficulty) = self.difficulty {
      if recipe.difficulty != Some(difficulty) {
        return false;
      }
    }

    if let Some(with_images) = self.has_images {
      if recipe.images.is_empty() == with_images {
        return false;
      }
    }

    if !self.ingredient.is_empty() {
      let needle = self.ingredient.to_lowercase();
      if !recipe
        .ingredients
        .iter()
        .any(|i| i.to_lowercase().contains(&needle))
      {
        return false;
      }
    }

    true
  }
}
