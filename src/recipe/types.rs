use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use crate::error::StoreError;

use super::categories;

/// Cooking difficulty levels.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Difficulty {
  Easy,
  Medium,
  Hard,
}

impl Difficulty {
  /// Parse a stored or wire value. Unknown values map to None rather than
  /// failing the whole row.
  pub fn parse(s: &str) -> Option<Self> {
    match s.trim().to_lowercase().as_str() {
      "easy" => Some(Difficulty::Easy),
      "medium" => Some(Difficulty::Medium),
      "hard" => Some(Difficulty::Hard),
      _ => None,
    }
  }

  pub fn as_str(&self) -> &'static str {
    match self {
      Difficulty::Easy => "easy",
      Difficulty::Medium => "medium",
      Difficulty::Hard => "hard",
    }
  }
}

/// A recipe as held in application state and in both persisted stores.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Recipe {
  /// Opaque unique identifier. Server-assigned, or synthesized with a
  /// `local-` prefix when created offline. Immutable after creation.
  pub id: String,
  pub title: String,
  #[serde(default)]
  pub description: String,
  pub category: String,
  pub ingredients: Vec<String>,
  pub directions: Vec<String>,
  /// Extra named step sections, e.g. "Sauce".
  #[serde(default)]
  pub additional_instructions: BTreeMap<String, Vec<String>>,
  /// Data URLs or links; the first entry is the primary display image.
  #[serde(default)]
  pub images: Vec<String>,
  #[serde(default)]
  pub prep_time: String,
  #[serde(default)]
  pub difficulty: Option<Difficulty>,
  #[serde(default)]
  pub is_favorite: bool,
  pub created_at: DateTime<Utc>,
  pub updated_at: DateTime<Utc>,
}

/// Input for creating a recipe. The id and timestamps are assigned by
/// whichever store persists it.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RecipeDraft {
  pub title: String,
  #[serde(default)]
  pub description: String,
  pub category: String,
  #[serde(default)]
  pub ingredients: Vec<String>,
  #[serde(default)]
  pub directions: Vec<String>,
  #[serde(default)]
  pub additional_instructions: BTreeMap<String, Vec<String>>,
  #[serde(default)]
  pub images: Vec<String>,
  #[serde(default)]
  pub prep_time: String,
  #[serde(default)]
  pub difficulty: Option<Difficulty>,
  #[serde(default)]
  pub is_favorite: bool,
}

impl RecipeDraft {
  /// Check required fields. Runs before any I/O.
  pub fn validate(&self) -> Result<(), StoreError> {
    if self.title.trim().is_empty() {
      return Err(StoreError::Validation("title must not be empty".into()));
    }
    if !categories::is_known(&self.category) {
      return Err(StoreError::Validation(format!(
        "unknown category '{}'",
        self.category
      )));
    }
    if self.ingredients.is_empty() {
      return Err(StoreError::Validation(
        "at least one ingredient is required".into(),
      ));
    }
    if self.directions.is_empty() {
      return Err(StoreError::Validation(
        "at least one direction is required".into(),
      ));
    }
    Ok(())
  }

  /// Materialize into a full recipe with the given id and timestamps.
  pub fn into_recipe(self, id: String, now: DateTime<Utc>) -> Recipe {
    Recipe {
      id,
      title: self.title,
      description: self.description,
      category: self.category,
      ingredients: self.ingredients,
      directions: self.directions,
      additional_instructions: self.additional_instructions,
      images: self.images,
      prep_time: self.prep_time,
      difficulty: self.difficulty,
      is_favorite: self.is_favorite,
      created_at: now,
      updated_at: now,
    }
  }
}

/// A partial set of field changes for an update. Absent fields keep their
/// existing values; id and created_at are never patchable.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RecipePatch {
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub title: Option<String>,
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub description: Option<String>,
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub category: Option<String>,
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub ingredients: Option<Vec<String>>,
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub directions: Option<Vec<String>>,
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub additional_instructions: Option<BTreeMap<String, Vec<String>>>,
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub images: Option<Vec<String>>,
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub prep_time: Option<String>,
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub difficulty: Option<Difficulty>,
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub is_favorite: Option<bool>,
}

impl RecipePatch {
  /// A patch that changes only the favorite flag.
  pub fn favorite(value: bool) -> Self {
    RecipePatch {
      is_favorite: Some(value),
      ..Default::default()
    }
  }

  /// Apply over an existing recipe. Does not touch id, created_at, or
  /// updated_at; the persisting store refreshes updated_at.
  pub fn apply_to(&self, recipe: &mut Recipe) {
    if let Some(title) = &self.title {
      recipe.title = title.clone();
    }
    if let Some(description) = &self.description {
      recipe.description = description.clone();
    }
    if let Some(category) = &self.category {
      recipe.category = category.clone();
    }
    if let Some(ingredients) = &self.ingredients {
      recipe.ingredients = ingredients.clone();
    }
    if let Some(directions) = &self.directions {
      recipe.directions = directions.clone();
    }
    if let Some(additional) = &self.additional_instructions {
      recipe.additional_instructions = additional.clone();
    }
    if let Some(images) = &self.images {
      recipe.images = images.clone();
    }
    if let Some(prep_time) = &self.prep_time {
      recipe.prep_time = prep_time.clone();
    }
    if let Some(difficulty) = self.difficulty {
      recipe.difficulty = Some(difficulty);
    }
    if let Some(is_favorite) = self.is_favorite {
      recipe.is_favorite = is_favorite;
    }
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  fn draft() -> RecipeDraft {
    RecipeDraft {
      title: "Soup".into(),
      category: "soups".into(),
      ingredients: vec!["water".into()],
      directions: vec!["boil".into()],
      ..Default::default()
    }
  }

  #[test]
  fn validate_accepts_minimal_draft() {
    assert!(draft().validate().is_ok());
  }

  #[test]
  fn validate_rejects_empty_ingredients() {
    let mut d = draft();
    d.ingredients.clear();
    assert!(matches!(d.validate(), Err(StoreError::Validation(_))));
  }

  #[test]
  fn validate_rejects_unknown_category() {
    let mut d = draft();
    d.category = "astronaut-food".into();
    assert!(matches!(d.validate(), Err(StoreError::Validation(_))));
  }

  #[test]
  fn patch_preserves_identity_fields() {
    let now = chrono::Utc::now();
    let mut recipe = draft().into_recipe("r1".into(), now);
    let patch = RecipePatch {
      title: Some("Better Soup".into()),
      is_favorite: Some(true),
      ..Default::default()
    };
    patch.apply_to(&mut recipe);
    assert_eq!(recipe.id, "r1");
    assert_eq!(recipe.title, "Better Soup");
    assert!(recipe.is_favorite);
    assert_eq!(recipe.created_at, now);
    assert_eq!(recipe.ingredients, vec!["water".to_string()]);
  }
}
