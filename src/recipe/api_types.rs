//! Serde-deserializable types matching recipe API rows.
//!
//! Persisted rows are duck-typed: container fields may arrive either as JSON
//! containers or as JSON-encoded strings, depending on which store produced
//! the row. These types absorb both shapes so domain types stay clean.

use chrono::{DateTime, Utc};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Deserializer};
use std::collections::BTreeMap;
use tracing::warn;

use super::types::{Difficulty, Recipe};

/// A field that is either a decoded container or a JSON-encoded string.
#[derive(Debug, Deserialize)]
#[serde(untagged)]
pub enum MaybeEncoded<T> {
  Decoded(T),
  Encoded(String),
}

impl<T: DeserializeOwned + Default> MaybeEncoded<T> {
  /// Decode to the container type. Malformed encoded text degrades to the
  /// empty container, never an error.
  pub fn into_decoded(self, field: &str) -> T {
    match self {
      MaybeEncoded::Decoded(value) => value,
      MaybeEncoded::Encoded(text) => serde_json::from_str(&text).unwrap_or_else(|e| {
        warn!("discarding malformed {} payload: {}", field, e);
        T::default()
      }),
    }
  }
}

impl<T: Default> Default for MaybeEncoded<T> {
  fn default() -> Self {
    MaybeEncoded::Decoded(T::default())
  }
}

/// One recipe row as returned by the API or found in older stored data.
#[derive(Debug, Default, Deserialize)]
pub struct ApiRecipe {
  #[serde(default, deserialize_with = "string_or_number")]
  pub id: String,
  #[serde(default)]
  pub title: String,
  #[serde(default)]
  pub description: Option<String>,
  #[serde(default)]
  pub category: String,
  #[serde(default)]
  pub ingredients: MaybeEncoded<Vec<String>>,
  #[serde(default)]
  pub directions: MaybeEncoded<Vec<String>>,
  #[serde(default)]
  pub additional_instructions: MaybeEncoded<BTreeMap<String, Vec<String>>>,
  #[serde(default)]
  pub images: MaybeEncoded<Vec<String>>,
  #[serde(default)]
  pub prep_time: Option<String>,
  #[serde(default)]
  pub difficulty: Option<String>,
  #[serde(default, deserialize_with = "lenient_bool")]
  pub is_favorite: bool,
  #[serde(default, deserialize_with = "lenient_datetime")]
  pub created_at: Option<DateTime<Utc>>,
  #[serde(default, deserialize_with = "lenient_datetime")]
  pub updated_at: Option<DateTime<Utc>>,
}

impl ApiRecipe {
  /// Normalize a wire row into the canonical recipe shape.
  pub fn into_recipe(self) -> Recipe {
    let now = Utc::now();
    Recipe {
      id: self.id,
      title: self.title,
      description: self.description.unwrap_or_default(),
      category: self.category,
      ingredients: self.ingredients.into_decoded("ingredients"),
      directions: self.directions.into_decoded("directions"),
      additional_instructions: self
        .additional_instructions
        .into_decoded("additional_instructions"),
      images: self.images.into_decoded("images"),
      prep_time: self.prep_time.unwrap_or_default(),
      difficulty: self.difficulty.as_deref().and_then(Difficulty::parse),
      is_favorite: self.is_favorite,
      created_at: self.created_at.unwrap_or(now),
      updated_at: self.updated_at.unwrap_or(now),
    }
  }
}

/// Ids arrive as strings from some stores and as numbers from others.
fn string_or_number<'de, D>(deserializer: D) -> Result<String, D::Error>
where
  D: Deserializer<'de>,
{
  let value = serde_json::Value::deserialize(deserializer)?;
  Ok(match value {
    serde_json::Value::String(s) => s,
    other => other.to_string(),
  })
}

/// Flags arrive as booleans from the API but as 0/1 integers from rows
/// that passed through SQLite.
fn lenient_bool<'de, D>(deserializer: D) -> Result<bool, D::Error>
where
  D: Deserializer<'de>,
{
  let value = serde_json::Value::deserialize(deserializer)?;
  Ok(match value {
    serde_json::Value::Bool(b) => b,
    serde_json::Value::Number(n) => n.as_i64().unwrap_or(0) != 0,
    _ => false,
  })
}

/// Timestamps arrive as RFC 3339 from the API but as naive
/// `YYYY-MM-DD HH:MM:SS` text from older stored data. Unparseable values
/// report absent so the caller can default them.
fn lenient_datetime<'de, D>(deserializer: D) -> Result<Option<DateTime<Utc>>, D::Error>
where
  D: Deserializer<'de>,
{
  let raw: Option<String> = Option::deserialize(deserializer)?;
  Ok(raw.as_deref().and_then(parse_datetime))
}

fn parse_datetime(s: &str) -> Option<DateTime<Utc>> {
  DateTime::parse_from_rfc3339(s)
    .map(|dt| dt.with_timezone(&Utc))
    .ok()
    .or_else(|| {
      chrono::NaiveDateTime::parse_from_str(s, "%Y-%m-%d %H:%M:%S%.f")
        .map(|naive| naive.and_utc())
        .ok()
    })
}
