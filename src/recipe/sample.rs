//! Built-in sample recipes, used to seed an empty offline mirror so the
//! catalog is never empty on first run.

use chrono::{Duration, Utc};
use std::collections::BTreeMap;

use super::types::{Difficulty, Recipe};

pub fn seed_recipes() -> Vec<Recipe> {
  vec![
    sample(
      0,
      "Tomato Soup",
      "soups",
      Difficulty::Easy,
      "30 min",
      &["6 ripe tomatoes", "1 onion", "2 cloves garlic", "1l vegetable stock", "salt and pepper"],
      &[
        "Dice the onion and garlic and soften in a pot",
        "Add chopped tomatoes and cook for 5 minutes",
        "Pour in the stock and simmer for 20 minutes",
        "Blend until smooth and season to taste",
      ],
    ),
    sample(
      1,
      "Greek Salad",
      "salads",
      Difficulty::Easy,
      "15 min",
      &["2 cucumbers", "4 tomatoes", "1 red onion", "200g feta", "olives", "olive oil"],
      &[
        "Chop the vegetables into large chunks",
        "Combine in a bowl with the olives",
        "Top with feta and dress with olive oil",
      ],
    ),
    sample(
      2,
      "Chocolate Chip Cookies",
      "cookies",
      Difficulty::Medium,
      "45 min",
      &["250g flour", "150g butter", "100g brown sugar", "1 egg", "200g chocolate chips", "1 tsp baking soda"],
      &[
        "Cream the butter and sugar",
        "Beat in the egg, then fold in flour and baking soda",
        "Stir in the chocolate chips",
        "Scoop onto a tray and bake at 180C for 12 minutes",
      ],
    ),
    sample(
      3,
      "Shakshuka",
      "breakfast",
      Difficulty::Easy,
      "25 min",
      &["4 eggs", "1 can crushed tomatoes", "1 red pepper", "1 onion", "1 tsp paprika", "1 tsp cumin"],
      &[
        "Soften the onion and pepper in a wide pan",
        "Add the tomatoes and spices and simmer until thick",
        "Make wells and crack in the eggs",
        "Cover and cook until the whites are set",
      ],
    ),
  ]
}

fn sample(
  index: i64,
  title: &str,
  category: &str,
  difficulty: Difficulty,
  prep_time: &str,
  ingredients: &[&str],
  directions: &[&str],
) -> Recipe {
  // Staggered creation dates keep date sorting meaningful.
  let at = Utc::now() - Duration::days(index);
  Recipe {
    id: format!("sample-{}", index),
    title: title.into(),
    description: String::new(),
    category: category.into(),
    ingredients: ingredients.iter().map(|s| s.to_string()).collect(),
    directions: directions.iter().map(|s| s.to_string()).collect(),
    additional_instructions: BTreeMap::new(),
    images: Vec::new(),
    prep_time: prep_time.into(),
    difficulty: Some(difficulty),
    is_favorite: false,
    created_at: at,
    updated_at: at,
  }
}
