//! The fixed category list. Categories are identified by a stable id; the
//! label is what presentation surfaces show.

pub const CATEGORIES: &[(&str, &str)] = &[
  ("salads", "Salads"),
  ("soups", "Soups"),
  ("meat", "Meat"),
  ("pastries", "Pastries"),
  ("cakes", "Cakes"),
  ("cookies", "Cookies"),
  ("desserts", "Desserts"),
  ("breakfast", "Breakfast"),
  ("sides", "Sides"),
  ("sauces", "Sauces"),
  ("healthy", "Healthy"),
];

pub fn is_known(id: &str) -> bool {
  CATEGORIES.iter().any(|(known, _)| *known == id)
}

pub fn label(id: &str) -> Option<&'static str> {
  CATEGORIES
    .iter()
    .find(|(known, _)| *known == id)
    .map(|(_, label)| *label)
}
