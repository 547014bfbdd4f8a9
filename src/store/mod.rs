//! Data access layer: one façade over the remote store, the response
//! cache, and the offline mirror.

mod facade;

pub use facade::{Listing, Origin, RecipeStore};
