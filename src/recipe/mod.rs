//! Recipe domain: canonical types, wire-row normalization, the fixed
//! category list, filtering, and the built-in sample set.

pub mod api_types;
pub mod categories;
pub mod filter;
pub mod sample;
pub mod types;
