//! Category index derived from the store on every query.

use quote_types::{Quote, ALL_CATEGORIES};
use std::collections::BTreeSet;

/// Distinct categories, case-sensitive, ascending.
pub fn categories(quotes: &[Quote]) -> impl Iterator<Item = &str> {
    quotes
        .iter()
        .map(|q| q.category.as_str())
        .collect::<BTreeSet<_>>()
        .into_iter()
}

/// Keep `persisted` if it is "all" or still names a category, else fall back to "all".
pub fn resolve_selection(quotes: &[Quote], persisted: &str) -> String {
    if persisted == ALL_CATEGORIES || quotes.iter().any(|q| q.category == persisted) {
        persisted.to_string()
    } else {
        ALL_CATEGORIES.to_string()
    }
}
