//! Filter/view projection: the visible subset for a selection plus one
//! randomly chosen highlight.

use crate::categories::{categories, resolve_selection};
use crate::store::QuoteStore;
use quote_types::{Quote, QuoteView, ALL_CATEGORIES};
use rand::Rng;

pub const EMPTY_STORE_MESSAGE: &str = "No quotes available.";
pub const EMPTY_CATEGORY_MESSAGE: &str = "No quotes for this category.";

/// Source of highlight picks, swappable so tests can pin the choice.
pub trait RandomSource: Send {
    /// An index in `0..len`. Never called with `len == 0`.
    fn pick(&mut self, len: usize) -> usize;
}

pub struct ThreadRandom;

impl RandomSource for ThreadRandom {
    fn pick(&mut self, len: usize) -> usize {
        rand::thread_rng().gen_range(0..len)
    }
}

/// Every record for "all", otherwise the exact-category matches in store order.
pub fn visible<'a>(quotes: &'a [Quote], selection: &str) -> Vec<&'a Quote> {
    if selection == ALL_CATEGORIES {
        quotes.iter().collect()
    } else {
        quotes.iter().filter(|q| q.category == selection).collect()
    }
}

pub fn highlight<'a>(subset: &[&'a Quote], rng: &mut dyn RandomSource) -> Option<&'a Quote> {
    if subset.is_empty() {
        return None;
    }
    let pos = rng.pick(subset.len()).min(subset.len() - 1);
    Some(subset[pos])
}

/// Switch the filter: persist it, then project with the new value. A
/// category no record carries resolves to "all" before it is stored.
pub fn change_selection(
    store: &QuoteStore,
    selection: &str,
    rng: &mut dyn RandomSource,
) -> QuoteView {
    let requested = selection.trim();
    let requested = if requested.is_empty() { ALL_CATEGORIES } else { requested };
    let selection = resolve_selection(store.quotes(), requested);
    if selection != requested {
        log::debug!("[QUOTES] Unknown category '{}', showing all", requested);
    }
    store.persist_selection(&selection);
    project(store, &selection, rng)
}

/// Project with the persisted selection, resetting it to "all" when its
/// category has disappeared.
pub fn current_view(store: &QuoteStore, rng: &mut dyn RandomSource) -> QuoteView {
    let persisted = store.persisted_selection();
    let selection = resolve_selection(store.quotes(), &persisted);
    if selection != persisted {
        log::debug!("[QUOTES] Selection '{}' no longer exists, resetting", persisted);
        store.persist_selection(&selection);
    }
    project(store, &selection, rng)
}

fn project(store: &QuoteStore, selection: &str, rng: &mut dyn RandomSource) -> QuoteView {
    let shown = visible(store.quotes(), selection);
    let picked = highlight(&shown, rng).cloned();
    if let Some(quote) = &picked {
        store.remember_last_viewed(quote);
    }

    let empty_message = if !shown.is_empty() {
        None
    } else if store.is_empty() {
        Some(EMPTY_STORE_MESSAGE.to_string())
    } else {
        Some(EMPTY_CATEGORY_MESSAGE.to_string())
    };

    QuoteView {
        selection: selection.to_string(),
        categories: categories(store.quotes()).map(str::to_string).collect(),
        visible: shown.into_iter().cloned().collect(),
        highlight: picked,
        empty_message,
    }
}
