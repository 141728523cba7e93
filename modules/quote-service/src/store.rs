//! The quote store: the single owned collection of quotes for the process,
//! mirrored to the key-value database.

use crate::db::{Db, Scope, LAST_VIEWED_KEY, QUOTES_KEY, SELECTED_CATEGORY_KEY};
use crate::error::QuoteError;
use crate::reconcile::{self, MergeStats};
use quote_types::{Quote, ALL_CATEGORIES};
use rand::Rng;
use std::collections::HashSet;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

const ID_PREFIX: &str = "id-";
const ID_ALPHABET: &[u8] = b"0123456789abcdefghijklmnopqrstuvwxyz";
const ID_LEN: usize = 7;

pub fn now_millis() -> i64 {
    chrono::Utc::now().timestamp_millis()
}

/// Built-in quotes used when nothing has been persisted yet.
pub fn seed_quotes() -> Vec<Quote> {
    let mut used = HashSet::new();
    [
        ("Stay hungry, stay foolish.", "Motivation"),
        ("Simplicity is the soul of efficiency.", "Productivity"),
        ("Code is like humor. When you have to explain it, it's bad.", "Programming"),
    ]
    .into_iter()
    .map(|(text, category)| Quote {
        id: unique_id(|id| !used.insert(id.to_string())),
        text: text.to_string(),
        category: category.to_string(),
        updated_at: 0,
    })
    .collect()
}

fn random_id() -> String {
    let mut rng = rand::thread_rng();
    let suffix: String = (0..ID_LEN)
        .map(|_| ID_ALPHABET[rng.gen_range(0..ID_ALPHABET.len())] as char)
        .collect();
    format!("{}{}", ID_PREFIX, suffix)
}

/// Draw ids until `taken` rejects none.
fn unique_id(mut taken: impl FnMut(&str) -> bool) -> String {
    loop {
        let id = random_id();
        if !taken(&id) {
            return id;
        }
    }
}

/// The store as shared between request handlers and the sync worker.
pub type SharedStore = Arc<Mutex<QuoteStore>>;

/// Lock the shared store. The guard is not `Send`, so it can never be held
/// across an `.await`; every read-modify-write runs without yielding.
pub fn lock_store(store: &Mutex<QuoteStore>) -> MutexGuard<'_, QuoteStore> {
    store.lock().unwrap_or_else(PoisonError::into_inner)
}

pub struct QuoteStore {
    db: Arc<Db>,
    quotes: Vec<Quote>,
}

impl QuoteStore {
    /// Start from the seed list and overlay whatever was persisted.
    pub fn open(db: Arc<Db>) -> Self {
        let mut store = Self {
            db,
            quotes: seed_quotes(),
        };
        store.load();
        store
    }

    pub fn quotes(&self) -> &[Quote] {
        &self.quotes
    }

    pub fn len(&self) -> usize {
        self.quotes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.quotes.is_empty()
    }

    pub fn contains_id(&self, id: &str) -> bool {
        self.quotes.iter().any(|q| q.id == id)
    }

    /// An id not currently used by any record.
    pub fn fresh_id(&self) -> String {
        unique_id(|id| self.contains_id(id))
    }

    /// Replace the in-memory list with the persisted blob. A missing or
    /// corrupt blob leaves the current list untouched.
    pub fn load(&mut self) {
        let raw = match self.db.get(QUOTES_KEY) {
            Ok(Some(raw)) => raw,
            Ok(None) => return,
            Err(e) => {
                log::warn!("[QUOTES] Failed to read stored quotes: {}", e);
                return;
            }
        };

        match serde_json::from_str::<Vec<Quote>>(&raw) {
            Ok(loaded) => {
                self.quotes = loaded;
                let missing: Vec<usize> = self
                    .quotes
                    .iter()
                    .enumerate()
                    .filter(|(_, q)| q.id.is_empty())
                    .map(|(pos, _)| pos)
                    .collect();
                for pos in missing {
                    let id = self.fresh_id();
                    self.quotes[pos].id = id;
                }
                log::debug!("[QUOTES] Loaded {} stored quotes", self.quotes.len());
            }
            Err(e) => {
                log::warn!("[QUOTES] Stored quotes are corrupt, keeping current list: {}", e);
            }
        }
    }

    /// Write the whole list to the database. Failures are logged and the
    /// in-memory list stays authoritative.
    pub fn save(&self) -> bool {
        let blob = match serde_json::to_string(&self.quotes) {
            Ok(blob) => blob,
            Err(e) => {
                log::error!("[QUOTES] Failed to serialize quotes: {}", e);
                return false;
            }
        };
        match self.db.set(QUOTES_KEY, &blob, Scope::Durable) {
            Ok(()) => true,
            Err(e) => {
                log::error!("[QUOTES] Failed to persist quotes: {}", e);
                false
            }
        }
    }

    pub fn add(&mut self, text: &str, category: &str) -> Result<Quote, QuoteError> {
        let text = text.trim();
        let category = category.trim();
        if text.is_empty() || category.is_empty() {
            return Err(QuoteError::Validation(
                "Please fill out both text and category".to_string(),
            ));
        }

        let quote = Quote {
            id: self.fresh_id(),
            text: text.to_string(),
            category: category.to_string(),
            updated_at: now_millis(),
        };
        self.quotes.push(quote.clone());
        self.save();
        log::info!("[QUOTES] Added {} in '{}'", quote.id, quote.category);
        Ok(quote)
    }

    /// Delete by id. Returns whether anything was removed; absence is not an error.
    pub fn remove(&mut self, id: &str) -> bool {
        let before = self.quotes.len();
        self.quotes.retain(|q| q.id != id);
        let removed = self.quotes.len() != before;
        self.save();
        if removed {
            log::info!("[QUOTES] Removed {}", id);
        }
        removed
    }

    /// Fold externally supplied records into the store with last-write-wins
    /// and persist the result.
    pub fn merge_external(&mut self, records: &[Quote]) -> MergeStats {
        let (merged, stats) = reconcile::merge(&self.quotes, records);
        self.quotes = merged;
        if stats.changed() {
            self.save();
        }
        stats
    }

    // =====================================================
    // Selection / last-viewed persistence
    // =====================================================

    /// The raw persisted selection, "all" when nothing is stored.
    pub fn persisted_selection(&self) -> String {
        match self.db.get(SELECTED_CATEGORY_KEY) {
            Ok(Some(value)) => value,
            Ok(None) => ALL_CATEGORIES.to_string(),
            Err(e) => {
                log::warn!("[QUOTES] Failed to read selection: {}", e);
                ALL_CATEGORIES.to_string()
            }
        }
    }

    pub fn persist_selection(&self, selection: &str) {
        if let Err(e) = self.db.set(SELECTED_CATEGORY_KEY, selection, Scope::Durable) {
            log::error!("[QUOTES] Failed to persist selection: {}", e);
        }
    }

    pub fn remember_last_viewed(&self, quote: &Quote) {
        let result = serde_json::to_string(quote)
            .map_err(|e| e.to_string())
            .and_then(|json| {
                self.db
                    .set(LAST_VIEWED_KEY, &json, Scope::Session)
                    .map_err(|e| e.to_string())
            });
        if let Err(e) = result {
            log::warn!("[QUOTES] Failed to store last viewed quote: {}", e);
        }
    }

    pub fn last_viewed(&self) -> Option<Quote> {
        let raw = self.db.get(LAST_VIEWED_KEY).ok().flatten()?;
        serde_json::from_str(&raw).ok()
    }

    /// Final flush before the store is dropped.
    pub fn close(self) {
        if self.save() {
            log::info!("[QUOTES] Store closed with {} quotes", self.quotes.len());
        }
    }
}
