//! Last-write-wins reconciliation of a remote snapshot into local quotes.
//!
//! Records are keyed by `id`. A remote record replaces the local one when
//! its `updated_at` is greater than or equal to the local one (remote wins
//! ties). Local-only records are kept in place, unseen remote records are
//! appended in the order they arrived.

use quote_types::Quote;
use std::collections::HashMap;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct MergeStats {
    pub inserted: usize,
    pub replaced: usize,
    /// Remote records that lost to a newer local copy, or were identical.
    pub unchanged: usize,
}

impl MergeStats {
    pub fn changed(&self) -> bool {
        self.inserted > 0 || self.replaced > 0
    }
}

/// Merge `remote` into `local` and return the resulting set.
pub fn merge(local: &[Quote], remote: &[Quote]) -> (Vec<Quote>, MergeStats) {
    let mut merged: Vec<Quote> = local.to_vec();
    let mut index: HashMap<String, usize> = HashMap::with_capacity(merged.len());
    for (pos, quote) in merged.iter().enumerate() {
        index.entry(quote.id.clone()).or_insert(pos);
    }

    let mut stats = MergeStats::default();
    for incoming in remote {
        match index.get(&incoming.id) {
            Some(&pos) => {
                let current = &mut merged[pos];
                if incoming.updated_at >= current.updated_at && current != incoming {
                    *current = incoming.clone();
                    stats.replaced += 1;
                } else {
                    stats.unchanged += 1;
                }
            }
            None => {
                index.insert(incoming.id.clone(), merged.len());
                merged.push(incoming.clone());
                stats.inserted += 1;
            }
        }
    }

    (merged, stats)
}
