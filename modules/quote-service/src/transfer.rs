//! JSON export of the store and import of user-supplied documents.
//!
//! Imports go through the same last-write-wins merge as server sync, so an
//! imported record with a known id updates that record instead of
//! duplicating it.

use crate::error::QuoteError;
use crate::store::{now_millis, QuoteStore};
use quote_types::{ImportSummary, Quote};
use serde::Deserialize;
use serde_json::Value;
use std::collections::HashSet;

pub const EXPORT_FILE_NAME: &str = "quotes.json";

/// One incoming item. Fields are read loosely so partially filled or
/// mistyped records are defaulted instead of rejected.
#[derive(Debug, Default, Deserialize)]
#[serde(default, rename_all = "camelCase")]
struct ImportItem {
    id: Option<Value>,
    text: Option<Value>,
    category: Option<Value>,
    updated_at: Option<Value>,
}

impl ImportItem {
    /// A usable id: non-blank strings as given, numbers in their string form.
    fn id(&self) -> Option<String> {
        match &self.id {
            Some(Value::String(s)) if !s.trim().is_empty() => Some(s.clone()),
            Some(Value::Number(n)) => Some(n.to_string()),
            _ => None,
        }
    }

    fn updated_at(&self) -> Option<i64> {
        self.updated_at.as_ref().and_then(Value::as_i64)
    }
}

fn string_or_empty(value: Option<Value>) -> String {
    match value {
        Some(Value::String(s)) => s,
        _ => String::new(),
    }
}

pub fn export_document(store: &QuoteStore) -> Result<String, QuoteError> {
    serde_json::to_string_pretty(store.quotes())
        .map_err(|e| QuoteError::Storage(format!("Failed to serialize quotes: {}", e)))
}

/// Validate `doc` and turn it into complete records. Nothing is mutated, so
/// a rejected document leaves the store as it was.
pub fn parse_document(store: &QuoteStore, doc: &str) -> Result<Vec<Quote>, QuoteError> {
    let value: Value = serde_json::from_str(doc)?;
    let items = match value {
        Value::Array(items) => items,
        other => {
            return Err(QuoteError::Format(format!(
                "expected an array of quotes, found {}",
                json_kind(&other)
            )));
        }
    };

    let now = now_millis();
    let mut batch_ids: HashSet<String> = HashSet::new();
    let mut records = Vec::with_capacity(items.len());

    for (pos, item) in items.into_iter().enumerate() {
        if !item.is_object() {
            return Err(QuoteError::Format(format!(
                "item {} is {}, expected an object",
                pos,
                json_kind(&item)
            )));
        }
        let item: ImportItem = serde_json::from_value(item)
            .map_err(|e| QuoteError::Format(format!("item {}: {}", pos, e)))?;

        let id = match item.id() {
            Some(id) => id,
            None => loop {
                let candidate = store.fresh_id();
                if !batch_ids.contains(&candidate) {
                    break candidate;
                }
            },
        };
        let updated_at = item.updated_at().unwrap_or_else(|| {
            log::debug!("[IMPORT] Item {} has no usable updatedAt, stamping now", pos);
            now
        });
        batch_ids.insert(id.clone());

        records.push(Quote {
            id,
            text: string_or_empty(item.text),
            category: string_or_empty(item.category),
            updated_at,
        });
    }

    Ok(records)
}

pub fn import_document(store: &mut QuoteStore, doc: &str) -> Result<ImportSummary, QuoteError> {
    let records = parse_document(store, doc)?;
    let stats = store.merge_external(&records);
    log::info!(
        "[IMPORT] {} records: {} inserted, {} replaced, {} unchanged",
        records.len(),
        stats.inserted,
        stats.replaced,
        stats.unchanged
    );
    Ok(ImportSummary {
        received: records.len(),
        inserted: stats.inserted,
        replaced: stats.replaced,
        total_quotes: store.len(),
    })
}

fn json_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
    }
}
