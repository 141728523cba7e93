//! Shared types for the quote service and its RPC clients.

use serde::{Deserialize, Serialize};

/// Selection sentinel meaning "no category filter".
pub const ALL_CATEGORIES: &str = "all";

// =====================================================
// Domain Types
// =====================================================

/// A quote record.
///
/// `id` is the merge key and `updated_at` (epoch millis) is only consulted
/// for conflict resolution. Both default when absent from stored JSON so
/// older blobs still load.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Quote {
    #[serde(default)]
    pub id: String,
    pub text: String,
    pub category: String,
    #[serde(default)]
    pub updated_at: i64,
}

/// What a UI shell renders after every command.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct QuoteView {
    pub selection: String,
    pub categories: Vec<String>,
    pub visible: Vec<Quote>,
    pub highlight: Option<Quote>,
    /// Set when `visible` is empty.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub empty_message: Option<String>,
}

/// Outcome of a single reconciler run. Doubles as the soft notification.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SyncReport {
    pub fetched: usize,
    pub inserted: usize,
    pub replaced: usize,
    pub unchanged: usize,
    pub finished_at: String,
    pub message: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ImportSummary {
    pub received: usize,
    pub inserted: usize,
    pub replaced: usize,
    pub total_quotes: usize,
}

// =====================================================
// RPC Request Types
// =====================================================

#[derive(Debug, Serialize, Deserialize)]
pub struct AddQuoteRequest {
    pub text: String,
    pub category: String,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct RemoveQuoteRequest {
    pub id: String,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct ChangeSelectionRequest {
    pub selection: String,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct ImportRequest {
    /// Raw JSON document, exactly as a user would upload it.
    pub document: String,
}

// =====================================================
// RPC Response Types
// =====================================================

#[derive(Debug, Serialize, Deserialize)]
pub struct RpcResponse<T: Serialize> {
    pub success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<T>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl<T: Serialize> RpcResponse<T> {
    pub fn ok(data: T) -> Self {
        Self {
            success: true,
            data: Some(data),
            error: None,
        }
    }

    pub fn err(msg: impl Into<String>) -> Self {
        Self {
            success: false,
            data: None,
            error: Some(msg.into()),
        }
    }
}

// =====================================================
// Service Status
// =====================================================

#[derive(Debug, Serialize, Deserialize)]
pub struct ServiceStatus {
    pub running: bool,
    pub uptime_secs: u64,
    pub total_quotes: usize,
    pub categories: usize,
    pub selected_category: String,
    pub last_sync: Option<SyncReport>,
    pub sync_interval_secs: u64,
    pub remote_url: String,
}
