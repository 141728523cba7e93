use std::fmt;

/// Failures a caller of the quote core can observe.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum QuoteError {
    /// Rejected input, e.g. empty text or category on add.
    Validation(String),
    /// An import document that is not an array of record-like objects.
    Format(String),
    Storage(String),
}

impl fmt::Display for QuoteError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            QuoteError::Validation(msg) => write!(f, "validation failed: {}", msg),
            QuoteError::Format(msg) => write!(f, "invalid document: {}", msg),
            QuoteError::Storage(msg) => write!(f, "storage error: {}", msg),
        }
    }
}

impl std::error::Error for QuoteError {}

impl From<serde_json::Error> for QuoteError {
    fn from(e: serde_json::Error) -> Self {
        QuoteError::Format(e.to_string())
    }
}
