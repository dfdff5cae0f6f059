//! Transaction record - the unit of persisted output

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// A structured transaction extracted from one bank-notification message.
///
/// Records are immutable once created: a record is created exactly once, at
/// successful extraction, and is never mutated or deleted by the pipeline.
/// For a given `source_message_id` at most one record may ever exist in
/// persisted state; the message id is the deduplication key and travels with
/// the record into the row store.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TransactionRecord {
    /// Transaction date (ISO `YYYY-MM-DD`); the source message's date when
    /// the classifier could not extract one from the text
    pub date: NaiveDate,

    /// Short human-readable merchant name
    pub merchant: String,

    /// Category from the configured taxonomy, or a model-inferred label
    /// when no rule matched
    pub category: String,

    /// Transaction amount, numeric, no currency symbol
    pub amount: f64,

    /// Free-text description; format depends on which rule produced it
    pub description: String,

    /// Opaque id of the originating message - the dedup key
    pub source_message_id: String,
}
