//! Trait definitions for external interactions
//!
//! These traits define the boundaries between the ingestion core and its
//! collaborators. Infrastructure implementations live in other crates.

use crate::{CandidateThread, RunSummary, TransactionRecord};
use serde::{Deserialize, Serialize};

/// Trait for text-classification providers
///
/// Implemented by the infrastructure layer (tallyman-llm)
pub trait LlmProvider {
    /// Error type for classifier operations
    type Error;

    /// Send a prompt and return the model's raw text response
    fn generate(&self, prompt: &str) -> Result<String, Self::Error>;
}

/// Declarative mailbox filter, translated by the [`MessageSource`]
/// implementation into whatever query facility the provider offers.
///
/// The core never concatenates query strings itself.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MailboxQuery {
    /// Sender filter (substring match on the message sender)
    pub from: String,

    /// Disjunction of subject substrings; a message matches if its subject
    /// contains any of them
    pub subject_any: Vec<String>,

    /// Substring that disqualifies a message wherever it appears
    #[serde(default)]
    pub exclude_text: Option<String>,

    /// Threads carrying this label are not candidates
    pub without_label: String,

    /// Maximum number of threads returned per run (backpressure bound)
    pub limit: usize,
}

/// Trait for the mailbox collaborator: a message source plus a mutable
/// label store
///
/// Label operations are idempotent: creating an existing label or labeling
/// an already-labeled thread is a no-op.
pub trait MessageSource {
    /// Error type for mailbox operations
    type Error;

    /// Create the label if it does not exist yet
    fn ensure_label(&mut self, name: &str) -> Result<(), Self::Error>;

    /// Return up to `query.limit` unlabeled threads matching the filter,
    /// each with its messages in source order
    fn search(&self, query: &MailboxQuery) -> Result<Vec<CandidateThread>, Self::Error>;

    /// Apply a label to a thread
    fn add_label(&mut self, thread_id: &str, label: &str) -> Result<(), Self::Error>;
}

/// Trait for the append-only row store holding persisted records
///
/// Implemented by the infrastructure layer (tallyman-store)
pub trait RecordStore {
    /// Error type for store operations
    type Error;

    /// All `source_message_id` values already persisted; an empty or absent
    /// table yields an empty list (first run)
    fn existing_source_ids(&self) -> Result<Vec<String>, Self::Error>;

    /// Append one record. Rows are never updated or deleted by the pipeline.
    fn append(&mut self, record: &TransactionRecord) -> Result<(), Self::Error>;

    /// Re-sort persisted rows by date ascending; runs after all appends of
    /// a run have landed
    fn sort_by_date(&mut self) -> Result<(), Self::Error>;
}

/// Trait for the outbound notification channel
pub trait Notifier {
    /// Error type for notification delivery
    type Error;

    /// Deliver a run summary
    fn notify(&self, summary: &RunSummary) -> Result<(), Self::Error>;
}
