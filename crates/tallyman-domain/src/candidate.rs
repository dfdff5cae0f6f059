//! Ingestion candidates - messages and threads under consideration

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// One message considered for extraction.
///
/// Ephemeral: produced by the mailbox query, consumed once per run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CandidateMessage {
    /// Opaque unique message identifier (the future dedup key)
    pub id: String,

    /// Message subject line
    pub subject: String,

    /// Message date, used as the fallback transaction date
    pub date: NaiveDate,

    /// Plain-text message body
    pub body: String,
}

/// A conversation thread of candidate messages, in source order.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CandidateThread {
    /// Opaque thread identifier, the unit of processed-marking
    pub id: String,

    /// Messages in source order
    pub messages: Vec<CandidateMessage>,
}

/// How a candidate thread resolved after one pipeline pass.
///
/// Only [`ThreadOutcome::FullyIngested`] threads are marked processed.
/// A partial failure leaves the thread eligible for retry on the next run;
/// messages that already succeeded stay persisted and are excluded by the
/// ledger next time, so retry is safe and non-duplicating.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ThreadOutcome {
    /// Every message was ingested or skipped as a known duplicate
    FullyIngested,

    /// A message failed extraction; remaining messages were not attempted
    PartialFailure,
}

impl ThreadOutcome {
    /// Whether the thread may receive the processed marker
    pub fn is_processed(self) -> bool {
        matches!(self, ThreadOutcome::FullyIngested)
    }
}
