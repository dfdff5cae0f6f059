//! JSON-snapshot mailbox
//!
//! The real mail provider is an external collaborator; this module is the
//! repo's stand-in message source and mutable label store. A snapshot file
//! holds threads, messages, and label assignments; label mutations are
//! written back so the processed marker survives across runs. The in-memory
//! constructor backs the test suites.

use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::path::{Path, PathBuf};
use tallyman_domain::traits::MessageSource;
use tallyman_domain::{CandidateMessage, CandidateThread, MailboxQuery};
use thiserror::Error;
use tracing::debug;

/// Errors from the snapshot mailbox
#[derive(Error, Debug)]
pub enum MailboxError {
    /// Snapshot file read/write failure
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Snapshot encoding failure
    #[error("Snapshot format error: {0}")]
    Json(#[from] serde_json::Error),

    /// Label applied to a thread the snapshot does not contain
    #[error("Unknown thread: {0}")]
    UnknownThread(String),
}

/// One stored message in the snapshot
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StoredMessage {
    /// Opaque unique message id
    pub id: String,
    /// Sender address or display string
    pub from: String,
    /// Subject line
    pub subject: String,
    /// Message date
    pub date: chrono::NaiveDate,
    /// Plain-text body
    pub body: String,
}

/// One stored thread in the snapshot
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StoredThread {
    /// Opaque thread id
    pub id: String,
    /// Labels currently applied to the thread
    #[serde(default)]
    pub labels: BTreeSet<String>,
    /// Messages in source order
    pub messages: Vec<StoredMessage>,
}

/// Mailbox backed by a JSON snapshot file (or plain memory in tests)
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct JsonMailbox {
    /// All threads in the snapshot
    #[serde(default)]
    threads: Vec<StoredThread>,

    /// Labels known to the mailbox
    #[serde(default)]
    labels: BTreeSet<String>,

    #[serde(skip)]
    path: Option<PathBuf>,
}

impl JsonMailbox {
    /// Create an in-memory mailbox from threads
    pub fn new(threads: Vec<StoredThread>) -> Self {
        Self {
            threads,
            labels: BTreeSet::new(),
            path: None,
        }
    }

    /// Load a snapshot file; label mutations will be persisted back to it
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self, MailboxError> {
        let contents = std::fs::read_to_string(&path)?;
        let mut mailbox: JsonMailbox = serde_json::from_str(&contents)?;
        mailbox.path = Some(path.as_ref().to_path_buf());
        Ok(mailbox)
    }

    /// Whether a thread currently carries a label
    pub fn thread_has_label(&self, thread_id: &str, label: &str) -> bool {
        self.threads
            .iter()
            .any(|t| t.id == thread_id && t.labels.contains(label))
    }

    /// Write the snapshot back when file-backed
    fn persist(&self) -> Result<(), MailboxError> {
        if let Some(path) = &self.path {
            let contents = serde_json::to_string_pretty(self)?;
            std::fs::write(path, contents)?;
        }
        Ok(())
    }

    fn message_matches(msg: &StoredMessage, query: &MailboxQuery) -> bool {
        let from = msg.from.to_lowercase();
        let subject = msg.subject.to_lowercase();
        let body = msg.body.to_lowercase();

        if !from.contains(&query.from.to_lowercase()) {
            return false;
        }
        if !query
            .subject_any
            .iter()
            .any(|s| subject.contains(&s.to_lowercase()))
        {
            return false;
        }
        if let Some(excluded) = &query.exclude_text {
            let excluded = excluded.to_lowercase();
            if subject.contains(&excluded) || body.contains(&excluded) {
                return false;
            }
        }
        true
    }
}

impl MessageSource for JsonMailbox {
    type Error = MailboxError;

    fn ensure_label(&mut self, name: &str) -> Result<(), Self::Error> {
        if self.labels.insert(name.to_string()) {
            debug!("Created label {}", name);
            self.persist()?;
        }
        Ok(())
    }

    fn search(&self, query: &MailboxQuery) -> Result<Vec<CandidateThread>, Self::Error> {
        let candidates = self
            .threads
            .iter()
            .filter(|thread| !thread.labels.contains(&query.without_label))
            .filter(|thread| {
                thread
                    .messages
                    .iter()
                    .any(|msg| Self::message_matches(msg, query))
            })
            .take(query.limit)
            .map(|thread| CandidateThread {
                id: thread.id.clone(),
                messages: thread
                    .messages
                    .iter()
                    .map(|msg| CandidateMessage {
                        id: msg.id.clone(),
                        subject: msg.subject.clone(),
                        date: msg.date,
                        body: msg.body.clone(),
                    })
                    .collect(),
            })
            .collect();
        Ok(candidates)
    }

    fn add_label(&mut self, thread_id: &str, label: &str) -> Result<(), Self::Error> {
        let thread = self
            .threads
            .iter_mut()
            .find(|t| t.id == thread_id)
            .ok_or_else(|| MailboxError::UnknownThread(thread_id.to_string()))?;

        if thread.labels.insert(label.to_string()) {
            self.persist()?;
        }
        Ok(())
    }
}
