//! Error types for the Run Coordinator

use crate::config::ConfigError;
use thiserror::Error;

/// Errors that terminate a run
///
/// Message- and thread-level extraction failures never reach this type;
/// the pipeline contains those. What surfaces here is environment trouble:
/// bad configuration, or a mailbox/store/notifier collaborator outage.
#[derive(Error, Debug)]
pub enum AgentError {
    /// Startup configuration failure - nothing was fetched
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    /// Mailbox query or labeling failure
    #[error("Mailbox error: {0}")]
    Mailbox(String),

    /// Persistence failure
    #[error("Store error: {0}")]
    Store(String),

    /// Notification delivery failure
    #[error("Notification error: {0}")]
    Notify(String),
}
