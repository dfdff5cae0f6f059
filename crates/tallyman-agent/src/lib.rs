//! Tallyman Agent
//!
//! The Run Coordinator and its wiring: environment configuration, the
//! snapshot mailbox, the console notifier, and the `tallyman` binary that
//! executes one ingestion run end to end.
//!
//! # Run shape
//!
//! ```text
//! mailbox → IngestionPipeline → (RecordExtractor, Ledger) → append → label → notify
//! ```
//!
//! Data flows one way; the coordinator is the only component touching all
//! collaborators.

#![warn(missing_docs)]

pub mod config;
pub mod coordinator;
pub mod error;
pub mod mailbox;
pub mod notify;

pub use config::{AgentConfig, AgentSettings, ConfigError, FilterSettings};
pub use coordinator::Coordinator;
pub use error::AgentError;
pub use mailbox::{JsonMailbox, MailboxError, StoredMessage, StoredThread};
pub use notify::ConsoleNotifier;
