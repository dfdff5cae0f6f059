//! Tallyman Record Extractor
//!
//! Converts bank-notification email text into structured transaction
//! records via a classification-service call under a strict output
//! contract.
//!
//! # Architecture
//!
//! ```text
//! CandidateMessage → truncate → PromptBuilder → LlmProvider → parser → TransactionRecord
//! ```
//!
//! # Key Features
//!
//! - **Bounded transmission**: message bodies are cut to a configured
//!   character prefix before they ever reach the wire
//! - **Rule-ordered contract**: subject-pattern overrides, then the
//!   keyword/brand taxonomy, then free-form inference - and the overrides
//!   are enforced locally, not just requested politely
//! - **Defensive parsing**: code fences stripped, exactly five keys,
//!   numeric coercion for string amounts, date fallback to the message date
//! - **Configurable taxonomy**: the category table is data loaded from
//!   TOML, never hardcoded business logic
//!
//! # Example Usage
//!
//! ```
//! use tallyman_extractor::{CategoryRules, ExtractorConfig, RecordExtractor};
//! use tallyman_llm::MockProvider;
//! use tallyman_domain::CandidateMessage;
//! use chrono::NaiveDate;
//!
//! let provider = MockProvider::new(
//!     r#"{"date":"2024-01-05","merchant":"SHELL","amount":32.10,"category":"Gas","description":"fuel"}"#,
//! );
//! let extractor = RecordExtractor::new(
//!     provider,
//!     CategoryRules::default(),
//!     ExtractorConfig::default(),
//! );
//!
//! let msg = CandidateMessage {
//!     id: "msg-1".to_string(),
//!     subject: "transaction alert".to_string(),
//!     date: NaiveDate::from_ymd_opt(2024, 1, 5).unwrap(),
//!     body: "A purchase at SHELL for $32.10".to_string(),
//! };
//!
//! let record = extractor.extract(&msg).unwrap();
//! assert_eq!(record.category, "Gas");
//! ```

#![warn(missing_docs)]

mod config;
mod error;
mod extractor;
mod parser;
mod prompt;
mod rules;

pub use config::ExtractorConfig;
pub use error::ExtractError;
pub use extractor::RecordExtractor;
pub use prompt::PromptBuilder;
pub use rules::{CategoryRule, CategoryRules, MerchantRule, OverrideRule};
