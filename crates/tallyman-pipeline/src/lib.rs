//! Tallyman Ingestion Pipeline
//!
//! The exactly-once ingestion core: decides which messages are new, drives
//! the Record Extractor over them, and contains failures so a single bad
//! message never blocks the batch or causes double-processing.
//!
//! # Guarantees
//!
//! - **Idempotent ingestion**: a `source_message_id` already in the
//!   [`Ledger`] is skipped, within a run and across runs
//! - **Partial-failure containment**: an extraction failure aborts only
//!   the containing thread; the run continues, and the failed thread is
//!   reported retry-eligible
//! - **Paced extraction**: a blocking delay after every successful
//!   classification call respects the service's throughput limits
//!
//! # Example Usage
//!
//! ```
//! use tallyman_pipeline::{IngestionPipeline, Ledger, PipelineConfig};
//! use tallyman_extractor::{CategoryRules, ExtractorConfig, RecordExtractor};
//! use tallyman_llm::MockProvider;
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
//! let pipeline = IngestionPipeline::new(PipelineConfig { throttle_secs: 0 });
//! let mut ledger = Ledger::new();
//! let report = pipeline.run(&[], &mut ledger, &extractor);
//! assert!(report.appended.is_empty());
//! ```

#![warn(missing_docs)]

mod ledger;
mod pipeline;

pub use ledger::Ledger;
pub use pipeline::{IngestionPipeline, PipelineConfig, PipelineReport};
