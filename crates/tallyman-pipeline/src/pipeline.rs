//! Ingestion pipeline - per-thread extraction with failure containment

use crate::ledger::Ledger;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::time::Duration;
use tallyman_domain::traits::LlmProvider;
use tallyman_domain::{CandidateThread, ThreadOutcome, TransactionRecord};
use tallyman_extractor::RecordExtractor;
use tracing::{debug, info, warn};

/// Configuration for the ingestion pipeline
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PipelineConfig {
    /// Minimum pause after each successful classification call (seconds).
    /// Keeps the run under the service's throughput limits; skipped
    /// duplicates do not pay it.
    pub throttle_secs: u64,
}

impl PipelineConfig {
    /// Get the inter-call pause as a Duration
    pub fn throttle(&self) -> Duration {
        Duration::from_secs(self.throttle_secs)
    }
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self { throttle_secs: 10 }
    }
}

/// What one pipeline pass produced
///
/// The pipeline itself performs no side effects: appends and
/// processed-marking both happen downstream, driven by this report.
#[derive(Debug, Clone, Default)]
pub struct PipelineReport {
    /// Successfully extracted records, in discovery order
    pub appended: Vec<TransactionRecord>,

    /// Resolution of every candidate thread
    pub outcomes: HashMap<String, ThreadOutcome>,
}

impl PipelineReport {
    /// Threads that ended in partial failure
    pub fn failed_thread_count(&self) -> usize {
        self.outcomes
            .values()
            .filter(|o| !o.is_processed())
            .count()
    }
}

/// Per-thread ingestion state machine
///
/// `Ingesting -> Failed` halts further message transitions for that thread
/// only; other threads are unaffected.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum ThreadState {
    /// No message of this thread needed extraction yet
    Pending,
    /// A message is being extracted
    Ingesting,
    /// The most recent extraction succeeded
    Succeeded,
    /// An extraction failed; the thread is done for this run
    Failed,
}

impl ThreadState {
    /// Final outcome once the thread's messages are exhausted or aborted
    fn outcome(self) -> ThreadOutcome {
        match self {
            ThreadState::Failed => ThreadOutcome::PartialFailure,
            // Pending covers the all-skipped thread: nothing failed, so it
            // is fully ingested and may be marked processed
            ThreadState::Pending | ThreadState::Ingesting | ThreadState::Succeeded => {
                ThreadOutcome::FullyIngested
            }
        }
    }
}

/// The ingestion pipeline: iterates candidate threads, extracts
/// non-duplicate messages, and contains failures at thread granularity
///
/// Single-threaded and sequential. The only suspension is the blocking
/// inter-call throttle; there is no concurrent task model and none is
/// needed at this scale.
pub struct IngestionPipeline {
    config: PipelineConfig,
}

impl IngestionPipeline {
    /// Create a pipeline with the given configuration
    pub fn new(config: PipelineConfig) -> Self {
        Self { config }
    }

    /// Create a pipeline with default configuration
    pub fn default_config() -> Self {
        Self::new(PipelineConfig::default())
    }

    /// Run one pass over the candidate threads
    ///
    /// For each thread, messages are visited in source order. Duplicates
    /// (ids already in the ledger) are skipped as no-ops. A successful
    /// extraction appends its record and enters the ledger immediately, so
    /// later messages in the same run - including copies in other threads -
    /// see the update. An extraction failure aborts only the containing
    /// thread; the run continues with the next one.
    pub fn run<L>(
        &self,
        threads: &[CandidateThread],
        ledger: &mut Ledger,
        extractor: &RecordExtractor<L>,
    ) -> PipelineReport
    where
        L: LlmProvider,
        L::Error: std::fmt::Display,
    {
        let mut report = PipelineReport::default();

        for thread in threads {
            let mut state = ThreadState::Pending;

            for msg in &thread.messages {
                if ledger.contains(&msg.id) {
                    debug!("Skipping duplicate message: {}", msg.id);
                    continue;
                }

                state = ThreadState::Ingesting;
                match extractor.extract(msg) {
                    Ok(record) => {
                        info!("Processed: {} - {}", record.merchant, record.amount);
                        ledger.add(msg.id.clone());
                        report.appended.push(record);
                        state = ThreadState::Succeeded;

                        // Pause between classification calls (429 guard)
                        let throttle = self.config.throttle();
                        if !throttle.is_zero() {
                            std::thread::sleep(throttle);
                        }
                    }
                    Err(e) => {
                        warn!("Error processing message {}: {}", msg.id, e);
                        state = ThreadState::Failed;
                        break;
                    }
                }
            }

            let outcome = state.outcome();
            if !outcome.is_processed() {
                warn!("Thread {} had errors; eligible for retry next run", thread.id);
            }
            report.outcomes.insert(thread.id.clone(), outcome);
        }

        report
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;
    use tallyman_extractor::{CategoryRules, ExtractorConfig};
    use tallyman_llm::MockProvider;

    const SHELL_JSON: &str = r#"{"date":"2024-01-05","merchant":"SHELL","amount":32.10,"category":"Gas","description":"fuel"}"#;

    fn message(id: &str) -> tallyman_domain::CandidateMessage {
        tallyman_domain::CandidateMessage {
            id: id.to_string(),
            subject: "transaction alert".to_string(),
            date: NaiveDate::from_ymd_opt(2024, 1, 5).unwrap(),
            body: format!("purchase recorded in {}", id),
        }
    }

    fn thread(id: &str, message_ids: &[&str]) -> CandidateThread {
        CandidateThread {
            id: id.to_string(),
            messages: message_ids.iter().map(|m| message(m)).collect(),
        }
    }

    fn extractor(provider: MockProvider) -> RecordExtractor<MockProvider> {
        RecordExtractor::new(provider, CategoryRules::default(), ExtractorConfig::default())
    }

    fn pipeline() -> IngestionPipeline {
        IngestionPipeline::new(PipelineConfig { throttle_secs: 0 })
    }

    #[test]
    fn test_all_new_messages_ingested() {
        let provider = MockProvider::new(SHELL_JSON);
        let mut ledger = Ledger::new();

        let report = pipeline().run(
            &[thread("t1", &["m1", "m2"])],
            &mut ledger,
            &extractor(provider),
        );

        assert_eq!(report.appended.len(), 2);
        assert_eq!(report.outcomes["t1"], ThreadOutcome::FullyIngested);
        assert!(ledger.contains("m1"));
        assert!(ledger.contains("m2"));
    }

    #[test]
    fn test_ledgered_message_skips_without_extractor_call() {
        let provider = MockProvider::new(SHELL_JSON);
        let probe = provider.clone();
        let mut ledger: Ledger = vec!["m1".to_string()].into_iter().collect();

        let report = pipeline().run(&[thread("t1", &["m1"])], &mut ledger, &extractor(provider));

        assert_eq!(probe.call_count(), 0);
        assert!(report.appended.is_empty());
        // A skip is a no-op, not a failure: the thread is fully ingested
        assert_eq!(report.outcomes["t1"], ThreadOutcome::FullyIngested);
    }

    #[test]
    fn test_partial_failure_containment() {
        let provider = MockProvider::new(SHELL_JSON);
        let probe = provider.clone();
        provider.push_response(SHELL_JSON);
        provider.push_transport_error("HTTP 500");

        let mut ledger = Ledger::new();
        let report = pipeline().run(
            &[thread("t1", &["m1", "m2", "m3"])],
            &mut ledger,
            &extractor(provider),
        );

        // m1 succeeded, m2 failed, m3 never attempted
        assert_eq!(report.appended.len(), 1);
        assert_eq!(probe.call_count(), 2);
        assert_eq!(report.outcomes["t1"], ThreadOutcome::PartialFailure);
        assert!(ledger.contains("m1"));
        assert!(!ledger.contains("m2"));
    }

    #[test]
    fn test_failure_does_not_abort_the_run() {
        let provider = MockProvider::new(SHELL_JSON);
        provider.push_transport_error("HTTP 500");

        let mut ledger = Ledger::new();
        let report = pipeline().run(
            &[thread("t1", &["m1"]), thread("t2", &["m2"])],
            &mut ledger,
            &extractor(provider),
        );

        assert_eq!(report.outcomes["t1"], ThreadOutcome::PartialFailure);
        assert_eq!(report.outcomes["t2"], ThreadOutcome::FullyIngested);
        assert_eq!(report.appended.len(), 1);
        assert_eq!(report.failed_thread_count(), 1);
    }

    #[test]
    fn test_cross_thread_duplicate_seen_within_run() {
        let provider = MockProvider::new(SHELL_JSON);
        let probe = provider.clone();
        let mut ledger = Ledger::new();

        // The same message id appears in two threads; only the first copy
        // triggers a classification call
        let report = pipeline().run(
            &[thread("t1", &["m1"]), thread("t2", &["m1"])],
            &mut ledger,
            &extractor(provider),
        );

        assert_eq!(probe.call_count(), 1);
        assert_eq!(report.appended.len(), 1);
        assert_eq!(report.outcomes["t2"], ThreadOutcome::FullyIngested);
    }

    #[test]
    fn test_rerun_with_refreshed_ledger_appends_nothing() {
        let provider = MockProvider::new(SHELL_JSON);
        let threads = [thread("t1", &["m1", "m2"])];

        let mut ledger = Ledger::new();
        let first = pipeline().run(&threads, &mut ledger, &extractor(provider.clone()));
        assert_eq!(first.appended.len(), 2);

        // Second run over the identical candidate set, ledger reseeded from
        // the ids persisted by the first run
        let mut reseeded: Ledger = first
            .appended
            .iter()
            .map(|r| r.source_message_id.clone())
            .collect();
        let second = pipeline().run(&threads, &mut reseeded, &extractor(provider));

        assert!(second.appended.is_empty());
        assert_eq!(second.outcomes["t1"], ThreadOutcome::FullyIngested);
    }

    #[test]
    fn test_state_machine_outcomes() {
        assert_eq!(ThreadState::Pending.outcome(), ThreadOutcome::FullyIngested);
        assert_eq!(
            ThreadState::Succeeded.outcome(),
            ThreadOutcome::FullyIngested
        );
        assert_eq!(ThreadState::Failed.outcome(), ThreadOutcome::PartialFailure);
    }

    #[test]
    fn test_empty_candidate_set() {
        let provider = MockProvider::new(SHELL_JSON);
        let mut ledger = Ledger::new();

        let report = pipeline().run(&[], &mut ledger, &extractor(provider));

        assert!(report.appended.is_empty());
        assert!(report.outcomes.is_empty());
    }
}
