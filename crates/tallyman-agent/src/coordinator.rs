//! Run Coordinator - orchestrates one complete ingestion execution

use crate::error::AgentError;
use std::fmt::Display;
use tallyman_domain::traits::{LlmProvider, MessageSource, Notifier, RecordStore};
use tallyman_domain::{MailboxQuery, RunSummary};
use tallyman_extractor::RecordExtractor;
use tallyman_pipeline::{IngestionPipeline, Ledger};
use tracing::{debug, info, warn};

/// Orchestrates one run: fetch candidates, drive the pipeline, then hand
/// results to the persistence, labeling, and notification collaborators
///
/// The coordinator is the only component touching all collaborators. One
/// `execute` call processes one bounded batch to completion; there is no
/// mid-run cancellation. Collaborator failures surface and terminate the
/// run - by then the pipeline has already contained every data-level
/// failure at thread granularity.
pub struct Coordinator<M, S, L, N>
where
    M: MessageSource,
    S: RecordStore,
    L: LlmProvider,
    N: Notifier,
{
    mailbox: M,
    store: S,
    extractor: RecordExtractor<L>,
    notifier: N,
    pipeline: IngestionPipeline,
    query: MailboxQuery,
    processed_label: String,
}

impl<M, S, L, N> Coordinator<M, S, L, N>
where
    M: MessageSource,
    M::Error: Display,
    S: RecordStore,
    S::Error: Display,
    L: LlmProvider,
    L::Error: Display,
    N: Notifier,
    N::Error: Display,
{
    /// Wire a coordinator from its collaborators
    pub fn new(
        mailbox: M,
        store: S,
        extractor: RecordExtractor<L>,
        notifier: N,
        pipeline: IngestionPipeline,
        query: MailboxQuery,
        processed_label: impl Into<String>,
    ) -> Self {
        Self {
            mailbox,
            store,
            extractor,
            notifier,
            pipeline,
            query,
            processed_label: processed_label.into(),
        }
    }

    /// Execute one ingestion run
    ///
    /// Returns the count of newly ingested records for observability. A
    /// run that found nothing new is a silent no-op: no appends, no
    /// labels, no notification.
    pub fn execute(&mut self) -> Result<RunSummary, AgentError> {
        // 1. The processed marker must exist before anything is fetched
        self.mailbox
            .ensure_label(&self.processed_label)
            .map_err(|e| AgentError::Mailbox(e.to_string()))?;

        // 2. Seed the dedup ledger from persisted state
        let mut ledger =
            Ledger::load(&self.store).map_err(|e| AgentError::Store(e.to_string()))?;

        // 3. Bounded candidate batch
        let threads = self
            .mailbox
            .search(&self.query)
            .map_err(|e| AgentError::Mailbox(e.to_string()))?;

        if threads.is_empty() {
            info!("No new expense emails found");
            return Ok(RunSummary::default());
        }
        info!("Found {} candidate thread(s)", threads.len());

        // 4. Extraction with per-thread failure containment
        let report = self.pipeline.run(&threads, &mut ledger, &self.extractor);

        // 5. Persist every new record, in discovery order
        for record in &report.appended {
            self.store
                .append(record)
                .map_err(|e| AgentError::Store(e.to_string()))?;
        }

        // 6. Mark fully-ingested threads processed; the rest stay
        //    candidates for the next run
        for thread in &threads {
            match report.outcomes.get(&thread.id) {
                Some(outcome) if outcome.is_processed() => {
                    self.mailbox
                        .add_label(&thread.id, &self.processed_label)
                        .map_err(|e| AgentError::Mailbox(e.to_string()))?;
                }
                _ => warn!("Thread {} not marked processed", thread.id),
            }
        }

        // 7. Downstream sort runs once, after all appends have landed
        self.store
            .sort_by_date()
            .map_err(|e| AgentError::Store(e.to_string()))?;

        let summary = RunSummary {
            processed_count: report.appended.len(),
            failed_threads: report.failed_thread_count(),
        };

        // 8. Notify on success only
        if summary.should_notify() {
            self.notifier
                .notify(&summary)
                .map_err(|e| AgentError::Notify(e.to_string()))?;
        } else {
            debug!("Nothing ingested; skipping notification");
        }

        info!(
            "Run complete: {} record(s) ingested, {} thread(s) retry-eligible",
            summary.processed_count, summary.failed_threads
        );
        Ok(summary)
    }
}
