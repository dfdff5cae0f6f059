//! Run-summary notification

use std::convert::Infallible;
use tallyman_domain::traits::Notifier;
use tallyman_domain::RunSummary;
use tracing::info;

/// Notifier that reports the run summary on the operator log
///
/// The real outbound channel (the summary email) is an external
/// collaborator; its formatting carries no invariants. The coordinator
/// already guarantees this is only invoked when something was processed.
#[derive(Debug, Clone, Copy, Default)]
pub struct ConsoleNotifier;

impl Notifier for ConsoleNotifier {
    type Error = Infallible;

    fn notify(&self, summary: &RunSummary) -> Result<(), Self::Error> {
        info!(
            "Expense update: {} new transactions processed",
            summary.processed_count
        );
        if summary.failed_threads > 0 {
            info!(
                "{} thread(s) left for retry on the next run",
                summary.failed_threads
            );
        }
        Ok(())
    }
}
