//! Deduplication ledger - run-local index of ingested message ids

use std::collections::HashSet;
use tallyman_domain::traits::RecordStore;
use tracing::info;

/// Run-local set of already-ingested `source_message_id` values
///
/// Seeded once per run from persisted state, mutated additively during the
/// run, and discarded at the end. The persisted table is the source of
/// truth; the ledger is a cache over it with O(1) membership, so dedup
/// cost stays flat as history grows.
#[derive(Debug, Clone, Default)]
pub struct Ledger {
    ids: HashSet<String>,
}

impl Ledger {
    /// Create an empty ledger
    pub fn new() -> Self {
        Self::default()
    }

    /// Seed a ledger from every `source_message_id` the store already holds
    ///
    /// An empty or absent table yields an empty ledger (first run).
    pub fn load<S: RecordStore>(store: &S) -> Result<Self, S::Error> {
        let ids = store.existing_source_ids()?;
        info!("Ledger seeded with {} previously ingested ids", ids.len());
        Ok(Self {
            ids: ids.into_iter().collect(),
        })
    }

    /// Whether a message id has already been ingested
    pub fn contains(&self, id: &str) -> bool {
        self.ids.contains(id)
    }

    /// Record a freshly ingested message id
    pub fn add(&mut self, id: String) {
        self.ids.insert(id);
    }

    /// Number of ids tracked
    pub fn len(&self) -> usize {
        self.ids.len()
    }

    /// Whether the ledger tracks no ids
    pub fn is_empty(&self) -> bool {
        self.ids.is_empty()
    }
}

impl FromIterator<String> for Ledger {
    fn from_iter<I: IntoIterator<Item = String>>(iter: I) -> Self {
        Self {
            ids: iter.into_iter().collect(),
        }
    }
}
