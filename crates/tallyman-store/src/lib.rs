//! Tallyman Storage Layer
//!
//! Implements the `RecordStore` trait over an append-only CSV table.
//!
//! # Architecture
//!
//! One file per table, `<dir>/<table>.csv`, with a header row followed by
//! data rows in the fixed column order
//! `date, merchant, category, amount, description, source_message_id`.
//! The column order is the persisted contract: downstream consumers read
//! positionally, and the dedup seed is "every value of the last column
//! from row 2 onward".
//!
//! # Examples
//!
//! ```no_run
//! use tallyman_store::CsvStore;
//! use tallyman_domain::traits::RecordStore;
//!
//! let store = CsvStore::open("data", "Expenses").unwrap();
//! let ids = store.existing_source_ids().unwrap();
//! ```

#![warn(missing_docs)]

use std::fs::OpenOptions;
use std::path::{Path, PathBuf};
use tallyman_domain::traits::RecordStore;
use tallyman_domain::TransactionRecord;
use thiserror::Error;
use tracing::debug;

/// Errors that can occur during storage operations
#[derive(Error, Debug)]
pub enum StoreError {
    /// Filesystem error
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Row encoding or decoding error
    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),
}

/// CSV-file implementation of the append-only row store
///
/// A missing file is an empty table: the first run starts from nothing and
/// the file is created, header included, on the first append.
///
/// # Known limitation
///
/// The table is read once at the start of a run and never re-read mid-run.
/// A concurrent append by another process during a run is a data race this
/// design does not guard against.
pub struct CsvStore {
    path: PathBuf,
}

impl CsvStore {
    /// Open (without creating) the table `<dir>/<table>.csv`
    pub fn open<P: AsRef<Path>>(dir: P, table: &str) -> Result<Self, StoreError> {
        let path = dir.as_ref().join(format!("{}.csv", table));
        Ok(Self { path })
    }

    /// Path of the backing file
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Read every persisted record, oldest row first
    pub fn read_all(&self) -> Result<Vec<TransactionRecord>, StoreError> {
        if !self.path.exists() {
            return Ok(Vec::new());
        }

        let mut reader = csv::Reader::from_path(&self.path)?;
        let mut records = Vec::new();
        for row in reader.deserialize() {
            records.push(row?);
        }
        Ok(records)
    }
}

impl RecordStore for CsvStore {
    type Error = StoreError;

    fn existing_source_ids(&self) -> Result<Vec<String>, Self::Error> {
        if !self.path.exists() {
            debug!("Table {} absent, treating as empty", self.path.display());
            return Ok(Vec::new());
        }

        // Positional read of the last column; the header row is consumed
        // by the reader
        let mut reader = csv::Reader::from_path(&self.path)?;
        let mut ids = Vec::new();
        for row in reader.records() {
            let row = row?;
            if let Some(id) = row.get(5) {
                ids.push(id.to_string());
            }
        }
        Ok(ids)
    }

    fn append(&mut self, record: &TransactionRecord) -> Result<(), Self::Error> {
        if let Some(parent) = self.path.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent)?;
            }
        }

        let is_new = !self.path.exists();
        let file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.path)?;

        let mut writer = csv::WriterBuilder::new()
            .has_headers(is_new)
            .from_writer(file);
        writer.serialize(record)?;
        writer.flush()?;
        Ok(())
    }

    fn sort_by_date(&mut self) -> Result<(), Self::Error> {
        let mut records = self.read_all()?;
        if records.is_empty() {
            return Ok(());
        }

        // Stable sort keeps same-day rows in append order
        records.sort_by_key(|r| r.date);

        let mut writer = csv::Writer::from_path(&self.path)?;
        for record in &records {
            writer.serialize(record)?;
        }
        writer.flush()?;
        Ok(())
    }
}

/// In-memory implementation of the row store for tests
#[derive(Debug, Clone, Default)]
pub struct MemoryStore {
    records: Vec<TransactionRecord>,
}

impl MemoryStore {
    /// Create an empty store
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a store pre-seeded with records
    pub fn with_records(records: Vec<TransactionRecord>) -> Self {
        Self { records }
    }

    /// The persisted records, in table order
    pub fn records(&self) -> &[TransactionRecord] {
        &self.records
    }
}

impl RecordStore for MemoryStore {
    type Error = StoreError;

    fn existing_source_ids(&self) -> Result<Vec<String>, Self::Error> {
        Ok(self
            .records
            .iter()
            .map(|r| r.source_message_id.clone())
            .collect())
    }

    fn append(&mut self, record: &TransactionRecord) -> Result<(), Self::Error> {
        self.records.push(record.clone());
        Ok(())
    }

    fn sort_by_date(&mut self) -> Result<(), Self::Error> {
        self.records.sort_by_key(|r| r.date);
        Ok(())
    }
}
