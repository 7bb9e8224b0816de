//! Dedup-aware bulk import of parsed tables
//!
//! Parsed rows become records keyed by `(exchange_product_id, date)`. Keys
//! already in the store are looked up in bounded chunks, and only the
//! records the store has not seen are written, in bounded batches.

use crate::storage::{Record, Storage, TradeKey};
use crate::table::ParsedTable;
use crate::HarvestError;
use std::collections::{HashMap, HashSet};

/// Default number of keys per existence query
pub const DEFAULT_CHECK_CHUNK_SIZE: usize = 1000;

/// Default number of records per insert transaction
pub const DEFAULT_INSERT_BATCH_SIZE: usize = 1000;

/// Imports parsed tables into a [`Storage`] without duplicating records
#[derive(Debug, Clone, Copy)]
pub struct DedupBulkImporter {
    check_chunk_size: usize,
    insert_batch_size: usize,
}

impl Default for DedupBulkImporter {
    fn default() -> Self {
        Self::new(DEFAULT_CHECK_CHUNK_SIZE, DEFAULT_INSERT_BATCH_SIZE)
    }
}

impl DedupBulkImporter {
    /// Creates an importer; zero sizes are treated as one
    pub fn new(check_chunk_size: usize, insert_batch_size: usize) -> Self {
        Self {
            check_chunk_size: check_chunk_size.max(1),
            insert_batch_size: insert_batch_size.max(1),
        }
    }

    pub fn check_chunk_size(&self) -> usize {
        self.check_chunk_size
    }

    pub fn insert_batch_size(&self) -> usize {
        self.insert_batch_size
    }

    /// Imports every row of every table and returns the number inserted
    ///
    /// Batches are committed one after another. If a batch fails the error
    /// is returned; batches committed before it stay in the store.
    pub fn import_all<S: Storage + ?Sized>(
        &self,
        storage: &mut S,
        tables: &[ParsedTable],
    ) -> Result<usize, HarvestError> {
        let candidates = collapse_duplicates(
            tables
                .iter()
                .flat_map(|table| {
                    table
                        .rows
                        .iter()
                        .map(move |row| Record::from_row(row, table.published_date))
                })
                .collect(),
        );

        if candidates.is_empty() {
            tracing::debug!("No records to import");
            return Ok(0);
        }

        let keys: Vec<TradeKey> = candidates.iter().map(Record::key).collect();
        let mut existing = HashSet::new();
        for chunk in keys.chunks(self.check_chunk_size) {
            existing.extend(storage.existing_keys(chunk)?);
        }

        let fresh: Vec<Record> = candidates
            .into_iter()
            .filter(|record| !existing.contains(&record.key()))
            .collect();

        tracing::info!(
            "{} candidate records, {} already stored, {} to insert",
            keys.len(),
            existing.len(),
            fresh.len()
        );

        let mut inserted = 0;
        for (index, batch) in fresh.chunks(self.insert_batch_size).enumerate() {
            inserted += storage.bulk_insert(batch)?;
            tracing::debug!("Committed batch {} ({} records)", index + 1, batch.len());
        }

        Ok(inserted)
    }
}

/// Keeps one record per natural key
///
/// The last record seen for a key supplies the field values; the first
/// occurrence keeps its position.
fn collapse_duplicates(records: Vec<Record>) -> Vec<Record> {
    let mut positions: HashMap<TradeKey, usize> = HashMap::with_capacity(records.len());
    let mut unique: Vec<Record> = Vec::with_capacity(records.len());

    for record in records {
        match positions.get(&record.key()) {
            Some(&index) => unique[index] = record,
            None => {
                positions.insert(record.key(), unique.len());
                unique.push(record);
            }
        }
    }

    unique
}
