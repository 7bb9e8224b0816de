//! SQLite storage implementation
//!
//! This module provides a SQLite-based implementation of the Storage trait.

use crate::storage::schema::initialize_schema;
use crate::storage::traits::{Storage, StorageError, StorageResult};
use crate::storage::{Record, TradeKey};
use chrono::{NaiveDate, Utc};
use rusqlite::types::ToSql;
use rusqlite::{params, Connection, ErrorCode};
use std::collections::HashSet;
use std::path::Path;

/// SQLite storage backend
pub struct SqliteStorage {
    conn: Connection,
}

impl SqliteStorage {
    /// Creates a new SqliteStorage instance
    ///
    /// # Arguments
    ///
    /// * `path` - Path to the SQLite database file
    ///
    /// # Returns
    ///
    /// * `Ok(SqliteStorage)` - Successfully opened/created database
    /// * `Err(StorageError)` - Failed to open database
    pub fn new(path: &Path) -> StorageResult<Self> {
        let conn = Connection::open(path)?;

        // Configure SQLite for better performance
        conn.execute_batch(
            "
            PRAGMA journal_mode = WAL;
            PRAGMA synchronous = NORMAL;
            PRAGMA temp_store = MEMORY;
        ",
        )?;

        initialize_schema(&conn)?;

        Ok(Self { conn })
    }

    /// Creates an in-memory database (for testing)
    #[cfg(test)]
    pub fn new_in_memory() -> StorageResult<Self> {
        let conn = Connection::open_in_memory()?;
        initialize_schema(&conn)?;
        Ok(Self { conn })
    }
}

impl Storage for SqliteStorage {
    // ===== Import =====

    fn existing_keys(&self, keys: &[TradeKey]) -> StorageResult<HashSet<TradeKey>> {
        if keys.is_empty() {
            return Ok(HashSet::new());
        }

        let placeholders = vec!["(?, ?)"; keys.len()].join(", ");
        let sql = format!(
            "SELECT exchange_product_id, date FROM trading_results
             WHERE (exchange_product_id, date) IN (VALUES {})",
            placeholders
        );

        let mut values: Vec<&dyn ToSql> = Vec::with_capacity(keys.len() * 2);
        for key in keys {
            values.push(&key.exchange_product_id);
            values.push(&key.date);
        }

        let mut stmt = self.conn.prepare(&sql)?;
        let found = stmt
            .query_map(values.as_slice(), |row| {
                Ok(TradeKey {
                    exchange_product_id: row.get(0)?,
                    date: row.get(1)?,
                })
            })?
            .collect::<Result<HashSet<_>, _>>()?;

        Ok(found)
    }

    fn bulk_insert(&mut self, records: &[Record]) -> StorageResult<usize> {
        if records.is_empty() {
            return Ok(0);
        }

        let now = Utc::now().to_rfc3339();
        let tx = self.conn.transaction()?;

        {
            let mut stmt = tx.prepare(
                "INSERT INTO trading_results (exchange_product_id, exchange_product_name,
                 oil_id, delivery_basis_id, delivery_basis_name, delivery_type_id,
                 volume, total, count, date, created_on, updated_on)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?11)",
            )?;

            for record in records {
                stmt.execute(params![
                    record.exchange_product_id,
                    record.exchange_product_name,
                    record.oil_id,
                    record.delivery_basis_id,
                    record.delivery_basis_name,
                    record.delivery_type_id,
                    record.volume,
                    record.total,
                    record.count,
                    record.date,
                    now,
                ])
                .map_err(|e| constraint_or_sqlite(e, record))?;
            }
        }

        tx.commit()?;
        Ok(records.len())
    }

    // ===== Statistics =====

    fn count_records(&self) -> StorageResult<u64> {
        let count: i64 =
            self.conn
                .query_row("SELECT COUNT(*) FROM trading_results", [], |row| row.get(0))?;
        Ok(count as u64)
    }

    fn count_distinct_dates(&self) -> StorageResult<u64> {
        let count: i64 = self.conn.query_row(
            "SELECT COUNT(DISTINCT date) FROM trading_results",
            [],
            |row| row.get(0),
        )?;
        Ok(count as u64)
    }

    fn latest_date(&self) -> StorageResult<Option<NaiveDate>> {
        let date: Option<NaiveDate> =
            self.conn
                .query_row("SELECT MAX(date) FROM trading_results", [], |row| row.get(0))?;
        Ok(date)
    }
}

/// Maps a unique-key failure to a constraint violation naming the record
fn constraint_or_sqlite(err: rusqlite::Error, record: &Record) -> StorageError {
    match &err {
        rusqlite::Error::SqliteFailure(failure, _)
            if failure.code == ErrorCode::ConstraintViolation =>
        {
            StorageError::ConstraintViolation(format!(
                "record ({}, {}) already stored",
                record.exchange_product_id, record.date
            ))
        }
        _ => StorageError::Sqlite(err),
    }
}
