//! Database schema definitions
//!
//! This module contains the SQL schema for the Bulletin-Harvest database.

/// SQL schema for the database
pub const SCHEMA_SQL: &str = r#"
-- Trading results, one row per instrument and trading date
CREATE TABLE IF NOT EXISTS trading_results (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    exchange_product_id TEXT NOT NULL,
    exchange_product_name TEXT NOT NULL,
    oil_id TEXT NOT NULL,
    delivery_basis_id TEXT NOT NULL,
    delivery_basis_name TEXT NOT NULL,
    delivery_type_id TEXT NOT NULL,
    volume INTEGER NOT NULL,
    total INTEGER NOT NULL,
    count INTEGER NOT NULL,
    date TEXT NOT NULL,
    created_on TEXT NOT NULL,
    updated_on TEXT NOT NULL,
    UNIQUE(exchange_product_id, date)
);

CREATE INDEX IF NOT EXISTS idx_trading_results_date ON trading_results(date);
CREATE INDEX IF NOT EXISTS idx_trading_results_oil ON trading_results(oil_id);
"#;

/// Initializes the database schema
///
/// # Arguments
///
/// * `conn` - SQLite connection
///
/// # Returns
///
/// * `Ok(())` - Schema initialized successfully
/// * `Err(rusqlite::Error)` - Failed to initialize schema
pub fn initialize_schema(conn: &rusqlite::Connection) -> Result<(), rusqlite::Error> {
    conn.execute_batch(SCHEMA_SQL)?;
    Ok(())
}
