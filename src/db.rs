// ==========================================
// Bedna workflow - SQLite connection and schema
// ==========================================
// - every connection gets the same PRAGMAs (foreign keys, busy timeout)
// - schema is created idempotently and stamped in schema_version
// - numbering writers take the write lock up front (IMMEDIATE)
// ==========================================

use rusqlite::{params, Connection, OptionalExtension, Transaction, TransactionBehavior};
use std::time::Duration;

/// Default busy_timeout (ms)
pub const DEFAULT_BUSY_TIMEOUT_MS: u64 = 5_000;

/// schema_version written by `init_schema`
pub const CURRENT_SCHEMA_VERSION: i64 = 1;

/// Apply the per-connection PRAGMAs
pub fn configure_sqlite_connection(conn: &Connection) -> rusqlite::Result<()> {
    conn.execute_batch("PRAGMA foreign_keys = ON;")?;
    conn.busy_timeout(Duration::from_millis(DEFAULT_BUSY_TIMEOUT_MS))?;
    Ok(())
}

/// Open a connection and configure it
pub fn open_sqlite_connection(db_path: &str) -> rusqlite::Result<Connection> {
    let conn = Connection::open(db_path)?;
    configure_sqlite_connection(&conn)?;
    Ok(conn)
}

/// Begin a transaction holding the write lock from the first statement.
///
/// Used wherever a number is read and then persisted, so the MAX read
/// and the insert cannot interleave with another writer.
pub fn begin_immediate(conn: &Connection) -> rusqlite::Result<Transaction<'_>> {
    Transaction::new_unchecked(conn, TransactionBehavior::Immediate)
}

/// Read schema_version (None when the table does not exist)
pub fn read_schema_version(conn: &Connection) -> rusqlite::Result<Option<i64>> {
    let has_table: bool = conn
        .query_row(
            "SELECT 1 FROM sqlite_master WHERE type='table' AND name='schema_version' LIMIT 1",
            [],
            |_row| Ok(true),
        )
        .optional()?
        .unwrap_or(false);

    if !has_table {
        return Ok(None);
    }

    let v: Option<i64> =
        conn.query_row("SELECT MAX(version) FROM schema_version", [], |row| row.get(0))?;
    Ok(v)
}

/// Create every table (idempotent)
pub fn init_schema(conn: &Connection) -> rusqlite::Result<()> {
    conn.execute_batch(SCHEMA_SQL)?;
    conn.execute(
        "INSERT OR IGNORE INTO schema_version (version) VALUES (?1)",
        params![CURRENT_SCHEMA_VERSION],
    )?;
    Ok(())
}

const SCHEMA_SQL: &str = r#"
CREATE TABLE IF NOT EXISTS schema_version (
    version INTEGER PRIMARY KEY,
    applied_at TEXT NOT NULL DEFAULT (datetime('now'))
);

CREATE TABLE IF NOT EXISTS config_scope (
    scope_id TEXT PRIMARY KEY,
    scope_type TEXT NOT NULL,
    scope_key TEXT NOT NULL,
    created_at TEXT NOT NULL DEFAULT (datetime('now')),
    UNIQUE(scope_type, scope_key)
);

INSERT OR IGNORE INTO config_scope (scope_id, scope_type, scope_key)
VALUES ('global', 'GLOBAL', 'global');

CREATE TABLE IF NOT EXISTS config_kv (
    scope_id TEXT NOT NULL REFERENCES config_scope(scope_id) ON DELETE CASCADE,
    key TEXT NOT NULL,
    value TEXT NOT NULL,
    updated_at TEXT NOT NULL DEFAULT (datetime('now')),
    PRIMARY KEY (scope_id, key)
);

CREATE TABLE IF NOT EXISTS customer (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    code TEXT NOT NULL UNIQUE,
    name TEXT NOT NULL,
    blast_all INTEGER NOT NULL DEFAULT 0,
    complete_only INTEGER NOT NULL DEFAULT 0,
    numbering_range INTEGER NOT NULL UNIQUE,
    pricing_model TEXT NOT NULL DEFAULT 'NONE'
);

CREATE TABLE IF NOT EXISTS consignee (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    name TEXT NOT NULL,
    address TEXT
);

CREATE TABLE IF NOT EXISTS specification (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    customer_id INTEGER NOT NULL REFERENCES customer(id),
    name TEXT NOT NULL,
    treatment_group INTEGER NOT NULL DEFAULT 0,
    active INTEGER NOT NULL DEFAULT 1,
    UNIQUE(customer_id, name)
);

CREATE TABLE IF NOT EXISTS head_type (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    name TEXT NOT NULL UNIQUE,
    description TEXT
);

CREATE TABLE IF NOT EXISTS price (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    customer_id INTEGER NOT NULL REFERENCES customer(id),
    length_min TEXT NOT NULL,
    length_max TEXT NOT NULL,
    rate_per_kg TEXT NOT NULL
);

CREATE TABLE IF NOT EXISTS price_specification (
    price_id INTEGER NOT NULL REFERENCES price(id) ON DELETE CASCADE,
    specification_id INTEGER NOT NULL REFERENCES specification(id),
    PRIMARY KEY (price_id, specification_id)
);

CREATE TABLE IF NOT EXISTS shipment (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    customer_id INTEGER NOT NULL REFERENCES customer(id),
    consignee_id INTEGER REFERENCES consignee(id),
    ship_date TEXT NOT NULL,
    year INTEGER NOT NULL,
    delivery_note TEXT,
    direction TEXT NOT NULL,
    sequence_no INTEGER NOT NULL,
    UNIQUE(customer_id, direction, year, sequence_no)
);

CREATE TABLE IF NOT EXISTS orders (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    shipment_in_id INTEGER NOT NULL REFERENCES shipment(id),
    shipment_out_id INTEGER REFERENCES shipment(id),
    article TEXT NOT NULL,
    diameter TEXT NOT NULL,
    length TEXT NOT NULL,
    specification_id INTEGER NOT NULL REFERENCES specification(id),
    head_type_id INTEGER REFERENCES head_type(id),
    full_thread INTEGER NOT NULL DEFAULT 0,
    description TEXT,
    priority TEXT NOT NULL DEFAULT 'LOW',
    consignee_id INTEGER REFERENCES consignee(id),
    dispatched INTEGER NOT NULL DEFAULT 0
);

CREATE INDEX IF NOT EXISTS idx_orders_shipment_in ON orders(shipment_in_id);

CREATE TABLE IF NOT EXISTS crate_unit (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    order_id INTEGER NOT NULL REFERENCES orders(id) ON DELETE CASCADE,
    customer_id INTEGER NOT NULL REFERENCES customer(id),
    crate_number INTEGER NOT NULL UNIQUE,
    net_weight TEXT NOT NULL,
    tare_weight TEXT NOT NULL,
    quantity INTEGER,
    material TEXT,
    batch TEXT,
    customer_container_no TEXT,
    supplier TEXT,
    notes TEXT,
    state TEXT NOT NULL DEFAULT 'RECEIVED',
    blast TEXT NOT NULL DEFAULT 'UNSPECIFIED',
    straighten TEXT NOT NULL DEFAULT 'UNSPECIFIED',
    phosphate INTEGER NOT NULL DEFAULT 0
);

CREATE INDEX IF NOT EXISTS idx_crate_order ON crate_unit(order_id);

CREATE TABLE IF NOT EXISTS number_ledger (
    scope TEXT PRIMARY KEY,
    last_issued INTEGER NOT NULL
);

CREATE TABLE IF NOT EXISTS action_log (
    action_id TEXT PRIMARY KEY,
    action_ts TEXT NOT NULL,
    actor TEXT NOT NULL,
    action_type TEXT NOT NULL,
    entity TEXT NOT NULL,
    entity_id INTEGER NOT NULL,
    payload_json TEXT,
    detail TEXT
);

CREATE INDEX IF NOT EXISTS idx_action_log_entity ON action_log(entity, entity_id);
"#;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_init_schema_is_idempotent() {
        let conn = Connection::open_in_memory().unwrap();
        configure_sqlite_connection(&conn).unwrap();

        assert_eq!(read_schema_version(&conn).unwrap(), None);
        init_schema(&conn).unwrap();
        init_schema(&conn).unwrap();
        assert_eq!(read_schema_version(&conn).unwrap(), Some(CURRENT_SCHEMA_VERSION));
    }
}
