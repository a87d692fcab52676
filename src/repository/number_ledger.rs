// ==========================================
// Bedna workflow - SQLite number ledger
// ==========================================
// High-water marks per numbering scope in number_ledger, so a
// deleted crate or shipment never frees its number for reuse.
// Must be used on a connection inside an IMMEDIATE transaction.
// ==========================================

use crate::domain::types::ShipmentDirection;
use crate::engine::numbering::NumberLedger;
use crate::repository::error::RepositoryResult;
use rusqlite::{params, Connection};
use tracing::warn;

pub struct SqliteNumberLedger<'a> {
    conn: &'a Connection,
}

impl<'a> SqliteNumberLedger<'a> {
    pub fn new(conn: &'a Connection) -> Self {
        Self { conn }
    }

    pub fn crate_scope(customer_id: i64) -> String {
        format!("CRATE/{}", customer_id)
    }

    pub fn shipment_scope(customer_id: i64, direction: ShipmentDirection, year: i32) -> String {
        format!("SHIPMENT/{}/{}/{}", customer_id, direction.to_db_str(), year)
    }

    /// Raise the scope's high-water mark to `value`
    pub fn record(&self, scope: &str, value: i64) -> RepositoryResult<()> {
        self.conn.execute(
            r#"
            INSERT INTO number_ledger (scope, last_issued) VALUES (?1, ?2)
            ON CONFLICT(scope) DO UPDATE SET last_issued = MAX(last_issued, excluded.last_issued)
            "#,
            params![scope, value],
        )?;
        Ok(())
    }
}

impl NumberLedger for SqliteNumberLedger<'_> {
    fn last_crate_number(&self, customer_id: i64) -> RepositoryResult<Option<i64>> {
        let last: Option<i64> = self.conn.query_row(
            r#"
            SELECT MAX(v) FROM (
                SELECT last_issued AS v FROM number_ledger WHERE scope = ?1
                UNION ALL
                SELECT MAX(crate_number) FROM crate_unit WHERE customer_id = ?2
            )
            "#,
            params![Self::crate_scope(customer_id), customer_id],
            |row| row.get(0),
        )?;
        Ok(last)
    }

    fn last_shipment_sequence(
        &self,
        customer_id: i64,
        direction: ShipmentDirection,
        year: i32,
    ) -> RepositoryResult<Option<i64>> {
        let last: Option<i64> = self.conn.query_row(
            r#"
            SELECT MAX(v) FROM (
                SELECT last_issued AS v FROM number_ledger WHERE scope = ?1
                UNION ALL
                SELECT MAX(sequence_no) FROM shipment
                WHERE customer_id = ?2 AND direction = ?3 AND year = ?4
            )
            "#,
            params![
                Self::shipment_scope(customer_id, direction, year),
                customer_id,
                direction.to_db_str(),
                year
            ],
            |row| row.get(0),
        )?;
        Ok(last)
    }
}

/// Run a numbering operation, retrying on `NumberingConflict`
///
/// `attempts` is the total number of tries (at least one). Other
/// errors and the last conflict are returned as-is.
pub fn with_numbering_retry<T, F>(attempts: u32, mut op: F) -> RepositoryResult<T>
where
    F: FnMut() -> RepositoryResult<T>,
{
    let attempts = attempts.max(1);
    let mut attempt = 1;
    loop {
        match op() {
            Err(e) if e.is_numbering_conflict() && attempt < attempts => {
                warn!(attempt, error = %e, "numbering conflict, retrying");
                attempt += 1;
            }
            other => return other,
        }
    }
}
