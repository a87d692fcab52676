// ==========================================
// Bedna workflow - shipment repository
// ==========================================
// Sequence numbers are read and written in one IMMEDIATE
// transaction; UNIQUE(customer_id, direction, year, sequence_no)
// backs the invariant against out-of-process writers.
// ==========================================

use crate::db::begin_immediate;
use crate::domain::action_log::{ActionType, EntityKind};
use crate::domain::shipment::{NewShipment, Shipment};
use crate::domain::types::ShipmentDirection;
use crate::engine::numbering::NumberingService;
use crate::repository::action_log_repo::ActionLogRepository;
use crate::repository::error::{RepositoryError, RepositoryResult};
use crate::repository::number_ledger::SqliteNumberLedger;
use crate::repository::sql_types::enum_col;
use chrono::{Datelike, NaiveDate};
use rusqlite::{params, Connection, OptionalExtension, Result as SqliteResult, Row};
use std::sync::{Arc, Mutex};
use tracing::info;

const SHIPMENT_SELECT: &str = r#"
    SELECT s.id, s.customer_id, c.code, s.consignee_id, s.ship_date,
           s.delivery_note, s.direction, s.sequence_no
    FROM shipment s
    JOIN customer c ON c.id = s.customer_id
"#;

pub struct ShipmentRepository {
    conn: Arc<Mutex<Connection>>,
}

impl ShipmentRepository {
    pub fn new(conn: Arc<Mutex<Connection>>) -> Self {
        Self { conn }
    }

    fn get_conn(&self) -> RepositoryResult<std::sync::MutexGuard<Connection>> {
        self.conn
            .lock()
            .map_err(|e| RepositoryError::LockError(e.to_string()))
    }

    /// Insert a shipment with the next sequence number of its scope.
    ///
    /// # Errors
    /// - `NumberingConflict` when another writer took the number first
    pub fn create_shipment(&self, new: &NewShipment, actor: &str) -> RepositoryResult<Shipment> {
        let year = new.date.year();
        let scope = SqliteNumberLedger::shipment_scope(new.customer_id, new.direction, year);

        let conn = self.get_conn()?;
        let tx = begin_immediate(&conn)
            .map_err(|e| RepositoryError::from(e).into_numbering_conflict(&scope))?;

        let ledger = SqliteNumberLedger::new(&tx);
        let sequence_no =
            NumberingService::next_shipment_sequence(&ledger, new.customer_id, new.direction, year)?;

        tx.execute(
            r#"
            INSERT INTO shipment (customer_id, consignee_id, ship_date, year, delivery_note, direction, sequence_no)
            VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)
            "#,
            params![
                new.customer_id,
                new.consignee_id,
                new.date.format("%Y-%m-%d").to_string(),
                year,
                new.delivery_note,
                new.direction.to_db_str(),
                sequence_no,
            ],
        )
        .map_err(|e| RepositoryError::from(e).into_numbering_conflict(&scope))?;
        let id = tx.last_insert_rowid();
        ledger.record(&scope, sequence_no)?;

        let shipment = Self::find_shipment_tx(&tx, id)?
            .ok_or_else(|| RepositoryError::not_found("Shipment", id))?;
        ActionLogRepository::record_tx(
            &tx,
            actor,
            ActionType::Create,
            EntityKind::Shipment,
            id,
            None,
            Some(&shipment),
            Some(shipment.label()),
        )?;

        tx.commit()
            .map_err(|e| RepositoryError::from(e).into_numbering_conflict(&scope))?;
        info!(shipment_id = id, label = %shipment.label(), "shipment created");
        Ok(shipment)
    }

    pub fn find_shipment(&self, id: i64) -> RepositoryResult<Option<Shipment>> {
        let conn = self.get_conn()?;
        Self::find_shipment_tx(&conn, id)
    }

    pub fn find_shipment_tx(conn: &Connection, id: i64) -> RepositoryResult<Option<Shipment>> {
        let sql = format!("{} WHERE s.id = ?1", SHIPMENT_SELECT);
        Ok(conn.query_row(&sql, params![id], map_shipment).optional()?)
    }

    pub fn list_for_customer(
        &self,
        customer_id: i64,
        direction: ShipmentDirection,
        year: i32,
    ) -> RepositoryResult<Vec<Shipment>> {
        let conn = self.get_conn()?;
        let sql = format!(
            "{} WHERE s.customer_id = ?1 AND s.direction = ?2 AND s.year = ?3 ORDER BY s.sequence_no",
            SHIPMENT_SELECT
        );
        let mut stmt = conn.prepare(&sql)?;
        let shipments = stmt
            .query_map(params![customer_id, direction.to_db_str(), year], map_shipment)?
            .collect::<SqliteResult<Vec<_>>>()?;
        Ok(shipments)
    }
}

fn map_shipment(row: &Row) -> SqliteResult<Shipment> {
    let date: String = row.get(4)?;
    let date = NaiveDate::parse_from_str(&date, "%Y-%m-%d").map_err(|e| {
        rusqlite::Error::FromSqlConversionFailure(4, rusqlite::types::Type::Text, Box::new(e))
    })?;
    Ok(Shipment {
        id: row.get(0)?,
        customer_id: row.get(1)?,
        customer_code: row.get(2)?,
        consignee_id: row.get(3)?,
        date,
        delivery_note: row.get(5)?,
        direction: enum_col(row, 6, ShipmentDirection::from_db_str)?,
        sequence_no: row.get(7)?,
    })
}
