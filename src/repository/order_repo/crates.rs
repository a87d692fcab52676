use super::core::OrderRepository;
use crate::db::begin_immediate;
use crate::domain::action_log::{ActionType, EntityKind};
use crate::domain::crates::{Crate, CrateUpdate, NewCrate};
use crate::domain::customer::Customer;
use crate::domain::types::{BlastState, CrateState, StraightenState};
use crate::engine::numbering::NumberingService;
use crate::engine::transition::TransitionEngine;
use crate::repository::action_log_repo::ActionLogRepository;
use crate::repository::customer_repo::CustomerRepository;
use crate::repository::error::{RepositoryError, RepositoryResult};
use crate::repository::number_ledger::SqliteNumberLedger;
use crate::repository::sql_types::{bool_col, decimal_col, enum_col};
use rusqlite::{params, Connection, OptionalExtension, Result as SqliteResult, Row};
use tracing::{debug, info};

const CRATE_COLUMNS: &str = r#"
    id, order_id, crate_number, net_weight, tare_weight, quantity, material,
    batch, customer_container_no, supplier, notes, state, blast, straighten, phosphate
"#;

impl OrderRepository {
    // ==========================================
    // Crate creation (identity phase)
    // ==========================================

    /// Number and insert new crates for an order.
    ///
    /// # Errors
    /// - `ValidationError` for bad weights (nothing is written)
    /// - `NumberingConflict` when another writer issued the same number
    pub fn create_crates(
        &self,
        order_id: i64,
        crates: Vec<NewCrate>,
        actor: &str,
    ) -> RepositoryResult<Vec<Crate>> {
        let conn = self.get_conn()?;
        let order = Self::find_order_tx(&conn, order_id)?
            .ok_or_else(|| RepositoryError::not_found("Order", order_id))?;
        let customer = CustomerRepository::find_customer_for_shipment_tx(&conn, order.shipment_in_id)?
            .ok_or_else(|| RepositoryError::not_found("Customer for shipment", order.shipment_in_id))?;
        let scope = SqliteNumberLedger::crate_scope(customer.id);

        let tx = begin_immediate(&conn)
            .map_err(|e| RepositoryError::from(e).into_numbering_conflict(&scope))?;
        let created = Self::create_crates_tx(&tx, &customer, order_id, crates, actor, ActionType::Create)?;
        tx.commit()
            .map_err(|e| RepositoryError::from(e).into_numbering_conflict(&scope))?;

        info!(
            order_id,
            count = created.len(),
            first = created.first().map(|c| c.crate_number),
            "crates created"
        );
        Ok(created)
    }

    /// Numbering + insert inside an IMMEDIATE transaction
    pub fn create_crates_tx(
        conn: &Connection,
        customer: &Customer,
        order_id: i64,
        crates: Vec<NewCrate>,
        actor: &str,
        action_type: ActionType,
    ) -> RepositoryResult<Vec<Crate>> {
        let scope = SqliteNumberLedger::crate_scope(customer.id);
        let ledger = SqliteNumberLedger::new(conn);
        let default_blast = NumberingService::default_blast(customer);

        let mut created = Vec::with_capacity(crates.len());
        for new in crates {
            new.validate()
                .map_err(|reasons| RepositoryError::ValidationError(reasons.join("; ")))?;

            let crate_number = NumberingService::next_crate_number(&ledger, customer)?;
            let item = new.into_crate(0, order_id, crate_number, default_blast);
            conn.execute(
                r#"
                INSERT INTO crate_unit (
                    order_id, customer_id, crate_number, net_weight, tare_weight, quantity,
                    material, batch, customer_container_no, supplier, notes,
                    state, blast, straighten, phosphate
                ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13, ?14, ?15)
                "#,
                params![
                    order_id,
                    customer.id,
                    item.crate_number,
                    item.net_weight.to_string(),
                    item.tare_weight.to_string(),
                    item.quantity,
                    item.material,
                    item.batch,
                    item.customer_container_no,
                    item.supplier,
                    item.notes,
                    item.state.to_db_str(),
                    item.blast.to_db_str(),
                    item.straighten.to_db_str(),
                    item.phosphate,
                ],
            )
            .map_err(|e| RepositoryError::from(e).into_numbering_conflict(&scope))?;
            // read before the ledger write, which may insert its own row
            let item = Crate {
                id: conn.last_insert_rowid(),
                ..item
            };
            ledger.record(&scope, crate_number)?;

            debug!(crate_id = item.id, crate_number, "crate numbered");
            ActionLogRepository::record_tx(
                conn,
                actor,
                action_type,
                EntityKind::Crate,
                item.id,
                None,
                Some(&item),
                None,
            )?;
            created.push(item);
        }
        Ok(created)
    }

    // ==========================================
    // Crate updates
    // ==========================================

    /// Apply a workflow edit to one crate.
    ///
    /// The crate is re-read under the write lock and the edit is checked
    /// against that row, not against the caller's snapshot.
    pub fn update_crate(&self, crate_id: i64, update: &CrateUpdate, actor: &str) -> RepositoryResult<Crate> {
        let conn = self.get_conn()?;
        let tx = begin_immediate(&conn)?;
        let after = Self::checked_update_tx(&tx, crate_id, update, actor)?;
        tx.commit()?;
        Ok(after)
    }

    /// Apply a set of per-crate updates atomically (bulk field change)
    pub fn apply_crate_updates(
        &self,
        updates: &[(i64, CrateUpdate)],
        actor: &str,
    ) -> RepositoryResult<Vec<Crate>> {
        let conn = self.get_conn()?;
        let tx = begin_immediate(&conn)?;

        let mut written = Vec::with_capacity(updates.len());
        for (crate_id, update) in updates {
            written.push(Self::checked_update_tx(&tx, *crate_id, update, actor)?);
        }

        tx.commit()?;
        Ok(written)
    }

    fn checked_update_tx(
        conn: &Connection,
        crate_id: i64,
        update: &CrateUpdate,
        actor: &str,
    ) -> RepositoryResult<Crate> {
        let before = Self::find_crate_tx(conn, crate_id)?
            .ok_or_else(|| RepositoryError::not_found("Crate", crate_id))?;
        let order = Self::find_order_tx(conn, before.order_id)?
            .ok_or_else(|| RepositoryError::not_found("Order", before.order_id))?;
        if order.dispatched {
            return Err(RepositoryError::OrderDispatched { order_id: order.id });
        }
        TransitionEngine::validate_update(&before, update).map_err(|violations| {
            RepositoryError::TransitionRejected {
                crate_number: before.crate_number,
                violations,
            }
        })?;

        let mut after = before.clone();
        update.apply_to(&mut after);
        Self::write_crate_tx(conn, &before, &after, actor, ActionType::Update)?;
        Ok(after)
    }

    /// Persist the mutable columns of a crate (including order_id) and audit
    pub(super) fn write_crate_tx(
        conn: &Connection,
        before: &Crate,
        after: &Crate,
        actor: &str,
        action_type: ActionType,
    ) -> RepositoryResult<()> {
        conn.execute(
            r#"
            UPDATE crate_unit SET
                order_id = ?1, net_weight = ?2, tare_weight = ?3, quantity = ?4,
                notes = ?5, state = ?6, blast = ?7, straighten = ?8, phosphate = ?9
            WHERE id = ?10
            "#,
            params![
                after.order_id,
                after.net_weight.to_string(),
                after.tare_weight.to_string(),
                after.quantity,
                after.notes,
                after.state.to_db_str(),
                after.blast.to_db_str(),
                after.straighten.to_db_str(),
                after.phosphate,
                after.id,
            ],
        )?;
        ActionLogRepository::record_tx(
            conn,
            actor,
            action_type,
            EntityKind::Crate,
            after.id,
            Some(before),
            Some(after),
            None,
        )
    }

    // ==========================================
    // Crate reads
    // ==========================================

    pub fn find_crate(&self, crate_id: i64) -> RepositoryResult<Option<Crate>> {
        let conn = self.get_conn()?;
        Self::find_crate_tx(&conn, crate_id)
    }

    pub fn find_crate_tx(conn: &Connection, crate_id: i64) -> RepositoryResult<Option<Crate>> {
        let sql = format!("SELECT {} FROM crate_unit WHERE id = ?1", CRATE_COLUMNS);
        Ok(conn.query_row(&sql, params![crate_id], map_crate).optional()?)
    }

    pub fn find_crate_by_number(&self, crate_number: i64) -> RepositoryResult<Option<Crate>> {
        let conn = self.get_conn()?;
        let sql = format!("SELECT {} FROM crate_unit WHERE crate_number = ?1", CRATE_COLUMNS);
        Ok(conn.query_row(&sql, params![crate_number], map_crate).optional()?)
    }

    pub fn list_crates(&self, order_id: i64) -> RepositoryResult<Vec<Crate>> {
        let conn = self.get_conn()?;
        Self::list_crates_tx(&conn, order_id)
    }

    /// Crates of an order in numbering order
    pub fn list_crates_tx(conn: &Connection, order_id: i64) -> RepositoryResult<Vec<Crate>> {
        let sql = format!(
            "SELECT {} FROM crate_unit WHERE order_id = ?1 ORDER BY crate_number",
            CRATE_COLUMNS
        );
        let mut stmt = conn.prepare(&sql)?;
        let crates = stmt
            .query_map(params![order_id], map_crate)?
            .collect::<SqliteResult<Vec<_>>>()?;
        Ok(crates)
    }
}

fn map_crate(row: &Row) -> SqliteResult<Crate> {
    Ok(Crate {
        id: row.get(0)?,
        order_id: row.get(1)?,
        crate_number: row.get(2)?,
        net_weight: decimal_col(row, 3)?,
        tare_weight: decimal_col(row, 4)?,
        quantity: row.get(5)?,
        material: row.get(6)?,
        batch: row.get(7)?,
        customer_container_no: row.get(8)?,
        supplier: row.get(9)?,
        notes: row.get(10)?,
        state: enum_col(row, 11, CrateState::from_db_str)?,
        blast: enum_col(row, 12, BlastState::from_db_str)?,
        straighten: enum_col(row, 13, StraightenState::from_db_str)?,
        phosphate: bool_col(row, 14)?,
    })
}
