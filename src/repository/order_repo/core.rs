use crate::db::begin_immediate;
use crate::domain::action_log::{ActionType, EntityKind};
use crate::domain::order::{NewOrder, Order, OrderSummary, OrderUpdate};
use crate::domain::types::Priority;
use crate::repository::action_log_repo::ActionLogRepository;
use crate::repository::error::{RepositoryError, RepositoryResult};
use crate::repository::sql_types::{bool_col, decimal_col};
use rusqlite::{params, Connection, OptionalExtension, Result as SqliteResult, Row};
use std::collections::BTreeMap;
use std::sync::{Arc, Mutex};

pub(super) const ORDER_COLUMNS: &str = r#"
    id, shipment_in_id, shipment_out_id, article, diameter, length,
    specification_id, head_type_id, full_thread, description, priority,
    consignee_id, dispatched
"#;

// ==========================================
// OrderRepository
// ==========================================
pub struct OrderRepository {
    conn: Arc<Mutex<Connection>>,
}

impl OrderRepository {
    pub fn new(conn: Arc<Mutex<Connection>>) -> Self {
        Self { conn }
    }

    pub(super) fn get_conn(&self) -> RepositoryResult<std::sync::MutexGuard<Connection>> {
        self.conn
            .lock()
            .map_err(|e| RepositoryError::LockError(e.to_string()))
    }

    // ==========================================
    // Order writes
    // ==========================================

    pub fn create_order(&self, new: &NewOrder, actor: &str) -> RepositoryResult<Order> {
        let conn = self.get_conn()?;
        let tx = begin_immediate(&conn)?;
        let order = Self::create_order_tx(&tx, new, actor, ActionType::Create)?;
        tx.commit()?;
        Ok(order)
    }

    /// Insert an order; `action_type` tags the audit entry (CREATE, DISPATCH, IMPORT)
    pub fn create_order_tx(
        conn: &Connection,
        new: &NewOrder,
        actor: &str,
        action_type: ActionType,
    ) -> RepositoryResult<Order> {
        conn.execute(
            r#"
            INSERT INTO orders (
                shipment_in_id, article, diameter, length, specification_id,
                head_type_id, full_thread, description, priority, consignee_id
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10)
            "#,
            params![
                new.shipment_in_id,
                new.article,
                new.diameter.to_string(),
                new.length.to_string(),
                new.specification_id,
                new.head_type_id,
                new.full_thread,
                new.description,
                new.priority.to_db_str(),
                new.consignee_id,
            ],
        )?;
        let id = conn.last_insert_rowid();
        let order = Self::find_order_tx(conn, id)?.ok_or_else(|| RepositoryError::not_found("Order", id))?;
        ActionLogRepository::record_tx(
            conn,
            actor,
            action_type,
            EntityKind::Order,
            id,
            None,
            Some(&order),
            None,
        )?;
        Ok(order)
    }

    /// Persist every column of `order` and audit the change
    pub(super) fn write_order_tx(
        conn: &Connection,
        before: &Order,
        after: &Order,
        actor: &str,
        action_type: ActionType,
    ) -> RepositoryResult<()> {
        conn.execute(
            r#"
            UPDATE orders SET
                shipment_out_id = ?1, article = ?2, diameter = ?3, length = ?4,
                specification_id = ?5, head_type_id = ?6, full_thread = ?7,
                description = ?8, priority = ?9, consignee_id = ?10, dispatched = ?11
            WHERE id = ?12
            "#,
            params![
                after.shipment_out_id,
                after.article,
                after.diameter.to_string(),
                after.length.to_string(),
                after.specification_id,
                after.head_type_id,
                after.full_thread,
                after.description,
                after.priority.to_db_str(),
                after.consignee_id,
                after.dispatched,
                after.id,
            ],
        )?;
        ActionLogRepository::record_tx(
            conn,
            actor,
            action_type,
            EntityKind::Order,
            after.id,
            Some(before),
            Some(after),
            None,
        )
    }

    pub fn update_order(&self, id: i64, update: &OrderUpdate, actor: &str) -> RepositoryResult<Order> {
        let conn = self.get_conn()?;
        let tx = begin_immediate(&conn)?;

        let before = Self::find_order_tx(&tx, id)?.ok_or_else(|| RepositoryError::not_found("Order", id))?;
        let mut after = before.clone();
        update.apply_to(&mut after);
        Self::write_order_tx(&tx, &before, &after, actor, ActionType::Update)?;

        tx.commit()?;
        Ok(after)
    }

    /// Delete an order together with its crates; returns the crate count
    pub fn delete_order(&self, id: i64, actor: &str) -> RepositoryResult<usize> {
        let conn = self.get_conn()?;
        let tx = begin_immediate(&conn)?;

        let order = Self::find_order_tx(&tx, id)?.ok_or_else(|| RepositoryError::not_found("Order", id))?;
        let crates = Self::list_crates_tx(&tx, id)?;
        for item in &crates {
            ActionLogRepository::record_tx(
                &tx,
                actor,
                ActionType::Delete,
                EntityKind::Crate,
                item.id,
                Some(item),
                None,
                None,
            )?;
        }
        tx.execute("DELETE FROM orders WHERE id = ?1", params![id])?;
        ActionLogRepository::record_tx(
            &tx,
            actor,
            ActionType::Delete,
            EntityKind::Order,
            id,
            Some(&order),
            None,
            Some(format!("{} crate(s) removed", crates.len())),
        )?;

        tx.commit()?;
        Ok(crates.len())
    }

    // ==========================================
    // Order reads
    // ==========================================

    pub fn find_order(&self, id: i64) -> RepositoryResult<Option<Order>> {
        let conn = self.get_conn()?;
        Self::find_order_tx(&conn, id)
    }

    pub fn find_order_tx(conn: &Connection, id: i64) -> RepositoryResult<Option<Order>> {
        let sql = format!("SELECT {} FROM orders WHERE id = ?1", ORDER_COLUMNS);
        Ok(conn.query_row(&sql, params![id], map_order).optional()?)
    }

    pub fn list_orders_for_shipment(&self, shipment_id: i64) -> RepositoryResult<Vec<Order>> {
        let conn = self.get_conn()?;
        let sql = format!(
            "SELECT {} FROM orders WHERE shipment_in_id = ?1 OR shipment_out_id = ?1 ORDER BY id",
            ORDER_COLUMNS
        );
        let mut stmt = conn.prepare(&sql)?;
        let orders = stmt
            .query_map(params![shipment_id], map_order)?
            .collect::<SqliteResult<Vec<_>>>()?;
        Ok(orders)
    }

    /// Crate count, counts per state and total net weight
    pub fn order_summary(&self, order_id: i64) -> RepositoryResult<OrderSummary> {
        let conn = self.get_conn()?;
        if Self::find_order_tx(&conn, order_id)?.is_none() {
            return Err(RepositoryError::not_found("Order", order_id));
        }
        let crates = Self::list_crates_tx(&conn, order_id)?;

        let mut counts_by_state = BTreeMap::new();
        for item in &crates {
            *counts_by_state.entry(item.state).or_insert(0) += 1;
        }
        Ok(OrderSummary {
            order_id,
            crate_count: crates.len(),
            counts_by_state,
            total_net_weight: crates.iter().map(|c| c.net_weight).sum(),
        })
    }
}

pub(super) fn map_order(row: &Row) -> SqliteResult<Order> {
    let priority: String = row.get(10)?;
    Ok(Order {
        id: row.get(0)?,
        shipment_in_id: row.get(1)?,
        shipment_out_id: row.get(2)?,
        article: row.get(3)?,
        diameter: decimal_col(row, 4)?,
        length: decimal_col(row, 5)?,
        specification_id: row.get(6)?,
        head_type_id: row.get(7)?,
        full_thread: bool_col(row, 8)?,
        description: row.get(9)?,
        priority: Priority::from_db_str(&priority),
        consignee_id: row.get(11)?,
        dispatched: bool_col(row, 12)?,
    })
}
