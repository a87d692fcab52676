// ==========================================
// Bedna workflow - customer / consignee repository
// ==========================================

use crate::domain::action_log::{ActionType, EntityKind};
use crate::domain::customer::{Consignee, Customer, NewCustomer};
use crate::domain::types::PricingModel;
use crate::repository::action_log_repo::ActionLogRepository;
use crate::repository::error::{RepositoryError, RepositoryResult};
use crate::repository::sql_types::bool_col;
use rusqlite::{params, Connection, OptionalExtension, Result as SqliteResult, Row};
use std::sync::{Arc, Mutex};

const CUSTOMER_COLUMNS: &str =
    "id, code, name, blast_all, complete_only, numbering_range, pricing_model";

pub struct CustomerRepository {
    conn: Arc<Mutex<Connection>>,
}

impl CustomerRepository {
    pub fn new(conn: Arc<Mutex<Connection>>) -> Self {
        Self { conn }
    }

    fn get_conn(&self) -> RepositoryResult<std::sync::MutexGuard<Connection>> {
        self.conn
            .lock()
            .map_err(|e| RepositoryError::LockError(e.to_string()))
    }

    // ==========================================
    // Customer
    // ==========================================

    pub fn create_customer(&self, new: &NewCustomer, actor: &str) -> RepositoryResult<Customer> {
        let conn = self.get_conn()?;
        let tx = conn.unchecked_transaction()?;

        tx.execute(
            r#"
            INSERT INTO customer (code, name, blast_all, complete_only, numbering_range, pricing_model)
            VALUES (?1, ?2, ?3, ?4, ?5, ?6)
            "#,
            params![
                new.code,
                new.name,
                new.blast_all,
                new.complete_only,
                new.numbering_range,
                new.pricing_model.to_db_str(),
            ],
        )?;
        let customer = Customer {
            id: tx.last_insert_rowid(),
            code: new.code.clone(),
            name: new.name.clone(),
            blast_all: new.blast_all,
            complete_only: new.complete_only,
            numbering_range: new.numbering_range,
            pricing_model: new.pricing_model,
        };
        ActionLogRepository::record_tx(
            &tx,
            actor,
            ActionType::Create,
            EntityKind::Customer,
            customer.id,
            None,
            Some(&customer),
            None,
        )?;

        tx.commit()?;
        Ok(customer)
    }

    pub fn find_customer(&self, id: i64) -> RepositoryResult<Option<Customer>> {
        let conn = self.get_conn()?;
        Self::find_customer_tx(&conn, id)
    }

    pub fn find_customer_tx(conn: &Connection, id: i64) -> RepositoryResult<Option<Customer>> {
        let sql = format!("SELECT {} FROM customer WHERE id = ?1", CUSTOMER_COLUMNS);
        Ok(conn.query_row(&sql, params![id], map_customer).optional()?)
    }

    pub fn find_customer_by_code(&self, code: &str) -> RepositoryResult<Option<Customer>> {
        let conn = self.get_conn()?;
        let sql = format!("SELECT {} FROM customer WHERE code = ?1", CUSTOMER_COLUMNS);
        Ok(conn
            .query_row(&sql, params![code.trim().to_uppercase()], map_customer)
            .optional()?)
    }

    pub fn find_customer_for_shipment(&self, shipment_id: i64) -> RepositoryResult<Option<Customer>> {
        let conn = self.get_conn()?;
        Self::find_customer_for_shipment_tx(&conn, shipment_id)
    }

    /// Customer owning the given shipment
    pub fn find_customer_for_shipment_tx(
        conn: &Connection,
        shipment_id: i64,
    ) -> RepositoryResult<Option<Customer>> {
        let sql = format!(
            "SELECT {} FROM customer WHERE id = (SELECT customer_id FROM shipment WHERE id = ?1)",
            CUSTOMER_COLUMNS
        );
        Ok(conn.query_row(&sql, params![shipment_id], map_customer).optional()?)
    }

    pub fn list_customers(&self) -> RepositoryResult<Vec<Customer>> {
        let conn = self.get_conn()?;
        let sql = format!("SELECT {} FROM customer ORDER BY code", CUSTOMER_COLUMNS);
        let mut stmt = conn.prepare(&sql)?;
        let customers = stmt
            .query_map([], map_customer)?
            .collect::<SqliteResult<Vec<_>>>()?;
        Ok(customers)
    }

    // ==========================================
    // Consignee
    // ==========================================

    pub fn create_consignee(
        &self,
        name: &str,
        address: Option<&str>,
        actor: &str,
    ) -> RepositoryResult<Consignee> {
        let conn = self.get_conn()?;
        let tx = conn.unchecked_transaction()?;

        tx.execute(
            "INSERT INTO consignee (name, address) VALUES (?1, ?2)",
            params![name, address],
        )?;
        let consignee = Consignee {
            id: tx.last_insert_rowid(),
            name: name.to_string(),
            address: address.map(str::to_string),
        };
        ActionLogRepository::record_tx(
            &tx,
            actor,
            ActionType::Create,
            EntityKind::Consignee,
            consignee.id,
            None,
            Some(&consignee),
            None,
        )?;

        tx.commit()?;
        Ok(consignee)
    }

    pub fn find_consignee(&self, id: i64) -> RepositoryResult<Option<Consignee>> {
        let conn = self.get_conn()?;
        Self::find_consignee_tx(&conn, id)
    }

    pub fn find_consignee_tx(conn: &Connection, id: i64) -> RepositoryResult<Option<Consignee>> {
        Ok(conn
            .query_row(
                "SELECT id, name, address FROM consignee WHERE id = ?1",
                params![id],
                |row| {
                    Ok(Consignee {
                        id: row.get(0)?,
                        name: row.get(1)?,
                        address: row.get(2)?,
                    })
                },
            )
            .optional()?)
    }
}

fn map_customer(row: &Row) -> SqliteResult<Customer> {
    let pricing: String = row.get(6)?;
    Ok(Customer {
        id: row.get(0)?,
        code: row.get(1)?,
        name: row.get(2)?,
        blast_all: bool_col(row, 3)?,
        complete_only: bool_col(row, 4)?,
        numbering_range: row.get(5)?,
        pricing_model: PricingModel::from_db_str(&pricing),
    })
}
