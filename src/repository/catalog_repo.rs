// ==========================================
// Bedna workflow - catalog repository
// ==========================================
// Specifications, head types and prices (with their linked
// specifications in price_specification).
// ==========================================

use crate::domain::action_log::{ActionType, EntityKind};
use crate::domain::catalog::{
    HeadType, NewPrice, NewSpecification, Price, Specification, UNKNOWN_SPECIFICATION_NAME,
};
use crate::repository::action_log_repo::ActionLogRepository;
use crate::repository::error::{RepositoryError, RepositoryResult};
use crate::repository::sql_types::{bool_col, decimal_col};
use rusqlite::{params, Connection, OptionalExtension, Result as SqliteResult, Row};
use std::sync::{Arc, Mutex};
use tracing::warn;

const SPEC_COLUMNS: &str = "id, customer_id, name, treatment_group, active";

pub struct CatalogRepository {
    conn: Arc<Mutex<Connection>>,
}

impl CatalogRepository {
    pub fn new(conn: Arc<Mutex<Connection>>) -> Self {
        Self { conn }
    }

    fn get_conn(&self) -> RepositoryResult<std::sync::MutexGuard<Connection>> {
        self.conn
            .lock()
            .map_err(|e| RepositoryError::LockError(e.to_string()))
    }

    // ==========================================
    // Specification
    // ==========================================

    pub fn create_specification(
        &self,
        new: &NewSpecification,
        actor: &str,
    ) -> RepositoryResult<Specification> {
        let conn = self.get_conn()?;
        let tx = conn.unchecked_transaction()?;
        let spec = Self::create_specification_tx(&tx, new, actor)?;
        tx.commit()?;
        Ok(spec)
    }

    pub fn create_specification_tx(
        conn: &Connection,
        new: &NewSpecification,
        actor: &str,
    ) -> RepositoryResult<Specification> {
        conn.execute(
            "INSERT INTO specification (customer_id, name, treatment_group, active) VALUES (?1, ?2, ?3, ?4)",
            params![new.customer_id, new.name.trim(), new.group, new.active],
        )?;
        let spec = Specification {
            id: conn.last_insert_rowid(),
            customer_id: new.customer_id,
            name: new.name.trim().to_string(),
            group: new.group,
            active: new.active,
        };
        ActionLogRepository::record_tx(
            conn,
            actor,
            ActionType::Create,
            EntityKind::Specification,
            spec.id,
            None,
            Some(&spec),
            None,
        )?;
        Ok(spec)
    }

    pub fn find_specification(&self, id: i64) -> RepositoryResult<Option<Specification>> {
        let conn = self.get_conn()?;
        Self::find_specification_tx(&conn, id)
    }

    pub fn find_specification_tx(conn: &Connection, id: i64) -> RepositoryResult<Option<Specification>> {
        let sql = format!("SELECT {} FROM specification WHERE id = ?1", SPEC_COLUMNS);
        Ok(conn.query_row(&sql, params![id], map_specification).optional()?)
    }

    /// Case-insensitive lookup within one customer
    pub fn find_specification_by_name(
        &self,
        customer_id: i64,
        name: &str,
    ) -> RepositoryResult<Option<Specification>> {
        let conn = self.get_conn()?;
        Self::find_specification_by_name_tx(&conn, customer_id, name)
    }

    pub fn find_specification_by_name_tx(
        conn: &Connection,
        customer_id: i64,
        name: &str,
    ) -> RepositoryResult<Option<Specification>> {
        let sql = format!(
            "SELECT {} FROM specification WHERE customer_id = ?1 AND UPPER(name) = UPPER(?2)",
            SPEC_COLUMNS
        );
        Ok(conn
            .query_row(&sql, params![customer_id, name.trim()], map_specification)
            .optional()?)
    }

    pub fn list_specifications(&self, customer_id: i64) -> RepositoryResult<Vec<Specification>> {
        let conn = self.get_conn()?;
        let sql = format!(
            "SELECT {} FROM specification WHERE customer_id = ?1 ORDER BY treatment_group, name",
            SPEC_COLUMNS
        );
        let mut stmt = conn.prepare(&sql)?;
        let specs = stmt
            .query_map(params![customer_id], map_specification)?
            .collect::<SqliteResult<Vec<_>>>()?;
        Ok(specs)
    }

    pub fn set_specification_active(
        &self,
        id: i64,
        active: bool,
        actor: &str,
    ) -> RepositoryResult<Specification> {
        let conn = self.get_conn()?;
        let tx = conn.unchecked_transaction()?;

        let before = Self::find_specification_tx(&tx, id)?
            .ok_or_else(|| RepositoryError::not_found("Specification", id))?;
        tx.execute(
            "UPDATE specification SET active = ?1 WHERE id = ?2",
            params![active, id],
        )?;
        let after = Specification {
            active,
            ..before.clone()
        };
        ActionLogRepository::record_tx(
            &tx,
            actor,
            ActionType::Update,
            EntityKind::Specification,
            id,
            Some(&before),
            Some(&after),
            None,
        )?;

        tx.commit()?;
        Ok(after)
    }

    /// Inactive placeholder specification for legacy imports, created on demand
    pub fn ensure_unknown_specification_tx(
        conn: &Connection,
        customer_id: i64,
        actor: &str,
    ) -> RepositoryResult<Specification> {
        if let Some(existing) =
            Self::find_specification_by_name_tx(conn, customer_id, UNKNOWN_SPECIFICATION_NAME)?
        {
            return Ok(existing);
        }
        warn!(customer_id, "creating placeholder specification for legacy import");
        Self::create_specification_tx(
            conn,
            &NewSpecification {
                customer_id,
                name: UNKNOWN_SPECIFICATION_NAME.to_string(),
                group: 0,
                active: false,
            },
            actor,
        )
    }

    // ==========================================
    // Head type
    // ==========================================

    pub fn create_head_type(
        &self,
        name: &str,
        description: Option<&str>,
        actor: &str,
    ) -> RepositoryResult<HeadType> {
        let conn = self.get_conn()?;
        let tx = conn.unchecked_transaction()?;

        tx.execute(
            "INSERT INTO head_type (name, description) VALUES (?1, ?2)",
            params![name.trim(), description],
        )?;
        let head_type = HeadType {
            id: tx.last_insert_rowid(),
            name: name.trim().to_string(),
            description: description.map(str::to_string),
        };
        ActionLogRepository::record_tx(
            &tx,
            actor,
            ActionType::Create,
            EntityKind::HeadType,
            head_type.id,
            None,
            Some(&head_type),
            None,
        )?;

        tx.commit()?;
        Ok(head_type)
    }

    pub fn find_head_type_tx(conn: &Connection, id: i64) -> RepositoryResult<Option<HeadType>> {
        Ok(conn
            .query_row(
                "SELECT id, name, description FROM head_type WHERE id = ?1",
                params![id],
                map_head_type,
            )
            .optional()?)
    }

    pub fn find_head_type(&self, id: i64) -> RepositoryResult<Option<HeadType>> {
        let conn = self.get_conn()?;
        Self::find_head_type_tx(&conn, id)
    }

    pub fn find_head_type_by_name(&self, name: &str) -> RepositoryResult<Option<HeadType>> {
        let conn = self.get_conn()?;
        Self::find_head_type_by_name_tx(&conn, name)
    }

    pub fn find_head_type_by_name_tx(conn: &Connection, name: &str) -> RepositoryResult<Option<HeadType>> {
        Ok(conn
            .query_row(
                "SELECT id, name, description FROM head_type WHERE UPPER(name) = UPPER(?1)",
                params![name.trim()],
                map_head_type,
            )
            .optional()?)
    }

    // ==========================================
    // Price
    // ==========================================

    pub fn create_price(&self, new: &NewPrice, actor: &str) -> RepositoryResult<Price> {
        if new.length_min >= new.length_max {
            return Err(RepositoryError::ValidationError(format!(
                "empty length bracket [{}, {})",
                new.length_min, new.length_max
            )));
        }

        let conn = self.get_conn()?;
        let tx = conn.unchecked_transaction()?;

        tx.execute(
            "INSERT INTO price (customer_id, length_min, length_max, rate_per_kg) VALUES (?1, ?2, ?3, ?4)",
            params![
                new.customer_id,
                new.length_min.to_string(),
                new.length_max.to_string(),
                new.rate_per_kg.to_string(),
            ],
        )?;
        let price_id = tx.last_insert_rowid();
        for spec_id in &new.specification_ids {
            tx.execute(
                "INSERT INTO price_specification (price_id, specification_id) VALUES (?1, ?2)",
                params![price_id, spec_id],
            )?;
        }

        let price = Price {
            id: price_id,
            customer_id: new.customer_id,
            length_min: new.length_min,
            length_max: new.length_max,
            rate_per_kg: new.rate_per_kg,
            specification_ids: new.specification_ids.clone(),
        };
        ActionLogRepository::record_tx(
            &tx,
            actor,
            ActionType::Create,
            EntityKind::Price,
            price.id,
            None,
            Some(&price),
            None,
        )?;

        tx.commit()?;
        Ok(price)
    }

    /// All price rows of a customer with their linked specifications
    pub fn list_prices(&self, customer_id: i64) -> RepositoryResult<Vec<Price>> {
        let conn = self.get_conn()?;
        Self::list_prices_tx(&conn, customer_id)
    }

    pub fn list_prices_tx(conn: &Connection, customer_id: i64) -> RepositoryResult<Vec<Price>> {
        let mut stmt = conn.prepare(
            "SELECT id, customer_id, length_min, length_max, rate_per_kg FROM price WHERE customer_id = ?1 ORDER BY length_min",
        )?;
        let mut prices = stmt
            .query_map(params![customer_id], |row| {
                Ok(Price {
                    id: row.get(0)?,
                    customer_id: row.get(1)?,
                    length_min: decimal_col(row, 2)?,
                    length_max: decimal_col(row, 3)?,
                    rate_per_kg: decimal_col(row, 4)?,
                    specification_ids: Vec::new(),
                })
            })?
            .collect::<SqliteResult<Vec<_>>>()?;

        let mut link_stmt = conn.prepare(
            "SELECT specification_id FROM price_specification WHERE price_id = ?1 ORDER BY specification_id",
        )?;
        for price in &mut prices {
            price.specification_ids = link_stmt
                .query_map(params![price.id], |row| row.get(0))?
                .collect::<SqliteResult<Vec<i64>>>()?;
        }
        Ok(prices)
    }
}

fn map_specification(row: &Row) -> SqliteResult<Specification> {
    Ok(Specification {
        id: row.get(0)?,
        customer_id: row.get(1)?,
        name: row.get(2)?,
        group: row.get(3)?,
        active: bool_col(row, 4)?,
    })
}

fn map_head_type(row: &Row) -> SqliteResult<HeadType> {
    Ok(HeadType {
        id: row.get(0)?,
        name: row.get(1)?,
        description: row.get(2)?,
    })
}
