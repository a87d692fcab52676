use crate::domain::action_log::{ActionLog, ActionType, EntityKind};
use crate::repository::error::{RepositoryError, RepositoryResult};
use crate::repository::sql_types::snapshot;
use rusqlite::{params, Connection};
use serde::Serialize;
use std::sync::{Arc, Mutex};

// ==========================================
// ActionLogRepository
// ==========================================
pub struct ActionLogRepository {
    conn: Arc<Mutex<Connection>>,
}

impl ActionLogRepository {
    pub fn new(conn: Arc<Mutex<Connection>>) -> Self {
        Self { conn }
    }

    pub(super) fn get_conn(&self) -> RepositoryResult<std::sync::MutexGuard<Connection>> {
        self.conn
            .lock()
            .map_err(|e| RepositoryError::LockError(e.to_string()))
    }

    /// Insert one log entry on its own
    pub fn insert(&self, log: &ActionLog) -> RepositoryResult<String> {
        let conn = self.get_conn()?;
        Self::insert_tx(&conn, log)?;
        Ok(log.action_id.clone())
    }

    /// Insert inside an open transaction (Transaction derefs to Connection)
    pub fn insert_tx(conn: &Connection, log: &ActionLog) -> RepositoryResult<()> {
        conn.execute(
            r#"
            INSERT INTO action_log (
                action_id, action_ts, actor, action_type,
                entity, entity_id, payload_json, detail
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)
            "#,
            params![
                log.action_id,
                log.action_ts.format("%Y-%m-%d %H:%M:%S%.3f").to_string(),
                log.actor,
                log.action_type.to_db_str(),
                log.entity.to_db_str(),
                log.entity_id,
                log.payload_json.as_ref().map(|v| v.to_string()),
                log.detail,
            ],
        )?;
        Ok(())
    }

    /// Snapshot before/after and write the entry in one step
    #[allow(clippy::too_many_arguments)]
    pub fn record_tx<T: Serialize>(
        conn: &Connection,
        actor: &str,
        action_type: ActionType,
        entity: EntityKind,
        entity_id: i64,
        before: Option<&T>,
        after: Option<&T>,
        detail: Option<String>,
    ) -> RepositoryResult<()> {
        let before = before.map(snapshot).transpose()?;
        let after = after.map(snapshot).transpose()?;
        let mut log = ActionLog::record(actor, action_type, entity, entity_id, before, after);
        log.detail = detail;
        Self::insert_tx(conn, &log)
    }
}
