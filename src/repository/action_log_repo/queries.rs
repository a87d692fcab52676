use super::core::ActionLogRepository;
use crate::domain::action_log::{ActionLog, ActionType, EntityKind};
use crate::repository::error::RepositoryResult;
use crate::repository::sql_types::enum_col;
use chrono::NaiveDateTime;
use rusqlite::{params, OptionalExtension, Result as SqliteResult, Row};

const SELECT_COLUMNS: &str = r#"
    SELECT action_id, action_ts, actor, action_type,
           entity, entity_id, payload_json, detail
    FROM action_log
"#;

impl ActionLogRepository {
    pub fn find_by_id(&self, action_id: &str) -> RepositoryResult<Option<ActionLog>> {
        let conn = self.get_conn()?;
        let sql = format!("{} WHERE action_id = ?1", SELECT_COLUMNS);
        let log = conn
            .query_row(&sql, params![action_id], Self::map_row)
            .optional()?;
        Ok(log)
    }

    /// History of one entity, oldest first
    pub fn list_for_entity(&self, entity: EntityKind, entity_id: i64) -> RepositoryResult<Vec<ActionLog>> {
        let conn = self.get_conn()?;
        let sql = format!(
            "{} WHERE entity = ?1 AND entity_id = ?2 ORDER BY action_ts ASC, rowid ASC",
            SELECT_COLUMNS
        );
        let mut stmt = conn.prepare(&sql)?;
        let logs = stmt
            .query_map(params![entity.to_db_str(), entity_id], Self::map_row)?
            .collect::<SqliteResult<Vec<_>>>()?;
        Ok(logs)
    }

    /// Most recent entries across all entities
    pub fn list_recent(&self, limit: u32) -> RepositoryResult<Vec<ActionLog>> {
        let conn = self.get_conn()?;
        let sql = format!("{} ORDER BY action_ts DESC, rowid DESC LIMIT ?1", SELECT_COLUMNS);
        let mut stmt = conn.prepare(&sql)?;
        let logs = stmt
            .query_map(params![limit], Self::map_row)?
            .collect::<SqliteResult<Vec<_>>>()?;
        Ok(logs)
    }

    pub fn count_by_type(&self, action_type: ActionType) -> RepositoryResult<usize> {
        let conn = self.get_conn()?;
        let count: i64 = conn.query_row(
            "SELECT COUNT(*) FROM action_log WHERE action_type = ?1",
            params![action_type.to_db_str()],
            |row| row.get(0),
        )?;
        Ok(count as usize)
    }

    fn map_row(row: &Row) -> SqliteResult<ActionLog> {
        let ts: String = row.get(1)?;
        let action_ts = NaiveDateTime::parse_from_str(&ts, "%Y-%m-%d %H:%M:%S%.f").map_err(|e| {
            rusqlite::Error::FromSqlConversionFailure(1, rusqlite::types::Type::Text, Box::new(e))
        })?;
        let payload: Option<String> = row.get(6)?;

        Ok(ActionLog {
            action_id: row.get(0)?,
            action_ts,
            actor: row.get(2)?,
            action_type: enum_col(row, 3, ActionType::from_db_str)?,
            entity: enum_col(row, 4, EntityKind::from_db_str)?,
            entity_id: row.get(5)?,
            payload_json: payload.and_then(|s| serde_json::from_str(&s).ok()),
            detail: row.get(7)?,
        })
    }
}
