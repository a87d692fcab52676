// ==========================================
// Bedna workflow - audit history API
// ==========================================

use std::sync::Arc;

use crate::api::error::{ApiError, ApiResult};
use crate::domain::action_log::{ActionLog, EntityKind};
use crate::repository::ActionLogRepository;

pub struct HistoryApi {
    action_log_repo: Arc<ActionLogRepository>,
}

impl HistoryApi {
    pub fn new(action_log_repo: Arc<ActionLogRepository>) -> Self {
        Self { action_log_repo }
    }

    /// Every recorded action on one entity, oldest first
    pub fn history(&self, entity: EntityKind, entity_id: i64) -> ApiResult<Vec<ActionLog>> {
        Ok(self.action_log_repo.list_for_entity(entity, entity_id)?)
    }

    /// Same as `history`, entity given by its name (ORDER, crate, head_type, ...)
    pub fn history_by_name(&self, entity: &str, entity_id: i64) -> ApiResult<Vec<ActionLog>> {
        let kind = EntityKind::from_db_str(entity)
            .ok_or_else(|| ApiError::InvalidInput(format!("unknown entity kind: {}", entity)))?;
        self.history(kind, entity_id)
    }

    pub fn recent(&self, limit: u32) -> ApiResult<Vec<ActionLog>> {
        Ok(self.action_log_repo.list_recent(limit)?)
    }
}
