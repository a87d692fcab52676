// ==========================================
// Bedna workflow - repository errors
// ==========================================
// thiserror enum; rusqlite failures are classified by message/code.
// ==========================================

use crate::engine::transition::TransitionError;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum RepositoryError {
    // ===== Numbering / concurrency =====
    #[error("numbering conflict in scope {scope}, retry the operation")]
    NumberingConflict { scope: String },

    #[error("database lock failed: {0}")]
    LockError(String),

    // ===== Database =====
    #[error("record not found: {entity} with id={id}")]
    NotFound { entity: String, id: String },

    #[error("database connection failed: {0}")]
    DatabaseConnectionError(String),

    #[error("database transaction failed: {0}")]
    DatabaseTransactionError(String),

    #[error("database query failed: {0}")]
    DatabaseQueryError(String),

    #[error("unique constraint violated: {0}")]
    UniqueConstraintViolation(String),

    #[error("foreign key constraint violated: {0}")]
    ForeignKeyViolation(String),

    #[error("database busy: {0}")]
    Busy(String),

    // ===== Workflow (re-checked under the write lock) =====
    #[error("crate {crate_number}: workflow change rejected ({} violation(s))", .violations.len())]
    TransitionRejected {
        crate_number: i64,
        violations: Vec<TransitionError>,
    },

    #[error("order {order_id} is dispatched")]
    OrderDispatched { order_id: i64 },

    // ===== Data =====
    #[error("validation failed: {0}")]
    ValidationError(String),

    #[error("bad stored value (field={field}): {message}")]
    FieldValueError { field: String, message: String },

    #[error("snapshot serialization failed: {0}")]
    SerializationError(String),

    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

impl RepositoryError {
    pub fn not_found(entity: &str, id: impl ToString) -> Self {
        RepositoryError::NotFound {
            entity: entity.to_string(),
            id: id.to_string(),
        }
    }

    /// Re-label a failure raised while issuing a number in `scope`.
    ///
    /// A unique violation or a busy database means another writer got
    /// there first; both become a retryable NumberingConflict.
    pub fn into_numbering_conflict(self, scope: &str) -> Self {
        match self {
            RepositoryError::UniqueConstraintViolation(_) | RepositoryError::Busy(_) => {
                RepositoryError::NumberingConflict {
                    scope: scope.to_string(),
                }
            }
            other => other,
        }
    }

    pub fn is_numbering_conflict(&self) -> bool {
        matches!(self, RepositoryError::NumberingConflict { .. })
    }
}

impl From<rusqlite::Error> for RepositoryError {
    fn from(err: rusqlite::Error) -> Self {
        match err {
            rusqlite::Error::SqliteFailure(code, msg)
                if matches!(
                    code.code,
                    rusqlite::ErrorCode::DatabaseBusy | rusqlite::ErrorCode::DatabaseLocked
                ) =>
            {
                RepositoryError::Busy(msg.unwrap_or_else(|| code.to_string()))
            }
            rusqlite::Error::SqliteFailure(_, Some(msg)) => {
                if msg.contains("UNIQUE") {
                    RepositoryError::UniqueConstraintViolation(msg)
                } else if msg.contains("FOREIGN KEY") {
                    RepositoryError::ForeignKeyViolation(msg)
                } else {
                    RepositoryError::DatabaseQueryError(msg)
                }
            }
            rusqlite::Error::QueryReturnedNoRows => RepositoryError::NotFound {
                entity: "Unknown".to_string(),
                id: "Unknown".to_string(),
            },
            _ => RepositoryError::DatabaseQueryError(err.to_string()),
        }
    }
}

impl From<serde_json::Error> for RepositoryError {
    fn from(err: serde_json::Error) -> Self {
        RepositoryError::SerializationError(err.to_string())
    }
}

pub type RepositoryResult<T> = Result<T, RepositoryError>;
