// ==========================================
// Bedna workflow - api error type
// ==========================================
// User-facing aggregate of every layer's errors. Every variant
// carries an explicit reason; rejected operations never leave
// partial state behind.
// ==========================================

use crate::engine::dispatch::DispatchError;
use crate::engine::transition::TransitionError;
use crate::importer::error::ImportError;
use crate::repository::error::RepositoryError;
use serde::{Deserialize, Serialize};
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ApiError {
    // ==========================================
    // Workflow rule violations
    // ==========================================
    #[error("transition rejected: {reason}")]
    TransitionRejected {
        reason: String,
        violations: Vec<ValidationViolation>,
    },

    #[error("dispatch rejected: {reason}")]
    DispatchRejected {
        reason: String,
        violations: Vec<ValidationViolation>,
    },

    #[error("order {order_id} is dispatched and cannot be edited")]
    OrderDispatched { order_id: i64 },

    // ==========================================
    // Business / input
    // ==========================================
    #[error("invalid input: {0}")]
    InvalidInput(String),

    #[error("not found: {0}")]
    NotFound(String),

    #[error("business rule violated: {0}")]
    BusinessRuleViolation(String),

    #[error("validation failed: {0}")]
    ValidationError(String),

    // ==========================================
    // Concurrency
    // ==========================================
    /// Another writer took the number first; the whole request can be retried
    #[error("numbering conflict: {0}")]
    NumberingConflict(String),

    // ==========================================
    // Import
    // ==========================================
    #[error("import failed: {0}")]
    ImportFailed(String),

    // ==========================================
    // Data access
    // ==========================================
    #[error("database error: {0}")]
    DatabaseError(String),

    #[error("database connection failed: {0}")]
    DatabaseConnectionError(String),

    #[error("database transaction failed: {0}")]
    DatabaseTransactionError(String),

    #[error("internal error: {0}")]
    InternalError(String),

    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

pub type ApiResult<T> = Result<T, ApiError>;

/// One rejected rule, addressable by the UI
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ValidationViolation {
    pub violation_type: String, // TRANSITION / DISPATCH
    pub entity_id: Option<i64>,
    pub reason: String,
}

impl ApiError {
    pub fn is_retryable(&self) -> bool {
        matches!(self, ApiError::NumberingConflict(_))
    }

    /// All transition violations of one request
    pub fn transition_rejected(errors: Vec<TransitionError>) -> Self {
        let violations: Vec<ValidationViolation> = errors
            .iter()
            .map(|e| ValidationViolation {
                violation_type: "TRANSITION".to_string(),
                entity_id: None,
                reason: e.to_string(),
            })
            .collect();
        ApiError::TransitionRejected {
            reason: join_reasons(&violations),
            violations,
        }
    }

    /// All dispatch precondition failures of one request
    pub fn dispatch_rejected(errors: Vec<DispatchError>) -> Self {
        let violations: Vec<ValidationViolation> = errors
            .iter()
            .map(|e| ValidationViolation {
                violation_type: "DISPATCH".to_string(),
                entity_id: dispatch_entity(e),
                reason: e.to_string(),
            })
            .collect();
        ApiError::DispatchRejected {
            reason: join_reasons(&violations),
            violations,
        }
    }
}

/// Config reads return boxed errors; they surface as internal errors
pub(crate) fn config_error(key: &str, err: Box<dyn std::error::Error>) -> ApiError {
    ApiError::InternalError(format!("config {}: {}", key, err))
}

fn join_reasons(violations: &[ValidationViolation]) -> String {
    violations
        .iter()
        .map(|v| v.reason.as_str())
        .collect::<Vec<_>>()
        .join("; ")
}

fn dispatch_entity(error: &DispatchError) -> Option<i64> {
    match error {
        DispatchError::NotOutbound { shipment_id } => Some(*shipment_id),
        DispatchError::CustomerMismatch { order_id, .. }
        | DispatchError::AlreadyDispatched { order_id }
        | DispatchError::ForeignCrate { order_id, .. }
        | DispatchError::CratesNotReady { order_id, .. }
        | DispatchError::IncompleteOrder { order_id, .. }
        | DispatchError::NothingToShip { order_id } => Some(*order_id),
    }
}

// ==========================================
// Conversions
// ==========================================
impl From<TransitionError> for ApiError {
    fn from(err: TransitionError) -> Self {
        ApiError::transition_rejected(vec![err])
    }
}

impl From<DispatchError> for ApiError {
    fn from(err: DispatchError) -> Self {
        ApiError::dispatch_rejected(vec![err])
    }
}

impl From<RepositoryError> for ApiError {
    fn from(err: RepositoryError) -> Self {
        match err {
            RepositoryError::NumberingConflict { .. } => ApiError::NumberingConflict(err.to_string()),
            RepositoryError::NotFound { entity, id } => {
                ApiError::NotFound(format!("{} (id={})", entity, id))
            }
            RepositoryError::LockError(msg) => {
                ApiError::DatabaseConnectionError(format!("could not acquire database lock: {}", msg))
            }
            RepositoryError::DatabaseConnectionError(msg) => ApiError::DatabaseConnectionError(msg),
            RepositoryError::DatabaseTransactionError(msg) => ApiError::DatabaseTransactionError(msg),
            RepositoryError::DatabaseQueryError(msg) | RepositoryError::Busy(msg) => {
                ApiError::DatabaseError(msg)
            }
            RepositoryError::UniqueConstraintViolation(msg) => {
                ApiError::BusinessRuleViolation(format!("duplicate value: {}", msg))
            }
            RepositoryError::ForeignKeyViolation(msg) => {
                ApiError::BusinessRuleViolation(format!("missing reference: {}", msg))
            }
            RepositoryError::TransitionRejected { violations, .. } => {
                ApiError::transition_rejected(violations)
            }
            RepositoryError::OrderDispatched { order_id } => ApiError::OrderDispatched { order_id },
            RepositoryError::ValidationError(msg) => ApiError::ValidationError(msg),
            RepositoryError::FieldValueError { field, message } => {
                ApiError::InternalError(format!("stored value of {} is invalid: {}", field, message))
            }
            RepositoryError::SerializationError(msg) => ApiError::InternalError(msg),
            RepositoryError::Other(err) => ApiError::Other(err),
        }
    }
}

impl From<ImportError> for ApiError {
    fn from(err: ImportError) -> Self {
        match err {
            ImportError::Repository(e) => ApiError::from(e),
            ImportError::Other(e) => ApiError::Other(e),
            ImportError::FileNotFound(path) => ApiError::NotFound(format!("file {}", path)),
            ImportError::UnknownCustomer(code) => ApiError::NotFound(format!("customer {}", code)),
            ImportError::InvalidShipment { .. } => ApiError::InvalidInput(err.to_string()),
            other => ApiError::ImportFailed(other.to_string()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_only_numbering_conflicts_are_retryable() {
        let conflict: ApiError = RepositoryError::NumberingConflict {
            scope: "CRATE/1".into(),
        }
        .into();
        assert!(conflict.is_retryable());

        let through_import: ApiError = ImportError::Repository(RepositoryError::NumberingConflict {
            scope: "CRATE/1".into(),
        })
        .into();
        assert!(through_import.is_retryable());

        let not_found: ApiError = RepositoryError::not_found("Order", 7).into();
        assert!(!not_found.is_retryable());
    }

    #[test]
    fn test_dispatch_rejection_names_every_order() {
        let err = ApiError::dispatch_rejected(vec![
            DispatchError::AlreadyDispatched { order_id: 3 },
            DispatchError::NothingToShip { order_id: 9 },
        ]);
        match err {
            ApiError::DispatchRejected { reason, violations } => {
                assert_eq!(violations.len(), 2);
                assert_eq!(violations[1].entity_id, Some(9));
                assert!(reason.contains("order 3") && reason.contains("order 9"));
            }
            other => panic!("unexpected {:?}", other),
        }
    }

    #[test]
    fn test_transition_error_is_user_facing() {
        let err: ApiError = TransitionError::EmptyOrder { order_id: 4 }.into();
        assert!(err.to_string().contains("order 4 has no crates"));
    }
}
