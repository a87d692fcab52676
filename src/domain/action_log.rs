// ==========================================
// Bedna workflow - audit log domain model
// ==========================================
// Every write is attributable (actor + timestamp) and
// reconstructable (before/after snapshots in payload_json).
// ==========================================

use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};
use serde_json::Value as JsonValue;
use std::fmt;

// ==========================================
// ActionLog
// ==========================================
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ActionLog {
    pub action_id: String,       // UUID v4
    pub action_ts: NaiveDateTime,
    pub actor: String,
    pub action_type: ActionType,
    pub entity: EntityKind,
    pub entity_id: i64,
    pub payload_json: Option<JsonValue>, // {"before": .., "after": ..}
    pub detail: Option<String>,
}

impl ActionLog {
    /// Build a log entry stamped with a fresh id and the current time
    pub fn record(
        actor: &str,
        action_type: ActionType,
        entity: EntityKind,
        entity_id: i64,
        before: Option<JsonValue>,
        after: Option<JsonValue>,
    ) -> Self {
        Self {
            action_id: uuid::Uuid::new_v4().to_string(),
            action_ts: chrono::Utc::now().naive_utc(),
            actor: actor.to_string(),
            action_type,
            entity,
            entity_id,
            payload_json: Some(serde_json::json!({ "before": before, "after": after })),
            detail: None,
        }
    }

    pub fn with_detail(mut self, detail: impl Into<String>) -> Self {
        self.detail = Some(detail.into());
        self
    }

    /// Snapshot of the entity after this action, if recorded
    pub fn after(&self) -> Option<&JsonValue> {
        self.payload_json
            .as_ref()
            .and_then(|p| p.get("after"))
            .filter(|v| !v.is_null())
    }

    /// Snapshot of the entity before this action, if recorded
    pub fn before(&self) -> Option<&JsonValue> {
        self.payload_json
            .as_ref()
            .and_then(|p| p.get("before"))
            .filter(|v| !v.is_null())
    }
}

// ==========================================
// ActionType
// ==========================================
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ActionType {
    Create,
    Update,
    Delete,
    Dispatch,
    ReturnFromDispatch,
    Import,
}

impl ActionType {
    pub fn to_db_str(&self) -> &'static str {
        match self {
            ActionType::Create => "CREATE",
            ActionType::Update => "UPDATE",
            ActionType::Delete => "DELETE",
            ActionType::Dispatch => "DISPATCH",
            ActionType::ReturnFromDispatch => "RETURN_FROM_DISPATCH",
            ActionType::Import => "IMPORT",
        }
    }

    pub fn from_db_str(s: &str) -> Option<Self> {
        match s {
            "CREATE" => Some(ActionType::Create),
            "UPDATE" => Some(ActionType::Update),
            "DELETE" => Some(ActionType::Delete),
            "DISPATCH" => Some(ActionType::Dispatch),
            "RETURN_FROM_DISPATCH" => Some(ActionType::ReturnFromDispatch),
            "IMPORT" => Some(ActionType::Import),
            _ => None,
        }
    }
}

// ==========================================
// EntityKind - audited aggregates
// ==========================================
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum EntityKind {
    Customer,
    Consignee,
    Shipment,
    Specification,
    HeadType,
    Order,
    Crate,
    Price,
}

impl EntityKind {
    pub fn to_db_str(&self) -> &'static str {
        match self {
            EntityKind::Customer => "CUSTOMER",
            EntityKind::Consignee => "CONSIGNEE",
            EntityKind::Shipment => "SHIPMENT",
            EntityKind::Specification => "SPECIFICATION",
            EntityKind::HeadType => "HEAD_TYPE",
            EntityKind::Order => "ORDER",
            EntityKind::Crate => "CRATE",
            EntityKind::Price => "PRICE",
        }
    }

    pub fn from_db_str(s: &str) -> Option<Self> {
        match s.trim().to_uppercase().as_str() {
            "CUSTOMER" => Some(EntityKind::Customer),
            "CONSIGNEE" => Some(EntityKind::Consignee),
            "SHIPMENT" => Some(EntityKind::Shipment),
            "SPECIFICATION" => Some(EntityKind::Specification),
            "HEAD_TYPE" => Some(EntityKind::HeadType),
            "ORDER" => Some(EntityKind::Order),
            "CRATE" => Some(EntityKind::Crate),
            "PRICE" => Some(EntityKind::Price),
            _ => None,
        }
    }
}

impl fmt::Display for EntityKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.to_db_str())
    }
}
