// ==========================================
// Bedna workflow - order (zakazka)
// ==========================================
// A batch of one article under one inbound shipment.
// Invariants:
// - specification belongs to the inbound shipment's customer
// - no field edits once dispatched (only reversal)
// ==========================================

use crate::domain::types::{CrateState, Priority};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Order {
    pub id: i64,
    pub shipment_in_id: i64,
    pub shipment_out_id: Option<i64>, // set on dispatch
    pub article: String,
    pub diameter: Decimal,
    pub length: Decimal,
    pub specification_id: i64,
    pub head_type_id: Option<i64>,
    pub full_thread: bool,
    pub description: Option<String>,
    pub priority: Priority,
    pub consignee_id: Option<i64>, // pre-assigned destination
    pub dispatched: bool,
}

impl Order {
    /// Descriptive fields for a split-off order under the same inbound shipment
    pub fn descriptive_copy(&self) -> NewOrder {
        NewOrder {
            shipment_in_id: self.shipment_in_id,
            article: self.article.clone(),
            diameter: self.diameter,
            length: self.length,
            specification_id: self.specification_id,
            head_type_id: self.head_type_id,
            full_thread: self.full_thread,
            description: self.description.clone(),
            priority: self.priority,
            consignee_id: self.consignee_id,
        }
    }
}

/// Order before identity assignment
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NewOrder {
    pub shipment_in_id: i64,
    pub article: String,
    pub diameter: Decimal,
    pub length: Decimal,
    pub specification_id: i64,
    pub head_type_id: Option<i64>,
    pub full_thread: bool,
    pub description: Option<String>,
    pub priority: Priority,
    pub consignee_id: Option<i64>,
}

/// Partial edit of an order's descriptive fields
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct OrderUpdate {
    pub article: Option<String>,
    pub diameter: Option<Decimal>,
    pub length: Option<Decimal>,
    pub specification_id: Option<i64>,
    pub head_type_id: Option<Option<i64>>,
    pub full_thread: Option<bool>,
    pub description: Option<Option<String>>,
    pub priority: Option<Priority>,
    pub consignee_id: Option<Option<i64>>,
}

impl OrderUpdate {
    pub fn is_empty(&self) -> bool {
        self.article.is_none()
            && self.diameter.is_none()
            && self.length.is_none()
            && self.specification_id.is_none()
            && self.head_type_id.is_none()
            && self.full_thread.is_none()
            && self.description.is_none()
            && self.priority.is_none()
            && self.consignee_id.is_none()
    }

    pub fn apply_to(&self, order: &mut Order) {
        if let Some(v) = &self.article {
            order.article = v.clone();
        }
        if let Some(v) = self.diameter {
            order.diameter = v;
        }
        if let Some(v) = self.length {
            order.length = v;
        }
        if let Some(v) = self.specification_id {
            order.specification_id = v;
        }
        if let Some(v) = self.head_type_id {
            order.head_type_id = v;
        }
        if let Some(v) = self.full_thread {
            order.full_thread = v;
        }
        if let Some(v) = &self.description {
            order.description = v.clone();
        }
        if let Some(v) = self.priority {
            order.priority = v;
        }
        if let Some(v) = self.consignee_id {
            order.consignee_id = v;
        }
    }
}

// ==========================================
// OrderSummary - per-order aggregation
// ==========================================
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OrderSummary {
    pub order_id: i64,
    pub crate_count: usize,
    pub counts_by_state: BTreeMap<CrateState, usize>,
    pub total_net_weight: Decimal,
}
