// ==========================================
// Bedna workflow - reference catalog
// ==========================================
// Specification (predpis), head type and price rows.
// ==========================================

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// Name of the synthetic placeholder used by legacy imports
pub const UNKNOWN_SPECIFICATION_NAME: &str = "UNKNOWN";

// ==========================================
// Specification (predpis)
// ==========================================
// Customer-owned; inactive specifications cannot be assigned to new orders.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Specification {
    pub id: i64,
    pub customer_id: i64,
    pub name: String,
    pub group: i32, // treatment group, used for batching
    pub active: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewSpecification {
    pub customer_id: i64,
    pub name: String,
    pub group: i32,
    pub active: bool,
}

// ==========================================
// Head type (typ hlavy)
// ==========================================
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HeadType {
    pub id: i64,
    pub name: String,
    pub description: Option<String>,
}

// ==========================================
// Price (cena)
// ==========================================
// Length bracket is half-open: length_min <= length < length_max
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Price {
    pub id: i64,
    pub customer_id: i64,
    pub length_min: Decimal,
    pub length_max: Decimal,
    pub rate_per_kg: Decimal,
    pub specification_ids: Vec<i64>,
}

impl Price {
    /// Whether this row prices the given specification and length
    pub fn matches(&self, specification_id: i64, length: Decimal) -> bool {
        self.specification_ids.contains(&specification_id)
            && self.length_min <= length
            && length < self.length_max
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewPrice {
    pub customer_id: i64,
    pub length_min: Decimal,
    pub length_max: Decimal,
    pub rate_per_kg: Decimal,
    pub specification_ids: Vec<i64>,
}
