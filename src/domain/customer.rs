// ==========================================
// Bedna workflow - customer domain model
// ==========================================
// Customer owns specifications and prices; consignee is an
// independent destination entity for outbound shipments.
// ==========================================

use crate::domain::types::PricingModel;
use serde::{Deserialize, Serialize};

// ==========================================
// Customer (zakaznik)
// ==========================================
// Invariant: numbering_range is unique across customers, so crate
// numbers issued from different ranges never collide.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Customer {
    pub id: i64,
    pub code: String,           // short code, unique (EUR, SPX, ...)
    pub name: String,
    pub blast_all: bool,        // every new crate starts DIRTY
    pub complete_only: bool,    // dispatch only complete orders
    pub numbering_range: i64,   // crate number base, e.g. 100000
    pub pricing_model: PricingModel,
}

/// Customer before identity assignment
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewCustomer {
    pub code: String,
    pub name: String,
    pub blast_all: bool,
    pub complete_only: bool,
    pub numbering_range: i64,
    pub pricing_model: PricingModel,
}

impl NewCustomer {
    pub fn new(code: &str, name: &str, numbering_range: i64) -> Self {
        Self {
            code: code.trim().to_uppercase(),
            name: name.to_string(),
            blast_all: false,
            complete_only: false,
            numbering_range,
            pricing_model: PricingModel::None,
        }
    }
}

// ==========================================
// Consignee (prijemce)
// ==========================================
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Consignee {
    pub id: i64,
    pub name: String,
    pub address: Option<String>,
}
