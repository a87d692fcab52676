// ==========================================
// Bedna workflow - crate (bedna)
// ==========================================
// The physical unit tracked through the workflow.
// crate_number is assigned once at creation and never changes.
// ==========================================

use crate::domain::types::{BlastState, CrateState, StraightenState};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Crate {
    pub id: i64,
    pub order_id: i64,
    pub crate_number: i64,

    // ===== Physical data =====
    pub net_weight: Decimal,
    pub tare_weight: Decimal,
    pub quantity: Option<i64>,
    pub material: Option<String>,
    pub batch: Option<String>,                 // customer's batch / charge code
    pub customer_container_no: Option<String>, // customer's own container number
    pub supplier: Option<String>,
    pub notes: Option<String>,

    // ===== Workflow fields =====
    pub state: CrateState,
    pub blast: BlastState,
    pub straighten: StraightenState,
    pub phosphate: bool,
}

impl Crate {
    pub fn gross_weight(&self) -> Decimal {
        self.net_weight + self.tare_weight
    }
}

// ==========================================
// NewCrate - construct phase
// ==========================================
// Descriptive data only; identity (crate_number) is assigned by
// the numbering service when the crate is persisted.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NewCrate {
    pub net_weight: Decimal,
    pub tare_weight: Decimal,
    pub quantity: Option<i64>,
    pub material: Option<String>,
    pub batch: Option<String>,
    pub customer_container_no: Option<String>,
    pub supplier: Option<String>,
    pub notes: Option<String>,
    pub blast: Option<BlastState>, // None -> customer default
    pub phosphate: bool,
}

impl NewCrate {
    pub fn with_weights(net_weight: Decimal, tare_weight: Decimal) -> Self {
        Self {
            net_weight,
            tare_weight,
            quantity: None,
            material: None,
            batch: None,
            customer_container_no: None,
            supplier: None,
            notes: None,
            blast: None,
            phosphate: false,
        }
    }

    /// Weight and quantity sanity checks; returns user-facing reasons
    pub fn validate(&self) -> Result<(), Vec<String>> {
        let mut reasons = Vec::new();
        if self.net_weight <= Decimal::ZERO {
            reasons.push(format!("net weight must be positive, got {}", self.net_weight));
        }
        if self.tare_weight < Decimal::ZERO {
            reasons.push(format!("tare weight must not be negative, got {}", self.tare_weight));
        }
        if let Some(q) = self.quantity {
            if q <= 0 {
                reasons.push(format!("quantity must be positive, got {}", q));
            }
        }
        if reasons.is_empty() {
            Ok(())
        } else {
            Err(reasons)
        }
    }

    /// Identity phase: bind the assigned number and resolve defaults
    pub fn into_crate(self, id: i64, order_id: i64, crate_number: i64, default_blast: BlastState) -> Crate {
        Crate {
            id,
            order_id,
            crate_number,
            net_weight: self.net_weight,
            tare_weight: self.tare_weight,
            quantity: self.quantity,
            material: self.material,
            batch: self.batch,
            customer_container_no: self.customer_container_no,
            supplier: self.supplier,
            notes: self.notes,
            state: CrateState::Received,
            blast: self.blast.unwrap_or(default_blast),
            straighten: StraightenState::Unspecified,
            phosphate: self.phosphate,
        }
    }
}

// ==========================================
// CrateUpdate - requested field changes
// ==========================================
// Workflow fields are validated by the transition engine.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CrateUpdate {
    pub state: Option<CrateState>,
    pub blast: Option<BlastState>,
    pub straighten: Option<StraightenState>,
    pub phosphate: Option<bool>,
    pub net_weight: Option<Decimal>,
    pub tare_weight: Option<Decimal>,
    pub quantity: Option<Option<i64>>,
    pub notes: Option<Option<String>>,
}

impl CrateUpdate {
    pub fn state(state: CrateState) -> Self {
        Self {
            state: Some(state),
            ..Default::default()
        }
    }

    pub fn apply_to(&self, target: &mut Crate) {
        if let Some(v) = self.state {
            target.state = v;
        }
        if let Some(v) = self.blast {
            target.blast = v;
        }
        if let Some(v) = self.straighten {
            target.straighten = v;
        }
        if let Some(v) = self.phosphate {
            target.phosphate = v;
        }
        if let Some(v) = self.net_weight {
            target.net_weight = v;
        }
        if let Some(v) = self.tare_weight {
            target.tare_weight = v;
        }
        if let Some(v) = self.quantity {
            target.quantity = v;
        }
        if let Some(v) = &self.notes {
            target.notes = v.clone();
        }
    }
}
