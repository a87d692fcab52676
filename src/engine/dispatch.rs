// ==========================================
// Bedna workflow - split-on-dispatch planner
// ==========================================
// Pure planning: validates preconditions and partitions an order's
// crates into "to ship" and "remaining". The repository applies the
// resulting plan inside one transaction.
//
// - remaining empty  -> the order itself is dispatched (FullOrder)
// - remaining exists -> a copy of the order takes the shipped crates (Split)
// ==========================================

use crate::domain::crates::Crate;
use crate::domain::customer::Customer;
use crate::domain::order::{NewOrder, Order};
use crate::domain::shipment::Shipment;
use crate::domain::types::{CrateState, ShipmentDirection};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use thiserror::Error;

// ==========================================
// DispatchError - precondition failures
// ==========================================
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum DispatchError {
    #[error("shipment {shipment_id} is not an outbound shipment")]
    NotOutbound { shipment_id: i64 },

    #[error("order {order_id}: outbound shipment {shipment_id} belongs to another customer")]
    CustomerMismatch { order_id: i64, shipment_id: i64 },

    #[error("order {order_id} is already dispatched")]
    AlreadyDispatched { order_id: i64 },

    #[error("order {order_id}: crate {crate_id} does not belong to this order")]
    ForeignCrate { order_id: i64, crate_id: i64 },

    #[error("order {order_id}: crates not ready to ship: {crate_numbers:?}")]
    CratesNotReady { order_id: i64, crate_numbers: Vec<i64> },

    #[error("order {order_id}: customer ships complete orders only, {remaining} crate(s) would stay behind")]
    IncompleteOrder { order_id: i64, remaining: usize },

    #[error("order {order_id} has no crate ready to ship")]
    NothingToShip { order_id: i64 },
}

// ==========================================
// Selection and plans
// ==========================================
#[derive(Debug, Clone, Copy)]
pub enum DispatchSelection<'a> {
    WholeOrder,         // every READY_TO_SHIP crate of the order
    Crates(&'a [i64]), // explicit crate ids
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum DispatchPlan {
    FullOrder {
        order_id: i64,
        shipment_out_id: i64,
        crate_ids: Vec<i64>,
    },
    Split {
        source_order_id: i64,
        shipment_out_id: i64,
        new_order: NewOrder,
        crate_ids: Vec<i64>,
    },
}

impl DispatchPlan {
    pub fn crate_ids(&self) -> &[i64] {
        match self {
            DispatchPlan::FullOrder { crate_ids, .. } | DispatchPlan::Split { crate_ids, .. } => {
                crate_ids
            }
        }
    }

    pub fn is_split(&self) -> bool {
        matches!(self, DispatchPlan::Split { .. })
    }

    pub fn source_order_id(&self) -> i64 {
        match self {
            DispatchPlan::FullOrder { order_id, .. } => *order_id,
            DispatchPlan::Split { source_order_id, .. } => *source_order_id,
        }
    }
}

/// Reversal of a dispatched order: all crates back to READY_TO_SHIP
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReturnPlan {
    pub order_id: i64,
    pub crate_ids: Vec<i64>,
}

// ==========================================
// DispatchPlanner
// ==========================================
pub struct DispatchPlanner;

impl DispatchPlanner {
    /// Validate and partition one order.
    ///
    /// # Arguments
    /// - `customer`: owner of the order's inbound shipment
    /// - `crates`: every crate currently belonging to the order
    pub fn plan(
        customer: &Customer,
        order: &Order,
        crates: &[Crate],
        outbound: &Shipment,
        selection: DispatchSelection<'_>,
    ) -> Result<DispatchPlan, DispatchError> {
        if outbound.direction != ShipmentDirection::Outbound {
            return Err(DispatchError::NotOutbound {
                shipment_id: outbound.id,
            });
        }
        if outbound.customer_id != customer.id {
            return Err(DispatchError::CustomerMismatch {
                order_id: order.id,
                shipment_id: outbound.id,
            });
        }
        if order.dispatched {
            return Err(DispatchError::AlreadyDispatched { order_id: order.id });
        }

        let to_ship: Vec<&Crate> = match selection {
            DispatchSelection::WholeOrder => crates
                .iter()
                .filter(|c| c.state == CrateState::ReadyToShip)
                .collect(),
            DispatchSelection::Crates(ids) => {
                let mut selected = Vec::with_capacity(ids.len());
                for id in ids {
                    let found = crates.iter().find(|c| c.id == *id).ok_or(
                        DispatchError::ForeignCrate {
                            order_id: order.id,
                            crate_id: *id,
                        },
                    )?;
                    selected.push(found);
                }
                let not_ready: Vec<i64> = selected
                    .iter()
                    .filter(|c| c.state != CrateState::ReadyToShip)
                    .map(|c| c.crate_number)
                    .collect();
                if !not_ready.is_empty() {
                    return Err(DispatchError::CratesNotReady {
                        order_id: order.id,
                        crate_numbers: not_ready,
                    });
                }
                selected
            }
        };

        if to_ship.is_empty() {
            return Err(DispatchError::NothingToShip { order_id: order.id });
        }

        let shipped: HashSet<i64> = to_ship.iter().map(|c| c.id).collect();
        let remaining = crates.iter().filter(|c| !shipped.contains(&c.id)).count();

        if customer.complete_only && remaining > 0 {
            return Err(DispatchError::IncompleteOrder {
                order_id: order.id,
                remaining,
            });
        }

        let crate_ids: Vec<i64> = to_ship.iter().map(|c| c.id).collect();
        if remaining == 0 {
            Ok(DispatchPlan::FullOrder {
                order_id: order.id,
                shipment_out_id: outbound.id,
                crate_ids,
            })
        } else {
            Ok(DispatchPlan::Split {
                source_order_id: order.id,
                shipment_out_id: outbound.id,
                new_order: order.descriptive_copy(),
                crate_ids,
            })
        }
    }

    /// None when the order is not dispatched (reversal is a no-op)
    pub fn plan_return(order: &Order, crates: &[Crate]) -> Option<ReturnPlan> {
        if !order.dispatched {
            return None;
        }
        Some(ReturnPlan {
            order_id: order.id,
            crate_ids: crates
                .iter()
                .filter(|c| c.order_id == order.id)
                .map(|c| c.id)
                .collect(),
        })
    }
}
