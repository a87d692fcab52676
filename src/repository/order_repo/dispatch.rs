use super::core::OrderRepository;
use crate::db::begin_immediate;
use crate::domain::action_log::ActionType;
use crate::domain::order::Order;
use crate::domain::types::CrateState;
use crate::engine::dispatch::{DispatchPlan, ReturnPlan};
use crate::repository::error::{RepositoryError, RepositoryResult};
use rusqlite::Connection;
use serde::{Deserialize, Serialize};
use tracing::info;

/// Result of applying one dispatch plan
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DispatchOutcome {
    pub source_order_id: i64,
    pub shipped_order_id: i64, // == source_order_id unless split
    pub shipment_out_id: i64,
    pub crate_ids: Vec<i64>,
    pub split: bool,
}

impl OrderRepository {
    /// Apply validated plans; all or nothing
    pub fn apply_dispatch(&self, plans: &[DispatchPlan], actor: &str) -> RepositoryResult<Vec<DispatchOutcome>> {
        let conn = self.get_conn()?;
        let tx = begin_immediate(&conn)?;

        let mut outcomes = Vec::with_capacity(plans.len());
        for plan in plans {
            outcomes.push(Self::apply_dispatch_tx(&tx, plan, actor)?);
        }

        tx.commit()?;
        for o in &outcomes {
            info!(
                source_order_id = o.source_order_id,
                shipped_order_id = o.shipped_order_id,
                shipment_out_id = o.shipment_out_id,
                crates = o.crate_ids.len(),
                split = o.split,
                "order dispatched"
            );
        }
        Ok(outcomes)
    }

    fn apply_dispatch_tx(conn: &Connection, plan: &DispatchPlan, actor: &str) -> RepositoryResult<DispatchOutcome> {
        Self::check_unchanged_tx(conn, plan)?;
        match plan {
            DispatchPlan::FullOrder {
                order_id,
                shipment_out_id,
                crate_ids,
            } => {
                let before = Self::find_order_tx(conn, *order_id)?
                    .ok_or_else(|| RepositoryError::not_found("Order", order_id))?;
                let after = Order {
                    shipment_out_id: Some(*shipment_out_id),
                    dispatched: true,
                    ..before.clone()
                };
                Self::write_order_tx(conn, &before, &after, actor, ActionType::Dispatch)?;
                Self::move_crates_tx(conn, crate_ids, *order_id, CrateState::Shipped, actor, ActionType::Dispatch)?;

                Ok(DispatchOutcome {
                    source_order_id: *order_id,
                    shipped_order_id: *order_id,
                    shipment_out_id: *shipment_out_id,
                    crate_ids: crate_ids.clone(),
                    split: false,
                })
            }
            DispatchPlan::Split {
                source_order_id,
                shipment_out_id,
                new_order,
                crate_ids,
            } => {
                let created = Self::create_order_tx(conn, new_order, actor, ActionType::Dispatch)?;
                let shipped = Order {
                    shipment_out_id: Some(*shipment_out_id),
                    dispatched: true,
                    ..created.clone()
                };
                Self::write_order_tx(conn, &created, &shipped, actor, ActionType::Dispatch)?;
                Self::move_crates_tx(conn, crate_ids, shipped.id, CrateState::Shipped, actor, ActionType::Dispatch)?;

                Ok(DispatchOutcome {
                    source_order_id: *source_order_id,
                    shipped_order_id: shipped.id,
                    shipment_out_id: *shipment_out_id,
                    crate_ids: crate_ids.clone(),
                    split: true,
                })
            }
        }
    }

    /// Plans are computed outside the transaction; reject one whose
    /// order or crates moved on in between
    fn check_unchanged_tx(conn: &Connection, plan: &DispatchPlan) -> RepositoryResult<()> {
        let order_id = plan.source_order_id();
        let order = Self::find_order_tx(conn, order_id)?
            .ok_or_else(|| RepositoryError::not_found("Order", order_id))?;
        if order.dispatched {
            return Err(RepositoryError::ValidationError(format!(
                "order {} was dispatched concurrently",
                order_id
            )));
        }
        for crate_id in plan.crate_ids() {
            let current = Self::find_crate_tx(conn, *crate_id)?
                .ok_or_else(|| RepositoryError::not_found("Crate", crate_id))?;
            if current.order_id != order_id || current.state != CrateState::ReadyToShip {
                return Err(RepositoryError::ValidationError(format!(
                    "crate {} changed since the dispatch was planned",
                    current.crate_number
                )));
            }
        }
        Ok(())
    }

    /// Re-parent crates and set their state
    fn move_crates_tx(
        conn: &Connection,
        crate_ids: &[i64],
        order_id: i64,
        state: CrateState,
        actor: &str,
        action_type: ActionType,
    ) -> RepositoryResult<()> {
        for crate_id in crate_ids {
            let before = Self::find_crate_tx(conn, *crate_id)?
                .ok_or_else(|| RepositoryError::not_found("Crate", crate_id))?;
            let mut after = before.clone();
            after.order_id = order_id;
            after.state = state;
            Self::write_crate_tx(conn, &before, &after, actor, action_type)?;
        }
        Ok(())
    }

    /// Undo a dispatch: order back to undispatched, crates to READY_TO_SHIP
    pub fn apply_return(&self, plan: &ReturnPlan, actor: &str) -> RepositoryResult<Order> {
        let conn = self.get_conn()?;
        let tx = begin_immediate(&conn)?;

        let before = Self::find_order_tx(&tx, plan.order_id)?
            .ok_or_else(|| RepositoryError::not_found("Order", plan.order_id))?;
        // already returned by another writer
        if !before.dispatched {
            return Ok(before);
        }
        let after = Order {
            shipment_out_id: None,
            dispatched: false,
            ..before.clone()
        };
        Self::write_order_tx(&tx, &before, &after, actor, ActionType::ReturnFromDispatch)?;
        Self::move_crates_tx(
            &tx,
            &plan.crate_ids,
            plan.order_id,
            CrateState::ReadyToShip,
            actor,
            ActionType::ReturnFromDispatch,
        )?;

        tx.commit()?;
        info!(order_id = plan.order_id, crates = plan.crate_ids.len(), "order returned from dispatch");
        Ok(after)
    }
}
