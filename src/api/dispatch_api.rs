// ==========================================
// Bedna workflow - dispatch API
// ==========================================
// Flow:
// 1) load outbound shipment, orders, crates
// 2) DispatchPlanner::plan per order, collecting every failure
// 3) any failure: reject the whole request, nothing written
//    otherwise: apply all plans in one transaction
// ==========================================

use std::sync::Arc;

use tracing::{info, instrument, warn};

use crate::api::error::{ApiError, ApiResult};
use crate::api::validator::ReferenceValidator;
use crate::domain::order::Order;
use crate::engine::dispatch::{DispatchError, DispatchPlan, DispatchPlanner, DispatchSelection};
use crate::repository::{DispatchOutcome, OrderRepository};

pub struct DispatchApi {
    order_repo: Arc<OrderRepository>,
    validator: Arc<ReferenceValidator>,
}

impl DispatchApi {
    pub fn new(order_repo: Arc<OrderRepository>, validator: Arc<ReferenceValidator>) -> Self {
        Self { order_repo, validator }
    }

    /// Dispatch the READY_TO_SHIP crates of each order onto one outbound shipment
    ///
    /// Orders with crates left behind are split; fully ready orders ship in place.
    ///
    /// # Errors
    /// - DispatchRejected: every failing order is named; nothing is written
    #[instrument(skip(self), fields(orders = order_ids.len()))]
    pub fn dispatch_orders(
        &self,
        order_ids: &[i64],
        shipment_out_id: i64,
        actor: &str,
    ) -> ApiResult<Vec<DispatchOutcome>> {
        let mut unique = order_ids.to_vec();
        unique.sort_unstable();
        unique.dedup();

        let selections: Vec<(i64, Option<Vec<i64>>)> =
            unique.into_iter().map(|id| (id, None)).collect();
        self.dispatch(&selections, shipment_out_id, actor)
    }

    /// Dispatch explicitly selected crates, grouped by their current order
    #[instrument(skip(self), fields(crates = crate_ids.len()))]
    pub fn dispatch_crates(
        &self,
        crate_ids: &[i64],
        shipment_out_id: i64,
        actor: &str,
    ) -> ApiResult<Vec<DispatchOutcome>> {
        let mut groups: Vec<(i64, Vec<i64>)> = Vec::new();
        for crate_id in crate_ids {
            let item = self
                .order_repo
                .find_crate(*crate_id)?
                .ok_or_else(|| ApiError::NotFound(format!("Crate (id={})", crate_id)))?;
            match groups.iter_mut().find(|(order_id, _)| *order_id == item.order_id) {
                Some((_, ids)) => {
                    if !ids.contains(crate_id) {
                        ids.push(*crate_id);
                    }
                }
                None => groups.push((item.order_id, vec![*crate_id])),
            }
        }
        if groups.is_empty() {
            return Err(ApiError::InvalidInput("no crates selected".to_string()));
        }

        let selections: Vec<(i64, Option<Vec<i64>>)> = groups
            .into_iter()
            .map(|(order_id, ids)| (order_id, Some(ids)))
            .collect();
        self.dispatch(&selections, shipment_out_id, actor)
    }

    /// Undo a dispatch; an order that is not dispatched is returned unchanged
    pub fn return_from_dispatch(&self, order_id: i64, actor: &str) -> ApiResult<Order> {
        let order = self.validator.order(order_id)?;
        let crates = self.order_repo.list_crates(order_id)?;
        match DispatchPlanner::plan_return(&order, &crates) {
            Some(plan) => Ok(self.order_repo.apply_return(&plan, actor)?),
            None => {
                info!(order_id, "order not dispatched, nothing to return");
                Ok(order)
            }
        }
    }

    fn dispatch(
        &self,
        selections: &[(i64, Option<Vec<i64>>)],
        shipment_out_id: i64,
        actor: &str,
    ) -> ApiResult<Vec<DispatchOutcome>> {
        let outbound = self.validator.shipment(shipment_out_id)?;

        let mut plans: Vec<DispatchPlan> = Vec::with_capacity(selections.len());
        let mut failures: Vec<DispatchError> = Vec::new();
        for (order_id, crate_ids) in selections {
            let order = self.validator.order(*order_id)?;
            let customer = self.validator.customer_of_shipment(order.shipment_in_id)?;
            let crates = self.order_repo.list_crates(*order_id)?;
            let selection = match crate_ids {
                Some(ids) => DispatchSelection::Crates(ids),
                None => DispatchSelection::WholeOrder,
            };
            match DispatchPlanner::plan(&customer, &order, &crates, &outbound, selection) {
                Ok(plan) => plans.push(plan),
                Err(e) => failures.push(e),
            }
        }

        if !failures.is_empty() {
            warn!(
                shipment = %outbound.label(),
                failed = failures.len(),
                "dispatch rejected"
            );
            return Err(ApiError::dispatch_rejected(failures));
        }

        let outcomes = self.order_repo.apply_dispatch(&plans, actor)?;
        info!(
            shipment = %outbound.label(),
            orders = outcomes.len(),
            splits = outcomes.iter().filter(|o| o.split).count(),
            "dispatch applied"
        );
        Ok(outcomes)
    }
}
