// ==========================================
// Bedna workflow - order API
// ==========================================
// Order lifecycle: create (references validated), edit until
// dispatched, delete with crates, summary and cost report.
// ==========================================

use std::sync::Arc;

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use tracing::info;

use crate::api::error::{config_error, ApiResult};
use crate::api::validator::ReferenceValidator;
use crate::config::WorkflowConfigReader;
use crate::domain::order::{NewOrder, Order, OrderSummary, OrderUpdate};
use crate::engine::pricing::{PricingResolver, RoundingPolicy};
use crate::repository::{CatalogRepository, OrderRepository};

/// Cost report for one order
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OrderCost {
    pub order_id: i64,
    pub customer_code: String,
    pub rounding: RoundingPolicy,
    pub unit_price: Option<Decimal>, // per kg; None when no bracket applies
    pub total_net_weight: Decimal,
    pub cost: Decimal,
}

pub struct OrderApi {
    order_repo: Arc<OrderRepository>,
    catalog_repo: Arc<CatalogRepository>,
    validator: Arc<ReferenceValidator>,
    config: Arc<dyn WorkflowConfigReader>,
}

impl OrderApi {
    pub fn new(
        order_repo: Arc<OrderRepository>,
        catalog_repo: Arc<CatalogRepository>,
        validator: Arc<ReferenceValidator>,
        config: Arc<dyn WorkflowConfigReader>,
    ) -> Self {
        Self {
            order_repo,
            catalog_repo,
            validator,
            config,
        }
    }

    // ==========================================
    // Commands
    // ==========================================

    /// Create an order under an inbound shipment
    ///
    /// # Errors
    /// - NotFound: shipment, specification, head type or consignee missing
    /// - InvalidInput: shipment is outbound, bad dimensions
    /// - BusinessRuleViolation: specification of another customer or inactive
    pub fn create_order(&self, new: &NewOrder, actor: &str) -> ApiResult<Order> {
        self.validator.validate_new_order(new)?;
        let order = self.order_repo.create_order(new, actor)?;
        info!(order_id = order.id, article = %order.article, "order created");
        Ok(order)
    }

    /// Edit descriptive fields; rejected once the order is dispatched
    pub fn update_order(&self, order_id: i64, update: &OrderUpdate, actor: &str) -> ApiResult<Order> {
        let current = self.validator.editable_order(order_id)?;
        if update.is_empty() {
            return Ok(current);
        }

        let mut candidate = current.clone();
        update.apply_to(&mut candidate);
        let customer = self.validator.customer_of_shipment(current.shipment_in_id)?;
        if candidate.specification_id != current.specification_id {
            self.validator.check_specification(&customer, candidate.specification_id)?;
        }
        self.validator.check_head_type(candidate.head_type_id)?;
        self.validator.check_consignee(candidate.consignee_id)?;

        Ok(self.order_repo.update_order(order_id, update, actor)?)
    }

    /// Delete an order with its crates; returns the number of crates removed
    pub fn delete_order(&self, order_id: i64, actor: &str) -> ApiResult<usize> {
        self.validator.editable_order(order_id)?;
        let removed = self.order_repo.delete_order(order_id, actor)?;
        info!(order_id, crates = removed, "order deleted");
        Ok(removed)
    }

    // ==========================================
    // Queries
    // ==========================================

    pub fn get_order(&self, order_id: i64) -> ApiResult<Order> {
        self.validator.order(order_id)
    }

    pub fn list_orders_for_shipment(&self, shipment_id: i64) -> ApiResult<Vec<Order>> {
        Ok(self.order_repo.list_orders_for_shipment(shipment_id)?)
    }

    pub fn order_summary(&self, order_id: i64) -> ApiResult<OrderSummary> {
        self.validator.order(order_id)?;
        Ok(self.order_repo.order_summary(order_id)?)
    }

    /// Treatment cost of an order's current crates
    pub fn order_cost(&self, order_id: i64) -> ApiResult<OrderCost> {
        let order = self.validator.order(order_id)?;
        let customer = self.validator.customer_of_shipment(order.shipment_in_id)?;
        let prices = self.catalog_repo.list_prices(customer.id)?;
        let crates = self.order_repo.list_crates(order_id)?;
        let rounding = self
            .config
            .rounding_policy(&customer.code)
            .map_err(|e| config_error("pricing.rounding", e))?;

        Ok(OrderCost {
            order_id,
            customer_code: customer.code.clone(),
            rounding,
            unit_price: PricingResolver::unit_price(&customer, &prices, order.specification_id, order.length),
            total_net_weight: crates.iter().map(|c| c.net_weight).sum(),
            cost: PricingResolver::order_cost(&customer, &prices, &order, &crates, rounding),
        })
    }
}
