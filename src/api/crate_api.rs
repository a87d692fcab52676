// ==========================================
// Bedna workflow - crate API
// ==========================================
// Crate creation (numbered, retried on numbering conflicts),
// workflow field edits through the transition engine, allowed
// choices for the UI and bulk per-order field changes.
// ==========================================

use std::sync::Arc;

use rust_decimal::Decimal;
use tracing::{info, warn};

use crate::api::error::{config_error, ApiError, ApiResult};
use crate::api::validator::ReferenceValidator;
use crate::config::WorkflowConfigReader;
use crate::domain::crates::{Crate, CrateUpdate, NewCrate};
use crate::engine::pricing::PricingResolver;
use crate::engine::transition::{AllowedChoices, FieldChange, TransitionEngine};
use crate::repository::{with_numbering_retry, CatalogRepository, OrderRepository};

pub struct CrateApi {
    order_repo: Arc<OrderRepository>,
    catalog_repo: Arc<CatalogRepository>,
    validator: Arc<ReferenceValidator>,
    config: Arc<dyn WorkflowConfigReader>,
}

impl CrateApi {
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
    // Creation
    // ==========================================

    /// Number and insert crates for an order, all or nothing
    ///
    /// # Errors
    /// - OrderDispatched: the order is closed
    /// - ValidationError: bad weights / quantity
    /// - NumberingConflict: still conflicting after `numbering.max_retries` attempts
    pub fn create_crates(&self, order_id: i64, crates: Vec<NewCrate>, actor: &str) -> ApiResult<Vec<Crate>> {
        self.validator.editable_order(order_id)?;
        if crates.is_empty() {
            return Ok(Vec::new());
        }
        let attempts = self
            .config
            .numbering_max_retries()
            .map_err(|e| config_error("numbering.max_retries", e))?;

        let created = with_numbering_retry(attempts, || {
            self.order_repo.create_crates(order_id, crates.clone(), actor)
        })?;
        info!(
            order_id,
            first = created.first().map(|c| c.crate_number),
            last = created.last().map(|c| c.crate_number),
            "crates created"
        );
        Ok(created)
    }

    // ==========================================
    // Workflow edits
    // ==========================================

    /// Apply a field edit after checking it against the allowed choices
    pub fn update_crate(&self, crate_id: i64, update: &CrateUpdate, actor: &str) -> ApiResult<Crate> {
        let current = self.get_crate(crate_id)?;
        self.validator.editable_order(current.order_id)?;

        if let Err(violations) = TransitionEngine::validate_update(&current, update) {
            warn!(
                crate_number = current.crate_number,
                violations = violations.len(),
                "crate update rejected"
            );
            return Err(ApiError::transition_rejected(violations));
        }

        let mut candidate = current.clone();
        update.apply_to(&mut candidate);
        let mut weights = NewCrate::with_weights(candidate.net_weight, candidate.tare_weight);
        weights.quantity = candidate.quantity;
        weights
            .validate()
            .map_err(|reasons| ApiError::ValidationError(reasons.join("; ")))?;

        Ok(self.order_repo.update_crate(crate_id, update, actor)?)
    }

    pub fn allowed_choices(&self, crate_id: i64) -> ApiResult<AllowedChoices> {
        let current = self.get_crate(crate_id)?;
        Ok(TransitionEngine::allowed_choices(&current))
    }

    /// Change one workflow field on every crate of an order
    pub fn bulk_update_order(&self, order_id: i64, change: FieldChange, actor: &str) -> ApiResult<Vec<Crate>> {
        self.validator.editable_order(order_id)?;
        let crates = self.order_repo.list_crates(order_id)?;
        let planned = TransitionEngine::plan_bulk_update(order_id, &crates, change).map_err(|e| {
            warn!(order_id, error = %e, "bulk update rejected");
            ApiError::from(e)
        })?;

        let written = self.order_repo.apply_crate_updates(&planned, actor)?;
        info!(order_id, field = %change.field(), crates = written.len(), "bulk update applied");
        Ok(written)
    }

    // ==========================================
    // Queries
    // ==========================================

    pub fn get_crate(&self, crate_id: i64) -> ApiResult<Crate> {
        self.order_repo
            .find_crate(crate_id)?
            .ok_or_else(|| ApiError::NotFound(format!("Crate (id={})", crate_id)))
    }

    pub fn find_by_number(&self, crate_number: i64) -> ApiResult<Crate> {
        self.order_repo
            .find_crate_by_number(crate_number)?
            .ok_or_else(|| ApiError::NotFound(format!("Crate number {}", crate_number)))
    }

    pub fn list_crates(&self, order_id: i64) -> ApiResult<Vec<Crate>> {
        Ok(self.order_repo.list_crates(order_id)?)
    }

    /// Treatment cost of a single crate
    pub fn crate_cost(&self, crate_id: i64) -> ApiResult<Decimal> {
        let item = self.get_crate(crate_id)?;
        let order = self.validator.order(item.order_id)?;
        let customer = self.validator.customer_of_shipment(order.shipment_in_id)?;
        let prices = self.catalog_repo.list_prices(customer.id)?;
        let rounding = self
            .config
            .rounding_policy(&customer.code)
            .map_err(|e| config_error("pricing.rounding", e))?;
        Ok(PricingResolver::crate_cost(&customer, &prices, &order, &item, rounding))
    }
}
