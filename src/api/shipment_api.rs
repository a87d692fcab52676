// ==========================================
// Bedna workflow - shipment API
// ==========================================

use std::sync::Arc;

use tracing::info;

use crate::api::error::{config_error, ApiError, ApiResult};
use crate::api::validator::ReferenceValidator;
use crate::config::WorkflowConfigReader;
use crate::domain::shipment::{NewShipment, Shipment};
use crate::domain::types::ShipmentDirection;
use crate::repository::{with_numbering_retry, CustomerRepository, ShipmentRepository};

pub struct ShipmentApi {
    shipment_repo: Arc<ShipmentRepository>,
    customer_repo: Arc<CustomerRepository>,
    validator: Arc<ReferenceValidator>,
    config: Arc<dyn WorkflowConfigReader>,
}

impl ShipmentApi {
    pub fn new(
        shipment_repo: Arc<ShipmentRepository>,
        customer_repo: Arc<CustomerRepository>,
        validator: Arc<ReferenceValidator>,
        config: Arc<dyn WorkflowConfigReader>,
    ) -> Self {
        Self {
            shipment_repo,
            customer_repo,
            validator,
            config,
        }
    }

    /// Register a truck movement with the next sequence number of its
    /// (customer, direction, year) scope
    ///
    /// # Errors
    /// - NotFound: customer or consignee missing
    /// - InvalidInput: consignee on an inbound shipment
    /// - NumberingConflict: still conflicting after the configured attempts
    pub fn create_shipment(&self, new: &NewShipment, actor: &str) -> ApiResult<Shipment> {
        self.customer_repo
            .find_customer(new.customer_id)?
            .ok_or_else(|| ApiError::NotFound(format!("Customer (id={})", new.customer_id)))?;
        if new.consignee_id.is_some() && new.direction == ShipmentDirection::Inbound {
            return Err(ApiError::InvalidInput(
                "only outbound shipments carry a consignee".to_string(),
            ));
        }
        self.validator.check_consignee(new.consignee_id)?;

        let attempts = self
            .config
            .numbering_max_retries()
            .map_err(|e| config_error("numbering.max_retries", e))?;
        let shipment = with_numbering_retry(attempts, || self.shipment_repo.create_shipment(new, actor))?;
        info!(shipment_id = shipment.id, label = %shipment.label(), actor, "shipment registered");
        Ok(shipment)
    }

    pub fn get_shipment(&self, shipment_id: i64) -> ApiResult<Shipment> {
        self.validator.shipment(shipment_id)
    }

    /// Shipments of one customer, direction and year in sequence order
    pub fn list_shipments(
        &self,
        customer_id: i64,
        direction: ShipmentDirection,
        year: i32,
    ) -> ApiResult<Vec<Shipment>> {
        Ok(self.shipment_repo.list_for_customer(customer_id, direction, year)?)
    }
}
