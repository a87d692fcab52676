// ==========================================
// Bedna workflow - reference validator
// ==========================================
// Cross-entity checks the repositories cannot express as
// constraints: shipment direction, specification ownership and
// activeness, dispatched-order immutability.
// ==========================================

use std::sync::Arc;

use crate::api::error::{ApiError, ApiResult};
use crate::domain::customer::Customer;
use crate::domain::order::{NewOrder, Order};
use crate::domain::shipment::Shipment;
use crate::domain::types::ShipmentDirection;
use crate::repository::{CatalogRepository, CustomerRepository, OrderRepository, ShipmentRepository};

pub struct ReferenceValidator {
    customer_repo: Arc<CustomerRepository>,
    catalog_repo: Arc<CatalogRepository>,
    shipment_repo: Arc<ShipmentRepository>,
    order_repo: Arc<OrderRepository>,
}

impl ReferenceValidator {
    pub fn new(
        customer_repo: Arc<CustomerRepository>,
        catalog_repo: Arc<CatalogRepository>,
        shipment_repo: Arc<ShipmentRepository>,
        order_repo: Arc<OrderRepository>,
    ) -> Self {
        Self {
            customer_repo,
            catalog_repo,
            shipment_repo,
            order_repo,
        }
    }

    pub fn shipment(&self, shipment_id: i64) -> ApiResult<Shipment> {
        self.shipment_repo
            .find_shipment(shipment_id)?
            .ok_or_else(|| ApiError::NotFound(format!("Shipment (id={})", shipment_id)))
    }

    /// Customer of an inbound shipment
    pub fn inbound_customer(&self, shipment_in_id: i64) -> ApiResult<Customer> {
        let shipment = self.shipment(shipment_in_id)?;
        if shipment.direction != ShipmentDirection::Inbound {
            return Err(ApiError::InvalidInput(format!(
                "shipment {} is not an inbound shipment",
                shipment.label()
            )));
        }
        self.customer_of_shipment(shipment_in_id)
    }

    pub fn customer_of_shipment(&self, shipment_id: i64) -> ApiResult<Customer> {
        self.customer_repo
            .find_customer_for_shipment(shipment_id)?
            .ok_or_else(|| ApiError::NotFound(format!("customer of shipment {}", shipment_id)))
    }

    /// The specification must exist, belong to `customer` and be active
    pub fn check_specification(&self, customer: &Customer, specification_id: i64) -> ApiResult<()> {
        let spec = self
            .catalog_repo
            .find_specification(specification_id)?
            .ok_or_else(|| ApiError::NotFound(format!("Specification (id={})", specification_id)))?;
        if spec.customer_id != customer.id {
            return Err(ApiError::BusinessRuleViolation(format!(
                "specification {} does not belong to customer {}",
                spec.name, customer.code
            )));
        }
        if !spec.active {
            return Err(ApiError::BusinessRuleViolation(format!(
                "specification {} is inactive",
                spec.name
            )));
        }
        Ok(())
    }

    pub fn check_head_type(&self, head_type_id: Option<i64>) -> ApiResult<()> {
        if let Some(id) = head_type_id {
            self.catalog_repo
                .find_head_type(id)?
                .ok_or_else(|| ApiError::NotFound(format!("HeadType (id={})", id)))?;
        }
        Ok(())
    }

    pub fn check_consignee(&self, consignee_id: Option<i64>) -> ApiResult<()> {
        if let Some(id) = consignee_id {
            self.customer_repo
                .find_consignee(id)?
                .ok_or_else(|| ApiError::NotFound(format!("Consignee (id={})", id)))?;
        }
        Ok(())
    }

    /// All references of a new order; returns the owning customer
    pub fn validate_new_order(&self, new: &NewOrder) -> ApiResult<Customer> {
        if new.article.trim().is_empty() {
            return Err(ApiError::InvalidInput("article must not be empty".to_string()));
        }
        if new.diameter.is_sign_negative() || new.diameter.is_zero() {
            return Err(ApiError::InvalidInput(format!("diameter must be positive, got {}", new.diameter)));
        }
        if new.length.is_sign_negative() || new.length.is_zero() {
            return Err(ApiError::InvalidInput(format!("length must be positive, got {}", new.length)));
        }
        let customer = self.inbound_customer(new.shipment_in_id)?;
        self.check_specification(&customer, new.specification_id)?;
        self.check_head_type(new.head_type_id)?;
        self.check_consignee(new.consignee_id)?;
        Ok(customer)
    }

    pub fn order(&self, order_id: i64) -> ApiResult<Order> {
        self.order_repo
            .find_order(order_id)?
            .ok_or_else(|| ApiError::NotFound(format!("Order (id={})", order_id)))
    }

    /// Order that may still be edited (not dispatched)
    pub fn editable_order(&self, order_id: i64) -> ApiResult<Order> {
        let order = self.order(order_id)?;
        if order.dispatched {
            return Err(ApiError::OrderDispatched { order_id });
        }
        Ok(order)
    }
}
