// ==========================================
// Bedna workflow - reference data API
// ==========================================
// Customers, consignees, specifications, head types and prices.
// ==========================================

use std::sync::Arc;

use rust_decimal::Decimal;
use tracing::info;

use crate::api::error::{ApiError, ApiResult};
use crate::domain::catalog::{HeadType, NewPrice, NewSpecification, Price, Specification};
use crate::domain::customer::{Consignee, Customer, NewCustomer};
use crate::repository::{CatalogRepository, CustomerRepository};

pub struct CatalogApi {
    customer_repo: Arc<CustomerRepository>,
    catalog_repo: Arc<CatalogRepository>,
}

impl CatalogApi {
    pub fn new(customer_repo: Arc<CustomerRepository>, catalog_repo: Arc<CatalogRepository>) -> Self {
        Self {
            customer_repo,
            catalog_repo,
        }
    }

    // ==========================================
    // Customer / consignee
    // ==========================================

    /// # Errors
    /// - InvalidInput: blank code or non-positive numbering range
    /// - BusinessRuleViolation: code or numbering range already taken
    pub fn create_customer(&self, new: &NewCustomer, actor: &str) -> ApiResult<Customer> {
        if new.code.trim().is_empty() {
            return Err(ApiError::InvalidInput("customer code must not be empty".to_string()));
        }
        if new.numbering_range <= 0 {
            return Err(ApiError::InvalidInput(format!(
                "numbering range must be positive, got {}",
                new.numbering_range
            )));
        }
        let customer = self.customer_repo.create_customer(new, actor)?;
        info!(customer = %customer.code, range = customer.numbering_range, "customer created");
        Ok(customer)
    }

    pub fn get_customer(&self, customer_id: i64) -> ApiResult<Customer> {
        self.customer_repo
            .find_customer(customer_id)?
            .ok_or_else(|| ApiError::NotFound(format!("Customer (id={})", customer_id)))
    }

    pub fn customer_by_code(&self, code: &str) -> ApiResult<Customer> {
        self.customer_repo
            .find_customer_by_code(code)?
            .ok_or_else(|| ApiError::NotFound(format!("customer {}", code)))
    }

    pub fn list_customers(&self) -> ApiResult<Vec<Customer>> {
        Ok(self.customer_repo.list_customers()?)
    }

    pub fn create_consignee(&self, name: &str, address: Option<&str>, actor: &str) -> ApiResult<Consignee> {
        if name.trim().is_empty() {
            return Err(ApiError::InvalidInput("consignee name must not be empty".to_string()));
        }
        Ok(self.customer_repo.create_consignee(name.trim(), address, actor)?)
    }

    pub fn get_consignee(&self, consignee_id: i64) -> ApiResult<Consignee> {
        self.customer_repo
            .find_consignee(consignee_id)?
            .ok_or_else(|| ApiError::NotFound(format!("Consignee (id={})", consignee_id)))
    }

    // ==========================================
    // Specification / head type
    // ==========================================

    pub fn create_specification(&self, new: &NewSpecification, actor: &str) -> ApiResult<Specification> {
        if new.name.trim().is_empty() {
            return Err(ApiError::InvalidInput("specification name must not be empty".to_string()));
        }
        self.get_customer(new.customer_id)?;
        Ok(self.catalog_repo.create_specification(new, actor)?)
    }

    pub fn list_specifications(&self, customer_id: i64) -> ApiResult<Vec<Specification>> {
        Ok(self.catalog_repo.list_specifications(customer_id)?)
    }

    /// Inactive specifications stay on existing orders but cannot be assigned to new ones
    pub fn set_specification_active(&self, specification_id: i64, active: bool, actor: &str) -> ApiResult<Specification> {
        let spec = self.catalog_repo.set_specification_active(specification_id, active, actor)?;
        info!(specification = %spec.name, active, "specification activity changed");
        Ok(spec)
    }

    pub fn create_head_type(&self, name: &str, description: Option<&str>, actor: &str) -> ApiResult<HeadType> {
        if name.trim().is_empty() {
            return Err(ApiError::InvalidInput("head type name must not be empty".to_string()));
        }
        Ok(self.catalog_repo.create_head_type(name, description, actor)?)
    }

    // ==========================================
    // Price
    // ==========================================

    /// # Errors
    /// - InvalidInput: negative rate
    /// - BusinessRuleViolation: a linked specification belongs to another customer
    /// - ValidationError: empty length bracket
    pub fn create_price(&self, new: &NewPrice, actor: &str) -> ApiResult<Price> {
        if new.rate_per_kg < Decimal::ZERO {
            return Err(ApiError::InvalidInput(format!(
                "rate per kg must not be negative, got {}",
                new.rate_per_kg
            )));
        }
        let customer = self.get_customer(new.customer_id)?;
        for spec_id in &new.specification_ids {
            let spec = self
                .catalog_repo
                .find_specification(*spec_id)?
                .ok_or_else(|| ApiError::NotFound(format!("Specification (id={})", spec_id)))?;
            if spec.customer_id != customer.id {
                return Err(ApiError::BusinessRuleViolation(format!(
                    "specification {} does not belong to customer {}",
                    spec.name, customer.code
                )));
            }
        }
        Ok(self.catalog_repo.create_price(new, actor)?)
    }

    pub fn list_prices(&self, customer_id: i64) -> ApiResult<Vec<Price>> {
        Ok(self.catalog_repo.list_prices(customer_id)?)
    }
}
