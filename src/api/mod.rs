// ==========================================
// Bedna workflow - api layer
// ==========================================
// Use-case facade consumed by the UI and the admin binary.
// Validates references, calls engine rules, then repositories.
// ==========================================

pub mod catalog_api;
pub mod crate_api;
pub mod dispatch_api;
pub mod error;
pub mod history_api;
pub mod import_api;
pub mod order_api;
pub mod shipment_api;
pub mod validator;

pub use catalog_api::CatalogApi;
pub use crate_api::CrateApi;
pub use dispatch_api::DispatchApi;
pub use error::{ApiError, ApiResult, ValidationViolation};
pub use history_api::HistoryApi;
pub use import_api::ImportApi;
pub use order_api::{OrderApi, OrderCost};
pub use shipment_api::ShipmentApi;
pub use validator::ReferenceValidator;
