// ==========================================
// Bedna workflow - repository layer
// ==========================================
// Data access only; business rules live in engine/.
// All queries are parameterized.
// ==========================================

pub mod action_log_repo;
pub mod catalog_repo;
pub mod customer_repo;
pub mod error;
pub mod number_ledger;
pub mod order_repo;
pub mod shipment_repo;
pub(crate) mod sql_types;

pub use action_log_repo::ActionLogRepository;
pub use catalog_repo::CatalogRepository;
pub use customer_repo::CustomerRepository;
pub use error::{RepositoryError, RepositoryResult};
pub use number_ledger::{with_numbering_retry, SqliteNumberLedger};
pub use order_repo::{DispatchOutcome, OrderRepository};
pub use shipment_repo::ShipmentRepository;
