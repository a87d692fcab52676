// ==========================================
// Bedna workflow - core library
// ==========================================
// Metal crate treatment workflow: orders and crates from inbound
// shipment through treatment states to (split) dispatch.
// Stack: Rust + SQLite (rusqlite)
// ==========================================

// ==========================================
// Modules
// ==========================================

// Domain - entities and vocabularies
pub mod domain;

// Repository - data access
pub mod repository;

// Engine - business rules
pub mod engine;

// Importer - customer spreadsheets
pub mod importer;

// Config - settings store
pub mod config;

// SQLite connection and schema
pub mod db;

pub mod logging;

// Api - use-case facade
pub mod api;

// App - wiring
pub mod app;

// ==========================================
// Re-exports
// ==========================================

pub use domain::types::{
    BlastState, CrateField, CrateState, PricingModel, Priority, ShipmentDirection,
    StraightenState,
};

pub use domain::{ActionLog, ActionType, Crate, Customer, Order, Shipment};

pub use engine::{DispatchPlanner, NumberingService, PricingResolver, TransitionEngine};

pub use api::{ApiError, ApiResult, CrateApi, DispatchApi, ImportApi, OrderApi};

pub use app::AppState;

// ==========================================
// Constants
// ==========================================

pub const VERSION: &str = env!("CARGO_PKG_VERSION");

pub const APP_NAME: &str = "Bedna workflow";
