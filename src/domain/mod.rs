// ==========================================
// Bedna workflow - domain layer
// ==========================================
// Entities, value objects and closed vocabularies.
// No data access, no engine rules.
// ==========================================

pub mod action_log;
pub mod catalog;
pub mod crates;
pub mod customer;
pub mod import;
pub mod order;
pub mod shipment;
pub mod types;

pub use action_log::{ActionLog, ActionType, EntityKind};
pub use catalog::{
    HeadType, NewPrice, NewSpecification, Price, Specification, UNKNOWN_SPECIFICATION_NAME,
};
pub use crates::{Crate, CrateUpdate, NewCrate};
pub use customer::{Consignee, Customer, NewCustomer};
pub use import::{
    ImportCommit, ImportIssue, ImportPlan, ImportPreview, ImportReport, ImportRow, IssueLevel,
    ParseOutcome, PlannedOrder, SpecificationRef,
};
pub use order::{NewOrder, Order, OrderSummary, OrderUpdate};
pub use shipment::{NewShipment, Shipment};
pub use types::{
    BlastState, CrateField, CrateState, PricingModel, Priority, ShipmentDirection,
    StraightenState,
};
