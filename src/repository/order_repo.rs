// ==========================================
// Bedna workflow - order / crate repository
// ==========================================
// Orders and their crates are one aggregate: crate creation,
// dispatch, reversal, bulk updates and import commits all write
// both tables plus the audit log in a single transaction.
// ==========================================

mod core;
mod crates;
mod dispatch;
mod import;

#[cfg(test)]
mod tests;

pub use core::OrderRepository;
pub use dispatch::DispatchOutcome;
