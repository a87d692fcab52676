// ==========================================
// Bedna workflow - audit log repository
// ==========================================
// Every mutation writes one row in the caller's transaction.
// ==========================================

mod core;
mod queries;


pub use core::ActionLogRepository;
