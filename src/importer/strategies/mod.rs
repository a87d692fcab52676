// ==========================================
// Bedna workflow - customer import layouts
// ==========================================

mod eur;
mod rch;
mod spx;

pub use eur::EurStrategy;
pub use rch::RchStrategy;
pub use spx::SpxStrategy;
