// ==========================================
// Bedna workflow - engine layer
// ==========================================
// Business rules only: no SQL, every rejection carries a reason.
// ==========================================

pub mod dispatch;
pub mod numbering;
pub mod pricing;
pub mod transition;

pub use dispatch::{DispatchError, DispatchPlan, DispatchPlanner, DispatchSelection, ReturnPlan};
pub use numbering::{NumberLedger, NumberingService};
pub use pricing::{PricingResolver, RoundingPolicy};
pub use transition::{AllowedChoices, FieldChange, TransitionEngine, TransitionError};
