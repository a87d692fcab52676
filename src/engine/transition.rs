// ==========================================
// Bedna workflow - transition engine
// ==========================================
// Allowed-choice computation for the three coupled crate fields
// (state, blast, straighten). Pure functions of the current values,
// no persistence access.
// ==========================================

use crate::domain::crates::{Crate, CrateUpdate};
use crate::domain::types::{BlastState, CrateField, CrateState, StraightenState};
use serde::{Deserialize, Serialize};
use std::fmt::Display;
use thiserror::Error;

// ==========================================
// TransitionError
// ==========================================
#[derive(Error, Debug, Clone, PartialEq)]
pub enum TransitionError {
    #[error("crate {crate_number}: {field} change {from} -> {to} is not allowed (allowed: {allowed})")]
    NotAllowed {
        crate_number: i64,
        field: CrateField,
        from: String,
        to: String,
        allowed: String,
    },

    #[error("order {order_id}: bulk {field} update needs every crate to share one value (found: {found})")]
    NonUniformField {
        order_id: i64,
        field: CrateField,
        found: String,
    },

    #[error("order {order_id}: bulk {field} update rejected, shared value {value} is terminal")]
    TerminalField {
        order_id: i64,
        field: CrateField,
        value: String,
    },

    #[error("order {order_id} has no crates")]
    EmptyOrder { order_id: i64 },
}

// ==========================================
// AllowedChoices - all three sets for one crate
// ==========================================
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AllowedChoices {
    pub state: Vec<CrateState>,
    pub blast: Vec<BlastState>,
    pub straighten: Vec<StraightenState>,
}

/// One field change applied to every crate of an order
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum FieldChange {
    State(CrateState),
    Blast(BlastState),
    Straighten(StraightenState),
}

impl FieldChange {
    pub fn field(&self) -> CrateField {
        match self {
            FieldChange::State(_) => CrateField::State,
            FieldChange::Blast(_) => CrateField::Blast,
            FieldChange::Straighten(_) => CrateField::Straighten,
        }
    }

    fn as_update(&self) -> CrateUpdate {
        let mut update = CrateUpdate::default();
        match *self {
            FieldChange::State(v) => update.state = Some(v),
            FieldChange::Blast(v) => update.blast = Some(v),
            FieldChange::Straighten(v) => update.straighten = Some(v),
        }
        update
    }
}

// ==========================================
// TransitionEngine
// ==========================================
pub struct TransitionEngine;

impl TransitionEngine {
    /// Legal next crate states
    ///
    /// - SHIPPED: frozen
    /// - READY_TO_SHIP: step back or stay
    /// - INSPECTED: step back, stay; forward only when blasting and
    ///   straightening are both finished
    /// - RECEIVED: stay or forward
    /// - otherwise one step back, stay, one step forward
    pub fn allowed_state_choices(
        state: CrateState,
        blast: BlastState,
        straighten: StraightenState,
    ) -> Vec<CrateState> {
        let mut choices = Vec::with_capacity(3);
        match state {
            CrateState::Shipped => choices.push(state),
            CrateState::ReadyToShip => {
                choices.extend(state.previous());
                choices.push(state);
            }
            CrateState::Inspected => {
                choices.extend(state.previous());
                choices.push(state);
                if blast.is_done() && straighten.is_done() {
                    choices.extend(state.next());
                }
            }
            CrateState::Received => {
                choices.push(state);
                choices.extend(state.next());
            }
            _ => {
                choices.extend(state.previous());
                choices.push(state);
                choices.extend(state.next());
            }
        }
        choices
    }

    /// Legal blast values; frozen while the crate is READY_TO_SHIP
    pub fn allowed_blast_choices(state: CrateState, blast: BlastState) -> Vec<BlastState> {
        if state == CrateState::ReadyToShip {
            return vec![blast];
        }
        let excluded: &[BlastState] = match blast {
            BlastState::Unspecified => &[],
            BlastState::Dirty => &[BlastState::Clean],
            BlastState::Clean => &[BlastState::Dirty, BlastState::Blasted],
            BlastState::Blasted => &[BlastState::Clean, BlastState::Unspecified],
        };
        BlastState::ALL
            .iter()
            .copied()
            .filter(|b| !excluded.contains(b))
            .collect()
    }

    /// Legal straighten values; frozen while the crate is READY_TO_SHIP
    pub fn allowed_straighten_choices(
        state: CrateState,
        straighten: StraightenState,
    ) -> Vec<StraightenState> {
        if state == CrateState::ReadyToShip {
            return vec![straighten];
        }
        let excluded: &[StraightenState] = match straighten {
            StraightenState::Unspecified => &[StraightenState::Straightened],
            StraightenState::Crooked => &[StraightenState::Straight],
            StraightenState::Straight => &[StraightenState::Crooked, StraightenState::Straightened],
            StraightenState::Straightened => {
                &[StraightenState::Straight, StraightenState::Unspecified]
            }
        };
        StraightenState::ALL
            .iter()
            .copied()
            .filter(|r| !excluded.contains(r))
            .collect()
    }

    /// All three sets for a crate's current values
    pub fn allowed_choices(current: &Crate) -> AllowedChoices {
        AllowedChoices {
            state: Self::allowed_state_choices(current.state, current.blast, current.straighten),
            blast: Self::allowed_blast_choices(current.state, current.blast),
            straighten: Self::allowed_straighten_choices(current.state, current.straighten),
        }
    }

    /// Check every requested workflow field against the sets computed
    /// from the crate's current values
    ///
    /// # Returns
    /// - Ok(()): all requested values are legal
    /// - Err(violations): one entry per offending field
    pub fn validate_update(
        current: &Crate,
        update: &CrateUpdate,
    ) -> Result<(), Vec<TransitionError>> {
        let allowed = Self::allowed_choices(current);
        let mut violations = Vec::new();

        if let Some(to) = update.state {
            if let Err(e) = check(current.crate_number, CrateField::State, current.state, to, &allowed.state) {
                violations.push(e);
            }
        }
        if let Some(to) = update.blast {
            if let Err(e) = check(current.crate_number, CrateField::Blast, current.blast, to, &allowed.blast) {
                violations.push(e);
            }
        }
        if let Some(to) = update.straighten {
            if let Err(e) = check(
                current.crate_number,
                CrateField::Straighten,
                current.straighten,
                to,
                &allowed.straighten,
            ) {
                violations.push(e);
            }
        }

        if violations.is_empty() {
            Ok(())
        } else {
            Err(violations)
        }
    }

    /// Plan a bulk field update across every crate of an order
    ///
    /// # Rules
    /// - every crate must share the current value of the changed field
    /// - a shared SHIPPED state is terminal and cannot be bulk-changed
    /// - the new value must be legal for each crate
    ///
    /// # Returns
    /// - per-crate updates (crate id, update) to persist atomically
    pub fn plan_bulk_update(
        order_id: i64,
        crates: &[Crate],
        change: FieldChange,
    ) -> Result<Vec<(i64, CrateUpdate)>, TransitionError> {
        let first = crates.first().ok_or(TransitionError::EmptyOrder { order_id })?;
        let field = change.field();

        let shared = match field {
            CrateField::State => uniform(crates, |c| c.state).map(|v| v.to_string()),
            CrateField::Blast => uniform(crates, |c| c.blast).map(|v| v.to_string()),
            CrateField::Straighten => uniform(crates, |c| c.straighten).map(|v| v.to_string()),
        };

        if let Err(found) = shared {
            return Err(TransitionError::NonUniformField {
                order_id,
                field,
                found,
            });
        }
        if field == CrateField::State && first.state.is_terminal() {
            return Err(TransitionError::TerminalField {
                order_id,
                field,
                value: first.state.to_string(),
            });
        }

        let update = change.as_update();
        let mut planned = Vec::with_capacity(crates.len());
        for c in crates {
            if let Err(mut violations) = Self::validate_update(c, &update) {
                return Err(violations.remove(0));
            }
            planned.push((c.id, update.clone()));
        }
        Ok(planned)
    }
}

/// Single-field membership check
fn check<T: PartialEq + Display>(
    crate_number: i64,
    field: CrateField,
    from: T,
    to: T,
    allowed: &[T],
) -> Result<(), TransitionError> {
    if allowed.contains(&to) {
        return Ok(());
    }
    Err(TransitionError::NotAllowed {
        crate_number,
        field,
        from: from.to_string(),
        to: to.to_string(),
        allowed: allowed
            .iter()
            .map(|v| v.to_string())
            .collect::<Vec<_>>()
            .join(", "),
    })
}

/// Ok(value) when every crate shares it, Err(list of distinct values) otherwise
fn uniform<T, F>(crates: &[Crate], get: F) -> Result<T, String>
where
    T: PartialEq + Display + Copy,
    F: Fn(&Crate) -> T,
{
    let mut distinct: Vec<T> = Vec::new();
    for c in crates {
        let v = get(c);
        if !distinct.contains(&v) {
            distinct.push(v);
        }
    }
    if distinct.len() == 1 {
        Ok(distinct[0])
    } else {
        Err(distinct
            .iter()
            .map(|v| v.to_string())
            .collect::<Vec<_>>()
            .join(", "))
    }
}
