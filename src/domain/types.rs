// ==========================================
// Bedna workflow - closed vocabularies
// ==========================================
// Crate state, blast state, straighten state, priority,
// shipment direction and pricing model.
// DB format: SCREAMING_SNAKE_CASE strings (to_db_str / from_db_str)
// ==========================================

use serde::{Deserialize, Serialize};
use std::fmt;

// ==========================================
// Crate state (stav bedny)
// ==========================================
// Ordered progression, SHIPPED is terminal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum CrateState {
    Received,    // prijato
    ToBeMoved,   // k navezeni
    Moved,       // navezeno
    InProcess,   // do zpracovani
    HeatTreated, // zakaleno
    Inspected,   // zkontrolovano
    ReadyToShip, // k expedici
    Shipped,     // expedovano
}

impl CrateState {
    /// All states in workflow order
    pub const ORDERED: [CrateState; 8] = [
        CrateState::Received,
        CrateState::ToBeMoved,
        CrateState::Moved,
        CrateState::InProcess,
        CrateState::HeatTreated,
        CrateState::Inspected,
        CrateState::ReadyToShip,
        CrateState::Shipped,
    ];

    /// Position in the workflow order
    pub fn ordinal(&self) -> usize {
        Self::ORDERED
            .iter()
            .position(|s| s == self)
            .unwrap_or_default()
    }

    /// One stage back, None for the initial state
    pub fn previous(&self) -> Option<CrateState> {
        let i = self.ordinal();
        if i == 0 {
            None
        } else {
            Some(Self::ORDERED[i - 1])
        }
    }

    /// One stage forward, None for the terminal state
    pub fn next(&self) -> Option<CrateState> {
        Self::ORDERED.get(self.ordinal() + 1).copied()
    }

    pub fn is_terminal(&self) -> bool {
        matches!(self, CrateState::Shipped)
    }

    pub fn from_db_str(s: &str) -> Option<Self> {
        match s.trim().to_uppercase().as_str() {
            "RECEIVED" => Some(CrateState::Received),
            "TO_BE_MOVED" => Some(CrateState::ToBeMoved),
            "MOVED" => Some(CrateState::Moved),
            "IN_PROCESS" => Some(CrateState::InProcess),
            "HEAT_TREATED" => Some(CrateState::HeatTreated),
            "INSPECTED" => Some(CrateState::Inspected),
            "READY_TO_SHIP" => Some(CrateState::ReadyToShip),
            "SHIPPED" => Some(CrateState::Shipped),
            _ => None,
        }
    }

    pub fn to_db_str(&self) -> &'static str {
        match self {
            CrateState::Received => "RECEIVED",
            CrateState::ToBeMoved => "TO_BE_MOVED",
            CrateState::Moved => "MOVED",
            CrateState::InProcess => "IN_PROCESS",
            CrateState::HeatTreated => "HEAT_TREATED",
            CrateState::Inspected => "INSPECTED",
            CrateState::ReadyToShip => "READY_TO_SHIP",
            CrateState::Shipped => "SHIPPED",
        }
    }
}

impl Default for CrateState {
    fn default() -> Self {
        CrateState::Received
    }
}

impl fmt::Display for CrateState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.to_db_str())
    }
}

// ==========================================
// Blast state (tryskani)
// ==========================================
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum BlastState {
    Unspecified, // nezadano
    Dirty,       // spinava, needs blasting
    Clean,       // cista
    Blasted,     // otryskana
}

impl BlastState {
    pub const ALL: [BlastState; 4] = [
        BlastState::Unspecified,
        BlastState::Dirty,
        BlastState::Clean,
        BlastState::Blasted,
    ];

    /// Secondary process finished (or never needed)
    pub fn is_done(&self) -> bool {
        matches!(self, BlastState::Clean | BlastState::Blasted)
    }

    pub fn from_db_str(s: &str) -> Option<Self> {
        match s.trim().to_uppercase().as_str() {
            "UNSPECIFIED" => Some(BlastState::Unspecified),
            "DIRTY" => Some(BlastState::Dirty),
            "CLEAN" => Some(BlastState::Clean),
            "BLASTED" => Some(BlastState::Blasted),
            _ => None,
        }
    }

    pub fn to_db_str(&self) -> &'static str {
        match self {
            BlastState::Unspecified => "UNSPECIFIED",
            BlastState::Dirty => "DIRTY",
            BlastState::Clean => "CLEAN",
            BlastState::Blasted => "BLASTED",
        }
    }
}

impl Default for BlastState {
    fn default() -> Self {
        BlastState::Unspecified
    }
}

impl fmt::Display for BlastState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.to_db_str())
    }
}

// ==========================================
// Straighten state (rovnani)
// ==========================================
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum StraightenState {
    Unspecified,  // nezadano
    Straight,     // rovna
    Crooked,      // kriva
    Straightened, // vyrovnana
}

impl StraightenState {
    pub const ALL: [StraightenState; 4] = [
        StraightenState::Unspecified,
        StraightenState::Straight,
        StraightenState::Crooked,
        StraightenState::Straightened,
    ];

    pub fn is_done(&self) -> bool {
        matches!(self, StraightenState::Straight | StraightenState::Straightened)
    }

    pub fn from_db_str(s: &str) -> Option<Self> {
        match s.trim().to_uppercase().as_str() {
            "UNSPECIFIED" => Some(StraightenState::Unspecified),
            "STRAIGHT" => Some(StraightenState::Straight),
            "CROOKED" => Some(StraightenState::Crooked),
            "STRAIGHTENED" => Some(StraightenState::Straightened),
            _ => None,
        }
    }

    pub fn to_db_str(&self) -> &'static str {
        match self {
            StraightenState::Unspecified => "UNSPECIFIED",
            StraightenState::Straight => "STRAIGHT",
            StraightenState::Crooked => "CROOKED",
            StraightenState::Straightened => "STRAIGHTENED",
        }
    }
}

impl Default for StraightenState {
    fn default() -> Self {
        StraightenState::Unspecified
    }
}

impl fmt::Display for StraightenState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.to_db_str())
    }
}

// ==========================================
// Priority
// ==========================================
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Priority {
    Low,
    Medium,
    High,
}

impl Priority {
    pub fn from_db_str(s: &str) -> Self {
        match s.trim().to_uppercase().as_str() {
            "MEDIUM" => Priority::Medium,
            "HIGH" => Priority::High,
            _ => Priority::Low, // default
        }
    }

    pub fn to_db_str(&self) -> &'static str {
        match self {
            Priority::Low => "LOW",
            Priority::Medium => "MEDIUM",
            Priority::High => "HIGH",
        }
    }
}

impl Default for Priority {
    fn default() -> Self {
        Priority::Low
    }
}

impl fmt::Display for Priority {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.to_db_str())
    }
}

// ==========================================
// Shipment direction (prijem / vydej)
// ==========================================
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ShipmentDirection {
    Inbound,
    Outbound,
}

impl ShipmentDirection {
    pub fn from_db_str(s: &str) -> Option<Self> {
        match s.trim().to_uppercase().as_str() {
            "INBOUND" => Some(ShipmentDirection::Inbound),
            "OUTBOUND" => Some(ShipmentDirection::Outbound),
            _ => None,
        }
    }

    pub fn to_db_str(&self) -> &'static str {
        match self {
            ShipmentDirection::Inbound => "INBOUND",
            ShipmentDirection::Outbound => "OUTBOUND",
        }
    }

    /// Short tag used in shipment labels
    pub fn short_tag(&self) -> &'static str {
        match self {
            ShipmentDirection::Inbound => "IN",
            ShipmentDirection::Outbound => "OUT",
        }
    }
}

impl fmt::Display for ShipmentDirection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.to_db_str())
    }
}

// ==========================================
// Pricing model
// ==========================================
// Only LENGTH_BRACKET customers resolve a unit price; NONE costs zero.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum PricingModel {
    None,
    LengthBracket,
}

impl PricingModel {
    pub fn from_db_str(s: &str) -> Self {
        match s.trim().to_uppercase().as_str() {
            "LENGTH_BRACKET" => PricingModel::LengthBracket,
            _ => PricingModel::None,
        }
    }

    pub fn to_db_str(&self) -> &'static str {
        match self {
            PricingModel::None => "NONE",
            PricingModel::LengthBracket => "LENGTH_BRACKET",
        }
    }
}

impl Default for PricingModel {
    fn default() -> Self {
        PricingModel::None
    }
}

// ==========================================
// Crate workflow field
// ==========================================
// Names the field in transition errors and bulk updates
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum CrateField {
    State,
    Blast,
    Straighten,
}

impl fmt::Display for CrateField {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CrateField::State => write!(f, "state"),
            CrateField::Blast => write!(f, "blast"),
            CrateField::Straighten => write!(f, "straighten"),
        }
    }
}
