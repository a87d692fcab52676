// ==========================================
// Bedna workflow - import domain model
// ==========================================
// Canonical row shape produced by every customer strategy,
// plus issues (errors / warnings) and the import report.
// ==========================================

use crate::domain::crates::NewCrate;
use crate::domain::order::NewOrder;
use crate::domain::types::Priority;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

// ==========================================
// ImportRow - canonical spreadsheet row
// ==========================================
// One row becomes one crate; rows sharing (article, batch)
// become crates of one order.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ImportRow {
    pub row_number: usize, // 1-based data row in the source sheet

    // ===== Order-level fields =====
    pub article: String,
    pub diameter: Option<Decimal>, // None when the dimension text was unparseable
    pub length: Option<Decimal>,
    pub specification_name: Option<String>,
    pub head_type_name: Option<String>,
    pub description: Option<String>,
    pub priority: Priority,
    pub full_thread: bool,

    // ===== Crate-level fields =====
    pub batch: Option<String>,
    pub net_weight: Option<Decimal>,
    pub tare_weight: Option<Decimal>,
    pub quantity: Option<i64>,
    pub material: Option<String>,
    pub customer_container_no: Option<String>,
    pub notes: Option<String>,
    pub phosphate: bool,
}

impl ImportRow {
    pub fn new(row_number: usize, article: &str) -> Self {
        Self {
            row_number,
            article: article.to_string(),
            diameter: None,
            length: None,
            specification_name: None,
            head_type_name: None,
            description: None,
            priority: Priority::Low,
            full_thread: false,
            batch: None,
            net_weight: None,
            tare_weight: None,
            quantity: None,
            material: None,
            customer_container_no: None,
            notes: None,
            phosphate: false,
        }
    }

    /// Composite grouping key (article, batch)
    pub fn order_key(&self) -> (String, String) {
        (
            self.article.clone(),
            self.batch.clone().unwrap_or_default(),
        )
    }
}

// ==========================================
// ImportIssue
// ==========================================
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum IssueLevel {
    Error,   // blocks the commit
    Warning, // reported, import proceeds
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ImportIssue {
    pub level: IssueLevel,
    pub row_number: Option<usize>, // None for sheet-level issues
    pub field: Option<String>,
    pub message: String,
}

impl ImportIssue {
    pub fn error(row_number: Option<usize>, field: Option<&str>, message: impl Into<String>) -> Self {
        Self {
            level: IssueLevel::Error,
            row_number,
            field: field.map(str::to_string),
            message: message.into(),
        }
    }

    pub fn warning(row_number: Option<usize>, field: Option<&str>, message: impl Into<String>) -> Self {
        Self {
            level: IssueLevel::Warning,
            row_number,
            field: field.map(str::to_string),
            message: message.into(),
        }
    }
}

impl std::fmt::Display for ImportIssue {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match (self.row_number, &self.field) {
            (Some(row), Some(field)) => write!(f, "row {} [{}]: {}", row, field, self.message),
            (Some(row), None) => write!(f, "row {}: {}", row, self.message),
            (None, Some(field)) => write!(f, "[{}]: {}", field, self.message),
            (None, None) => write!(f, "{}", self.message),
        }
    }
}

// ==========================================
// ImportPreview - tabular preview for the operator
// ==========================================
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ImportPreview {
    pub columns: Vec<String>,
    pub rows: Vec<Vec<String>>,
}

// ==========================================
// ParseOutcome - strategy output
// ==========================================
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ParseOutcome {
    pub rows: Vec<ImportRow>,
    pub preview: ImportPreview,
    pub errors: Vec<ImportIssue>,
    pub warnings: Vec<ImportIssue>,
}

impl ParseOutcome {
    pub fn has_errors(&self) -> bool {
        !self.errors.is_empty()
    }
}

// ==========================================
// ImportReport - api result
// ==========================================
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ImportReport {
    pub batch_id: String,
    pub customer_code: String,
    pub total_rows: usize,
    pub orders_created: usize,
    pub crates_created: usize,
    pub committed: bool,
    pub errors: Vec<ImportIssue>,
    pub warnings: Vec<ImportIssue>,
    pub preview: ImportPreview,
    pub elapsed_ms: u128,
}

// ==========================================
// ImportPlan - reconciled rows ready to persist
// ==========================================
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum SpecificationRef {
    Existing(i64),
    UnknownPlaceholder, // created on demand for legacy formats
}

/// One order to create, with the crates of every row grouped under it
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PlannedOrder {
    pub article: String,
    pub batch: Option<String>,
    pub diameter: Decimal,
    pub length: Decimal,
    pub specification: SpecificationRef,
    pub head_type_id: Option<i64>,
    pub full_thread: bool,
    pub description: Option<String>,
    pub priority: Priority,
    pub crates: Vec<NewCrate>,
    pub row_numbers: Vec<usize>,
}

impl PlannedOrder {
    pub fn to_new_order(&self, shipment_in_id: i64, specification_id: i64) -> NewOrder {
        NewOrder {
            shipment_in_id,
            article: self.article.clone(),
            diameter: self.diameter,
            length: self.length,
            specification_id,
            head_type_id: self.head_type_id,
            full_thread: self.full_thread,
            description: self.description.clone(),
            priority: self.priority,
            consignee_id: None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ImportPlan {
    pub batch_id: String,
    pub customer_id: i64,
    pub shipment_in_id: i64,
    pub orders: Vec<PlannedOrder>,
}

impl ImportPlan {
    pub fn crate_count(&self) -> usize {
        self.orders.iter().map(|o| o.crates.len()).sum()
    }
}

/// What a committed import created
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ImportCommit {
    pub order_ids: Vec<i64>,
    pub crate_ids: Vec<i64>,
}
