// ==========================================
// Bedna workflow - importer error types
// ==========================================

use crate::repository::error::RepositoryError;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ImportError {
    // ===== File =====
    #[error("file not found: {0}")]
    FileNotFound(String),

    #[error("unsupported file format: {0} (expected .xlsx, .xls or .csv)")]
    UnsupportedFormat(String),

    #[error("failed to read file: {0}")]
    FileReadError(String),

    #[error("failed to parse Excel workbook: {0}")]
    ExcelParseError(String),

    #[error("failed to parse CSV: {0}")]
    CsvParseError(String),

    #[error("sheet has no header row")]
    EmptySheet,

    // ===== Layout =====
    #[error("missing required column(s): {}", columns.join(", "))]
    MissingColumns { columns: Vec<String> },

    #[error("no import format registered for customer {0}")]
    UnknownFormat(String),

    // ===== References =====
    #[error("row {row}: unknown specification '{name}'")]
    UnknownSpecification { row: usize, name: String },

    #[error("row {row}: specification '{name}' is inactive")]
    InactiveSpecification { row: usize, name: String },

    #[error("row {row}: unknown head type '{name}'")]
    UnknownHeadType { row: usize, name: String },

    // ===== Target =====
    #[error("unknown customer: {0}")]
    UnknownCustomer(String),

    #[error("shipment {shipment_id} is not an inbound shipment of customer {customer_code}")]
    InvalidShipment {
        shipment_id: i64,
        customer_code: String,
    },

    #[error(transparent)]
    Repository(#[from] RepositoryError),

    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

pub type ImportResult<T> = Result<T, ImportError>;

impl From<std::io::Error> for ImportError {
    fn from(err: std::io::Error) -> Self {
        ImportError::FileReadError(err.to_string())
    }
}

impl From<csv::Error> for ImportError {
    fn from(err: csv::Error) -> Self {
        ImportError::CsvParseError(err.to_string())
    }
}

impl From<calamine::Error> for ImportError {
    fn from(err: calamine::Error) -> Self {
        ImportError::ExcelParseError(err.to_string())
    }
}

impl ImportError {
    /// Numbering collisions during commit can be retried as a whole
    pub fn is_numbering_conflict(&self) -> bool {
        matches!(self, ImportError::Repository(e) if e.is_numbering_conflict())
    }
}
