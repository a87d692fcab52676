// ==========================================
// Bedna workflow - import layer
// ==========================================
// Customer spreadsheets (Excel, CSV) -> canonical rows -> ImportPlan
// -> one committed batch of orders and crates.
// ==========================================

pub mod data_cleaner;
pub mod error;
pub mod file_parser;
pub mod header_normalizer;
pub mod import_strategy;
pub mod pipeline;
pub mod reconciler;
pub mod spreadsheet_importer;
pub mod strategies;

pub use data_cleaner::DataCleaner;
pub use error::{ImportError, ImportResult};
pub use file_parser::{CsvParser, ExcelParser, FileParser, RawSheet, UniversalFileParser};
pub use header_normalizer::HeaderNormalizer;
pub use import_strategy::{ColumnSpec, ImportStrategy, SheetRow, StrategyRegistry};
pub use pipeline::ImportPipeline;
pub use reconciler::{CatalogLookup, ImportReconciler, Reconciliation};
pub use spreadsheet_importer::{SpreadsheetImporter, SpreadsheetImporterImpl};
pub use strategies::{EurStrategy, RchStrategy, SpxStrategy};
