// ==========================================
// Bedna workflow - import API
// ==========================================
// Thin facade over ImportPipeline. A sheet with errors is not an
// api error: the report comes back with committed = false.
// ==========================================

use std::path::Path;
use std::sync::Arc;

use crate::api::error::ApiResult;
use crate::domain::import::ImportReport;
use crate::importer::{ImportPipeline, RawSheet, SpreadsheetImporterImpl};

pub struct ImportApi {
    pipeline: Arc<ImportPipeline>,
}

impl ImportApi {
    pub fn new(pipeline: Arc<ImportPipeline>) -> Self {
        Self { pipeline }
    }

    /// Parse and reconcile without writing
    pub fn preview_file(&self, customer_code: &str, file_path: &Path) -> ApiResult<ImportReport> {
        Ok(self.pipeline.preview_file(customer_code, file_path)?)
    }

    /// Import a customer spreadsheet into an inbound shipment
    ///
    /// # Errors
    /// - NotFound: file or customer missing
    /// - InvalidInput: shipment is not an inbound shipment of the customer
    /// - ImportFailed: unreadable file or unknown customer format
    pub fn import_file(
        &self,
        customer_code: &str,
        shipment_in_id: i64,
        file_path: &Path,
        actor: &str,
    ) -> ApiResult<ImportReport> {
        Ok(self
            .pipeline
            .import_file(customer_code, shipment_in_id, file_path, actor)?)
    }

    pub fn import_sheet(
        &self,
        customer_code: &str,
        shipment_in_id: i64,
        sheet: &RawSheet,
        actor: &str,
    ) -> ApiResult<ImportReport> {
        Ok(self
            .pipeline
            .import_sheet(customer_code, shipment_in_id, sheet, actor)?)
    }

    /// Customer codes with a registered spreadsheet layout
    pub fn supported_formats(&self) -> Vec<String> {
        self.pipeline
            .registry()
            .codes()
            .into_iter()
            .map(str::to_string)
            .collect()
    }

    /// Async importer sharing this pipeline
    pub fn async_importer(&self) -> SpreadsheetImporterImpl {
        SpreadsheetImporterImpl::new(self.pipeline.clone())
    }
}
