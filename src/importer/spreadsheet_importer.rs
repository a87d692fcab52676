// ==========================================
// Bedna workflow - async spreadsheet importer
// ==========================================
// Async facade over ImportPipeline for callers on a tokio runtime.
// Parsing and the SQLite commit run on the blocking pool.
// ==========================================

use crate::domain::import::ImportReport;
use crate::importer::error::{ImportError, ImportResult};
use crate::importer::pipeline::ImportPipeline;
use async_trait::async_trait;
use futures::future::join_all;
use std::path::{Path, PathBuf};
use std::sync::Arc;

#[async_trait]
pub trait SpreadsheetImporter: Send + Sync {
    /// Parse and reconcile a file without writing
    async fn preview_file(&self, customer_code: &str, file_path: &Path) -> ImportResult<ImportReport>;

    /// Import one file into an inbound shipment
    ///
    /// # Returns
    /// - Ok(report): `report.committed` is false when the sheet had errors
    /// - Err: file, format, customer or shipment problems, database failures
    async fn import_file(
        &self,
        customer_code: &str,
        shipment_in_id: i64,
        file_path: &Path,
        actor: &str,
    ) -> ImportResult<ImportReport>;

    /// Import several files; each one commits (or aborts) on its own
    async fn import_files(
        &self,
        customer_code: &str,
        shipment_in_id: i64,
        file_paths: &[PathBuf],
        actor: &str,
    ) -> Vec<ImportResult<ImportReport>>;
}

pub struct SpreadsheetImporterImpl {
    pipeline: Arc<ImportPipeline>,
}

impl SpreadsheetImporterImpl {
    pub fn new(pipeline: Arc<ImportPipeline>) -> Self {
        Self { pipeline }
    }
}

#[async_trait]
impl SpreadsheetImporter for SpreadsheetImporterImpl {
    async fn preview_file(&self, customer_code: &str, file_path: &Path) -> ImportResult<ImportReport> {
        let pipeline = self.pipeline.clone();
        let code = customer_code.to_string();
        let path = file_path.to_path_buf();
        tokio::task::spawn_blocking(move || pipeline.preview_file(&code, &path))
            .await
            .map_err(|e| ImportError::Other(e.into()))?
    }

    async fn import_file(
        &self,
        customer_code: &str,
        shipment_in_id: i64,
        file_path: &Path,
        actor: &str,
    ) -> ImportResult<ImportReport> {
        let pipeline = self.pipeline.clone();
        let code = customer_code.to_string();
        let path = file_path.to_path_buf();
        let actor = actor.to_string();
        tokio::task::spawn_blocking(move || pipeline.import_file(&code, shipment_in_id, &path, &actor))
            .await
            .map_err(|e| ImportError::Other(e.into()))?
    }

    async fn import_files(
        &self,
        customer_code: &str,
        shipment_in_id: i64,
        file_paths: &[PathBuf],
        actor: &str,
    ) -> Vec<ImportResult<ImportReport>> {
        let tasks = file_paths
            .iter()
            .map(|path| self.import_file(customer_code, shipment_in_id, path, actor));
        join_all(tasks).await
    }
}
