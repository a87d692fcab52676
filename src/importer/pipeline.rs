// ==========================================
// Bedna workflow - import pipeline
// ==========================================
// Flow:
// 1) resolve customer -> strategy, check the inbound shipment
// 2) read a bounded prefix of the sheet (import.max_rows)
// 3) strategy.parse -> rows / preview / errors / warnings
// 4) reconcile rows into an ImportPlan
// 5) any error: stop, nothing written
//    otherwise: commit the plan in one transaction
// ==========================================

use crate::config::WorkflowConfigReader;
use crate::domain::customer::Customer;
use crate::domain::import::{ImportReport, ParseOutcome};
use crate::domain::types::ShipmentDirection;
use crate::importer::error::{ImportError, ImportResult};
use crate::importer::file_parser::{FileParser, RawSheet, UniversalFileParser};
use crate::importer::import_strategy::{ImportStrategy, StrategyRegistry};
use crate::importer::reconciler::ImportReconciler;
use crate::repository::{
    with_numbering_retry, CatalogRepository, CustomerRepository, OrderRepository,
    ShipmentRepository,
};
use rusqlite::Connection;
use std::path::Path;
use std::sync::{Arc, Mutex};
use std::time::Instant;
use tracing::{info, warn};
use uuid::Uuid;

pub struct ImportPipeline {
    parser: UniversalFileParser,
    registry: StrategyRegistry,
    customer_repo: CustomerRepository,
    catalog_repo: CatalogRepository,
    shipment_repo: ShipmentRepository,
    order_repo: OrderRepository,
    config: Arc<dyn WorkflowConfigReader>,
}

impl ImportPipeline {
    pub fn new(conn: Arc<Mutex<Connection>>, config: Arc<dyn WorkflowConfigReader>) -> Self {
        Self {
            parser: UniversalFileParser,
            registry: StrategyRegistry::default(),
            customer_repo: CustomerRepository::new(conn.clone()),
            catalog_repo: CatalogRepository::new(conn.clone()),
            shipment_repo: ShipmentRepository::new(conn.clone()),
            order_repo: OrderRepository::new(conn),
            config,
        }
    }

    pub fn with_registry(mut self, registry: StrategyRegistry) -> Self {
        self.registry = registry;
        self
    }

    pub fn registry(&self) -> &StrategyRegistry {
        &self.registry
    }

    // ==========================================
    // Entry points
    // ==========================================

    /// Parse and reconcile without writing anything
    pub fn preview_file(&self, customer_code: &str, file_path: &Path) -> ImportResult<ImportReport> {
        let started = Instant::now();
        let (customer, strategy) = self.resolve_customer(customer_code)?;
        let sheet = self.read_sheet(file_path)?;
        self.run(&customer, strategy, None, &sheet, "preview", started)
    }

    /// Parse, reconcile and (error-free only) commit
    pub fn import_file(
        &self,
        customer_code: &str,
        shipment_in_id: i64,
        file_path: &Path,
        actor: &str,
    ) -> ImportResult<ImportReport> {
        let started = Instant::now();
        let (customer, strategy) = self.resolve_customer(customer_code)?;
        self.check_shipment(&customer, shipment_in_id)?;
        let sheet = self.read_sheet(file_path)?;
        info!(
            customer = %customer.code,
            shipment_in_id,
            file = %file_path.display(),
            rows = sheet.rows.len(),
            "import started"
        );
        self.run(&customer, strategy, Some(shipment_in_id), &sheet, actor, started)
    }

    /// Same as `import_file` for an already loaded sheet
    pub fn import_sheet(
        &self,
        customer_code: &str,
        shipment_in_id: i64,
        sheet: &RawSheet,
        actor: &str,
    ) -> ImportResult<ImportReport> {
        let started = Instant::now();
        let (customer, strategy) = self.resolve_customer(customer_code)?;
        self.check_shipment(&customer, shipment_in_id)?;
        self.run(&customer, strategy, Some(shipment_in_id), sheet, actor, started)
    }

    // ==========================================
    // Steps
    // ==========================================

    fn resolve_customer(&self, customer_code: &str) -> ImportResult<(Customer, &dyn ImportStrategy)> {
        let customer = self
            .customer_repo
            .find_customer_by_code(customer_code)?
            .ok_or_else(|| ImportError::UnknownCustomer(customer_code.to_string()))?;
        let strategy = self.registry.get(&customer.code)?;
        Ok((customer, strategy))
    }

    fn check_shipment(&self, customer: &Customer, shipment_in_id: i64) -> ImportResult<()> {
        let valid = self
            .shipment_repo
            .find_shipment(shipment_in_id)?
            .map(|s| s.customer_id == customer.id && s.direction == ShipmentDirection::Inbound)
            .unwrap_or(false);
        if valid {
            Ok(())
        } else {
            Err(ImportError::InvalidShipment {
                shipment_id: shipment_in_id,
                customer_code: customer.code.clone(),
            })
        }
    }

    fn read_sheet(&self, file_path: &Path) -> ImportResult<RawSheet> {
        let max_rows = self
            .config
            .import_max_rows()
            .map_err(|e| anyhow::anyhow!("import.max_rows: {}", e))?;
        self.parser.parse_sheet(file_path, max_rows)
    }

    /// `shipment_in_id` None means preview: the plan is built but never committed
    fn run(
        &self,
        customer: &Customer,
        strategy: &dyn ImportStrategy,
        shipment_in_id: Option<i64>,
        sheet: &RawSheet,
        actor: &str,
        started: Instant,
    ) -> ImportResult<ImportReport> {
        let preview_rows = self
            .config
            .import_preview_rows()
            .map_err(|e| anyhow::anyhow!("import.preview_rows: {}", e))?;
        let ParseOutcome {
            rows,
            preview,
            mut errors,
            mut warnings,
        } = strategy.parse(sheet, preview_rows);

        let mut report = ImportReport {
            batch_id: Uuid::new_v4().to_string(),
            customer_code: customer.code.clone(),
            total_rows: sheet.rows.len(),
            orders_created: 0,
            crates_created: 0,
            committed: false,
            errors: Vec::new(),
            warnings: Vec::new(),
            preview,
            elapsed_ms: 0,
        };

        let reconciliation = ImportReconciler::new(&self.catalog_repo, strategy.allows_unknown_specification())
            .build_plan(&report.batch_id, customer, shipment_in_id.unwrap_or(0), &rows)?;
        errors.extend(reconciliation.errors);
        warnings.extend(reconciliation.warnings);
        report.errors = errors;
        report.warnings = warnings;

        match shipment_in_id {
            Some(_) if report.errors.is_empty() => {
                let attempts = self
                    .config
                    .numbering_max_retries()
                    .map_err(|e| anyhow::anyhow!("numbering.max_retries: {}", e))?;
                let plan = &reconciliation.plan;
                let commit = with_numbering_retry(attempts, || self.order_repo.commit_import(plan, actor))?;
                report.orders_created = commit.order_ids.len();
                report.crates_created = commit.crate_ids.len();
                report.committed = true;
            }
            Some(_) => {
                warn!(
                    batch_id = %report.batch_id,
                    errors = report.errors.len(),
                    "import aborted, nothing written"
                );
            }
            None => {
                report.orders_created = reconciliation.plan.orders.len();
                report.crates_created = reconciliation.plan.crate_count();
            }
        }

        report.elapsed_ms = started.elapsed().as_millis();
        info!(
            batch_id = %report.batch_id,
            committed = report.committed,
            orders = report.orders_created,
            crates = report.crates_created,
            errors = report.errors.len(),
            warnings = report.warnings.len(),
            elapsed_ms = report.elapsed_ms as u64,
            "import finished"
        );
        Ok(report)
    }
}
