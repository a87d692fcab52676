// ==========================================
// Bedna workflow - application state
// ==========================================
// One shared SQLite connection, repositories on top of it,
// api instances wired from the repositories.
// ==========================================

use std::sync::{Arc, Mutex};

use rusqlite::Connection;

use crate::api::{
    CatalogApi, CrateApi, DispatchApi, HistoryApi, ImportApi, OrderApi, ReferenceValidator,
    ShipmentApi,
};
use crate::config::{ConfigManager, WorkflowConfigReader};
use crate::db::{configure_sqlite_connection, init_schema};
use crate::importer::ImportPipeline;
use crate::repository::{
    ActionLogRepository, CatalogRepository, CustomerRepository, OrderRepository, ShipmentRepository,
};

/// Every api instance plus the shared resources they were built from
pub struct AppState {
    pub db_path: String,

    pub catalog_api: Arc<CatalogApi>,
    pub shipment_api: Arc<ShipmentApi>,
    pub order_api: Arc<OrderApi>,
    pub crate_api: Arc<CrateApi>,
    pub dispatch_api: Arc<DispatchApi>,
    pub import_api: Arc<ImportApi>,
    pub history_api: Arc<HistoryApi>,

    /// Settings store (import limits, numbering retries, rounding)
    pub config: Arc<ConfigManager>,
}

impl AppState {
    /// Open (or create) the database at `db_path` and wire every api
    ///
    /// The schema is created on first use.
    pub fn new(db_path: String) -> Result<Self, String> {
        tracing::info!(db_path = %db_path, "initializing app state");

        let conn = Connection::open(&db_path).map_err(|e| format!("cannot open database: {}", e))?;
        let mut state = Self::from_connection(conn)?;
        state.db_path = db_path;
        Ok(state)
    }

    /// Wire the apps over an already opened connection (in-memory databases in tests)
    pub fn from_connection(conn: Connection) -> Result<Self, String> {
        configure_sqlite_connection(&conn).map_err(|e| format!("cannot configure database: {}", e))?;
        init_schema(&conn).map_err(|e| format!("cannot initialize schema: {}", e))?;
        let conn = Arc::new(Mutex::new(conn));

        // ==========================================
        // Repositories
        // ==========================================
        let customer_repo = Arc::new(CustomerRepository::new(conn.clone()));
        let catalog_repo = Arc::new(CatalogRepository::new(conn.clone()));
        let shipment_repo = Arc::new(ShipmentRepository::new(conn.clone()));
        let order_repo = Arc::new(OrderRepository::new(conn.clone()));
        let action_log_repo = Arc::new(ActionLogRepository::new(conn.clone()));

        let config = Arc::new(
            ConfigManager::from_connection(conn.clone())
                .map_err(|e| format!("cannot create ConfigManager: {}", e))?,
        );
        let config_reader: Arc<dyn WorkflowConfigReader> = config.clone();

        let validator = Arc::new(ReferenceValidator::new(
            customer_repo.clone(),
            catalog_repo.clone(),
            shipment_repo.clone(),
            order_repo.clone(),
        ));

        // ==========================================
        // Apis
        // ==========================================
        let catalog_api = Arc::new(CatalogApi::new(customer_repo.clone(), catalog_repo.clone()));
        let shipment_api = Arc::new(ShipmentApi::new(
            shipment_repo,
            customer_repo,
            validator.clone(),
            config_reader.clone(),
        ));
        let order_api = Arc::new(OrderApi::new(
            order_repo.clone(),
            catalog_repo.clone(),
            validator.clone(),
            config_reader.clone(),
        ));
        let crate_api = Arc::new(CrateApi::new(
            order_repo.clone(),
            catalog_repo,
            validator.clone(),
            config_reader.clone(),
        ));
        let dispatch_api = Arc::new(DispatchApi::new(order_repo, validator));
        let import_api = Arc::new(ImportApi::new(Arc::new(ImportPipeline::new(
            conn,
            config_reader,
        ))));
        let history_api = Arc::new(HistoryApi::new(action_log_repo));

        tracing::info!("app state ready");
        Ok(Self {
            db_path: String::new(),
            catalog_api,
            shipment_api,
            order_api,
            crate_api,
            dispatch_api,
            import_api,
            history_api,
            config,
        })
    }

    pub fn db_path(&self) -> &str {
        &self.db_path
    }
}

// ==========================================
// Default database path
// ==========================================

/// `BEDNA_DB_PATH` when set, otherwise `<data dir>/bedna-workflow/bedna.db`
/// (`./bedna.db` when no data directory is known)
pub fn get_default_db_path() -> String {
    use std::path::PathBuf;

    if let Ok(path) = std::env::var("BEDNA_DB_PATH") {
        let trimmed = path.trim();
        if !trimmed.is_empty() {
            return trimmed.to_string();
        }
    }

    let mut path = PathBuf::from("./bedna.db");
    if let Some(data_dir) = dirs::data_dir() {
        let dir = data_dir.join("bedna-workflow");
        if std::fs::create_dir_all(&dir).is_ok() {
            path = dir.join("bedna.db");
        }
    }
    path.to_string_lossy().to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_get_default_db_path() {
        let path = get_default_db_path();
        assert!(!path.is_empty());
        assert!(path.ends_with(".db"));
    }

    #[test]
    fn test_in_memory_state_is_usable() {
        let state = AppState::from_connection(Connection::open_in_memory().unwrap()).unwrap();
        assert!(state.catalog_api.list_customers().unwrap().is_empty());
        assert_eq!(state.import_api.supported_formats(), vec!["EUR", "RCH", "SPX"]);
    }
}
