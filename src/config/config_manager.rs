// ==========================================
// Bedna workflow - configuration manager
// ==========================================
// Typed getters over config_kv (scope 'global') with defaults.
// ==========================================

use crate::config::workflow_config_trait::WorkflowConfigReader;
use crate::db::open_sqlite_connection;
use crate::engine::pricing::RoundingPolicy;
use rusqlite::{params, Connection, OptionalExtension};
use serde_json::json;
use std::collections::BTreeMap;
use std::error::Error;
use std::sync::{Arc, Mutex};
use tracing::warn;

// ==========================================
// ConfigManager
// ==========================================
pub struct ConfigManager {
    conn: Arc<Mutex<Connection>>,
}

impl ConfigManager {
    pub fn new(db_path: &str) -> Result<Self, Box<dyn Error>> {
        let conn = open_sqlite_connection(db_path)?;
        Ok(Self {
            conn: Arc::new(Mutex::new(conn)),
        })
    }

    /// Share an existing connection (PRAGMAs re-applied, idempotent)
    pub fn from_connection(conn: Arc<Mutex<Connection>>) -> Result<Self, Box<dyn Error>> {
        {
            let guard = conn.lock().map_err(|e| format!("lock failed: {}", e))?;
            crate::db::configure_sqlite_connection(&guard)?;
        }
        Ok(Self { conn })
    }

    /// Raw value of a global key
    pub fn get_global_config_value(&self, key: &str) -> Result<Option<String>, Box<dyn Error>> {
        let conn = self.conn.lock().map_err(|e| format!("lock failed: {}", e))?;
        let value = conn
            .query_row(
                "SELECT value FROM config_kv WHERE scope_id = 'global' AND key = ?1",
                params![key],
                |row| row.get::<_, String>(0),
            )
            .optional()?;
        Ok(value)
    }

    /// Upsert a global key
    pub fn set_value(&self, key: &str, value: &str) -> Result<(), Box<dyn Error>> {
        let conn = self.conn.lock().map_err(|e| format!("lock failed: {}", e))?;
        conn.execute(
            r#"
            INSERT INTO config_kv (scope_id, key, value) VALUES ('global', ?1, ?2)
            ON CONFLICT(scope_id, key) DO UPDATE SET value = ?2, updated_at = datetime('now')
            "#,
            params![key, value],
        )?;
        Ok(())
    }

    /// All global keys as a JSON object
    pub fn get_config_snapshot(&self) -> Result<String, Box<dyn Error>> {
        let conn = self.conn.lock().map_err(|e| format!("lock failed: {}", e))?;
        let mut stmt =
            conn.prepare("SELECT key, value FROM config_kv WHERE scope_id = 'global' ORDER BY key")?;

        let mut config_map: BTreeMap<String, String> = BTreeMap::new();
        let rows = stmt.query_map([], |row| Ok((row.get::<_, String>(0)?, row.get::<_, String>(1)?)))?;
        for row in rows {
            let (key, value) = row?;
            config_map.insert(key, value);
        }
        Ok(serde_json::to_string(&json!(config_map))?)
    }

    fn get_parsed<T: std::str::FromStr>(&self, key: &str, default: T) -> Result<T, Box<dyn Error>> {
        match self.get_global_config_value(key)? {
            Some(raw) => match raw.trim().parse::<T>() {
                Ok(v) => Ok(v),
                Err(_) => {
                    warn!(key, value = %raw, "unparseable config value, using default");
                    Ok(default)
                }
            },
            None => Ok(default),
        }
    }
}

impl WorkflowConfigReader for ConfigManager {
    fn import_max_rows(&self) -> Result<usize, Box<dyn Error>> {
        self.get_parsed(config_keys::IMPORT_MAX_ROWS, 250)
    }

    fn import_preview_rows(&self) -> Result<usize, Box<dyn Error>> {
        self.get_parsed(config_keys::IMPORT_PREVIEW_ROWS, 10)
    }

    fn numbering_max_retries(&self) -> Result<u32, Box<dyn Error>> {
        self.get_parsed(config_keys::NUMBERING_MAX_RETRIES, 3)
    }

    fn rounding_policy(&self, customer_code: &str) -> Result<RoundingPolicy, Box<dyn Error>> {
        let key = config_keys::pricing_rounding(customer_code);
        Ok(self
            .get_global_config_value(&key)?
            .and_then(|raw| RoundingPolicy::from_db_str(&raw))
            .unwrap_or_default())
    }
}

// ==========================================
// Config keys
// ==========================================
pub mod config_keys {
    pub const IMPORT_MAX_ROWS: &str = "import.max_rows";
    pub const IMPORT_PREVIEW_ROWS: &str = "import.preview_rows";
    pub const NUMBERING_MAX_RETRIES: &str = "numbering.max_retries";

    /// pricing.rounding/<CUSTOMER_CODE>
    pub fn pricing_rounding(customer_code: &str) -> String {
        format!("pricing.rounding/{}", customer_code.trim().to_uppercase())
    }
}
