// ==========================================
// Bedna workflow - configuration read trait
// ==========================================
// Read-only settings consumed by the api layer.
// Implemented by ConfigManager (config_kv) and StaticConfig.
// ==========================================

use crate::engine::pricing::RoundingPolicy;
use std::collections::HashMap;
use std::error::Error;

pub trait WorkflowConfigReader: Send + Sync {
    /// Data rows read from a sheet before truncation
    ///
    /// # Default
    /// - 250
    fn import_max_rows(&self) -> Result<usize, Box<dyn Error>>;

    /// Canonical rows rendered in the import preview
    ///
    /// # Default
    /// - 10
    fn import_preview_rows(&self) -> Result<usize, Box<dyn Error>>;

    /// Attempts for a creation that hit a numbering conflict
    ///
    /// # Default
    /// - 3
    fn numbering_max_retries(&self) -> Result<u32, Box<dyn Error>>;

    /// Rounding boundary for the customer's cost computation
    ///
    /// # Default
    /// - AGGREGATE
    fn rounding_policy(&self, customer_code: &str) -> Result<RoundingPolicy, Box<dyn Error>>;
}

// ==========================================
// StaticConfig - in-memory settings
// ==========================================
#[derive(Debug, Clone)]
pub struct StaticConfig {
    pub import_max_rows: usize,
    pub import_preview_rows: usize,
    pub numbering_max_retries: u32,
    pub rounding: HashMap<String, RoundingPolicy>,
}

impl Default for StaticConfig {
    fn default() -> Self {
        Self {
            import_max_rows: 250,
            import_preview_rows: 10,
            numbering_max_retries: 3,
            rounding: HashMap::new(),
        }
    }
}

impl WorkflowConfigReader for StaticConfig {
    fn import_max_rows(&self) -> Result<usize, Box<dyn Error>> {
        Ok(self.import_max_rows)
    }

    fn import_preview_rows(&self) -> Result<usize, Box<dyn Error>> {
        Ok(self.import_preview_rows)
    }

    fn numbering_max_retries(&self) -> Result<u32, Box<dyn Error>> {
        Ok(self.numbering_max_retries)
    }

    fn rounding_policy(&self, customer_code: &str) -> Result<RoundingPolicy, Box<dyn Error>> {
        Ok(self
            .rounding
            .get(&customer_code.trim().to_uppercase())
            .copied()
            .unwrap_or_default())
    }
}
