// ==========================================
// Bedna workflow - configuration layer
// ==========================================
// Storage: config_kv table (scope 'global')
// ==========================================

pub mod config_manager;
pub mod workflow_config_trait;

pub use config_manager::{config_keys, ConfigManager};
pub use workflow_config_trait::{StaticConfig, WorkflowConfigReader};
