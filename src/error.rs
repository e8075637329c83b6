//! Error types for the schema registry

use thiserror::Error;

use crate::compatibility::{CompatibilityLevel, CompatibilityReport};

/// Result type for registry operations
pub type Result<T> = std::result::Result<T, RegistryError>;

/// Schema registry errors
#[derive(Error, Debug)]
pub enum RegistryError {
    #[error("Schema parse error: {0}")]
    Parse(String),

    #[error("Schema for subject '{subject}' is incompatible with version {latest_version} (id {latest_id}) under {level} compatibility: {report}")]
    Incompatible {
        subject: String,
        latest_id: u32,
        latest_version: u32,
        level: CompatibilityLevel,
        report: CompatibilityReport,
    },

    #[error("Schema not found: id {0}")]
    SchemaNotFound(u32),

    #[error("Subject not found: {0}")]
    SubjectNotFound(String),

    #[error("Invalid version {version} for subject '{subject}': valid range is 1..={max}")]
    InvalidVersion {
        subject: String,
        version: u32,
        max: u32,
    },

    #[error("Invalid subject: {0}")]
    InvalidSubject(String),

    #[error("Config error: {0}")]
    Config(#[from] config_crate::ConfigError),
}
