//! Configuration management for the Schema Registry
//!
//! Supports loading configuration from:
//! - Default values
//! - Config file (registry.toml)
//! - Environment variables (REGISTRY_*)
//!
//! ## Example config file (registry.toml):
//! ```toml
//! [registry]
//! default_compatibility = "BACKWARD"
//!
//! [validation]
//! max_schema_bytes = 1048576
//! strict_names = true
//! ```

use config_crate::{Config, Environment, File};
use serde::{Deserialize, Serialize};

use crate::compatibility::CompatibilityLevel;
use crate::error::Result;
use crate::parser;

/// Main configuration for the schema registry
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RegistryConfig {
    /// Registry settings
    #[serde(default)]
    pub registry: RegistrySection,

    /// Validation settings
    #[serde(default)]
    pub validation: ValidationSection,
}

/// Registry settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RegistrySection {
    /// Compatibility level for subjects without an explicit override
    #[serde(default)]
    pub default_compatibility: CompatibilityLevel,
}

/// Validation settings applied to every submitted schema
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ValidationSection {
    /// Largest accepted schema source in bytes (0 disables the limit)
    #[serde(default = "default_max_schema_bytes")]
    pub max_schema_bytes: usize,

    /// Require record and enum names to be dot-separated identifiers
    #[serde(default = "default_true")]
    pub strict_names: bool,
}

// Default value functions
fn default_max_schema_bytes() -> usize {
    parser::DEFAULT_MAX_SCHEMA_BYTES
}

fn default_true() -> bool {
    true
}

impl Default for RegistrySection {
    fn default() -> Self {
        Self {
            default_compatibility: CompatibilityLevel::default(),
        }
    }
}

impl Default for ValidationSection {
    fn default() -> Self {
        Self {
            max_schema_bytes: default_max_schema_bytes(),
            strict_names: true,
        }
    }
}

impl RegistryConfig {
    /// Load configuration from default locations
    pub fn load() -> Result<Self> {
        Self::load_from(None)
    }

    /// Load configuration from a specific file
    pub fn load_from(config_path: Option<&str>) -> Result<Self> {
        let mut builder = Config::builder();

        // Load from default locations
        let config_locations = ["registry.toml", ".registry.toml"];
        for location in config_locations {
            builder = builder.add_source(File::with_name(location).required(false));
        }

        // Load from specified path
        if let Some(path) = config_path {
            builder = builder.add_source(File::with_name(path).required(true));
        }

        // Load from environment variables (REGISTRY_*)
        builder = builder.add_source(
            Environment::with_prefix("REGISTRY")
                .separator("__")
                .try_parsing(true),
        );

        let config = builder.build()?;
        Ok(config.try_deserialize()?)
    }

    /// Save configuration to a file
    pub fn save(&self, path: &str) -> std::io::Result<()> {
        let content = toml::to_string_pretty(self)
            .map_err(|e| std::io::Error::new(std::io::ErrorKind::InvalidData, e))?;
        std::fs::write(path, content)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = RegistryConfig::default();
        assert_eq!(
            config.registry.default_compatibility,
            CompatibilityLevel::Backward
        );
        assert_eq!(config.validation.max_schema_bytes, 1024 * 1024);
        assert!(config.validation.strict_names);
    }

    #[test]
    fn test_serialize_config() {
        let config = RegistryConfig::default();
        let toml_str = toml::to_string_pretty(&config).unwrap();
        assert!(toml_str.contains("[registry]"));
        assert!(toml_str.contains("[validation]"));
        assert!(toml_str.contains("default_compatibility = \"BACKWARD\""));
    }

    #[test]
    fn test_save_and_load_round_trip() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("registry.toml");
        let path_str = path.to_str().unwrap();

        let mut config = RegistryConfig::default();
        config.registry.default_compatibility = CompatibilityLevel::Full;
        config.validation.strict_names = false;
        config.save(path_str).unwrap();

        let loaded = RegistryConfig::load_from(Some(path_str)).unwrap();
        assert_eq!(
            loaded.registry.default_compatibility,
            CompatibilityLevel::Full
        );
        assert!(!loaded.validation.strict_names);
        assert_eq!(loaded.validation.max_schema_bytes, 1024 * 1024);
    }
}
