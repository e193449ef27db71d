//! Configuration for the pipeline
//!
//! Supports loading configuration from:
//! - Default values
//! - Config file (pipeline.toml)
//! - Environment variables (PIPELINE_*)
//!
//! ## Example config file (pipeline.toml):
//! ```toml
//! [resolver]
//! enabled = true
//!
//! [validation]
//! strict_types = false
//!
//! [output]
//! format = "pretty"
//! ```

use config_crate::{Config, ConfigError, Environment, File};
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Main configuration for the pipeline CLIs
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct PipelineConfig {
    /// Reference resolver settings
    #[serde(default)]
    pub resolver: ResolverConfig,

    /// Validation settings
    #[serde(default)]
    pub validation: ValidationConfig,

    /// Output settings
    #[serde(default)]
    pub output: OutputConfig,
}

/// Reference resolver configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ResolverConfig {
    /// Run the reference resolver as part of the pipeline
    #[serde(default = "default_true")]
    pub enabled: bool,
}

/// Validation configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ValidationConfig {
    /// Enforce declared attribute types on writes
    #[serde(default)]
    pub strict_types: bool,
}

/// Output configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct OutputConfig {
    /// JSON rendering of the processed document
    #[serde(default)]
    pub format: OutputFormat,
}

/// Output format for JSON
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum OutputFormat {
    #[default]
    Pretty,
    Compact,
}

fn default_true() -> bool {
    true
}

impl Default for ResolverConfig {
    fn default() -> Self {
        Self { enabled: true }
    }
}

impl PipelineConfig {
    /// Load configuration from default locations
    pub fn load() -> Result<Self, ConfigError> {
        Self::load_from(None)
    }

    /// Load configuration, preferring a specific file when given
    pub fn load_from(config_path: Option<&Path>) -> Result<Self, ConfigError> {
        let mut builder = Config::builder();

        builder = builder.add_source(File::with_name("pipeline").required(false));

        if let Some(path) = config_path {
            builder = builder.add_source(File::from(path.to_path_buf()).required(true));
        }

        builder = builder.add_source(
            Environment::with_prefix("PIPELINE")
                .separator("__")
                .try_parsing(true),
        );

        builder.build()?.try_deserialize()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_config_defaults() {
        let config = PipelineConfig::default();
        assert!(config.resolver.enabled);
        assert!(!config.validation.strict_types);
        assert_eq!(config.output.format, OutputFormat::Pretty);
    }

    #[test]
    fn test_config_from_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("pipeline.toml");
        std::fs::write(
            &path,
            "[resolver]\nenabled = false\n\n[validation]\nstrict_types = true\n",
        )
        .unwrap();

        let config = PipelineConfig::load_from(Some(&path)).unwrap();
        assert!(!config.resolver.enabled);
        assert!(config.validation.strict_types);
    }
}
