use clap::ValueEnum;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::fs;
use std::path::{Path, PathBuf};

use crate::constants::{DEFAULT_DB_PATH, DEFAULT_INPUT_PATH, DEFAULT_TABLE_NAME};
use crate::error::{EtlError, Result};

/// How the pipeline reacts to component and per-record failures
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum ValidationMode {
    /// Log failures and keep going; records that fail decoding get null flags
    #[default]
    Lenient,
    /// Fail the run on the first failed stage, itemizing any failed records
    Strict,
}

impl fmt::Display for ValidationMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ValidationMode::Lenient => f.write_str("lenient"),
            ValidationMode::Strict => f.write_str("strict"),
        }
    }
}

/// Configuration for a single pipeline run
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EtlConfig {
    pub input_path: PathBuf,
    pub db_path: PathBuf,
    pub table_name: String,
    pub mode: ValidationMode,
}

impl Default for EtlConfig {
    fn default() -> Self {
        Self {
            input_path: PathBuf::from(DEFAULT_INPUT_PATH),
            db_path: PathBuf::from(DEFAULT_DB_PATH),
            table_name: DEFAULT_TABLE_NAME.to_string(),
            mode: ValidationMode::default(),
        }
    }
}

impl EtlConfig {
    /// Load a configuration file; keys left out fall back to the defaults
    pub fn load<P: AsRef<Path>>(config_path: P) -> Result<Self> {
        let config_path = config_path.as_ref();
        let config_content = fs::read_to_string(config_path).map_err(|e| {
            EtlError::Config(format!(
                "Failed to read config file '{}': {}",
                config_path.display(),
                e
            ))
        })?;

        let config: EtlConfig = toml::from_str(&config_content)?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<()> {
        if self.input_path.as_os_str().is_empty() {
            return Err(EtlError::Config("input_path must not be empty".into()));
        }
        if self.db_path.as_os_str().is_empty() {
            return Err(EtlError::Config("db_path must not be empty".into()));
        }
        if self.table_name.trim().is_empty() {
            return Err(EtlError::Config("table_name must not be empty".into()));
        }
        Ok(())
    }
}
