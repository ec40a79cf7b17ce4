//! Configuration loading
//!
//! Loads generator defaults from environment variables, optionally reading
//! from a .env file first.

use std::{env, path::Path, path::PathBuf};

use tracing::{debug, error, trace, warn};

use crate::datasource::Datasource;
use crate::prelude::PersistGenError;

const DATASOURCE_VAR: &str = "PERSIST_DATASOURCE";
const MODULE_VAR: &str = "PERSIST_MODULE";
const OUTPUT_DIR_VAR: &str = "PERSIST_OUTPUT_DIR";

/// Generator defaults
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GenConfig {
    pub datasource: Datasource,
    /// Module whose sample values are written, if known
    pub module: Option<String>,
    pub output_dir: PathBuf,
}

impl GenConfig {
    /// Load configuration from environment variables
    ///
    /// Expected variables:
    /// - PERSIST_DATASOURCE (default: mysql)
    /// - PERSIST_MODULE (optional)
    /// - PERSIST_OUTPUT_DIR (default: ./generated)
    pub fn from_env() -> Result<Self, PersistGenError> {
        debug!("Loading generator configuration from environment");
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Read configuration through `lookup` instead of the process environment
    pub fn from_lookup<F>(lookup: F) -> Result<Self, PersistGenError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let datasource_str = lookup(DATASOURCE_VAR).unwrap_or_else(|| {
            trace!("PERSIST_DATASOURCE not set, using default");
            Datasource::MySql.identifier().to_string()
        });
        let datasource = datasource_str.parse::<Datasource>().map_err(|e| {
            error!(datasource = ?datasource_str, error = ?e, "Invalid PERSIST_DATASOURCE value");
            PersistGenError::Config(format!(
                "PERSIST_DATASOURCE must be one of {}",
                Datasource::ALL.map(|d| d.identifier()).join(", ")
            ))
        })?;

        let module = lookup(MODULE_VAR).filter(|m| !m.trim().is_empty());
        if module.is_none() {
            trace!("PERSIST_MODULE not set");
        }

        let output_dir = lookup(OUTPUT_DIR_VAR)
            .map(PathBuf::from)
            .unwrap_or_else(|| {
                trace!("PERSIST_OUTPUT_DIR not set, using default");
                PathBuf::from("./generated")
            });

        debug!(datasource = %datasource, module = ?module, output_dir = ?output_dir, "Configuration loaded");

        Ok(Self {
            datasource,
            module,
            output_dir,
        })
    }

    /// Load a .env file and then read configuration from environment
    pub fn load(env_file: &Path) -> Result<Self, PersistGenError> {
        if env_file.exists() {
            debug!(path = ?env_file, "Loading environment file");
            dotenvy::from_path(env_file).map_err(|e| {
                error!(path = ?env_file, error = ?e, "Failed to load environment file");
                PersistGenError::Config(format!("Failed to load {}: {}", env_file.display(), e))
            })?;
        } else {
            warn!(path = ?env_file, "Environment file not found, using existing environment");
        }

        Self::from_env()
    }

    /// Module name, failing when neither the flag nor the environment set one
    pub fn require_module(&self) -> Result<&str, PersistGenError> {
        self.module.as_deref().ok_or_else(|| {
            error!("PERSIST_MODULE environment variable is not set");
            PersistGenError::Config("PERSIST_MODULE or --module is required".to_string())
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup(vars: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let vars: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| vars.get(key).cloned()
    }

    #[test]
    fn test_defaults() {
        let config = GenConfig::from_lookup(lookup(&[])).unwrap();

        assert_eq!(config.datasource, Datasource::MySql);
        assert_eq!(config.module, None);
        assert_eq!(config.output_dir, PathBuf::from("./generated"));
    }

    #[test]
    fn test_custom_values() {
        let config = GenConfig::from_lookup(lookup(&[
            ("PERSIST_DATASOURCE", "postgresql"),
            ("PERSIST_MODULE", "hr"),
            ("PERSIST_OUTPUT_DIR", "out"),
        ]))
        .unwrap();

        assert_eq!(config.datasource, Datasource::PostgreSql);
        assert_eq!(config.require_module().unwrap(), "hr");
        assert_eq!(config.output_dir, PathBuf::from("out"));
    }

    #[test]
    fn test_invalid_datasource() {
        let result = GenConfig::from_lookup(lookup(&[("PERSIST_DATASOURCE", "oracle")]));

        assert!(result.is_err());
        let err = result.unwrap_err();
        assert!(err.to_string().contains("PERSIST_DATASOURCE"));
        assert!(err.to_string().contains("mysql, mssql, postgresql, h2"));
    }

    #[test]
    fn test_missing_module() {
        let config = GenConfig::from_lookup(lookup(&[("PERSIST_MODULE", "  ")])).unwrap();

        let err = config.require_module().unwrap_err();
        assert!(err.to_string().contains("PERSIST_MODULE"));
    }

    #[test]
    fn test_load_env_file() {
        let path = env::temp_dir().join(format!("persistgen-{}.env", std::process::id()));
        std::fs::write(&path, "PERSIST_MODULE=from_file\n").unwrap();

        let config = GenConfig::load(&path).unwrap();
        std::fs::remove_file(&path).unwrap();

        assert_eq!(config.module.as_deref(), Some("from_file"));
    }
}
