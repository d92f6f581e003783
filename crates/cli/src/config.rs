//! Configuration management for the CLI

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use crate::output::OutputFormat;

/// CLI configuration
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct Config {
    /// Directory holding the model collection artifacts
    pub model_dir: Option<PathBuf>,
    /// Default output format (`table` or `json`)
    pub default_format: Option<String>,
}

impl Config {
    /// Load configuration from the default file, if present
    pub fn load() -> Result<Self> {
        match Self::config_path() {
            Some(path) => Self::load_from(&path),
            None => Ok(Self::default()),
        }
    }

    /// Load configuration from `path`; a missing file yields defaults
    pub fn load_from(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Ok(Self::default());
        }

        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file {}", path.display()))?;

        serde_json::from_str(&content).context("Failed to parse config file")
    }

    /// Model directory: command line, then config file, then `./models`
    pub fn resolve_model_dir(&self, flag: Option<PathBuf>) -> PathBuf {
        flag.or_else(|| self.model_dir.clone())
            .unwrap_or_else(|| PathBuf::from("./models"))
    }

    /// Output format: command line, then config file, then table
    pub fn resolve_format(&self, flag: Option<OutputFormat>) -> Result<OutputFormat> {
        if let Some(format) = flag {
            return Ok(format);
        }
        match self.default_format.as_deref() {
            None => Ok(OutputFormat::default()),
            Some(name) => name.parse(),
        }
    }

    /// Get the configuration file path
    fn config_path() -> Option<PathBuf> {
        let home = dirs_next::home_dir()?;
        Some(home.join(".config").join("gradecast").join("config.json"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_missing_file_defaults() {
        let temp_dir = TempDir::new().unwrap();
        let config = Config::load_from(&temp_dir.path().join("config.json")).unwrap();
        assert!(config.model_dir.is_none());
        assert_eq!(config.resolve_model_dir(None), PathBuf::from("./models"));
        assert_eq!(config.resolve_format(None).unwrap(), OutputFormat::Table);
    }

    #[test]
    fn test_file_values_and_flag_precedence() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("config.json");
        std::fs::write(
            &path,
            r#"{ "model_dir": "/srv/models", "default_format": "json" }"#,
        )
        .unwrap();

        let config = Config::load_from(&path).unwrap();
        assert_eq!(config.resolve_model_dir(None), PathBuf::from("/srv/models"));
        assert_eq!(
            config.resolve_model_dir(Some(PathBuf::from("other"))),
            PathBuf::from("other")
        );
        assert_eq!(config.resolve_format(None).unwrap(), OutputFormat::Json);
        assert_eq!(
            config.resolve_format(Some(OutputFormat::Table)).unwrap(),
            OutputFormat::Table
        );
    }

    #[test]
    fn test_invalid_file() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("config.json");
        std::fs::write(&path, "not json").unwrap();
        assert!(Config::load_from(&path).is_err());

        let config = Config {
            model_dir: None,
            default_format: Some("yaml".to_string()),
        };
        assert!(config.resolve_format(None).is_err());
    }
}
