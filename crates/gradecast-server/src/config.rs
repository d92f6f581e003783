//! Service configuration

use anyhow::{Context, Result};
use serde::Deserialize;
use std::path::PathBuf;

/// Service configuration
#[derive(Debug, Clone, Deserialize)]
pub struct ServerConfig {
    /// Name attached to structured log events
    #[serde(default = "default_instance_name")]
    pub instance_name: String,

    /// Port for the prediction, health and metrics API
    #[serde(default = "default_api_port")]
    pub api_port: u16,

    /// Directory holding the model collection artifacts
    #[serde(default = "default_model_dir")]
    pub model_dir: PathBuf,
}

fn default_instance_name() -> String {
    std::env::var("HOSTNAME").unwrap_or_else(|_| "unknown".to_string())
}

fn default_api_port() -> u16 {
    8080
}

fn default_model_dir() -> PathBuf {
    PathBuf::from("./models")
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            instance_name: default_instance_name(),
            api_port: default_api_port(),
            model_dir: default_model_dir(),
        }
    }
}

impl ServerConfig {
    /// Load configuration from `GRADECAST_*` environment variables
    pub fn load() -> Result<Self> {
        Self::from_source(config::Environment::with_prefix("GRADECAST").try_parsing(true))
    }

    fn from_source<S>(source: S) -> Result<Self>
    where
        S: config::Source + Send + Sync + 'static,
    {
        config::Config::builder()
            .add_source(source)
            .build()
            .context("Failed to read configuration")?
            .try_deserialize()
            .context("Invalid configuration")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn env_source(vars: &[(&str, &str)]) -> config::Environment {
        let map: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        config::Environment::with_prefix("GRADECAST")
            .try_parsing(true)
            .source(Some(map))
    }

    #[test]
    fn test_defaults() {
        let config = ServerConfig::from_source(env_source(&[])).unwrap();
        assert_eq!(config.api_port, 8080);
        assert_eq!(config.model_dir, PathBuf::from("./models"));
    }

    #[test]
    fn test_environment_overrides() {
        let config = ServerConfig::from_source(env_source(&[
            ("GRADECAST_API_PORT", "9191"),
            ("GRADECAST_MODEL_DIR", "/srv/models"),
            ("GRADECAST_INSTANCE_NAME", "web-1"),
        ]))
        .unwrap();
        assert_eq!(config.api_port, 9191);
        assert_eq!(config.model_dir, PathBuf::from("/srv/models"));
        assert_eq!(config.instance_name, "web-1");
    }

    #[test]
    fn test_invalid_port() {
        let result = ServerConfig::from_source(env_source(&[("GRADECAST_API_PORT", "not-a-port")]));
        assert!(result.is_err());
    }
}
