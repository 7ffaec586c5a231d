use serde::{Deserialize, Serialize};
use tokio::fs;
use tracing::info;
use url::Url;

use crate::app::paths::AppPaths;
use crate::error::{Error, Result};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppConfig {
    pub backend: BackendConfig,
    pub widget: WidgetConfig,
    pub ui: UiConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BackendConfig {
    /// Base URL of the agentic server.
    pub base_url: String,
    /// Fixed period of the poll timer.
    pub poll_interval_ms: u64,
    /// Per-request HTTP timeout.
    pub request_timeout_secs: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WidgetConfig {
    /// Show a dedicated region for the agent's final answer.
    pub include_final_answer_box: bool,
    /// Rewrap JSON error reports into the remediation prompt before sending.
    pub rewrite_json_input: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UiConfig {
    pub theme: String,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            backend: BackendConfig {
                base_url: "http://127.0.0.1:8000".to_string(),
                poll_interval_ms: 1000,
                request_timeout_secs: 30,
            },
            widget: WidgetConfig {
                include_final_answer_box: true,
                rewrite_json_input: false,
            },
            ui: UiConfig {
                theme: "dark".to_string(),
            },
        }
    }
}

impl AppConfig {
    pub async fn load(paths: &AppPaths) -> Result<Self> {
        let config_file = paths.config_file();

        if !config_file.exists() {
            info!("Config file not found, creating default configuration");
            let default_config = Self::default();
            default_config.save(paths).await?;
            return Ok(default_config);
        }

        info!("Loading configuration from: {:?}", config_file);

        let config_content = fs::read_to_string(&config_file).await?;
        let config: AppConfig = toml::from_str(&config_content)
            .map_err(|e| Error::Config(config::ConfigError::Message(e.to_string())))?;

        config.validate()?;

        info!("Configuration loaded successfully");
        Ok(config)
    }

    /// Loads from an explicit file, for the `--config` override.
    pub async fn load_from_path(path: &std::path::Path) -> Result<Self> {
        info!("Loading configuration from: {:?}", path);

        let config_content = fs::read_to_string(path).await?;
        let config: AppConfig = toml::from_str(&config_content)
            .map_err(|e| Error::Config(config::ConfigError::Message(e.to_string())))?;

        config.validate()?;
        Ok(config)
    }

    pub async fn save(&self, paths: &AppPaths) -> Result<()> {
        let config_file = paths.config_file();

        info!("Saving configuration to: {:?}", config_file);

        let config_content = toml::to_string_pretty(self)
            .map_err(|e| Error::Config(config::ConfigError::Message(e.to_string())))?;

        fs::write(&config_file, config_content).await?;

        Ok(())
    }

    pub fn validate(&self) -> Result<()> {
        Url::parse(&self.backend.base_url)
            .map_err(|e| Error::validation(format!("Invalid backend base_url: {}", e)))?;

        if self.backend.poll_interval_ms == 0 {
            return Err(Error::validation("poll_interval_ms must be nonzero"));
        }
        if self.backend.request_timeout_secs == 0 {
            return Err(Error::validation("request_timeout_secs must be nonzero"));
        }

        match self.ui.theme.as_str() {
            "dark" | "light" | "matrix" => {}
            other => {
                return Err(Error::validation(format!("Unknown theme: {}", other)));
            }
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = AppConfig::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.backend.poll_interval_ms, 1000);
        assert!(config.widget.include_final_answer_box);
        assert!(!config.widget.rewrite_json_input);
        assert_eq!(config.ui.theme, "dark");
    }

    #[test]
    fn test_config_validation() {
        let mut config = AppConfig::default();
        config.backend.base_url = "not a url".to_string();
        assert!(config.validate().is_err());

        let mut config = AppConfig::default();
        config.backend.poll_interval_ms = 0;
        assert!(config.validate().is_err());

        let mut config = AppConfig::default();
        config.ui.theme = "solarized".to_string();
        assert!(config.validate().is_err());
    }

    #[tokio::test]
    async fn test_load_from_path() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");

        let mut config = AppConfig::default();
        config.backend.poll_interval_ms = 500;
        std::fs::write(&path, toml::to_string_pretty(&config).unwrap()).unwrap();

        let loaded = AppConfig::load_from_path(&path).await.unwrap();
        assert_eq!(loaded.backend.poll_interval_ms, 500);

        // An invalid file is rejected by validation, not silently accepted.
        std::fs::write(&path, "[backend]\nbase_url = \"nope\"\n").unwrap();
        assert!(AppConfig::load_from_path(&path).await.is_err());
    }

    #[test]
    fn test_toml_round_trip() {
        let mut config = AppConfig::default();
        config.widget.rewrite_json_input = true;
        config.backend.base_url = "http://automation.internal:8000".to_string();

        let serialized = toml::to_string_pretty(&config).unwrap();
        let parsed: AppConfig = toml::from_str(&serialized).unwrap();

        assert_eq!(parsed.backend.base_url, "http://automation.internal:8000");
        assert!(parsed.widget.rewrite_json_input);
        assert_eq!(parsed.backend.poll_interval_ms, 1000);
    }
}
