use std::sync::Arc;
use std::time::Duration;

use crate::app::config::AppConfig;
use crate::chat::{HttpBackend, WidgetOptions};
use crate::error::Result;

/// Shared application state: the loaded configuration and the backend client
/// built from it. Constructed once at startup and handed to the UI.
pub struct AppState {
    config: AppConfig,
    backend: Arc<HttpBackend>,
}

impl AppState {
    pub fn new(config: AppConfig) -> Result<Self> {
        let backend = Arc::new(HttpBackend::new(
            &config.backend.base_url,
            Duration::from_secs(config.backend.request_timeout_secs),
        )?);

        Ok(Self { config, backend })
    }

    pub fn config(&self) -> &AppConfig {
        &self.config
    }

    pub fn backend(&self) -> Arc<HttpBackend> {
        self.backend.clone()
    }

    pub fn widget_options(&self) -> WidgetOptions {
        WidgetOptions {
            include_final_answer_box: self.config.widget.include_final_answer_box,
            rewrite_json_input: self.config.widget.rewrite_json_input,
        }
    }

    pub fn poll_interval(&self) -> Duration {
        Duration::from_millis(self.config.backend.poll_interval_ms)
    }
}
