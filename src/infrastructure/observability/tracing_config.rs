use crate::presentation::config::Settings;

pub const DEFAULT_LOG_FILTER: &str = "info,fin_analyzer=debug,tower_http=debug";

pub struct TracingConfig {
    pub environment: String,
    pub json_format: bool,
    pub filter: String,
}

impl TracingConfig {
    pub fn from_settings(settings: &Settings) -> Self {
        Self {
            environment: settings.environment.to_string(),
            json_format: settings.logging.json,
            filter: settings
                .logging
                .level
                .clone()
                .unwrap_or_else(|| DEFAULT_LOG_FILTER.to_string()),
        }
    }
}

impl Default for TracingConfig {
    fn default() -> Self {
        Self {
            environment: "local".to_string(),
            json_format: false,
            filter: DEFAULT_LOG_FILTER.to_string(),
        }
    }
}
