use fin_analyzer::infrastructure::observability::{
    DEFAULT_LOG_FILTER, REQUEST_ID_HEADER, RequestId, TracingConfig,
};
use fin_analyzer::presentation::config::{Environment, Settings};

#[test]
fn given_request_id_header_constant_when_accessed_then_returns_correct_value() {
    assert_eq!(REQUEST_ID_HEADER, "x-request-id");
}

#[test]
fn given_request_id_when_cloned_then_equals_original() {
    let original = RequestId("abc".to_string());
    let cloned = original.clone();
    assert_eq!(original.0, cloned.0);
}

#[test]
fn given_default_config_when_created_then_plain_output_with_default_filter() {
    let config = TracingConfig::default();

    assert!(!config.json_format);
    assert_eq!(config.environment, "local");
    assert_eq!(config.filter, DEFAULT_LOG_FILTER);
}

#[test]
fn given_logging_settings_when_building_config_then_level_and_format_carried() {
    let mut settings = Settings::default();
    settings.environment = Environment::Prod;
    settings.logging.level = Some("warn,fin_analyzer=info".to_string());
    settings.logging.json = true;

    let config = TracingConfig::from_settings(&settings);

    assert!(config.json_format);
    assert_eq!(config.filter, "warn,fin_analyzer=info");
    assert_eq!(config.environment, Environment::Prod.to_string());
}

#[test]
fn given_no_log_level_when_building_config_then_default_filter_used() {
    let config = TracingConfig::from_settings(&Settings::default());

    assert_eq!(config.filter, DEFAULT_LOG_FILTER);
}
