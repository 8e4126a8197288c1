//! Tests for configuration defaults.

use std::path::PathBuf;

use crate::config::Settings;

#[test]
fn test_defaults_match_documented_values() {
    let settings = Settings::default();

    assert_eq!(settings.project_name, "ner-service");
    assert_eq!(settings.api_version, "v1");
    assert_eq!(settings.server.host, "0.0.0.0");
    assert_eq!(settings.server.port, 8000);
    assert_eq!(settings.model.name, "dslim/bert-base-NER");
    assert_eq!(settings.model.cache_dir, PathBuf::from("./models"));
    assert!(!settings.model.preload);
    assert_eq!(settings.model.max_sequence_length, 512);
    assert!(settings.security.api_key_enabled);
    assert!(settings.security.api_key.is_empty());
    assert!(settings.cors.origins.is_empty());
    assert_eq!(settings.logging.level, "info");
    assert_eq!(settings.logging.format, "json");
    assert!(settings.logging.file.is_none());
    assert_eq!(settings.storage.backend, "local");
    assert!(settings.metrics.enabled);
}

#[test]
fn test_model_dir_joins_cache_dir_and_name() {
    let settings = Settings::default();
    assert_eq!(
        settings.model.model_dir(),
        PathBuf::from("./models").join("dslim/bert-base-NER")
    );
}

#[test]
fn test_default_settings_fail_validation_without_api_key() {
    // Enforcement is on by default but no key is configured; startup must
    // refuse this rather than lock out every caller.
    let settings = Settings::default();
    let err = settings.validate().unwrap_err().to_string();
    assert!(err.contains("security.api_key"), "got: {}", err);
}

#[test]
fn test_default_settings_validate_with_key_set() {
    let mut settings = Settings::default();
    settings.security.api_key = "secret".to_string();
    assert!(settings.validate().is_ok());
}
