/*!
 * Tests for application configuration functionality
 */

use anyhow::Result;
use aist::app_config::{Config, LogLevel, TranslationProvider, MAX_CHUNK_SIZE, MAX_RETRIES_LIMIT};
use crate::common;

/// Test default configuration values
#[test]
fn test_default_config_withNoParameters_shouldHaveCorrectDefaults() {
    let config = Config::default();

    assert_eq!(config.target_language, "english");
    assert_eq!(config.output_dir, "output");
    assert_eq!(config.translation.provider, TranslationProvider::Gemini);
    assert_eq!(config.log_level, LogLevel::Info);

    let gemini = config.translation.get_provider_config(&TranslationProvider::Gemini)
        .expect("Gemini provider config should exist");
    assert_eq!(gemini.model, "gemini-2.0-flash-thinking-exp-01-21");
    assert_eq!(gemini.endpoint, "https://generativelanguage.googleapis.com");
    assert_eq!(gemini.timeout_secs, 360);

    let deepseek = config.translation.get_provider_config(&TranslationProvider::DeepSeek)
        .expect("DeepSeek provider config should exist");
    assert_eq!(deepseek.model, "deepseek-chat");
    assert_eq!(deepseek.endpoint, "https://api.deepseek.com/v1");

    let common = &config.translation.common;
    assert_eq!(common.chunk_size, 0);
    assert_eq!(common.overlap, 10);
    assert_eq!(common.max_retries, 10);
    assert_eq!(common.base_delay_ms, 3000);
    assert_eq!(common.jitter_ms, 500);
}

/// Test configuration validation limits
#[test]
fn test_config_validation_withOutOfRangeValues_shouldFail() {
    let temp_dir = common::create_temp_dir().unwrap();
    let valid = common::test_config(temp_dir.path());
    assert!(valid.validate().is_ok());

    let mut config = valid.clone();
    config.translation.common.chunk_size = MAX_CHUNK_SIZE + 1;
    assert!(config.validate().is_err());

    let mut config = valid.clone();
    config.translation.common.max_retries = MAX_RETRIES_LIMIT + 1;
    assert!(config.validate().is_err());

    let mut config = valid.clone();
    config.translation.active_provider_config_mut().timeout_secs = 3601;
    assert!(config.validate().is_err());

    let mut config = valid;
    config.translation.active_provider_config_mut().endpoint = "::not a url::".to_string();
    assert!(config.validate().is_err());
}

/// An empty key only matters when files are actually translated
#[test]
fn test_config_validation_withMissingKey_shouldDependOnTargetLanguage() {
    let provider = TranslationProvider::DeepSeek;
    if std::env::var(provider.api_key_env_var()).is_ok() {
        return;
    }

    let mut config = Config::default();
    config.translation.provider = provider;
    config.translation.active_provider_config_mut().api_key = String::new();
    assert!(config.validate().is_err());

    config.target_language = "None".to_string();
    assert!(!config.translation_enabled());
    assert!(config.validate().is_ok());
}

#[test]
fn test_provider_fromStr_withKnownNames_shouldParse() {
    assert_eq!("gemini".parse::<TranslationProvider>().unwrap(), TranslationProvider::Gemini);
    assert_eq!("DeepSeek".parse::<TranslationProvider>().unwrap(), TranslationProvider::DeepSeek);
    assert!("ollama".parse::<TranslationProvider>().is_err());
    assert_eq!(TranslationProvider::DeepSeek.to_string(), "deepseek");
}

/// Test that a missing config file is created with defaults and reloads identically
#[test]
fn test_load_or_create_withMissingFile_shouldWriteDefaults() -> Result<()> {
    let temp_dir = common::create_temp_dir()?;
    let path = temp_dir.path().join("conf.json");

    let created = Config::load_or_create(&path)?;
    assert!(path.exists());

    let reloaded = Config::load_or_create(&path)?;
    assert_eq!(reloaded.target_language, created.target_language);
    assert_eq!(reloaded.translation.available_providers.len(), 2);
    Ok(())
}

/// Test that partial config files are completed with defaults
#[test]
fn test_load_or_create_withPartialFile_shouldFillDefaults() -> Result<()> {
    let temp_dir = common::create_temp_dir()?;
    let path = common::create_test_file(
        temp_dir.path(),
        "conf.json",
        r#"{
            "target_language": "german",
            "translation": {
                "provider": "deepseek",
                "available_providers": [{"type": "deepseek", "api_key": "k", "model": "deepseek-reasoner"}],
                "common": {"chunk_size": 2000}
            }
        }"#,
    )?;

    let config = Config::load_or_create(&path)?;
    assert_eq!(config.target_language, "german");
    assert_eq!(config.output_dir, "output");
    assert_eq!(config.translation.provider, TranslationProvider::DeepSeek);
    assert_eq!(config.translation.get_model(), "deepseek-reasoner");
    assert_eq!(config.translation.get_endpoint(), "https://api.deepseek.com/v1");
    assert_eq!(config.translation.get_timeout_secs(), 360);
    assert_eq!(config.translation.common.chunk_size, 2000);
    assert_eq!(config.translation.common.overlap, 10);
    Ok(())
}

#[test]
fn test_load_or_create_withInvalidJson_shouldFail() -> Result<()> {
    let temp_dir = common::create_temp_dir()?;
    let path = common::create_test_file(temp_dir.path(), "conf.json", "{ not json")?;

    assert!(Config::load_or_create(&path).is_err());
    Ok(())
}

#[test]
fn test_log_level_toLevelFilter_shouldMatch() {
    assert_eq!(LogLevel::Warn.to_level_filter(), log::LevelFilter::Warn);
    assert_eq!(LogLevel::Trace.to_level_filter(), log::LevelFilter::Trace);
}
