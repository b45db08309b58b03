/*!
 * Tests for the scripted backend, provider clients and the translation service
 */

use aist::app_config::{Config, TranslationProvider};
use aist::errors::ProviderError;
use aist::providers::deepseek::{DeepSeek, DeepSeekRequest};
use aist::providers::gemini::{Gemini, GeminiRequest};
use aist::providers::mock::{MockErrorType, MockReply, ScriptedBackend};
use aist::providers::Provider;
use aist::translation::{TranslationBackend, TranslationService};

#[tokio::test]
async fn test_scripted_backend_withErrorKinds_shouldMapToProviderErrors() {
    let backend = ScriptedBackend::new(
        "",
        vec![
            MockReply::Error(MockErrorType::Authentication),
            MockReply::Error(MockErrorType::RateLimit),
            MockReply::Error(MockErrorType::ContentBlocked),
        ],
        MockReply::Error(MockErrorType::Connection),
    );

    assert!(matches!(backend.translate("1\na").await, Err(ProviderError::AuthenticationError(_))));
    assert!(matches!(backend.translate("1\na").await, Err(ProviderError::RateLimitExceeded(_))));
    assert!(matches!(backend.translate("1\na").await, Err(ProviderError::ContentBlocked(_))));
    assert!(matches!(backend.translate("1\na").await, Err(ProviderError::ConnectionError(_))));
    assert_eq!(backend.call_count(), 4);
}

#[tokio::test]
async fn test_scripted_backend_withDelayedReply_shouldStillTranslate() {
    let backend = ScriptedBackend::translating("de:").with_script(vec![MockReply::Delayed(5)]);

    let output = backend.translate("1\nHello\n\n2\nWorld").await.unwrap();
    assert_eq!(output, "1\nde:Hello\n\n2\nde:World");
}

#[test]
fn test_translate_blocks_withKeepFilter_shouldOnlyKeepAcceptedPositions() {
    let backend = ScriptedBackend::translating("x:");
    let output = backend.translate_blocks("1\na\n\n2\nb\n\n3\nc", |p| p != 0);
    assert_eq!(output, "2\nx:b\n\n3\nx:c");
}

#[test]
fn test_translation_service_withEachProvider_shouldUseConfiguredModel() {
    for provider in [TranslationProvider::Gemini, TranslationProvider::DeepSeek] {
        let mut config = Config::default();
        config.translation.provider = provider;
        config.translation.active_provider_config_mut().api_key = "test-key".to_string();

        let service = TranslationService::new(config.translation.clone(), "french").unwrap();
        assert_eq!(service.model(), config.translation.get_model());
        assert_eq!(service.target_language(), "french");
    }
}

#[test]
fn test_translation_service_withNonHttpEndpoint_shouldFail() {
    let mut config = Config::default();
    config.translation.active_provider_config_mut().endpoint = "ftp://example.com".to_string();

    assert!(TranslationService::new(config.translation, "french").is_err());
}

#[tokio::test]
async fn test_gemini_complete_withEmptyKey_shouldFailBeforeSending() {
    let client = Gemini::new("", "http://127.0.0.1:9", 5);
    let result = client.complete(GeminiRequest::new("gemini-test", "1\nHello")).await;

    assert!(matches!(result, Err(ProviderError::AuthenticationError(_))));
}

#[tokio::test]
async fn test_gemini_complete_withUnreachableEndpoint_shouldNotExposeKey() {
    let client = Gemini::new("SUPERSECRETKEY123", "http://127.0.0.1:9", 5);
    let result = client.complete(GeminiRequest::new("gemini-test", "1\nHello")).await;

    let error = result.expect_err("nothing listens on port 9");
    assert!(matches!(error, ProviderError::ConnectionError(_) | ProviderError::RequestFailed(_)));
    assert!(!error.to_string().contains("SUPERSECRETKEY123"));
    assert!(!format!("{:?}", error).contains("SUPERSECRETKEY123"));
}

#[tokio::test]
async fn test_deepseek_complete_withUnreachableEndpoint_shouldReportTransportError() {
    let client = DeepSeek::new("test-key", "http://127.0.0.1:9", 5);
    let request = DeepSeekRequest::new("deepseek-chat").add_message("user", "1\nHello");

    match client.complete(request).await {
        Err(ProviderError::ConnectionError(_)) | Err(ProviderError::RequestFailed(_)) => {}
        other => panic!("Expected a transport error, got {:?}", other),
    }
}

#[test]
fn test_scripted_backend_fromSyncContext_shouldDriveOrchestrator() {
    use aist::translation::{translate_lines, NullObserver, OrchestratorSettings};

    let backend = ScriptedBackend::translating("it:").with_script(vec![MockReply::Text(String::new())]);
    let input = vec!["Hello".to_string(), "World".to_string()];

    let outcome = tokio_test::block_on(translate_lines(&backend, &NullObserver, OrchestratorSettings::default(), &input));

    assert_eq!(outcome.texts, vec!["it:Hello".to_string(), "it:World".to_string()]);
    assert_eq!(outcome.rounds, 2);
}
