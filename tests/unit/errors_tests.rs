/*!
 * Tests for error types and conversions
 */

use aist::errors::{ProviderError, SubtitleError, TranslationError};

#[test]
fn test_providerError_apiError_shouldDisplayStatusAndMessage() {
    let error = ProviderError::ApiError {
        status_code: 500,
        message: "Internal error".to_string(),
    };
    let display = format!("{}", error);
    assert!(display.contains("500"));
    assert!(display.contains("Internal error"));
}

#[test]
fn test_providerError_contentBlocked_shouldDisplayDetails() {
    let error = ProviderError::ContentBlocked("HARM_CATEGORY_HARASSMENT: HIGH".to_string());
    let display = format!("{}", error);
    assert!(display.contains("Content blocked"));
    assert!(display.contains("HARM_CATEGORY_HARASSMENT"));
}

#[test]
fn test_subtitleError_lineCountMismatch_shouldDisplayBothCounts() {
    let error = SubtitleError::LineCountMismatch { expected: 3, actual: 2 };
    assert_eq!(format!("{}", error), "Expected 3 subtitle texts, got 2");
}

#[test]
fn test_translationError_variants_shouldDescribeFailure() {
    let mismatch = TranslationError::AlignmentMismatch { first: 4, unresolved: 2 };
    assert!(mismatch.to_string().contains("2 lines unresolved starting at line 4"));

    let exhausted = TranslationError::RetryExhausted { untranslated: 7, rounds: 11 };
    assert!(exhausted.to_string().contains("7 lines left untranslated after 11 rounds"));

    let unavailable = TranslationError::BackendUnavailable { lines: 5, reason: "timeout".to_string() };
    assert!(unavailable.to_string().contains("timeout"));
}

#[test]
fn test_errors_intoAnyhow_shouldKeepMessage() {
    let error: anyhow::Error = SubtitleError::UnsupportedFormat("movie.vtt".to_string()).into();
    assert_eq!(error.to_string(), "Unsupported subtitle format: movie.vtt");

    let error: anyhow::Error = TranslationError::RetryExhausted { untranslated: 1, rounds: 1 }.into();
    assert!(error.downcast_ref::<TranslationError>().is_some());
}
