/*!
 * Error types for the aist application.
 *
 * This module contains custom error types for different parts of the application,
 * using the thiserror crate for ergonomic error definitions.
 */

use thiserror::Error;

/// Errors that can occur when working with provider APIs
#[derive(Error, Debug)]
pub enum ProviderError {
    /// Error when making an API request fails
    #[error("API request failed: {0}")]
    RequestFailed(String),

    /// Error when parsing an API response fails
    #[error("Failed to parse API response: {0}")]
    ParseError(String),

    /// Error returned by the API itself
    #[error("API responded with error: {status_code} - {message}")]
    ApiError {
        /// HTTP status code
        status_code: u16,
        /// Error message from the API
        message: String
    },

    /// Error establishing or maintaining a connection
    #[error("Connection error: {0}")]
    ConnectionError(String),

    /// Error related to rate limiting
    #[error("Rate limit exceeded: {0}")]
    RateLimitExceeded(String),

    /// Error with authentication
    #[error("Authentication error: {0}")]
    AuthenticationError(String),

    /// The provider refused the content on policy grounds
    #[error("Content blocked by provider policy: {0}")]
    ContentBlocked(String),
}

/// Errors that can occur during subtitle processing
#[derive(Error, Debug)]
pub enum SubtitleError {
    /// The file extension is not one of the supported subtitle formats
    #[error("Unsupported subtitle format: {0}")]
    UnsupportedFormat(String),

    /// The document contains no translatable lines
    #[error("No subtitle lines found in {0}")]
    EmptyDocument(String),

    /// Rendering was attempted with the wrong number of texts
    #[error("Expected {expected} subtitle texts, got {actual}")]
    LineCountMismatch {
        /// Number of lines in the parsed document
        expected: usize,
        /// Number of texts supplied for rendering
        actual: usize,
    },
}

/// Errors that can occur during translation.
///
/// None of these escape a file's processing: the orchestrator absorbs them into
/// the failed-index set and reports them through the observer.
#[derive(Error, Debug)]
pub enum TranslationError {
    /// The backend produced no usable result for a chunk
    #[error("Backend unavailable for chunk of {lines} lines: {reason}")]
    BackendUnavailable {
        /// Number of lines in the affected chunk
        lines: usize,
        /// Underlying failure
        reason: String,
    },

    /// The backend output stopped before every expected line was seen
    #[error("Alignment mismatch: {unresolved} lines unresolved starting at line {first}")]
    AlignmentMismatch {
        /// First unresolved zero-based line index
        first: usize,
        /// Number of unresolved lines
        unresolved: usize,
    },

    /// A block could not be interpreted at all
    #[error("Reconciliation failed at line {index}: {reason}")]
    Reconciliation {
        /// Zero-based line index the reconciler was expecting
        index: usize,
        /// What went wrong
        reason: String,
    },

    /// Lines still untranslated after the retry budget was spent
    #[error("{untranslated} lines left untranslated after {rounds} rounds")]
    RetryExhausted {
        /// Number of lines that fell back to their original text
        untranslated: usize,
        /// Number of backend rounds performed
        rounds: usize,
    },
}
