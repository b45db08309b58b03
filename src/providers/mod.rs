/*!
 * Provider implementations for different translation services.
 *
 * This module contains client implementations for the supported LLM providers:
 * - Gemini: Google Generative Language API
 * - DeepSeek: OpenAI-compatible chat completions API
 * - mock: scripted in-process backend for tests and dry runs
 */

use async_trait::async_trait;
use reqwest::{Client, StatusCode};
use std::fmt::Debug;
use std::time::Duration;

use crate::errors::ProviderError;

/// Common trait for all LLM providers
///
/// This trait defines the interface that all provider implementations must follow,
/// allowing them to be used interchangeably in the translation service.
#[async_trait]
pub trait Provider: Send + Sync + Debug {
    /// The request type for this provider
    type Request: Send + Sync;

    /// The response type for this provider
    type Response: Send + Sync;

    /// Complete a request using this provider
    ///
    /// # Arguments
    /// * `request` - The request to complete
    ///
    /// # Returns
    /// * `Result<Self::Response, ProviderError>` - The response from the provider or an error
    async fn complete(&self, request: Self::Request) -> Result<Self::Response, ProviderError>;

    /// Extract text from the provider response
    ///
    /// # Arguments
    /// * `response` - The response from the provider
    ///
    /// # Returns
    /// * `String` - The extracted text
    fn extract_text(response: &Self::Response) -> String;
}

/// Build an HTTP client with the configured request timeout (0 disables it)
pub(crate) fn http_client(timeout_secs: u64) -> Client {
    let builder = Client::builder();
    let builder = if timeout_secs > 0 {
        builder.timeout(Duration::from_secs(timeout_secs))
    } else {
        builder
    };
    builder.build().unwrap_or_default()
}

/// Map a non-success HTTP status to a provider error
pub(crate) fn status_error(provider: &str, status: StatusCode, body: String) -> ProviderError {
    match status {
        StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN => {
            ProviderError::AuthenticationError(format!("{} rejected the API key: {}", provider, body))
        }
        StatusCode::TOO_MANY_REQUESTS => ProviderError::RateLimitExceeded(body),
        _ => ProviderError::ApiError {
            status_code: status.as_u16(),
            message: body,
        },
    }
}

/// Map a transport failure to a provider error
///
/// The request URL is stripped from the message so credentials never reach the logs.
pub(crate) fn transport_error(provider: &str, error: reqwest::Error) -> ProviderError {
    let error = error.without_url();
    if error.is_timeout() {
        ProviderError::ConnectionError(format!("{} request timed out: {}", provider, error))
    } else if error.is_connect() {
        ProviderError::ConnectionError(format!("Failed to connect to {}: {}", provider, error))
    } else {
        ProviderError::RequestFailed(format!("Failed to send request to {}: {}", provider, error))
    }
}

pub mod deepseek;
pub mod gemini;
pub mod mock;
