use async_trait::async_trait;
use log::{debug, error};
use reqwest::Client;
use serde::{Deserialize, Serialize};
use std::fmt;

use super::{http_client, status_error, transport_error, Provider};
use crate::errors::ProviderError;

/// DeepSeek client for the OpenAI-compatible chat completions API
pub struct DeepSeek {
    /// HTTP client for API requests
    client: Client,
    /// API key for bearer authentication
    api_key: String,
    /// Base URL, e.g. `https://api.deepseek.com/v1`
    endpoint: String,
}

/// Chat completion request
#[derive(Debug, Serialize)]
pub struct DeepSeekRequest {
    /// The model to use (deepseek-chat or deepseek-reasoner)
    model: String,

    /// The messages for the conversation
    messages: Vec<ChatMessage>,

    /// Streaming is always disabled
    stream: bool,

    /// Temperature for generation
    #[serde(skip_serializing_if = "Option::is_none")]
    temperature: Option<f32>,
}

/// Chat message sent to the API
#[derive(Debug, Serialize)]
pub struct ChatMessage {
    pub role: String,
    pub content: String,
}

/// Chat completion response
#[derive(Debug, Deserialize)]
pub struct DeepSeekResponse {
    #[serde(default)]
    pub choices: Vec<DeepSeekChoice>,

    #[serde(default)]
    pub usage: Option<TokenUsage>,
}

/// One completion choice
#[derive(Debug, Deserialize)]
pub struct DeepSeekChoice {
    #[serde(default)]
    pub message: Option<ResponseMessage>,

    #[serde(default)]
    pub finish_reason: Option<String>,
}

/// Message returned by the API; content may be null
#[derive(Debug, Deserialize)]
pub struct ResponseMessage {
    #[serde(default)]
    pub role: Option<String>,

    #[serde(default)]
    pub content: Option<String>,
}

/// Token usage information
#[derive(Debug, Deserialize)]
pub struct TokenUsage {
    pub prompt_tokens: u32,
    pub completion_tokens: u32,
    pub total_tokens: u32,
}

impl DeepSeekRequest {
    /// Create a new request for the given model
    pub fn new(model: impl Into<String>) -> Self {
        Self {
            model: model.into(),
            messages: Vec::new(),
            stream: false,
            temperature: None,
        }
    }

    /// Add a message to the request
    pub fn add_message(mut self, role: impl Into<String>, content: impl Into<String>) -> Self {
        self.messages.push(ChatMessage {
            role: role.into(),
            content: content.into(),
        });
        self
    }

    /// Set the temperature
    pub fn temperature(mut self, temperature: f32) -> Self {
        self.temperature = Some(temperature);
        self
    }
}

impl DeepSeek {
    /// Create a new DeepSeek client
    pub fn new(api_key: impl Into<String>, endpoint: impl Into<String>, timeout_secs: u64) -> Self {
        Self {
            client: http_client(timeout_secs),
            api_key: api_key.into(),
            endpoint: endpoint.into(),
        }
    }

    fn api_url(&self) -> String {
        format!("{}/chat/completions", self.endpoint.trim_end_matches('/'))
    }

    fn check_response(response: &DeepSeekResponse) -> Result<(), ProviderError> {
        let choice = response
            .choices
            .first()
            .ok_or_else(|| ProviderError::ParseError("DeepSeek response has no choices".to_string()))?;

        if choice.finish_reason.as_deref() == Some("content_filter") {
            return Err(ProviderError::ContentBlocked("DeepSeek content filter".to_string()));
        }

        match choice.message.as_ref().and_then(|m| m.content.as_deref()) {
            Some(content) if !content.is_empty() => Ok(()),
            _ => Err(ProviderError::ParseError("DeepSeek response has no content".to_string())),
        }
    }
}

impl fmt::Debug for DeepSeek {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DeepSeek")
            .field("endpoint", &self.endpoint)
            .finish_non_exhaustive()
    }
}

#[async_trait]
impl Provider for DeepSeek {
    type Request = DeepSeekRequest;
    type Response = DeepSeekResponse;

    async fn complete(&self, request: DeepSeekRequest) -> Result<DeepSeekResponse, ProviderError> {
        if self.api_key.is_empty() {
            return Err(ProviderError::AuthenticationError("DeepSeek API key is not set".to_string()));
        }

        let response = self.client.post(self.api_url())
            .header("Content-Type", "application/json")
            .bearer_auth(&self.api_key)
            .json(&request)
            .send()
            .await
            .map_err(|e| transport_error("DeepSeek API", e))?;

        let status = response.status();
        if !status.is_success() {
            let error_text = response.text().await
                .unwrap_or_else(|_| "Failed to get error response text".to_string());
            error!("DeepSeek API error ({}): {}", status, error_text);
            return Err(status_error("DeepSeek API", status, error_text));
        }

        let body = response.text().await
            .map_err(|e| ProviderError::ParseError(format!("Failed to read DeepSeek API response: {}", e)))?;
        debug!("DeepSeek API response: {}", body);

        let deepseek_response: DeepSeekResponse = serde_json::from_str(&body)
            .map_err(|e| ProviderError::ParseError(format!("Failed to parse DeepSeek API response: {}", e)))?;

        Self::check_response(&deepseek_response)?;
        Ok(deepseek_response)
    }

    fn extract_text(response: &DeepSeekResponse) -> String {
        response
            .choices
            .first()
            .and_then(|choice| choice.message.as_ref())
            .and_then(|message| message.content.clone())
            .unwrap_or_default()
    }
}
