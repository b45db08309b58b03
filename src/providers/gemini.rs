use async_trait::async_trait;
use log::{debug, error, warn};
use reqwest::Client;
use serde::{Deserialize, Serialize};
use std::fmt;

use super::{http_client, status_error, transport_error, Provider};
use crate::errors::ProviderError;

/// Harm categories whose blocking threshold is relaxed for subtitle content
const SAFETY_CATEGORIES: [&str; 4] = [
    "HARM_CATEGORY_SEXUALLY_EXPLICIT",
    "HARM_CATEGORY_HATE_SPEECH",
    "HARM_CATEGORY_HARASSMENT",
    "HARM_CATEGORY_DANGEROUS_CONTENT",
];

/// Gemini client for the generateContent API
pub struct Gemini {
    /// HTTP client for API requests
    client: Client,
    /// API key, sent in the `x-goog-api-key` header
    api_key: String,
    /// Base URL of the Generative Language API
    endpoint: String,
}

/// generateContent request
#[derive(Debug, Serialize)]
pub struct GeminiRequest {
    /// Model name, part of the URL rather than the body
    #[serde(skip)]
    model: String,

    /// Conversation contents
    contents: Vec<GeminiContent>,

    /// Per-category blocking thresholds
    #[serde(rename = "safetySettings")]
    safety_settings: Vec<SafetySetting>,
}

/// A content entry made of parts
#[derive(Debug, Serialize, Deserialize)]
pub struct GeminiContent {
    /// Author role, absent for single-turn requests
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub role: Option<String>,

    /// Content parts
    #[serde(default)]
    pub parts: Vec<GeminiPart>,
}

/// A single text part
#[derive(Debug, Serialize, Deserialize)]
pub struct GeminiPart {
    #[serde(default)]
    pub text: Option<String>,
}

/// Safety threshold for one harm category
#[derive(Debug, Serialize)]
pub struct SafetySetting {
    category: String,
    threshold: String,
}

/// generateContent response
#[derive(Debug, Deserialize)]
pub struct GeminiResponse {
    /// Generated candidates
    #[serde(default)]
    pub candidates: Vec<GeminiCandidate>,

    /// Feedback about the prompt itself
    #[serde(rename = "promptFeedback", default)]
    pub prompt_feedback: Option<PromptFeedback>,
}

/// One generated candidate
#[derive(Debug, Deserialize)]
pub struct GeminiCandidate {
    /// Generated content
    #[serde(default)]
    pub content: Option<GeminiContent>,

    /// Why generation stopped
    #[serde(rename = "finishReason", default)]
    pub finish_reason: Option<String>,

    /// Safety ratings for the candidate
    #[serde(rename = "safetyRatings", default)]
    pub safety_ratings: Vec<SafetyRating>,
}

/// Safety rating for one category
#[derive(Debug, Deserialize)]
pub struct SafetyRating {
    pub category: String,
    pub probability: String,
}

/// Prompt-level feedback
#[derive(Debug, Deserialize)]
pub struct PromptFeedback {
    #[serde(rename = "blockReason", default)]
    pub block_reason: Option<String>,
}

impl GeminiRequest {
    /// Create a single-turn request with relaxed safety thresholds
    pub fn new(model: impl Into<String>, text: impl Into<String>) -> Self {
        Self {
            model: model.into(),
            contents: vec![GeminiContent {
                role: None,
                parts: vec![GeminiPart { text: Some(text.into()) }],
            }],
            safety_settings: SAFETY_CATEGORIES
                .iter()
                .map(|category| SafetySetting {
                    category: category.to_string(),
                    threshold: "BLOCK_NONE".to_string(),
                })
                .collect(),
        }
    }

    pub fn model(&self) -> &str {
        &self.model
    }
}

impl Gemini {
    /// Create a new Gemini client
    pub fn new(api_key: impl Into<String>, endpoint: impl Into<String>, timeout_secs: u64) -> Self {
        Self {
            client: http_client(timeout_secs),
            api_key: api_key.into(),
            endpoint: endpoint.into(),
        }
    }

    fn api_url(&self, model: &str) -> String {
        let base = self.endpoint.trim_end_matches('/');
        if base.ends_with("/v1beta") || base.ends_with("/v1") {
            format!("{}/models/{}:generateContent", base, model)
        } else {
            format!("{}/v1beta/models/{}:generateContent", base, model)
        }
    }

    /// Reject blocked or empty responses
    fn check_response(response: &GeminiResponse) -> Result<(), ProviderError> {
        if let Some(reason) = response.prompt_feedback.as_ref().and_then(|f| f.block_reason.as_ref()) {
            warn!("Gemini API blocked the prompt: {}", reason);
            return Err(ProviderError::ContentBlocked(reason.clone()));
        }

        let candidate = response
            .candidates
            .first()
            .ok_or_else(|| ProviderError::ParseError("Gemini response has no candidates".to_string()))?;

        if candidate.finish_reason.as_deref() == Some("SAFETY") {
            let details = candidate
                .safety_ratings
                .iter()
                .map(|rating| format!("{}: {}", rating.category, rating.probability))
                .collect::<Vec<_>>()
                .join(", ");
            warn!("Gemini API blocked content due to safety policy. Details: {}", details);
            return Err(ProviderError::ContentBlocked(details));
        }

        if Self::extract_text(response).is_empty() {
            return Err(ProviderError::ParseError("Gemini response contains no text".to_string()));
        }

        Ok(())
    }
}

impl fmt::Debug for Gemini {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Gemini")
            .field("endpoint", &self.endpoint)
            .finish_non_exhaustive()
    }
}

#[async_trait]
impl Provider for Gemini {
    type Request = GeminiRequest;
    type Response = GeminiResponse;

    async fn complete(&self, request: GeminiRequest) -> Result<GeminiResponse, ProviderError> {
        if self.api_key.is_empty() {
            return Err(ProviderError::AuthenticationError("Gemini API key is not set".to_string()));
        }

        let response = self.client.post(self.api_url(request.model()))
            .header("Content-Type", "application/json")
            .header("x-goog-api-key", self.api_key.as_str())
            .json(&request)
            .send()
            .await
            .map_err(|e| transport_error("Gemini API", e))?;

        let status = response.status();
        if !status.is_success() {
            let error_text = response.text().await
                .unwrap_or_else(|_| "Failed to get error response text".to_string());
            error!("Gemini API error ({}): {}", status, error_text);
            return Err(status_error("Gemini API", status, error_text));
        }

        let body = response.text().await
            .map_err(|e| ProviderError::ParseError(format!("Failed to read Gemini API response: {}", e)))?;
        debug!("Gemini API response: {}", body);

        let gemini_response: GeminiResponse = serde_json::from_str(&body)
            .map_err(|e| ProviderError::ParseError(format!("Failed to parse Gemini API response: {}", e)))?;

        Self::check_response(&gemini_response)?;
        Ok(gemini_response)
    }

    fn extract_text(response: &GeminiResponse) -> String {
        response
            .candidates
            .first()
            .and_then(|candidate| candidate.content.as_ref())
            .map(|content| {
                content
                    .parts
                    .iter()
                    .filter_map(|part| part.text.as_deref())
                    .collect::<String>()
            })
            .unwrap_or_default()
    }
}
