/*!
 * Core translation service implementation.
 *
 * This module defines the `TranslationBackend` capability consumed by the
 * orchestrator and the `TranslationService` that implements it on top of the
 * configured remote provider.
 */

use anyhow::{Result, anyhow};
use async_trait::async_trait;
use log::debug;
use std::time::Instant;
use url::Url;

use crate::app_config::{TranslationConfig, TranslationProvider as ConfigTranslationProvider};
use crate::errors::ProviderError;
use crate::providers::deepseek::{DeepSeek, DeepSeekRequest};
use crate::providers::gemini::{Gemini, GeminiRequest};
use crate::providers::Provider;
use super::prompts::TranslationPrompt;

/// Something that turns a chunk's numbered blocks into translated numbered blocks
#[async_trait]
pub trait TranslationBackend: Send + Sync {
    /// Translate one chunk's content.
    ///
    /// Authentication problems, policy blocks and transport failures are all
    /// reported as errors; the caller decides how to degrade.
    async fn translate(&self, content: &str) -> Result<String, ProviderError>;
}

/// Translation provider implementation variants
enum TranslationProviderImpl {
    /// Google Gemini API
    Gemini {
        /// Client instance
        client: Gemini,
    },

    /// DeepSeek chat completions API
    DeepSeek {
        /// Client instance
        client: DeepSeek,
    },
}

/// Main translation service for subtitle translation
pub struct TranslationService {
    /// Provider implementation
    provider: TranslationProviderImpl,

    /// Model used for every request
    model: String,

    /// Prompt wrapped around every chunk
    prompt: TranslationPrompt,

    /// Configuration for the translation service
    pub config: TranslationConfig,
}

/// Reject endpoints that are not absolute http(s) URLs
fn check_endpoint(endpoint: &str) -> Result<()> {
    let url = Url::parse(endpoint).map_err(|e| anyhow!("Invalid endpoint '{}': {}", endpoint, e))?;
    match url.scheme() {
        "http" | "https" => Ok(()),
        scheme => Err(anyhow!("Unsupported endpoint scheme '{}' in {}", scheme, endpoint)),
    }
}

impl TranslationService {
    /// Create a new translation service with the given configuration
    pub fn new(config: TranslationConfig, target_language: &str) -> Result<Self> {
        let endpoint = config.get_endpoint();
        check_endpoint(&endpoint)?;

        let api_key = config.get_api_key();
        let timeout_secs = config.get_timeout_secs();

        let provider = match config.provider {
            ConfigTranslationProvider::Gemini => TranslationProviderImpl::Gemini {
                client: Gemini::new(api_key, endpoint, timeout_secs),
            },
            ConfigTranslationProvider::DeepSeek => TranslationProviderImpl::DeepSeek {
                client: DeepSeek::new(api_key, endpoint, timeout_secs),
            },
        };

        Ok(Self {
            provider,
            model: config.get_model(),
            prompt: TranslationPrompt::new(target_language),
            config,
        })
    }

    /// Model name used for requests
    pub fn model(&self) -> &str {
        &self.model
    }

    /// Language the service translates into
    pub fn target_language(&self) -> &str {
        self.prompt.target_language()
    }
}

#[async_trait]
impl TranslationBackend for TranslationService {
    async fn translate(&self, content: &str) -> Result<String, ProviderError> {
        let prompt = self.prompt.build(content);
        let started = Instant::now();

        let text = match &self.provider {
            TranslationProviderImpl::Gemini { client } => {
                let request = GeminiRequest::new(self.model.as_str(), prompt);
                let response = client.complete(request).await?;
                Gemini::extract_text(&response)
            }
            TranslationProviderImpl::DeepSeek { client } => {
                let request = DeepSeekRequest::new(self.model.as_str()).add_message("user", prompt);
                let response = client.complete(request).await?;
                if let Some(usage) = &response.usage {
                    debug!(
                        "DeepSeek token usage: prompt={} completion={} total={}",
                        usage.prompt_tokens, usage.completion_tokens, usage.total_tokens
                    );
                }
                DeepSeek::extract_text(&response)
            }
        };

        debug!(
            "{} returned {} bytes in {:.2}s",
            self.config.provider,
            text.len(),
            started.elapsed().as_secs_f64()
        );
        Ok(text)
    }
}
