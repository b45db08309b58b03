use anyhow::{anyhow, Context, Result};
use serde::{Deserialize, Serialize};
use std::default::Default;
use std::path::Path;
use url::Url;

/// Application configuration module
/// This module handles the application configuration including loading,
/// validating and saving configuration settings.
/// Represents the application configuration
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct Config {
    /// Target language name passed to the model ("none" disables translation)
    #[serde(default = "default_target_language")]
    pub target_language: String,

    /// Directory translated files are written to
    #[serde(default = "default_output_dir")]
    pub output_dir: String,

    /// Translation config
    #[serde(default)]
    pub translation: TranslationConfig,

    /// Log level
    #[serde(default)]
    pub log_level: LogLevel,
}

/// Translation provider type
#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum TranslationProvider {
    // @provider: Google Gemini
    #[default]
    Gemini,
    // @provider: DeepSeek (OpenAI-compatible chat completions)
    DeepSeek,
}

impl TranslationProvider {
    // @returns: Capitalized provider name
    pub fn display_name(&self) -> &str {
        match self {
            Self::Gemini => "Gemini",
            Self::DeepSeek => "DeepSeek",
        }
    }

    // @returns: Lowercase provider identifier
    pub fn to_lowercase_string(&self) -> String {
        match self {
            Self::Gemini => "gemini".to_string(),
            Self::DeepSeek => "deepseek".to_string(),
        }
    }

    // @returns: Environment variable that overrides the configured API key
    pub fn api_key_env_var(&self) -> &'static str {
        match self {
            Self::Gemini => "GEMINI_API_KEY",
            Self::DeepSeek => "DEEPSEEK_API_KEY",
        }
    }
}

// Implement Display trait for TranslationProvider
impl std::fmt::Display for TranslationProvider {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.to_lowercase_string())
    }
}

// Implement FromStr trait for TranslationProvider
impl std::str::FromStr for TranslationProvider {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_lowercase().as_str() {
            "gemini" => Ok(Self::Gemini),
            "deepseek" => Ok(Self::DeepSeek),
            _ => Err(anyhow!("Invalid provider type: {}", s)),
        }
    }
}

/// Provider configuration wrapper
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct ProviderConfig {
    // @field: Provider type identifier
    #[serde(rename = "type")]
    pub provider_type: String,

    // @field: Model name
    #[serde(default = "String::new")]
    pub model: String,

    // @field: API key
    #[serde(default = "String::new")]
    pub api_key: String,

    // @field: Service URL
    #[serde(default = "String::new")]
    pub endpoint: String,

    // @field: Timeout seconds
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
}

impl ProviderConfig {
    // @param provider_type: Provider enum
    // @returns: Provider config with defaults
    pub fn new(provider_type: TranslationProvider) -> Self {
        match provider_type {
            TranslationProvider::Gemini => Self {
                provider_type: "gemini".to_string(),
                model: default_gemini_model(),
                api_key: String::new(),
                endpoint: default_gemini_endpoint(),
                timeout_secs: default_timeout_secs(),
            },
            TranslationProvider::DeepSeek => Self {
                provider_type: "deepseek".to_string(),
                model: default_deepseek_model(),
                api_key: String::new(),
                endpoint: default_deepseek_endpoint(),
                timeout_secs: default_timeout_secs(),
            },
        }
    }
}

/// Translation service configuration
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct TranslationConfig {
    /// Translation provider to use
    #[serde(default)]
    pub provider: TranslationProvider,

    /// Available translation providers
    #[serde(default)]
    pub available_providers: Vec<ProviderConfig>,

    /// Chunking and retry settings shared by all providers
    #[serde(default)]
    pub common: TranslationCommonConfig,
}

/// Chunking, retry and pacing settings applicable to all providers
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct TranslationCommonConfig {
    /// Maximum chunk size in UTF-8 bytes (0 sends the whole file in one request)
    #[serde(default)]
    pub chunk_size: usize,

    /// Lines repeated between consecutive chunks and before each retried failure cluster
    #[serde(default = "default_overlap")]
    pub overlap: usize,

    /// Number of tail-retry rounds after the initial pass
    #[serde(default = "default_max_retries")]
    pub max_retries: u32,

    /// Base delay in milliseconds between consecutive requests
    #[serde(default = "default_base_delay_ms")]
    pub base_delay_ms: u64,

    /// Upper bound of the random jitter added to initial-pass delays, in milliseconds
    #[serde(default = "default_jitter_ms")]
    pub jitter_ms: u64,
}

impl Default for TranslationCommonConfig {
    fn default() -> Self {
        Self {
            chunk_size: 0,
            overlap: default_overlap(),
            max_retries: default_max_retries(),
            base_delay_ms: default_base_delay_ms(),
            jitter_ms: default_jitter_ms(),
        }
    }
}

/// Log verbosity level
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, Default)]
#[serde(rename_all = "lowercase")]
pub enum LogLevel {
    Error,
    Warn,
    #[default]
    Info,
    Debug,
    Trace,
}

impl LogLevel {
    // @returns: Matching `log` level filter
    pub fn to_level_filter(&self) -> log::LevelFilter {
        match self {
            Self::Error => log::LevelFilter::Error,
            Self::Warn => log::LevelFilter::Warn,
            Self::Info => log::LevelFilter::Info,
            Self::Debug => log::LevelFilter::Debug,
            Self::Trace => log::LevelFilter::Trace,
        }
    }
}

/// Upper bound accepted for `chunk_size`
pub const MAX_CHUNK_SIZE: usize = 1_000_000;

/// Upper bound accepted for `max_retries`
pub const MAX_RETRIES_LIMIT: u32 = 1000;

/// Upper bound accepted for `timeout_secs`
pub const MAX_TIMEOUT_SECS: u64 = 3600;

fn default_target_language() -> String {
    "english".to_string()
}

fn default_output_dir() -> String {
    "output".to_string()
}

fn default_timeout_secs() -> u64 {
    360
}

fn default_overlap() -> usize {
    10
}

fn default_max_retries() -> u32 {
    10
}

fn default_base_delay_ms() -> u64 {
    3000
}

fn default_jitter_ms() -> u64 {
    500
}

fn default_gemini_endpoint() -> String {
    "https://generativelanguage.googleapis.com".to_string()
}

fn default_deepseek_endpoint() -> String {
    "https://api.deepseek.com/v1".to_string()
}

fn default_gemini_model() -> String {
    "gemini-2.0-flash-thinking-exp-01-21".to_string()
}

fn default_deepseek_model() -> String {
    "deepseek-chat".to_string()
}

impl Config {
    /// Load the configuration from a JSON file, writing a default one when it is missing
    pub fn load_or_create<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        if path.exists() {
            let content = std::fs::read_to_string(path)
                .with_context(|| format!("Failed to open config file: {:?}", path))?;
            let config: Config = serde_json::from_str(&content)
                .with_context(|| format!("Failed to parse config file: {:?}", path))?;
            return Ok(config);
        }

        log::warn!("Config file not found at {:?}, creating default config.", path);
        let config = Config::default();
        config.save(path)?;
        Ok(config)
    }

    /// Write the configuration as pretty-printed JSON
    pub fn save<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let config_json = serde_json::to_string_pretty(self)
            .context("Failed to serialize config to JSON")?;
        std::fs::write(path.as_ref(), config_json)
            .with_context(|| format!("Failed to write config to file: {:?}", path.as_ref()))?;
        Ok(())
    }

    /// Whether files should be sent to a backend at all
    pub fn translation_enabled(&self) -> bool {
        let language = self.target_language.trim();
        !language.is_empty() && !language.eq_ignore_ascii_case("none")
    }

    /// Validate the configuration for consistency and required values
    pub fn validate(&self) -> Result<()> {
        let common = &self.translation.common;
        if common.chunk_size > MAX_CHUNK_SIZE {
            return Err(anyhow!(
                "chunk_size must be between 0 and {}, got {}",
                MAX_CHUNK_SIZE, common.chunk_size
            ));
        }
        if common.max_retries > MAX_RETRIES_LIMIT {
            return Err(anyhow!(
                "max_retries must be between 0 and {}, got {}",
                MAX_RETRIES_LIMIT, common.max_retries
            ));
        }

        let timeout = self.translation.get_timeout_secs();
        if timeout > MAX_TIMEOUT_SECS {
            return Err(anyhow!(
                "timeout_secs must be between 0 and {}, got {}",
                MAX_TIMEOUT_SECS, timeout
            ));
        }

        let endpoint = self.translation.get_endpoint();
        Url::parse(&endpoint)
            .with_context(|| format!("Invalid endpoint for {}: {}", self.translation.provider, endpoint))?;

        if self.translation_enabled() && self.translation.get_api_key().is_empty() {
            return Err(anyhow!(
                "Translation API key is required for {} provider (set it in the config or {})",
                self.translation.provider.display_name(),
                self.translation.provider.api_key_env_var()
            ));
        }

        Ok(())
    }
}

/// Default implementation for Config
impl Default for Config {
    fn default() -> Self {
        Config {
            target_language: default_target_language(),
            output_dir: default_output_dir(),
            translation: TranslationConfig::default(),
            log_level: LogLevel::default(),
        }
    }
}

impl TranslationConfig {
    /// Get the active provider configuration from the available_providers array
    pub fn get_active_provider_config(&self) -> Option<&ProviderConfig> {
        self.get_provider_config(&self.provider)
    }

    /// Get a specific provider configuration by type
    pub fn get_provider_config(&self, provider_type: &TranslationProvider) -> Option<&ProviderConfig> {
        let provider_str = provider_type.to_lowercase_string();
        self.available_providers.iter()
            .find(|p| p.provider_type == provider_str)
    }

    /// Mutable access to the active provider configuration, inserting defaults if absent
    pub fn active_provider_config_mut(&mut self) -> &mut ProviderConfig {
        let provider_str = self.provider.to_lowercase_string();
        let position = match self.available_providers.iter().position(|p| p.provider_type == provider_str) {
            Some(position) => position,
            None => {
                self.available_providers.push(ProviderConfig::new(self.provider));
                self.available_providers.len() - 1
            }
        };
        &mut self.available_providers[position]
    }

    /// Get the model for the active provider
    pub fn get_model(&self) -> String {
        if let Some(provider_config) = self.get_active_provider_config() {
            if !provider_config.model.is_empty() {
                return provider_config.model.clone();
            }
        }

        match self.provider {
            TranslationProvider::Gemini => default_gemini_model(),
            TranslationProvider::DeepSeek => default_deepseek_model(),
        }
    }

    /// Get the API key for the active provider.
    ///
    /// The provider's environment variable takes precedence over the config file.
    pub fn get_api_key(&self) -> String {
        if let Ok(key) = std::env::var(self.provider.api_key_env_var()) {
            if !key.trim().is_empty() {
                return key.trim().to_string();
            }
        }

        self.get_active_provider_config()
            .map(|p| p.api_key.trim().to_string())
            .unwrap_or_default()
    }

    /// Get the endpoint for the active provider
    pub fn get_endpoint(&self) -> String {
        if let Some(provider_config) = self.get_active_provider_config() {
            if !provider_config.endpoint.is_empty() {
                return provider_config.endpoint.clone();
            }
        }

        match self.provider {
            TranslationProvider::Gemini => default_gemini_endpoint(),
            TranslationProvider::DeepSeek => default_deepseek_endpoint(),
        }
    }

    /// Get the request timeout for the active provider
    pub fn get_timeout_secs(&self) -> u64 {
        self.get_active_provider_config()
            .map(|p| p.timeout_secs)
            .unwrap_or_else(default_timeout_secs)
    }
}

impl Default for TranslationConfig {
    fn default() -> Self {
        Self {
            provider: TranslationProvider::default(),
            available_providers: vec![
                ProviderConfig::new(TranslationProvider::Gemini),
                ProviderConfig::new(TranslationProvider::DeepSeek),
            ],
            common: TranslationCommonConfig::default(),
        }
    }
}
