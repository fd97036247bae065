//! Configuration types for document naming.
//!
//! All pipeline behaviour is controlled through [`NominateConfig`], built via
//! its [`NominateConfigBuilder`]. One struct holds every knob so the same
//! config can be shared by the one-shot API, the queue and the CLI.

use crate::error::NominateError;
use crate::pipeline::llm::ChatModel;
use crate::progress::ProgressCallback;
use edgequake_llm::LLMProvider;
use std::fmt;
use std::sync::Arc;

/// Model used when neither the config nor the environment names one.
pub const DEFAULT_MODEL: &str = "llama3.2";

/// Provider used when neither the config nor the environment names one.
pub const DEFAULT_PROVIDER: &str = "ollama";

/// Configuration for the naming pipeline.
///
/// Built via [`NominateConfig::builder()`] or using
/// [`NominateConfig::default()`].
///
/// # Example
/// ```rust
/// use nominate::NominateConfig;
///
/// let config = NominateConfig::builder()
///     .model("llama3.2")
///     .provider_name("ollama")
///     .api_timeout_secs(90)
///     .build()
///     .unwrap();
/// ```
#[derive(Clone)]
pub struct NominateConfig {
    /// LLM model identifier, e.g. "llama3.2", "gpt-4.1-nano".
    /// If None, uses [`DEFAULT_MODEL`].
    pub model: Option<String>,

    /// LLM provider name (e.g. "ollama", "openai", "anthropic").
    pub provider_name: Option<String>,

    /// Pre-constructed LLM provider. Takes precedence over `provider_name`.
    pub provider: Option<Arc<dyn LLMProvider>>,

    /// Pre-constructed chat model. Takes precedence over every provider setting.
    pub chat_model: Option<Arc<dyn ChatModel>>,

    /// Sampling temperature for all three model calls. Default: 0.0.
    ///
    /// Dates, summaries and names should come out the same for the same
    /// document on every run.
    pub temperature: f32,

    /// Maximum tokens the model may generate per call. Default: provider default.
    pub max_tokens: Option<usize>,

    /// Per model call timeout in seconds. Default: 120.
    ///
    /// Local models summarising a long document can take well over a minute
    /// on a laptop CPU.
    pub api_timeout_secs: u64,

    /// Download timeout for URL inputs in seconds. Default: 120.
    pub download_timeout_secs: u64,

    /// PDF user password for encrypted documents.
    pub password: Option<String>,

    /// Receives per-document queue events.
    pub progress_callback: Option<ProgressCallback>,
}

impl Default for NominateConfig {
    fn default() -> Self {
        Self {
            model: None,
            provider_name: None,
            provider: None,
            chat_model: None,
            temperature: 0.0,
            max_tokens: None,
            api_timeout_secs: 120,
            download_timeout_secs: 120,
            password: None,
            progress_callback: None,
        }
    }
}

impl fmt::Debug for NominateConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("NominateConfig")
            .field("model", &self.model)
            .field("provider_name", &self.provider_name)
            .field("provider", &self.provider.as_ref().map(|_| "<dyn LLMProvider>"))
            .field("chat_model", &self.chat_model.as_ref().map(|m| m.model_id().to_string()))
            .field("temperature", &self.temperature)
            .field("max_tokens", &self.max_tokens)
            .field("api_timeout_secs", &self.api_timeout_secs)
            .field("download_timeout_secs", &self.download_timeout_secs)
            .field("password", &self.password.as_ref().map(|_| "<redacted>"))
            .field("progress_callback", &self.progress_callback.is_some())
            .finish()
    }
}

impl NominateConfig {
    /// Create a new builder for `NominateConfig`.
    pub fn builder() -> NominateConfigBuilder {
        NominateConfigBuilder {
            config: Self::default(),
        }
    }

    /// The model identifier in effect.
    pub fn model_id(&self) -> &str {
        self.model.as_deref().unwrap_or(DEFAULT_MODEL)
    }
}

/// Builder for [`NominateConfig`].
pub struct NominateConfigBuilder {
    config: NominateConfig,
}

impl fmt::Debug for NominateConfigBuilder {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("NominateConfigBuilder")
            .field("config", &self.config)
            .finish()
    }
}

impl NominateConfigBuilder {
    pub fn model(mut self, model: impl Into<String>) -> Self {
        self.config.model = Some(model.into());
        self
    }

    pub fn provider_name(mut self, name: impl Into<String>) -> Self {
        self.config.provider_name = Some(name.into());
        self
    }

    pub fn provider(mut self, provider: Arc<dyn LLMProvider>) -> Self {
        self.config.provider = Some(provider);
        self
    }

    pub fn chat_model(mut self, model: Arc<dyn ChatModel>) -> Self {
        self.config.chat_model = Some(model);
        self
    }

    pub fn temperature(mut self, t: f32) -> Self {
        self.config.temperature = t.clamp(0.0, 2.0);
        self
    }

    pub fn max_tokens(mut self, n: usize) -> Self {
        self.config.max_tokens = Some(n);
        self
    }

    pub fn api_timeout_secs(mut self, secs: u64) -> Self {
        self.config.api_timeout_secs = secs;
        self
    }

    pub fn download_timeout_secs(mut self, secs: u64) -> Self {
        self.config.download_timeout_secs = secs;
        self
    }

    pub fn password(mut self, pwd: impl Into<String>) -> Self {
        self.config.password = Some(pwd.into());
        self
    }

    pub fn progress_callback(mut self, cb: ProgressCallback) -> Self {
        self.config.progress_callback = Some(cb);
        self
    }

    /// Build the configuration, validating constraints.
    pub fn build(self) -> Result<NominateConfig, NominateError> {
        let c = &self.config;
        if c.api_timeout_secs == 0 {
            return Err(NominateError::InvalidConfig(
                "API timeout must be ≥ 1 second".into(),
            ));
        }
        if c.download_timeout_secs == 0 {
            return Err(NominateError::InvalidConfig(
                "Download timeout must be ≥ 1 second".into(),
            ));
        }
        if c.model.as_deref().is_some_and(|m| m.trim().is_empty()) {
            return Err(NominateError::InvalidConfig(
                "Model identifier must not be empty".into(),
            ));
        }
        if c.max_tokens == Some(0) {
            return Err(NominateError::InvalidConfig(
                "max_tokens must be ≥ 1".into(),
            ));
        }
        Ok(self.config)
    }
}
