//! Model invocation boundary: one user-role prompt in, one answer out.
//!
//! Every pipeline stage talks to the model through [`ChatModel`], so the
//! stages never see a provider type and tests can script answers in process.
//! [`LlmChatModel`] is the production implementation over any
//! `edgequake-llm` provider (Ollama, OpenAI, Anthropic, Gemini, …).
//!
//! There is no retry loop here. A transport failure or an elapsed timeout
//! fails the current document; re-running it is an explicit caller action.

use crate::error::ModelInvocationError;
use async_trait::async_trait;
use edgequake_llm::{ChatMessage, CompletionOptions, LLMProvider};
use std::sync::Arc;
use std::time::Instant;
use tokio::time::{timeout, Duration};
use tracing::{debug, warn};

/// A chat-completion endpoint bound to one model identifier.
#[async_trait]
pub trait ChatModel: Send + Sync {
    /// Identifier of the model answering the prompts.
    fn model_id(&self) -> &str;

    /// Send `prompt` as a single user message and return the answer text.
    async fn complete(&self, prompt: &str, temperature: f32) -> Result<String, ModelInvocationError>;
}

/// [`ChatModel`] backed by an `edgequake-llm` provider.
pub struct LlmChatModel {
    provider: Arc<dyn LLMProvider>,
    model: String,
    max_tokens: Option<usize>,
    timeout_secs: u64,
}

impl LlmChatModel {
    pub fn new(provider: Arc<dyn LLMProvider>, model: impl Into<String>, timeout_secs: u64) -> Self {
        Self {
            provider,
            model: model.into(),
            max_tokens: None,
            timeout_secs,
        }
    }

    pub fn with_max_tokens(mut self, max_tokens: Option<usize>) -> Self {
        self.max_tokens = max_tokens;
        self
    }

    fn options(&self, temperature: f32) -> CompletionOptions {
        build_options(temperature, self.max_tokens)
    }
}

#[async_trait]
impl ChatModel for LlmChatModel {
    fn model_id(&self) -> &str {
        &self.model
    }

    async fn complete(&self, prompt: &str, temperature: f32) -> Result<String, ModelInvocationError> {
        let start = Instant::now();
        let messages = vec![ChatMessage::user(prompt)];
        let options = self.options(temperature);

        let call = self.provider.chat(&messages, Some(&options));
        match timeout(Duration::from_secs(self.timeout_secs), call).await {
            Ok(Ok(response)) => {
                debug!(
                    "{}: {} input tokens, {} output tokens, {:?}",
                    self.model,
                    response.prompt_tokens,
                    response.completion_tokens,
                    start.elapsed()
                );
                Ok(response.content)
            }
            Ok(Err(e)) => {
                warn!("{}: model call failed — {}", self.model, e);
                Err(ModelInvocationError::Transport {
                    message: e.to_string(),
                })
            }
            Err(_) => {
                warn!("{}: model call timed out after {}s", self.model, self.timeout_secs);
                Err(ModelInvocationError::Timeout {
                    secs: self.timeout_secs,
                })
            }
        }
    }
}

/// Build `CompletionOptions` for one call.
fn build_options(temperature: f32, max_tokens: Option<usize>) -> CompletionOptions {
    CompletionOptions {
        temperature: Some(temperature),
        max_tokens,
        ..Default::default()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn build_options_carries_temperature() {
        let opts = build_options(0.0, None);
        assert_eq!(opts.temperature, Some(0.0));
        assert_eq!(opts.max_tokens, None);
    }

    #[test]
    fn build_options_with_token_cap() {
        let opts = build_options(0.3, Some(256));
        assert_eq!(opts.max_tokens, Some(256));
    }
}
