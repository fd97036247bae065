//! The per-document unit of work: extract → date → summarize → filename.
//!
//! [`DocumentPipeline`] composes the stages in [`crate::pipeline`] and reports
//! a progress checkpoint after each one. It holds no per-document state, so
//! one pipeline serves every run of the [`crate::queue::ProcessingQueue`] and
//! the one-shot [`suggest_name`] entry point alike.

use crate::config::{NominateConfig, DEFAULT_PROVIDER};
use crate::document::NameSuggestion;
use crate::error::NominateError;
use crate::pipeline::extract::{PdfiumExtractor, TextExtractor};
use crate::pipeline::llm::{ChatModel, LlmChatModel};
use crate::pipeline::{date, filename, input, summarize};
use edgequake_llm::{LLMProvider, ProviderFactory};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::Arc;
use std::time::Instant;
use tracing::{debug, info};

/// One step of the pipeline, in execution order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Stage {
    Extract,
    ResolveDate,
    Summarize,
    SynthesizeFilename,
}

impl Stage {
    pub const ALL: [Stage; 4] = [
        Stage::Extract,
        Stage::ResolveDate,
        Stage::Summarize,
        Stage::SynthesizeFilename,
    ];

    /// Document progress once this stage has completed.
    pub fn progress(self) -> f32 {
        match self {
            Stage::Extract => 0.25,
            Stage::ResolveDate => 0.5,
            Stage::Summarize => 0.75,
            Stage::SynthesizeFilename => 1.0,
        }
    }
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Stage::Extract => "extract",
            Stage::ResolveDate => "date",
            Stage::Summarize => "summarize",
            Stage::SynthesizeFilename => "filename",
        };
        f.write_str(s)
    }
}

/// Runs the four stages for one document source.
pub struct DocumentPipeline {
    extractor: Arc<dyn TextExtractor>,
    model: Arc<dyn ChatModel>,
    temperature: f32,
    password: Option<String>,
    download_timeout_secs: u64,
}

impl DocumentPipeline {
    /// Build a pipeline from explicit stage implementations.
    ///
    /// Only the run-level settings of `config` are read (temperature, password,
    /// download timeout); model selection is up to the caller.
    pub fn new(
        extractor: Arc<dyn TextExtractor>,
        model: Arc<dyn ChatModel>,
        config: &NominateConfig,
    ) -> Self {
        Self {
            extractor,
            model,
            temperature: config.temperature,
            password: config.password.clone(),
            download_timeout_secs: config.download_timeout_secs,
        }
    }

    /// Build the production pipeline: pdfium extraction and the configured model.
    pub fn from_config(config: &NominateConfig) -> Result<Self, NominateError> {
        let model = resolve_chat_model(config)?;
        Ok(Self::new(Arc::new(PdfiumExtractor::new()), model, config))
    }

    pub fn model_id(&self) -> &str {
        self.model.model_id()
    }

    /// Run every stage for `source`, calling `on_stage` after each one.
    ///
    /// The first failing stage aborts the run; later stages are not attempted.
    pub async fn run(
        &self,
        source: &str,
        on_stage: &(dyn Fn(Stage) + Send + Sync),
    ) -> Result<NameSuggestion, NominateError> {
        let start = Instant::now();
        let model = self.model.as_ref();

        // ── Extract ──────────────────────────────────────────────────────
        let resolved = input::resolve_input(source, self.download_timeout_secs).await?;
        let text = self
            .extractor
            .extract(resolved.path(), self.password.as_deref())
            .await?;
        debug!("Extracted {} chars from {}", text.len(), source);
        on_stage(Stage::Extract);

        // ── Resolve date ─────────────────────────────────────────────────
        let resolved_date = date::resolve_date(model, &text, self.temperature)
            .await
            .map_err(|e| NominateError::model(Stage::ResolveDate, e))?;
        on_stage(Stage::ResolveDate);

        // ── Summarize ────────────────────────────────────────────────────
        let summary = summarize::summarize(model, &text, self.temperature)
            .await
            .map_err(|e| NominateError::model(Stage::Summarize, e))?;
        on_stage(Stage::Summarize);

        // ── Synthesize filename ──────────────────────────────────────────
        let extension = resolved.extension();
        let name = filename::synthesize(
            model,
            &summary,
            resolved_date,
            extension.as_deref(),
            self.temperature,
        )
        .await
        .map_err(|e| NominateError::model(Stage::SynthesizeFilename, e))?;
        on_stage(Stage::SynthesizeFilename);

        info!(
            "Named {} → {:?} in {}ms",
            source,
            name,
            start.elapsed().as_millis()
        );

        Ok(NameSuggestion {
            filename: name,
            date: resolved_date,
            summary,
        })
    }
}

/// Suggest a filename for one PDF file or URL without a queue.
///
/// # Example
/// ```rust,no_run
/// use nominate::{suggest_name, NominateConfig};
///
/// # #[tokio::main]
/// # async fn main() -> Result<(), Box<dyn std::error::Error>> {
/// let config = NominateConfig::default();
/// let suggestion = suggest_name("scan_0001.pdf", &config).await?;
/// println!("{}", suggestion.filename);
/// # Ok(())
/// # }
/// ```
pub async fn suggest_name(
    input_str: impl AsRef<str>,
    config: &NominateConfig,
) -> Result<NameSuggestion, NominateError> {
    let pipeline = DocumentPipeline::from_config(config)?;
    pipeline.run(input_str.as_ref(), &|_| {}).await
}

/// Synchronous wrapper around [`suggest_name`].
///
/// Creates a temporary tokio runtime internally.
pub fn suggest_name_sync(
    input_str: impl AsRef<str>,
    config: &NominateConfig,
) -> Result<NameSuggestion, NominateError> {
    tokio::runtime::Runtime::new()
        .map_err(|e| NominateError::Internal(format!("Failed to create tokio runtime: {}", e)))?
        .block_on(suggest_name(input_str, config))
}

// ── Model resolution ─────────────────────────────────────────────────────

/// Resolve the chat model, from most-specific to least-specific.
///
/// 1. **Pre-built chat model** (`config.chat_model`) — used as-is.
/// 2. **Pre-built provider** (`config.provider`) — wrapped with the configured
///    model id, timeout and token cap.
/// 3. **Named provider** (`config.provider_name`) — created through
///    [`ProviderFactory::create_llm_provider`], which reads the matching API
///    key from the environment.
/// 4. **Environment pair** (`EDGEQUAKE_LLM_PROVIDER` + `EDGEQUAKE_MODEL`) —
///    honoured only when both are set and non-empty.
/// 5. **Local default** — Ollama with [`NominateConfig::model_id`]. No API key
///    is needed and no document text leaves the machine.
pub fn resolve_chat_model(config: &NominateConfig) -> Result<Arc<dyn ChatModel>, NominateError> {
    if let Some(ref model) = config.chat_model {
        return Ok(Arc::clone(model));
    }

    if let Some(ref provider) = config.provider {
        return Ok(wrap_provider(Arc::clone(provider), config.model_id(), config));
    }

    if let Some(ref name) = config.provider_name {
        let provider = create_provider(name, config.model_id())?;
        return Ok(wrap_provider(provider, config.model_id(), config));
    }

    if let (Ok(prov), Ok(model)) = (
        std::env::var("EDGEQUAKE_LLM_PROVIDER"),
        std::env::var("EDGEQUAKE_MODEL"),
    ) {
        if !prov.is_empty() && !model.is_empty() {
            let provider = create_provider(&prov, &model)?;
            return Ok(wrap_provider(provider, &model, config));
        }
    }

    let provider = create_provider(DEFAULT_PROVIDER, config.model_id())?;
    Ok(wrap_provider(provider, config.model_id(), config))
}

fn create_provider(provider_name: &str, model: &str) -> Result<Arc<dyn LLMProvider>, NominateError> {
    debug!("Creating provider {} with model {}", provider_name, model);
    ProviderFactory::create_llm_provider(provider_name, model).map_err(|e| {
        NominateError::ProviderNotConfigured {
            provider: provider_name.to_string(),
            hint: format!("{e}"),
        }
    })
}

fn wrap_provider(
    provider: Arc<dyn LLMProvider>,
    model: &str,
    config: &NominateConfig,
) -> Arc<dyn ChatModel> {
    Arc::new(
        LlmChatModel::new(provider, model, config.api_timeout_secs)
            .with_max_tokens(config.max_tokens),
    )
}
