//! Summarization: a short description of the document used to build its name.

use crate::error::ModelInvocationError;
use crate::pipeline::llm::ChatModel;
use crate::prompts::summary_prompt;
use tracing::debug;

/// Ask the model to summarise `text`.
///
/// The answer is only trimmed. The word limit is stated in the prompt but not
/// enforced here; an empty answer yields an empty summary.
pub async fn summarize(
    model: &dyn ChatModel,
    text: &str,
    temperature: f32,
) -> Result<String, ModelInvocationError> {
    let answer = model.complete(&summary_prompt(text), temperature).await?;
    let summary = answer.trim().to_string();
    debug!("Summary: {} words", summary.split_whitespace().count());
    Ok(summary)
}
