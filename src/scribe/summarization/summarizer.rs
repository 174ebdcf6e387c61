//! Summarization capability shared by every backend.

use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;

use crate::scribe::core::config::{LlmConfig, LlmProvider};
use crate::scribe::core::errors::{ScribeResult, SummarizationError};
use crate::scribe::summarization::ollama::OllamaSummarizer;
use crate::scribe::summarization::openai_compat::OpenAiCompatSummarizer;
use crate::scribe::summarization::prompt::PromptSource;

/// Boxed future type for summarizer operations.
pub type SummarizeFuture<'a, T> = Pin<Box<dyn Future<Output = T> + Send + 'a>>;

/// Trait abstraction over text-generation backends.
pub trait Summarizer: Send + Sync {
    /// Condense transcript lines into meeting minutes.
    ///
    /// `Ok` with an empty string means the service answered without content.
    ///
    /// # Errors
    /// Returns an error if the service cannot be reached or its answer is unusable.
    fn summarize(&self, lines: Vec<String>) -> SummarizeFuture<'_, Result<String, SummarizationError>>;

    /// Backend name used in logs.
    fn name(&self) -> &'static str;
}

/// Build the summarizer selected by configuration.
///
/// # Errors
/// Returns an error if the backend client cannot be built.
pub fn build_summarizer(config: &LlmConfig) -> ScribeResult<Arc<dyn Summarizer>> {
    let prompt = PromptSource::new(config.system_prompt_file.clone());
    let summarizer: Arc<dyn Summarizer> = match config.provider {
        LlmProvider::OpenAiCompat => Arc::new(OpenAiCompatSummarizer::new(config, prompt)?),
        LlmProvider::Ollama => Arc::new(OllamaSummarizer::new(config, prompt)?),
    };
    Ok(summarizer)
}

/// User prompt wrapping the transcript.
#[must_use]
pub fn build_user_prompt(lines: &[String]) -> String {
    format!("请为以下群聊消息生成会议纪要：\n\n{}", lines.join("\n"))
}
