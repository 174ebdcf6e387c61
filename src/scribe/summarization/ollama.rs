//! Ollama backend through the Rig provider.

use reqwest::Client as ReqwestClient;
use rig::client::CompletionClient;
use rig::completion::CompletionModel;
use rig::message::AssistantContent;
use rig::providers::ollama;
use tracing::debug;

use crate::scribe::core::config::LlmConfig;
use crate::scribe::core::errors::{ScribeError, ScribeResult, SummarizationError};
use crate::scribe::summarization::prompt::PromptSource;
use crate::scribe::summarization::summarizer::{SummarizeFuture, Summarizer, build_user_prompt};

/// Summarizer backed by a local or remote Ollama server.
pub struct OllamaSummarizer {
    model: ollama::CompletionModel,
    temperature: f64,
    prompt: PromptSource,
}

impl OllamaSummarizer {
    /// Create a new Ollama summarizer.
    ///
    /// # Errors
    /// Returns an error if the Ollama client cannot be built.
    pub fn new(config: &LlmConfig, prompt: PromptSource) -> ScribeResult<Self> {
        let client = ollama::Client::<ReqwestClient>::builder()
            .api_key(rig::client::Nothing)
            .base_url(&config.base_url)
            .build()
            .map_err(ScribeError::from)?;
        let model = client.completion_model(config.model.clone());

        Ok(Self {
            model,
            temperature: config.temperature,
            prompt,
        })
    }

    async fn request(&self, lines: Vec<String>) -> Result<String, SummarizationError> {
        let system_prompt = self.prompt.load().await;
        debug!("Summarizing {} lines with Ollama", lines.len());

        let request = self
            .model
            .completion_request(build_user_prompt(&lines))
            .preamble(system_prompt)
            .temperature(self.temperature)
            .build();

        let response = self.model.completion(request).await?;
        Ok(extract_text(&response.choice))
    }
}

impl Summarizer for OllamaSummarizer {
    fn summarize(&self, lines: Vec<String>) -> SummarizeFuture<'_, Result<String, SummarizationError>> {
        Box::pin(self.request(lines))
    }

    fn name(&self) -> &'static str {
        "ollama"
    }
}

/// Extract text from assistant response.
fn extract_text(choice: &rig::OneOrMany<AssistantContent>) -> String {
    let mut out = String::new();
    for content in choice.iter() {
        if let AssistantContent::Text(text) = content {
            out.push_str(&text.text);
        }
    }
    out
}
