//! Chat completions backend for `OpenAI`-compatible services.

use std::time::Duration;

use reqwest::{Client, StatusCode};
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use crate::scribe::core::config::LlmConfig;
use crate::scribe::core::errors::{ScribeError, ScribeResult, SummarizationError};
use crate::scribe::summarization::prompt::PromptSource;
use crate::scribe::summarization::summarizer::{SummarizeFuture, Summarizer, build_user_prompt};

/// Connection timeout for the HTTP client.
const CONNECT_TIMEOUT: Duration = Duration::from_secs(10);

#[derive(Serialize)]
struct ChatMessage<'a> {
    role: &'a str,
    content: &'a str,
}

#[derive(Serialize)]
struct ChatCompletionRequest<'a> {
    model: &'a str,
    messages: Vec<ChatMessage<'a>>,
    temperature: f64,
}

#[derive(Deserialize)]
struct ChatCompletionResponse {
    #[serde(default)]
    choices: Vec<Choice>,
}

#[derive(Deserialize)]
struct Choice {
    message: Option<ChoiceMessage>,
}

#[derive(Deserialize)]
struct ChoiceMessage {
    content: Option<String>,
}

/// Summarizer speaking the `OpenAI` chat completions protocol.
pub struct OpenAiCompatSummarizer {
    client: Client,
    endpoint: String,
    api_key: String,
    model: String,
    temperature: f64,
    prompt: PromptSource,
}

impl OpenAiCompatSummarizer {
    /// Create a new backend from config.
    ///
    /// # Errors
    /// Returns an error if the API key is missing or the HTTP client cannot be built.
    pub fn new(config: &LlmConfig, prompt: PromptSource) -> ScribeResult<Self> {
        let api_key = config
            .api_key
            .clone()
            .filter(|key| !key.is_empty())
            .ok_or_else(|| ScribeError::InvalidConfig("LLM_API_KEY is required".to_string()))?;

        let client = Client::builder()
            .connect_timeout(CONNECT_TIMEOUT)
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()?;

        Ok(Self {
            client,
            endpoint: chat_completions_url(&config.base_url),
            api_key,
            model: config.model.clone(),
            temperature: config.temperature,
            prompt,
        })
    }

    async fn request(&self, lines: Vec<String>) -> Result<String, SummarizationError> {
        let system_prompt = self.prompt.load().await;
        let user_prompt = build_user_prompt(&lines);
        let body = ChatCompletionRequest {
            model: &self.model,
            messages: vec![
                ChatMessage {
                    role: "system",
                    content: &system_prompt,
                },
                ChatMessage {
                    role: "user",
                    content: &user_prompt,
                },
            ],
            temperature: self.temperature,
        };

        info!(model = %self.model, lines = lines.len(), "Sending summary request");

        let response = self
            .client
            .post(&self.endpoint)
            .bearer_auth(&self.api_key)
            .json(&body)
            .send()
            .await?;

        let status = response.status();
        if status == StatusCode::TOO_MANY_REQUESTS {
            warn!("Summarization service rate limited the request");
            return Err(SummarizationError::RateLimited);
        }
        if !status.is_success() {
            return Err(SummarizationError::HttpStatus(status.as_u16()));
        }

        let raw = response.text().await?;
        let content = extract_content(&raw)?;
        debug!(chars = content.len(), "Summary response received");
        Ok(content)
    }
}

impl Summarizer for OpenAiCompatSummarizer {
    fn summarize(&self, lines: Vec<String>) -> SummarizeFuture<'_, Result<String, SummarizationError>> {
        Box::pin(self.request(lines))
    }

    fn name(&self) -> &'static str {
        "openai-compat"
    }
}

/// Join the base URL and the chat completions path.
fn chat_completions_url(base_url: &str) -> String {
    format!("{}/chat/completions", base_url.trim_end_matches('/'))
}

/// Pull the assistant text out of a chat completions body.
///
/// A response without choices is malformed; a choice without content is an empty answer.
fn extract_content(raw: &str) -> Result<String, SummarizationError> {
    let parsed: ChatCompletionResponse = serde_json::from_str(raw)
        .map_err(|err| SummarizationError::MalformedResponse(err.to_string()))?;

    let choice = parsed.choices.into_iter().next().ok_or_else(|| {
        SummarizationError::MalformedResponse("no choices in response".to_string())
    })?;

    Ok(choice
        .message
        .and_then(|message| message.content)
        .unwrap_or_default())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_chat_completions_url() {
        assert_eq!(
            chat_completions_url("https://generativelanguage.googleapis.com/v1beta/openai/"),
            "https://generativelanguage.googleapis.com/v1beta/openai/chat/completions"
        );
        assert_eq!(
            chat_completions_url("http://localhost:8080/v1"),
            "http://localhost:8080/v1/chat/completions"
        );
    }

    #[test]
    fn test_extract_content() {
        let raw = r###"{"choices":[{"message":{"role":"assistant","content":"## 会议纪要"}}]}"###;
        assert_eq!(extract_content(raw).unwrap(), "## 会议纪要");
    }

    #[test]
    fn test_null_content_is_empty_not_error() {
        let raw = r#"{"choices":[{"message":{"role":"assistant","content":null}}]}"#;
        assert_eq!(extract_content(raw).unwrap(), "");
    }

    #[test]
    fn test_missing_choices_is_malformed() {
        let err = extract_content(r#"{"choices":[]}"#).unwrap_err();
        assert!(matches!(err, SummarizationError::MalformedResponse(_)));

        let err = extract_content("not json").unwrap_err();
        assert!(matches!(err, SummarizationError::MalformedResponse(_)));
    }

    #[test]
    fn test_requires_api_key() {
        let config = LlmConfig::default();
        let result = OpenAiCompatSummarizer::new(&config, PromptSource::new("p.txt".into()));
        assert!(matches!(result, Err(ScribeError::InvalidConfig(_))));
    }
}
