//! Summary generation.
//!
//! Provides the summarization capability, its backends, and the orchestrator
//! that turns a room buffer into a report.

pub mod generator;
pub mod ollama;
pub mod openai_compat;
pub mod prompt;
pub mod summarizer;

pub use generator::{SummaryGenerator, SummaryOutcome};
pub use ollama::OllamaSummarizer;
pub use openai_compat::OpenAiCompatSummarizer;
pub use prompt::{DEFAULT_SYSTEM_PROMPT, PromptSource};
pub use summarizer::{SummarizeFuture, Summarizer, build_summarizer};
