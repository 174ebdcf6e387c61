//! Core scribe types: configuration, errors, and the buffered message record.

pub mod config;
pub mod errors;
pub mod message;

pub use config::{
    DeliveryConfig, LlmConfig, LlmProvider, ReportLanguage, ScribeConfig, ServerConfig,
    TriggerConfig,
};
pub use errors::{ScribeError, ScribeResult, SummarizationError};
pub use message::{BufferedMessage, local_clock};
