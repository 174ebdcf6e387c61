//! Configuration for the scribe.
//!
//! The configuration is read once at startup and shared read-only afterwards.

use std::path::PathBuf;

use serde::{Deserialize, Serialize};
use tracing::{info, warn};
use url::Url;

use crate::scribe::core::errors::{ScribeError, ScribeResult};

/// Top-level configuration for the scribe.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct ScribeConfig {
    /// Display name of the bot account, used to drop its own messages.
    pub bot_name: String,
    /// Room allow-list; empty means every room is tracked.
    pub target_rooms: Vec<String>,
    /// Summary trigger settings.
    pub summary_trigger: TriggerConfig,
    /// Maximum number of buffered messages per room.
    pub max_buffer_size: usize,
    /// Capacity of the runtime command queue.
    pub summary_queue_size: usize,
    /// Summarization backend settings.
    pub llm: LlmConfig,
    /// Report delivery settings.
    pub delivery: DeliveryConfig,
    /// HTTP intake settings.
    pub server: ServerConfig,
    /// Language used for report templates.
    pub report_language: ReportLanguage,
}

impl Default for ScribeConfig {
    fn default() -> Self {
        Self {
            bot_name: "meeting-minutes-bot".to_string(),
            target_rooms: Vec::new(),
            summary_trigger: TriggerConfig::default(),
            max_buffer_size: 200,
            summary_queue_size: 10,
            llm: LlmConfig::default(),
            delivery: DeliveryConfig::default(),
            server: ServerConfig::default(),
            report_language: ReportLanguage::default(),
        }
    }
}

impl ScribeConfig {
    /// Build the configuration from process environment variables.
    ///
    /// A `.env` file in the working directory is loaded first when present.
    ///
    /// # Errors
    /// Returns an error if the resulting configuration is invalid.
    pub fn from_env() -> ScribeResult<Self> {
        if dotenvy::dotenv().is_err() {
            info!("No .env file found, using environment variables");
        }
        let config = Self::from_lookup(|key| std::env::var(key).ok());
        config.validate()?;
        Ok(config)
    }

    /// Build the configuration from an arbitrary key lookup.
    ///
    /// Missing or unparseable values fall back to defaults.
    #[must_use]
    pub fn from_lookup<F>(lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let env = EnvReader { lookup };
        let defaults = Self::default();
        let llm_defaults = LlmConfig::default();

        let target_rooms = env
            .string("TARGET_ROOMS")
            .map(|raw| {
                raw.split(',')
                    .map(str::trim)
                    .filter(|room| !room.is_empty())
                    .map(str::to_string)
                    .collect()
            })
            .unwrap_or_default();

        let provider = match env.string("LLM_PROVIDER").as_deref() {
            Some("ollama") => LlmProvider::Ollama,
            Some("openai") | None => LlmProvider::OpenAiCompat,
            Some(other) => {
                warn!(provider = other, "Unknown LLM_PROVIDER, using openai");
                LlmProvider::OpenAiCompat
            }
        };

        let report_language = match env.string("REPORT_LANGUAGE").as_deref() {
            Some("en") => ReportLanguage::En,
            _ => ReportLanguage::Zh,
        };

        Self {
            bot_name: env
                .string("BOT_NAME")
                .unwrap_or(defaults.bot_name),
            target_rooms,
            summary_trigger: TriggerConfig {
                interval_minutes: env.number(
                    "SUMMARY_INTERVAL_MINUTES",
                    defaults.summary_trigger.interval_minutes,
                ),
                message_count: env
                    .number("SUMMARY_MESSAGE_COUNT", defaults.summary_trigger.message_count),
                keyword: env
                    .string("SUMMARY_KEYWORD")
                    .unwrap_or(defaults.summary_trigger.keyword),
                min_messages_for_summary: env.number(
                    "MIN_MESSAGES_FOR_SUMMARY",
                    defaults.summary_trigger.min_messages_for_summary,
                ),
            },
            max_buffer_size: env.number("MAX_BUFFER_SIZE", defaults.max_buffer_size),
            summary_queue_size: env.number("CONCURRENT_SUMMARY", defaults.summary_queue_size),
            llm: LlmConfig {
                provider,
                api_key: env.string("LLM_API_KEY"),
                base_url: env
                    .string("LLM_BASE_URL")
                    .unwrap_or_else(|| provider.default_base_url().to_string()),
                model: env.string("LLM_MODEL").unwrap_or(llm_defaults.model),
                temperature: env.number("LLM_TEMPERATURE", llm_defaults.temperature),
                timeout_secs: env.number("LLM_TIMEOUT_SECS", llm_defaults.timeout_secs),
                system_prompt_file: env
                    .string("SYSTEM_PROMPT_FILE")
                    .map_or(llm_defaults.system_prompt_file, PathBuf::from),
            },
            delivery: DeliveryConfig {
                webhook_url: env.string("DELIVERY_WEBHOOK_URL"),
                room: env.string("DELIVERY_ROOM"),
            },
            server: ServerConfig {
                port: env.number("SCRIBE_PORT", defaults.server.port),
            },
            report_language,
        }
    }

    /// Validate configuration invariants.
    ///
    /// # Errors
    /// Returns an error if a required credential is missing or a value is out of range.
    pub fn validate(&self) -> ScribeResult<()> {
        if self.llm.provider.requires_api_key()
            && self.llm.api_key.as_deref().is_none_or(str::is_empty)
        {
            return Err(ScribeError::InvalidConfig(
                "LLM_API_KEY is required".to_string(),
            ));
        }

        if self.max_buffer_size == 0 {
            return Err(ScribeError::InvalidConfig(
                "max_buffer_size must be > 0".to_string(),
            ));
        }

        if self.summary_queue_size == 0 {
            return Err(ScribeError::InvalidConfig(
                "summary_queue_size must be > 0".to_string(),
            ));
        }

        if self.llm.timeout_secs == 0 {
            return Err(ScribeError::InvalidConfig(
                "llm.timeout_secs must be > 0".to_string(),
            ));
        }

        Url::parse(&self.llm.base_url)?;

        if let Some(webhook_url) = &self.delivery.webhook_url {
            Url::parse(webhook_url)?;
        }

        Ok(())
    }

    /// Log the effective configuration, without secrets.
    pub fn log_summary(&self) {
        let trigger = &self.summary_trigger;
        let rooms = if self.target_rooms.is_empty() {
            "all rooms".to_string()
        } else {
            self.target_rooms.join(", ")
        };
        info!(
            bot_name = %self.bot_name,
            provider = ?self.llm.provider,
            base_url = %self.llm.base_url,
            model = %self.llm.model,
            rooms = %rooms,
            "Configuration loaded"
        );
        let keyword = if trigger.keyword.is_empty() {
            "disabled"
        } else {
            trigger.keyword.as_str()
        };
        let volume = u64::try_from(trigger.message_count).unwrap_or(u64::MAX);
        info!(
            interval = %describe_threshold(trigger.interval_minutes, "minutes"),
            volume = %describe_threshold(volume, "messages"),
            keyword = %keyword,
            floor = trigger.min_messages_for_summary,
            "Summary triggers"
        );
    }
}

fn describe_threshold(value: u64, unit: &str) -> String {
    if value == 0 {
        "disabled".to_string()
    } else {
        format!("every {value} {unit}")
    }
}

/// Summary trigger settings.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct TriggerConfig {
    /// Minutes between summaries; 0 disables the time trigger.
    pub interval_minutes: u64,
    /// Buffered message count that fires a summary; 0 disables the volume trigger.
    pub message_count: usize,
    /// Keyword that requests a summary; empty disables the keyword trigger.
    pub keyword: String,
    /// Floor below which no trigger fires.
    pub min_messages_for_summary: usize,
}

impl Default for TriggerConfig {
    fn default() -> Self {
        Self {
            interval_minutes: 30,
            message_count: 50,
            keyword: "@bot 总结".to_string(),
            min_messages_for_summary: 5,
        }
    }
}

/// Summarization backend selector.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LlmProvider {
    /// OpenAI-compatible chat completions API.
    #[default]
    OpenAiCompat,
    /// Ollama through the Rig provider.
    Ollama,
}

impl LlmProvider {
    /// Whether the provider cannot run without an API key.
    #[must_use]
    pub const fn requires_api_key(self) -> bool {
        matches!(self, Self::OpenAiCompat)
    }

    /// Endpoint used when no base URL is configured.
    #[must_use]
    pub const fn default_base_url(self) -> &'static str {
        match self {
            Self::OpenAiCompat => "https://generativelanguage.googleapis.com/v1beta/openai/",
            Self::Ollama => "http://127.0.0.1:11434",
        }
    }
}

/// Summarization backend settings.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct LlmConfig {
    /// Which backend to use.
    pub provider: LlmProvider,
    /// API key for the backend.
    #[serde(skip_serializing)]
    pub api_key: Option<String>,
    /// Base URL of the backend.
    pub base_url: String,
    /// Model name.
    pub model: String,
    /// Sampling temperature.
    pub temperature: f64,
    /// Upper bound on a single summarization call.
    pub timeout_secs: u64,
    /// File holding the system prompt; re-read before every summary.
    pub system_prompt_file: PathBuf,
}

impl Default for LlmConfig {
    fn default() -> Self {
        Self {
            provider: LlmProvider::OpenAiCompat,
            api_key: None,
            base_url: LlmProvider::OpenAiCompat.default_base_url().to_string(),
            model: "gemini-2.5-flash".to_string(),
            temperature: 0.3,
            timeout_secs: 120,
            system_prompt_file: PathBuf::from("system_prompt.txt"),
        }
    }
}

/// Report delivery settings.
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct DeliveryConfig {
    /// Webhook receiving reports; reports are only logged when unset.
    pub webhook_url: Option<String>,
    /// Alternate destination room for every report.
    pub room: Option<String>,
}

/// HTTP intake settings.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct ServerConfig {
    /// Listening port.
    pub port: u16,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self { port: 3000 }
    }
}

/// Language of the report templates.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ReportLanguage {
    /// Simplified Chinese.
    #[default]
    Zh,
    /// English.
    En,
}

struct EnvReader<F> {
    lookup: F,
}

impl<F> EnvReader<F>
where
    F: Fn(&str) -> Option<String>,
{
    fn string(&self, key: &str) -> Option<String> {
        (self.lookup)(key).filter(|value| !value.is_empty())
    }

    fn number<T>(&self, key: &str, default: T) -> T
    where
        T: std::str::FromStr + Copy + std::fmt::Display,
    {
        self.string(key).map_or(default, |raw| {
            raw.trim().parse().unwrap_or_else(|_| {
                warn!("Invalid numeric value for {key}, using default {default}");
                default
            })
        })
    }
}
