//! Meeting-minutes scribe for multi-room chats.
//!
//! Messages from tracked rooms are buffered per room. When a trigger fires
//! (keyword, message volume, or elapsed interval) the room is summarized by an
//! LLM backend and the report is delivered back into the chat. Only the
//! summarized messages are cleared, and only after a successful delivery.
//!
//! Layout:
//! - [`core`]: configuration, errors, message record
//! - [`buffer`]: per-room buffers and trigger policy
//! - [`intake`]: inbound event filtering
//! - [`summarization`]: backends and report generation
//! - [`delivery`]: outbound channels
//! - [`runtime`]: command loop and ticker

pub mod buffer;
pub mod core;
pub mod delivery;
pub mod intake;
pub mod runtime;
pub mod summarization;

pub use buffer::{RoomBufferStore, RoomSnapshot, RoomStats, TriggerDecision};
pub use self::core::{BufferedMessage, ScribeConfig, ScribeError, ScribeResult, SummarizationError};
pub use delivery::{Delivery, build_delivery};
pub use intake::{InboundChatEvent, IntakeFilter};
pub use runtime::{RoomOverview, ScribeHandle, ScribeRuntime, TriggerTicker};
pub use summarization::{SummaryGenerator, SummaryOutcome, Summarizer, build_summarizer};
