//! Message intake from the chat gateway.

pub mod adapter;

pub use adapter::{AcceptedMessage, InboundChatEvent, IntakeFilter, IntakeRejection};
