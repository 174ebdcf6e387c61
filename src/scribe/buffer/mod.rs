//! Room buffering and trigger evaluation.

pub mod room_store;
pub mod trigger;

pub use room_store::{RoomBufferStore, RoomSnapshot, RoomStats};
pub use trigger::{TriggerDecision, TriggerInput, evaluate};
