//! Runtime: the command loop that owns the buffers, and its tick source.

pub mod command;
pub mod event_loop;
pub mod ticker;

pub use command::{FinishedSummary, RoomOverview, ScribeCommand, ScribeHandle};
pub use event_loop::ScribeRuntime;
pub use ticker::TriggerTicker;
