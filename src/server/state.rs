//! Application state shared across all request handlers.

use std::sync::Arc;

use crate::scribe::runtime::command::ScribeHandle;

/// Shared application state.
pub struct AppState {
    /// Sender side of the scribe runtime.
    pub scribe: ScribeHandle,
}

impl AppState {
    /// Create a new application state.
    #[must_use]
    pub fn new(scribe: ScribeHandle) -> Arc<Self> {
        Arc::new(Self { scribe })
    }
}
