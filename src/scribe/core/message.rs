//! Buffered chat message model.

use chrono::{DateTime, Local, Utc};
use serde::{Deserialize, Serialize};

/// A chat message accepted for summarization.
#[derive(Clone, Debug, Eq, PartialEq, Serialize, Deserialize)]
pub struct BufferedMessage {
    /// Opaque message identifier from the chat source.
    pub id: String,
    /// Time the message was sent, on the source clock.
    pub timestamp: DateTime<Utc>,
    /// Display name of the author.
    pub sender: String,
    /// Message text, never empty.
    pub content: String,
    /// Room the message belongs to.
    pub room_topic: String,
}

impl BufferedMessage {
    /// Build a message record.
    #[must_use]
    pub fn new(
        id: impl Into<String>,
        timestamp: DateTime<Utc>,
        sender: impl Into<String>,
        content: impl Into<String>,
        room_topic: impl Into<String>,
    ) -> Self {
        Self {
            id: id.into(),
            timestamp,
            sender: sender.into(),
            content: content.into(),
            room_topic: room_topic.into(),
        }
    }

    /// Render the message as a transcript line: `[HH:MM] sender: content`.
    ///
    /// The clock time is the message's own timestamp in local wall-clock time.
    #[must_use]
    pub fn transcript_line(&self) -> String {
        format!(
            "[{}] {}: {}",
            local_clock(self.timestamp),
            self.sender,
            self.content
        )
    }
}

/// Format a timestamp as local `HH:MM`.
#[must_use]
pub fn local_clock(timestamp: DateTime<Utc>) -> String {
    timestamp.with_timezone(&Local).format("%H:%M").to_string()
}

#[cfg(test)]
mod tests {
    use chrono::TimeZone;

    use super::*;

    #[test]
    fn test_transcript_line_uses_message_time() {
        let ts = Utc.with_ymd_and_hms(2024, 3, 1, 9, 5, 0).unwrap();
        let msg = BufferedMessage::new("m1", ts, "Alice", "hello", "Team");
        let expected_clock = ts.with_timezone(&Local).format("%H:%M").to_string();
        assert_eq!(msg.transcript_line(), format!("[{expected_clock}] Alice: hello"));
    }

    #[test]
    fn test_local_clock_is_zero_padded() {
        let ts = Utc.with_ymd_and_hms(2024, 3, 1, 0, 0, 0).unwrap();
        let clock = local_clock(ts);
        assert_eq!(clock.len(), 5);
        assert_eq!(&clock[2..3], ":");
    }
}
