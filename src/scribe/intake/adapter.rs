//! Inbound chat event normalization.
//!
//! Filters out events that must not be buffered and turns the rest into
//! [`BufferedMessage`] records, noting whether they carry the summary keyword.

use chrono::{DateTime, Utc};
use serde::Deserialize;
use tracing::debug;
use uuid::Uuid;

use crate::scribe::core::config::ScribeConfig;
use crate::scribe::core::message::BufferedMessage;

/// Chat event as delivered by the chat gateway.
#[derive(Clone, Debug, Deserialize)]
pub struct InboundChatEvent {
    /// Source message id; generated when absent.
    #[serde(default)]
    pub id: Option<String>,
    /// Source timestamp; receive time when absent.
    #[serde(default)]
    pub timestamp: Option<DateTime<Utc>>,
    /// Author display name.
    pub sender: String,
    /// Raw message text.
    pub content: String,
    /// Room the message was posted in; empty for direct messages.
    #[serde(default)]
    pub room_topic: String,
    /// Whether the bot account itself sent the message.
    #[serde(default)]
    pub from_self: bool,
}

/// Why an event was not buffered.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum IntakeRejection {
    /// Sent by the bot itself.
    SelfAuthored,
    /// Not posted in a room.
    NoRoom,
    /// Blank text.
    EmptyText,
    /// Room not on the allow-list.
    UntrackedRoom,
}

/// Event accepted for buffering.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct AcceptedMessage {
    /// Normalized record.
    pub message: BufferedMessage,
    /// Whether the text contains the summary keyword.
    pub keyword_triggered: bool,
}

/// Intake filter built from configuration.
#[derive(Clone, Debug)]
pub struct IntakeFilter {
    bot_name: String,
    target_rooms: Vec<String>,
    keyword: String,
}

impl IntakeFilter {
    /// Build the filter from configuration.
    #[must_use]
    pub fn new(config: &ScribeConfig) -> Self {
        Self {
            bot_name: config.bot_name.clone(),
            target_rooms: config
                .target_rooms
                .iter()
                .map(|room| room.to_lowercase())
                .collect(),
            keyword: config.summary_trigger.keyword.clone(),
        }
    }

    /// Whether the room is tracked: case-insensitive substring match, all rooms when empty.
    #[must_use]
    pub fn is_target_room(&self, room_topic: &str) -> bool {
        if self.target_rooms.is_empty() {
            return true;
        }
        let room = room_topic.to_lowercase();
        self.target_rooms.iter().any(|target| room.contains(target))
    }

    /// Whether the raw text carries the summary keyword.
    #[must_use]
    pub fn is_keyword_trigger(&self, text: &str) -> bool {
        !self.keyword.is_empty() && text.contains(&self.keyword)
    }

    /// Normalize an inbound event.
    ///
    /// # Errors
    /// Returns the rejection reason when the event must be dropped.
    pub fn accept(&self, event: InboundChatEvent) -> Result<AcceptedMessage, IntakeRejection> {
        let rejection = if event.from_self || event.sender == self.bot_name {
            Some(IntakeRejection::SelfAuthored)
        } else if event.room_topic.trim().is_empty() {
            Some(IntakeRejection::NoRoom)
        } else if event.content.trim().is_empty() {
            Some(IntakeRejection::EmptyText)
        } else if !self.is_target_room(&event.room_topic) {
            Some(IntakeRejection::UntrackedRoom)
        } else {
            None
        };

        if let Some(reason) = rejection {
            debug!(room = %event.room_topic, ?reason, "Dropped inbound event");
            return Err(reason);
        }

        let keyword_triggered = self.is_keyword_trigger(&event.content);
        let message = BufferedMessage {
            id: event.id.unwrap_or_else(|| Uuid::new_v4().to_string()),
            timestamp: event.timestamp.unwrap_or_else(Utc::now),
            sender: event.sender,
            content: event.content,
            room_topic: event.room_topic,
        };

        Ok(AcceptedMessage {
            message,
            keyword_triggered,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn filter(rooms: &[&str]) -> IntakeFilter {
        let config = ScribeConfig {
            bot_name: "scribe".to_string(),
            target_rooms: rooms.iter().map(|r| (*r).to_string()).collect(),
            ..ScribeConfig::default()
        };
        IntakeFilter::new(&config)
    }

    fn event(room: &str, sender: &str, content: &str) -> InboundChatEvent {
        InboundChatEvent {
            id: Some("m1".to_string()),
            timestamp: None,
            sender: sender.to_string(),
            content: content.to_string(),
            room_topic: room.to_string(),
            from_self: false,
        }
    }

    #[test]
    fn test_empty_allow_list_tracks_all_rooms() {
        assert!(filter(&[]).is_target_room("anything"));
    }

    #[test]
    fn test_allow_list_is_case_insensitive_substring() {
        let filter = filter(&["Project"]);
        assert!(filter.is_target_room("Weekly project sync"));
        assert!(filter.is_target_room("PROJECT-X"));
        assert!(!filter.is_target_room("Lunch"));
    }

    #[test]
    fn test_rejects_self_and_blank_messages() {
        let filter = filter(&[]);
        let mut own = event("Team", "alice", "hi");
        own.from_self = true;
        assert_eq!(filter.accept(own), Err(IntakeRejection::SelfAuthored));
        assert_eq!(
            filter.accept(event("Team", "scribe", "hi")),
            Err(IntakeRejection::SelfAuthored)
        );
        assert_eq!(
            filter.accept(event("Team", "alice", "  \n\t")),
            Err(IntakeRejection::EmptyText)
        );
        assert_eq!(
            filter.accept(event("", "alice", "hi")),
            Err(IntakeRejection::NoRoom)
        );
    }

    #[test]
    fn test_rejects_untracked_room() {
        assert_eq!(
            filter(&["ops"]).accept(event("Lunch", "alice", "hi")),
            Err(IntakeRejection::UntrackedRoom)
        );
    }

    #[test]
    fn test_accepts_and_detects_keyword() {
        let accepted = filter(&[]).accept(event("Team", "alice", "ok @bot 总结 please")).unwrap();
        assert!(accepted.keyword_triggered);
        assert_eq!(accepted.message.id, "m1");
        assert_eq!(accepted.message.room_topic, "Team");
        assert_eq!(accepted.message.sender, "alice");
    }

    #[test]
    fn test_missing_id_is_generated() {
        let mut raw = event("Team", "alice", "hello");
        raw.id = None;
        let accepted = filter(&[]).accept(raw).unwrap();
        assert!(!accepted.message.id.is_empty());
        assert!(!accepted.keyword_triggered);
    }

    #[test]
    fn test_event_deserializes_with_defaults() {
        let raw = r#"{"sender":"bob","content":"hey","room_topic":"Team"}"#;
        let parsed: InboundChatEvent = serde_json::from_str(raw).unwrap();
        assert!(parsed.id.is_none());
        assert!(!parsed.from_self);
    }
}
