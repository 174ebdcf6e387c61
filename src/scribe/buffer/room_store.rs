//! Per-room message buffers.
//!
//! The store owns every room's ordered message sequence together with its
//! last-summary timestamp. It is owned by a single task, so no locking is done
//! here; callers serialize access through the runtime command loop.

use std::collections::{BTreeSet, HashMap, VecDeque};

use chrono::{DateTime, Utc};
use serde::Serialize;
use tracing::{debug, info};

use crate::scribe::buffer::trigger::{self, TriggerDecision, TriggerInput};
use crate::scribe::core::config::TriggerConfig;
use crate::scribe::core::message::BufferedMessage;

/// Aggregate view of a room's buffer.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize)]
pub struct RoomStats {
    /// Number of buffered messages.
    pub count: usize,
    /// Timestamp of the oldest buffered message.
    pub first_message_time: Option<DateTime<Utc>>,
    /// Timestamp of the newest buffered message.
    pub last_message_time: Option<DateTime<Utc>>,
    /// Distinct sender names.
    pub participants: BTreeSet<String>,
}

/// Point-in-time copy of a room taken before a summary is generated.
#[derive(Clone, Debug)]
pub struct RoomSnapshot {
    /// Room the snapshot belongs to.
    pub room_topic: String,
    /// Stats at snapshot time.
    pub stats: RoomStats,
    /// Transcript lines in arrival order.
    pub lines: Vec<String>,
    /// Sequence number of the newest message covered, if any.
    pub through_seq: Option<u64>,
}

#[derive(Clone, Debug)]
struct SequencedMessage {
    seq: u64,
    message: BufferedMessage,
}

#[derive(Debug, Default)]
struct RoomBufferState {
    messages: VecDeque<SequencedMessage>,
    last_summary_time: Option<DateTime<Utc>>,
    next_seq: u64,
}

impl RoomBufferState {
    fn stats(&self) -> RoomStats {
        RoomStats {
            count: self.messages.len(),
            first_message_time: self.messages.front().map(|entry| entry.message.timestamp),
            last_message_time: self.messages.back().map(|entry| entry.message.timestamp),
            participants: self
                .messages
                .iter()
                .map(|entry| entry.message.sender.clone())
                .collect(),
        }
    }
}

/// Buffers of all tracked rooms, keyed by room topic.
#[derive(Debug)]
pub struct RoomBufferStore {
    trigger: TriggerConfig,
    max_buffer_size: usize,
    rooms: HashMap<String, RoomBufferState>,
}

impl RoomBufferStore {
    /// Create an empty store.
    #[must_use]
    pub fn new(trigger: TriggerConfig, max_buffer_size: usize) -> Self {
        Self {
            trigger,
            max_buffer_size,
            rooms: HashMap::new(),
        }
    }

    /// Append a message to its room, evicting the oldest entries beyond capacity.
    pub fn add(&mut self, message: BufferedMessage) {
        let max = self.max_buffer_size;
        let room_topic = message.room_topic.clone();
        let room = self.rooms.entry(room_topic.clone()).or_default();

        let seq = room.next_seq;
        room.next_seq += 1;
        room.messages.push_back(SequencedMessage { seq, message });

        if room.messages.len() > max {
            let remove_count = room.messages.len() - max;
            room.messages.drain(..remove_count);
            info!(
                room = %room_topic,
                removed = remove_count,
                max_size = max,
                "Evicted old messages"
            );
        }

        debug!(room = %room_topic, total = room.messages.len(), "Message buffered");
    }

    /// Copy of the room's messages in arrival order.
    #[must_use]
    pub fn get_messages(&self, room_topic: &str) -> Vec<BufferedMessage> {
        self.rooms
            .get(room_topic)
            .map(|room| room.messages.iter().map(|entry| entry.message.clone()).collect())
            .unwrap_or_default()
    }

    /// Rooms holding at least one message.
    #[must_use]
    pub fn get_room_topics(&self) -> Vec<String> {
        self.rooms
            .iter()
            .filter(|(_, room)| !room.messages.is_empty())
            .map(|(topic, _)| topic.clone())
            .collect()
    }

    /// Empty a room and record the summary time. Unknown rooms are left untouched.
    pub fn clear(&mut self, room_topic: &str) {
        self.clear_at(room_topic, Utc::now());
    }

    /// [`Self::clear`] with an explicit clock.
    pub fn clear_at(&mut self, room_topic: &str, now: DateTime<Utc>) {
        let Some(room) = self.rooms.get_mut(room_topic) else {
            return;
        };
        let count = room.messages.len();
        room.messages.clear();
        room.last_summary_time = Some(now);
        info!(room = %room_topic, cleared = count, "Cleared room buffer");
    }

    /// Remove the messages covered by a snapshot and record the summary time.
    ///
    /// Messages buffered after the snapshot was taken are kept.
    pub fn clear_through(&mut self, room_topic: &str, through_seq: u64) {
        let Some(room) = self.rooms.get_mut(room_topic) else {
            return;
        };
        let before = room.messages.len();
        room.messages.retain(|entry| entry.seq > through_seq);
        room.last_summary_time = Some(Utc::now());
        info!(
            room = %room_topic,
            cleared = before - room.messages.len(),
            kept = room.messages.len(),
            "Cleared summarized messages"
        );
    }

    /// Last summary time of a room.
    #[must_use]
    pub fn last_summary_time(&self, room_topic: &str) -> Option<DateTime<Utc>> {
        self.rooms
            .get(room_topic)
            .and_then(|room| room.last_summary_time)
    }

    /// Whether a summary should fire for the room now.
    #[must_use]
    pub fn should_summarize(&self, room_topic: &str, triggered_by_keyword: bool) -> bool {
        self.evaluate_at(room_topic, triggered_by_keyword, Utc::now())
            .fires()
    }

    /// Evaluate the trigger policy for a room at a given instant.
    #[must_use]
    pub fn evaluate_at(
        &self,
        room_topic: &str,
        triggered_by_keyword: bool,
        now: DateTime<Utc>,
    ) -> TriggerDecision {
        let Some(room) = self.rooms.get(room_topic) else {
            return TriggerDecision::Idle;
        };

        let input = TriggerInput {
            message_count: room.messages.len(),
            last_summary_time: room.last_summary_time,
            triggered_by_keyword,
        };
        let decision = trigger::evaluate(&self.trigger, input, now);

        match decision {
            TriggerDecision::BelowFloor => debug!(
                room = %room_topic,
                count = input.message_count,
                min = self.trigger.min_messages_for_summary,
                "Not enough messages for summary"
            ),
            TriggerDecision::Idle => {}
            reason => info!(
                room = %room_topic,
                count = input.message_count,
                ?reason,
                "Summary triggered"
            ),
        }

        decision
    }

    /// Transcript lines for the room, one per message, in arrival order.
    ///
    /// The iterator is lazy and can be cloned to restart it.
    pub fn format_messages_for_llm(
        &self,
        room_topic: &str,
    ) -> impl Iterator<Item = String> + Clone + '_ {
        self.rooms
            .get(room_topic)
            .into_iter()
            .flat_map(|room| room.messages.iter())
            .map(|entry| entry.message.transcript_line())
    }

    /// Stats of the room's current buffer.
    #[must_use]
    pub fn get_stats(&self, room_topic: &str) -> RoomStats {
        self.rooms
            .get(room_topic)
            .map(RoomBufferState::stats)
            .unwrap_or_default()
    }

    /// Copy everything a summary needs out of the room.
    #[must_use]
    pub fn snapshot(&self, room_topic: &str) -> RoomSnapshot {
        RoomSnapshot {
            room_topic: room_topic.to_string(),
            stats: self.get_stats(room_topic),
            lines: self.format_messages_for_llm(room_topic).collect(),
            through_seq: self
                .rooms
                .get(room_topic)
                .and_then(|room| room.messages.back())
                .map(|entry| entry.seq),
        }
    }
}
