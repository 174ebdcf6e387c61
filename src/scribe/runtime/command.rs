//! Commands accepted by the runtime loop and the handle used to send them.

use chrono::{DateTime, Utc};
use serde::Serialize;
use tokio::sync::{mpsc, oneshot};

use crate::scribe::buffer::room_store::RoomStats;
use crate::scribe::core::errors::{ScribeError, ScribeResult};
use crate::scribe::intake::adapter::InboundChatEvent;
use crate::scribe::summarization::generator::SummaryOutcome;

/// Work item processed by the runtime loop, one at a time.
#[derive(Debug)]
pub enum ScribeCommand {
    /// A chat event arrived from the gateway.
    MessageArrived(InboundChatEvent),
    /// The periodic timer fired at the given instant.
    TimerTick(DateTime<Utc>),
    /// An operator asked for a summary of a room.
    SummarizeNow {
        /// Room to summarize.
        room_topic: String,
        /// Receives whether a summary was started.
        reply: oneshot::Sender<bool>,
    },
    /// An operator asked for buffer stats.
    RoomStats {
        /// Receives one entry per non-empty room.
        reply: oneshot::Sender<Vec<RoomOverview>>,
    },
    /// A spawned summary finished generating and delivering.
    SummaryFinished(FinishedSummary),
}

/// Result of a spawned summary task.
#[derive(Debug)]
pub struct FinishedSummary {
    /// Room the summary was generated for.
    pub room_topic: String,
    /// Newest sequence number covered by the summary.
    pub through_seq: Option<u64>,
    /// What the generator produced.
    pub outcome: SummaryOutcome,
    /// Whether the delivery channel accepted the text.
    pub delivered: bool,
}

/// Buffer state of one room, as reported to operators.
#[derive(Clone, Debug, Serialize)]
pub struct RoomOverview {
    /// Room topic.
    pub room_topic: String,
    /// Current buffer stats.
    pub stats: RoomStats,
    /// Time of the last successful summary.
    pub last_summary_time: Option<DateTime<Utc>>,
    /// Whether a summary is being generated right now.
    pub summary_in_flight: bool,
}

/// Cloneable sender side of the runtime command queue.
#[derive(Clone, Debug)]
pub struct ScribeHandle {
    sender: mpsc::Sender<ScribeCommand>,
}

impl ScribeHandle {
    /// Wrap a command sender.
    #[must_use]
    pub const fn new(sender: mpsc::Sender<ScribeCommand>) -> Self {
        Self { sender }
    }

    /// Queue an inbound chat event.
    ///
    /// # Errors
    /// Returns an error if the runtime has stopped.
    pub async fn submit_message(&self, event: InboundChatEvent) -> ScribeResult<()> {
        self.send(ScribeCommand::MessageArrived(event)).await
    }

    /// Ask for a summary of a room, subject to the message floor.
    ///
    /// # Errors
    /// Returns an error if the runtime has stopped.
    pub async fn summarize_now(&self, room_topic: impl Into<String>) -> ScribeResult<bool> {
        let (reply, response) = oneshot::channel();
        self.send(ScribeCommand::SummarizeNow {
            room_topic: room_topic.into(),
            reply,
        })
        .await?;
        response.await.map_err(|_| ScribeError::RuntimeClosed)
    }

    /// Fetch stats of every non-empty room.
    ///
    /// # Errors
    /// Returns an error if the runtime has stopped.
    pub async fn room_stats(&self) -> ScribeResult<Vec<RoomOverview>> {
        let (reply, response) = oneshot::channel();
        self.send(ScribeCommand::RoomStats { reply }).await?;
        response.await.map_err(|_| ScribeError::RuntimeClosed)
    }

    /// Queue a timer tick stamped `at` without waiting; a full queue drops the tick.
    ///
    /// # Errors
    /// Returns an error if the queue is full or the runtime has stopped.
    pub fn try_tick(&self, at: DateTime<Utc>) -> Result<(), mpsc::error::TrySendError<ScribeCommand>> {
        self.sender.try_send(ScribeCommand::TimerTick(at))
    }

    pub(crate) async fn send(&self, command: ScribeCommand) -> ScribeResult<()> {
        self.sender
            .send(command)
            .await
            .map_err(|_| ScribeError::RuntimeClosed)
    }
}
