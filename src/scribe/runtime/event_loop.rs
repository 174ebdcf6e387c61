//! Single-owner runtime loop.
//!
//! The loop owns the room buffers and processes [`ScribeCommand`]s in arrival
//! order. Summaries run as spawned tasks over a snapshot; their completion
//! comes back through the same queue, so the buffers are never shared.

use std::collections::HashSet;
use std::sync::Arc;

use chrono::{DateTime, Utc};
use tokio::sync::{Notify, mpsc};
use tokio::task::JoinHandle;
use tracing::{debug, error, info, warn};

use crate::scribe::buffer::room_store::RoomBufferStore;
use crate::scribe::core::config::{DeliveryConfig, ScribeConfig};
use crate::scribe::delivery::sink::{Delivery, destination};
use crate::scribe::intake::adapter::{InboundChatEvent, IntakeFilter};
use crate::scribe::runtime::command::{FinishedSummary, RoomOverview, ScribeCommand, ScribeHandle};
use crate::scribe::summarization::generator::{SummaryGenerator, SummaryOutcome};

/// Owns all mutable state and drives triggers, summaries and deliveries.
pub struct ScribeRuntime {
    store: RoomBufferStore,
    filter: IntakeFilter,
    generator: Arc<SummaryGenerator>,
    delivery: Arc<dyn Delivery>,
    delivery_config: DeliveryConfig,
    in_flight: HashSet<String>,
    handle: ScribeHandle,
    commands: mpsc::Receiver<ScribeCommand>,
    shutdown: Arc<Notify>,
}

impl ScribeRuntime {
    /// Create the runtime and the handle used to feed it.
    #[must_use]
    pub fn new(
        config: &ScribeConfig,
        generator: Arc<SummaryGenerator>,
        delivery: Arc<dyn Delivery>,
    ) -> (Self, ScribeHandle) {
        let (sender, commands) = mpsc::channel(config.summary_queue_size.max(1));
        let handle = ScribeHandle::new(sender);
        let runtime = Self {
            store: RoomBufferStore::new(config.summary_trigger.clone(), config.max_buffer_size),
            filter: IntakeFilter::new(config),
            generator,
            delivery,
            delivery_config: config.delivery.clone(),
            in_flight: HashSet::new(),
            handle: handle.clone(),
            commands,
            shutdown: Arc::new(Notify::new()),
        };
        (runtime, handle)
    }

    /// Get a shutdown notifier to stop the loop.
    #[must_use]
    pub fn shutdown_notifier(&self) -> Arc<Notify> {
        Arc::clone(&self.shutdown)
    }

    /// Spawn the loop as a tokio task.
    #[must_use]
    pub fn spawn(self) -> JoinHandle<()> {
        tokio::spawn(self.run())
    }

    /// Process commands until shutdown is signaled.
    pub async fn run(mut self) {
        info!("Scribe runtime started");
        loop {
            tokio::select! {
                command = self.commands.recv() => match command {
                    Some(command) => self.handle_command(command),
                    None => break,
                },
                () = self.shutdown.notified() => {
                    info!(in_flight = self.in_flight.len(), "Scribe runtime shutting down");
                    break;
                }
            }
        }
    }

    fn handle_command(&mut self, command: ScribeCommand) {
        match command {
            ScribeCommand::MessageArrived(event) => self.on_message(event),
            ScribeCommand::TimerTick(at) => self.on_tick(at),
            ScribeCommand::SummarizeNow { room_topic, reply } => {
                let started = self.store.should_summarize(&room_topic, true)
                    && self.start_summary(&room_topic);
                if reply.send(started).is_err() {
                    debug!(room = %room_topic, "Summarize requester went away");
                }
            }
            ScribeCommand::RoomStats { reply } => {
                let _ = reply.send(self.overview());
            }
            ScribeCommand::SummaryFinished(finished) => self.on_summary_finished(finished),
        }
    }

    fn on_message(&mut self, event: InboundChatEvent) {
        let Ok(accepted) = self.filter.accept(event) else {
            return;
        };
        let room_topic = accepted.message.room_topic.clone();
        self.store.add(accepted.message);

        if self.store.should_summarize(&room_topic, accepted.keyword_triggered) {
            self.start_summary(&room_topic);
        }
    }

    /// Re-evaluate every buffered room against the tick instant.
    fn on_tick(&mut self, at: DateTime<Utc>) {
        for room_topic in self.store.get_room_topics() {
            let decision = self.store.evaluate_at(&room_topic, false, at);
            if decision.fires() && self.start_summary(&room_topic) {
                debug!(room = %room_topic, ?decision, "Tick started a summary");
            }
        }
    }

    /// Snapshot the room and spawn generation plus delivery.
    ///
    /// Returns false when a summary for the room is already running.
    fn start_summary(&mut self, room_topic: &str) -> bool {
        if self.in_flight.contains(room_topic) {
            debug!(room = %room_topic, "Summary already in flight, trigger skipped");
            return false;
        }
        self.in_flight.insert(room_topic.to_string());

        let snapshot = self.store.snapshot(room_topic);
        let through_seq = snapshot.through_seq;
        let room_topic = room_topic.to_string();
        let target = destination(&self.delivery_config, &room_topic).to_string();
        let generator = Arc::clone(&self.generator);
        let delivery = Arc::clone(&self.delivery);
        let handle = self.handle.clone();

        tokio::spawn(async move {
            let outcome = generator.generate_snapshot(snapshot).await;
            let delivered =
                deliver_outcome(&generator, delivery.as_ref(), &room_topic, &target, &outcome)
                    .await;
            let finished = FinishedSummary {
                room_topic,
                through_seq,
                outcome,
                delivered,
            };
            if handle
                .send(ScribeCommand::SummaryFinished(finished))
                .await
                .is_err()
            {
                warn!("Runtime stopped before summary completion was recorded");
            }
        });
        true
    }

    fn on_summary_finished(&mut self, finished: FinishedSummary) {
        let FinishedSummary {
            room_topic,
            through_seq,
            outcome,
            delivered,
        } = finished;
        self.in_flight.remove(&room_topic);

        let cleared_through = match (&outcome, delivered, through_seq) {
            (SummaryOutcome::Report(_), true, Some(seq)) => Some(seq),
            _ => None,
        };

        if let Some(seq) = cleared_through {
            self.store.clear_through(&room_topic, seq);
        } else if !matches!(outcome, SummaryOutcome::Empty(_)) {
            warn!(
                room = %room_topic,
                delivered,
                report = outcome.is_report(),
                "Summary not applied, buffer kept"
            );
        }
    }

    fn overview(&self) -> Vec<RoomOverview> {
        self.store
            .get_room_topics()
            .into_iter()
            .map(|room_topic| RoomOverview {
                stats: self.store.get_stats(&room_topic),
                last_summary_time: self.store.last_summary_time(&room_topic),
                summary_in_flight: self.in_flight.contains(&room_topic),
                room_topic,
            })
            .collect()
    }
}

/// Send the outcome text; on failure try to tell the room.
async fn deliver_outcome(
    generator: &SummaryGenerator,
    delivery: &dyn Delivery,
    room_topic: &str,
    target: &str,
    outcome: &SummaryOutcome,
) -> bool {
    match delivery.deliver(target, outcome.text()).await {
        Ok(()) => true,
        Err(err) => {
            error!(room = %room_topic, target = %target, %err, "Report delivery failed");
            let notice = generator.delivery_failure_notice(room_topic, &err.to_string());
            if let Err(notice_err) = delivery.deliver(target, &notice).await {
                error!(room = %room_topic, err = %notice_err, "Error notice delivery failed");
            }
            false
        }
    }
}
