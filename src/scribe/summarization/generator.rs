//! Summary orchestration.
//!
//! Turns a room snapshot into a delivered-ready report: calls the
//! summarization backend under a timeout and wraps its answer with a header
//! and a statistics footer. Failures become an error report, never a panic or
//! a propagated error, and nothing here touches the buffer.

use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, Local, Utc};
use tracing::{error, info};

use crate::scribe::buffer::room_store::{RoomBufferStore, RoomSnapshot, RoomStats};
use crate::scribe::core::config::ReportLanguage;
use crate::scribe::core::errors::SummarizationError;
use crate::scribe::core::message::local_clock;
use crate::scribe::summarization::summarizer::Summarizer;

/// Result of a summary attempt, carrying the text to send to the room.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum SummaryOutcome {
    /// The room had nothing to summarize; the summarizer was not called.
    Empty(String),
    /// A complete report.
    Report(String),
    /// The summarizer failed; the text explains why.
    Failed(String),
}

impl SummaryOutcome {
    /// User-facing text of the outcome.
    #[must_use]
    pub fn text(&self) -> &str {
        match self {
            Self::Empty(text) | Self::Report(text) | Self::Failed(text) => text,
        }
    }

    /// Whether the outcome is a report whose delivery may clear the buffer.
    #[must_use]
    pub const fn is_report(&self) -> bool {
        matches!(self, Self::Report(_))
    }
}

/// Generates meeting-minute reports for rooms.
pub struct SummaryGenerator {
    summarizer: Arc<dyn Summarizer>,
    timeout: Duration,
    language: ReportLanguage,
}

impl SummaryGenerator {
    /// Create a generator around a summarization backend.
    #[must_use]
    pub fn new(summarizer: Arc<dyn Summarizer>, timeout: Duration, language: ReportLanguage) -> Self {
        Self {
            summarizer,
            timeout,
            language,
        }
    }

    /// Summarize the room's current buffer.
    ///
    /// The snapshot is taken before the returned future first suspends, so
    /// messages buffered afterwards are not part of this summary.
    pub fn generate<'a>(
        &'a self,
        store: &RoomBufferStore,
        room_topic: &str,
    ) -> impl Future<Output = SummaryOutcome> + Send + use<'a> {
        let snapshot = store.snapshot(room_topic);
        self.generate_snapshot(snapshot)
    }

    /// Summarize a previously taken snapshot.
    pub async fn generate_snapshot(&self, snapshot: RoomSnapshot) -> SummaryOutcome {
        let room = snapshot.room_topic.as_str();
        let stats = &snapshot.stats;
        let templates = Templates::for_language(self.language);

        if stats.count == 0 || snapshot.lines.is_empty() {
            return SummaryOutcome::Empty(templates.nothing_to_summarize(room));
        }

        info!(
            room = %room,
            messages = stats.count,
            participants = stats.participants.len(),
            backend = self.summarizer.name(),
            "Generating summary"
        );

        match self.call_summarizer(snapshot.lines.clone()).await {
            Ok(body) => {
                let report = templates.report(room, stats, &body, Local::now());
                info!(room = %room, chars = report.len(), "Summary generated");
                SummaryOutcome::Report(report)
            }
            Err(err) => {
                error!(
                    room = %room,
                    %err,
                    transient = err.is_transient(),
                    "Summary generation failed"
                );
                SummaryOutcome::Failed(templates.failure(room, &err.to_string()))
            }
        }
    }

    /// Notice sent when a report could not be delivered.
    #[must_use]
    pub fn delivery_failure_notice(&self, room_topic: &str, reason: &str) -> String {
        Templates::for_language(self.language).delivery_failure(room_topic, reason)
    }

    async fn call_summarizer(&self, lines: Vec<String>) -> Result<String, SummarizationError> {
        tokio::time::timeout(self.timeout, self.summarizer.summarize(lines))
            .await
            .unwrap_or_else(|_| Err(SummarizationError::Timeout(self.timeout.as_secs())))
    }
}

/// Localized report fragments.
struct Templates {
    language: ReportLanguage,
}

impl Templates {
    const fn for_language(language: ReportLanguage) -> Self {
        Self { language }
    }

    fn nothing_to_summarize(&self, room: &str) -> String {
        match self.language {
            ReportLanguage::Zh => format!("群组「{room}」暂无新消息需要总结。"),
            ReportLanguage::En => format!("No new messages to summarize in \"{room}\"."),
        }
    }

    fn failure(&self, room: &str, reason: &str) -> String {
        match self.language {
            ReportLanguage::Zh => format!("❌ 为「{room}」生成会议纪要时出错：{reason}"),
            ReportLanguage::En => {
                format!("❌ Failed to generate meeting minutes for \"{room}\": {reason}")
            }
        }
    }

    fn delivery_failure(&self, room: &str, reason: &str) -> String {
        match self.language {
            ReportLanguage::Zh => format!("❌ 「{room}」的会议纪要发送失败，请稍后重试。错误：{reason}"),
            ReportLanguage::En => {
                format!("❌ Meeting minutes for \"{room}\" could not be sent, please retry later. Error: {reason}")
            }
        }
    }

    const fn empty_body(&self) -> &'static str {
        match self.language {
            ReportLanguage::Zh => "（模型未返回内容）",
            ReportLanguage::En => "(the model returned no content)",
        }
    }

    fn report(&self, room: &str, stats: &RoomStats, body: &str, now: DateTime<Local>) -> String {
        let time_range = match (stats.first_message_time, stats.last_message_time) {
            (Some(first), Some(last)) => time_range(first, last),
            _ => "N/A".to_string(),
        };
        let body = if body.trim().is_empty() {
            self.empty_body()
        } else {
            body
        };
        let count = stats.count;
        let participants = stats.participants.len();

        match self.language {
            ReportLanguage::Zh => {
                let date = now.format("%Y年%-m月%-d日 %A");
                format!(
                    "# 🤖 {room} 会议纪要\n📅 日期：{date}\n⏰ 时间：{time_range}\n\n\n{body}\n\n---\n📊 统计信息：共 {count} 条消息，{participants} 位参与者"
                )
            }
            ReportLanguage::En => {
                let date = now.format("%A, %B %-d, %Y");
                format!(
                    "# 🤖 {room} meeting minutes\n📅 Date: {date}\n⏰ Time: {time_range}\n\n\n{body}\n\n---\n📊 Stats: {count} messages, {participants} participants"
                )
            }
        }
    }
}

fn time_range(first: DateTime<Utc>, last: DateTime<Utc>) -> String {
    format!("{} - {}", local_clock(first), local_clock(last))
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicUsize, Ordering};

    use chrono::{Duration as ChronoDuration, TimeZone};

    use super::*;
    use crate::scribe::core::config::TriggerConfig;
    use crate::scribe::core::message::BufferedMessage;
    use crate::scribe::summarization::summarizer::SummarizeFuture;

    enum Behavior {
        Answer(&'static str),
        Fail,
        Hang,
    }

    struct FakeSummarizer {
        behavior: Behavior,
        calls: AtomicUsize,
    }

    impl FakeSummarizer {
        fn new(behavior: Behavior) -> Arc<Self> {
            Arc::new(Self {
                behavior,
                calls: AtomicUsize::new(0),
            })
        }
    }

    impl Summarizer for FakeSummarizer {
        fn summarize(
            &self,
            _lines: Vec<String>,
        ) -> SummarizeFuture<'_, Result<String, SummarizationError>> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            Box::pin(async move {
                match self.behavior {
                    Behavior::Answer(text) => Ok(text.to_string()),
                    Behavior::Fail => Err(SummarizationError::HttpStatus(503)),
                    Behavior::Hang => {
                        tokio::time::sleep(Duration::from_secs(3600)).await;
                        Ok(String::new())
                    }
                }
            })
        }

        fn name(&self) -> &'static str {
            "fake"
        }
    }

    fn store_with(room: &str, count: usize) -> RoomBufferStore {
        let mut store = RoomBufferStore::new(TriggerConfig::default(), 100);
        let base = Utc.with_ymd_and_hms(2024, 5, 6, 10, 0, 0).unwrap();
        for n in 0..count {
            store.add(BufferedMessage::new(
                format!("m{n}"),
                base + ChronoDuration::minutes(n as i64),
                format!("user{}", n % 2),
                format!("point {n}"),
                room,
            ));
        }
        store
    }

    fn generator(fake: &Arc<FakeSummarizer>, language: ReportLanguage) -> SummaryGenerator {
        let summarizer: Arc<dyn Summarizer> = fake.clone();
        SummaryGenerator::new(summarizer, Duration::from_secs(5), language)
    }

    #[tokio::test]
    async fn test_empty_room_skips_summarizer() {
        let fake = FakeSummarizer::new(Behavior::Answer("unused"));
        let generator = generator(&fake, ReportLanguage::Zh);
        let store = store_with("Team", 0);

        let outcome = generator.generate(&store, "Team").await;
        assert_eq!(outcome, SummaryOutcome::Empty("群组「Team」暂无新消息需要总结。".to_string()));
        assert_eq!(fake.calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_report_has_header_body_and_footer() {
        let fake = FakeSummarizer::new(Behavior::Answer("## 会议纪要\n- 决定上线"));
        let generator = generator(&fake, ReportLanguage::Zh);
        let store = store_with("Team", 3);

        let outcome = generator.generate(&store, "Team").await;
        assert!(outcome.is_report());
        let text = outcome.text();
        assert!(text.starts_with("# 🤖 Team 会议纪要\n📅 日期："));
        let stats = store.get_stats("Team");
        let range = time_range(
            stats.first_message_time.unwrap(),
            stats.last_message_time.unwrap(),
        );
        assert!(text.contains(&format!("⏰ 时间：{range}")));
        assert!(text.contains("- 决定上线"));
        assert!(text.ends_with("📊 统计信息：共 3 条消息，2 位参与者"));
        assert_eq!(fake.calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_failure_returns_error_report_and_keeps_buffer() {
        let fake = FakeSummarizer::new(Behavior::Fail);
        let generator = generator(&fake, ReportLanguage::Zh);
        let store = store_with("Team", 4);

        let outcome = generator.generate(&store, "Team").await;
        assert!(matches!(outcome, SummaryOutcome::Failed(_)));
        assert!(outcome.text().contains("HTTP 503"));
        assert_eq!(store.get_stats("Team").count, 4);
    }

    #[tokio::test]
    async fn test_empty_answer_is_still_a_report() {
        let fake = FakeSummarizer::new(Behavior::Answer("   "));
        let generator = generator(&fake, ReportLanguage::En);
        let store = store_with("Ops", 2);

        let outcome = generator.generate(&store, "Ops").await;
        assert!(outcome.is_report());
        assert!(outcome.text().contains("(the model returned no content)"));
        assert!(outcome.text().ends_with("📊 Stats: 2 messages, 2 participants"));
    }

    #[tokio::test(start_paused = true)]
    async fn test_hanging_summarizer_times_out() {
        let fake = FakeSummarizer::new(Behavior::Hang);
        let generator = generator(&fake, ReportLanguage::En);
        let store = store_with("Ops", 2);

        let outcome = generator.generate(&store, "Ops").await;
        assert!(matches!(outcome, SummaryOutcome::Failed(_)));
        assert!(outcome.text().contains("timed out after 5 seconds"));
    }

    #[tokio::test]
    async fn test_snapshot_excludes_later_messages() {
        let fake = FakeSummarizer::new(Behavior::Answer("ok"));
        let generator = generator(&fake, ReportLanguage::En);
        let mut store = store_with("Ops", 2);

        let pending = generator.generate(&store, "Ops");
        store.add(BufferedMessage::new("late", Utc::now(), "carol", "late note", "Ops"));
        let outcome = pending.await;

        assert!(outcome.text().contains("2 messages"));
        assert_eq!(store.get_stats("Ops").count, 3);
    }
}
