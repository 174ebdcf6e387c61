//! Summary trigger policy.
//!
//! Pure decision logic: given a room's buffered count, its last summary time
//! and the trigger configuration, decide whether a summary should fire.

use chrono::{DateTime, Utc};

use crate::scribe::core::config::TriggerConfig;

/// Outcome of a trigger evaluation.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum TriggerDecision {
    /// Fewer messages than the configured floor; nothing fires.
    BelowFloor,
    /// The keyword was seen in the triggering message.
    Keyword,
    /// The buffered count reached the volume threshold.
    Volume,
    /// The interval since the last summary elapsed.
    Interval,
    /// No trigger matched.
    Idle,
}

impl TriggerDecision {
    /// Whether a summary should be generated.
    #[must_use]
    pub const fn fires(self) -> bool {
        matches!(self, Self::Keyword | Self::Volume | Self::Interval)
    }
}

/// Buffer state relevant to a trigger decision.
#[derive(Clone, Copy, Debug)]
pub struct TriggerInput {
    /// Number of buffered messages in the room.
    pub message_count: usize,
    /// Time of the last summary, if any.
    pub last_summary_time: Option<DateTime<Utc>>,
    /// Whether the current message carried the keyword.
    pub triggered_by_keyword: bool,
}

/// Evaluate the trigger policy.
///
/// The floor is checked first and overrides every trigger, including the keyword.
/// A room without a previous summary has no baseline for the time trigger.
#[must_use]
pub fn evaluate(config: &TriggerConfig, input: TriggerInput, now: DateTime<Utc>) -> TriggerDecision {
    if input.message_count < config.min_messages_for_summary {
        return TriggerDecision::BelowFloor;
    }

    if input.triggered_by_keyword {
        return TriggerDecision::Keyword;
    }

    if config.message_count > 0 && input.message_count >= config.message_count {
        return TriggerDecision::Volume;
    }

    if config.interval_minutes > 0
        && let Some(last) = input.last_summary_time
        && elapsed_minutes(last, now) >= config.interval_minutes
    {
        return TriggerDecision::Interval;
    }

    TriggerDecision::Idle
}

fn elapsed_minutes(since: DateTime<Utc>, now: DateTime<Utc>) -> u64 {
    u64::try_from(now.signed_duration_since(since).num_minutes()).unwrap_or(0)
}

#[cfg(test)]
mod tests {
    use chrono::Duration;

    use super::*;

    fn config(interval_minutes: u64, message_count: usize, min: usize) -> TriggerConfig {
        TriggerConfig {
            interval_minutes,
            message_count,
            keyword: "@bot".to_string(),
            min_messages_for_summary: min,
        }
    }

    fn input(count: usize, last: Option<DateTime<Utc>>, keyword: bool) -> TriggerInput {
        TriggerInput {
            message_count: count,
            last_summary_time: last,
            triggered_by_keyword: keyword,
        }
    }

    #[test]
    fn test_floor_overrides_every_trigger() {
        let now = Utc::now();
        let cfg = config(1, 1, 5);
        let long_ago = Some(now - Duration::hours(5));
        let decision = evaluate(&cfg, input(4, long_ago, true), now);
        assert_eq!(decision, TriggerDecision::BelowFloor);
        assert!(!decision.fires());
    }

    #[test]
    fn test_keyword_fires_once_floor_met() {
        let now = Utc::now();
        let cfg = config(0, 0, 5);
        for count in 0..5 {
            assert!(!evaluate(&cfg, input(count, None, true), now).fires());
        }
        assert_eq!(evaluate(&cfg, input(5, None, true), now), TriggerDecision::Keyword);
        assert_eq!(evaluate(&cfg, input(5, None, false), now), TriggerDecision::Idle);
    }

    #[test]
    fn test_volume_threshold() {
        let now = Utc::now();
        let cfg = config(0, 10, 5);
        assert_eq!(evaluate(&cfg, input(9, None, false), now), TriggerDecision::Idle);
        assert_eq!(evaluate(&cfg, input(10, None, false), now), TriggerDecision::Volume);
    }

    #[test]
    fn test_interval_requires_baseline() {
        let now = Utc::now();
        let cfg = config(30, 0, 1);
        assert_eq!(evaluate(&cfg, input(3, None, false), now), TriggerDecision::Idle);

        let recent = Some(now - Duration::minutes(29));
        assert_eq!(evaluate(&cfg, input(3, recent, false), now), TriggerDecision::Idle);

        let due = Some(now - Duration::minutes(30));
        assert_eq!(evaluate(&cfg, input(3, due, false), now), TriggerDecision::Interval);
    }

    #[test]
    fn test_disabled_interval_never_fires() {
        let now = Utc::now();
        let cfg = config(0, 0, 1);
        let long_ago = Some(now - Duration::days(3));
        assert_eq!(evaluate(&cfg, input(3, long_ago, false), now), TriggerDecision::Idle);
    }

    #[test]
    fn test_clock_skew_does_not_fire() {
        let now = Utc::now();
        let cfg = config(5, 0, 1);
        let future = Some(now + Duration::minutes(10));
        assert_eq!(evaluate(&cfg, input(2, future, false), now), TriggerDecision::Idle);
    }
}
