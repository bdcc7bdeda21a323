//! Watch-time estimation
//!
//! The export has no watch durations, so the gap to the next event stands in
//! for how long a long-form video held attention. Estimation is the single
//! entry point of the enrichment stage: it sorts, classifies and estimates in
//! one pass, so classification always sees the full unfiltered sequence.

use crate::classifier::{classify_ordered, sort_chronologically};
use crate::config::{AnalysisConfig, DurationConfig};
use crate::types::{EstimatedEvent, VideoType, WatchEvent};
use serde::{Deserialize, Serialize};
use tracing::debug;

/// Which branch of the duration policy produced an estimate
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum WatchTimeRule {
    /// Short event: fixed short duration
    ShortFixed,
    /// Long event with a usable gap: the gap itself
    LongObserved,
    /// Long event that ends the sequence or whose gap exceeds the cap
    LongFallback,
}

/// Duration policy resolved to seconds
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DurationPolicy {
    pub short_sec: f64,
    pub max_long_sec: f64,
    pub default_long_sec: f64,
}

impl From<&DurationConfig> for DurationPolicy {
    fn from(config: &DurationConfig) -> Self {
        Self {
            short_sec: config.short_duration_min * 60.0,
            max_long_sec: config.max_long_duration_min * 60.0,
            default_long_sec: config.default_long_duration_min * 60.0,
        }
    }
}

impl DurationPolicy {
    /// Pick the rule for one event
    ///
    /// | video type | time to next            | rule          |
    /// |------------|-------------------------|---------------|
    /// | Short      | any                     | ShortFixed    |
    /// | Long       | absent or > max         | LongFallback  |
    /// | Long       | ≤ max                   | LongObserved  |
    pub fn rule(&self, video_type: VideoType, time_to_next_sec: Option<f64>) -> WatchTimeRule {
        match (video_type, time_to_next_sec) {
            (VideoType::Short, _) => WatchTimeRule::ShortFixed,
            (VideoType::Long, Some(gap)) if gap <= self.max_long_sec => {
                WatchTimeRule::LongObserved
            }
            (VideoType::Long, _) => WatchTimeRule::LongFallback,
        }
    }

    /// Estimated watch time in seconds, never negative
    pub fn watch_time_sec(&self, video_type: VideoType, time_to_next_sec: Option<f64>) -> f64 {
        let seconds = match self.rule(video_type, time_to_next_sec) {
            WatchTimeRule::ShortFixed => self.short_sec,
            WatchTimeRule::LongObserved => time_to_next_sec.unwrap_or(self.default_long_sec),
            WatchTimeRule::LongFallback => self.default_long_sec,
        };
        seconds.max(0.0)
    }
}

/// Seconds until the next event; `None` for the last event
pub fn time_to_next(events: &[WatchEvent]) -> Vec<Option<f64>> {
    let mut gaps: Vec<Option<f64>> = events
        .windows(2)
        .map(|pair| {
            Some((pair[1].timestamp - pair[0].timestamp).num_milliseconds() as f64 / 1000.0)
        })
        .collect();
    if !events.is_empty() {
        gaps.push(None);
    }
    gaps
}

/// Sort, classify and estimate watch time for a sequence of watch events
///
/// Callers must pass the whole window they want analyzed; filtering by video
/// type belongs after this call, because an event's label depends on its
/// neighbors.
pub fn estimate_watch_time(
    mut events: Vec<WatchEvent>,
    config: &AnalysisConfig,
) -> Vec<EstimatedEvent> {
    sort_chronologically(&mut events);
    let labels = classify_ordered(&events, &config.classification);
    let gaps = time_to_next(&events);
    let policy = DurationPolicy::from(&config.duration);

    let estimated: Vec<EstimatedEvent> = events
        .into_iter()
        .zip(labels)
        .zip(gaps)
        .map(|((event, video_type), time_to_next_sec)| {
            let seconds = policy.watch_time_sec(video_type, time_to_next_sec);
            let local_time = config.time.local(event.timestamp);
            EstimatedEvent {
                event,
                video_type,
                time_to_next_sec,
                watch_time_hours: seconds / 3600.0,
                local_time,
            }
        })
        .collect();

    debug!(
        events = estimated.len(),
        total_hours = estimated.iter().map(|e| e.watch_time_hours).sum::<f64>(),
        "Estimated watch time"
    );

    estimated
}
