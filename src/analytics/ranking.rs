//! Top-N rankings over titles and channels

use crate::analytics::grouping::{watch_stats_by, GroupStats, Metric};
use crate::error::ComputeError;
use crate::types::EstimatedEvent;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// One row of a ranking
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RankedEntry {
    pub key: String,
    pub hours: f64,
    pub count: u32,
}

/// Sort groups by a metric (descending) and keep the first `n`
///
/// Ties keep ascending key order.
pub fn top_n(groups: BTreeMap<String, GroupStats>, metric: Metric, n: usize) -> Vec<RankedEntry> {
    let mut entries: Vec<(String, GroupStats)> = groups.into_iter().collect();
    // stable sort over key-ordered input
    entries.sort_by(|a, b| metric.value(&b.1).total_cmp(&metric.value(&a.1)));

    entries
        .into_iter()
        .take(n)
        .map(|(key, stats)| RankedEntry {
            key,
            hours: stats.hours,
            count: stats.count,
        })
        .collect()
}

/// Most watched titles by estimated hours
pub fn top_videos_by_hours(events: &[EstimatedEvent], n: usize) -> Vec<RankedEntry> {
    top_n(
        watch_stats_by(events, |e| Some(e.title().to_string())),
        Metric::Hours,
        n,
    )
}

/// Most clicked titles by event count
pub fn top_videos_by_count(events: &[EstimatedEvent], n: usize) -> Vec<RankedEntry> {
    top_n(
        watch_stats_by(events, |e| Some(e.title().to_string())),
        Metric::Count,
        n,
    )
}

/// Channels by event count; events without a channel are ignored
pub fn top_channels_by_count(events: &[EstimatedEvent], n: usize) -> Vec<RankedEntry> {
    top_n(
        watch_stats_by(events, |e| e.channel().map(str::to_string)),
        Metric::Count,
        n,
    )
}

/// Channels by estimated hours; events without a channel are ignored
pub fn top_channels_by_hours(events: &[EstimatedEvent], n: usize) -> Vec<RankedEntry> {
    top_n(
        watch_stats_by(events, |e| e.channel().map(str::to_string)),
        Metric::Hours,
        n,
    )
}

/// The channel the viewer returns to most
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChannelLoyalty {
    pub channel: String,
    /// Events attributed to the channel
    pub event_count: u32,
    /// Estimated hours spent on the channel
    pub total_hours: f64,
    /// Share of channel-attributed events, in percent
    pub share_pct: f64,
}

/// Channel with the highest event count and its hours in the current view
pub fn channel_loyalty(events: &[EstimatedEvent]) -> Result<ChannelLoyalty, ComputeError> {
    let groups = watch_stats_by(events, |e| e.channel().map(str::to_string));
    let attributed: u32 = groups.values().map(|s| s.count).sum();

    let top = top_n(groups, Metric::Count, 1)
        .into_iter()
        .next()
        .ok_or_else(|| ComputeError::NoData("no events attributed to a channel".to_string()))?;

    Ok(ChannelLoyalty {
        share_pct: top.count as f64 / attributed as f64 * 100.0,
        channel: top.key,
        event_count: top.count,
        total_hours: top.hours,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{VideoType, WatchEvent};
    use chrono::{TimeZone, Utc};
    use pretty_assertions::assert_eq;

    fn event(title: &str, channel: Option<&str>, hours: f64) -> EstimatedEvent {
        let ts = Utc.with_ymd_and_hms(2024, 1, 15, 12, 0, 0).unwrap();
        EstimatedEvent {
            event: WatchEvent {
                timestamp: ts,
                title: title.to_string(),
                channel: channel.map(str::to_string),
                url: None,
            },
            video_type: VideoType::Long,
            time_to_next_sec: None,
            watch_time_hours: hours,
            local_time: ts.naive_utc(),
        }
    }

    #[test]
    fn test_repeated_title_ranks_first() {
        let mut events = vec![
            event("favorite", None, 0.5),
            event("favorite", None, 0.5),
            event("favorite", None, 0.5),
        ];
        for i in 0..9 {
            events.push(event(&format!("single-{}", i), None, 0.1));
        }

        let top = top_videos_by_hours(&events, 10);
        assert_eq!(top.len(), 10);
        assert_eq!(top[0].key, "favorite");
        assert!((top[0].hours - 1.5).abs() < 1e-12);
        assert_eq!(top[0].count, 3);
    }

    #[test]
    fn test_top_n_truncates_and_breaks_ties_by_key() {
        let events = vec![
            event("c", None, 0.2),
            event("a", None, 0.2),
            event("b", None, 0.2),
        ];
        let top = top_videos_by_hours(&events, 2);
        let keys: Vec<&str> = top.iter().map(|e| e.key.as_str()).collect();
        assert_eq!(keys, vec!["a", "b"]);
    }

    #[test]
    fn test_count_vs_hours_rankings_differ() {
        let events = vec![
            event("long one", Some("Docs"), 2.0),
            event("short", Some("Clips"), 0.01),
            event("short", Some("Clips"), 0.01),
        ];

        assert_eq!(top_videos_by_hours(&events, 1)[0].key, "long one");
        assert_eq!(top_videos_by_count(&events, 1)[0].key, "short");
        assert_eq!(top_channels_by_hours(&events, 1)[0].key, "Docs");
        assert_eq!(top_channels_by_count(&events, 1)[0].key, "Clips");
    }

    #[test]
    fn test_channel_loyalty() {
        let events = vec![
            event("x", Some("Main"), 0.5),
            event("y", Some("Main"), 0.25),
            event("z", Some("Other"), 3.0),
            event("w", None, 1.0),
        ];

        let loyalty = channel_loyalty(&events).unwrap();
        assert_eq!(loyalty.channel, "Main");
        assert_eq!(loyalty.event_count, 2);
        assert!((loyalty.total_hours - 0.75).abs() < 1e-12);
        assert!((loyalty.share_pct - 200.0 / 3.0).abs() < 1e-9);
    }

    #[test]
    fn test_channel_loyalty_without_channels_is_no_data() {
        let events = vec![event("x", None, 0.5)];
        assert!(channel_loyalty(&events).unwrap_err().is_no_data());
        assert!(channel_loyalty(&[]).unwrap_err().is_no_data());
    }

    #[test]
    fn test_zero_n() {
        let events = vec![event("x", None, 0.5)];
        assert!(top_videos_by_hours(&events, 0).is_empty());
    }
}
