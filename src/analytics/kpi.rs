//! Headline KPIs: totals, streaks and consistency

use crate::error::ComputeError;
use crate::types::{EstimatedEvent, VideoType};
use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

/// Streak and coverage over the active dates of a view
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StreakStats {
    /// Longest run of consecutive active dates
    pub longest_streak_days: u32,
    /// First date of the longest run
    pub longest_streak_start: NaiveDate,
    /// Last date of the longest run
    pub longest_streak_end: NaiveDate,
    /// Distinct dates with at least one event
    pub active_days: u32,
    /// Days from the first to the last active date, inclusive
    pub total_days: u32,
    /// `active_days / total_days * 100`
    pub consistency_pct: f64,
}

/// The earliest watch event of a view
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FirstVideo {
    pub title: String,
    pub timestamp: DateTime<Utc>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub channel: Option<String>,
}

/// Headline totals of a view
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WatchTotals {
    pub events: u32,
    pub total_hours: f64,
    pub short_hours: f64,
    pub long_hours: f64,
    pub distinct_channels: u32,
    pub distinct_videos: u32,
    pub first_video: Option<FirstVideo>,
}

/// Share of days between the first and last active date that had activity
pub fn consistency<I>(dates: I) -> Result<f64, ComputeError>
where
    I: IntoIterator<Item = NaiveDate>,
{
    let distinct: BTreeSet<NaiveDate> = dates.into_iter().collect();
    let (first, last) = match (distinct.first(), distinct.last()) {
        (Some(first), Some(last)) => (*first, *last),
        _ => {
            return Err(ComputeError::NoData(
                "no active dates to compute consistency from".to_string(),
            ))
        }
    };

    let total_days = (last - first).num_days() + 1;
    Ok(distinct.len() as f64 / total_days as f64 * 100.0)
}

/// Longest run of consecutive dates; 0 for no dates
///
/// Order and duplicates in the input do not matter.
pub fn longest_streak<I>(dates: I) -> u32
where
    I: IntoIterator<Item = NaiveDate>,
{
    let distinct: BTreeSet<NaiveDate> = dates.into_iter().collect();
    longest_run(&distinct).map_or(0, |(length, _, _)| length)
}

/// Longest streak with its bounds, plus active-day coverage
pub fn streak_stats<I>(dates: I) -> Result<StreakStats, ComputeError>
where
    I: IntoIterator<Item = NaiveDate>,
{
    let distinct: BTreeSet<NaiveDate> = dates.into_iter().collect();
    let (length, start, end) = longest_run(&distinct)
        .ok_or_else(|| ComputeError::NoData("no active dates to compute a streak from".to_string()))?;
    let consistency_pct = consistency(distinct.iter().copied())?;

    let total_days = match (distinct.first(), distinct.last()) {
        (Some(first), Some(last)) => (*last - *first).num_days() as u32 + 1,
        _ => 0,
    };

    Ok(StreakStats {
        longest_streak_days: length,
        longest_streak_start: start,
        longest_streak_end: end,
        active_days: distinct.len() as u32,
        total_days,
        consistency_pct,
    })
}

/// Totals, distinct counts and the earliest video of a view
pub fn watch_totals(events: &[EstimatedEvent]) -> WatchTotals {
    let mut totals = WatchTotals {
        events: events.len() as u32,
        total_hours: 0.0,
        short_hours: 0.0,
        long_hours: 0.0,
        distinct_channels: 0,
        distinct_videos: 0,
        first_video: None,
    };

    let mut channels: BTreeSet<&str> = BTreeSet::new();
    let mut titles: BTreeSet<&str> = BTreeSet::new();
    let mut first: Option<&EstimatedEvent> = None;

    for event in events {
        totals.total_hours += event.watch_time_hours;
        match event.video_type {
            VideoType::Short => totals.short_hours += event.watch_time_hours,
            VideoType::Long => totals.long_hours += event.watch_time_hours,
        }
        if let Some(channel) = event.channel() {
            channels.insert(channel);
        }
        titles.insert(event.title());

        // strict < keeps the first ingested event on ties
        if first.map_or(true, |f| event.timestamp() < f.timestamp()) {
            first = Some(event);
        }
    }

    totals.distinct_channels = channels.len() as u32;
    totals.distinct_videos = titles.len() as u32;
    totals.first_video = first.map(|e| FirstVideo {
        title: e.title().to_string(),
        timestamp: e.timestamp(),
        channel: e.channel().map(str::to_string),
    });
    totals
}

/// (length, start, end) of the longest consecutive run; earliest run wins ties
fn longest_run(dates: &BTreeSet<NaiveDate>) -> Option<(u32, NaiveDate, NaiveDate)> {
    let mut best: Option<(u32, NaiveDate, NaiveDate)> = None;
    let mut current: Option<(u32, NaiveDate, NaiveDate)> = None;

    for &date in dates {
        current = match current {
            Some((length, start, prev)) if (date - prev).num_days() == 1 => {
                Some((length + 1, start, date))
            }
            _ => Some((1, date, date)),
        };

        if let Some(run) = current {
            if best.map_or(true, |(length, _, _)| run.0 > length) {
                best = Some(run);
            }
        }
    }

    best
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::WatchEvent;
    use chrono::TimeZone;
    use pretty_assertions::assert_eq;

    fn date(month: u32, day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, month, day).unwrap()
    }

    #[test]
    fn test_longest_streak_ignores_duplicates() {
        let dates = vec![date(1, 1), date(1, 2), date(1, 2), date(1, 4)];
        assert_eq!(longest_streak(dates), 2);
    }

    #[test]
    fn test_longest_streak_is_order_invariant() {
        let dates = vec![date(1, 4), date(1, 2), date(1, 1), date(1, 3), date(1, 9)];
        assert_eq!(longest_streak(dates.clone()), 4);

        let mut reversed = dates;
        reversed.reverse();
        assert_eq!(longest_streak(reversed), 4);
    }

    #[test]
    fn test_longest_streak_empty_and_single() {
        assert_eq!(longest_streak(Vec::new()), 0);
        assert_eq!(longest_streak(vec![date(3, 1)]), 1);
    }

    #[test]
    fn test_streak_crosses_month_boundary() {
        let dates = vec![date(1, 30), date(1, 31), date(2, 1)];
        assert_eq!(longest_streak(dates), 3);
    }

    #[test]
    fn test_consistency() {
        // 3 active days over a 4 day range
        let pct = consistency(vec![date(1, 1), date(1, 2), date(1, 4)]).unwrap();
        assert!((pct - 75.0).abs() < 1e-12);

        assert_eq!(consistency(vec![date(1, 1)]).unwrap(), 100.0);
    }

    #[test]
    fn test_consistency_empty_is_no_data() {
        assert!(consistency(Vec::new()).unwrap_err().is_no_data());
    }

    #[test]
    fn test_consistency_non_decreasing_within_range() {
        let mut dates = vec![date(1, 1), date(1, 10)];
        let mut previous = consistency(dates.clone()).unwrap();

        for day in 2..10 {
            dates.push(date(1, day));
            let current = consistency(dates.clone()).unwrap();
            assert!(current >= previous);
            previous = current;
        }
        assert_eq!(previous, 100.0);
    }

    #[test]
    fn test_streak_stats_bounds() {
        let dates = vec![date(1, 1), date(1, 2), date(1, 5), date(1, 6), date(1, 7)];
        let stats = streak_stats(dates).unwrap();

        assert_eq!(stats.longest_streak_days, 3);
        assert_eq!(stats.longest_streak_start, date(1, 5));
        assert_eq!(stats.longest_streak_end, date(1, 7));
        assert_eq!(stats.active_days, 5);
        assert_eq!(stats.total_days, 7);
        assert!((stats.consistency_pct - 500.0 / 7.0).abs() < 1e-9);
    }

    #[test]
    fn test_streak_stats_tie_keeps_earliest_run() {
        let stats = streak_stats(vec![date(1, 1), date(1, 2), date(1, 4), date(1, 5)]).unwrap();
        assert_eq!(stats.longest_streak_start, date(1, 1));
    }

    #[test]
    fn test_streak_stats_empty_is_no_data() {
        assert!(streak_stats(Vec::new()).unwrap_err().is_no_data());
    }

    #[test]
    fn test_watch_totals() {
        let make = |hour: u32, title: &str, channel: Option<&str>, video_type, hours| {
            let ts = Utc.with_ymd_and_hms(2024, 1, 1, hour, 0, 0).unwrap();
            EstimatedEvent {
                event: WatchEvent {
                    timestamp: ts,
                    title: title.to_string(),
                    channel: channel.map(str::to_string),
                    url: None,
                },
                video_type,
                time_to_next_sec: None,
                watch_time_hours: hours,
                local_time: ts.naive_utc(),
            }
        };

        let events = vec![
            make(12, "b", Some("One"), VideoType::Long, 0.5),
            make(9, "a", Some("Two"), VideoType::Short, 0.25),
            make(15, "b", Some("One"), VideoType::Long, 0.25),
            make(16, "c", None, VideoType::Short, 0.0),
        ];

        let totals = watch_totals(&events);
        assert_eq!(totals.events, 4);
        assert_eq!(totals.total_hours, 1.0);
        assert_eq!(totals.short_hours, 0.25);
        assert_eq!(totals.long_hours, 0.75);
        assert_eq!(totals.distinct_channels, 2);
        assert_eq!(totals.distinct_videos, 3);

        let first = totals.first_video.unwrap();
        assert_eq!(first.title, "a");
        assert_eq!(first.channel.as_deref(), Some("Two"));
    }

    #[test]
    fn test_watch_totals_empty() {
        let totals = watch_totals(&[]);
        assert_eq!(totals.events, 0);
        assert_eq!(totals.first_video, None);
    }
}
