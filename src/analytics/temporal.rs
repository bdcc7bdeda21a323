//! Calendar bucketing: weekday, hour, date and day kind

use crate::analytics::grouping::{group_by, reindex, watch_stats_by, GroupStats};
use crate::error::ComputeError;
use crate::types::{weekday_name, EstimatedEvent, TimeOfDay, VideoType, WEEKDAYS};
use chrono::{NaiveDate, Weekday};
use serde::{Deserialize, Serialize};

/// Hours before which the median viewing hour counts as early
const EARLY_BEFORE_HOUR: f64 = 10.0;
/// Hours before which the median viewing hour counts as daytime
const DAYTIME_BEFORE_HOUR: f64 = 17.0;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WeekdayActivity {
    pub weekday: String,
    pub hours: f64,
    pub count: u32,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HourActivity {
    pub hour: u32,
    pub hours: f64,
    pub count: u32,
}

/// Weekday and hour-of-day buckets of one view
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ActivityPatterns {
    /// Always seven rows, Monday first
    pub by_weekday: Vec<WeekdayActivity>,
    /// Always 24 rows, hour 0 first
    pub by_hour: Vec<HourActivity>,
    /// Weekday with the most hours; absent for an empty view
    pub busiest_day: Option<String>,
    /// Hour with the most hours; absent for an empty view
    pub peak_hour: Option<u32>,
}

/// Hours split by video type
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct TypeTotals {
    pub short_hours: f64,
    pub long_hours: f64,
}

impl TypeTotals {
    fn add(&mut self, event: &EstimatedEvent) {
        match event.video_type {
            VideoType::Short => self.short_hours += event.watch_time_hours,
            VideoType::Long => self.long_hours += event.watch_time_hours,
        }
    }
}

/// One date of the daily series
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct DailyWatch {
    pub date: NaiveDate,
    pub short_hours: f64,
    pub long_hours: f64,
    pub short_count: u32,
    pub long_count: u32,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct WeekPartSplit {
    pub weekday: TypeTotals,
    pub weekend: TypeTotals,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PreferredTime {
    pub median_hour: f64,
    pub label: TimeOfDay,
}

/// Weekday and hour buckets, zero-filled, with their argmax
pub fn activity_patterns(events: &[EstimatedEvent]) -> ActivityPatterns {
    let weekday_groups = watch_stats_by(events, |e| Some(weekday_index(e.weekday())));
    let by_weekday: Vec<WeekdayActivity> = reindex(&weekday_groups, 0..WEEKDAYS.len())
        .into_iter()
        .map(|(index, stats)| WeekdayActivity {
            weekday: weekday_name(WEEKDAYS[index]).to_string(),
            hours: stats.hours,
            count: stats.count,
        })
        .collect();

    let hour_groups = watch_stats_by(events, |e| Some(e.hour()));
    let by_hour: Vec<HourActivity> = reindex(&hour_groups, 0..24u32)
        .into_iter()
        .map(|(hour, stats)| HourActivity {
            hour,
            hours: stats.hours,
            count: stats.count,
        })
        .collect();

    let busiest_day = argmax(by_weekday.iter().map(|d| (d.weekday.clone(), d.hours, d.count)));
    let peak_hour = argmax(by_hour.iter().map(|h| (h.hour, h.hours, h.count)));

    ActivityPatterns {
        by_weekday,
        by_hour,
        busiest_day,
        peak_hour,
    }
}

/// Estimated hours per video type, both types always present
pub fn watch_type_totals(events: &[EstimatedEvent]) -> TypeTotals {
    let mut totals = TypeTotals::default();
    for event in events {
        totals.add(event);
    }
    totals
}

/// Per-date hours and counts for each video type, ascending by date
pub fn daily_by_type(events: &[EstimatedEvent]) -> Vec<DailyWatch> {
    // [short, long]
    let groups = group_by(
        events,
        |e| Some(e.date()),
        |day: &mut [GroupStats; 2], e: &EstimatedEvent| match e.video_type {
            VideoType::Short => day[0].add(e),
            VideoType::Long => day[1].add(e),
        },
    );

    groups
        .into_iter()
        .map(|(date, [short, long])| DailyWatch {
            date,
            short_hours: short.hours,
            long_hours: long.hours,
            short_count: short.count,
            long_count: long.count,
        })
        .collect()
}

/// Hours per (weekday/weekend, video type)
pub fn weekend_vs_weekday(events: &[EstimatedEvent]) -> WeekPartSplit {
    let mut split = WeekPartSplit::default();
    for event in events {
        if is_weekend(event.weekday()) {
            split.weekend.add(event);
        } else {
            split.weekday.add(event);
        }
    }
    split
}

/// Median local hour of day and its bucket
///
/// For an even count the median averages the two middle hours.
pub fn preferred_time_of_day(events: &[EstimatedEvent]) -> Result<PreferredTime, ComputeError> {
    let mut hours: Vec<u32> = events.iter().map(|e| e.hour()).collect();
    if hours.is_empty() {
        return Err(ComputeError::NoData(
            "no events to compute a preferred time of day from".to_string(),
        ));
    }
    hours.sort_unstable();

    let mid = hours.len() / 2;
    let median_hour = if hours.len() % 2 == 0 {
        (hours[mid - 1] + hours[mid]) as f64 / 2.0
    } else {
        hours[mid] as f64
    };

    let label = if median_hour < EARLY_BEFORE_HOUR {
        TimeOfDay::Early
    } else if median_hour < DAYTIME_BEFORE_HOUR {
        TimeOfDay::Daytime
    } else {
        TimeOfDay::Night
    };

    Ok(PreferredTime { median_hour, label })
}

pub fn is_weekend(day: Weekday) -> bool {
    matches!(day, Weekday::Sat | Weekday::Sun)
}

fn weekday_index(day: Weekday) -> usize {
    day.num_days_from_monday() as usize
}

/// First bucket with the highest hours; `None` when every bucket is empty
fn argmax<K>(buckets: impl Iterator<Item = (K, f64, u32)>) -> Option<K> {
    let mut best: Option<(K, f64)> = None;
    for (key, hours, count) in buckets {
        if count == 0 {
            continue;
        }
        if best.as_ref().map_or(true, |(_, top)| hours > *top) {
            best = Some((key, hours));
        }
    }
    best.map(|(key, _)| key)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::WatchEvent;
    use chrono::{TimeZone, Utc};
    use pretty_assertions::assert_eq;

    fn event(day: u32, hour: u32, video_type: VideoType, hours: f64) -> EstimatedEvent {
        // January 2024: the 1st is a Monday
        let ts = Utc.with_ymd_and_hms(2024, 1, day, hour, 0, 0).unwrap();
        EstimatedEvent {
            event: WatchEvent {
                timestamp: ts,
                title: format!("video {} {}", day, hour),
                channel: None,
                url: None,
            },
            video_type,
            time_to_next_sec: None,
            watch_time_hours: hours,
            local_time: ts.naive_utc(),
        }
    }

    #[test]
    fn test_weekday_buckets_are_complete_and_ordered() {
        let events = vec![
            event(3, 12, VideoType::Long, 1.0),
            event(3, 13, VideoType::Long, 0.5),
            event(7, 20, VideoType::Short, 0.25),
        ];

        let patterns = activity_patterns(&events);
        let names: Vec<&str> = patterns
            .by_weekday
            .iter()
            .map(|d| d.weekday.as_str())
            .collect();
        assert_eq!(
            names,
            vec!["Monday", "Tuesday", "Wednesday", "Thursday", "Friday", "Saturday", "Sunday"]
        );
        assert_eq!(patterns.by_weekday[0].count, 0);
        assert_eq!(patterns.by_weekday[2].count, 2);
        assert!((patterns.by_weekday[2].hours - 1.5).abs() < 1e-12);
        assert_eq!(patterns.by_weekday[6].count, 1);
        assert_eq!(patterns.busiest_day.as_deref(), Some("Wednesday"));
    }

    #[test]
    fn test_hour_buckets() {
        let events = vec![
            event(1, 0, VideoType::Long, 0.1),
            event(1, 23, VideoType::Long, 0.3),
        ];

        let patterns = activity_patterns(&events);
        assert_eq!(patterns.by_hour.len(), 24);
        assert_eq!(patterns.by_hour[0].hour, 0);
        assert_eq!(patterns.by_hour[23].count, 1);
        assert_eq!(patterns.by_hour[12].hours, 0.0);
        assert_eq!(patterns.peak_hour, Some(23));
    }

    #[test]
    fn test_empty_view_has_no_argmax() {
        let patterns = activity_patterns(&[]);
        assert_eq!(patterns.by_weekday.len(), 7);
        assert_eq!(patterns.by_hour.len(), 24);
        assert_eq!(patterns.busiest_day, None);
        assert_eq!(patterns.peak_hour, None);
    }

    #[test]
    fn test_daily_by_type_zero_fills() {
        let events = vec![
            event(2, 10, VideoType::Short, 0.1),
            event(2, 11, VideoType::Short, 0.1),
            event(1, 9, VideoType::Long, 0.5),
        ];

        let daily = daily_by_type(&events);
        assert_eq!(daily.len(), 2);
        assert_eq!(daily[0].date, NaiveDate::from_ymd_opt(2024, 1, 1).unwrap());
        assert_eq!(daily[0].short_count, 0);
        assert_eq!(daily[0].long_count, 1);
        assert_eq!(daily[1].short_count, 2);
        assert_eq!(daily[1].long_hours, 0.0);
    }

    #[test]
    fn test_watch_type_totals() {
        let events = vec![
            event(1, 9, VideoType::Long, 0.5),
            event(1, 10, VideoType::Short, 0.25),
        ];
        let totals = watch_type_totals(&events);
        assert_eq!(totals.long_hours, 0.5);
        assert_eq!(totals.short_hours, 0.25);
        assert_eq!(watch_type_totals(&[]), TypeTotals::default());
    }

    #[test]
    fn test_weekend_vs_weekday() {
        let events = vec![
            event(6, 10, VideoType::Short, 0.25),
            event(7, 10, VideoType::Long, 1.0),
            event(8, 10, VideoType::Long, 0.5),
        ];

        let split = weekend_vs_weekday(&events);
        assert_eq!(split.weekend.short_hours, 0.25);
        assert_eq!(split.weekend.long_hours, 1.0);
        assert_eq!(split.weekday.long_hours, 0.5);
        assert_eq!(split.weekday.short_hours, 0.0);
    }

    #[test]
    fn test_preferred_time_of_day() {
        let early = vec![event(1, 6, VideoType::Long, 0.1), event(1, 8, VideoType::Long, 0.1)];
        let preferred = preferred_time_of_day(&early).unwrap();
        assert_eq!(preferred.median_hour, 7.0);
        assert_eq!(preferred.label, TimeOfDay::Early);

        let mixed = vec![
            event(1, 9, VideoType::Long, 0.1),
            event(1, 12, VideoType::Long, 0.1),
            event(1, 22, VideoType::Long, 0.1),
        ];
        assert_eq!(preferred_time_of_day(&mixed).unwrap().label, TimeOfDay::Daytime);

        let late = vec![event(1, 17, VideoType::Long, 0.1)];
        assert_eq!(preferred_time_of_day(&late).unwrap().label, TimeOfDay::Night);
    }

    #[test]
    fn test_preferred_time_empty_is_no_data() {
        assert!(preferred_time_of_day(&[]).unwrap_err().is_no_data());
    }
}
