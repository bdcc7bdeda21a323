//! Search history analytics

use crate::analytics::grouping::{group_by, reindex, GroupStats, Metric};
use crate::analytics::ranking::{top_n, RankedEntry};
use crate::config::TimeConfig;
use crate::types::{weekday_name, EstimatedEvent, SearchEvent, WEEKDAYS};
use chrono::{Datelike, NaiveDate, Timelike};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Search counts of one weekday, one slot per hour of day
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HeatmapRow {
    pub weekday: String,
    /// 24 counts, hour 0 first
    pub counts: Vec<u32>,
}

/// Searches and watches on one date
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct DailyComparison {
    pub date: NaiveDate,
    pub searches: u32,
    pub watches: u32,
}

/// Most frequent queries by count
pub fn top_queries(searches: &[SearchEvent], n: usize) -> Vec<RankedEntry> {
    let groups: BTreeMap<String, GroupStats> = group_by(
        searches,
        |s| Some(s.query.clone()),
        |stats: &mut GroupStats, _| stats.count += 1,
    );
    top_n(groups, Metric::Count, n)
}

/// Searches per hundred watched videos
///
/// The watch count is floored at one.
pub fn search_intensity(search_count: usize, watch_count: usize) -> f64 {
    search_count as f64 / watch_count.max(1) as f64 * 100.0
}

/// Weekday × hour search counts, Monday first, every cell present
pub fn search_heatmap(searches: &[SearchEvent], time: &TimeConfig) -> Vec<HeatmapRow> {
    let cells = group_by(
        searches,
        |s| {
            let local = time.local(s.timestamp);
            Some((
                local.weekday().num_days_from_monday() as usize,
                local.hour(),
            ))
        },
        |count: &mut u32, _| *count += 1,
    );

    WEEKDAYS
        .iter()
        .enumerate()
        .map(|(index, day)| {
            let hours = reindex(&cells, (0..24u32).map(|hour| (index, hour)));
            HeatmapRow {
                weekday: weekday_name(*day).to_string(),
                counts: hours.into_iter().map(|(_, count)| count).collect(),
            }
        })
        .collect()
}

/// Daily search and watch counts over every date that has either
pub fn daily_search_vs_watch(
    searches: &[SearchEvent],
    watches: &[EstimatedEvent],
    time: &TimeConfig,
) -> Vec<DailyComparison> {
    let search_days = group_by(
        searches,
        |s| Some(time.local(s.timestamp).date()),
        |count: &mut u32, _| *count += 1,
    );
    let watch_days = group_by(watches, |e| Some(e.date()), |count: &mut u32, _| *count += 1);

    let mut dates: Vec<NaiveDate> = search_days.keys().chain(watch_days.keys()).copied().collect();
    dates.sort_unstable();
    dates.dedup();

    let searches = reindex(&search_days, dates.iter().copied());
    let watches = reindex(&watch_days, dates.iter().copied());

    searches
        .into_iter()
        .zip(watches)
        .map(|((date, searches), (_, watches))| DailyComparison {
            date,
            searches,
            watches,
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{VideoType, WatchEvent};
    use chrono::{TimeZone, Utc};
    use pretty_assertions::assert_eq;

    fn search(day: u32, hour: u32, query: &str) -> SearchEvent {
        SearchEvent {
            timestamp: Utc.with_ymd_and_hms(2024, 1, day, hour, 0, 0).unwrap(),
            query: query.to_string(),
        }
    }

    fn watch(day: u32) -> EstimatedEvent {
        let ts = Utc.with_ymd_and_hms(2024, 1, day, 20, 0, 0).unwrap();
        EstimatedEvent {
            event: WatchEvent {
                timestamp: ts,
                title: "video".to_string(),
                channel: None,
                url: None,
            },
            video_type: VideoType::Long,
            time_to_next_sec: None,
            watch_time_hours: 0.1,
            local_time: ts.naive_utc(),
        }
    }

    #[test]
    fn test_top_queries() {
        let searches = vec![
            search(1, 9, "rust traits"),
            search(1, 10, "lofi"),
            search(2, 9, "rust traits"),
            search(3, 9, "bread"),
        ];

        let top = top_queries(&searches, 2);
        assert_eq!(top.len(), 2);
        assert_eq!(top[0].key, "rust traits");
        assert_eq!(top[0].count, 2);
        // tie between "bread" and "lofi" resolves by key
        assert_eq!(top[1].key, "bread");
    }

    #[test]
    fn test_search_intensity() {
        assert_eq!(search_intensity(50, 200), 25.0);
        assert_eq!(search_intensity(3, 0), 300.0);
        assert_eq!(search_intensity(0, 0), 0.0);
    }

    #[test]
    fn test_heatmap_shape_and_cells() {
        // 2024-01-01 is a Monday
        let searches = vec![search(1, 9, "a"), search(1, 9, "b"), search(7, 23, "c")];
        let heatmap = search_heatmap(&searches, &TimeConfig::default());

        assert_eq!(heatmap.len(), 7);
        assert!(heatmap.iter().all(|row| row.counts.len() == 24));
        assert_eq!(heatmap[0].weekday, "Monday");
        assert_eq!(heatmap[0].counts[9], 2);
        assert_eq!(heatmap[6].counts[23], 1);
        assert_eq!(heatmap.iter().map(|r| r.counts.iter().sum::<u32>()).sum::<u32>(), 3);
    }

    #[test]
    fn test_heatmap_respects_offset() {
        let time = TimeConfig {
            utc_offset_minutes: 120,
        };
        // Sunday 23:00 UTC is Monday 01:00 at +02:00
        let heatmap = search_heatmap(&[search(7, 23, "late")], &time);
        assert_eq!(heatmap[0].counts[1], 1);
        assert_eq!(heatmap[6].counts[23], 0);
    }

    #[test]
    fn test_daily_search_vs_watch_uses_date_union() {
        let searches = vec![search(1, 9, "a"), search(3, 9, "b"), search(3, 10, "c")];
        let watches = vec![watch(2), watch(3)];

        let daily = daily_search_vs_watch(&searches, &watches, &TimeConfig::default());
        let rows: Vec<(u32, u32, u32)> = daily
            .iter()
            .map(|d| (d.date.day(), d.searches, d.watches))
            .collect();
        assert_eq!(rows, vec![(1, 1, 0), (2, 0, 1), (3, 2, 1)]);
    }
}
