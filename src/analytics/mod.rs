//! Ranked analytics over an estimated view
//!
//! Every function here is a pure reduction of the current view. The two
//! aggregators below bundle them into the watch and search sections of a
//! report; KPIs that have no answer for an empty view surface `NoData`, which
//! the aggregators turn into absent fields.

pub mod grouping;
pub mod kpi;
pub mod ranking;
pub mod search;
pub mod temporal;

pub use grouping::{group_by, reindex, GroupStats, Metric};
pub use kpi::{consistency, longest_streak, streak_stats, watch_totals, StreakStats, WatchTotals};
pub use ranking::{channel_loyalty, top_n, ChannelLoyalty, RankedEntry};
pub use search::{DailyComparison, HeatmapRow};
pub use temporal::{
    activity_patterns, preferred_time_of_day, ActivityPatterns, DailyWatch, PreferredTime,
    TypeTotals, WeekPartSplit,
};

use crate::config::AnalysisConfig;
use crate::error::ComputeError;
use crate::sessions::longest_binge;
use crate::types::{EstimatedEvent, SearchEvent, Session};
use serde::{Deserialize, Serialize};
use tracing::debug;

/// KPIs that only exist for a non-empty view
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Highlights {
    pub longest_binge: Session,
    /// Minutes between the first and last video of the binge
    pub longest_binge_span_min: f64,
    pub streak: StreakStats,
    pub preferred_time: PreferredTime,
    /// Absent when no event in the view carries a channel
    pub top_channel: Option<ChannelLoyalty>,
}

/// Watch-history section of a report
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WatchAnalytics {
    pub totals: WatchTotals,
    pub type_totals: TypeTotals,
    pub top_videos_by_hours: Vec<RankedEntry>,
    pub top_videos_by_count: Vec<RankedEntry>,
    pub top_channels_by_count: Vec<RankedEntry>,
    pub top_channels_by_hours: Vec<RankedEntry>,
    pub activity: ActivityPatterns,
    pub daily: Vec<DailyWatch>,
    pub weekend_vs_weekday: WeekPartSplit,
    /// Absent for an empty view
    pub highlights: Option<Highlights>,
}

/// Search-history section of a report
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SearchAnalytics {
    pub total_searches: u32,
    pub top_queries: Vec<RankedEntry>,
    /// Searches per hundred watches; absent when the view has no watches
    pub intensity_pct: Option<f64>,
    pub heatmap: Vec<HeatmapRow>,
    /// Absent without a watch history
    pub daily_vs_watch: Option<Vec<DailyComparison>>,
}

/// Compute every watch analytic for one estimated view
pub fn compute_watch_analytics(
    events: &[EstimatedEvent],
    config: &AnalysisConfig,
) -> Result<WatchAnalytics, ComputeError> {
    let limits = &config.ranking;

    let analytics = WatchAnalytics {
        totals: watch_totals(events),
        type_totals: temporal::watch_type_totals(events),
        top_videos_by_hours: ranking::top_videos_by_hours(events, limits.top_videos),
        top_videos_by_count: ranking::top_videos_by_count(events, limits.top_videos),
        top_channels_by_count: ranking::top_channels_by_count(
            events,
            limits.top_channels_by_count,
        ),
        top_channels_by_hours: ranking::top_channels_by_hours(
            events,
            limits.top_channels_by_hours,
        ),
        activity: activity_patterns(events),
        daily: temporal::daily_by_type(events),
        weekend_vs_weekday: temporal::weekend_vs_weekday(events),
        highlights: compute_highlights(events, config)?,
    };

    debug!(
        events = events.len(),
        has_highlights = analytics.highlights.is_some(),
        "Computed watch analytics"
    );

    Ok(analytics)
}

/// Compute search analytics, relating them to the watch view when present
pub fn compute_search_analytics(
    searches: &[SearchEvent],
    watches: Option<&[EstimatedEvent]>,
    config: &AnalysisConfig,
) -> SearchAnalytics {
    let analytics = SearchAnalytics {
        total_searches: searches.len() as u32,
        top_queries: search::top_queries(searches, config.ranking.top_queries),
        intensity_pct: watches
            .filter(|w| !w.is_empty())
            .map(|w| search::search_intensity(searches.len(), w.len())),
        heatmap: search::search_heatmap(searches, &config.time),
        daily_vs_watch: watches.map(|w| search::daily_search_vs_watch(searches, w, &config.time)),
    };

    debug!(searches = searches.len(), "Computed search analytics");

    analytics
}

fn compute_highlights(
    events: &[EstimatedEvent],
    config: &AnalysisConfig,
) -> Result<Option<Highlights>, ComputeError> {
    let longest_binge = match optional(longest_binge(events, &config.session))? {
        Some(session) => session,
        None => return Ok(None),
    };

    Ok(Some(Highlights {
        longest_binge_span_min: longest_binge.span_minutes(),
        longest_binge,
        streak: streak_stats(events.iter().map(|e| e.date()))?,
        preferred_time: preferred_time_of_day(events)?,
        top_channel: optional(channel_loyalty(events))?,
    }))
}

/// Map `NoData` to `None`, propagating every other error
fn optional<T>(result: Result<T, ComputeError>) -> Result<Option<T>, ComputeError> {
    match result {
        Ok(value) => Ok(Some(value)),
        Err(err) if err.is_no_data() => Ok(None),
        Err(err) => Err(err),
    }
}
