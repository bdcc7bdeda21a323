//! View filtering: year range, calendar period and video type
//!
//! A view is built in two steps. The window (year range, then period) cuts
//! the raw event sequence before estimation, so classification and durations
//! are recomputed for whatever window is selected. The video-type filter runs
//! after estimation, because a label depends on the event's neighbors.

use crate::config::TimeConfig;
use crate::error::ComputeError;
use crate::types::{EstimatedEvent, VideoType};
use chrono::{DateTime, Datelike, Duration, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

/// Which video types a view keeps
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum VideoTypeFilter {
    #[default]
    All,
    Short,
    Long,
}

impl VideoTypeFilter {
    pub fn matches(&self, video_type: VideoType) -> bool {
        match self {
            VideoTypeFilter::All => true,
            VideoTypeFilter::Short => video_type == VideoType::Short,
            VideoTypeFilter::Long => video_type == VideoType::Long,
        }
    }
}

impl std::str::FromStr for VideoTypeFilter {
    type Err = ComputeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "all" => Ok(VideoTypeFilter::All),
            "short" => Ok(VideoTypeFilter::Short),
            "long" => Ok(VideoTypeFilter::Long),
            other => Err(ComputeError::InvalidConfig(format!(
                "unknown video type filter '{}' (expected all, short or long)",
                other
            ))),
        }
    }
}

/// Calendar granularity of a period selection
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PeriodGranularity {
    #[default]
    Entire,
    Year,
    Month,
    /// Monday to Sunday
    Week,
}

impl PeriodGranularity {
    /// Label of the period containing `date`; `None` for `Entire`
    ///
    /// Labels sort chronologically as strings: `2024`, `2024-03`,
    /// `2024-03-04/2024-03-10`.
    pub fn label(&self, date: NaiveDate) -> Option<String> {
        match self {
            PeriodGranularity::Entire => None,
            PeriodGranularity::Year => Some(format!("{:04}", date.year())),
            PeriodGranularity::Month => Some(format!("{:04}-{:02}", date.year(), date.month())),
            PeriodGranularity::Week => {
                let monday =
                    date - Duration::days(date.weekday().num_days_from_monday() as i64);
                let sunday = monday + Duration::days(6);
                Some(format!(
                    "{}/{}",
                    monday.format("%Y-%m-%d"),
                    sunday.format("%Y-%m-%d")
                ))
            }
        }
    }
}

impl std::str::FromStr for PeriodGranularity {
    type Err = ComputeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "entire" => Ok(PeriodGranularity::Entire),
            "year" => Ok(PeriodGranularity::Year),
            "month" => Ok(PeriodGranularity::Month),
            "week" => Ok(PeriodGranularity::Week),
            other => Err(ComputeError::InvalidConfig(format!(
                "unknown period granularity '{}' (expected entire, year, month or week)",
                other
            ))),
        }
    }
}

/// One calendar period to restrict a view to
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct PeriodSelection {
    pub granularity: PeriodGranularity,
    /// Period label; `None` selects the latest available period
    #[serde(skip_serializing_if = "Option::is_none")]
    pub label: Option<String>,
}

impl PeriodSelection {
    pub fn latest(granularity: PeriodGranularity) -> Self {
        Self {
            granularity,
            label: None,
        }
    }
}

/// Everything that selects a view of the loaded export
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(default)]
pub struct ViewFilter {
    /// Inclusive (start, end) years
    #[serde(skip_serializing_if = "Option::is_none")]
    pub year_range: Option<(i32, i32)>,
    pub video_type: VideoTypeFilter,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub period: Option<PeriodSelection>,
}

impl ViewFilter {
    pub fn validate(&self) -> Result<(), ComputeError> {
        if let Some((start, end)) = self.year_range {
            if start > end {
                return Err(ComputeError::InvalidConfig(format!(
                    "year range start {} is after end {}",
                    start, end
                )));
            }
        }
        Ok(())
    }

    /// Resolve the period label this filter selects within `timestamps`
    ///
    /// Returns `None` when no period restriction applies: no selection,
    /// `Entire`, or no events to pick a latest period from.
    pub fn resolve_period<I>(
        &self,
        timestamps: I,
        time: &TimeConfig,
    ) -> Result<Option<String>, ComputeError>
    where
        I: IntoIterator<Item = DateTime<Utc>>,
    {
        let selection = match &self.period {
            Some(selection) if selection.granularity != PeriodGranularity::Entire => selection,
            _ => return Ok(None),
        };

        let labels = available_periods(timestamps, selection.granularity, time);
        match &selection.label {
            None => Ok(labels.last().cloned()),
            Some(label) if labels.contains(label) => Ok(Some(label.clone())),
            Some(label) => Err(ComputeError::InvalidConfig(format!(
                "period '{}' has no events (available: {})",
                label,
                labels.join(", ")
            ))),
        }
    }

    /// Copy of this filter with the period label fixed
    ///
    /// Lets one resolved "latest" period apply to several event streams.
    pub fn pinned(&self, label: Option<String>) -> ViewFilter {
        let mut pinned = self.clone();
        if let (Some(selection), Some(label)) = (pinned.period.as_mut(), label) {
            selection.label = Some(label);
        }
        pinned
    }

    /// Whether an instant falls inside the year range
    pub fn in_year_range(&self, timestamp: DateTime<Utc>, time: &TimeConfig) -> bool {
        match self.year_range {
            Some((start, end)) => {
                let year = time.local(timestamp).year();
                year >= start && year <= end
            }
            None => true,
        }
    }

    /// Whether an instant falls inside the selected period
    ///
    /// Only a pinned label restricts; an unresolved "latest" selection keeps
    /// everything until it is resolved with [`ViewFilter::resolve_period`].
    pub fn in_period(&self, timestamp: DateTime<Utc>, time: &TimeConfig) -> bool {
        match &self.period {
            Some(PeriodSelection {
                granularity,
                label: Some(label),
            }) if *granularity != PeriodGranularity::Entire => {
                granularity.label(time.local(timestamp).date()).as_deref() == Some(label.as_str())
            }
            _ => true,
        }
    }

    /// Keep the events of one window: year range, then the pinned period
    ///
    /// `timestamp_of` extracts the instant of each record, so the same window
    /// applies to watch and search events. A window with no matching events
    /// is empty, not an error.
    pub fn apply_window<T, F>(&self, events: &[T], timestamp_of: F, time: &TimeConfig) -> Vec<T>
    where
        T: Clone,
        F: Fn(&T) -> DateTime<Utc>,
    {
        events
            .iter()
            .filter(|e| {
                let ts = timestamp_of(*e);
                self.in_year_range(ts, time) && self.in_period(ts, time)
            })
            .cloned()
            .collect()
    }

    /// Drop estimated events of the excluded video type
    pub fn apply_video_type(&self, events: Vec<EstimatedEvent>) -> Vec<EstimatedEvent> {
        if self.video_type == VideoTypeFilter::All {
            return events;
        }
        events
            .into_iter()
            .filter(|e| self.video_type.matches(e.video_type))
            .collect()
    }
}

/// Distinct period labels present in `timestamps`, ascending
pub fn available_periods<I>(
    timestamps: I,
    granularity: PeriodGranularity,
    time: &TimeConfig,
) -> Vec<String>
where
    I: IntoIterator<Item = DateTime<Utc>>,
{
    let labels: BTreeSet<String> = timestamps
        .into_iter()
        .filter_map(|ts| granularity.label(time.local(ts).date()))
        .collect();
    labels.into_iter().collect()
}
