//! Core types for watchwrap
//!
//! Events flow through the pipeline as progressively richer values:
//! `WatchEvent` → `ClassifiedEvent` → `EstimatedEvent`. Sessions are derived
//! transiently from the estimated sequence.

use chrono::{DateTime, Datelike, NaiveDate, NaiveDateTime, Timelike, Utc, Weekday};
use serde::{Deserialize, Serialize};

/// Canonical weekday order used by every weekday bucket
pub const WEEKDAYS: [Weekday; 7] = [
    Weekday::Mon,
    Weekday::Tue,
    Weekday::Wed,
    Weekday::Thu,
    Weekday::Fri,
    Weekday::Sat,
    Weekday::Sun,
];

/// Full English weekday name ("Monday" .. "Sunday")
pub fn weekday_name(day: Weekday) -> &'static str {
    match day {
        Weekday::Mon => "Monday",
        Weekday::Tue => "Tuesday",
        Weekday::Wed => "Wednesday",
        Weekday::Thu => "Thursday",
        Weekday::Fri => "Friday",
        Weekday::Sat => "Saturday",
        Weekday::Sun => "Sunday",
    }
}

/// Short-form vs long-form consumption label
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum VideoType {
    Short,
    Long,
}

/// A single watched-video record from the export
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WatchEvent {
    /// When the video was opened
    pub timestamp: DateTime<Utc>,
    /// Video title with the "Watched " prefix removed
    pub title: String,
    /// Channel the video belongs to, when the export attributes one
    #[serde(skip_serializing_if = "Option::is_none")]
    pub channel: Option<String>,
    /// Link to the video
    #[serde(skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,
}

/// A single search record from the export
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SearchEvent {
    /// When the search was issued
    pub timestamp: DateTime<Utc>,
    /// Query text with the "Searched for " prefix removed
    pub query: String,
}

/// A watch event labeled by the classifier
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ClassifiedEvent {
    #[serde(flatten)]
    pub event: WatchEvent,
    pub video_type: VideoType,
}

/// A classified event annotated with its estimated watch time
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EstimatedEvent {
    #[serde(flatten)]
    pub event: WatchEvent,
    pub video_type: VideoType,
    /// Seconds until the next event; absent for the last event
    pub time_to_next_sec: Option<f64>,
    /// Estimated watch time in hours (never negative)
    pub watch_time_hours: f64,
    /// Wall-clock time used for calendar bucketing
    pub local_time: NaiveDateTime,
}

impl EstimatedEvent {
    pub fn timestamp(&self) -> DateTime<Utc> {
        self.event.timestamp
    }

    pub fn title(&self) -> &str {
        &self.event.title
    }

    pub fn channel(&self) -> Option<&str> {
        self.event.channel.as_deref()
    }

    /// Calendar date in local time
    pub fn date(&self) -> NaiveDate {
        self.local_time.date()
    }

    /// Hour of day (0-23) in local time
    pub fn hour(&self) -> u32 {
        self.local_time.hour()
    }

    pub fn weekday(&self) -> Weekday {
        self.local_time.weekday()
    }

    pub fn year(&self) -> i32 {
        self.local_time.year()
    }
}

/// A maximal run of events without an idle gap
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Session {
    pub start: DateTime<Utc>,
    pub end: DateTime<Utc>,
    pub video_count: u32,
    pub total_hours: f64,
}

impl Session {
    /// Wall-clock span between the first and last event, in minutes
    pub fn span_minutes(&self) -> f64 {
        (self.end - self.start).num_milliseconds() as f64 / 60_000.0
    }
}

/// Preferred viewing time bucket
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TimeOfDay {
    Early,
    Daytime,
    Night,
}
