//! Analysis configuration
//!
//! Every tunable of the pipeline lives here with its default defined once.
//! Stages take the sub-config they need as an explicit argument.

use crate::error::ComputeError;
use chrono::{DateTime, FixedOffset, NaiveDateTime, Offset, Utc};
use serde::{Deserialize, Serialize};

/// Default gap (seconds) below which consecutive events form a rapid cluster
pub const DEFAULT_GAP_THRESHOLD_SEC: f64 = 90.0;

/// Default idle gap (minutes) that splits two sessions
pub const DEFAULT_IDLE_GAP_MIN: f64 = 10.0;

/// Largest accepted UTC offset (±14 hours)
const MAX_UTC_OFFSET_MINUTES: i32 = 14 * 60;

/// Short/long classification parameters
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ClassificationConfig {
    /// Events at most this many seconds apart continue a cluster
    pub gap_threshold_sec: f64,
}

impl Default for ClassificationConfig {
    fn default() -> Self {
        Self {
            gap_threshold_sec: DEFAULT_GAP_THRESHOLD_SEC,
        }
    }
}

/// Watch-time assumptions, in minutes
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DurationConfig {
    /// Fixed watch time credited to every Short event
    pub short_duration_min: f64,
    /// Longest observed gap still trusted as a Long watch time
    pub max_long_duration_min: f64,
    /// Fallback for Long events with no usable gap
    pub default_long_duration_min: f64,
}

impl Default for DurationConfig {
    fn default() -> Self {
        Self {
            short_duration_min: 1.0,
            max_long_duration_min: 20.0,
            default_long_duration_min: 5.0,
        }
    }
}

/// Session (binge) detection parameters
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SessionConfig {
    /// A gap strictly above this many minutes starts a new session
    pub idle_gap_min: f64,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            idle_gap_min: DEFAULT_IDLE_GAP_MIN,
        }
    }
}

/// Top-N sizes for ranked outputs
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct RankingConfig {
    pub top_videos: usize,
    pub top_channels_by_count: usize,
    pub top_channels_by_hours: usize,
    pub top_queries: usize,
}

impl Default for RankingConfig {
    fn default() -> Self {
        Self {
            top_videos: 10,
            top_channels_by_count: 15,
            top_channels_by_hours: 10,
            top_queries: 20,
        }
    }
}

/// Calendar bucketing settings
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct TimeConfig {
    /// Fixed offset from UTC applied before taking dates, weekdays and hours
    pub utc_offset_minutes: i32,
}

impl TimeConfig {
    pub fn offset(&self) -> FixedOffset {
        // out-of-range offsets are rejected by validate(); fall back to UTC
        FixedOffset::east_opt(self.utc_offset_minutes * 60).unwrap_or_else(|| Utc.fix())
    }

    /// Convert an instant to local wall-clock time
    pub fn local(&self, timestamp: DateTime<Utc>) -> NaiveDateTime {
        timestamp.with_timezone(&self.offset()).naive_local()
    }
}

/// Complete analysis configuration
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AnalysisConfig {
    pub classification: ClassificationConfig,
    pub duration: DurationConfig,
    pub session: SessionConfig,
    pub ranking: RankingConfig,
    pub time: TimeConfig,
}

impl AnalysisConfig {
    /// Load a configuration from JSON; missing fields take their defaults
    pub fn from_json(json: &str) -> Result<Self, ComputeError> {
        let config: AnalysisConfig = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    pub fn to_json(&self) -> Result<String, ComputeError> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    /// Check that every threshold is usable
    pub fn validate(&self) -> Result<(), ComputeError> {
        require_positive(
            "classification.gap_threshold_sec",
            self.classification.gap_threshold_sec,
        )?;
        require_positive(
            "duration.short_duration_min",
            self.duration.short_duration_min,
        )?;
        require_positive(
            "duration.max_long_duration_min",
            self.duration.max_long_duration_min,
        )?;
        require_positive(
            "duration.default_long_duration_min",
            self.duration.default_long_duration_min,
        )?;
        require_positive("session.idle_gap_min", self.session.idle_gap_min)?;

        if self.time.utc_offset_minutes.abs() > MAX_UTC_OFFSET_MINUTES {
            return Err(ComputeError::InvalidConfig(format!(
                "time.utc_offset_minutes must be within ±{} (got {})",
                MAX_UTC_OFFSET_MINUTES, self.time.utc_offset_minutes
            )));
        }

        Ok(())
    }
}

fn require_positive(name: &str, value: f64) -> Result<(), ComputeError> {
    if !value.is_finite() || value <= 0.0 {
        return Err(ComputeError::InvalidConfig(format!(
            "{} must be a positive number (got {})",
            name, value
        )));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{TimeZone, Timelike};
    use pretty_assertions::assert_eq;

    #[test]
    fn test_defaults() {
        let config = AnalysisConfig::default();
        assert_eq!(config.classification.gap_threshold_sec, 90.0);
        assert_eq!(config.duration.short_duration_min, 1.0);
        assert_eq!(config.duration.max_long_duration_min, 20.0);
        assert_eq!(config.duration.default_long_duration_min, 5.0);
        assert_eq!(config.session.idle_gap_min, 10.0);
        assert_eq!(config.ranking.top_videos, 10);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_partial_json_fills_defaults() {
        let json = r#"{ "session": { "idle_gap_min": 30 }, "ranking": { "top_videos": 5 } }"#;
        let config = AnalysisConfig::from_json(json).unwrap();

        assert_eq!(config.session.idle_gap_min, 30.0);
        assert_eq!(config.ranking.top_videos, 5);
        assert_eq!(config.ranking.top_queries, 20);
        assert_eq!(config.classification, ClassificationConfig::default());
    }

    #[test]
    fn test_json_roundtrip() {
        let config = AnalysisConfig::default();
        let json = config.to_json().unwrap();
        let parsed = AnalysisConfig::from_json(&json).unwrap();
        assert_eq!(parsed, config);
    }

    #[test]
    fn test_rejects_non_positive_threshold() {
        let mut config = AnalysisConfig::default();
        config.classification.gap_threshold_sec = 0.0;
        let err = config.validate().unwrap_err();
        assert!(matches!(err, ComputeError::InvalidConfig(_)));

        let mut config = AnalysisConfig::default();
        config.duration.short_duration_min = f64::NAN;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_rejects_out_of_range_offset() {
        let mut config = AnalysisConfig::default();
        config.time.utc_offset_minutes = 15 * 60;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_local_time_applies_offset() {
        let time = TimeConfig {
            utc_offset_minutes: -300,
        };
        let ts = Utc.with_ymd_and_hms(2024, 1, 15, 3, 0, 0).unwrap();
        let local = time.local(ts);

        assert_eq!(local.hour(), 22);
        assert_eq!(local.date().to_string(), "2024-01-14");
    }
}
