//! Adapter for converting raw export records into normalized events
//!
//! Bad rows never fail a batch: each is dropped and counted in
//! `LoadDiagnostics` so callers can report how much of the export was usable.

use crate::error::ComputeError;
use crate::schema::record::ActivityRecord;
use crate::types::{SearchEvent, WatchEvent};
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

/// Per-file accounting of what the loader kept and why it dropped the rest
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct LoadDiagnostics {
    /// Records present in the file
    pub total_records: usize,
    /// Records converted into events
    pub kept: usize,
    /// Array entries that were not a record object
    pub malformed_record: usize,
    /// Records whose time was missing or unparseable
    pub invalid_timestamp: usize,
    /// Records without a usable title or query
    pub missing_title: usize,
    /// Records excluded by a `details` marker
    pub excluded_details: usize,
}

impl LoadDiagnostics {
    /// Rows dropped because they were malformed (excluded rows are not counted)
    pub fn dropped(&self) -> usize {
        self.malformed_record + self.invalid_timestamp + self.missing_title
    }
}

/// Events loaded from one export file, with their diagnostics
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Loaded<T> {
    pub events: Vec<T>,
    pub diagnostics: LoadDiagnostics,
}

impl<T> Loaded<T> {
    pub fn is_empty(&self) -> bool {
        self.events.is_empty()
    }
}

/// Adapter for history export files
pub struct ExportAdapter;

impl ExportAdapter {
    /// Parse a JSON array into records, keeping entries that fail to decode
    /// as `None` so they can be counted
    pub fn parse_records(json: &str) -> Result<Vec<Option<ActivityRecord>>, ComputeError> {
        let values: Vec<serde_json::Value> = serde_json::from_str(json).map_err(|e| {
            ComputeError::ParseError(format!("Export must be a JSON array of records: {}", e))
        })?;

        Ok(values
            .into_iter()
            .map(|value| serde_json::from_value::<ActivityRecord>(value).ok())
            .collect())
    }

    /// Load watch history; events keep the file's order
    pub fn load_watch_history(json: &str) -> Result<Loaded<WatchEvent>, ComputeError> {
        let records = Self::parse_records(json)?;
        let mut diagnostics = LoadDiagnostics {
            total_records: records.len(),
            ..Default::default()
        };
        let mut events = Vec::with_capacity(records.len());

        for record in records {
            let Some(record) = record else {
                diagnostics.malformed_record += 1;
                continue;
            };
            if record.is_flagged() {
                diagnostics.excluded_details += 1;
                continue;
            }
            let Some(timestamp) = record.timestamp() else {
                diagnostics.invalid_timestamp += 1;
                continue;
            };
            let Some(title) = record.watched_title() else {
                diagnostics.missing_title += 1;
                continue;
            };

            let channel = record.channel();
            events.push(WatchEvent {
                timestamp,
                title,
                channel,
                url: record.title_url,
            });
        }

        diagnostics.kept = events.len();
        log_diagnostics("watch-history", &diagnostics);
        Ok(Loaded {
            events,
            diagnostics,
        })
    }

    /// Load search history; only "Searched for " records become events
    pub fn load_search_history(json: &str) -> Result<Loaded<SearchEvent>, ComputeError> {
        let records = Self::parse_records(json)?;
        let mut diagnostics = LoadDiagnostics {
            total_records: records.len(),
            ..Default::default()
        };
        let mut events = Vec::with_capacity(records.len());

        for record in records {
            let Some(record) = record else {
                diagnostics.malformed_record += 1;
                continue;
            };
            let Some(timestamp) = record.timestamp() else {
                diagnostics.invalid_timestamp += 1;
                continue;
            };
            let Some(query) = record.searched_query() else {
                diagnostics.missing_title += 1;
                continue;
            };

            events.push(SearchEvent { timestamp, query });
        }

        diagnostics.kept = events.len();
        log_diagnostics("search-history", &diagnostics);
        Ok(Loaded {
            events,
            diagnostics,
        })
    }
}

fn log_diagnostics(source: &str, diagnostics: &LoadDiagnostics) {
    info!(
        source,
        total = diagnostics.total_records,
        kept = diagnostics.kept,
        "Loaded export file"
    );
    if diagnostics.dropped() > 0 {
        warn!(
            source,
            malformed = diagnostics.malformed_record,
            invalid_timestamp = diagnostics.invalid_timestamp,
            missing_title = diagnostics.missing_title,
            "Dropped unusable rows"
        );
    }
    if diagnostics.excluded_details > 0 {
        debug!(
            source,
            excluded = diagnostics.excluded_details,
            "Excluded flagged rows"
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{TimeZone, Utc};
    use pretty_assertions::assert_eq;

    fn sample_watch_json() -> &'static str {
        r#"[
            {
                "header": "YouTube",
                "title": "Watched Second Video",
                "titleUrl": "https://www.youtube.com/watch?v=b",
                "subtitles": [{ "name": "Channel B" }],
                "time": "2024-01-15T14:10:00Z"
            },
            {
                "header": "YouTube",
                "title": "Watched First Video",
                "titleUrl": "https://www.youtube.com/watch?v=a",
                "subtitles": [{ "name": "Channel A" }],
                "time": "2024-01-15T14:00:00.250Z"
            },
            {
                "header": "YouTube",
                "title": "Watched Sponsored",
                "time": "2024-01-15T14:05:00Z",
                "details": [{ "name": "From Google Ads" }]
            },
            {
                "header": "YouTube",
                "title": "Watched Broken Time",
                "time": "not a time"
            },
            {
                "header": "YouTube",
                "time": "2024-01-15T14:20:00Z"
            },
            42
        ]"#
    }

    #[test]
    fn test_load_watch_history() {
        let loaded = ExportAdapter::load_watch_history(sample_watch_json()).unwrap();

        assert_eq!(loaded.events.len(), 2);
        assert_eq!(loaded.events[0].title, "Second Video");
        assert_eq!(loaded.events[0].channel.as_deref(), Some("Channel B"));
        assert_eq!(
            loaded.events[1].url.as_deref(),
            Some("https://www.youtube.com/watch?v=a")
        );
        assert_eq!(
            loaded.events[0].timestamp,
            Utc.with_ymd_and_hms(2024, 1, 15, 14, 10, 0).unwrap()
        );
    }

    #[test]
    fn test_watch_diagnostics() {
        let loaded = ExportAdapter::load_watch_history(sample_watch_json()).unwrap();

        assert_eq!(
            loaded.diagnostics,
            LoadDiagnostics {
                total_records: 6,
                kept: 2,
                malformed_record: 1,
                invalid_timestamp: 1,
                missing_title: 1,
                excluded_details: 1,
            }
        );
        assert_eq!(loaded.diagnostics.dropped(), 3);
    }

    #[test]
    fn test_load_search_history() {
        let json = r#"[
            { "title": "Searched for rust async", "time": "2024-01-15T14:00:00Z" },
            { "title": "Searched for  borrow checker ", "time": "2024-01-15T15:00:00Z" },
            { "title": "Visited Some Page", "time": "2024-01-15T16:00:00Z" },
            { "title": "Searched for lost", "time": "garbage" }
        ]"#;

        let loaded = ExportAdapter::load_search_history(json).unwrap();
        let queries: Vec<&str> = loaded.events.iter().map(|e| e.query.as_str()).collect();

        assert_eq!(queries, vec!["rust async", "borrow checker"]);
        assert_eq!(loaded.diagnostics.missing_title, 1);
        assert_eq!(loaded.diagnostics.invalid_timestamp, 1);
        assert_eq!(loaded.diagnostics.kept, 2);
    }

    #[test]
    fn test_empty_array_is_not_an_error() {
        let loaded = ExportAdapter::load_watch_history("[]").unwrap();
        assert!(loaded.is_empty());
        assert_eq!(loaded.diagnostics, LoadDiagnostics::default());
    }

    #[test]
    fn test_non_array_is_parse_error() {
        let result = ExportAdapter::load_watch_history(r#"{ "title": "Watched X" }"#);
        assert!(matches!(result, Err(ComputeError::ParseError(_))));

        let result = ExportAdapter::load_search_history("not json");
        assert!(result.is_err());
    }
}
