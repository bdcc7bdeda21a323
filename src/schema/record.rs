//! Raw activity records as they appear in a history export
//!
//! Watch and search history share one record shape: a JSON array of objects
//! with a `time`, a prefixed `title`, and optional attribution fields. Fields
//! the pipeline does not consume are kept so records survive a round trip.

use chrono::{DateTime, NaiveDateTime, Utc};
use serde::{Deserialize, Serialize};

/// Title prefix on watch history records
pub const WATCHED_PREFIX: &str = "Watched";

/// Title prefix on search history records
pub const SEARCHED_PREFIX: &str = "Searched for ";

/// Channel attribution attached to a record
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Subtitle {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,
}

/// One record of a watch or search history export
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ActivityRecord {
    /// Product header (e.g. "YouTube")
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub header: Option<String>,
    /// Prefixed title ("Watched ...", "Searched for ...")
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    /// Link to the watched video or the search results page
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title_url: Option<String>,
    /// Channel attribution; the first entry names the channel
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub subtitles: Option<Vec<Subtitle>>,
    /// Event time, RFC 3339
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub time: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub products: Option<Vec<String>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub activity_controls: Option<Vec<String>>,
    /// Present (non-null) on records that are not organic activity, mostly ads
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub details: Option<serde_json::Value>,
}

impl ActivityRecord {
    /// Parse `time` into an instant; `None` when absent or unparseable
    pub fn timestamp(&self) -> Option<DateTime<Utc>> {
        self.time.as_deref().and_then(parse_timestamp)
    }

    /// Name of the first attributed channel
    pub fn channel(&self) -> Option<String> {
        self.subtitles
            .as_ref()
            .and_then(|subs| subs.first())
            .and_then(|sub| sub.name.clone())
            .filter(|name| !name.trim().is_empty())
    }

    /// Whether the record carries an exclusion marker
    pub fn is_flagged(&self) -> bool {
        self.details.is_some()
    }

    /// Video title with the "Watched" prefix removed
    pub fn watched_title(&self) -> Option<String> {
        let title = self.title.as_deref()?.trim();
        let label = title.strip_prefix(WATCHED_PREFIX).unwrap_or(title).trim();
        if label.is_empty() {
            None
        } else {
            Some(label.to_string())
        }
    }

    /// Query text; `None` unless the title carries the "Searched for " prefix
    pub fn searched_query(&self) -> Option<String> {
        let title = self.title.as_deref()?.trim_start();
        let query = title.strip_prefix(SEARCHED_PREFIX)?.trim();
        if query.is_empty() {
            None
        } else {
            Some(query.to_string())
        }
    }
}

/// Parse an export timestamp
///
/// Exports use RFC 3339 with a `Z` suffix and optional fractional seconds.
/// Offset-less timestamps are read as UTC.
pub fn parse_timestamp(raw: &str) -> Option<DateTime<Utc>> {
    let raw = raw.trim();
    if let Ok(parsed) = DateTime::parse_from_rfc3339(raw) {
        return Some(parsed.with_timezone(&Utc));
    }

    ["%Y-%m-%dT%H:%M:%S%.f", "%Y-%m-%d %H:%M:%S%.f"]
        .iter()
        .find_map(|fmt| NaiveDateTime::parse_from_str(raw, fmt).ok())
        .map(|naive| naive.and_utc())
}
