//! Loaded export: watch and search history with their diagnostics

use crate::error::ComputeError;
use crate::schema::{read_archive, ExportAdapter, ExportFiles, LoadDiagnostics, Loaded};
use crate::types::{SearchEvent, WatchEvent};
use serde::{Deserialize, Serialize};
use std::fs::File;
use std::io::{BufReader, Read, Seek};
use std::path::Path;
use tracing::info;

/// Both history files of an export; either may be absent
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ExportDataset {
    pub watch: Option<Loaded<WatchEvent>>,
    pub search: Option<Loaded<SearchEvent>>,
}

/// Load diagnostics per file present in the export
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExportDiagnostics {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub watch_history: Option<LoadDiagnostics>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub search_history: Option<LoadDiagnostics>,
}

impl ExportDiagnostics {
    /// Rows dropped across every file
    pub fn dropped(&self) -> usize {
        self.watch_history.as_ref().map_or(0, |d| d.dropped())
            + self.search_history.as_ref().map_or(0, |d| d.dropped())
    }
}

impl ExportDataset {
    /// Parse the raw JSON of whichever history files were found
    ///
    /// Fails with `MissingInput` when neither file is present.
    pub fn from_files(files: ExportFiles) -> Result<Self, ComputeError> {
        if files.is_empty() {
            return Err(ComputeError::MissingInput(
                "export contains neither watch-history.json nor search-history.json".to_string(),
            ));
        }

        let watch = files
            .watch_history
            .as_deref()
            .map(ExportAdapter::load_watch_history)
            .transpose()?;
        let search = files
            .search_history
            .as_deref()
            .map(ExportAdapter::load_search_history)
            .transpose()?;

        let dataset = Self { watch, search };
        info!(
            watch_events = dataset.watch.as_ref().map_or(0, |w| w.events.len()),
            search_events = dataset.search.as_ref().map_or(0, |s| s.events.len()),
            "Loaded export"
        );
        Ok(dataset)
    }

    /// Load from raw history JSON strings
    pub fn from_json(watch_json: Option<&str>, search_json: Option<&str>) -> Result<Self, ComputeError> {
        Self::from_files(ExportFiles {
            watch_history: watch_json.map(str::to_string),
            search_history: search_json.map(str::to_string),
        })
    }

    /// Load from a zip archive
    pub fn from_archive<R: Read + Seek>(reader: R) -> Result<Self, ComputeError> {
        Self::from_files(read_archive(reader)?)
    }

    /// Open and load a zip archive from disk
    pub fn open_archive(path: &Path) -> Result<Self, ComputeError> {
        let file = File::open(path)?;
        Self::from_archive(BufReader::new(file))
    }

    /// Load individual history files from disk
    pub fn open_files(
        watch_path: Option<&Path>,
        search_path: Option<&Path>,
    ) -> Result<Self, ComputeError> {
        let watch_history = watch_path.map(std::fs::read_to_string).transpose()?;
        let search_history = search_path.map(std::fs::read_to_string).transpose()?;
        Self::from_files(ExportFiles {
            watch_history,
            search_history,
        })
    }

    pub fn watch_events(&self) -> Option<&[WatchEvent]> {
        self.watch.as_ref().map(|w| w.events.as_slice())
    }

    pub fn search_events(&self) -> Option<&[SearchEvent]> {
        self.search.as_ref().map(|s| s.events.as_slice())
    }

    pub fn diagnostics(&self) -> ExportDiagnostics {
        ExportDiagnostics {
            watch_history: self.watch.as_ref().map(|w| w.diagnostics.clone()),
            search_history: self.search.as_ref().map(|s| s.diagnostics.clone()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::{Cursor, Write};
    use zip::write::SimpleFileOptions;

    const WATCH_JSON: &str = r#"[
        {"header": "YouTube", "title": "Watched Rust in 100 Seconds",
         "titleUrl": "https://www.youtube.com/watch?v=5C_HPTJg5ek",
         "subtitles": [{"name": "Fireship", "url": "https://www.youtube.com/channel/x"}],
         "time": "2024-03-04T18:00:00.000Z"},
        {"header": "YouTube", "title": "Watched an ad", "time": "2024-03-04T18:01:00.000Z",
         "details": [{"name": "From Google Ads"}]},
        {"header": "YouTube", "title": "Watched broken", "time": "yesterday"}
    ]"#;

    const SEARCH_JSON: &str = r#"[
        {"header": "YouTube", "title": "Searched for rust lifetimes", "time": "2024-03-04T17:59:00Z"}
    ]"#;

    #[test]
    fn test_from_json_both_files() {
        let dataset = ExportDataset::from_json(Some(WATCH_JSON), Some(SEARCH_JSON)).unwrap();

        assert_eq!(dataset.watch_events().unwrap().len(), 1);
        assert_eq!(dataset.search_events().unwrap()[0].query, "rust lifetimes");

        let diagnostics = dataset.diagnostics();
        let watch = diagnostics.watch_history.as_ref().unwrap();
        assert_eq!(watch.total_records, 3);
        assert_eq!(watch.excluded_details, 1);
        assert_eq!(watch.invalid_timestamp, 1);
        assert_eq!(diagnostics.dropped(), 1);
    }

    #[test]
    fn test_missing_file_is_absent_not_error() {
        let dataset = ExportDataset::from_json(None, Some(SEARCH_JSON)).unwrap();
        assert!(dataset.watch.is_none());
        assert!(dataset.diagnostics().watch_history.is_none());
    }

    #[test]
    fn test_no_files_is_missing_input() {
        let err = ExportDataset::from_json(None, None).unwrap_err();
        assert!(matches!(err, ComputeError::MissingInput(_)));
    }

    #[test]
    fn test_from_archive() {
        let mut writer = zip::ZipWriter::new(Cursor::new(Vec::new()));
        let options = SimpleFileOptions::default();
        writer
            .start_file("Takeout/YouTube and YouTube Music/history/watch-history.json", options)
            .unwrap();
        writer.write_all(WATCH_JSON.as_bytes()).unwrap();
        writer.start_file("Takeout/archive_browser.html", options).unwrap();
        writer.write_all(b"<html></html>").unwrap();
        let mut cursor = writer.finish().unwrap();
        cursor.set_position(0);

        let dataset = ExportDataset::from_archive(cursor).unwrap();
        assert_eq!(dataset.watch_events().unwrap().len(), 1);
        assert!(dataset.search.is_none());
    }

    #[test]
    fn test_non_array_file_is_an_error() {
        let err = ExportDataset::from_json(Some(r#"{"not": "an array"}"#), None).unwrap_err();
        assert!(matches!(err, ComputeError::ParseError(_)));
    }
}
