//! Export archive reader
//!
//! A full account export is a zip with many unrelated files. Only members
//! whose names end in the history file names are read; everything else is
//! skipped.

use crate::error::ComputeError;
use std::io::{Read, Seek};
use tracing::{debug, warn};

/// Archive member suffix for watch history
pub const WATCH_HISTORY_SUFFIX: &str = "watch-history.json";

/// Archive member suffix for search history
pub const SEARCH_HISTORY_SUFFIX: &str = "search-history.json";

/// Raw JSON of the history files found in an export
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ExportFiles {
    pub watch_history: Option<String>,
    pub search_history: Option<String>,
}

impl ExportFiles {
    pub fn is_empty(&self) -> bool {
        self.watch_history.is_none() && self.search_history.is_none()
    }
}

/// Extract the history files from a zip archive
///
/// When several members match the same suffix, the last one in archive order
/// wins.
pub fn read_archive<R: Read + Seek>(reader: R) -> Result<ExportFiles, ComputeError> {
    let mut archive = zip::ZipArchive::new(reader)?;
    let mut files = ExportFiles::default();

    for index in 0..archive.len() {
        let mut member = archive.by_index(index)?;
        if member.is_dir() {
            continue;
        }
        let name = member.name().to_string();

        let slot = if name.ends_with(WATCH_HISTORY_SUFFIX) {
            &mut files.watch_history
        } else if name.ends_with(SEARCH_HISTORY_SUFFIX) {
            &mut files.search_history
        } else {
            continue;
        };

        let mut contents = String::new();
        member.read_to_string(&mut contents)?;
        if slot.is_some() {
            warn!(member = %name, "Replacing earlier archive member with the same suffix");
        }
        debug!(member = %name, bytes = contents.len(), "Read archive member");
        *slot = Some(contents);
    }

    Ok(files)
}
