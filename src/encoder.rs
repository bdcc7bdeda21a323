//! Report encoding
//!
//! This module wraps the analytics of one view in a self-describing JSON
//! report: producer metadata, the filters and configuration that produced it,
//! the load diagnostics, and the watch and search sections.

use crate::analytics::{SearchAnalytics, WatchAnalytics};
use crate::config::AnalysisConfig;
use crate::dataset::ExportDiagnostics;
use crate::error::ComputeError;
use crate::filter::ViewFilter;
use crate::pipeline::{View, ViewAnalytics};
use crate::types::EstimatedEvent;
use crate::{PRODUCER_NAME, VERSION};
use chrono::Utc;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Current report schema version
pub const REPORT_VERSION: &str = "1.0.0";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReportProducer {
    pub name: String,
    pub version: String,
    pub instance_id: String,
}

/// A complete analytics report for one view
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WrappedReport {
    pub report_version: String,
    pub producer: ReportProducer,
    pub computed_at_utc: String,
    /// Filter as applied, with a latest-period selection pinned to its label
    pub filters: ViewFilter,
    pub config: AnalysisConfig,
    pub diagnostics: ExportDiagnostics,
    /// Absent when the export has no watch history
    #[serde(skip_serializing_if = "Option::is_none")]
    pub watch: Option<WatchAnalytics>,
    /// Absent when the export has no search history
    #[serde(skip_serializing_if = "Option::is_none")]
    pub search: Option<SearchAnalytics>,
    /// The enriched event table, when requested
    #[serde(skip_serializing_if = "Option::is_none")]
    pub events: Option<Vec<EstimatedEvent>>,
}

/// Encoder for producing report payloads
pub struct ReportEncoder {
    instance_id: String,
    include_events: bool,
}

impl Default for ReportEncoder {
    fn default() -> Self {
        Self::new()
    }
}

impl ReportEncoder {
    /// Create a new encoder with a unique instance ID
    pub fn new() -> Self {
        Self {
            instance_id: Uuid::new_v4().to_string(),
            include_events: false,
        }
    }

    /// Create an encoder with a specific instance ID
    pub fn with_instance_id(instance_id: String) -> Self {
        Self {
            instance_id,
            include_events: false,
        }
    }

    /// Also embed the enriched watch events in the report
    pub fn including_events(mut self) -> Self {
        self.include_events = true;
        self
    }

    pub fn instance_id(&self) -> &str {
        &self.instance_id
    }

    /// Encode the analytics of a view into a report
    pub fn encode(
        &self,
        view: &View,
        analytics: ViewAnalytics,
        diagnostics: &ExportDiagnostics,
        config: &AnalysisConfig,
    ) -> WrappedReport {
        WrappedReport {
            report_version: REPORT_VERSION.to_string(),
            producer: ReportProducer {
                name: PRODUCER_NAME.to_string(),
                version: VERSION.to_string(),
                instance_id: self.instance_id.clone(),
            },
            computed_at_utc: Utc::now().to_rfc3339(),
            filters: view.filter.clone(),
            config: config.clone(),
            diagnostics: diagnostics.clone(),
            watch: analytics.watch,
            search: analytics.search,
            events: if self.include_events {
                view.watch.clone()
            } else {
                None
            },
        }
    }

    /// Encode to JSON string
    pub fn encode_to_json(
        &self,
        view: &View,
        analytics: ViewAnalytics,
        diagnostics: &ExportDiagnostics,
        config: &AnalysisConfig,
    ) -> Result<String, ComputeError> {
        let report = self.encode(view, analytics, diagnostics, config);
        serde_json::to_string_pretty(&report).map_err(ComputeError::JsonError)
    }
}
