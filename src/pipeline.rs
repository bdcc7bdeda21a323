//! Pipeline orchestration
//!
//! This module provides the public API for watchwrap. It runs a loaded export
//! through the stages in order:
//!
//! 1. Window - year range, then calendar period, on the raw events
//! 2. Estimator - sort, classify and estimate watch time
//! 3. Type filter - keep Short, Long or both
//! 4. Analytics - ranked and bucketed reductions of the view
//! 5. ReportEncoder - JSON report envelope

use crate::analytics::{compute_search_analytics, compute_watch_analytics};
use crate::analytics::{SearchAnalytics, WatchAnalytics};
use crate::config::AnalysisConfig;
use crate::dataset::ExportDataset;
use crate::encoder::{ReportEncoder, WrappedReport};
use crate::error::ComputeError;
use crate::estimator::estimate_watch_time;
use crate::filter::{available_periods, PeriodGranularity, ViewFilter};
use crate::types::{EstimatedEvent, SearchEvent};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::debug;

/// The events selected by one filter, estimated and ready for analytics
#[derive(Debug, Clone, PartialEq)]
pub struct View {
    /// The filter with any "latest period" selection pinned to its label
    pub filter: ViewFilter,
    /// Estimated watch events; `None` when the export has no watch history
    pub watch: Option<Vec<EstimatedEvent>>,
    /// Search events in the window; `None` when the export has no search history
    pub search: Option<Vec<SearchEvent>>,
}

/// Every analytics section computed for one view
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ViewAnalytics {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub watch: Option<WatchAnalytics>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub search: Option<SearchAnalytics>,
}

/// Select, estimate and type-filter the events of one view
///
/// The period is resolved once and pinned, then the same window cuts both
/// streams. A stream with nothing in that window yields an empty section.
pub fn build_view(
    dataset: &ExportDataset,
    filter: &ViewFilter,
    config: &AnalysisConfig,
) -> Result<View, ComputeError> {
    filter.validate()?;
    let pinned = resolve_filter(dataset, filter, config)?;

    let watch = dataset.watch_events().map(|events| {
        let window = pinned.apply_window(events, |e| e.timestamp, &config.time);
        pinned.apply_video_type(estimate_watch_time(window, config))
    });
    let search = dataset
        .search_events()
        .map(|events| pinned.apply_window(events, |e| e.timestamp, &config.time));

    debug!(
        watch_events = watch.as_ref().map_or(0, |w| w.len()),
        search_events = search.as_ref().map_or(0, |s| s.len()),
        "Built view"
    );

    Ok(View {
        filter: pinned,
        watch,
        search,
    })
}

/// Pin the filter's period label against the export
///
/// The latest period comes from the watch history inside the year range, or
/// from the searches when no watch event is in range. An explicit label only
/// has to exist in one of the two streams.
fn resolve_filter(
    dataset: &ExportDataset,
    filter: &ViewFilter,
    config: &AnalysisConfig,
) -> Result<ViewFilter, ComputeError> {
    let (watch, search) = timestamps_in_range(dataset, filter, config);

    let explicit = filter.period.as_ref().map_or(false, |p| p.label.is_some());
    let candidates = if explicit || watch.is_empty() {
        watch.into_iter().chain(search).collect()
    } else {
        watch
    };

    let label = filter.resolve_period(candidates, &config.time)?;
    Ok(filter.pinned(label))
}

/// Watch and search instants inside the filter's year range
fn timestamps_in_range(
    dataset: &ExportDataset,
    filter: &ViewFilter,
    config: &AnalysisConfig,
) -> (Vec<DateTime<Utc>>, Vec<DateTime<Utc>>) {
    let in_range = |timestamps: Vec<DateTime<Utc>>| -> Vec<DateTime<Utc>> {
        timestamps
            .into_iter()
            .filter(|ts| filter.in_year_range(*ts, &config.time))
            .collect()
    };
    let watch = in_range(
        dataset
            .watch_events()
            .map_or_else(Vec::new, |events| events.iter().map(|e| e.timestamp).collect()),
    );
    let search = in_range(
        dataset
            .search_events()
            .map_or_else(Vec::new, |events| events.iter().map(|e| e.timestamp).collect()),
    );
    (watch, search)
}

/// Compute the analytics sections of a view
pub fn analyze_view(view: &View, config: &AnalysisConfig) -> Result<ViewAnalytics, ComputeError> {
    let watch = view
        .watch
        .as_deref()
        .map(|events| compute_watch_analytics(events, config))
        .transpose()?;
    let search = view
        .search
        .as_deref()
        .map(|searches| compute_search_analytics(searches, view.watch.as_deref(), config));

    Ok(ViewAnalytics { watch, search })
}

/// Run the whole pipeline over a loaded export
///
/// # Example
/// ```ignore
/// let dataset = ExportDataset::open_archive(Path::new("takeout.zip"))?;
/// let analytics = analyze_export(&dataset, &ViewFilter::default(), &AnalysisConfig::default())?;
/// ```
pub fn analyze_export(
    dataset: &ExportDataset,
    filter: &ViewFilter,
    config: &AnalysisConfig,
) -> Result<ViewAnalytics, ComputeError> {
    config.validate()?;
    let view = build_view(dataset, filter, config)?;
    analyze_view(&view, config)
}

/// Run the whole pipeline and encode the result as a JSON report
pub fn export_to_report(
    dataset: &ExportDataset,
    filter: &ViewFilter,
    config: &AnalysisConfig,
) -> Result<String, ComputeError> {
    config.validate()?;
    let view = build_view(dataset, filter, config)?;
    let analytics = analyze_view(&view, config)?;
    ReportEncoder::new().encode_to_json(&view, analytics, &dataset.diagnostics(), config)
}

/// Stateful processor holding one loaded export
///
/// Keeps the last built view; asking again with the same filter reuses it.
/// Changing the filter or the configuration rebuilds it.
pub struct WrappedProcessor {
    dataset: ExportDataset,
    config: AnalysisConfig,
    encoder: ReportEncoder,
    cached: Option<View>,
    /// Filter the cached view was requested with (before pinning)
    cached_filter: Option<ViewFilter>,
}

impl WrappedProcessor {
    /// Create a processor over a loaded export
    pub fn new(dataset: ExportDataset, config: AnalysisConfig) -> Result<Self, ComputeError> {
        config.validate()?;
        Ok(Self {
            dataset,
            config,
            encoder: ReportEncoder::new(),
            cached: None,
            cached_filter: None,
        })
    }

    /// Use a specific report encoder (e.g. a fixed instance id)
    pub fn with_encoder(mut self, encoder: ReportEncoder) -> Self {
        self.encoder = encoder;
        self
    }

    pub fn dataset(&self) -> &ExportDataset {
        &self.dataset
    }

    pub fn config(&self) -> &AnalysisConfig {
        &self.config
    }

    /// Replace the configuration; drops the cached view
    pub fn set_config(&mut self, config: AnalysisConfig) -> Result<(), ComputeError> {
        config.validate()?;
        self.config = config;
        self.invalidate();
        Ok(())
    }

    pub fn invalidate(&mut self) {
        self.cached = None;
        self.cached_filter = None;
    }

    /// Whether a view for `filter` is cached
    pub fn is_cached(&self, filter: &ViewFilter) -> bool {
        self.cached.is_some() && self.cached_filter.as_ref() == Some(filter)
    }

    /// The view for `filter`, built on first request
    pub fn view(&mut self, filter: &ViewFilter) -> Result<&View, ComputeError> {
        self.ensure_view(filter)?;
        self.cached_view()
    }

    /// Analytics for `filter`
    pub fn analyze(&mut self, filter: &ViewFilter) -> Result<ViewAnalytics, ComputeError> {
        self.ensure_view(filter)?;
        analyze_view(self.cached_view()?, &self.config)
    }

    /// Full report for `filter`
    pub fn report(&mut self, filter: &ViewFilter) -> Result<WrappedReport, ComputeError> {
        let analytics = self.analyze(filter)?;
        let diagnostics = self.dataset.diagnostics();
        let view = self.cached_view()?;
        Ok(self.encoder.encode(view, analytics, &diagnostics, &self.config))
    }

    /// Full report for `filter` as pretty JSON
    pub fn report_json(&mut self, filter: &ViewFilter) -> Result<String, ComputeError> {
        let report = self.report(filter)?;
        serde_json::to_string_pretty(&report).map_err(ComputeError::JsonError)
    }

    fn ensure_view(&mut self, filter: &ViewFilter) -> Result<(), ComputeError> {
        if !self.is_cached(filter) {
            debug!(?filter, "View cache miss");
            let view = build_view(&self.dataset, filter, &self.config)?;
            self.cached_filter = Some(filter.clone());
            self.cached = Some(view);
        }
        Ok(())
    }

    fn cached_view(&self) -> Result<&View, ComputeError> {
        self.cached
            .as_ref()
            .ok_or_else(|| ComputeError::MissingInput("no view has been built".to_string()))
    }

    /// Period labels available after the filter's year range
    ///
    /// Lists the watch history's periods, or the searches' when no watch
    /// event is in range, matching how a latest period is picked.
    pub fn periods(
        &self,
        granularity: PeriodGranularity,
        filter: &ViewFilter,
    ) -> Result<Vec<String>, ComputeError> {
        filter.validate()?;
        let (watch, search) = timestamps_in_range(&self.dataset, filter, &self.config);
        let timestamps = if watch.is_empty() { search } else { watch };
        Ok(available_periods(timestamps, granularity, &self.config.time))
    }
}
