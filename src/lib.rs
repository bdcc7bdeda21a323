//! watchwrap - Behavioral analytics over personal video watch history exports
//!
//! watchwrap turns a watch/search history export into session and ranking
//! analytics through a deterministic pipeline: export loading → windowing →
//! short/long classification → watch-time estimation → ranked analytics →
//! report encoding.
//!
//! ## Modules
//!
//! - **Loading**: parse history JSON or pull it out of an export zip (`schema`, `dataset`)
//! - **Enrichment**: classify events and estimate watch time (`classifier`, `estimator`)
//! - **Analytics**: sessions, rankings, calendar buckets, streaks, search (`sessions`, `analytics`)
//! - **Orchestration**: filtered views, caching and reports (`filter`, `pipeline`, `encoder`)

pub mod analytics;
pub mod classifier;
pub mod config;
pub mod dataset;
pub mod encoder;
pub mod error;
pub mod estimator;
pub mod filter;
pub mod pipeline;
pub mod schema;
pub mod sessions;
pub mod types;

pub use config::AnalysisConfig;
pub use dataset::{ExportDataset, ExportDiagnostics};
pub use encoder::{ReportEncoder, WrappedReport};
pub use error::ComputeError;
pub use filter::{PeriodGranularity, PeriodSelection, VideoTypeFilter, ViewFilter};
pub use pipeline::{analyze_export, export_to_report, View, ViewAnalytics, WrappedProcessor};

// Stage entry points
pub use classifier::classify_videos;
pub use estimator::estimate_watch_time;
pub use sessions::{detect_sessions, longest_binge};

/// Crate version embedded in every report
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Producer name for reports
pub const PRODUCER_NAME: &str = "watchwrap";
