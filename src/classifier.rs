//! Short-form vs long-form classification
//!
//! Short-form viewing shows up as dense bursts of events seconds apart. The
//! classifier splits the ordered sequence into clusters wherever the gap to the
//! previous event exceeds a threshold; every event of a cluster with two or more
//! members is `Short`, isolated events are `Long`.
//!
//! A long video followed within the threshold by another single video forms a
//! two-event cluster and both are labeled `Short`. The rule accepts that.

use crate::config::ClassificationConfig;
use crate::types::{ClassifiedEvent, VideoType, WatchEvent};
use tracing::debug;

/// Minimum cluster size flagged as rapid
const RAPID_CLUSTER_MIN_SIZE: usize = 2;

/// Sort events by timestamp, keeping ingestion order for ties
pub fn sort_chronologically(events: &mut [WatchEvent]) {
    // sort_by_key is stable
    events.sort_by_key(|e| e.timestamp);
}

/// Gap in seconds to the previous event; `None` for the first event
pub fn gaps_to_previous(events: &[WatchEvent]) -> Vec<Option<f64>> {
    let mut gaps = Vec::with_capacity(events.len());
    if events.is_empty() {
        return gaps;
    }
    gaps.push(None);
    gaps.extend(
        events
            .windows(2)
            .map(|pair| Some(seconds_between(&pair[0], &pair[1]))),
    );
    gaps
}

/// Cluster id per event; a new cluster starts when the gap exceeds the threshold
pub fn cluster_ids(events: &[WatchEvent], gap_threshold_sec: f64) -> Vec<usize> {
    let mut ids = Vec::with_capacity(events.len());
    let mut current = 0usize;

    for (index, gap) in gaps_to_previous(events).into_iter().enumerate() {
        // the first event has no gap and always opens a cluster
        let starts_cluster = gap.map_or(true, |g| g > gap_threshold_sec);
        if starts_cluster && index > 0 {
            current += 1;
        }
        ids.push(current);
    }

    ids
}

/// Label each event of an already ordered sequence
///
/// Output length always equals input length.
pub fn classify_ordered(events: &[WatchEvent], config: &ClassificationConfig) -> Vec<VideoType> {
    let ids = cluster_ids(events, config.gap_threshold_sec);
    let cluster_count = ids.last().map_or(0, |last| last + 1);

    let mut sizes = vec![0usize; cluster_count];
    for &id in &ids {
        sizes[id] += 1;
    }

    let labels: Vec<VideoType> = ids
        .iter()
        .map(|&id| {
            if sizes[id] >= RAPID_CLUSTER_MIN_SIZE {
                VideoType::Short
            } else {
                VideoType::Long
            }
        })
        .collect();

    debug!(
        events = events.len(),
        clusters = cluster_count,
        short = labels.iter().filter(|t| **t == VideoType::Short).count(),
        "Classified events"
    );

    labels
}

/// Sort and classify a sequence of watch events
pub fn classify_videos(
    mut events: Vec<WatchEvent>,
    config: &ClassificationConfig,
) -> Vec<ClassifiedEvent> {
    sort_chronologically(&mut events);
    let labels = classify_ordered(&events, config);

    events
        .into_iter()
        .zip(labels)
        .map(|(event, video_type)| ClassifiedEvent { event, video_type })
        .collect()
}

fn seconds_between(earlier: &WatchEvent, later: &WatchEvent) -> f64 {
    (later.timestamp - earlier.timestamp).num_milliseconds() as f64 / 1000.0
}
