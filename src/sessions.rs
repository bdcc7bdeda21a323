//! Session aggregation and binge detection
//!
//! A session is a run of events where no gap exceeds the idle threshold. The
//! threshold is independent of the classifier's: it measures "still in front
//! of the screen", not "clicking through shorts".

use crate::config::SessionConfig;
use crate::error::ComputeError;
use crate::types::{EstimatedEvent, Session};
use tracing::debug;

/// Partition events into sessions, in chronological order
///
/// The input is ordered by timestamp first (stable), so the result does not
/// depend on how the caller sorted it.
pub fn detect_sessions(events: &[EstimatedEvent], config: &SessionConfig) -> Vec<Session> {
    let mut ordered: Vec<&EstimatedEvent> = events.iter().collect();
    ordered.sort_by_key(|e| e.timestamp());

    let mut sessions: Vec<Session> = Vec::new();
    let mut previous: Option<&EstimatedEvent> = None;

    for event in ordered {
        let gap_min = previous.map_or(0.0, |prev| {
            (event.timestamp() - prev.timestamp()).num_milliseconds() as f64 / 60_000.0
        });

        match sessions.last_mut() {
            Some(current) if gap_min <= config.idle_gap_min => {
                current.end = current.end.max(event.timestamp());
                current.video_count += 1;
                current.total_hours += event.watch_time_hours;
            }
            _ => sessions.push(Session {
                start: event.timestamp(),
                end: event.timestamp(),
                video_count: 1,
                total_hours: event.watch_time_hours,
            }),
        }
        previous = Some(event);
    }

    debug!(
        events = events.len(),
        sessions = sessions.len(),
        "Detected sessions"
    );
    sessions
}

/// The session with the most estimated watch hours, earliest start on ties
pub fn longest_binge(
    events: &[EstimatedEvent],
    config: &SessionConfig,
) -> Result<Session, ComputeError> {
    let sessions = detect_sessions(events, config);

    let mut best: Option<Session> = None;
    for session in sessions {
        // sessions are chronological, so strict > keeps the earliest on ties
        if best
            .as_ref()
            .map_or(true, |b| session.total_hours > b.total_hours)
        {
            best = Some(session);
        }
    }

    best.ok_or_else(|| ComputeError::NoData("no events to build a binge session from".to_string()))
}
