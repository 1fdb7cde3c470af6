// Metrics hooks for the `matchmaker` crate.
//
// Callers install a global `MatchmakerMetrics` implementation via
// [`set_matchmaker_metrics`]; every `ChatNight` engine then reports enter
// outcomes, matches and engagements to it. The crate itself stays free of any
// metrics backend.
use std::sync::{Arc, RwLock};
use std::time::Duration;

use once_cell::sync::OnceCell;

use crate::matching::MatchAlgorithm;

/// Metrics observer for Chat Night operations.
pub trait MatchmakerMetrics: Send + Sync {
    /// `outcome` is `active_room`, `queued`, `match_found`, or the error code
    /// of a rejected request.
    fn record_enter(&self, outcome: &str, latency: Duration);

    /// A room was created.
    fn record_match(&self, algorithm: MatchAlgorithm, score: u32);

    /// An engagement was recorded; `unlocked` is true for the one that
    /// completed the pair.
    fn record_engage(&self, unlocked: bool);
}

fn metrics_lock() -> &'static RwLock<Option<Arc<dyn MatchmakerMetrics>>> {
    static METRICS: OnceCell<RwLock<Option<Arc<dyn MatchmakerMetrics>>>> = OnceCell::new();
    METRICS.get_or_init(|| RwLock::new(None))
}

pub(crate) fn metrics_recorder() -> Option<Arc<dyn MatchmakerMetrics>> {
    let guard = metrics_lock()
        .read()
        .unwrap_or_else(|poisoned| poisoned.into_inner());
    guard.clone()
}

/// Install or clear the global recorder. Usually called once at startup.
pub fn set_matchmaker_metrics(recorder: Option<Arc<dyn MatchmakerMetrics>>) {
    let mut guard = metrics_lock()
        .write()
        .unwrap_or_else(|poisoned| poisoned.into_inner());
    *guard = recorder;
}
