//! Prometheus wiring for the engine's metrics hooks.
use std::sync::Arc;
use std::time::Duration;

use matchmaker::{set_matchmaker_metrics, MatchAlgorithm, MatchmakerMetrics};
use metrics_exporter_prometheus::{PrometheusBuilder, PrometheusHandle};
use once_cell::sync::OnceCell;

static PROMETHEUS: OnceCell<PrometheusHandle> = OnceCell::new();

/// Forwards engine observations to the `metrics` facade.
#[derive(Debug, Default, Clone, Copy)]
pub struct PrometheusMetrics;

impl MatchmakerMetrics for PrometheusMetrics {
    fn record_enter(&self, outcome: &str, latency: Duration) {
        metrics::counter!("chatnight_enter_total", "outcome" => outcome.to_string()).increment(1);
        metrics::histogram!("chatnight_enter_seconds").record(latency.as_secs_f64());
    }

    fn record_match(&self, algorithm: MatchAlgorithm, score: u32) {
        metrics::counter!("chatnight_matches_total", "algorithm" => algorithm.as_str())
            .increment(1);
        metrics::histogram!("chatnight_match_score").record(f64::from(score));
    }

    fn record_engage(&self, unlocked: bool) {
        metrics::counter!("chatnight_engage_total").increment(1);
        if unlocked {
            metrics::counter!("chatnight_unlocked_total").increment(1);
        }
    }
}

/// Install the process-wide Prometheus recorder once and hook the engine
/// into it. Returns `None` if another recorder is already installed.
pub fn install() -> Option<PrometheusHandle> {
    let handle = PROMETHEUS
        .get_or_try_init(|| PrometheusBuilder::new().install_recorder())
        .map_err(|err| tracing::warn!(error = %err, "prometheus recorder not installed"))
        .ok()?
        .clone();
    set_matchmaker_metrics(Some(Arc::new(PrometheusMetrics)));
    Some(handle)
}

/// Count a finished HTTP request.
pub fn record_http(route: &str, status: u16, latency: Duration) {
    metrics::counter!(
        "chatnight_http_requests_total",
        "route" => route.to_string(),
        "status" => status.to_string()
    )
    .increment(1);
    metrics::histogram!("chatnight_http_request_seconds", "route" => route.to_string())
        .record(latency.as_secs_f64());
}
