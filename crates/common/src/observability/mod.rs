//! Tracing and metrics utilities
//!
//! Provides subscriber initialization for binaries/examples and
//! metrics helpers with standardized naming conventions.

use crate::config::ObservabilityConfig;
use metrics::{counter, describe_counter, describe_histogram, histogram, Unit};
use tracing_subscriber::EnvFilter;

/// Metrics prefix for all CogRAG metrics
pub const METRICS_PREFIX: &str = "cograg";

/// Initialize the global tracing subscriber.
///
/// Honors `RUST_LOG` when set, otherwise falls back to the configured level.
/// Safe to call once per process; tests should not call this.
pub fn init_tracing(config: &ObservabilityConfig) {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(config.log_level.clone()));

    let builder = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(true);

    if config.json_logging {
        builder.json().init();
    } else {
        builder.init();
    }

    tracing::info!(
        service = %config.service_name,
        version = crate::VERSION,
        "tracing initialized"
    );
}

/// Register all metric descriptions
pub fn register_metrics() {
    describe_counter!(
        format!("{}_sessions_total", METRICS_PREFIX),
        Unit::Count,
        "Total reasoning sessions, labeled by termination reason"
    );

    describe_histogram!(
        format!("{}_session_hops", METRICS_PREFIX),
        Unit::Count,
        "Hops executed per reasoning session"
    );

    describe_histogram!(
        format!("{}_session_duration_seconds", METRICS_PREFIX),
        Unit::Seconds,
        "Wall-clock duration of a reasoning session"
    );

    describe_counter!(
        format!("{}_collaborator_errors_total", METRICS_PREFIX),
        Unit::Count,
        "External collaborator failures, labeled by collaborator and error kind"
    );

    tracing::info!("Metrics registered");
}

/// Record the outcome of one reasoning session
pub fn record_session(reason: &str, hop_count: usize, duration_secs: f64) {
    counter!(
        format!("{}_sessions_total", METRICS_PREFIX),
        "reason" => reason.to_string()
    )
    .increment(1);

    histogram!(format!("{}_session_hops", METRICS_PREFIX)).record(hop_count as f64);

    histogram!(format!("{}_session_duration_seconds", METRICS_PREFIX)).record(duration_secs);
}

/// Record an external collaborator failure
pub fn record_collaborator_error(collaborator: &str, kind: &str) {
    counter!(
        format!("{}_collaborator_errors_total", METRICS_PREFIX),
        "collaborator" => collaborator.to_string(),
        "kind" => kind.to_string()
    )
    .increment(1);
}
