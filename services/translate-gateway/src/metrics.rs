//! Prometheus metrics exposition
//!
//! The translator and token cache crates emit through the `metrics` facade:
//!
//! - `mstranslate_translations_total` (counter): label `outcome`
//! - `mstranslate_translation_duration_seconds` (histogram)
//! - `mstranslate_token_refreshes_total` (counter): label `outcome`
//!
//! The gateway adds `gateway_requests_total` (counter): labels `route`, `status`.

use metrics_exporter_prometheus::{BuildError, Matcher, PrometheusBuilder, PrometheusHandle};

const DURATION_METRIC: &str = "mstranslate_translation_duration_seconds";

/// Bucket boundaries from 10ms up to the longest sensible client timeout.
const DURATION_BUCKETS: &[f64] = &[
    0.01, 0.025, 0.05, 0.1, 0.25, 0.5, 1.0, 2.5, 5.0, 10.0, 30.0, 60.0,
];

fn builder() -> Result<PrometheusBuilder, BuildError> {
    PrometheusBuilder::new()
        .set_buckets_for_metric(Matcher::Full(DURATION_METRIC.to_string()), DURATION_BUCKETS)
}

/// Install the global Prometheus recorder and return a handle for `/metrics`.
pub fn install_recorder() -> Result<PrometheusHandle, BuildError> {
    builder()?.install_recorder()
}

/// Record a handled gateway request.
pub fn record_request(route: &'static str, status: u16) {
    metrics::counter!("gateway_requests_total", "route" => route, "status" => status.to_string())
        .increment(1);
}
