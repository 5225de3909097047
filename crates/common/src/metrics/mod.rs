//! Metrics and observability utilities
//!
//! Provides Prometheus-style metrics with standardized naming conventions.

use metrics::{counter, describe_counter, describe_gauge, describe_histogram, gauge, histogram, Unit};
use std::time::Instant;

/// Metrics prefix for all ReadForge metrics
pub const METRICS_PREFIX: &str = "readforge";

/// Histogram buckets for engine latency (in seconds)
pub const LATENCY_BUCKETS: &[f64] = &[
    0.001,  // 1ms
    0.005,  // 5ms
    0.010,  // 10ms
    0.025,  // 25ms
    0.050,  // 50ms
    0.100,  // 100ms
    0.250,  // 250ms
    0.500,  // 500ms
    1.000,  // 1s
    2.500,  // 2.5s
    5.000,  // 5s
    10.00,  // 10s
];

/// Register all metric descriptions
pub fn register_metrics() {
    // Request metrics
    describe_counter!(
        format!("{}_requests_total", METRICS_PREFIX),
        Unit::Count,
        "Total number of HTTP requests"
    );

    describe_histogram!(
        format!("{}_request_duration_seconds", METRICS_PREFIX),
        Unit::Seconds,
        "HTTP request latency in seconds"
    );

    // Suggestion metrics
    describe_counter!(
        format!("{}_suggestion_runs_total", METRICS_PREFIX),
        Unit::Count,
        "Total suggestion computations"
    );

    describe_histogram!(
        format!("{}_suggestion_duration_seconds", METRICS_PREFIX),
        Unit::Seconds,
        "Suggestion computation latency in seconds"
    );

    describe_gauge!(
        format!("{}_suggestion_candidates", METRICS_PREFIX),
        Unit::Count,
        "Candidates discovered by the last suggestion run"
    );

    describe_counter!(
        format!("{}_citation_edges_repaired_total", METRICS_PREFIX),
        Unit::Count,
        "Asymmetric citation edges repaired before counting"
    );

    describe_counter!(
        format!("{}_metadata_fetches_total", METRICS_PREFIX),
        Unit::Count,
        "Metadata fetches by outcome"
    );

    // Author metrics
    describe_histogram!(
        format!("{}_author_resolution_duration_seconds", METRICS_PREFIX),
        Unit::Seconds,
        "Author resolution latency in seconds"
    );

    describe_gauge!(
        format!("{}_authors_resolved", METRICS_PREFIX),
        Unit::Count,
        "Authors produced by the last resolution run"
    );

    // Concept metrics
    describe_histogram!(
        format!("{}_concept_duration_seconds", METRICS_PREFIX),
        Unit::Seconds,
        "Concept enumeration latency in seconds"
    );

    describe_gauge!(
        format!("{}_concepts_found", METRICS_PREFIX),
        Unit::Count,
        "Formal concepts produced by the last enumeration"
    );

    tracing::info!("Metrics registered");
}

/// Helper to record request metrics
pub struct RequestMetrics {
    start: Instant,
    endpoint: String,
    method: String,
}

impl RequestMetrics {
    /// Start tracking a request
    pub fn start(method: &str, endpoint: &str) -> Self {
        Self {
            start: Instant::now(),
            endpoint: endpoint.to_string(),
            method: method.to_string(),
        }
    }

    /// Record request completion
    pub fn finish(self, status: u16) {
        let duration = self.start.elapsed().as_secs_f64();

        counter!(
            format!("{}_requests_total", METRICS_PREFIX),
            "method" => self.method.clone(),
            "endpoint" => self.endpoint.clone(),
            "status" => status.to_string()
        )
        .increment(1);

        histogram!(
            format!("{}_request_duration_seconds", METRICS_PREFIX),
            "method" => self.method,
            "endpoint" => self.endpoint
        )
        .record(duration);
    }
}

/// Helper to record a suggestion run
pub fn record_suggestions(duration_secs: f64, candidate_count: usize, failed_fetches: usize) {
    counter!(format!("{}_suggestion_runs_total", METRICS_PREFIX)).increment(1);

    histogram!(format!("{}_suggestion_duration_seconds", METRICS_PREFIX)).record(duration_secs);

    gauge!(format!("{}_suggestion_candidates", METRICS_PREFIX)).set(candidate_count as f64);

    if failed_fetches > 0 {
        tracing::debug!(failed_fetches, "Suggestion run finished with fetch failures");
    }
}

/// Helper to record repaired citation edges
pub fn record_edge_repairs(repaired: usize) {
    if repaired > 0 {
        counter!(format!("{}_citation_edges_repaired_total", METRICS_PREFIX))
            .increment(repaired as u64);
    }
}

/// Helper to record a metadata fetch outcome
pub fn record_fetch(success: bool, background: bool) {
    let status = if success { "success" } else { "error" };
    let batch = if background { "prefetch" } else { "visible" };

    counter!(
        format!("{}_metadata_fetches_total", METRICS_PREFIX),
        "status" => status.to_string(),
        "batch" => batch.to_string()
    )
    .increment(1);
}

/// Helper to record an author resolution run
pub fn record_author_resolution(duration_secs: f64, author_count: usize) {
    histogram!(format!("{}_author_resolution_duration_seconds", METRICS_PREFIX))
        .record(duration_secs);

    gauge!(format!("{}_authors_resolved", METRICS_PREFIX)).set(author_count as f64);
}

/// Helper to record a concept enumeration
pub fn record_concepts(duration_secs: f64, concept_count: usize) {
    histogram!(format!("{}_concept_duration_seconds", METRICS_PREFIX)).record(duration_secs);

    gauge!(format!("{}_concepts_found", METRICS_PREFIX)).set(concept_count as f64);
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_latency_buckets_sorted() {
        let mut prev = 0.0;
        for &bucket in LATENCY_BUCKETS {
            assert!(bucket > prev);
            prev = bucket;
        }
    }

    #[test]
    fn test_recorders_without_exporter() {
        // No recorder installed: calls are no-ops and must not panic
        let metrics = RequestMetrics::start("POST", "/v1/suggestions");
        metrics.finish(200);
        record_suggestions(0.01, 3, 1);
        record_edge_repairs(2);
        record_fetch(false, true);
        record_author_resolution(0.002, 5);
        record_concepts(0.003, 4);
    }
}
