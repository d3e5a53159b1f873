// Prometheus Metrics for the Rewards Gateway
// Tracks: request throughput/latency per route, grants, claw-back rejections, redemptions

use prometheus::{
    Registry, Histogram, HistogramOpts, HistogramVec, IntCounter, IntCounterVec, Opts,
    register_histogram_vec_with_registry, register_histogram_with_registry,
    register_int_counter_vec_with_registry, register_int_counter_with_registry,
    TextEncoder, Encoder,
};
use once_cell::sync::Lazy;
use std::sync::Arc;

pub struct Metrics {
    pub registry: Registry,

    // Request metrics
    pub http_requests_total: IntCounterVec,
    pub http_request_duration_seconds: HistogramVec,

    // Ledger metrics
    pub rewards_added_total: IntCounter,
    pub rewards_rejected_total: IntCounter,
    pub redemptions_total: IntCounter,
    pub redemption_failures_total: IntCounter,
    pub points_redeemed_total: IntCounter,
    pub redemption_payers: Histogram,
}

impl Metrics {
    pub fn new() -> anyhow::Result<Self> {
        let registry = Registry::new();

        let http_requests_total = register_int_counter_vec_with_registry!(
            Opts::new("rewards_http_requests_total", "Total HTTP requests processed"),
            &["route"],
            registry
        )?;

        let http_request_duration_seconds = register_histogram_vec_with_registry!(
            HistogramOpts::new(
                "rewards_http_request_duration_seconds",
                "HTTP request duration in seconds"
            ).buckets(vec![0.0005, 0.001, 0.005, 0.01, 0.05, 0.1, 0.5, 1.0]),
            &["route"],
            registry
        )?;

        let rewards_added_total = register_int_counter_with_registry!(
            Opts::new("rewards_added_total", "Reward records applied (grants and claw-backs)"),
            registry
        )?;

        let rewards_rejected_total = register_int_counter_with_registry!(
            Opts::new("rewards_rejected_total", "Reward records rejected"),
            registry
        )?;

        let redemptions_total = register_int_counter_with_registry!(
            Opts::new("rewards_redemptions_total", "Successful redemptions"),
            registry
        )?;

        let redemption_failures_total = register_int_counter_with_registry!(
            Opts::new("rewards_redemption_failures_total", "Rejected redemptions"),
            registry
        )?;

        let points_redeemed_total = register_int_counter_with_registry!(
            Opts::new("rewards_points_redeemed_total", "Total points redeemed"),
            registry
        )?;

        let redemption_payers = register_histogram_with_registry!(
            HistogramOpts::new(
                "rewards_redemption_payers",
                "Number of payers touched by one redemption"
            ).buckets(vec![1.0, 2.0, 3.0, 5.0, 10.0, 25.0]),
            registry
        )?;

        Ok(Self {
            registry,
            http_requests_total,
            http_request_duration_seconds,
            rewards_added_total,
            rewards_rejected_total,
            redemptions_total,
            redemption_failures_total,
            points_redeemed_total,
            redemption_payers,
        })
    }

    /// Export all metrics in Prometheus text format
    pub fn export(&self) -> anyhow::Result<String> {
        let encoder = TextEncoder::new();
        let metric_families = self.registry.gather();
        let mut buffer = Vec::new();
        encoder.encode(&metric_families, &mut buffer)?;
        Ok(String::from_utf8(buffer)?)
    }

    /// Count a request and its latency against a route label
    pub fn track_request(&self, route: &str, started: std::time::Instant) {
        self.http_requests_total.with_label_values(&[route]).inc();
        self.http_request_duration_seconds
            .with_label_values(&[route])
            .observe(started.elapsed().as_secs_f64());
    }

    /// Record a successful redemption
    pub fn track_redemption(&self, points: i64, payers: usize) {
        self.redemptions_total.inc();
        self.points_redeemed_total.inc_by(points.max(0) as u64);
        self.redemption_payers.observe(payers as f64);
    }
}

// Global metrics instance
pub static METRICS: Lazy<Arc<Metrics>> = Lazy::new(|| {
    Arc::new(Metrics::new().expect("Failed to initialize metrics"))
});

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_export_contains_route_label() {
        let metrics = Metrics::new().unwrap();
        metrics.track_request("/check-balance", std::time::Instant::now());
        metrics.track_redemption(150, 2);

        let text = metrics.export().unwrap();
        assert!(text.contains("rewards_http_requests_total{route=\"/check-balance\"} 1"));
        assert!(text.contains("rewards_points_redeemed_total 150"));
    }
}
