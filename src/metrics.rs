//! Prometheus-compatible metrics for the calendar server.
//!
//! One [`Metrics`] instance is created per router and shared through the API
//! state; nothing here is process-global.

use prometheus::core::Collector;
use prometheus::{Histogram, HistogramOpts, IntCounter, IntGauge, Registry};
use serde::{Deserialize, Serialize};
use std::time::{Duration, Instant};

/// Latency buckets in seconds, 100µs to 1s.
fn default_latency_buckets() -> Vec<f64> {
    vec![0.0001, 0.0005, 0.001, 0.005, 0.01, 0.05, 0.1, 0.5, 1.0]
}

/// All metrics for the calendar server.
pub struct Metrics {
    /// Prometheus registry for all metrics.
    pub registry: Registry,

    // =========================================================================
    // Counters
    // =========================================================================
    /// Events created.
    pub events_created_total: IntCounter,
    /// Events updated.
    pub events_updated_total: IntCounter,
    /// Events deleted.
    pub events_deleted_total: IntCounter,
    /// Creates rejected as duplicates.
    pub duplicates_rejected_total: IntCounter,
    /// Day/week/month view queries.
    pub queries_total: IntCounter,
    /// Requests answered with an error envelope.
    pub request_errors_total: IntCounter,

    // =========================================================================
    // Gauges
    // =========================================================================
    /// Live events in the store.
    pub events_count: IntGauge,
    /// Uptime in seconds.
    pub uptime_seconds: IntGauge,

    // =========================================================================
    // Histograms (durations in seconds)
    // =========================================================================
    /// Time spent handling each HTTP request, on every route.
    pub request_duration_seconds: Histogram,

    start_time: Instant,
}

fn register<C: Collector + Clone + 'static>(registry: &Registry, metric: C) -> prometheus::Result<C> {
    registry.register(Box::new(metric.clone()))?;
    Ok(metric)
}

impl Metrics {
    /// Create a new metrics instance with all metrics registered.
    pub fn new() -> prometheus::Result<Self> {
        let registry = Registry::new();

        let counter = |name: &str, help: &str| register(&registry, IntCounter::new(name, help)?);
        let events_created_total =
            counter("calendar_events_created_total", "Total number of events created")?;
        let events_updated_total =
            counter("calendar_events_updated_total", "Total number of events updated")?;
        let events_deleted_total =
            counter("calendar_events_deleted_total", "Total number of events deleted")?;
        let duplicates_rejected_total = counter(
            "calendar_duplicates_rejected_total",
            "Total number of creates rejected as duplicates",
        )?;
        let queries_total = counter("calendar_queries_total", "Total number of view queries")?;
        let request_errors_total = counter(
            "calendar_request_errors_total",
            "Total number of requests answered with an error",
        )?;

        let events_count = register(
            &registry,
            IntGauge::new("calendar_events_count", "Current number of stored events")?,
        )?;
        let uptime_seconds = register(
            &registry,
            IntGauge::new("calendar_uptime_seconds", "Server uptime in seconds")?,
        )?;

        let request_duration_seconds = register(
            &registry,
            Histogram::with_opts(
                HistogramOpts::new(
                    "calendar_request_duration_seconds",
                    "HTTP request handling duration in seconds",
                )
                .buckets(default_latency_buckets()),
            )?,
        )?;

        Ok(Self {
            registry,
            events_created_total,
            events_updated_total,
            events_deleted_total,
            duplicates_rejected_total,
            queries_total,
            request_errors_total,
            events_count,
            uptime_seconds,
            request_duration_seconds,
            start_time: Instant::now(),
        })
    }

    pub fn uptime(&self) -> Duration {
        self.start_time.elapsed()
    }

    /// Update the uptime gauge.
    pub fn update_uptime(&self) {
        self.uptime_seconds.set(self.uptime().as_secs() as i64);
    }

    /// Export metrics in Prometheus text format.
    pub fn export_prometheus(&self) -> prometheus::Result<String> {
        use prometheus::Encoder;
        self.update_uptime();

        let encoder = prometheus::TextEncoder::new();
        let mut buffer = Vec::new();
        encoder.encode(&self.registry.gather(), &mut buffer)?;
        Ok(String::from_utf8_lossy(&buffer).into_owned())
    }

    /// Start a timer that records duration to a histogram when dropped.
    pub fn start_timer(histogram: &Histogram) -> HistogramTimer {
        HistogramTimer {
            histogram: histogram.clone(),
            start: Instant::now(),
        }
    }
}

/// Timer that records duration to a histogram when dropped.
pub struct HistogramTimer {
    histogram: Histogram,
    start: Instant,
}

impl Drop for HistogramTimer {
    fn drop(&mut self) {
        self.histogram.observe(self.start.elapsed().as_secs_f64());
    }
}

/// Health status for the server.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HealthStatus {
    pub status: HealthState,
    pub version: String,
    pub uptime_seconds: u64,
    pub events: usize,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}

/// Health state enum.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum HealthState {
    Healthy,
    Unhealthy,
}

impl HealthState {
    /// Convert to HTTP status code.
    pub fn to_status_code(self) -> u16 {
        match self {
            HealthState::Healthy => 200,
            HealthState::Unhealthy => 503,
        }
    }
}
