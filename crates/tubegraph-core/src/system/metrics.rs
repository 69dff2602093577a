//! Metrics collection and monitoring for tubegraph
//!
//! Prometheus counters and histograms registered once in a process-wide
//! registry. Use [`Metrics::global`] to record and [`collect_metrics`] to
//! render the exposition format.

use once_cell::sync::Lazy;
use prometheus::{
    register_histogram_with_registry, register_int_counter_with_registry, Histogram, IntCounter, Registry,
};
use std::time::Instant;

/// Global metrics registry
static REGISTRY: Lazy<Registry> = Lazy::new(Registry::new);

/// Relation toggle counters
pub struct RelationMetrics {
    /// Toggles that created an edge
    pub edges_created: IntCounter,
    /// Toggles that removed an edge
    pub edges_removed: IntCounter,
    /// Toggles rejected before reaching the store
    pub toggles_rejected: IntCounter,
}

/// Cascade and reconciliation counters
pub struct CascadeMetrics {
    /// Cascades that removed every dependent
    pub completed: IntCounter,
    /// Cascades that left a reconciliation entry
    pub failed: IntCounter,
    /// Reconciliation entries resolved by a replay
    pub reconciled: IntCounter,
    /// Dependent rows removed by cascades and sweeps
    pub dependents_removed: IntCounter,
}

/// View composer metrics
pub struct ViewMetrics {
    /// Plans executed
    pub queries: IntCounter,
    /// Histogram of plan execution time in seconds
    pub query_duration: Histogram,
}

/// Centralized metrics collection for all system components
pub struct Metrics {
    /// Relation toggle metrics
    pub relations: RelationMetrics,
    /// Cascade metrics
    pub cascade: CascadeMetrics,
    /// View metrics
    pub views: ViewMetrics,
}

impl Metrics {
    /// Create new metrics instance
    fn new() -> prometheus::Result<Self> {
        Ok(Self {
            relations: RelationMetrics::new()?,
            cascade: CascadeMetrics::new()?,
            views: ViewMetrics::new()?,
        })
    }

    /// Get the global metrics instance
    pub fn global() -> &'static Metrics {
        static INSTANCE: Lazy<Metrics> = Lazy::new(|| {
            Metrics::new().expect("Failed to initialize metrics")
        });
        &INSTANCE
    }
}

impl RelationMetrics {
    fn new() -> prometheus::Result<Self> {
        Ok(Self {
            edges_created: register_int_counter_with_registry!(
                "tg_edges_created_total",
                "Total number of toggles that created an edge",
                REGISTRY
            )?,
            edges_removed: register_int_counter_with_registry!(
                "tg_edges_removed_total",
                "Total number of toggles that removed an edge",
                REGISTRY
            )?,
            toggles_rejected: register_int_counter_with_registry!(
                "tg_toggles_rejected_total",
                "Total number of toggles rejected by validation",
                REGISTRY
            )?,
        })
    }
}

impl CascadeMetrics {
    fn new() -> prometheus::Result<Self> {
        Ok(Self {
            completed: register_int_counter_with_registry!(
                "tg_cascades_completed_total",
                "Total number of cascades that removed every dependent",
                REGISTRY
            )?,
            failed: register_int_counter_with_registry!(
                "tg_cascades_failed_total",
                "Total number of cascades recorded for reconciliation",
                REGISTRY
            )?,
            reconciled: register_int_counter_with_registry!(
                "tg_reconciliations_total",
                "Total number of reconciliation entries resolved",
                REGISTRY
            )?,
            dependents_removed: register_int_counter_with_registry!(
                "tg_dependents_removed_total",
                "Total number of dependent rows and edges removed",
                REGISTRY
            )?,
        })
    }
}

impl ViewMetrics {
    fn new() -> prometheus::Result<Self> {
        Ok(Self {
            queries: register_int_counter_with_registry!(
                "tg_view_queries_total",
                "Total number of view plans executed",
                REGISTRY
            )?,
            query_duration: register_histogram_with_registry!(
                "tg_view_query_duration_seconds",
                "Duration of view plan execution in seconds",
                vec![0.0001, 0.0005, 0.001, 0.005, 0.01, 0.05, 0.1, 0.5],
                REGISTRY
            )?,
        })
    }
}

/// Timer for measuring operation duration with automatic histogram recording
pub struct Timer {
    /// Start time of the operation
    start: Instant,
    /// Histogram to record the duration when finished
    histogram: Histogram,
}

impl Timer {
    /// Start a new timer
    pub fn start(histogram: Histogram) -> Self {
        Self {
            start: Instant::now(),
            histogram,
        }
    }

    /// Record the elapsed time and consume the timer
    pub fn finish(self) {
        self.histogram.observe(self.start.elapsed().as_secs_f64());
    }
}

/// Register every metric with the registry
///
/// Call once at startup so that a scrape before the first operation still
/// lists all series.
pub fn init_registry() {
    let _ = Metrics::global();
}

/// Get the Prometheus registry
pub fn registry() -> &'static Registry {
    &REGISTRY
}

/// Collect and return all metrics as a Prometheus-formatted string
pub fn collect_metrics() -> String {
    let encoder = prometheus::TextEncoder::new();
    let metric_families = registry().gather();
    encoder.encode_to_string(&metric_families).unwrap_or_default()
}
