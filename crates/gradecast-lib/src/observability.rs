//! Observability infrastructure
//!
//! Provides:
//! - Prometheus metrics (prediction latency, outcomes, artifact cache activity)
//! - Structured JSON logging with tracing

use crate::error::{FieldError, ForecastError};
use crate::models::{PredictionResult, Track};
use crate::predictor::ModelKey;
use prometheus::{
    register_histogram, register_int_counter, register_int_counter_vec, Histogram, IntCounter,
    IntCounterVec,
};
use std::sync::OnceLock;
use tracing::{info, warn};

/// Default histogram buckets for latency measurements (in seconds)
const LATENCY_BUCKETS: &[f64] = &[
    0.0001, 0.0005, 0.001, 0.0025, 0.005, 0.01, 0.025, 0.05, 0.1, 0.25, 0.5, 1.0,
];

/// Global metrics instance (registered once)
static GLOBAL_METRICS: OnceLock<ForecastMetricsInner> = OnceLock::new();

struct ForecastMetricsInner {
    prediction_latency_seconds: Histogram,
    predictions_generated: IntCounter,
    validation_failures: IntCounter,
    prediction_errors: IntCounterVec,
    artifact_loads: IntCounter,
    cache_hits: IntCounter,
}

impl ForecastMetricsInner {
    fn new() -> Self {
        Self {
            prediction_latency_seconds: register_histogram!(
                "gradecast_prediction_latency_seconds",
                "Time spent handling a prediction request, validation included",
                LATENCY_BUCKETS.to_vec()
            )
            .expect("Failed to register prediction_latency_seconds"),

            predictions_generated: register_int_counter!(
                "gradecast_predictions_generated_total",
                "Total number of model predictions produced"
            )
            .expect("Failed to register predictions_generated"),

            validation_failures: register_int_counter!(
                "gradecast_validation_failures_total",
                "Total number of requests rejected by field validation"
            )
            .expect("Failed to register validation_failures"),

            prediction_errors: register_int_counter_vec!(
                "gradecast_prediction_errors_total",
                "Total number of failed prediction steps",
                &["step"]
            )
            .expect("Failed to register prediction_errors"),

            artifact_loads: register_int_counter!(
                "gradecast_artifact_loads_total",
                "Total number of model artifact reads from storage"
            )
            .expect("Failed to register artifact_loads"),

            cache_hits: register_int_counter!(
                "gradecast_artifact_cache_hits_total",
                "Total number of model collections served from cache"
            )
            .expect("Failed to register cache_hits"),
        }
    }
}

/// Handle to the process-wide Prometheus metrics
///
/// Multiple clones share the same underlying metrics.
#[derive(Clone, Debug)]
pub struct ForecastMetrics {
    _private: (),
}

impl Default for ForecastMetrics {
    fn default() -> Self {
        Self::new()
    }
}

impl ForecastMetrics {
    /// Create a new metrics handle (initializes global metrics if needed)
    pub fn new() -> Self {
        GLOBAL_METRICS.get_or_init(ForecastMetricsInner::new);
        Self { _private: () }
    }

    fn inner(&self) -> &ForecastMetricsInner {
        GLOBAL_METRICS.get_or_init(ForecastMetricsInner::new)
    }

    pub fn observe_prediction_latency(&self, duration_secs: f64) {
        self.inner().prediction_latency_seconds.observe(duration_secs);
    }

    pub fn inc_predictions_generated(&self) {
        self.inner().predictions_generated.inc();
    }

    pub fn inc_validation_failures(&self) {
        self.inner().validation_failures.inc();
    }

    /// `step` is `cumulative` or `next_semester`
    pub fn inc_prediction_errors(&self, step: &str) {
        self.inner().prediction_errors.with_label_values(&[step]).inc();
    }

    pub fn inc_artifact_loads(&self) {
        self.inner().artifact_loads.inc();
    }

    pub fn inc_cache_hits(&self) {
        self.inner().cache_hits.inc();
    }
}

/// Structured logger for prediction events
///
/// Provides consistent JSON-formatted records for predictions, rejected
/// input and service lifecycle.
#[derive(Clone, Debug)]
pub struct StructuredLogger {
    instance: String,
}

impl StructuredLogger {
    pub fn new(instance: impl Into<String>) -> Self {
        Self {
            instance: instance.into(),
        }
    }

    /// Log a prediction produced by a model
    pub fn log_prediction(&self, result: &PredictionResult) {
        info!(
            event = "prediction_generated",
            instance = %self.instance,
            track = %result.track,
            target = %result.target,
            group = %result.group,
            value = result.value,
            "Generated prediction"
        );
    }

    /// Log a request rejected by validation
    pub fn log_validation_failed(&self, track: Track, completed: u8, errors: &[FieldError]) {
        let fields: Vec<String> = errors.iter().map(FieldError::field_id).collect();
        info!(
            event = "validation_failed",
            instance = %self.instance,
            track = %track,
            completed_semesters = completed,
            error_count = errors.len(),
            fields = ?fields,
            "Input rejected"
        );
    }

    /// Log a failed prediction step
    pub fn log_prediction_failed(&self, key: &ModelKey, error: &ForecastError) {
        warn!(
            event = "prediction_failed",
            instance = %self.instance,
            track = %key.track,
            target = %key.target,
            group = %key.group,
            artifact = %key.artifact.display(),
            kind = error.kind(),
            error = %error,
            "Prediction step failed"
        );
    }

    /// Log service startup
    pub fn log_startup(&self, version: &str, model_dir: &str) {
        info!(
            event = "service_started",
            instance = %self.instance,
            version = %version,
            model_dir = %model_dir,
            "Gradecast service started"
        );
    }

    /// Log service shutdown
    pub fn log_shutdown(&self, reason: &str) {
        info!(
            event = "service_shutdown",
            instance = %self.instance,
            reason = %reason,
            "Gradecast service shutting down"
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_metrics_creation() {
        let metrics = ForecastMetrics::new();

        metrics.observe_prediction_latency(0.002);
        metrics.inc_predictions_generated();
        metrics.inc_validation_failures();
        metrics.inc_prediction_errors("cumulative");
        metrics.inc_artifact_loads();
        metrics.inc_cache_hits();

        let families = prometheus::gather();
        assert!(families
            .iter()
            .any(|f| f.get_name() == "gradecast_prediction_errors_total"));
    }

    #[test]
    fn test_structured_logger_creation() {
        let logger = StructuredLogger::new("test-instance");
        assert_eq!(logger.instance, "test-instance");
    }
}
