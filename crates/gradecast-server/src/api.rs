//! HTTP API for predictions, health checks and Prometheus metrics

use axum::{
    extract::State,
    http::StatusCode,
    response::IntoResponse,
    routing::{get, post},
    Json, Router,
};
use gradecast_lib::{
    health::{ComponentStatus, HealthRegistry},
    predictor::ReportStatus,
    FormError, PredictionReport, PredictionService, SemesterForm, Track,
};
use prometheus::{Encoder, TextEncoder};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::{error, info};

/// Shared application state
#[derive(Clone)]
pub struct AppState {
    pub health_registry: HealthRegistry,
    pub service: Arc<PredictionService>,
}

impl AppState {
    pub fn new(health_registry: HealthRegistry, service: Arc<PredictionService>) -> Self {
        Self {
            health_registry,
            service,
        }
    }
}

/// Raw text of one semester as typed by the student
#[derive(Debug, Clone, Default, Deserialize)]
pub struct SemesterInput {
    #[serde(default)]
    pub grade: String,
    #[serde(default)]
    pub credit: String,
}

/// Body of `POST /api/v1/predict`
#[derive(Debug, Clone, Deserialize)]
pub struct PredictRequest {
    pub track: Track,
    pub completed_semesters: u8,
    #[serde(default)]
    pub semesters: Vec<SemesterInput>,
}

impl PredictRequest {
    /// Size the form from the declared count and fill it in semester order
    pub fn to_form(&self) -> Result<SemesterForm, FormError> {
        let mut form = SemesterForm::new(self.track, self.completed_semesters)?;
        for (idx, input) in self.semesters.iter().enumerate() {
            let semester = u8::try_from(idx + 1).unwrap_or(u8::MAX);
            form.set_semester(semester, input.grade.as_str(), input.credit.as_str())?;
        }
        Ok(form)
    }
}

#[derive(Debug, Serialize)]
struct ErrorBody {
    error: String,
}

/// Run a prediction - 200 when the CPA was predicted, 422 on invalid input, 500 on model errors
async fn predict(
    State(state): State<Arc<AppState>>,
    Json(request): Json<PredictRequest>,
) -> impl IntoResponse {
    let form = match request.to_form() {
        Ok(form) => form,
        Err(e) => {
            let body = serde_json::json!(ErrorBody { error: e.to_string() });
            return (StatusCode::BAD_REQUEST, Json(body));
        }
    };

    // The first request for a model family reads its artifact from storage
    let service = Arc::clone(&state.service);
    let outcome = match tokio::task::spawn_blocking(move || service.predict(&form)).await {
        Ok(outcome) => outcome,
        Err(e) => {
            error!(error = %e, "Prediction task failed");
            let body = serde_json::json!(ErrorBody {
                error: "Prediction task failed".to_string()
            });
            return (StatusCode::INTERNAL_SERVER_ERROR, Json(body));
        }
    };

    state.health_registry.record_outcome(&outcome).await;

    let report = PredictionReport::from_outcome(&outcome);
    let status_code = match report.status {
        ReportStatus::Predicted => StatusCode::OK,
        ReportStatus::Invalid => StatusCode::UNPROCESSABLE_ENTITY,
        ReportStatus::Failed => StatusCode::INTERNAL_SERVER_ERROR,
    };

    (status_code, Json(serde_json::json!(report)))
}

/// Health check response - returns 200 if healthy, 503 if unhealthy
async fn healthz(State(state): State<Arc<AppState>>) -> impl IntoResponse {
    let health = state.health_registry.health().await;

    let status_code = match health.status {
        ComponentStatus::Healthy => StatusCode::OK,
        ComponentStatus::Degraded => StatusCode::OK, // Still operational
        ComponentStatus::Unhealthy => StatusCode::SERVICE_UNAVAILABLE,
    };

    (status_code, Json(health))
}

/// Readiness check response - returns 200 if ready, 503 if not ready
async fn readyz(State(state): State<Arc<AppState>>) -> impl IntoResponse {
    let readiness = state.health_registry.readiness().await;

    let status_code = if readiness.ready {
        StatusCode::OK
    } else {
        StatusCode::SERVICE_UNAVAILABLE
    };

    (status_code, Json(readiness))
}

/// Prometheus metrics endpoint
async fn metrics() -> impl IntoResponse {
    let encoder = TextEncoder::new();
    let metric_families = prometheus::gather();
    let mut buffer = Vec::new();

    if let Err(e) = encoder.encode(&metric_families, &mut buffer) {
        error!(error = %e, "Failed to encode metrics");
        return (
            StatusCode::INTERNAL_SERVER_ERROR,
            [("content-type", "text/plain; charset=utf-8")],
            Vec::new(),
        );
    }

    (
        StatusCode::OK,
        [("content-type", "text/plain; charset=utf-8")],
        buffer,
    )
}

/// Create the API router
pub fn create_router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/api/v1/predict", post(predict))
        .route("/healthz", get(healthz))
        .route("/readyz", get(readyz))
        .route("/metrics", get(metrics))
        .with_state(state)
}

/// Start the API server
pub async fn serve(port: u16, state: Arc<AppState>) -> anyhow::Result<()> {
    let app = create_router(state);

    let addr = format!("0.0.0.0:{}", port);
    info!(addr = %addr, "Starting API server");

    let listener = tokio::net::TcpListener::bind(&addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
