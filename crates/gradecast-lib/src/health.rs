//! Liveness and readiness state of the prediction service
//!
//! Two components are tracked: the model store (is the model directory
//! there at all) and the predictor (did the last model step succeed).

use crate::predictor::{NextSemester, PredictionOutcome};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::Path;
use std::sync::Arc;
use tokio::sync::RwLock;

/// Component names for health tracking
pub mod components {
    pub const MODEL_STORE: &str = "model_store";
    pub const PREDICTOR: &str = "predictor";
}

/// Health status, ordered from best to worst
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ComponentStatus {
    Healthy,
    /// Still serving, but the last model step failed
    Degraded,
    Unhealthy,
}

impl ComponentStatus {
    /// Healthy or degraded
    pub fn is_operational(&self) -> bool {
        *self != ComponentStatus::Unhealthy
    }
}

/// Last known state of one component
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ComponentHealth {
    pub status: ComponentStatus,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
    /// Unix seconds of the last update
    pub last_check_timestamp: i64,
}

impl ComponentHealth {
    pub fn new(status: ComponentStatus, message: Option<String>) -> Self {
        Self {
            status,
            message,
            last_check_timestamp: chrono::Utc::now().timestamp(),
        }
    }
}

/// Body of `/healthz`
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HealthResponse {
    pub status: ComponentStatus,
    pub components: HashMap<String, ComponentHealth>,
}

/// Body of `/readyz`
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReadinessResponse {
    pub ready: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reason: Option<String>,
}

/// Shared, cloneable view of component health
#[derive(Debug, Clone, Default)]
pub struct HealthRegistry {
    components: Arc<RwLock<HashMap<String, ComponentHealth>>>,
    ready: Arc<RwLock<bool>>,
}

impl HealthRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Start tracking `name` as healthy
    pub async fn register(&self, name: &str) {
        self.set(name, ComponentStatus::Healthy, None).await;
    }

    pub async fn set(&self, name: &str, status: ComponentStatus, message: Option<String>) {
        self.components
            .write()
            .await
            .insert(name.to_string(), ComponentHealth::new(status, message));
    }

    pub async fn set_ready(&self, ready: bool) {
        *self.ready.write().await = ready;
    }

    /// The model store is unhealthy while the model directory is missing
    pub async fn check_model_store(&self, model_dir: &Path) {
        if model_dir.is_dir() {
            self.set(components::MODEL_STORE, ComponentStatus::Healthy, None)
                .await;
        } else {
            let message = format!("Model directory {} does not exist", model_dir.display());
            self.set(components::MODEL_STORE, ComponentStatus::Unhealthy, Some(message))
                .await;
        }
    }

    /// Degrade the predictor after a failed model step, restore it after a clean prediction.
    /// Invalid input says nothing about the models and leaves it unchanged.
    pub async fn record_outcome(&self, outcome: &PredictionOutcome) {
        let step_error = match outcome {
            PredictionOutcome::Invalid(_) => return,
            PredictionOutcome::Failed(e) => Some(e),
            PredictionOutcome::Predicted {
                next: NextSemester::Failed(e),
                ..
            } => Some(e),
            PredictionOutcome::Predicted { .. } => None,
        };

        match step_error {
            Some(e) => {
                self.set(components::PREDICTOR, ComponentStatus::Degraded, Some(e.to_string()))
                    .await
            }
            None => {
                self.set(components::PREDICTOR, ComponentStatus::Healthy, None)
                    .await
            }
        }
    }

    /// Overall status is the worst component status
    pub async fn health(&self) -> HealthResponse {
        let components = self.components.read().await.clone();
        let status = components
            .values()
            .map(|c| c.status)
            .max()
            .unwrap_or(ComponentStatus::Healthy);
        HealthResponse { status, components }
    }

    pub async fn readiness(&self) -> ReadinessResponse {
        let reason = if !*self.ready.read().await {
            Some("Service not yet initialized")
        } else if !self.health().await.status.is_operational() {
            Some("Critical component unhealthy")
        } else {
            None
        };

        ReadinessResponse {
            ready: reason.is_none(),
            reason: reason.map(str::to_string),
        }
    }
}
