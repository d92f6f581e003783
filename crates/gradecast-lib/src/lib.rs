//! Academic performance forecasting library
//!
//! This crate provides the core functionality for:
//! - Parsing and validating per-semester GPA and credit input
//! - Building model feature vectors
//! - Loading and caching pre-trained model collections
//! - Predicting graduation CPA and next-semester GPA
//! - Health checks and observability

pub mod error;
pub mod form;
pub mod health;
pub mod models;
pub mod observability;
pub mod predictor;

pub use error::{FieldError, FieldIssue, ForecastError, FormError};
pub use form::SemesterForm;
pub use health::{
    ComponentHealth, ComponentStatus, HealthRegistry, HealthResponse, ReadinessResponse,
};
pub use models::*;
pub use observability::{ForecastMetrics, StructuredLogger};
pub use predictor::{ModelRegistry, PredictionOutcome, PredictionReport, PredictionService};
