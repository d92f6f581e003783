//! End-to-end prediction flow
//!
//! A request moves through validation, the graduation CPA prediction and,
//! while semesters remain, the next-semester GPA prediction:
//!
//! - any invalid field stops the flow before a model is touched
//! - a failure of the CPA step stops the flow
//! - a failure of the next-semester step is reported next to the CPA result

use super::features::{build_vector, split_records};
use super::keys::{ModelKey, ModelPlan};
use super::registry::ModelRegistry;
use crate::error::{FieldError, ForecastError, Result};
use crate::form::SemesterForm;
use crate::models::{FeatureVector, PredictionResult, Track};
use crate::observability::{ForecastMetrics, StructuredLogger};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Instant;
use tracing::debug;

/// State of the next-semester step after a successful CPA prediction
#[derive(Debug)]
pub enum NextSemester {
    /// Every semester of the track is completed
    Skipped,
    Predicted(PredictionResult),
    Failed(ForecastError),
}

impl NextSemester {
    pub fn result(&self) -> Option<&PredictionResult> {
        match self {
            NextSemester::Predicted(r) => Some(r),
            _ => None,
        }
    }
}

/// Terminal state of a prediction request
#[derive(Debug)]
pub enum PredictionOutcome {
    /// At least one field failed validation; no model was used
    Invalid(Vec<FieldError>),
    /// The graduation CPA step failed
    Failed(ForecastError),
    Predicted {
        features: FeatureVector,
        cumulative: PredictionResult,
        next: NextSemester,
    },
}

impl PredictionOutcome {
    pub fn is_predicted(&self) -> bool {
        matches!(self, PredictionOutcome::Predicted { .. })
    }
}

/// Runs validated forms through the model registry
pub struct PredictionService {
    registry: Arc<ModelRegistry>,
    model_dir: PathBuf,
    metrics: ForecastMetrics,
    logger: StructuredLogger,
}

impl PredictionService {
    pub fn new(registry: Arc<ModelRegistry>, model_dir: impl Into<PathBuf>) -> Self {
        Self {
            registry,
            model_dir: model_dir.into(),
            metrics: ForecastMetrics::new(),
            logger: StructuredLogger::new("local"),
        }
    }

    /// Tag structured log events with an instance name
    pub fn with_logger(mut self, logger: StructuredLogger) -> Self {
        self.logger = logger;
        self
    }

    pub fn registry(&self) -> &Arc<ModelRegistry> {
        &self.registry
    }

    pub fn model_dir(&self) -> &Path {
        &self.model_dir
    }

    /// Keys a request for `track` and `completed` semesters would use
    pub fn plan(&self, track: Track, completed: u8) -> ModelPlan {
        ModelPlan::new(&self.model_dir, track, completed)
    }

    /// Validate the form and run both predictions
    pub fn predict(&self, form: &SemesterForm) -> PredictionOutcome {
        let start = Instant::now();
        let outcome = self.run(form);
        self.metrics
            .observe_prediction_latency(start.elapsed().as_secs_f64());
        outcome
    }

    fn run(&self, form: &SemesterForm) -> PredictionOutcome {
        let track = form.track();
        let completed = form.completed();
        debug!(track = %track, completed, "Validating form");

        let records = match form.validate() {
            Ok(records) => records,
            Err(errors) => {
                self.metrics.inc_validation_failures();
                self.logger.log_validation_failed(track, completed, &errors);
                return PredictionOutcome::Invalid(errors);
            }
        };

        let plan = self.plan(track, completed);

        let (grades, credits) = split_records(&records);
        let cumulative = build_vector(&grades, &credits)
            .map_err(|e| ForecastError::PredictionFailure {
                group: plan.cumulative.group.clone(),
                source: e.into(),
            })
            .and_then(|features| {
                let result = self.run_step(&plan.cumulative, &features)?;
                Ok((features, result))
            });

        let (features, cumulative) = match cumulative {
            Ok(built) => built,
            Err(e) => {
                self.metrics.inc_prediction_errors("cumulative");
                self.logger.log_prediction_failed(&plan.cumulative, &e);
                return PredictionOutcome::Failed(e);
            }
        };

        let next = match plan.next_semester {
            None => {
                debug!(track = %track, completed, "All semesters completed, skipping next-semester prediction");
                NextSemester::Skipped
            }
            Some(key) => match self.run_step(&key, &features) {
                Ok(result) => NextSemester::Predicted(result),
                Err(e) => {
                    self.metrics.inc_prediction_errors("next_semester");
                    self.logger.log_prediction_failed(&key, &e);
                    NextSemester::Failed(e)
                }
            },
        };

        PredictionOutcome::Predicted {
            features,
            cumulative,
            next,
        }
    }

    /// Load, resolve and invoke the estimator behind `key`
    fn run_step(&self, key: &ModelKey, features: &FeatureVector) -> Result<PredictionResult> {
        let collection = self.registry.load_collection(&key.artifact)?;
        let estimator = self.registry.resolve(&collection, &key.group)?;

        let value = estimator
            .predict(features)
            .map_err(|source| ForecastError::PredictionFailure {
                group: key.group.clone(),
                source,
            })?;

        let result = PredictionResult {
            value,
            group: key.group.clone(),
            track: key.track,
            target: key.target,
            generated_at: chrono::Utc::now().timestamp(),
        };

        self.metrics.inc_predictions_generated();
        self.logger.log_prediction(&result);
        Ok(result)
    }
}
