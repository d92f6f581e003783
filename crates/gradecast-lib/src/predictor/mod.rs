//! Prediction engine

mod features;
mod inference;
mod keys;
mod orchestrator;
mod output;
mod registry;

pub use features::{build_vector, split_records, VectorError};
pub use inference::{LinearEstimator, OnnxEstimator};
pub use keys::{
    cumulative_artifact, cumulative_group, next_semester_artifact, next_semester_group, ModelKey,
    ModelPlan,
};
pub use orchestrator::{NextSemester, PredictionOutcome, PredictionService};
pub use output::{ErrorEntry, FieldErrorEntry, PredictionEntry, PredictionReport, ReportStatus};
pub use registry::{
    ArtifactStore, FsArtifactStore, MemoryArtifactStore, ModelCollection, ModelRegistry,
    RegistryStats,
};

use crate::models::FeatureVector;
use anyhow::Result;

/// A fitted model taking one feature row and returning one value
pub trait Estimator: Send + Sync {
    /// Predict from a single row of `input_len()` features
    fn predict(&self, features: &FeatureVector) -> Result<f64>;

    /// Number of features the model was trained on
    fn input_len(&self) -> usize;

    /// Short name of the implementation, for logs and listings
    fn kind(&self) -> &'static str;
}
