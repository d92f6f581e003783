//! Error taxonomy for the prediction pipeline

use crate::models::{field_id, FieldKind};
use serde::Serialize;
use std::path::PathBuf;
use thiserror::Error;

/// Result alias used by the registry and estimators
pub type Result<T> = std::result::Result<T, ForecastError>;

/// Why a single field was rejected
#[derive(Error, Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum FieldIssue {
    #[error("not entered")]
    NotEntered,

    #[error("not a valid number")]
    NotANumber,

    #[error("out of range, must be between 0.00 and 4.00")]
    OutOfRange,

    #[error("not a valid integer")]
    NotAnInteger,

    #[error("must be non-negative")]
    Negative,
}

/// A field validation failure tagged with its location in the form
#[derive(Error, Debug, Clone, PartialEq, Eq, Serialize)]
#[error("Semester {semester}: {kind}: {issue}")]
pub struct FieldError {
    pub semester: u8,
    pub kind: FieldKind,
    pub issue: FieldIssue,
}

impl FieldError {
    pub fn field_id(&self) -> String {
        field_id(self.kind, self.semester)
    }
}

/// Failures while resolving or invoking a model
#[derive(Error, Debug)]
pub enum ForecastError {
    /// Model artifact does not exist in the store
    #[error("Model artifact not found: {}", path.display())]
    ArtifactNotFound { path: PathBuf },

    /// Model artifact exists but could not be decoded
    #[error("Model artifact {} is unreadable: {reason}", path.display())]
    ArtifactCorrupt { path: PathBuf, reason: String },

    /// Collection loaded, but it holds no estimator for the group
    #[error("Model group '{group}' not found in {}", path.display())]
    UnknownModelGroup { group: String, path: PathBuf },

    /// Estimator failed while predicting
    #[error("Prediction with model '{group}' failed: {source}")]
    PredictionFailure {
        group: String,
        #[source]
        source: anyhow::Error,
    },
}

impl ForecastError {
    /// Short machine-readable name of the error kind
    pub fn kind(&self) -> &'static str {
        match self {
            ForecastError::ArtifactNotFound { .. } => "artifact_not_found",
            ForecastError::ArtifactCorrupt { .. } => "artifact_corrupt",
            ForecastError::UnknownModelGroup { .. } => "unknown_model_group",
            ForecastError::PredictionFailure { .. } => "prediction_failure",
        }
    }

    pub(crate) fn corrupt(path: impl Into<PathBuf>, reason: impl ToString) -> Self {
        ForecastError::ArtifactCorrupt {
            path: path.into(),
            reason: reason.to_string(),
        }
    }
}

/// Misuse of the semester form
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum FormError {
    #[error("Completed semesters must be between 1 and {max} for the {track} track, got {got}")]
    SemesterCountOutOfRange { track: String, max: u8, got: u8 },

    #[error("Semester {semester} is outside the declared 1..={completed}")]
    UnknownSemester { semester: u8, completed: u8 },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_field_error_message() {
        let error = FieldError {
            semester: 2,
            kind: FieldKind::Grade,
            issue: FieldIssue::NotEntered,
        };
        assert_eq!(error.to_string(), "Semester 2: GPA: not entered");
        assert_eq!(error.field_id(), "grade_2");
    }

    #[test]
    fn test_error_kinds() {
        let missing = ForecastError::ArtifactNotFound {
            path: PathBuf::from("models/final_cpa_8_ki.json"),
        };
        assert_eq!(missing.kind(), "artifact_not_found");
        assert_eq!(
            missing.to_string(),
            "Model artifact not found: models/final_cpa_8_ki.json"
        );

        let unknown = ForecastError::UnknownModelGroup {
            group: "GPA_7".to_string(),
            path: PathBuf::from("next.json"),
        };
        assert_eq!(unknown.kind(), "unknown_model_group");
    }

    #[test]
    fn test_prediction_failure_keeps_cause() {
        let error = ForecastError::PredictionFailure {
            group: "GPA_TC_1".to_string(),
            source: anyhow::anyhow!("expected 2 features, got 4"),
        };
        assert!(error.to_string().contains("expected 2 features, got 4"));
        assert!(std::error::Error::source(&error).is_some());
    }
}
