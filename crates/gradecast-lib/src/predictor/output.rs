//! Prediction report formatting
//!
//! Converts a [`PredictionOutcome`] into a serializable report shared by the
//! command line and the HTTP service.

use super::orchestrator::{NextSemester, PredictionOutcome};
use crate::error::{FieldError, FieldIssue, ForecastError};
use crate::models::{FieldKind, PredictionResult, PredictionTarget, Track};
use serde::Serialize;

/// Overall status of a report
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ReportStatus {
    /// Graduation CPA was predicted (next semester may still have failed)
    Predicted,
    /// Input failed validation
    Invalid,
    /// Graduation CPA prediction failed
    Failed,
}

/// One reported prediction
#[derive(Debug, Clone, Serialize)]
pub struct PredictionEntry {
    pub label: String,
    pub value: f64,
    /// Two-decimal rendering of `value`
    pub display: String,
    pub group: String,
    pub track: Track,
    pub target: PredictionTarget,
}

impl From<&PredictionResult> for PredictionEntry {
    fn from(result: &PredictionResult) -> Self {
        Self {
            label: result.target.to_string(),
            value: result.value,
            display: result.display_value(),
            group: result.group.clone(),
            track: result.track,
            target: result.target,
        }
    }
}

/// One rejected field
#[derive(Debug, Clone, Serialize)]
pub struct FieldErrorEntry {
    pub semester: u8,
    pub field: FieldKind,
    pub field_id: String,
    pub issue: FieldIssue,
    pub message: String,
}

impl From<&FieldError> for FieldErrorEntry {
    fn from(error: &FieldError) -> Self {
        Self {
            semester: error.semester,
            field: error.kind,
            field_id: error.field_id(),
            issue: error.issue,
            message: error.to_string(),
        }
    }
}

/// One model error
#[derive(Debug, Clone, Serialize)]
pub struct ErrorEntry {
    /// `cumulative` or `next_semester`
    pub step: &'static str,
    pub kind: &'static str,
    pub message: String,
}

impl ErrorEntry {
    fn new(step: &'static str, error: &ForecastError) -> Self {
        Self {
            step,
            kind: error.kind(),
            message: error_chain(error),
        }
    }
}

/// Error message followed by any causes not already part of it
fn error_chain(error: &ForecastError) -> String {
    let mut message = error.to_string();
    let mut source = std::error::Error::source(error);
    while let Some(cause) = source {
        let text = cause.to_string();
        if !message.contains(&text) {
            message.push_str(": ");
            message.push_str(&text);
        }
        source = cause.source();
    }
    message
}

/// Everything a caller shows after a request
#[derive(Debug, Clone, Serialize)]
pub struct PredictionReport {
    pub status: ReportStatus,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub graduation_cpa: Option<PredictionEntry>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub next_semester_gpa: Option<PredictionEntry>,
    /// Set when every semester of the track is completed
    pub next_semester_skipped: bool,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub validation_errors: Vec<FieldErrorEntry>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub errors: Vec<ErrorEntry>,
}

impl PredictionReport {
    pub fn from_outcome(outcome: &PredictionOutcome) -> Self {
        let mut report = Self {
            status: ReportStatus::Predicted,
            graduation_cpa: None,
            next_semester_gpa: None,
            next_semester_skipped: false,
            validation_errors: Vec::new(),
            errors: Vec::new(),
        };

        match outcome {
            PredictionOutcome::Invalid(errors) => {
                report.status = ReportStatus::Invalid;
                report.validation_errors = errors.iter().map(FieldErrorEntry::from).collect();
            }
            PredictionOutcome::Failed(error) => {
                report.status = ReportStatus::Failed;
                report.errors.push(ErrorEntry::new("cumulative", error));
            }
            PredictionOutcome::Predicted {
                cumulative, next, ..
            } => {
                report.graduation_cpa = Some(cumulative.into());
                match next {
                    NextSemester::Skipped => report.next_semester_skipped = true,
                    NextSemester::Predicted(result) => {
                        report.next_semester_gpa = Some(result.into())
                    }
                    NextSemester::Failed(error) => {
                        report.errors.push(ErrorEntry::new("next_semester", error))
                    }
                }
            }
        }

        report
    }

    /// Plain-text rendering, one line per item
    pub fn to_lines(&self) -> Vec<String> {
        let mut lines = Vec::new();
        match self.status {
            ReportStatus::Invalid => {
                lines.push("Input has errors:".to_string());
                lines.extend(self.validation_errors.iter().map(|e| format!("- {}", e.message)));
            }
            ReportStatus::Failed | ReportStatus::Predicted => {
                if let Some(cpa) = &self.graduation_cpa {
                    lines.push(format!("{}: {}", cpa.label, cpa.display));
                }
                if let Some(next) = &self.next_semester_gpa {
                    lines.push(format!("{}: {}", next.label, next.display));
                }
                lines.extend(self.errors.iter().map(|e| format!("Error: {}", e.message)));
            }
        }
        lines
    }
}
