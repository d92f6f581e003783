//! Core data models for academic forecasting

use crate::error::{FieldError, FieldIssue};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Study program track, which decides the model family and semester bound
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Track {
    /// Bachelor program (6 semesters)
    Bachelor,
    /// Engineer program (8 semesters)
    Engineer,
}

impl Track {
    /// Numeric prefix of the model family trained for this track
    pub fn family_prefix(&self) -> &'static str {
        match self {
            Track::Bachelor => "8",
            Track::Engineer => "10",
        }
    }

    /// Highest completed-semester count a student can declare
    pub fn max_semesters(&self) -> u8 {
        match self {
            Track::Bachelor => 6,
            Track::Engineer => 8,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Track::Bachelor => "bachelor",
            Track::Engineer => "engineer",
        }
    }
}

impl fmt::Display for Track {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Track {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "bachelor" | "cu-nhan" => Ok(Track::Bachelor),
            "engineer" | "ky-su" => Ok(Track::Engineer),
            other => Err(format!("unknown track '{}', expected bachelor or engineer", other)),
        }
    }
}

/// Which input of a semester a field holds
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FieldKind {
    Grade,
    Credit,
}

impl FieldKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            FieldKind::Grade => "grade",
            FieldKind::Credit => "credit",
        }
    }
}

impl fmt::Display for FieldKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FieldKind::Grade => f.write_str("GPA"),
            FieldKind::Credit => f.write_str("Credits"),
        }
    }
}

/// Unvalidated text entered for one field of one semester
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RawField {
    /// 1-based semester index
    pub semester: u8,
    pub kind: FieldKind,
    pub text: String,
}

impl RawField {
    pub fn new(semester: u8, kind: FieldKind, text: impl Into<String>) -> Self {
        Self {
            semester,
            kind,
            text: text.into(),
        }
    }

    /// Stable identifier used to point at the input, e.g. `grade_2`
    pub fn field_id(&self) -> String {
        field_id(self.kind, self.semester)
    }

    /// Error pointing at this field
    pub fn reject(&self, issue: FieldIssue) -> FieldError {
        FieldError {
            semester: self.semester,
            kind: self.kind,
            issue,
        }
    }
}

pub(crate) fn field_id(kind: FieldKind, semester: u8) -> String {
    format!("{}_{}", kind.as_str(), semester)
}

/// Validated grade and credit count of one semester
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SemesterRecord {
    pub semester: u8,
    pub grade: f64,
    pub credits: u64,
}

/// Flat model input: grade then credits, in semester order
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FeatureVector(Vec<f64>);

impl FeatureVector {
    pub(crate) fn from_values(values: Vec<f64>) -> Self {
        Self(values)
    }

    pub fn as_slice(&self) -> &[f64] {
        &self.0
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Number of semesters encoded in the vector
    pub fn semesters(&self) -> usize {
        self.0.len() / 2
    }
}

/// What a prediction estimates
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum PredictionTarget {
    /// Cumulative grade-point average at graduation
    GraduationCpa,
    /// Grade-point average of the given upcoming semester
    NextSemesterGpa { semester: u8 },
}

impl fmt::Display for PredictionTarget {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PredictionTarget::GraduationCpa => f.write_str("Graduation CPA"),
            PredictionTarget::NextSemesterGpa { semester } => {
                write!(f, "GPA of semester {}", semester)
            }
        }
    }
}

/// One model output together with the model that produced it
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PredictionResult {
    pub value: f64,
    pub group: String,
    pub track: Track,
    pub target: PredictionTarget,
    pub generated_at: i64,
}

impl PredictionResult {
    /// Value rounded for display, two decimals
    pub fn display_value(&self) -> String {
        format!("{:.2}", self.value)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_track_families() {
        assert_eq!(Track::Bachelor.family_prefix(), "8");
        assert_eq!(Track::Engineer.family_prefix(), "10");
        assert_eq!(Track::Bachelor.max_semesters(), 6);
        assert_eq!(Track::Engineer.max_semesters(), 8);
    }

    #[test]
    fn test_track_from_str() {
        assert_eq!("Bachelor".parse::<Track>(), Ok(Track::Bachelor));
        assert_eq!(" engineer ".parse::<Track>(), Ok(Track::Engineer));
        assert!("doctor".parse::<Track>().is_err());
    }

    #[test]
    fn test_field_id() {
        let field = RawField::new(2, FieldKind::Grade, "3.1");
        assert_eq!(field.field_id(), "grade_2");
        assert_eq!(field_id(FieldKind::Credit, 7), "credit_7");

        let error = field.reject(FieldIssue::OutOfRange);
        assert_eq!(error.field_id(), "grade_2");
        assert_eq!(error.issue, FieldIssue::OutOfRange);
    }

    #[test]
    fn test_display_value_two_decimals() {
        let result = PredictionResult {
            value: 3.14159,
            group: "GPA_TC_1".to_string(),
            track: Track::Bachelor,
            target: PredictionTarget::GraduationCpa,
            generated_at: 0,
        };
        assert_eq!(result.display_value(), "3.14");
    }
}
