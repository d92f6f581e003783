//! Feature vector assembly
//!
//! Models are trained on a flat row `[gpa_1, credits_1, gpa_2, credits_2, ...]`,
//! so grades and credits are interleaved in semester order.

use crate::models::{FeatureVector, SemesterRecord};
use thiserror::Error;

/// Grades and credits were not paired one to one
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("Got {grades} grades but {credits} credit counts")]
pub struct VectorError {
    pub grades: usize,
    pub credits: usize,
}

/// Interleave grades and credits into a model input row
pub fn build_vector(grades: &[f64], credits: &[f64]) -> Result<FeatureVector, VectorError> {
    if grades.len() != credits.len() {
        return Err(VectorError {
            grades: grades.len(),
            credits: credits.len(),
        });
    }

    let values = grades
        .iter()
        .zip(credits)
        .flat_map(|(&grade, &credit)| [grade, credit])
        .collect();

    Ok(FeatureVector::from_values(values))
}

/// Grades and credit counts of validated records, in semester order
pub fn split_records(records: &[SemesterRecord]) -> (Vec<f64>, Vec<f64>) {
    records
        .iter()
        .map(|r| (r.grade, r.credits as f64))
        .unzip()
}
