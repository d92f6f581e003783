//! Model selection rules
//!
//! Maps a track and completed-semester count to the artifact holding the
//! model family and the group key of the estimator inside it.

use crate::models::{PredictionTarget, Track};
use serde::Serialize;
use std::path::{Path, PathBuf};

/// Artifact file for graduation CPA models of a family
pub fn cumulative_artifact(model_dir: &Path, track: Track) -> PathBuf {
    model_dir.join(format!("final_cpa_{}_ki.json", track.family_prefix()))
}

/// Artifact file for next-semester GPA models of a family
pub fn next_semester_artifact(model_dir: &Path, track: Track) -> PathBuf {
    model_dir.join(format!("next_gpa_{}_ki.json", track.family_prefix()))
}

/// Group of the graduation CPA model trained on semesters 1..=completed
pub fn cumulative_group(completed: u8) -> String {
    if completed > 1 {
        format!("GPA_TC_1_{}", completed)
    } else {
        "GPA_TC_1".to_string()
    }
}

/// Group of the model predicting the semester after `completed`
pub fn next_semester_group(completed: u8) -> String {
    format!("GPA_{}", completed + 1)
}

/// Fully resolved location of one estimator
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ModelKey {
    pub track: Track,
    pub target: PredictionTarget,
    pub artifact: PathBuf,
    pub group: String,
}

impl ModelKey {
    pub fn cumulative(model_dir: &Path, track: Track, completed: u8) -> Self {
        Self {
            track,
            target: PredictionTarget::GraduationCpa,
            artifact: cumulative_artifact(model_dir, track),
            group: cumulative_group(completed),
        }
    }

    /// `None` once the student has completed every semester of the track
    pub fn next_semester(model_dir: &Path, track: Track, completed: u8) -> Option<Self> {
        if completed >= track.max_semesters() {
            return None;
        }
        Some(Self {
            track,
            target: PredictionTarget::NextSemesterGpa {
                semester: completed + 1,
            },
            artifact: next_semester_artifact(model_dir, track),
            group: next_semester_group(completed),
        })
    }
}

/// Both keys a prediction request will use
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ModelPlan {
    pub cumulative: ModelKey,
    pub next_semester: Option<ModelKey>,
}

impl ModelPlan {
    pub fn new(model_dir: &Path, track: Track, completed: u8) -> Self {
        Self {
            cumulative: ModelKey::cumulative(model_dir, track, completed),
            next_semester: ModelKey::next_semester(model_dir, track, completed),
        }
    }
}
