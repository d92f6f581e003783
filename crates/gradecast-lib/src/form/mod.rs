//! Semester input form
//!
//! The form is sized from the declared completed-semester count, holds the
//! raw text of every field and validates all of them in one pass.

mod parser;

pub use parser::{parse_credit, parse_grade, ParsedValue, MAX_GRADE, MIN_GRADE};

use crate::error::{FieldError, FormError};
use crate::models::{FieldKind, RawField, SemesterRecord, Track};

/// Raw grade and credit text for every completed semester
#[derive(Debug, Clone)]
pub struct SemesterForm {
    track: Track,
    completed: u8,
    grades: Vec<String>,
    credits: Vec<String>,
}

impl SemesterForm {
    /// Create an empty form for `completed` semesters of `track`
    pub fn new(track: Track, completed: u8) -> Result<Self, FormError> {
        let max = track.max_semesters();
        if completed == 0 || completed > max {
            return Err(FormError::SemesterCountOutOfRange {
                track: track.to_string(),
                max,
                got: completed,
            });
        }

        let slots = completed as usize;
        Ok(Self {
            track,
            completed,
            grades: vec![String::new(); slots],
            credits: vec![String::new(); slots],
        })
    }

    pub fn track(&self) -> Track {
        self.track
    }

    pub fn completed(&self) -> u8 {
        self.completed
    }

    /// Set the raw grade text of a 1-based semester
    pub fn set_grade(&mut self, semester: u8, raw: impl Into<String>) -> Result<(), FormError> {
        let idx = self.slot(semester)?;
        self.grades[idx] = raw.into();
        Ok(())
    }

    /// Set the raw credit text of a 1-based semester
    pub fn set_credit(&mut self, semester: u8, raw: impl Into<String>) -> Result<(), FormError> {
        let idx = self.slot(semester)?;
        self.credits[idx] = raw.into();
        Ok(())
    }

    /// Set both fields of a semester
    pub fn set_semester(
        &mut self,
        semester: u8,
        grade: impl Into<String>,
        credit: impl Into<String>,
    ) -> Result<(), FormError> {
        self.set_grade(semester, grade)?;
        self.set_credit(semester, credit)
    }

    fn slot(&self, semester: u8) -> Result<usize, FormError> {
        if semester == 0 || semester > self.completed {
            return Err(FormError::UnknownSemester {
                semester,
                completed: self.completed,
            });
        }
        Ok((semester - 1) as usize)
    }

    /// All fields in semester order, grade before credit
    pub fn raw_fields(&self) -> Vec<RawField> {
        self.grades
            .iter()
            .zip(&self.credits)
            .zip(1..=self.completed)
            .flat_map(|((grade, credit), semester)| {
                [
                    RawField::new(semester, FieldKind::Grade, grade.clone()),
                    RawField::new(semester, FieldKind::Credit, credit.clone()),
                ]
            })
            .collect()
    }

    /// Parse every field; on any failure return all failures
    pub fn validate(&self) -> Result<Vec<SemesterRecord>, Vec<FieldError>> {
        let mut records = Vec::with_capacity(self.completed as usize);
        let mut errors = Vec::new();

        for pair in self.raw_fields().chunks_exact(2) {
            let (grade_field, credit_field) = (&pair[0], &pair[1]);
            let grade = parse_grade(&grade_field.text).map_err(|issue| grade_field.reject(issue));
            let credits =
                parse_credit(&credit_field.text).map_err(|issue| credit_field.reject(issue));

            match (grade, credits) {
                (Ok(grade), Ok(credits)) => records.push(SemesterRecord {
                    semester: grade_field.semester,
                    grade,
                    credits,
                }),
                (grade, credits) => {
                    errors.extend(grade.err());
                    errors.extend(credits.err());
                }
            }
        }

        if errors.is_empty() {
            Ok(records)
        } else {
            Err(errors)
        }
    }
}
