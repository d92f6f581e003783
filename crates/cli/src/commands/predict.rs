//! Prediction commands

use anyhow::Result;
use gradecast_lib::{
    predictor::ReportStatus, PredictionReport, PredictionService, SemesterForm, Track,
};
use serde::Serialize;
use tabled::Tabled;

use crate::output::{print_report, print_table, OutputFormat};

/// Fill a form sized by `semesters`, consuming values in semester order
pub fn build_form(
    track: Track,
    semesters: u8,
    grades: &[String],
    credits: &[String],
) -> Result<SemesterForm> {
    let mut form = SemesterForm::new(track, semesters)?;

    for (idx, grade) in grades.iter().enumerate() {
        form.set_grade(semester_index(idx), grade.as_str())?;
    }
    for (idx, credit) in credits.iter().enumerate() {
        form.set_credit(semester_index(idx), credit.as_str())?;
    }

    Ok(form)
}

fn semester_index(idx: usize) -> u8 {
    u8::try_from(idx + 1).unwrap_or(u8::MAX)
}

/// Run both predictions; returns false when no graduation CPA was produced
pub fn predict(
    service: &PredictionService,
    track: Track,
    semesters: u8,
    grades: &[String],
    credits: &[String],
    format: OutputFormat,
) -> Result<bool> {
    let form = build_form(track, semesters, grades, credits)?;
    let outcome = service.predict(&form);
    let report = PredictionReport::from_outcome(&outcome);

    print_report(&report, format);

    Ok(report.status == ReportStatus::Predicted)
}

/// Row for the plan table
#[derive(Tabled, Serialize)]
struct PlanRow {
    #[tabled(rename = "Target")]
    target: String,
    #[tabled(rename = "Model")]
    group: String,
    #[tabled(rename = "Artifact")]
    artifact: String,
    #[tabled(rename = "Present")]
    present: bool,
}

/// Show the model keys a prediction would use, without loading anything
pub fn plan(
    service: &PredictionService,
    track: Track,
    semesters: u8,
    format: OutputFormat,
) -> Result<()> {
    // Same bound a prediction enforces
    SemesterForm::new(track, semesters)?;

    let plan = service.plan(track, semesters);
    let rows: Vec<PlanRow> = std::iter::once(&plan.cumulative)
        .chain(plan.next_semester.as_ref())
        .map(|key| PlanRow {
            target: key.target.to_string(),
            group: key.group.clone(),
            artifact: key.artifact.display().to_string(),
            present: key.artifact.is_file(),
        })
        .collect();

    print_table(&rows, format);

    if plan.next_semester.is_none() && format == OutputFormat::Table {
        crate::output::print_info("All semesters completed, no next-semester model");
    }

    Ok(())
}
