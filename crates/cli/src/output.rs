//! Output formatting utilities

use clap::ValueEnum;
use colored::Colorize;
use gradecast_lib::predictor::{PredictionReport, ReportStatus};
use serde::Serialize;
use std::str::FromStr;
use tabled::{settings::Style, Table, Tabled};

/// Output format for CLI commands
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
    /// Table format (default)
    #[default]
    Table,
    /// JSON format
    Json,
}

impl FromStr for OutputFormat {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        <Self as ValueEnum>::from_str(s, true)
            .map_err(|_| anyhow::anyhow!("Unknown output format '{}', expected table or json", s))
    }
}

/// Row for the predictions table
#[derive(Tabled)]
struct PredictionRow {
    #[tabled(rename = "Prediction")]
    label: String,
    #[tabled(rename = "Value")]
    value: String,
    #[tabled(rename = "Model")]
    group: String,
    #[tabled(rename = "Track")]
    track: String,
}

/// Row for the validation errors table
#[derive(Tabled)]
struct FieldErrorRow {
    #[tabled(rename = "Field")]
    field_id: String,
    #[tabled(rename = "Semester")]
    semester: u8,
    #[tabled(rename = "Problem")]
    message: String,
}

/// Print a table from a list of items
pub fn print_table<T: Tabled + Serialize>(items: &[T], format: OutputFormat) {
    match format {
        OutputFormat::Table => {
            if items.is_empty() {
                println!("{}", "No items found".yellow());
                return;
            }
            let table = Table::new(items).with(Style::rounded()).to_string();
            println!("{}", table);
        }
        OutputFormat::Json => print_json(&items),
    }
}

/// Print any serializable value as pretty JSON
pub fn print_json<T: Serialize + ?Sized>(value: &T) {
    match serde_json::to_string_pretty(value) {
        Ok(json) => println!("{}", json),
        Err(e) => print_error(&format!("Failed to serialize output: {}", e)),
    }
}

/// Print a prediction report
pub fn print_report(report: &PredictionReport, format: OutputFormat) {
    if format == OutputFormat::Json {
        print_json(report);
        return;
    }

    println!("Status: {}", color_status(report.status));
    println!();

    match report.status {
        ReportStatus::Invalid => {
            print_warning("Input has errors");
            let rows: Vec<FieldErrorRow> = report
                .validation_errors
                .iter()
                .map(|e| FieldErrorRow {
                    field_id: e.field_id.clone(),
                    semester: e.semester,
                    message: e.message.clone(),
                })
                .collect();
            println!("{}", Table::new(rows).with(Style::rounded()));
        }
        ReportStatus::Predicted | ReportStatus::Failed => {
            let rows: Vec<PredictionRow> = report
                .graduation_cpa
                .iter()
                .chain(report.next_semester_gpa.iter())
                .map(|p| PredictionRow {
                    label: p.label.clone(),
                    value: p.display.bold().to_string(),
                    group: p.group.clone(),
                    track: p.track.to_string(),
                })
                .collect();
            if !rows.is_empty() {
                println!("{}", Table::new(rows).with(Style::rounded()));
            }
            if report.next_semester_skipped {
                print_info("All semesters completed, no next-semester forecast");
            }
            for error in &report.errors {
                print_error(&format!("{} ({}): {}", error.step, error.kind, error.message));
            }
        }
    }
}

/// Print a success message
pub fn print_success(message: &str) {
    println!("{} {}", "✓".green().bold(), message);
}

/// Print an error message
pub fn print_error(message: &str) {
    eprintln!("{} {}", "✗".red().bold(), message);
}

/// Print a warning message
pub fn print_warning(message: &str) {
    println!("{} {}", "⚠".yellow().bold(), message);
}

/// Print an info message
pub fn print_info(message: &str) {
    println!("{} {}", "ℹ".blue().bold(), message);
}

/// Color a report status
pub fn color_status(status: ReportStatus) -> String {
    match status {
        ReportStatus::Predicted => "predicted".green().to_string(),
        ReportStatus::Invalid => "invalid".yellow().to_string(),
        ReportStatus::Failed => "failed".red().to_string(),
    }
}
