//! Gradecast CLI
//!
//! A command-line tool for forecasting graduation CPA and next-semester GPA
//! from per-semester grades and credits, and for inspecting model artifacts.

mod commands;
mod config;
mod output;

use anyhow::Result;
use clap::{Parser, Subcommand};
use commands::{models, predict};
use gradecast_lib::{ModelRegistry, PredictionService, Track};
use std::path::PathBuf;
use std::sync::Arc;
use tracing_subscriber::EnvFilter;

/// Gradecast CLI
#[derive(Parser)]
#[command(name = "gradecast")]
#[command(author, version, about = "CLI for Gradecast academic forecasts", long_about = None)]
pub struct Cli {
    /// Directory holding the model artifacts (can also be set via GRADECAST_MODEL_DIR env var)
    #[arg(long, env = "GRADECAST_MODEL_DIR", global = true)]
    pub model_dir: Option<PathBuf>,

    /// Output format
    #[arg(long, short, global = true)]
    pub format: Option<output::OutputFormat>,

    /// Enable verbose output
    #[arg(long, short, global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Predict graduation CPA and next-semester GPA
    Predict {
        /// Study track (bachelor or engineer)
        #[arg(long, short)]
        track: Track,

        /// Number of completed semesters
        #[arg(long, short)]
        semesters: u8,

        /// GPA of each completed semester, in order (repeatable)
        #[arg(long = "grade", allow_hyphen_values = true)]
        grades: Vec<String>,

        /// Credits of each completed semester, in order (repeatable)
        #[arg(long = "credit", allow_hyphen_values = true)]
        credits: Vec<String>,
    },

    /// Show the models a prediction would use
    Plan {
        /// Study track (bachelor or engineer)
        #[arg(long, short)]
        track: Track,

        /// Number of completed semesters
        #[arg(long, short)]
        semesters: u8,
    },

    /// List the models available for a track
    Models {
        /// Study track (bachelor or engineer)
        #[arg(long, short)]
        track: Track,
    },
}

fn init_tracing(verbose: bool) {
    let default_level = if verbose { "debug" } else { "warn" };
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level)),
        )
        .with_writer(std::io::stderr)
        .compact()
        .init();
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    let file_config = config::Config::load()?;
    let model_dir = file_config.resolve_model_dir(cli.model_dir);
    let format = file_config.resolve_format(cli.format)?;

    let registry = Arc::new(ModelRegistry::with_fs_store());
    let service = PredictionService::new(registry, model_dir);

    // Execute command
    let succeeded = match cli.command {
        Commands::Predict {
            track,
            semesters,
            grades,
            credits,
        } => predict::predict(&service, track, semesters, &grades, &credits, format)?,
        Commands::Plan { track, semesters } => {
            predict::plan(&service, track, semesters, format)?;
            true
        }
        Commands::Models { track } => models::list_models(&service, track, format)?,
    };

    if !succeeded {
        std::process::exit(1);
    }

    Ok(())
}
