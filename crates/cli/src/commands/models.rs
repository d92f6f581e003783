//! Model collection listing

use anyhow::Result;
use colored::Colorize;
use gradecast_lib::{
    predictor::{cumulative_artifact, next_semester_artifact, ModelCollection},
    PredictionService, Track,
};
use serde::Serialize;
use std::path::PathBuf;
use tabled::Tabled;

use crate::output::{print_error, print_success, print_table, OutputFormat};

/// Row for the models table
#[derive(Tabled, Serialize)]
pub struct ModelRow {
    #[tabled(rename = "Collection")]
    pub collection: String,
    #[tabled(rename = "Model")]
    pub group: String,
    #[tabled(rename = "Kind")]
    pub kind: String,
    #[tabled(rename = "Features")]
    pub features: usize,
}

/// One row per estimator of a loaded collection
pub fn collection_rows(name: &str, collection: &ModelCollection) -> Result<Vec<ModelRow>> {
    collection
        .groups()
        .map(|group| -> Result<ModelRow> {
            let estimator = collection.resolve(group)?;
            Ok(ModelRow {
                collection: name.to_string(),
                group: group.to_string(),
                kind: estimator.kind().to_string(),
                features: estimator.input_len(),
            })
        })
        .collect()
}

/// Load both collections of a track and list their estimators.
/// Returns false when either collection could not be loaded.
pub fn list_models(service: &PredictionService, track: Track, format: OutputFormat) -> Result<bool> {
    let collections: [(&str, PathBuf); 2] = [
        ("graduation_cpa", cumulative_artifact(service.model_dir(), track)),
        ("next_semester_gpa", next_semester_artifact(service.model_dir(), track)),
    ];

    let mut rows = Vec::new();
    let mut all_loaded = true;

    for (name, path) in &collections {
        match service.registry().load_collection(path) {
            Ok(collection) => {
                if format == OutputFormat::Table {
                    print_success(&format!(
                        "{} ({} models, sha256 {})",
                        path.display(),
                        collection.len(),
                        &collection.checksum()[..12]
                    ));
                }
                rows.extend(collection_rows(name, &collection)?);
            }
            Err(e) => {
                all_loaded = false;
                print_error(&format!("{}: {}", name.bold(), e));
            }
        }
    }

    print_table(&rows, format);
    Ok(all_loaded)
}
