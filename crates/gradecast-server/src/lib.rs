//! Gradecast prediction service
//!
//! HTTP front end for the prediction pipeline with health and metrics
//! endpoints.

pub mod api;
pub mod config;
