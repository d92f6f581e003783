//! CLI subcommand implementations

pub mod models;
pub mod predict;
